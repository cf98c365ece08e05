use std::{ops::Range, sync::Arc};

use dashmap::DashMap;

use super::Source;
use crate::syntax::Edit;

/// Unsaved editor contents of one source.
#[derive(Debug, Clone)]
pub struct Buffer {
    pub text: Arc<str>,
    pub version: i32,
}

/// A replacement of `range` (byte offsets into the current text) with
/// `text`. A change without a range replaces the whole buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChange {
    pub range: Option<Range<usize>>,
    pub text: String,
}

impl TextChange {
    pub fn replace(
        range: Range<usize>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            range: Some(range),
            text: text.into(),
        }
    }

    pub fn full(text: impl Into<String>) -> Self {
        Self {
            range: None,
            text: text.into(),
        }
    }
}

/// Result of applying changes to a buffer: the new text plus one edit
/// spanning everything that differs from the previous text.
#[derive(Debug, Clone)]
pub struct OverlayUpdate {
    pub text: Arc<str>,
    pub edit: Edit,
}

/// Thread-safe store of unsaved buffers, consulted before the file system.
#[derive(Debug, Default)]
pub struct ContentOverlay {
    buffers: DashMap<Source, Buffer>,
}

impl ContentOverlay {
    pub fn new() -> Self {
        Self {
            buffers: DashMap::new(),
        }
    }

    pub fn open(
        &self,
        source: Source,
        text: impl Into<Arc<str>>,
        version: i32,
    ) {
        self.buffers.insert(
            source,
            Buffer {
                text: text.into(),
                version,
            },
        );
    }

    pub fn close(
        &self,
        source: &Source,
    ) -> bool {
        self.buffers.remove(source).is_some()
    }

    pub fn get(
        &self,
        source: &Source,
    ) -> Option<Arc<str>> {
        self.buffers.get(source).map(|buffer| buffer.text.clone())
    }

    pub fn version(
        &self,
        source: &Source,
    ) -> Option<i32> {
        self.buffers.get(source).map(|buffer| buffer.version)
    }

    pub fn contains(
        &self,
        source: &Source,
    ) -> bool {
        self.buffers.contains_key(source)
    }

    pub fn sources(&self) -> Vec<Source> {
        self.buffers.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Applies `changes` in order and reports the combined edit. Returns
    /// `None` for an unknown source or when a range falls outside the text.
    pub fn apply_changes(
        &self,
        source: &Source,
        changes: Vec<TextChange>,
        version: i32,
    ) -> Option<OverlayUpdate> {
        let mut buffer = self.buffers.get_mut(source)?;
        let old = buffer.text.clone();
        let mut text = old.to_string();
        for change in changes {
            match change.range {
                Some(range) => {
                    if range.start > range.end
                        || range.end > text.len()
                        || !text.is_char_boundary(range.start)
                        || !text.is_char_boundary(range.end)
                    {
                        return None;
                    }
                    text.replace_range(range, &change.text);
                },
                None => text = change.text,
            }
        }
        let edit = Edit::between(&old, &text);
        let text: Arc<str> = Arc::from(text);
        buffer.text = text.clone();
        buffer.version = version;
        Some(OverlayUpdate {
            text,
            edit,
        })
    }
}
