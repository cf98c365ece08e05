use std::collections::{HashMap, HashSet};

use serde::Deserialize;
use serde_json::Value;

pub const MIN_INDEXING_CONCURRENCY: usize = 1;
pub const MAX_INDEXING_CONCURRENCY: usize = 32;

#[derive(Debug, Clone, PartialEq)]
pub struct IndexingSettings {
    /// Record relationships of every resolved unit.
    pub enable: bool,
    /// Sources analysed at once by the background scheduler.
    pub concurrency: usize,
    /// Directory names or path fragments skipped when walking a directory.
    pub exclude_paths: Vec<String>,
}

impl Default for IndexingSettings {
    fn default() -> Self {
        Self {
            enable: true,
            concurrency: 1,
            exclude_paths: Vec::new(),
        }
    }
}

impl IndexingSettings {
    pub(crate) fn apply_patch(
        &mut self,
        patch: IndexingSettingsPatch,
    ) {
        if let Some(v) = patch.enable {
            self.enable = v;
        }
        if let Some(v) = patch.concurrency {
            self.concurrency = v;
        }
        if let Some(v) = patch.exclude_paths {
            self.exclude_paths = v;
        }
    }

    pub(crate) fn normalize(&mut self) {
        self.concurrency = self.concurrency.clamp(MIN_INDEXING_CONCURRENCY, MAX_INDEXING_CONCURRENCY);
        let mut seen = HashSet::new();
        self.exclude_paths = self
            .exclude_paths
            .iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .filter(|p| seen.insert(p.clone()))
            .collect();
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct IndexingSettingsPatch {
    pub(crate) enable: Option<bool>,
    pub(crate) concurrency: Option<usize>,
    pub(crate) exclude_paths: Option<Vec<String>>,
    #[serde(flatten)]
    pub(crate) _extra: HashMap<String, Value>,
}
