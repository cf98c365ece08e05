use std::sync::Arc;

use serde::Serialize;

use crate::{
    syntax::Edit,
    vfs::{Source, SourceContainer},
};

/// A batch of changes to the sources known to a context.
#[derive(Clone, Default)]
pub struct ChangeSet {
    pub(crate) added: Vec<Source>,
    pub(crate) changed: Vec<(Source, Option<Edit>)>,
    pub(crate) removed: Vec<Source>,
    pub(crate) removed_containers: Vec<Arc<dyn SourceContainer>>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn added(
        mut self,
        source: Source,
    ) -> Self {
        self.added.push(source);
        self
    }

    pub fn changed(
        mut self,
        source: Source,
    ) -> Self {
        self.changed.push((source, None));
        self
    }

    /// A change described by one contiguous edit, letting the next scan of
    /// `source` re-lex only the affected region.
    pub fn edited(
        mut self,
        source: Source,
        edit: Edit,
    ) -> Self {
        self.changed.push((source, Some(edit)));
        self
    }

    pub fn removed(
        mut self,
        source: Source,
    ) -> Self {
        self.removed.push(source);
        self
    }

    pub fn removed_container(
        mut self,
        container: Arc<dyn SourceContainer>,
    ) -> Self {
        self.removed_containers.push(container);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.changed.is_empty() && self.removed.is_empty() && self.removed_containers.is_empty()
    }
}

impl std::fmt::Debug for ChangeSet {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("ChangeSet")
            .field("added", &self.added)
            .field("changed", &self.changed)
            .field("removed", &self.removed)
            .field("removed_containers", &self.removed_containers.len())
            .finish()
    }
}

/// What a change invalidated. Nothing is recomputed until queried.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChangeResult {
    /// Sources whose cached results were dropped, sorted.
    pub invalidated: Vec<Source>,
    /// Libraries that must be resolved again, sorted.
    pub to_resolve: Vec<Source>,
    pub removed: Vec<Source>,
}

impl ChangeResult {
    pub fn is_empty(&self) -> bool {
        self.invalidated.is_empty() && self.removed.is_empty()
    }
}
