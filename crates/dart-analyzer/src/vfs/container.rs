use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use walkdir::WalkDir;

use super::{Source, normalized_path};

/// A predicate over sources, used for bulk removal and context extraction.
pub trait SourceContainer: Send + Sync {
    fn contains(
        &self,
        source: &Source,
    ) -> bool;
}

/// Every source whose URI lives under a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryContainer {
    root: PathBuf,
    prefix: String,
}

impl DirectoryContainer {
    pub fn new(root: &Path) -> Self {
        let root = normalized_path(root);
        let mut prefix = Source::from_path(&root).uri().to_string();
        if !prefix.ends_with('/') {
            prefix.push('/');
        }
        Self {
            root,
            prefix,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// All `.dart` files below the directory.
    pub fn sources(&self) -> Vec<Source> {
        collect_dart_sources(&self.root, &[])
    }
}

impl SourceContainer for DirectoryContainer {
    fn contains(
        &self,
        source: &Source,
    ) -> bool {
        source.uri().starts_with(&self.prefix)
    }
}

/// An explicit set of sources.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceSet {
    sources: HashSet<Source>,
}

impl SourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        source: Source,
    ) -> bool {
        self.sources.insert(source)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Source> {
        self.sources.iter()
    }
}

impl FromIterator<Source> for SourceSet {
    fn from_iter<I: IntoIterator<Item = Source>>(iter: I) -> Self {
        Self {
            sources: iter.into_iter().collect(),
        }
    }
}

impl SourceContainer for SourceSet {
    fn contains(
        &self,
        source: &Source,
    ) -> bool {
        self.sources.contains(source)
    }
}

/// Walks `root` for `.dart` files, skipping hidden directories and any path
/// containing one of `exclude`.
pub fn collect_dart_sources(
    root: &Path,
    exclude: &[String],
) -> Vec<Source> {
    let mut sources: Vec<Source> = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0 || !entry.file_name().to_str().is_some_and(|name| name.starts_with('.'))
        })
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "dart"))
        .filter(|entry| {
            let display = entry.path().display().to_string();
            !exclude.iter().any(|pattern| display.contains(pattern.as_str()))
        })
        .map(|entry| Source::from_path(entry.path()))
        .collect();
    sources.sort();
    sources
}
