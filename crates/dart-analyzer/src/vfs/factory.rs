use std::{fmt, sync::Arc};

use dashmap::DashMap;
use tracing::debug;

use super::{ContentOverlay, Source};
use crate::error::AnalysisError;

/// Maps sources of one URI family to their contents.
pub trait UriResolver: Send + Sync {
    fn name(&self) -> &'static str;

    fn handles(
        &self,
        source: &Source,
    ) -> bool;

    fn read(
        &self,
        source: &Source,
    ) -> std::io::Result<String>;
}

/// Reads `file:` sources from disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileUriResolver;

impl UriResolver for FileUriResolver {
    fn name(&self) -> &'static str {
        "file"
    }

    fn handles(
        &self,
        source: &Source,
    ) -> bool {
        source.scheme() == "file"
    }

    fn read(
        &self,
        source: &Source,
    ) -> std::io::Result<String> {
        let path = source
            .to_file_path()
            .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a file path"))?;
        std::fs::read_to_string(path)
    }
}

/// Serves sources from memory; used for SDK stubs and tests.
#[derive(Debug, Default)]
pub struct MemoryUriResolver {
    files: DashMap<Source, Arc<str>>,
}

impl MemoryUriResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(
        &self,
        source: Source,
        contents: impl Into<Arc<str>>,
    ) {
        self.files.insert(source, contents.into());
    }

    pub fn remove(
        &self,
        source: &Source,
    ) -> bool {
        self.files.remove(source).is_some()
    }
}

impl UriResolver for MemoryUriResolver {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn handles(
        &self,
        source: &Source,
    ) -> bool {
        self.files.contains_key(source)
    }

    fn read(
        &self,
        source: &Source,
    ) -> std::io::Result<String> {
        self.files
            .get(source)
            .map(|text| text.to_string())
            .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::NotFound, source.to_string()))
    }
}

/// Resolves URIs to sources and sources to contents. Overlay buffers take
/// precedence over every resolver.
#[derive(Clone)]
pub struct SourceFactory {
    resolvers: Vec<Arc<dyn UriResolver>>,
    overlay: Arc<ContentOverlay>,
}

impl SourceFactory {
    pub fn new(resolvers: Vec<Arc<dyn UriResolver>>) -> Self {
        Self {
            resolvers,
            overlay: Arc::new(ContentOverlay::new()),
        }
    }

    pub fn with_file_system() -> Self {
        Self::new(vec![Arc::new(FileUriResolver)])
    }

    pub fn with_overlay(
        mut self,
        overlay: Arc<ContentOverlay>,
    ) -> Self {
        self.overlay = overlay;
        self
    }

    pub fn overlay(&self) -> &Arc<ContentOverlay> {
        &self.overlay
    }

    pub fn for_uri(
        &self,
        uri: &str,
    ) -> Result<Source, AnalysisError> {
        Source::parse(uri)
    }

    /// Resolves a directive URI found in `containing`.
    pub fn resolve_uri(
        &self,
        containing: &Source,
        uri: &str,
    ) -> Option<Source> {
        containing.resolve(uri)
    }

    pub fn exists(
        &self,
        source: &Source,
    ) -> bool {
        self.overlay.contains(source) || self.resolvers.iter().any(|resolver| resolver.handles(source))
    }

    pub fn contents(
        &self,
        source: &Source,
    ) -> Result<Arc<str>, AnalysisError> {
        if let Some(text) = self.overlay.get(source) {
            return Ok(text);
        }
        let Some(resolver) = self.resolvers.iter().find(|resolver| resolver.handles(source)) else {
            return Err(AnalysisError::SourceNotFound(source.clone()));
        };
        match resolver.read(source) {
            Ok(text) => Ok(Arc::from(text)),
            Err(err) => {
                debug!("[source-factory] {} resolver failed for {}: {}", resolver.name(), source, err);
                Err(AnalysisError::io(source, &err))
            },
        }
    }
}

impl fmt::Debug for SourceFactory {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let names: Vec<&str> = self.resolvers.iter().map(|resolver| resolver.name()).collect();
        f.debug_struct("SourceFactory").field("resolvers", &names).finish()
    }
}
