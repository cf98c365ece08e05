//! Source identity, content providers and editor overlays.

mod container;
mod factory;
mod overlay;

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use serde::{Serialize, Serializer};
use url::Url;

pub use container::{DirectoryContainer, SourceContainer, SourceSet, collect_dart_sources};
pub use factory::{FileUriResolver, MemoryUriResolver, SourceFactory, UriResolver};
pub use overlay::{Buffer, ContentOverlay, OverlayUpdate, TextChange};

use crate::error::AnalysisError;

/// Stable identity of a compilation unit: its absolute URI.
///
/// Cloning is cheap; two sources are equal when their URIs are equal.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Source(Arc<str>);

impl Source {
    pub fn parse(uri: &str) -> Result<Self, AnalysisError> {
        let url = Url::parse(uri).map_err(|_| AnalysisError::InvalidUri(uri.to_string()))?;
        Ok(Self::from_url(&url))
    }

    pub fn from_url(url: &Url) -> Self {
        Self(Arc::from(url.as_str()))
    }

    pub fn from_path(path: &Path) -> Self {
        let normalized = normalized_path(path);
        match Url::from_file_path(&normalized) {
            Ok(url) => Self::from_url(&url),
            Err(()) => Self(Arc::from(format!("file://{}", normalized.display()))),
        }
    }

    pub fn uri(&self) -> &str {
        &self.0
    }

    pub fn to_url(&self) -> Option<Url> {
        Url::parse(&self.0).ok()
    }

    pub fn to_file_path(&self) -> Option<PathBuf> {
        self.to_url()?.to_file_path().ok()
    }

    pub fn scheme(&self) -> &str {
        self.0.split_once(':').map(|(scheme, _)| scheme).unwrap_or("")
    }

    /// `dart:` sources are never edited by the user.
    pub fn is_in_system_library(&self) -> bool {
        self.scheme() == "dart"
    }

    /// Last path segment, used in log lines.
    pub fn short_name(&self) -> &str {
        self.0.rsplit(['/', ':']).next().unwrap_or(&self.0)
    }

    /// Resolves a directive URI against this source.
    pub fn resolve(
        &self,
        reference: &str,
    ) -> Option<Source> {
        if let Ok(absolute) = Url::parse(reference) {
            return Some(Self::from_url(&absolute));
        }
        let base = self.to_url()?;
        base.join(reference).ok().map(|url| Self::from_url(&url))
    }
}

impl std::fmt::Display for Source {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::fmt::Debug for Source {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(f, "Source({})", self.0)
    }
}

impl Serialize for Source {
    fn serialize<S: Serializer>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

pub fn normalized_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
#[path = "../../tests/src/vfs/source_tests.rs"]
mod tests;
