use std::sync::Arc;

use thiserror::Error;

use crate::vfs::Source;

/// Failures raised by the incremental scanner.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    #[error("malformed edit: {reason} (start {start}, removed {removed}, inserted {inserted})")]
    MalformedEdit {
        start: usize,
        removed: usize,
        inserted: usize,
        reason: &'static str,
    },
}

/// Failures raised while persisting or restoring the relationship index.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("incompatible index format version {found} (expected {expected})")]
    IncompatibleFormat { found: i32, expected: i32 },
    #[error("index stream ended unexpectedly")]
    Truncated,
    #[error("malformed index stream: {0}")]
    Malformed(String),
    #[error("index i/o failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures surfaced by [`crate::context::AnalysisContext`] queries.
#[derive(Debug, Clone, Error)]
pub enum AnalysisError {
    #[error("source not found: {0}")]
    SourceNotFound(Source),
    #[error("cannot read {file}: {message}")]
    Io { file: Source, message: Arc<str> },
    #[error("invalid uri `{0}`")]
    InvalidUri(String),
    #[error("{what} for {file} is not yet available")]
    NotYetAvailable { file: Source, what: &'static str },
    #[error("{0} is not a library")]
    NotALibrary(Source),
    #[error("analysis of {0} was cancelled")]
    Cancelled(Source),
    #[error("analysis task for {file} failed: {message}")]
    TaskFailed { file: Source, message: Arc<str> },
    #[error("analysis context was discarded")]
    Discarded,
}

impl AnalysisError {
    pub fn io(
        file: &Source,
        err: &std::io::Error,
    ) -> Self {
        Self::Io {
            file: file.clone(),
            message: Arc::from(err.to_string()),
        }
    }
}

/// Failures reading an `analysis_options.toml` file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid options file {path}: {source}")]
    Toml {
        path: std::path::PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
