//! Analysis settings, split into one file per category.
//!
//! [`AnalysisSettings`] aggregates every category. Settings come from a JSON
//! payload (either namespaced under `"dart-analyzer"` or given directly) or
//! from an `analysis_options.toml` file found next to the analysed sources.
//! Both go through the same private `*Patch` structs, so unknown keys are
//! ignored and missing keys keep their defaults.

pub(crate) mod indexing;
pub(crate) mod logging;
pub(crate) mod options_file;
pub(crate) mod scanner;
pub(crate) mod thread_pool;

use std::{collections::HashMap, path::Path};

use indexing::IndexingSettingsPatch;
pub use indexing::{IndexingSettings, MAX_INDEXING_CONCURRENCY, MIN_INDEXING_CONCURRENCY};
use logging::LoggingSettingsPatch;
pub use logging::{LogLevel, LoggingSettings};
pub use options_file::{OPTIONS_FILE_NAME, find_options_file};
use scanner::ScannerSettingsPatch;
pub use scanner::{MAX_MAX_FILE_SIZE_KB, MIN_MAX_FILE_SIZE_KB, ScannerSettings};
use serde::Deserialize;
use serde_json::Value;
use thread_pool::ThreadPoolSettingsPatch;
pub use thread_pool::{MAX_WORKER_THREADS, MIN_WORKER_THREADS, ThreadPoolSettings};
use tracing::{debug, warn};

use crate::error::ConfigError;

pub const SETTINGS_SECTION_KEY: &str = "dart-analyzer";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisSettings {
    pub scanner: ScannerSettings,
    pub indexing: IndexingSettings,
    pub logging: LoggingSettings,
    pub thread_pool: ThreadPoolSettings,
}

impl AnalysisSettings {
    pub fn from_json_payload(payload: Option<&Value>) -> Self {
        let mut settings = Self::default();
        if let Some(payload) = payload {
            settings = settings.merged_with_payload(payload);
        }
        settings
    }

    pub fn merged_with_payload(
        &self,
        payload: &Value,
    ) -> Self {
        let mut merged = self.clone();

        for candidate in payload_candidates(payload) {
            match serde_json::from_value::<AnalysisSettingsPatch>(candidate.clone()) {
                Ok(patch) => merged.apply_patch(patch),
                Err(err) => debug!("[config] ignoring settings payload: {}", err),
            }
        }

        merged.normalize();
        merged
    }

    /// Settings from the options file at `path`, on top of the defaults.
    pub fn from_options_file(path: &Path) -> Result<Self, ConfigError> {
        let patch = options_file::read_patch(path)?;
        let mut settings = Self::default();
        settings.apply_patch(patch);
        settings.normalize();
        Ok(settings)
    }

    /// Settings from the nearest options file above `start`, or the
    /// defaults when there is none or it cannot be read.
    pub fn discover(start: &Path) -> Self {
        let Some(path) = find_options_file(start) else {
            return Self::default();
        };
        match Self::from_options_file(&path) {
            Ok(settings) => {
                debug!("[config] loaded {}", path.display());
                settings
            },
            Err(err) => {
                warn!("[config] {}; using defaults", err);
                Self::default()
            },
        }
    }

    fn apply_patch(
        &mut self,
        patch: AnalysisSettingsPatch,
    ) {
        if let Some(p) = patch.scanner {
            self.scanner.apply_patch(p);
        }
        if let Some(p) = patch.indexing {
            self.indexing.apply_patch(p);
        }
        if let Some(p) = patch.logging {
            self.logging.apply_patch(p);
        }
        if let Some(p) = patch.thread_pool {
            self.thread_pool.apply_patch(p);
        }
    }

    fn normalize(&mut self) {
        self.scanner.normalize();
        self.indexing.normalize();
        self.thread_pool.normalize();
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct AnalysisSettingsPatch {
    scanner: Option<ScannerSettingsPatch>,
    indexing: Option<IndexingSettingsPatch>,
    logging: Option<LoggingSettingsPatch>,
    thread_pool: Option<ThreadPoolSettingsPatch>,
    #[serde(flatten)]
    _extra: HashMap<String, Value>,
}

fn payload_candidates(payload: &Value) -> Vec<Value> {
    let mut candidates = Vec::new();
    candidates.push(payload.clone());
    if let Some(scoped) = payload.get(SETTINGS_SECTION_KEY) {
        candidates.push(scoped.clone());
    }
    candidates
}

#[cfg(test)]
#[path = "../../tests/src/config/settings_tests.rs"]
mod tests;
