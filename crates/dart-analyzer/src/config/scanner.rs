use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

pub const MIN_MAX_FILE_SIZE_KB: u64 = 16;
pub const MAX_MAX_FILE_SIZE_KB: u64 = 1024 * 64;

#[derive(Debug, Clone, PartialEq)]
pub struct ScannerSettings {
    /// Re-lex only the edited region when a change carries an edit.
    pub incremental: bool,
    /// Larger files are skipped when walking a directory.
    pub max_file_size_kb: u64,
}

impl Default for ScannerSettings {
    fn default() -> Self {
        Self {
            incremental: true,
            max_file_size_kb: 1024,
        }
    }
}

impl ScannerSettings {
    pub(crate) fn apply_patch(
        &mut self,
        patch: ScannerSettingsPatch,
    ) {
        if let Some(v) = patch.incremental {
            self.incremental = v;
        }
        if let Some(v) = patch.max_file_size_kb {
            self.max_file_size_kb = v;
        }
    }

    pub(crate) fn normalize(&mut self) {
        self.max_file_size_kb = self.max_file_size_kb.clamp(MIN_MAX_FILE_SIZE_KB, MAX_MAX_FILE_SIZE_KB);
    }

    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_kb.saturating_mul(1024)
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct ScannerSettingsPatch {
    pub(crate) incremental: Option<bool>,
    pub(crate) max_file_size_kb: Option<u64>,
    #[serde(flatten)]
    pub(crate) _extra: HashMap<String, Value>,
}
