use std::path::{Path, PathBuf};

use super::AnalysisSettingsPatch;
use crate::error::ConfigError;

pub const OPTIONS_FILE_NAME: &str = "analysis_options.toml";

/// The nearest `analysis_options.toml` in `start` or one of its ancestors.
/// `start` may be a file.
pub fn find_options_file(start: &Path) -> Option<PathBuf> {
    let first = if start.is_file() { start.parent()? } else { start };
    first.ancestors().map(|dir| dir.join(OPTIONS_FILE_NAME)).find(|candidate| candidate.is_file())
}

pub(super) fn read_patch(path: &Path) -> Result<AnalysisSettingsPatch, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&text).map_err(|source| ConfigError::Toml {
        path: path.to_path_buf(),
        source,
    })
}
