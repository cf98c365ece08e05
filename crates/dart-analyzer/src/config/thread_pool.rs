use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

pub const MIN_WORKER_THREADS: usize = 1;
pub const MAX_WORKER_THREADS: usize = 64;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThreadPoolSettings {
    /// Tokio worker threads; zero means one per available core.
    pub worker_threads: usize,
}

impl ThreadPoolSettings {
    pub fn resolved_worker_threads(&self) -> usize {
        if self.worker_threads == 0 {
            return std::thread::available_parallelism().map(|n| n.get()).unwrap_or(MIN_WORKER_THREADS);
        }
        self.worker_threads
    }

    pub(crate) fn apply_patch(
        &mut self,
        patch: ThreadPoolSettingsPatch,
    ) {
        if let Some(v) = patch.worker_threads {
            self.worker_threads = v;
        }
    }

    pub(crate) fn normalize(&mut self) {
        if self.worker_threads != 0 {
            self.worker_threads = self.worker_threads.clamp(MIN_WORKER_THREADS, MAX_WORKER_THREADS);
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct ThreadPoolSettingsPatch {
    pub(crate) worker_threads: Option<usize>,
    #[serde(flatten)]
    pub(crate) _extra: HashMap<String, Value>,
}
