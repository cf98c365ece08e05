use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::{Duration, Instant},
};

use dashmap::DashMap;
use serde::Serialize;
use tokio::{
    sync::{Semaphore, mpsc},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use super::AnalysisContext;
use crate::{error::AnalysisError, syntax::SourceKind, vfs::Source};

const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SchedulerStatus {
    pub pending: usize,
    pub completed: usize,
    pub failed: usize,
    pub cancelled: bool,
}

#[derive(Default)]
struct Counters {
    pending: AtomicUsize,
    completed: AtomicUsize,
    failed: AtomicUsize,
}

/// Background analysis of queued sources on the blocking pool.
///
/// Must be started inside a tokio runtime. Each queued source runs the full
/// pipeline of the context; at most `concurrency` run at once. Cancelling
/// is checked before each source starts, so a running source finishes.
pub struct AnalysisScheduler {
    context: Arc<AnalysisContext>,
    queue: mpsc::UnboundedSender<Source>,
    counters: Arc<Counters>,
    cancelled: Arc<AtomicBool>,
    results: Arc<DashMap<Source, Result<SourceKind, AnalysisError>>>,
    worker: JoinHandle<()>,
}

impl AnalysisScheduler {
    pub fn start(
        context: Arc<AnalysisContext>,
        concurrency: usize,
    ) -> Self {
        let (queue, mut requests) = mpsc::unbounded_channel::<Source>();
        let counters = Arc::new(Counters::default());
        let cancelled = Arc::new(AtomicBool::new(false));
        let results = Arc::new(DashMap::new());
        let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));

        let worker = {
            let context = context.clone();
            let counters = counters.clone();
            let cancelled = cancelled.clone();
            let results = results.clone();
            tokio::spawn(async move {
                let mut running = Vec::new();
                while let Some(source) = requests.recv().await {
                    let Ok(permit) = semaphore.clone().acquire_owned().await else {
                        break;
                    };
                    let context = context.clone();
                    let counters = counters.clone();
                    let cancelled = cancelled.clone();
                    let results = results.clone();
                    running.push(tokio::spawn(async move {
                        let _permit = permit;
                        let outcome = if cancelled.load(Ordering::Acquire) {
                            Err(AnalysisError::Cancelled(source.clone()))
                        } else {
                            let blocking_context = context.clone();
                            let blocking_source = source.clone();
                            tokio::task::spawn_blocking(move || blocking_context.analyze(&blocking_source))
                                .await
                                .unwrap_or_else(|err| {
                                    warn!("[scheduler] analysis task for {} failed: {}", source.short_name(), err);
                                    Err(AnalysisError::TaskFailed {
                                        file: source.clone(),
                                        message: Arc::from(err.to_string()),
                                    })
                                })
                        };
                        match &outcome {
                            Ok(_) => counters.completed.fetch_add(1, Ordering::Relaxed),
                            Err(err) => {
                                debug!("[scheduler] {}: {}", source.short_name(), err);
                                counters.failed.fetch_add(1, Ordering::Relaxed)
                            },
                        };
                        results.insert(source, outcome);
                        counters.pending.fetch_sub(1, Ordering::AcqRel);
                    }));
                    running.retain(|handle: &JoinHandle<()>| !handle.is_finished());
                }
                for handle in running {
                    let _ = handle.await;
                }
                debug!("[scheduler] queue closed");
            })
        };

        Self {
            context,
            queue,
            counters,
            cancelled,
            results,
            worker,
        }
    }

    /// Queues `sources` behind everything already queued.
    pub fn schedule(
        &self,
        sources: impl IntoIterator<Item = Source>,
    ) {
        for source in sources {
            self.counters.pending.fetch_add(1, Ordering::AcqRel);
            if self.queue.send(source).is_err() {
                self.counters.pending.fetch_sub(1, Ordering::AcqRel);
                warn!("[scheduler] queue is closed");
                return;
            }
        }
    }

    /// Analyses `source` on the calling thread, ahead of the queue.
    pub fn analyze_priority(
        &self,
        source: &Source,
    ) -> Result<SourceKind, AnalysisError> {
        let outcome = self.context.analyze(source);
        self.results.insert(source.clone(), outcome.clone());
        outcome
    }

    /// Sources queued after this call fail with [`AnalysisError::Cancelled`]
    /// until [`Self::resume`].
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
        info!("[scheduler] cancelled with {} pending", self.counters.pending.load(Ordering::Relaxed));
    }

    pub fn resume(&self) {
        self.cancelled.store(false, Ordering::Release);
    }

    pub fn status(&self) -> SchedulerStatus {
        SchedulerStatus {
            pending: self.counters.pending.load(Ordering::Acquire),
            completed: self.counters.completed.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
            cancelled: self.cancelled.load(Ordering::Acquire),
        }
    }

    /// Outcome of the last analysis of `source`. Fails with
    /// [`AnalysisError::NotYetAvailable`] until one finished.
    pub fn result(
        &self,
        source: &Source,
    ) -> Result<SourceKind, AnalysisError> {
        self.results.get(source).map(|entry| entry.value().clone()).unwrap_or_else(|| {
            Err(AnalysisError::NotYetAvailable {
                file: source.clone(),
                what: "analysis",
            })
        })
    }

    /// Polls until the queue drains or `timeout` passes. Returns whether
    /// the queue drained.
    pub async fn wait_for_idle(
        &self,
        timeout: Duration,
    ) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.counters.pending.load(Ordering::Acquire) == 0 {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(IDLE_POLL_INTERVAL).await;
        }
    }

    /// Closes the queue and waits for queued work to finish.
    pub async fn shutdown(self) {
        let Self {
            queue,
            worker,
            ..
        } = self;
        drop(queue);
        if let Err(err) = worker.await {
            warn!("[scheduler] worker ended abnormally: {}", err);
        }
    }
}
