use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use tracing::info;

const OPERATION_COUNT: usize = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Operation {
    Kind,
    Scan,
    Parse,
    LibraryModel,
    Resolve,
    Errors,
    Changed,
    Extract,
    Merge,
}

impl Operation {
    const ALL: [Operation; OPERATION_COUNT] = [
        Operation::Kind,
        Operation::Scan,
        Operation::Parse,
        Operation::LibraryModel,
        Operation::Resolve,
        Operation::Errors,
        Operation::Changed,
        Operation::Extract,
        Operation::Merge,
    ];

    fn name(self) -> &'static str {
        match self {
            Operation::Kind => "kind",
            Operation::Scan => "scan",
            Operation::Parse => "parse",
            Operation::LibraryModel => "library_model",
            Operation::Resolve => "resolve",
            Operation::Errors => "errors",
            Operation::Changed => "changed",
            Operation::Extract => "extract",
            Operation::Merge => "merge",
        }
    }
}

#[derive(Default)]
struct Counter {
    calls: AtomicU64,
    failures: AtomicU64,
    total_elapsed_ns: AtomicU64,
}

/// Call counts and latency per context operation.
#[derive(Default)]
pub(super) struct ContextPerf {
    counters: [Counter; OPERATION_COUNT],
    calls: AtomicU64,
}

impl ContextPerf {
    pub(super) fn record(
        &self,
        operation: Operation,
        elapsed: Duration,
        failed: bool,
    ) {
        let counter = &self.counters[operation as usize];
        counter.calls.fetch_add(1, Ordering::Relaxed);
        if failed {
            counter.failures.fetch_add(1, Ordering::Relaxed);
        }
        let elapsed_ns = elapsed.as_nanos().min(u64::MAX as u128) as u64;
        counter.total_elapsed_ns.fetch_add(elapsed_ns, Ordering::Relaxed);

        let calls = self.calls.fetch_add(1, Ordering::Relaxed) + 1;
        if calls % 500 == 0 {
            self.log_summary();
        }
    }

    pub(super) fn calls(
        &self,
        operation: Operation,
    ) -> u64 {
        self.counters[operation as usize].calls.load(Ordering::Relaxed)
    }

    pub(super) fn log_summary(&self) {
        let calls = self.calls.load(Ordering::Relaxed);
        if calls == 0 {
            info!("[perf][context] no calls recorded yet");
            return;
        }
        let mut parts = Vec::new();
        for operation in Operation::ALL {
            let counter = &self.counters[operation as usize];
            let count = counter.calls.load(Ordering::Relaxed);
            if count == 0 {
                continue;
            }
            let failures = counter.failures.load(Ordering::Relaxed);
            let avg_ms = counter.total_elapsed_ns.load(Ordering::Relaxed) as f64 / count as f64 / 1_000_000.0;
            parts.push(format!("{}(n={count}, failed={failures}, avg_ms={avg_ms:.2})", operation.name()));
        }
        info!("[perf][context] calls={calls}, {}", parts.join(", "));
    }
}
