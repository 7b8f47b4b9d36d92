use crate::engine::state::unix_now;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use tracing::info;

/// Outcome counters for the refresh loop.
#[derive(Debug, Default)]
pub struct RefreshStats {
    successes: AtomicU64,
    failures: AtomicU64,
    last_success: AtomicU64,
    last_failure: AtomicU64,
    last_duration_ms: AtomicU64,
    last_error: RwLock<Option<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefreshStatsSnapshot {
    pub successes: u64,
    pub failures: u64,
    pub last_success: Option<u64>,
    pub last_failure: Option<u64>,
    pub last_duration_ms: u64,
    pub last_error: Option<String>,
}

impl RefreshStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&self, duration_ms: u64) {
        self.successes.fetch_add(1, Ordering::Relaxed);
        self.last_success.store(unix_now(), Ordering::Relaxed);
        self.last_duration_ms.store(duration_ms, Ordering::Relaxed);
    }

    pub fn record_failure(&self, duration_ms: u64, error: String) {
        self.failures.fetch_add(1, Ordering::Relaxed);
        self.last_failure.store(unix_now(), Ordering::Relaxed);
        self.last_duration_ms.store(duration_ms, Ordering::Relaxed);
        if let Ok(mut guard) = self.last_error.write() {
            *guard = Some(error);
        }
    }

    pub fn snapshot(&self) -> RefreshStatsSnapshot {
        let non_zero = |v: u64| if v == 0 { None } else { Some(v) };
        RefreshStatsSnapshot {
            successes: self.successes.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            last_success: non_zero(self.last_success.load(Ordering::Relaxed)),
            last_failure: non_zero(self.last_failure.load(Ordering::Relaxed)),
            last_duration_ms: self.last_duration_ms.load(Ordering::Relaxed),
            last_error: self.last_error.read().ok().and_then(|guard| guard.clone()),
        }
    }

    pub fn dump(&self) {
        let snap = self.snapshot();
        let total = snap.successes + snap.failures;
        info!(
            "STATS DUMP: Refreshes: {}, Succeeded: {} ({:.1}%), Failed: {}, LastDuration: {}ms",
            total,
            snap.successes,
            if total > 0 {
                (snap.successes as f64 / total as f64) * 100.0
            } else {
                0.0
            },
            snap.failures,
            snap.last_duration_ms
        );
    }
}
