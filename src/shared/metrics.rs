use serde::Serialize;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

pub const UNSET_TS: u64 = 0;

#[derive(Debug)]
pub struct AtomicMetric {
    success: AtomicU64,
    failure: AtomicU64,
    last_success_ms: AtomicU64,
    last_failure_ms: AtomicU64,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AtomicSnapshot {
    pub successes: u64,
    pub failures: u64,
    pub last_success_ms: Option<u64>,
    pub last_failure_ms: Option<u64>,
}

impl AtomicMetric {
    pub const fn new() -> Self {
        Self {
            success: AtomicU64::new(0),
            failure: AtomicU64::new(0),
            last_success_ms: AtomicU64::new(UNSET_TS),
            last_failure_ms: AtomicU64::new(UNSET_TS),
        }
    }

    pub fn record_success(&self) {
        self.success.fetch_add(1, Ordering::Relaxed);
        self.last_success_ms
            .store(current_unix_ms(), Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failure.fetch_add(1, Ordering::Relaxed);
        self.last_failure_ms
            .store(current_unix_ms(), Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> AtomicSnapshot {
        AtomicSnapshot {
            successes: self.success.load(Ordering::Relaxed),
            failures: self.failure.load(Ordering::Relaxed),
            last_success_ms: timestamp_to_option(self.last_success_ms.load(Ordering::Relaxed)),
            last_failure_ms: timestamp_to_option(self.last_failure_ms.load(Ordering::Relaxed)),
        }
    }
}

impl Default for AtomicMetric {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReplayOutcomeStatus {
    Success,
    Failure,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReplayMetricsSnapshot {
    pub total_replays: u64,
    pub actions_succeeded: u64,
    pub actions_failed: u64,
    pub consecutive_failed_replays: u64,
    pub last_outcome: Option<ReplayOutcomeStatus>,
    pub last_attempted: Option<u64>,
    pub last_duration_ms: Option<u64>,
    pub last_timestamp_ms: Option<u64>,
}

#[derive(Debug, Default, Clone)]
struct LastReplay {
    outcome: Option<ReplayOutcomeStatus>,
    attempted: Option<u64>,
    duration_ms: Option<u64>,
    timestamp_ms: Option<u64>,
}

/// キュー 1 つ分の再送統計。バッチ内に 1 件でも失敗があれば Failure とする。
#[derive(Debug, Default)]
pub struct ReplayMetrics {
    replays: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
    consecutive_failed: AtomicU64,
    last: Mutex<LastReplay>,
}

impl ReplayMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, succeeded: u64, failed: u64, duration_ms: u64) {
        self.replays.fetch_add(1, Ordering::Relaxed);
        self.succeeded.fetch_add(succeeded, Ordering::Relaxed);
        self.failed.fetch_add(failed, Ordering::Relaxed);

        let outcome = if failed == 0 {
            self.consecutive_failed.store(0, Ordering::Relaxed);
            ReplayOutcomeStatus::Success
        } else {
            self.consecutive_failed.fetch_add(1, Ordering::Relaxed);
            ReplayOutcomeStatus::Failure
        };

        if let Ok(mut guard) = self.last.lock() {
            guard.outcome = Some(outcome);
            guard.attempted = Some(succeeded + failed);
            guard.duration_ms = Some(duration_ms);
            guard.timestamp_ms = Some(current_unix_ms());
        }
    }

    pub fn snapshot(&self) -> ReplayMetricsSnapshot {
        let last = self
            .last
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default();

        ReplayMetricsSnapshot {
            total_replays: self.replays.load(Ordering::Relaxed),
            actions_succeeded: self.succeeded.load(Ordering::Relaxed),
            actions_failed: self.failed.load(Ordering::Relaxed),
            consecutive_failed_replays: self.consecutive_failed.load(Ordering::Relaxed),
            last_outcome: last.outcome,
            last_attempted: last.attempted,
            last_duration_ms: last.duration_ms,
            last_timestamp_ms: last.timestamp_ms,
        }
    }
}

#[inline]
pub fn current_unix_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_millis() as u64)
        .unwrap_or(UNSET_TS)
}

#[inline]
pub fn timestamp_to_option(value: u64) -> Option<u64> {
    if value == UNSET_TS { None } else { Some(value) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atomic_metric_counts_outcomes() {
        let metric = AtomicMetric::new();
        metric.record_success();
        metric.record_failure();
        metric.record_failure();

        let snapshot = metric.snapshot();
        assert_eq!(snapshot.successes, 1);
        assert_eq!(snapshot.failures, 2);
        assert!(snapshot.last_success_ms.is_some());
    }

    #[test]
    fn replay_metrics_track_consecutive_failures() {
        let metrics = ReplayMetrics::new();
        metrics.record(2, 1, 15);
        metrics.record(0, 1, 3);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.total_replays, 2);
        assert_eq!(snapshot.actions_succeeded, 2);
        assert_eq!(snapshot.actions_failed, 2);
        assert_eq!(snapshot.consecutive_failed_replays, 2);
        assert_eq!(snapshot.last_outcome, Some(ReplayOutcomeStatus::Failure));
        assert_eq!(snapshot.last_attempted, Some(1));

        metrics.record(3, 0, 4);
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.consecutive_failed_replays, 0);
        assert_eq!(snapshot.last_outcome, Some(ReplayOutcomeStatus::Success));
    }
}
