//! Refresh cycle statistics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Counters for refresh cycles since startup.
#[derive(Debug)]
pub struct RefreshStats {
    /// Number of cycles started
    cycles_started: AtomicU64,
    /// Number of cycles that replaced the payload
    cycles_succeeded: AtomicU64,
    /// Number of cycles abandoned on fetch failure
    cycles_failed: AtomicU64,
    /// Failures since the last success
    consecutive_failures: AtomicU64,
    started_at: DateTime<Utc>,
    last_success: Mutex<Option<DateTime<Utc>>>,
    last_error: Mutex<Option<String>>,
}

impl RefreshStats {
    pub fn new() -> Self {
        Self {
            cycles_started: AtomicU64::new(0),
            cycles_succeeded: AtomicU64::new(0),
            cycles_failed: AtomicU64::new(0),
            consecutive_failures: AtomicU64::new(0),
            started_at: Utc::now(),
            last_success: Mutex::new(None),
            last_error: Mutex::new(None),
        }
    }

    pub fn record_cycle_started(&self) {
        self.cycles_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_success(&self, at: DateTime<Utc>) {
        self.cycles_succeeded.fetch_add(1, Ordering::Relaxed);
        self.consecutive_failures.store(0, Ordering::Relaxed);
        *self.last_success.lock().unwrap_or_else(|e| e.into_inner()) = Some(at);
    }

    pub fn record_failure(&self, error: impl ToString) {
        self.cycles_failed.fetch_add(1, Ordering::Relaxed);
        self.consecutive_failures.fetch_add(1, Ordering::Relaxed);
        *self.last_error.lock().unwrap_or_else(|e| e.into_inner()) = Some(error.to_string());
    }

    /// Get the current statistics.
    pub fn stats(&self) -> RefreshStatsSnapshot {
        RefreshStatsSnapshot {
            cycles_started: self.cycles_started.load(Ordering::Relaxed),
            cycles_succeeded: self.cycles_succeeded.load(Ordering::Relaxed),
            cycles_failed: self.cycles_failed.load(Ordering::Relaxed),
            consecutive_failures: self.consecutive_failures.load(Ordering::Relaxed),
            started_at: self.started_at,
            uptime_secs: (Utc::now() - self.started_at).num_seconds().max(0) as u64,
            last_success: *self.last_success.lock().unwrap_or_else(|e| e.into_inner()),
            last_error: self
                .last_error
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .clone(),
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        format!(
            "Refresh Statistics:\n\
             - Cycles started: {}\n\
             - Cycles succeeded: {}\n\
             - Cycles failed: {}\n\
             - Consecutive failures: {}\n\
             - Last success: {}\n\
             - Last error: {}",
            stats.cycles_started,
            stats.cycles_succeeded,
            stats.cycles_failed,
            stats.consecutive_failures,
            stats
                .last_success
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| "never".to_string()),
            stats.last_error.as_deref().unwrap_or("none"),
        )
    }
}

impl Default for RefreshStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of refresh statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshStatsSnapshot {
    pub cycles_started: u64,
    pub cycles_succeeded: u64,
    pub cycles_failed: u64,
    pub consecutive_failures: u64,
    pub started_at: DateTime<Utc>,
    pub uptime_secs: u64,
    pub last_success: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

/// Thread-safe shared refresh statistics.
pub type SharedRefreshStats = Arc<RefreshStats>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_counting() {
        let stats = RefreshStats::new();

        stats.record_cycle_started();
        stats.record_failure("boom");
        stats.record_cycle_started();
        stats.record_failure("boom again");

        let snapshot = stats.stats();
        assert_eq!(snapshot.cycles_started, 2);
        assert_eq!(snapshot.cycles_failed, 2);
        assert_eq!(snapshot.consecutive_failures, 2);
        assert_eq!(snapshot.last_error.as_deref(), Some("boom again"));
        assert!(snapshot.last_success.is_none());

        stats.record_cycle_started();
        stats.record_success(Utc::now());
        let snapshot = stats.stats();
        assert_eq!(snapshot.cycles_succeeded, 1);
        assert_eq!(snapshot.consecutive_failures, 0);
        assert!(snapshot.last_success.is_some());
    }

    #[test]
    fn test_summary_format() {
        let stats = RefreshStats::new();
        let summary = stats.summary();

        assert!(summary.contains("Cycles started: 0"));
        assert!(summary.contains("Last success: never"));
        assert!(summary.contains("Last error: none"));
    }
}
