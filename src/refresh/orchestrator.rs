//! Periodic refresh of the dashboard payload.
//!
//! Each cycle fetches the latest snapshot and the history window concurrently,
//! builds a [`RenderPayload`] and replaces the render slot. A failed fetch
//! abandons the cycle and leaves the previous payload in place.
//!
//! Cycles are single-flight: the loop awaits each cycle before it polls the
//! timer again, and ticks missed while a slow cycle was running are skipped.

use super::render::{RenderHandle, RenderView};
use super::stats::{RefreshStats, SharedRefreshStats};
use crate::core::{RenderPayload, TransformSettings};
use crate::upstream::{Upstream, UpstreamError, UpstreamQuery};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

/// Schedule and transform settings for the refresh loop.
#[derive(Debug, Clone)]
pub struct RefreshSettings {
    /// Time between cycle starts
    pub refresh_interval: Duration,
    /// Trailing window requested from upstream
    pub history_window_minutes: u32,
    pub transform: TransformSettings,
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_secs(30),
            history_window_minutes: 60,
            transform: TransformSettings::default(),
        }
    }
}

/// An upstream query failed; the cycle was abandoned.
#[derive(Debug)]
pub struct FetchFailure {
    pub query: UpstreamQuery,
    pub error: UpstreamError,
}

impl std::fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Failed to fetch {}: {}", self.query, self.error)
    }
}

impl std::error::Error for FetchFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Drives refresh cycles against an upstream.
pub struct RefreshOrchestrator<U> {
    upstream: U,
    settings: RefreshSettings,
    handle: RenderHandle,
    stats: SharedRefreshStats,
}

impl<U: Upstream> RefreshOrchestrator<U> {
    pub fn new(upstream: U, settings: RefreshSettings) -> Self {
        Self::with_handle(upstream, settings, RenderHandle::new())
    }

    /// Create an orchestrator publishing into an existing render handle.
    pub fn with_handle(upstream: U, settings: RefreshSettings, handle: RenderHandle) -> Self {
        Self {
            upstream,
            settings,
            handle,
            stats: Arc::new(RefreshStats::new()),
        }
    }

    pub fn settings(&self) -> &RefreshSettings {
        &self.settings
    }

    pub fn view(&self) -> RenderView {
        self.handle.subscribe()
    }

    pub fn stats(&self) -> SharedRefreshStats {
        Arc::clone(&self.stats)
    }

    /// Run one refresh cycle.
    ///
    /// On success the new payload has already replaced the render slot. On
    /// failure the slot is untouched.
    pub async fn run_cycle(&self) -> Result<Arc<RenderPayload>, FetchFailure> {
        self.stats.record_cycle_started();
        let minutes = self.settings.history_window_minutes;

        let fetched = tokio::try_join!(
            async {
                self.upstream
                    .fetch_latest_snapshot()
                    .await
                    .map_err(|error| FetchFailure {
                        query: UpstreamQuery::LatestSnapshot,
                        error,
                    })
            },
            async {
                self.upstream
                    .fetch_history_window(minutes)
                    .await
                    .map_err(|error| FetchFailure {
                        query: UpstreamQuery::HistoryWindow,
                        error,
                    })
            },
        );

        let (snapshot, history) = match fetched {
            Ok(data) => data,
            Err(failure) => {
                tracing::error!(
                    source = self.upstream.description(),
                    query = %failure.query,
                    "Error refreshing dashboard: {}",
                    failure.error
                );
                self.stats.record_failure(&failure);
                return Err(failure);
            }
        };

        let payload = Arc::new(RenderPayload::build(
            &snapshot,
            &history,
            &self.settings.transform,
        ));
        self.handle.replace(Arc::clone(&payload));
        self.stats.record_success(payload.generated_at);

        if payload.series.is_empty() {
            tracing::debug!("History window is empty, nothing to chart");
        }
        tracing::info!(
            cycle_id = %payload.cycle_id,
            overall = %payload.overall.label,
            locations = snapshot.len(),
            ticks = payload.series.len(),
            "Dashboard refreshed"
        );

        Ok(payload)
    }

    /// Run cycles until `shutdown` resolves.
    ///
    /// The first cycle runs immediately. A cycle in progress is never
    /// interrupted; shutdown takes effect between cycles.
    pub async fn run<F>(self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let period = self.settings.refresh_interval.max(Duration::from_millis(1));
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        tracing::info!(
            source = self.upstream.description(),
            interval_ms = period.as_millis() as u64,
            window_minutes = self.settings.history_window_minutes,
            "Refresh loop started"
        );

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Refresh loop stopping");
                    break;
                }
                _ = ticker.tick() => {
                    // Failures are logged and counted inside run_cycle.
                    let _ = self.run_cycle().await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sample::{AggregationSample, DOWS_LAKE, NAC};
    use crate::core::{HistoryWindow, LatestSnapshot, Severity};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Upstream whose history query can be switched to fail.
    struct ScriptedUpstream {
        status: &'static str,
        fail_history: AtomicBool,
        /// 1-based history call that fails; 0 disables
        fail_history_call: AtomicUsize,
        latest_calls: AtomicUsize,
        history_calls: AtomicUsize,
    }

    impl ScriptedUpstream {
        fn new(status: &'static str) -> Self {
            Self {
                status,
                fail_history: AtomicBool::new(false),
                fail_history_call: AtomicUsize::new(0),
                latest_calls: AtomicUsize::new(0),
                history_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Upstream for ScriptedUpstream {
        async fn fetch_latest_snapshot(&self) -> Result<LatestSnapshot, UpstreamError> {
            self.latest_calls.fetch_add(1, Ordering::SeqCst);
            Ok(LatestSnapshot::from_samples(vec![AggregationSample::new(
                NAC,
                Utc::now(),
            )
            .with_status(self.status)]))
        }

        async fn fetch_history_window(
            &self,
            _minutes: u32,
        ) -> Result<HistoryWindow, UpstreamError> {
            let call = self.history_calls.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail_history.load(Ordering::SeqCst)
                || self.fail_history_call.load(Ordering::SeqCst) == call
            {
                return Err(UpstreamError::Server {
                    status: 500,
                    message: "Failed to fetch history data.".to_string(),
                });
            }
            Ok(HistoryWindow::new(vec![AggregationSample::new(
                DOWS_LAKE,
                Utc::now(),
            )
            .with_ice_thickness(12.3)]))
        }

        fn description(&self) -> &str {
            "scripted"
        }
    }

    #[tokio::test]
    async fn test_successful_cycle_replaces_payload() {
        let orchestrator =
            RefreshOrchestrator::new(ScriptedUpstream::new("Caution"), RefreshSettings::default());
        let view = orchestrator.view();

        let payload = orchestrator.run_cycle().await.unwrap();
        assert_eq!(payload.overall.severity, Severity::Caution);
        assert_eq!(payload.series.len(), 1);
        assert_eq!(view.current().unwrap().cycle_id, payload.cycle_id);
        assert_eq!(orchestrator.stats().stats().cycles_succeeded, 1);
    }

    #[tokio::test]
    async fn test_failed_cycle_keeps_previous_payload() {
        let orchestrator =
            RefreshOrchestrator::new(ScriptedUpstream::new("Safe"), RefreshSettings::default());
        let view = orchestrator.view();

        let first = orchestrator.run_cycle().await.unwrap();

        orchestrator
            .upstream
            .fail_history
            .store(true, Ordering::SeqCst);
        let failure = orchestrator.run_cycle().await.unwrap_err();
        assert_eq!(failure.query, UpstreamQuery::HistoryWindow);
        assert_eq!(view.current().unwrap().as_ref(), first.as_ref());

        orchestrator
            .upstream
            .fail_history
            .store(false, Ordering::SeqCst);
        let third = orchestrator.run_cycle().await.unwrap();
        assert_ne!(third.cycle_id, first.cycle_id);
        assert_eq!(view.current().unwrap().cycle_id, third.cycle_id);

        let stats = orchestrator.stats().stats();
        assert_eq!(stats.cycles_started, 3);
        assert_eq!(stats.cycles_failed, 1);
        assert_eq!(stats.cycles_succeeded, 2);
    }

    #[tokio::test]
    async fn test_failure_before_first_success_leaves_slot_empty() {
        let upstream = ScriptedUpstream::new("Safe");
        upstream.fail_history.store(true, Ordering::SeqCst);
        let orchestrator = RefreshOrchestrator::new(upstream, RefreshSettings::default());

        assert!(orchestrator.run_cycle().await.is_err());
        assert!(orchestrator.view().current().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_fires_eagerly_and_on_interval() {
        let upstream = Arc::new(ScriptedUpstream::new("Safe"));
        let settings = RefreshSettings {
            refresh_interval: Duration::from_secs(30),
            ..RefreshSettings::default()
        };
        let orchestrator = RefreshOrchestrator::new(Arc::clone(&upstream), settings);
        let view = orchestrator.view();

        let shutdown = tokio::time::sleep(Duration::from_secs(95));
        orchestrator.run(shutdown).await;

        // Ticks at 0s, 30s, 60s and 90s.
        assert_eq!(upstream.latest_calls.load(Ordering::SeqCst), 4);
        assert!(view.current().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_continues_after_failed_cycle() {
        let upstream = Arc::new(ScriptedUpstream::new("Caution"));
        upstream.fail_history_call.store(2, Ordering::SeqCst);
        let settings = RefreshSettings {
            refresh_interval: Duration::from_secs(30),
            ..RefreshSettings::default()
        };
        let orchestrator = RefreshOrchestrator::new(Arc::clone(&upstream), settings);
        let view = orchestrator.view();
        let stats = orchestrator.stats();

        orchestrator
            .run(tokio::time::sleep(Duration::from_secs(95)))
            .await;

        // The 30s cycle fails; 60s and 90s still run on schedule.
        let snapshot = stats.stats();
        assert_eq!(snapshot.cycles_started, 4);
        assert_eq!(snapshot.cycles_succeeded, 3);
        assert_eq!(snapshot.cycles_failed, 1);
        assert_eq!(snapshot.consecutive_failures, 0);
        assert!(snapshot.last_error.unwrap().contains("history window"));
        assert_eq!(upstream.history_calls.load(Ordering::SeqCst), 4);

        let current = view.current().unwrap();
        assert_eq!(Some(current.generated_at), snapshot.last_success);
        assert_eq!(current.overall.severity, Severity::Caution);
    }
}
