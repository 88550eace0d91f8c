//! Scan admission
//!
//! A cursor walks the target list one tick at a time. Each tick polls the
//! scanner's live running count; only when it is below the ceiling is the
//! target under the cursor decided (submitted or skipped) and the cursor
//! advanced. Every tick that is not the last one is followed by the pacing
//! wait, which a shutdown request cuts short.

use std::collections::HashSet;
use std::time::Duration;
use tokio::sync::broadcast;

use crate::core::config::RunConfig;
use crate::core::shutdown::wait_or_shutdown;
use crate::notifications::api::{EventSink, RunEvent};
use crate::remote::traits::ScanService;
use crate::remote::types::{RunningScanSet, Target, TargetId, TargetIdentifierMap};

/// What a single tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// No capacity (or capacity unknown); cursor unchanged
    Deferred,
    Submitted,
    SubmitFailed,
    SkippedRunning,
    SkippedUnregistered,
    SkippedDuplicate,
}

impl TickOutcome {
    pub fn advances_cursor(self) -> bool {
        self != TickOutcome::Deferred
    }
}

/// Counters for a completed (or interrupted) admission pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdmissionReport {
    /// Target ids submitted, in submission order
    pub submitted: Vec<TargetId>,
    pub submit_failures: usize,
    pub skipped_running: usize,
    pub skipped_unregistered: usize,
    pub skipped_duplicate: usize,
    pub ticks: usize,
    pub deferred_ticks: usize,
    /// Targets decided before the pass ended
    pub decided: usize,
    pub interrupted: bool,
}

impl AdmissionReport {
    fn record(&mut self, outcome: TickOutcome) {
        self.ticks += 1;
        match outcome {
            TickOutcome::Deferred => self.deferred_ticks += 1,
            TickOutcome::Submitted => {}
            TickOutcome::SubmitFailed => self.submit_failures += 1,
            TickOutcome::SkippedRunning => self.skipped_running += 1,
            TickOutcome::SkippedUnregistered => self.skipped_unregistered += 1,
            TickOutcome::SkippedDuplicate => self.skipped_duplicate += 1,
        }
        if outcome.advances_cursor() {
            self.decided += 1;
        }
    }
}

pub struct ScanAdmissionController<'a> {
    service: &'a dyn ScanService,
    sink: &'a dyn EventSink,
    max_concurrent_tasks: usize,
    pacing_interval: Duration,
    scan_profile_id: &'a str,
    refresh_running_scans: bool,
}

impl<'a> ScanAdmissionController<'a> {
    pub fn new(service: &'a dyn ScanService, sink: &'a dyn EventSink, config: &'a RunConfig) -> Self {
        Self {
            service,
            sink,
            max_concurrent_tasks: config.max_concurrent_tasks,
            pacing_interval: config.pacing_interval,
            scan_profile_id: &config.scan_profile_id,
            refresh_running_scans: config.refresh_running_scans,
        }
    }

    /// Decide every target in order, pacing ticks against the live running count
    ///
    /// `running` is the snapshot taken before the pass; it is only refreshed
    /// when `refresh_running_scans` is set.
    pub async fn run(
        &self,
        targets: &[Target],
        identifiers: &TargetIdentifierMap,
        mut running: RunningScanSet,
        shutdown_rx: &mut broadcast::Receiver<()>,
    ) -> AdmissionReport {
        let mut report = AdmissionReport::default();
        let mut submitted: HashSet<TargetId> = HashSet::new();
        let mut cursor = 0;

        while cursor < targets.len() {
            let outcome = self
                .tick(&targets[cursor], identifiers, &mut running, &mut submitted)
                .await;
            report.record(outcome);
            if outcome == TickOutcome::Submitted {
                if let Some(id) = identifiers.get(&targets[cursor]) {
                    report.submitted.push(id.clone());
                }
            }
            if outcome.advances_cursor() {
                cursor += 1;
            }

            if cursor < targets.len() && wait_or_shutdown(self.pacing_interval, shutdown_rx).await {
                report.interrupted = true;
                self.sink.emit(RunEvent::Interrupted {
                    remaining: targets.len() - cursor,
                });
                break;
            }
        }

        report
    }

    /// One admission decision for `address`, or a deferral when the scanner is full
    pub async fn tick(
        &self,
        address: &Target,
        identifiers: &TargetIdentifierMap,
        running: &mut RunningScanSet,
        submitted: &mut HashSet<TargetId>,
    ) -> TickOutcome {
        let live = match self.service.running_scan_count().await {
            Ok(count) => count,
            Err(e) => {
                // Unknown capacity never admits a scan
                self.sink.emit(RunEvent::RemoteQueryFailed {
                    query: "usage statistics",
                    reason: e.to_string(),
                });
                return TickOutcome::Deferred;
            }
        };
        if live >= self.max_concurrent_tasks as u64 {
            self.sink.emit(RunEvent::CapacityWait {
                running: live,
                max: self.max_concurrent_tasks,
            });
            return TickOutcome::Deferred;
        }

        let Some(target_id) = identifiers.get(address) else {
            self.sink.emit(RunEvent::ScanSkippedUnregistered {
                address: address.clone(),
            });
            return TickOutcome::SkippedUnregistered;
        };

        if self.refresh_running_scans {
            match self.service.list_running_scans().await {
                Ok(current) => *running = current,
                Err(e) => self.sink.emit(RunEvent::RemoteQueryFailed {
                    query: "running scans",
                    reason: e.to_string(),
                }),
            }
        }

        if running.contains(target_id) {
            self.sink.emit(RunEvent::ScanSkippedRunning {
                address: address.clone(),
            });
            return TickOutcome::SkippedRunning;
        }

        if !submitted.insert(target_id.clone()) {
            self.sink.emit(RunEvent::ScanSkippedDuplicate {
                address: address.clone(),
            });
            return TickOutcome::SkippedDuplicate;
        }

        match self
            .service
            .create_scan(target_id, self.scan_profile_id)
            .await
        {
            Ok(()) => {
                self.sink.emit(RunEvent::ScanStarted {
                    address: address.clone(),
                    target_id: target_id.clone(),
                });
                TickOutcome::Submitted
            }
            Err(e) => {
                self.sink.emit(RunEvent::ScanStartFailed {
                    address: address.clone(),
                    reason: e.to_string(),
                });
                TickOutcome::SubmitFailed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::shutdown::ShutdownCoordinator;
    use crate::notifications::api::MemorySink;
    use crate::remote::memory::{InMemoryScanService, ServiceCall};

    fn config(max: usize) -> RunConfig {
        let mut config = RunConfig::new("https://scanner/", "key");
        config.max_concurrent_tasks = max;
        config.pacing_interval = Duration::from_millis(1);
        config
    }

    fn ids(pairs: &[(&str, &str)]) -> TargetIdentifierMap {
        pairs
            .iter()
            .map(|(address, id)| (address.to_string(), id.to_string()))
            .collect()
    }

    fn targets(list: &[&str]) -> Vec<Target> {
        list.iter().map(|t| t.to_string()).collect()
    }

    #[tokio::test]
    async fn test_full_scanner_defers_without_advancing() {
        let service = InMemoryScanService::new().with_running_counts(&[2]);
        let sink = MemorySink::new();
        let config = config(2);
        let controller = ScanAdmissionController::new(&service, &sink, &config);

        let outcome = controller
            .tick(
                &"a.com".to_string(),
                &ids(&[("a.com", "id1")]),
                &mut RunningScanSet::new(),
                &mut HashSet::new(),
            )
            .await;

        assert_eq!(outcome, TickOutcome::Deferred);
        assert!(service.created_scans().is_empty());
        assert_eq!(sink.events(), vec![RunEvent::CapacityWait { running: 2, max: 2 }]);
    }

    #[tokio::test]
    async fn test_stats_failure_defers() {
        let service = InMemoryScanService::new().failing_stats(1);
        let sink = MemorySink::new();
        let config = config(2);
        let controller = ScanAdmissionController::new(&service, &sink, &config);

        let outcome = controller
            .tick(
                &"a.com".to_string(),
                &ids(&[("a.com", "id1")]),
                &mut RunningScanSet::new(),
                &mut HashSet::new(),
            )
            .await;

        assert_eq!(outcome, TickOutcome::Deferred);
        assert!(service.created_scans().is_empty());
    }

    #[tokio::test]
    async fn test_running_target_is_skipped() {
        let service = InMemoryScanService::new();
        let sink = MemorySink::new();
        let config = config(2);
        let controller = ScanAdmissionController::new(&service, &sink, &config);
        let mut running: RunningScanSet = ["id1".to_string()].into_iter().collect();

        let outcome = controller
            .tick(
                &"a.com".to_string(),
                &ids(&[("a.com", "id1")]),
                &mut running,
                &mut HashSet::new(),
            )
            .await;

        assert_eq!(outcome, TickOutcome::SkippedRunning);
        assert!(service.created_scans().is_empty());
    }

    #[tokio::test]
    async fn test_run_submits_in_order_and_skips_unregistered() {
        let service = InMemoryScanService::new().failing_scan("id3");
        let sink = MemorySink::new();
        let config = config(2);
        let controller = ScanAdmissionController::new(&service, &sink, &config);
        let (_coordinator, mut shutdown_rx) = ShutdownCoordinator::new();

        let report = controller
            .run(
                &targets(&["a.com", "lost.com", "b.com", "c.com", "a.com"]),
                &ids(&[("a.com", "id1"), ("b.com", "id2"), ("c.com", "id3")]),
                RunningScanSet::new(),
                &mut shutdown_rx,
            )
            .await;

        assert_eq!(report.submitted, vec!["id1", "id2"]);
        assert_eq!(report.skipped_unregistered, 1);
        assert_eq!(report.submit_failures, 1);
        assert_eq!(report.skipped_duplicate, 1);
        assert_eq!(report.decided, 5);
        assert_eq!(report.ticks, 5);
        assert!(!report.interrupted);
        assert_eq!(service.created_scans(), vec!["id1", "id2", "id3"]);
    }

    #[tokio::test]
    async fn test_every_submission_follows_a_poll_below_ceiling() {
        let service = InMemoryScanService::new().with_running_counts(&[3, 1, 2, 2, 0, 5, 1]);
        let sink = MemorySink::new();
        let config = config(2);
        let controller = ScanAdmissionController::new(&service, &sink, &config);
        let (_coordinator, mut shutdown_rx) = ShutdownCoordinator::new();

        let report = controller
            .run(
                &targets(&["a.com", "b.com", "c.com"]),
                &ids(&[("a.com", "id1"), ("b.com", "id2"), ("c.com", "id3")]),
                RunningScanSet::new(),
                &mut shutdown_rx,
            )
            .await;

        assert_eq!(report.submitted.len(), 3);
        assert_eq!(report.ticks, 7);
        assert_eq!(report.deferred_ticks, 4);

        let calls = service.calls();
        for (index, call) in calls.iter().enumerate() {
            if let ServiceCall::CreateScan(_) = call {
                assert!(matches!(calls[index - 1], ServiceCall::RunningScanCount(n) if n < 2));
            }
        }
    }

    #[tokio::test]
    async fn test_refresh_catches_scans_started_after_snapshot() {
        let service = InMemoryScanService::new();
        let sink = MemorySink::new();
        let mut config = config(2);
        config.refresh_running_scans = true;
        let controller = ScanAdmissionController::new(&service, &sink, &config);
        service.start_external_scan("id2");

        let mut running = RunningScanSet::new();
        let mut submitted = HashSet::new();
        let identifiers = ids(&[("b.com", "id2")]);
        let outcome = controller
            .tick(&"b.com".to_string(), &identifiers, &mut running, &mut submitted)
            .await;

        assert_eq!(outcome, TickOutcome::SkippedRunning);
        assert!(running.contains("id2"));
    }

    #[tokio::test]
    async fn test_shutdown_interrupts_pacing_wait() {
        let service = InMemoryScanService::new().with_running_counts(&[2]);
        let sink = MemorySink::new();
        let mut config = config(2);
        config.pacing_interval = Duration::from_secs(60);
        let controller = ScanAdmissionController::new(&service, &sink, &config);
        let (coordinator, mut shutdown_rx) = ShutdownCoordinator::new();
        coordinator.trigger_shutdown();

        let report = controller
            .run(
                &targets(&["a.com", "b.com"]),
                &ids(&[("a.com", "id1"), ("b.com", "id2")]),
                RunningScanSet::new(),
                &mut shutdown_rx,
            )
            .await;

        assert!(report.interrupted);
        assert_eq!(report.ticks, 1);
        assert!(report.submitted.is_empty());
        assert_eq!(
            sink.events().last(),
            Some(&RunEvent::Interrupted { remaining: 2 })
        );
    }

    #[tokio::test]
    async fn test_empty_list_finishes_without_polling() {
        let service = InMemoryScanService::new();
        let sink = MemorySink::new();
        let config = config(2);
        let controller = ScanAdmissionController::new(&service, &sink, &config);
        let (_coordinator, mut shutdown_rx) = ShutdownCoordinator::new();

        let report = controller
            .run(&[], &TargetIdentifierMap::new(), RunningScanSet::new(), &mut shutdown_rx)
            .await;

        assert_eq!(report, AdmissionReport::default());
        assert!(service.calls().is_empty());
    }
}
