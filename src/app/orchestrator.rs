//! End-to-end run
//!
//! Connectivity probe, target file, reconciliation, one running-scan
//! snapshot, then the admission pass. Only a failed probe stops the run;
//! every later failure degrades it and is reported as an event.

use std::fmt;
use tokio::sync::broadcast;

use super::error::RunError;
use crate::core::config::RunConfig;
use crate::notifications::api::{EventSink, RunEvent};
use crate::remote::traits::ScanService;
use crate::remote::types::{RemoteTargetMap, RunningScanSet};
use crate::scheduler::{AdmissionReport, ScanAdmissionController};
use crate::targets::{load_targets, TargetReconciler};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub targets_loaded: usize,
    pub existing_targets: usize,
    pub created_targets: usize,
    pub registration_failures: usize,
    pub duplicate_entries: usize,
    pub admission: AdmissionReport,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} targets: {} existing, {} registered, {} failed registration, {} duplicate; \
             {} scans submitted, {} already running, {} unregistered, {} failed to start; \
             {} ticks ({} waiting)",
            self.targets_loaded,
            self.existing_targets,
            self.created_targets,
            self.registration_failures,
            self.duplicate_entries,
            self.admission.submitted.len(),
            self.admission.skipped_running,
            self.admission.skipped_unregistered,
            self.admission.submit_failures,
            self.admission.ticks,
            self.admission.deferred_ticks
        )
    }
}

pub struct Orchestrator<'a> {
    config: &'a RunConfig,
    service: &'a dyn ScanService,
    sink: &'a dyn EventSink,
}

impl<'a> Orchestrator<'a> {
    pub fn new(config: &'a RunConfig, service: &'a dyn ScanService, sink: &'a dyn EventSink) -> Self {
        Self {
            config,
            service,
            sink,
        }
    }

    pub async fn run(&self, shutdown_rx: &mut broadcast::Receiver<()>) -> Result<RunSummary, RunError> {
        let host = self.config.host().to_string();
        if let Err(source) = self.service.check_connectivity().await {
            self.sink.emit(RunEvent::ConnectivityFailed {
                host: host.clone(),
                reason: source.to_string(),
            });
            return Err(RunError::Connectivity { host, source });
        }
        self.sink.emit(RunEvent::Connected { host });

        let targets = match load_targets(&self.config.target_file).await {
            Ok(targets) => targets,
            Err(e) => {
                self.sink.emit(RunEvent::TargetFileUnreadable {
                    path: self.config.target_file.display().to_string(),
                    reason: e.to_string(),
                });
                Vec::new()
            }
        };
        self.sink.emit(RunEvent::TargetsLoaded {
            count: targets.len(),
        });

        let remote = match self.service.list_targets().await {
            Ok(remote) => remote,
            Err(e) => {
                self.sink.emit(RunEvent::RemoteQueryFailed {
                    query: "existing targets",
                    reason: e.to_string(),
                });
                RemoteTargetMap::new()
            }
        };
        self.sink.emit(RunEvent::RemoteTargetsListed {
            count: remote.len(),
        });

        let reconciliation = TargetReconciler::new(self.service, self.sink, self.config.scan_speed)
            .reconcile(&targets, &remote)
            .await;

        let running = match self.service.list_running_scans().await {
            Ok(running) => running,
            Err(e) => {
                self.sink.emit(RunEvent::RemoteQueryFailed {
                    query: "running scans",
                    reason: e.to_string(),
                });
                RunningScanSet::new()
            }
        };
        self.sink.emit(RunEvent::RunningScansListed {
            count: running.len(),
        });

        let admission = ScanAdmissionController::new(self.service, self.sink, self.config)
            .run(&targets, &reconciliation.identifiers, running, shutdown_rx)
            .await;

        if !admission.interrupted {
            self.sink.emit(RunEvent::AllScansStarted {
                submitted: admission.submitted.len(),
            });
        }

        Ok(RunSummary {
            targets_loaded: targets.len(),
            existing_targets: reconciliation.existing,
            created_targets: reconciliation.created,
            registration_failures: reconciliation.failed,
            duplicate_entries: reconciliation.duplicates,
            admission,
        })
    }
}
