//! Target reconciliation
//!
//! Maps each local target to the scanner's identifier, registering the ones
//! the scanner does not know yet. Runs to completion before any scan is
//! admitted.

use std::collections::HashSet;

use crate::notifications::api::{EventSink, RunEvent};
use crate::remote::traits::ScanService;
use crate::remote::types::{RemoteTargetMap, ScanSpeed, Target, TargetIdentifierMap};

/// Outcome of reconciling a target list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    /// Every target that already existed or was registered; nothing else
    pub identifiers: TargetIdentifierMap,
    pub existing: usize,
    pub created: usize,
    pub failed: usize,
    pub duplicates: usize,
}

pub struct TargetReconciler<'a> {
    service: &'a dyn ScanService,
    sink: &'a dyn EventSink,
    scan_speed: ScanSpeed,
}

impl<'a> TargetReconciler<'a> {
    pub fn new(service: &'a dyn ScanService, sink: &'a dyn EventSink, scan_speed: ScanSpeed) -> Self {
        Self {
            service,
            sink,
            scan_speed,
        }
    }

    /// Walk `targets` in order against the scanner's current `remote` targets
    ///
    /// A failed registration drops only that target; it gets no identifier and
    /// a repeated entry for it is not retried.
    pub async fn reconcile(&self, targets: &[Target], remote: &RemoteTargetMap) -> Reconciliation {
        let mut result = Reconciliation::default();
        let mut failed: HashSet<&str> = HashSet::new();

        for address in targets {
            if result.identifiers.contains_key(address) || failed.contains(address.as_str()) {
                result.duplicates += 1;
                self.sink.emit(RunEvent::DuplicateTarget {
                    address: address.clone(),
                });
                continue;
            }

            if let Some(target_id) = remote.get(address) {
                result.identifiers.insert(address.clone(), target_id.clone());
                result.existing += 1;
                self.sink.emit(RunEvent::TargetExists {
                    address: address.clone(),
                    target_id: target_id.clone(),
                });
                continue;
            }

            match self.service.create_target(address).await {
                Ok(target_id) => {
                    result.created += 1;
                    self.sink.emit(RunEvent::TargetCreated {
                        address: address.clone(),
                        target_id: target_id.clone(),
                    });
                    // The target stays usable even if its speed could not be set
                    if let Err(e) = self.service.set_scan_speed(&target_id, self.scan_speed).await {
                        self.sink.emit(RunEvent::ScanSpeedFailed {
                            address: address.clone(),
                            reason: e.to_string(),
                        });
                    }
                    result.identifiers.insert(address.clone(), target_id);
                }
                Err(e) => {
                    result.failed += 1;
                    failed.insert(address.as_str());
                    self.sink.emit(RunEvent::TargetCreateFailed {
                        address: address.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        result
    }
}
