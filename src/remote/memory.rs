//! In-memory scanner
//!
//! Scriptable stand-in for the REST service: seeded targets and running
//! scans, a queue of running-count answers, injectable failures, and a log of
//! every call in order. Used to rehearse runs without a scanner appliance.

use async_trait::async_trait;
use std::collections::{HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard};

use super::error::{RemoteError, RemoteResult};
use super::traits::ScanService;
use super::types::{RemoteTargetMap, RunningScanSet, ScanSpeed, TargetId};

/// One observed call, in the order it reached the service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceCall {
    CheckConnectivity,
    ListTargets,
    ListRunningScans,
    CreateTarget(String),
    SetScanSpeed(TargetId, ScanSpeed),
    /// Stats poll together with the count it answered
    RunningScanCount(u64),
    CreateScan(TargetId),
}

#[derive(Debug, Default)]
struct MemoryState {
    reachable: bool,
    targets: RemoteTargetMap,
    running: RunningScanSet,
    running_counts: VecDeque<u64>,
    last_count: u64,
    failing_creates: HashSet<String>,
    failing_scans: HashSet<TargetId>,
    failing_listings: bool,
    failing_stats: usize,
    next_id: usize,
    calls: Vec<ServiceCall>,
}

#[derive(Debug)]
pub struct InMemoryScanService {
    state: Mutex<MemoryState>,
}

impl Default for InMemoryScanService {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryScanService {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MemoryState {
                reachable: true,
                ..MemoryState::default()
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn with_target(self, address: &str, target_id: &str) -> Self {
        self.state()
            .targets
            .insert(address.to_string(), target_id.to_string());
        self
    }

    pub fn with_running_scan(self, target_id: &str) -> Self {
        self.state().running.insert(target_id.to_string());
        self
    }

    /// Answers for successive stats polls; the last one repeats
    pub fn with_running_counts(self, counts: &[u64]) -> Self {
        {
            let mut state = self.state();
            state.running_counts = counts.iter().copied().collect();
            if let Some(first) = counts.first() {
                state.last_count = *first;
            }
        }
        self
    }

    pub fn unreachable(self) -> Self {
        self.state().reachable = false;
        self
    }

    pub fn failing_create(self, address: &str) -> Self {
        self.state().failing_creates.insert(address.to_string());
        self
    }

    pub fn failing_scan(self, target_id: &str) -> Self {
        self.state().failing_scans.insert(target_id.to_string());
        self
    }

    /// Make `GET targets` and `GET scans` fail
    pub fn failing_listings(self) -> Self {
        self.state().failing_listings = true;
        self
    }

    /// Make the next `polls` stats requests fail
    pub fn failing_stats(self, polls: usize) -> Self {
        self.state().failing_stats = polls;
        self
    }

    /// Mark a scan as started by someone else after construction
    pub fn start_external_scan(&self, target_id: &str) {
        self.state().running.insert(target_id.to_string());
    }

    pub fn calls(&self) -> Vec<ServiceCall> {
        self.state().calls.clone()
    }

    pub fn targets(&self) -> RemoteTargetMap {
        self.state().targets.clone()
    }

    pub fn created_targets(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ServiceCall::CreateTarget(address) => Some(address),
                _ => None,
            })
            .collect()
    }

    pub fn created_scans(&self) -> Vec<TargetId> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ServiceCall::CreateScan(id) => Some(id),
                _ => None,
            })
            .collect()
    }
}

fn rejected(endpoint: &str, status: u16) -> RemoteError {
    RemoteError::UnexpectedStatus {
        endpoint: endpoint.to_string(),
        status,
    }
}

#[async_trait]
impl ScanService for InMemoryScanService {
    async fn check_connectivity(&self) -> RemoteResult<()> {
        let mut state = self.state();
        state.calls.push(ServiceCall::CheckConnectivity);
        if state.reachable {
            Ok(())
        } else {
            Err(RemoteError::transport("info", "connection refused"))
        }
    }

    async fn list_targets(&self) -> RemoteResult<RemoteTargetMap> {
        let mut state = self.state();
        state.calls.push(ServiceCall::ListTargets);
        if state.failing_listings {
            return Err(rejected("targets", 500));
        }
        Ok(state.targets.clone())
    }

    async fn list_running_scans(&self) -> RemoteResult<RunningScanSet> {
        let mut state = self.state();
        state.calls.push(ServiceCall::ListRunningScans);
        if state.failing_listings {
            return Err(rejected("scans", 500));
        }
        Ok(state.running.clone())
    }

    async fn create_target(&self, address: &str) -> RemoteResult<TargetId> {
        let mut state = self.state();
        state.calls.push(ServiceCall::CreateTarget(address.to_string()));
        if state.failing_creates.contains(address) {
            return Err(rejected("targets", 409));
        }
        state.next_id += 1;
        let target_id = format!("target-{}", state.next_id);
        state.targets.insert(address.to_string(), target_id.clone());
        Ok(target_id)
    }

    async fn set_scan_speed(&self, target_id: &str, speed: ScanSpeed) -> RemoteResult<()> {
        self.state()
            .calls
            .push(ServiceCall::SetScanSpeed(target_id.to_string(), speed));
        Ok(())
    }

    async fn running_scan_count(&self) -> RemoteResult<u64> {
        let mut state = self.state();
        if state.failing_stats > 0 {
            state.failing_stats -= 1;
            return Err(RemoteError::decode("me/stats", "unexpected end of input"));
        }
        let count = match state.running_counts.pop_front() {
            Some(count) => {
                state.last_count = count;
                count
            }
            None => state.last_count,
        };
        state.calls.push(ServiceCall::RunningScanCount(count));
        Ok(count)
    }

    async fn create_scan(&self, target_id: &str, _profile_id: &str) -> RemoteResult<()> {
        let mut state = self.state();
        state.calls.push(ServiceCall::CreateScan(target_id.to_string()));
        if state.failing_scans.contains(target_id) {
            return Err(rejected("scans", 422));
        }
        state.running.insert(target_id.to_string());
        Ok(())
    }
}
