//! Status events emitted during a run

use std::fmt;

/// How loudly an event should be reported
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventSeverity {
    Info,
    Detail,
    Warning,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RunEvent {
    Connected {
        host: String,
    },
    ConnectivityFailed {
        host: String,
        reason: String,
    },
    TargetsLoaded {
        count: usize,
    },
    TargetFileUnreadable {
        path: String,
        reason: String,
    },
    RemoteTargetsListed {
        count: usize,
    },
    /// A listing or stats query failed and the run continues without it
    RemoteQueryFailed {
        query: &'static str,
        reason: String,
    },
    TargetExists {
        address: String,
        target_id: String,
    },
    DuplicateTarget {
        address: String,
    },
    TargetCreated {
        address: String,
        target_id: String,
    },
    TargetCreateFailed {
        address: String,
        reason: String,
    },
    ScanSpeedFailed {
        address: String,
        reason: String,
    },
    RunningScansListed {
        count: usize,
    },
    CapacityWait {
        running: u64,
        max: usize,
    },
    ScanSkippedRunning {
        address: String,
    },
    ScanSkippedUnregistered {
        address: String,
    },
    ScanSkippedDuplicate {
        address: String,
    },
    ScanStarted {
        address: String,
        target_id: String,
    },
    ScanStartFailed {
        address: String,
        reason: String,
    },
    Interrupted {
        remaining: usize,
    },
    AllScansStarted {
        submitted: usize,
    },
}

impl RunEvent {
    pub fn severity(&self) -> EventSeverity {
        match self {
            RunEvent::ConnectivityFailed { .. }
            | RunEvent::TargetFileUnreadable { .. }
            | RunEvent::RemoteQueryFailed { .. }
            | RunEvent::TargetCreateFailed { .. }
            | RunEvent::ScanStartFailed { .. } => EventSeverity::Error,
            RunEvent::ScanSpeedFailed { .. }
            | RunEvent::ScanSkippedUnregistered { .. }
            | RunEvent::Interrupted { .. } => EventSeverity::Warning,
            RunEvent::CapacityWait { .. } | RunEvent::DuplicateTarget { .. } => {
                EventSeverity::Detail
            }
            _ => EventSeverity::Info,
        }
    }
}

impl fmt::Display for RunEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunEvent::Connected { host } => write!(f, "Connected to scanner API at {}", host),
            RunEvent::ConnectivityFailed { host, reason } => {
                write!(f, "Cannot reach scanner API at {}: {}", host, reason)
            }
            RunEvent::TargetsLoaded { count } => write!(f, "Loaded {} targets", count),
            RunEvent::TargetFileUnreadable { path, reason } => {
                write!(f, "Failed to read target file {}: {}", path, reason)
            }
            RunEvent::RemoteTargetsListed { count } => {
                write!(f, "Scanner already has {} targets", count)
            }
            RunEvent::RemoteQueryFailed { query, reason } => {
                write!(f, "Failed to fetch {}: {}", query, reason)
            }
            RunEvent::TargetExists { address, .. } => {
                write!(f, "{} already exists, skipping registration", address)
            }
            RunEvent::DuplicateTarget { address } => {
                write!(f, "{} is listed more than once, using the first entry", address)
            }
            RunEvent::TargetCreated { address, target_id } => {
                write!(f, "{} registered as {}", address, target_id)
            }
            RunEvent::TargetCreateFailed { address, reason } => {
                write!(f, "{} could not be registered: {}", address, reason)
            }
            RunEvent::ScanSpeedFailed { address, reason } => {
                write!(f, "{} scan speed not applied: {}", address, reason)
            }
            RunEvent::RunningScansListed { count } => {
                write!(f, "{} scans currently running or scheduled", count)
            }
            RunEvent::CapacityWait { running, max } => {
                write!(f, "Scanner busy ({}/{} running), waiting", running, max)
            }
            RunEvent::ScanSkippedRunning { address } => {
                write!(f, "{} is already being scanned, skipping", address)
            }
            RunEvent::ScanSkippedUnregistered { address } => {
                write!(f, "{} has no target id, skipping scan", address)
            }
            RunEvent::ScanSkippedDuplicate { address } => {
                write!(f, "{} was already submitted in this run, skipping", address)
            }
            RunEvent::ScanStarted { address, .. } => write!(f, "{} scan started", address),
            RunEvent::ScanStartFailed { address, reason } => {
                write!(f, "{} scan failed to start: {}", address, reason)
            }
            RunEvent::Interrupted { remaining } => write!(
                f,
                "Shutdown requested, {} targets left without an admission decision",
                remaining
            ),
            RunEvent::AllScansStarted { submitted } => {
                write!(f, "All scan tasks started ({} submitted)", submitted)
            }
        }
    }
}
