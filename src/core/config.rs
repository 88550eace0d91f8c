//! Immutable run configuration
//!
//! Built once at startup from defaults, the configuration file and the
//! command line, then borrowed by every component for the rest of the run.

use crate::remote::profiles::ScanProfile;
use crate::remote::types::{Criticality, ScanSpeed};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_TARGET_FILE: &str = "target.txt";
pub const DEFAULT_MAX_TASKS: usize = 2;
pub const DEFAULT_PACING_SECS: u64 = 10;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_TARGET_DESCRIPTION: &str = "awvs-auto";

#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    /// Scanner root, always ending in `/`; API paths are appended as `api/v1/...`
    pub base_url: String,
    pub api_key: String,
    pub scan_profile_id: String,
    pub scan_speed: ScanSpeed,
    /// Ceiling on the scanner-wide running scan count
    pub max_concurrent_tasks: usize,
    /// Wait between admission ticks
    pub pacing_interval: Duration,
    pub target_file: PathBuf,
    /// Skip TLS certificate verification (self-signed appliance certificates)
    pub accept_invalid_certs: bool,
    pub request_timeout: Duration,
    pub target_criticality: Criticality,
    pub target_description: String,
    /// Re-fetch the running-scan set on every tick that has capacity
    pub refresh_running_scans: bool,
}

impl RunConfig {
    /// Configuration for `base_url` with every other value at its default
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            scan_profile_id: ScanProfile::Full.id().to_string(),
            scan_speed: ScanSpeed::default(),
            max_concurrent_tasks: DEFAULT_MAX_TASKS,
            pacing_interval: Duration::from_secs(DEFAULT_PACING_SECS),
            target_file: PathBuf::from(DEFAULT_TARGET_FILE),
            accept_invalid_certs: true,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            target_criticality: Criticality::default(),
            target_description: DEFAULT_TARGET_DESCRIPTION.to_string(),
            refresh_running_scans: false,
        }
    }

    /// Host part of the base URL, for status lines
    pub fn host(&self) -> &str {
        let without_scheme = self
            .base_url
            .split_once("://")
            .map_or(self.base_url.as_str(), |(_, rest)| rest);
        without_scheme.split('/').next().unwrap_or(without_scheme)
    }
}
