//! Command-line arguments
//!
//! Every option is optional at parse time so the configuration file can fill
//! the gaps; [`Args::overlay`] applies command-line values on top and
//! [`Args::to_run_config`] validates the merged result.

use clap::{ArgAction, Parser};
use std::path::PathBuf;

use crate::core::config::RunConfig;
use crate::core::validation::{
    validate_api_key, validate_base_url, validate_positive_int, validate_seconds, ValidationError,
};
use crate::remote::profiles::resolve_profile;
use crate::remote::types::{Criticality, ScanSpeed};

fn long_version() -> String {
    format!(
        "{} (commit {}, built {})",
        env!("CARGO_PKG_VERSION"),
        crate::GIT_HASH,
        crate::BUILD_TIME
    )
}

#[derive(Parser, Debug, Clone, Default, PartialEq)]
#[command(name = "scanpace")]
#[command(about = "Register targets with a vulnerability scanner and start scans without exceeding its task limit")]
#[command(version, long_version = long_version())]
pub struct Args {
    /// Configuration file path
    #[arg(short = 'c', long = "config-file", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Scanner base URL, e.g. https://10.0.0.5:13443/
    #[arg(short = 'u', long = "url", value_name = "URL")]
    pub url: Option<String>,

    /// API key sent in the X-Auth header
    #[arg(short = 'k', long = "api-key", value_name = "KEY")]
    pub api_key: Option<String>,

    /// Target list, one address per line [default: target.txt]
    #[arg(short = 't', long = "targets", value_name = "FILE")]
    pub targets: Option<PathBuf>,

    /// Scan profile name (full, high-risk, xss, ...) or profile identifier [default: full]
    #[arg(short = 'p', long = "profile", value_name = "PROFILE")]
    pub profile: Option<String>,

    /// Scan speed applied to newly registered targets [default: moderate]
    #[arg(short = 's', long = "speed", value_name = "SPEED", value_parser = ["sequential", "slow", "moderate", "fast"])]
    pub speed: Option<String>,

    /// Maximum scans running on the scanner at once [default: 2]
    #[arg(short = 'm', long = "max-tasks", value_name = "COUNT")]
    pub max_tasks: Option<usize>,

    /// Seconds between admission checks [default: 10]
    #[arg(short = 'i', long = "interval", value_name = "SECONDS")]
    pub interval: Option<u64>,

    /// Per-request timeout in seconds [default: 30]
    #[arg(long = "timeout", value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// Criticality for newly registered targets [default: normal]
    #[arg(long = "criticality", value_name = "LEVEL", value_parser = ["critical", "high", "normal", "low"])]
    pub criticality: Option<String>,

    /// Description for newly registered targets [default: awvs-auto]
    #[arg(long = "description", value_name = "TEXT")]
    pub description: Option<String>,

    /// Accept self-signed or otherwise invalid TLS certificates (default)
    #[arg(long = "insecure", conflicts_with = "verify_tls")]
    pub insecure: bool,

    /// Verify the scanner's TLS certificate
    #[arg(long = "verify-tls")]
    pub verify_tls: bool,

    /// Re-check running scans before every submission instead of once per run
    #[arg(long = "refresh-running")]
    pub refresh_running: bool,

    /// More output (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,

    /// Less output (repeatable)
    #[arg(short = 'q', long = "quiet", action = ArgAction::Count)]
    pub quiet: u8,

    /// Force colored output
    #[arg(long = "color", conflicts_with = "no_color")]
    pub color: bool,

    /// Disable colored output
    #[arg(long = "no-color")]
    pub no_color: bool,

    /// Log level
    #[arg(short = 'l', long = "log-level", value_name = "LEVEL", value_parser = ["trace", "debug", "info", "warn", "error", "off"])]
    pub log_level: Option<String>,

    /// Log file path (use 'none' to disable file logging)
    #[arg(short = 'f', long = "log-file", value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Log output format
    #[arg(short = 'o', long = "log-format", value_name = "FORMAT", value_parser = ["text", "ext", "json"])]
    pub log_format: Option<String>,
}

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    /// `Some(true)` to skip certificate checks, `Some(false)` to verify, `None` if unset
    pub fn tls_choice(&self) -> Option<bool> {
        if self.insecure {
            Some(true)
        } else if self.verify_tls {
            Some(false)
        } else {
            None
        }
    }

    /// `Some(enabled)` when colour was forced either way
    pub fn color_choice(&self) -> Option<bool> {
        if self.color {
            Some(true)
        } else if self.no_color {
            Some(false)
        } else {
            None
        }
    }

    pub fn verbosity(&self) -> i8 {
        (self.verbose.min(5) as i8) - (self.quiet.min(5) as i8)
    }

    /// Apply values given on the command line over this (file-derived) set
    pub fn overlay(&mut self, cli: &Args) {
        fn take<T: Clone>(target: &mut Option<T>, value: &Option<T>) {
            if value.is_some() {
                target.clone_from(value);
            }
        }

        take(&mut self.config_file, &cli.config_file);
        take(&mut self.url, &cli.url);
        take(&mut self.api_key, &cli.api_key);
        take(&mut self.targets, &cli.targets);
        take(&mut self.profile, &cli.profile);
        take(&mut self.speed, &cli.speed);
        take(&mut self.max_tasks, &cli.max_tasks);
        take(&mut self.interval, &cli.interval);
        take(&mut self.timeout, &cli.timeout);
        take(&mut self.criticality, &cli.criticality);
        take(&mut self.description, &cli.description);
        take(&mut self.log_level, &cli.log_level);
        take(&mut self.log_file, &cli.log_file);
        take(&mut self.log_format, &cli.log_format);

        if cli.tls_choice().is_some() {
            self.insecure = cli.insecure;
            self.verify_tls = cli.verify_tls;
        }
        if cli.color_choice().is_some() {
            self.color = cli.color;
            self.no_color = cli.no_color;
        }
        self.refresh_running |= cli.refresh_running;
        self.verbose = self.verbose.saturating_add(cli.verbose);
        self.quiet = self.quiet.saturating_add(cli.quiet);
    }

    /// Validate the merged arguments into the run configuration
    pub fn to_run_config(&self) -> Result<RunConfig, ValidationError> {
        let base_url = validate_base_url(self.url.as_deref().unwrap_or_default())?;
        let api_key = validate_api_key(self.api_key.as_deref().unwrap_or_default())?;
        let mut config = RunConfig::new(base_url, api_key);

        if let Some(profile) = &self.profile {
            config.scan_profile_id = resolve_profile(profile)?;
        }
        if let Some(speed) = &self.speed {
            config.scan_speed = speed.parse::<ScanSpeed>().map_err(|_| {
                ValidationError::new(format!(
                    "Invalid scan speed '{}'. Use sequential, slow, moderate or fast",
                    speed
                ))
            })?;
        }
        if let Some(level) = &self.criticality {
            config.target_criticality = level.parse::<Criticality>().map_err(|_| {
                ValidationError::new(format!(
                    "Invalid criticality '{}'. Use critical, high, normal or low",
                    level
                ))
            })?;
        }
        if let Some(max_tasks) = self.max_tasks {
            config.max_concurrent_tasks = validate_positive_int("max-tasks", max_tasks)?;
        }
        if let Some(interval) = self.interval {
            config.pacing_interval = validate_seconds("interval", interval)?;
        }
        if let Some(timeout) = self.timeout {
            config.request_timeout = validate_seconds("timeout", timeout)?;
        }
        if let Some(description) = &self.description {
            if description.trim().is_empty() {
                return Err(ValidationError::new("Target description cannot be empty"));
            }
            config.target_description = description.trim().to_string();
        }
        if let Some(targets) = &self.targets {
            config.target_file = targets.clone();
        }
        if let Some(accept_invalid) = self.tls_choice() {
            config.accept_invalid_certs = accept_invalid;
        }
        config.refresh_running_scans = self.refresh_running;

        Ok(config)
    }
}
