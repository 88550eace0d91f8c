//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::path::Path;
use std::time::Duration;

use scanpace::app::error::RunError;
use scanpace::app::orchestrator::{Orchestrator, RunSummary};
use scanpace::core::config::RunConfig;
use scanpace::core::shutdown::ShutdownCoordinator;
use scanpace::notifications::api::{MemorySink, RunEvent};
use scanpace::remote::{InMemoryScanService, ServiceCall};

/// Write `lines` to a target file inside `dir`
pub fn write_target_file(dir: &Path, lines: &[&str]) -> std::path::PathBuf {
    let path = dir.join("target.txt");
    let mut contents = lines.join("\n");
    contents.push('\n');
    std::fs::write(&path, contents).expect("write target file");
    path
}

/// Configuration with millisecond pacing so tests do not sleep for real
pub fn fast_config(target_file: &Path, max_tasks: usize) -> RunConfig {
    let mut config = RunConfig::new("https://scanner.test:13443/", "test-key");
    config.target_file = target_file.to_path_buf();
    config.max_concurrent_tasks = max_tasks;
    config.pacing_interval = Duration::from_millis(1);
    config
}

/// Run the orchestrator once against the in-memory scanner
pub async fn run_once(
    config: &RunConfig,
    service: &InMemoryScanService,
    sink: &MemorySink,
) -> Result<RunSummary, RunError> {
    let (_coordinator, mut shutdown_rx) = ShutdownCoordinator::new();
    Orchestrator::new(config, service, sink)
        .run(&mut shutdown_rx)
        .await
}

/// Only the calls that change scanner state or poll capacity
pub fn admission_calls(service: &InMemoryScanService) -> Vec<ServiceCall> {
    service
        .calls()
        .into_iter()
        .filter(|call| {
            matches!(
                call,
                ServiceCall::RunningScanCount(_) | ServiceCall::CreateScan(_)
            )
        })
        .collect()
}

pub fn count_events(sink: &MemorySink, predicate: impl Fn(&RunEvent) -> bool) -> usize {
    sink.events().iter().filter(|e| predicate(e)).count()
}
