//! Process entry: argument layering, logging, then the run itself

use clap::Parser;
use std::io::IsTerminal;

use super::cli::{load_config_file, Args};
use super::error::RunError;
use super::orchestrator::Orchestrator;
use crate::core::config::RunConfig;
use crate::core::error_handling::log_error_with_context;
use crate::core::logging::{effective_level, init_logging, LogFormat};
use crate::core::shutdown::ShutdownCoordinator;
use crate::notifications::api::LogSink;
use crate::remote::client::RemoteServiceClient;

/// Exit status when a run was stopped by a signal
pub const EXIT_INTERRUPTED: i32 = 130;

/// Initialize application startup
pub fn startup() {
    let cli = Args::parse();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: failed to start async runtime: {}", e);
            std::process::exit(1);
        }
    };

    let code = runtime.block_on(run(cli));
    drop(runtime);
    std::process::exit(code);
}

/// Resolve configuration, run once and map the outcome to an exit status
pub async fn run(cli: Args) -> i32 {
    // Logging is not up yet, so configuration file problems go to stderr
    let mut args = Args::new();
    match load_config_file(cli.config_file.clone()).await {
        Ok(Some(table)) => {
            if let Err(e) = Args::apply_toml_values(&mut args, &table) {
                eprintln!("Error in configuration file: {}", e);
                return 1;
            }
        }
        Ok(None) => {}
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    }
    args.overlay(&cli);

    let color = use_color(&args);
    colored::control::set_override(color);

    let level = effective_level(args.log_level.as_deref(), args.verbosity());
    let log_file = args.log_file.as_ref().map(|p| p.to_string_lossy().to_string());
    if let Err(e) = init_logging(
        level,
        LogFormat::parse(args.log_format.as_deref()),
        log_file.as_deref(),
        color,
    ) {
        eprintln!("Error: failed to initialise logging: {}", e);
        return 1;
    }

    let config = match args.to_run_config() {
        Ok(config) => config,
        Err(e) => {
            log_error_with_context(&RunError::from(e), "Invalid configuration");
            return 1;
        }
    };
    log_banner(&config);

    let client = match RemoteServiceClient::new(&config) {
        Ok(client) => client,
        Err(e) => {
            log_error_with_context(&RunError::Client(e), "Failed to set up the scanner client");
            return 1;
        }
    };

    let sink = LogSink;
    let orchestrator = Orchestrator::new(&config, &client, &sink);
    let outcome = ShutdownCoordinator::guard(|mut shutdown_rx| async move {
        orchestrator.run(&mut shutdown_rx).await
    })
    .await;

    match outcome {
        Ok(summary) => {
            log::info!("Summary: {}", summary);
            if summary.admission.interrupted {
                EXIT_INTERRUPTED
            } else {
                0
            }
        }
        Err(e) => {
            log_error_with_context(&e, "Scanner API unavailable, nothing was changed");
            1
        }
    }
}

fn use_color(args: &Args) -> bool {
    match args.color_choice() {
        Some(forced) => forced,
        None => std::io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none(),
    }
}

fn log_banner(config: &RunConfig) {
    log::info!(
        "scanpace {} ({}, built {})",
        env!("CARGO_PKG_VERSION"),
        crate::GIT_HASH,
        crate::BUILD_TIME
    );
    log::info!("Scanner API: {}", config.base_url);
    log::info!(
        "Targets from {}, at most {} running scans, checking every {}s",
        config.target_file.display(),
        config.max_concurrent_tasks,
        config.pacing_interval.as_secs()
    );
    log::debug!(
        "Profile {}, speed {}, criticality {}",
        config.scan_profile_id,
        config.scan_speed,
        config.target_criticality
    );
}
