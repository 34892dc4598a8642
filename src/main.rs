//! perf-monitor: live terminal dashboard for log-throughput benchmark runs.
//!
//! A background sampler publishes immutable metric snapshots; the
//! foreground render loop draws whatever snapshot is current. The two
//! cadences are independent, so the display always shows the latest known
//! state rather than a guaranteed-delivery stream.

mod cli;
mod commands;
mod config;
mod logs;
mod process;
mod render;
mod sampler;
mod snapshot;
mod system;
mod term;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::signal;
use tracing::{info, warn, Level};

use cli::{Args, Commands};
use config::Config;
use sampler::{SampleError, SamplerConfig, TickState};
use snapshot::SharedSnapshot;
use term::CrosstermTerminal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = config::resolve_config(&args)?;

    if args.check_config {
        if let Err(e) = config::validate_effective_config(&config) {
            eprintln!("❌ Configuration invalid: {}", e);
            std::process::exit(1);
        }
        println!("✅ Configuration is valid");
        return Ok(());
    }
    if args.show_config {
        return config::show_config(&config, args.config_format);
    }

    config::validate_effective_config(&config)?;

    if let Some(command) = args.command {
        setup_logging(&config, false)?;
        return match command {
            Commands::Check { proc, logs, all } => {
                commands::check::command_check(proc, logs, all, &config)
            }
            Commands::Config {
                output,
                format,
                commented,
            } => config::command_config(output, format, commented),
            Commands::GenLogs {
                dir,
                records,
                record_bytes,
                append,
            } => {
                let dir = dir
                    .or_else(|| config.log_dir.clone())
                    .unwrap_or_else(|| PathBuf::from(config::DEFAULT_LOG_DIR));
                commands::generate::command_gen_logs(dir, records, record_bytes, append)
            }
        };
    }

    // Dashboard mode: structured logs go to a file so they never draw
    // over the alternate screen.
    setup_logging(&config, true)?;
    info!("starting perf-monitor dashboard");

    let sampler_config = SamplerConfig::new(
        config
            .log_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(config::DEFAULT_LOG_DIR)),
        config
            .process_pattern
            .clone()
            .unwrap_or_else(|| config::DEFAULT_PROCESS_PATTERN.to_string()),
        Duration::from_millis(
            config
                .sample_interval_ms
                .unwrap_or(config::DEFAULT_SAMPLE_INTERVAL_MS),
        ),
    );

    // First sample up front: a dashboard with no working data source
    // should fail loudly at startup instead of rendering zeros forever.
    let shared = Arc::new(SharedSnapshot::new());
    let mut state = TickState::new();
    match sampler::tick(&sampler_config, &mut state) {
        Ok(snapshot) => shared.publish(snapshot),
        Err(SampleError::Fatal(msg)) => anyhow::bail!(msg),
        Err(SampleError::Transient(e)) => {
            warn!("initial sample failed; dashboard starts empty: {}", e)
        }
    }

    let terminal = CrosstermTerminal::new().context("failed to initialize terminal")?;
    let renderer = render::Renderer::new(terminal);
    let render_interval = Duration::from_millis(
        config
            .render_interval_ms
            .unwrap_or(config::DEFAULT_RENDER_INTERVAL_MS),
    );

    let stop = Arc::new(AtomicBool::new(false));
    let sampler_task = tokio::spawn(sampler::run(
        sampler_config,
        shared.clone(),
        stop.clone(),
        state,
    ));

    let render_result = tokio::select! {
        result = render::run(renderer, shared, render_interval, stop.clone()) => result,
        _ = shutdown_signal() => Ok(()),
    };

    stop.store(true, Ordering::Relaxed);
    sampler_task.abort();
    let _ = sampler_task.await;

    render_result.context("render loop failed")?;
    info!("perf-monitor stopped");
    Ok(())
}

/// Resolves when SIGINT or SIGTERM arrives.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("received SIGINT, shutting down");
        }
        _ = terminate => {
            info!("received SIGTERM, shutting down");
        }
    }
}

/// Initializes the tracing subscriber. Dashboard mode writes to the
/// configured log file; subcommands log to stderr.
fn setup_logging(config: &Config, dashboard: bool) -> anyhow::Result<()> {
    let level = match config.log_level.as_deref().unwrap_or("info") {
        // Off not fully supported, use ERROR as minimal.
        "off" | "error" => Level::ERROR,
        "warn" => Level::WARN,
        "debug" => Level::DEBUG,
        "trace" => Level::TRACE,
        _ => Level::INFO,
    };

    if dashboard {
        let path = config
            .log_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(config::DEFAULT_LOG_FILE));
        let file = std::fs::File::create(&path)
            .with_context(|| format!("failed to open log file {}", path.display()))?;
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(level)
            .with_target(true)
            .with_ansi(false)
            .with_writer(Arc::new(file))
            .finish();
        tracing::subscriber::set_global_default(subscriber)
            .context("failed to set tracing subscriber")?;
    } else {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(level)
            .with_target(true)
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::set_global_default(subscriber)
            .context("failed to set tracing subscriber")?;
    }

    Ok(())
}
