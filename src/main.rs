//! ansd - in-process advanced notification service
//!
//! Runs the notification service and answers JSON control lines read from
//! stdin. Logs go to stderr so stdout carries only protocol responses.

use ansd::{app::App, cli::Cli, config::Config, control, metrics::logging_recorder::LoggingRecorder};
use anyhow::{Context, Result};
use clap::Parser;
use std::time::Duration;
use tokio::io::BufReader;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration by layering sources: defaults, file, environment, and CLI args.
    let config = Config::load(&cli)?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .context("invalid log level")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!("ansd starting up...");
    info!("-------------------- Configuration --------------------");
    info!("Log Level: {}", config.log_level);
    info!("Job Queue Capacity: {}", config.service.job_queue_capacity);
    info!("Max Active Per Bundle: {}", config.service.max_active_per_bundle);
    info!("Enforce Unremovable: {}", config.service.enforce_unremovable);
    info!("Log Events: {}", config.service.log_events);
    info!("Do-Not-Disturb Supported: {}", config.dnd.supported);
    info!("Log Metrics: {}", config.metrics.log_metrics);
    info!("Preinstalled Bundles: {}", config.bundles.len());
    info!("-------------------------------------------------------");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let metrics_task = if config.metrics.log_metrics {
        info!(
            "Logging recorder enabled. Metrics will be printed every {} seconds.",
            config.metrics.log_aggregation_seconds
        );
        let (recorder, handle) = LoggingRecorder::new(
            Duration::from_secs(config.metrics.log_aggregation_seconds),
            shutdown_rx.clone(),
        );
        metrics::set_global_recorder(recorder)
            .map_err(|e| anyhow::anyhow!("failed to install logging recorder: {}", e))?;
        Some(handle)
    } else {
        None
    };

    let app = App::builder(config).build(shutdown_rx).await?;

    tokio::select! {
        result = control::run(&app, BufReader::new(tokio::io::stdin()), tokio::io::stdout()) => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl-C received.");
        }
    }

    info!("Initiating graceful shutdown...");
    // Every receiver may already be gone if all tasks ended.
    let _ = shutdown_tx.send(true);
    app.run().await?;

    if let Some(handle) = metrics_task {
        handle.await.context("metrics logging task failed")?;
    }

    info!("ansd shut down.");
    Ok(())
}
