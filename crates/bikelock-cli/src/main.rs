//! Bike lock simulator.
//!
//! Runs the lock controller against mock hardware and drives the mocks from
//! stdin (see [`simulator`] for the input language). Logs go to stderr,
//! notifications the lock sends to the remote controller go to stdout.

mod simulator;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use bikelock_core::LockConfig;

#[derive(Parser)]
#[command(name = "bikelock-cli", version, about = "Bike lock controller simulator")]
struct Cli {
    /// JSON configuration file. Defaults apply when the file is missing.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the lock's transition history as JSON on exit.
    #[arg(long)]
    history: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start runtime")?;
    let result = runtime.block_on(simulate(cli));
    // A blocking stdin read cannot be cancelled; do not wait for it.
    runtime.shutdown_background();
    result
}

async fn simulate(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    let (mut controller, devices) = simulator::build(config)?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(simulator::relay_outbound(
        devices.link.clone(),
        shutdown_rx.clone(),
    ));
    tokio::spawn(simulator::drive_from_stdin(devices, shutdown_tx.clone()));
    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown signal received");
                let _ = shutdown_tx.send(true);
            }
            Err(e) => warn!(error = %e, "Failed to listen for Ctrl-C"),
        }
    });

    controller.run(shutdown_rx).await;

    if cli.history {
        let history = serde_json::to_string_pretty(controller.state_machine().history())
            .context("Failed to serialize transition history")?;
        println!("{history}");
    }
    Ok(())
}

/// Load the configuration file, falling back to defaults when absent.
fn load_config(path: Option<&Path>) -> Result<LockConfig> {
    let Some(path) = path else {
        return Ok(LockConfig::default());
    };
    if !path.exists() {
        warn!(path = %path.display(), "Config file not found, using defaults");
        return Ok(LockConfig::default());
    }

    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config =
        parse_config(&text).with_context(|| format!("Invalid config in {}", path.display()))?;
    info!(path = %path.display(), "Configuration loaded");
    Ok(config)
}

fn parse_config(text: &str) -> Result<LockConfig> {
    let config: LockConfig = serde_json::from_str(text)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_means_defaults() {
        assert_eq!(load_config(None).unwrap(), LockConfig::default());
        let missing = Path::new("/nonexistent/bikelock.json");
        assert_eq!(load_config(Some(missing)).unwrap(), LockConfig::default());
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = parse_config(r#"{ "warn_threshold_ms": 5000, "alarm_threshold_ms": 8000 }"#)
            .unwrap();
        assert_eq!(config.warn_threshold_ms, 5_000);
        assert_eq!(config.alarm_threshold_ms, 8_000);
        assert_eq!(config.cycle_interval_ms, LockConfig::default().cycle_interval_ms);
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(parse_config(r#"{ "warn_threshold_ms": 20000 }"#).is_err());
        assert!(parse_config("not json").is_err());
    }
}
