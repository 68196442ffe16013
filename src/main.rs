//! OpenSearch Backup Adapter
//!
//! Provides CLI interface for backup, restore and tracking requests
//! orchestrated through Curator

// opensearch-backup-adapter/src/main.rs
mod adapter;
mod backup;
mod cluster;
mod config;
mod curator;
mod errors;
mod restore;
mod utils;
#[cfg(test)]
mod testing;

use adapter::BackupAdapter;
use anyhow::{Context, Result};
use backup::track::ActionTrack;
use config::{AppConfig, RawJsonConfig};
use errors::AdapterError;
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use utils::context::RequestContext;

const USAGE: &str = "usage: backup-adapter <command> [args]

commands:
  backup <db,...>                        collect a new backup
  track-backup <backup-id>               report backup status
  restore <backup-id> <db,...> [--regenerate-names]
                                         restore databases from a backup
  track-restore <backup-id>              report restore status
  track-indices <backup-id> <index,...>  report restore status from index recovery
  evict <backup-id>                      delete a backup";

const EXIT_SETUP_ERROR: u8 = 2;

/// Main entry point for the backup adapter
#[tokio::main]
async fn main() -> ExitCode {
    match run_app().await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            let status = exit_status(&e);
            if status == EXIT_SETUP_ERROR {
                eprintln!("Fatal configuration error: {:?}", e);
            } else {
                eprintln!("Error: {:?}", e);
            }
            ExitCode::from(status)
        }
    }
}

/// Setup defects (bad configuration, unbuildable clients) exit with 2,
/// failed operations with 1.
fn exit_status(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<AdapterError>() {
        Some(e) if e.is_fatal() => EXIT_SETUP_ERROR,
        _ => 1,
    }
}

async fn run_app() -> Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let args: Vec<String> = env::args().skip(1).collect();
    let Some(command) = args.first().map(|c| c.trim().to_string()) else {
        eprintln!("{}", USAGE);
        anyhow::bail!("No command given");
    };

    // config.json is optional; the environment alone is enough.
    let config_path = PathBuf::from("config.json");
    let raw = if config_path.exists() {
        AppConfig::load_from_json(&config_path)
            .context(format!("Failed to load application configuration from {}", config_path.display()))?
    } else {
        RawJsonConfig::default()
    };
    let app_config = AppConfig::resolve(raw, |key| env::var(key).ok())
        .context("Failed to resolve application configuration")?;
    let adapter = BackupAdapter::from_config(&app_config).context("Failed to create backup adapter")?;

    let shutdown = CancellationToken::new();
    let ctx = RequestContext::with_request_id(env::var("REQUEST_ID").unwrap_or_default())
        .with_cancellation(shutdown.child_token());
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling request");
            shutdown.cancel();
        }
    });

    let track = match command.as_str() {
        "backup" => {
            let dbs = parse_index_list(arg(&args, 1, "database list")?);
            adapter.collect_backup(&ctx, &dbs).await.context("Backup request failed")?
        }
        "track-backup" => adapter.track_backup(&ctx, arg(&args, 1, "backup id")?).await,
        "restore" => {
            let backup_id = arg(&args, 1, "backup id")?;
            let dbs = parse_index_list(arg(&args, 2, "database list")?);
            let regenerate_names = args.iter().skip(3).any(|a| a == "--regenerate-names");
            adapter
                .restore_backup(&ctx, backup_id, &dbs, regenerate_names)
                .await
                .context("Restore request failed")?
        }
        "track-restore" => adapter.track_restore(&ctx, arg(&args, 1, "backup id")?).await,
        "track-indices" => {
            let backup_id = arg(&args, 1, "backup id")?;
            let indices = parse_index_list(arg(&args, 2, "index list")?);
            adapter.track_restore_indices(&ctx, backup_id, &indices).await
        }
        "evict" => {
            let backup_id = arg(&args, 1, "backup id")?;
            let response = adapter.evict_backup(&ctx, backup_id).await.context("Evict request failed")?;
            eprintln!("Curator answered {}", response.status);
            if !response.body.is_empty() {
                println!("{}", response.body);
            }
            return Ok(());
        }
        other => {
            eprintln!("{}", USAGE);
            anyhow::bail!("Unknown command '{}'", other);
        }
    };

    print_track(&track)?;
    if adapter.recovery_fallbacks() > 0 {
        info!(fallbacks = adapter.recovery_fallbacks(), "Status decided without recovery evidence");
    }
    Ok(())
}

/// Logs go to stderr so stdout carries only the JSON answer.
/// `RUST_LOG` wins; otherwise `DEBUG=true` switches to debug level.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let debug = env::var("DEBUG").map(|v| v.eq_ignore_ascii_case("true")).unwrap_or(false);
        EnvFilter::new(if debug { "debug" } else { "info" })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn arg<'a>(args: &'a [String], position: usize, what: &str) -> Result<&'a str> {
    match args.get(position).map(|a| a.trim()) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => {
            eprintln!("{}", USAGE);
            anyhow::bail!("Missing {}", what)
        }
    }
}

/// Splits a comma-separated list, dropping blank entries.
fn parse_index_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn print_track(track: &ActionTrack) -> Result<()> {
    let body = serde_json::to_string_pretty(track).context("Failed to serialize track")?;
    println!("{}", body);
    Ok(())
}
