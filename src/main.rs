use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use stoic_offline::domain::entities::SyncReport;
use stoic_offline::{AppConfig, AppState, DEFAULT_LOG_FILTER, init_logging};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "stoic-offline")]
#[command(about = "Inspect and sync the offline journal store", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// SQLite database url (overrides STOIC_DATABASE_URL)
    #[arg(long)]
    database_url: Option<String>,

    /// Log filter used when RUST_LOG is unset
    #[arg(short, long, default_value = DEFAULT_LOG_FILTER, env = "LOG_LEVEL")]
    log_level: String,

    /// Enable JSON logging
    #[arg(long, env = "JSON_LOGS")]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show record and pending operation counts
    Status,
    /// List queued operations in replay order
    Pending {
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Replay queued operations against the remote backend
    Sync {
        /// Keep syncing on the configured interval until interrupted (needs STOIC_SYNC_AUTO)
        #[arg(long)]
        daemon: bool,
    },
    /// Delete every local record and queued operation
    Clear {
        /// Confirm the irreversible wipe
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.log_level, cli.json_logs)?;

    let mut config = AppConfig::from_env();
    if let Some(url) = cli.database_url {
        config.database.url = url;
    }

    info!("Starting stoic-offline v{}", env!("CARGO_PKG_VERSION"));
    let state = AppState::new(config).await?;

    let outcome = run_command(&state, cli.command).await;
    state.shutdown().await;
    outcome
}

async fn run_command(state: &AppState, command: Commands) -> Result<()> {
    match command {
        Commands::Status => {
            let status = state.offline_service.status().await?;
            for count in &status.entities {
                println!(
                    "{:<12} {:>6} records {:>6} unsynced",
                    count.entity.as_str(),
                    count.records,
                    count.unsynced
                );
            }
            println!("pending operations: {}", status.pending_operations);
        }
        Commands::Pending { limit } => {
            let operations = state.offline_service.pending_operations().await?;
            let shown = limit.unwrap_or(operations.len());
            for operation in operations.iter().take(shown) {
                println!(
                    "{} {} {:<7} {:<12} {} attempts={}{}",
                    operation.enqueued_at_utc().to_rfc3339(),
                    operation.id,
                    operation.action.as_str(),
                    operation.entity.as_str(),
                    operation.remote_target(),
                    operation.attempts,
                    operation
                        .last_error
                        .as_deref()
                        .map(|err| format!(" last_error={err}"))
                        .unwrap_or_default()
                );
            }
            if operations.len() > shown {
                println!("... {} more", operations.len() - shown);
            }
        }
        Commands::Sync { daemon } => {
            let Some(sync) = &state.sync_service else {
                bail!("no remote backend configured; set STOIC_REMOTE_URL and STOIC_REMOTE_API_KEY");
            };

            if daemon {
                let Some(handle) = state.start_auto_sync() else {
                    bail!("auto sync is disabled; set STOIC_SYNC_AUTO=true");
                };
                tokio::signal::ctrl_c().await?;
                info!("Interrupted; stopping scheduled sync");
                handle.abort();
            } else {
                let report = sync.run().await?;
                print_report(&report);
            }
        }
        Commands::Clear { yes } => {
            if !yes {
                bail!("refusing to clear the local store without --yes");
            }
            state.offline_service.clear_all().await?;
            warn!("Local store cleared");
            println!("local store cleared");
        }
    }

    Ok(())
}

fn print_report(report: &SyncReport) {
    if report.skipped {
        println!("sync already running; skipped");
        return;
    }

    println!(
        "synced {}/{} operations ({} remapped)",
        report.succeeded, report.total, report.remapped
    );
    for failure in &report.failed {
        println!(
            "failed   {} {} {} attempts={}: {}",
            failure.operation_id, failure.action, failure.entity, failure.attempts, failure.message
        );
    }
    for failure in &report.abandoned {
        println!(
            "abandoned {} {} {} attempts={}: {}",
            failure.operation_id, failure.action, failure.entity, failure.attempts, failure.message
        );
    }
}
