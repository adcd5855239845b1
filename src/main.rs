use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

use dhcpsim::{Config, FileAuditSink, LeasePool, RandomSelector, Result, report, spawn_sweeper};

const COMMANDS: &str =
    "Commands: allocate <client>, release <client>, fail, list, report <path>, help, quit";

#[derive(Parser)]
#[command(name = "dhcpsim")]
#[command(author, version, about = "A DHCP-style IP lease allocation simulator", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    Run,
    ShowConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .init();

    let config = Config::load_or_create(&cli.config)?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            info!("Starting lease simulator with config: {:?}", cli.config);
            run(config).await
        }
        Commands::ShowConfig => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

/// Interactive harness: background sweeper plus line commands on stdin.
async fn run(config: Config) -> Result<()> {
    let config = Arc::new(config);
    let audit = Arc::new(FileAuditSink::new(&config.audit_log));
    let pool = Arc::new(LeasePool::new(
        Arc::clone(&config),
        Box::new(RandomSelector::new()),
        audit,
    ));

    info!(
        "IP pool: {} - {} ({} addresses), {}s leases",
        config.pool_start,
        config.pool_end,
        config.pool_size(),
        config.lease_duration_seconds
    );
    info!("Audit log: {}", config.audit_log);

    let sweeper = spawn_sweeper(Arc::clone(&pool), config.sweep_interval());

    println!("{COMMANDS}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line? {
                    Some(line) => {
                        if !handle_command(&pool, line.trim()).await {
                            break;
                        }
                    }
                    None => break,
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Received shutdown signal, stopping simulator...");
                break;
            }
        }
    }

    sweeper.abort();
    Ok(())
}

/// Executes one line command. Returns false when the harness should exit.
async fn handle_command(pool: &LeasePool, input: &str) -> bool {
    let mut parts = input.split_whitespace();
    let Some(command) = parts.next() else {
        return true;
    };

    match (command, parts.next()) {
        ("allocate", Some(client)) => match pool.allocate(client).await {
            Ok(lease) => println!(
                "{} -> {} (expires {})",
                client,
                lease.address,
                lease.expires_at.format("%H:%M:%S")
            ),
            Err(error) => println!("{error}"),
        },
        ("release", Some(client)) => match pool.release(client).await {
            Ok(address) => println!("{client} released {address}"),
            Err(error) => println!("{error}"),
        },
        ("fail", None) => match pool.force_release().await {
            Some((client, address)) => println!("Network failure: {client} lost {address}"),
            None => println!("No active leases."),
        },
        ("list", None) => print_leases(pool).await,
        ("report", Some(path)) => match report::export_csv(pool, path, Utc::now()).await {
            Ok(rows) => println!("Report with {rows} lease(s) written to {path}"),
            Err(error) => println!("{error}"),
        },
        ("help", None) => println!("{COMMANDS}"),
        ("quit" | "exit", None) => return false,
        _ => println!("Unrecognized command; try 'help'."),
    }

    true
}

async fn print_leases(pool: &LeasePool) {
    let active = pool.list_active(Utc::now()).await;

    if active.is_empty() {
        println!("No active leases.");
        return;
    }

    println!("{:<24} {:<16} {:<10}", "Client", "IP Address", "Remaining");
    println!("{}", "-".repeat(52));

    for entry in active {
        println!(
            "{:<24} {:<16} {:<10}",
            entry.client_id,
            entry.address,
            format!("{}s", entry.remaining_seconds)
        );
    }
}
