//! `ParcelLedger` - shipping emails in, tracked parcels out.

mod source;

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use chrono::Utc;
use clap::{Parser, Subcommand};
use parcelledger_core::{
    CarrierRegistry, PackageRecord, PackageRepository, PackageStatus, ScanClock, ScanConfig,
    ScanSummary, Scanner,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use source::JsonMessageSource;

#[derive(Parser)]
#[command(name = "parcelledger", version)]
#[command(about = "Track parcels from shipping notification emails")]
struct Cli {
    /// Config file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Package database (overrides the config)
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a mailbox export and update tracked packages
    Scan {
        /// JSON export of candidate messages per account
        #[arg(long)]
        messages: PathBuf,

        /// Account to scan (repeatable; defaults to the config, then the export)
        #[arg(long = "account")]
        accounts: Vec<String>,

        /// Only messages newer than this many days
        #[arg(long)]
        days_back: Option<u32>,

        /// Message cap per account
        #[arg(long)]
        max_results: Option<u32>,
    },

    /// List tracked packages
    List {
        /// Only packages not yet delivered or cancelled
        #[arg(long)]
        active: bool,

        /// Only packages from this carrier
        #[arg(long, conflicts_with = "active")]
        carrier: Option<String>,

        /// Match tracking number, description or subject
        #[arg(long, conflicts_with_all = ["active", "carrier"])]
        search: Option<String>,
    },

    /// Package counts
    Stats,

    /// Set a package's status by hand
    Mark {
        tracking_number: String,
        /// In Transit, Out for Delivery, Delivered, Delayed or Cancelled
        status: String,
    },

    /// Delete a package by id
    Delete { id: i64 },

    /// Carriers seen in stored packages
    Carriers {
        /// List every supported carrier instead
        #[arg(long)]
        known: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so command output stays clean
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "parcelledger=info,parcelledger_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    if CarrierRegistry::builtin().is_empty() {
        bail!("No carriers registered");
    }

    let mut config = match &cli.config {
        Some(path) => ScanConfig::load_from(path).await,
        None => ScanConfig::load().await,
    }
    .context("loading config")?;
    if let Some(database) = cli.database {
        config.database_path = database;
    }

    let repo = open_repository(&config.database_path).await?;

    match cli.command {
        Commands::Scan {
            messages,
            accounts,
            days_back,
            max_results,
        } => {
            if let Some(days_back) = days_back {
                config.days_back = days_back;
            }
            if let Some(max_results) = max_results {
                config.max_results = max_results;
            }
            config.validate()?;

            let source = JsonMessageSource::load(&messages).await?;
            let accounts = if !accounts.is_empty() {
                accounts
            } else if !config.accounts.is_empty() {
                config.accounts.clone()
            } else {
                source.account_names()
            };

            info!("Scanning {} account(s)", accounts.len());
            let scanner = Scanner::new(&source, &repo, config.query());
            let summary = scanner.run_cycle(&accounts, ScanClock::system()).await;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print_summary(&summary);
            }
        }
        Commands::List {
            active,
            carrier,
            search,
        } => {
            let packages = if let Some(query) = search {
                repo.search(&query).await?
            } else if let Some(carrier) = carrier {
                repo.list_by_carrier(&carrier).await?
            } else if active {
                repo.list_active().await?
            } else {
                repo.list_all().await?
            };

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&packages)?);
            } else {
                print_packages(&packages);
            }
        }
        Commands::Stats => {
            let stats = repo.stats().await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!("Total:     {}", stats.total);
                println!("Active:    {}", stats.active);
                println!("Delivered: {}", stats.delivered);
            }
        }
        Commands::Mark {
            tracking_number,
            status,
        } => {
            let status = parse_status_arg(&status)?;
            let Some(record) = repo.set_status(&tracking_number, status, Utc::now()).await? else {
                bail!("No package with tracking number {tracking_number}");
            };
            info!("Marked {tracking_number} as {status}");
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&record)?);
            } else {
                print_packages(std::slice::from_ref(&record));
            }
        }
        Commands::Delete { id } => {
            if !repo.delete(id).await? {
                bail!("No package with id {id}");
            }
            println!("Deleted package {id}");
        }
        Commands::Carriers { known } => {
            let names: Vec<String> = if known {
                CarrierRegistry::builtin()
                    .iter()
                    .map(|c| c.name.to_string())
                    .collect()
            } else {
                repo.carriers().await?
            };
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&names)?);
            } else {
                for name in names {
                    println!("{name}");
                }
            }
        }
    }

    Ok(())
}

/// Open the package database, creating its directory if needed.
async fn open_repository(path: &Path) -> anyhow::Result<PackageRepository> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let path_str = path
        .to_str()
        .with_context(|| format!("database path {} is not valid UTF-8", path.display()))?;
    PackageRepository::new(path_str)
        .await
        .with_context(|| format!("opening {}", path.display()))
}

/// Accept a status name ignoring case, spaces, dashes and underscores.
fn parse_status_arg(input: &str) -> anyhow::Result<PackageStatus> {
    let normalize = |s: &str| {
        s.chars()
            .filter(char::is_ascii_alphanumeric)
            .collect::<String>()
            .to_ascii_lowercase()
    };
    let wanted = normalize(input);
    if wanted == "canceled" {
        return Ok(PackageStatus::Cancelled);
    }
    PackageStatus::ALL
        .into_iter()
        .find(|status| normalize(status.as_str()) == wanted)
        .with_context(|| format!("Unknown status {input:?}"))
}

fn print_summary(summary: &ScanSummary) {
    println!("Accounts scanned:        {}", summary.accounts_scanned);
    println!("Messages scanned:        {}", summary.messages_scanned);
    println!("Packages created:        {}", summary.records_created);
    println!("Packages updated:        {}", summary.records_updated);
    println!("Delivered (from email):  {}", summary.delivered_from_messages);
    println!("Delivered (past due):    {}", summary.auto_promoted);
    println!("Skipped, no carrier:     {}", summary.skipped_no_carrier);
    println!("Skipped, no tracking:    {}", summary.skipped_no_tracking);
    if !summary.failed_accounts.is_empty() {
        println!("Failed accounts:         {}", summary.failed_accounts.join(", "));
    }
    if !summary.failed_writes.is_empty() {
        println!("Failed writes:           {}", summary.failed_writes.join(", "));
    }
}

fn print_packages(packages: &[PackageRecord]) {
    if packages.is_empty() {
        println!("No packages");
        return;
    }
    for package in packages {
        let eta = package
            .estimated_delivery
            .map_or_else(|| "-".to_string(), |d| d.format("%Y-%m-%d").to_string());
        println!(
            "{:<5} {:<24} {:<16} {:<16} {:<10} {}",
            package.id.unwrap_or_default(),
            package.tracking_number,
            package.carrier,
            package.status.as_str(),
            eta,
            package.item_description
        );
    }
}
