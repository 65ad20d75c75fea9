//! engram - evaluation result store CLI

use anyhow::Result;
use clap::{Parser, Subcommand};
use engram_snapshot::{utils::logger, verify_snapshot, SnapshotBackup};
use engram_store::db::connection::{close_pool, create_pool};
use engram_store::db::migrate::migrate;
use engram_store::{build_daily_scorecard, AppConfig};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(
    name = "engram",
    author,
    version,
    about = "Cheap-first eval runner + durable result store"
)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the SQLite database and required tables
    InitDb,

    /// Print resolved storage paths
    Paths,

    /// Show aggregate daily metrics from stored results
    Scorecard {
        /// UTC date (defaults to today)
        #[arg(long, value_name = "YYYY-MM-DD")]
        date: Option<String>,
    },

    /// Create a timestamped snapshot with checksum manifest
    Backup {
        /// Backup destination root directory
        #[arg(long, value_name = "DIRECTORY")]
        to: PathBuf,
    },

    /// Verify checksum integrity of an existing snapshot
    VerifyBackup {
        /// Snapshot directory path
        #[arg(long, value_name = "SNAPSHOT_DIR")]
        path: PathBuf,
    },
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();
    let config = AppConfig::from_env()?;

    let log_level = args.log_level.as_deref().unwrap_or(&config.log_level);
    logger::init(log_level)?;

    tracing::debug!(
        data_dir = %config.paths.data_dir.display(),
        db_path = %config.paths.db_path.display(),
        "engram v{}",
        env!("CARGO_PKG_VERSION")
    );

    match args.command {
        Command::InitDb => {
            let pool = create_pool(&config.paths.db_path)?;
            migrate(&*pool.get()?)?;
            close_pool(&pool);
            println!("Initialized schema at {}", config.paths.db_path.display());
        }
        Command::Paths => {
            println!("{}", serde_json::to_string_pretty(&config.paths)?);
        }
        Command::Scorecard { date } => {
            let date = date.unwrap_or_else(|| chrono::Utc::now().format("%Y-%m-%d").to_string());
            let pool = create_pool(&config.paths.db_path)?;
            let scorecard = build_daily_scorecard(&*pool.get()?, &date)?;
            close_pool(&pool);
            println!("{}", serde_json::to_string_pretty(&scorecard)?);
        }
        Command::Backup { to } => {
            let snapshot_dir = SnapshotBackup::new(config.paths.clone()).create(&to)?;
            println!("Created snapshot: {}", snapshot_dir.display());
        }
        Command::VerifyBackup { path } => {
            let report = verify_snapshot(&path)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            if !report.ok {
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
