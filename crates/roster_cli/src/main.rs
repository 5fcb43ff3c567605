//! Command-line front end over the record store.
//!
//! # Responsibility
//! - Open one database handle and dispatch one HTTP-shaped request.
//! - Print `status` and the JSON body; exit non-zero on non-2xx responses.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use roster_core::db::open_db;
use roster_core::{core_version, default_log_level, handle_request, init_logging, Method};
use std::path::PathBuf;
use std::process::ExitCode;

/// Student/course/enrollment record store.
#[derive(Debug, Parser)]
#[command(name = "roster", about = "Student record store client", long_about = None)]
struct Cli {
    /// SQLite database file; created and migrated when missing.
    #[arg(long, env = "ROSTER_DB_PATH", default_value = "roster.sqlite3")]
    db: PathBuf,

    /// trace|debug|info|warn|error
    #[arg(long, env = "ROSTER_LOG_LEVEL", default_value = default_log_level())]
    log_level: String,

    /// Absolute directory for rotating log files. Logging is off when unset.
    #[arg(long, env = "ROSTER_LOG_DIR")]
    log_dir: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Dispatch one request, e.g. `request GET /api/Student/1`.
    Request {
        method: Method,
        path: String,
        /// JSON body for POST/PUT.
        body: Option<String>,
    },
    /// Print the core crate version.
    Version,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    if let Some(log_dir) = cli.log_dir.as_deref() {
        init_logging(&cli.log_level, log_dir).context("failed to initialize logging")?;
    }

    match cli.command {
        Command::Version => {
            println!("roster_core version={}", core_version());
            Ok(ExitCode::SUCCESS)
        }
        Command::Request { method, path, body } => {
            let conn = open_db(&cli.db)
                .with_context(|| format!("failed to open database `{}`", cli.db.display()))?;
            let response = handle_request(&conn, method, &path, body.as_deref());
            info!(
                "event=cli_request module=cli status={} method={method} path={path}",
                response.status
            );

            println!("status={}", response.status);
            if let Some(location) = &response.location {
                println!("location={location}");
            }
            println!("{}", serde_json::to_string_pretty(&response.body)?);

            Ok(if response.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}
