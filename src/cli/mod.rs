//! The CLI surface (§6), not core: parses flags, resolves a connection URL
//! via the `profiles` collaborator, builds a `Request`, and calls the
//! Engine Facade exactly once per `export` invocation.

pub mod connection_url;

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use crate::engine::{self, Budgets, CatalogDriver, ErrorPolicy, ExportOutcome, ObjectType, PgCatalogDriver, Request};
use crate::logging::LogLevel;
use crate::profiles;

#[derive(Parser)]
#[command(name = "pgmeta", author, version, about = "Extracts a PostgreSQL database's schema-level catalog to a tree of CREATE statements", long_about = None)]
pub struct Cli {
    /// Enable verbose output (info level)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Suppress all non-essential output (error level only)
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable debug output (debug level, plus stacktrace-bearing error rendering)
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn log_level(&self) -> LogLevel {
        LogLevel {
            debug: self.debug,
            verbose: self.verbose,
            quiet: self.quiet,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage saved database connections
    Connection {
        #[command(subcommand)]
        command: ConnectionCommands,
    },

    /// Extract the schema-level catalog to a directory tree of CREATE statements
    Export(ExportArgs),

    /// Print version information
    Version,
}

#[derive(Subcommand)]
pub enum ConnectionCommands {
    /// Save a new named connection
    Create {
        name: String,
        url: String,
        /// Make this connection the default used when `--connection` is omitted
        #[arg(long)]
        default: bool,
    },
    /// List saved connections
    List,
    /// Remove a saved connection
    Delete { name: String },
    /// Mark a saved connection as the default
    MakeDefault { name: String },
}

#[derive(Parser)]
pub struct ExportArgs {
    /// Comma-separated object types, or ALL (default)
    #[arg(long, default_value = "ALL")]
    pub types: String,

    /// Name-matching regex, or ALL (default)
    #[arg(long, default_value = "ALL")]
    pub query: String,

    /// Comma-separated schemas, or ALL (default: public)
    #[arg(long, default_value = "public")]
    pub schema: String,

    /// Output directory (created if absent)
    #[arg(long, default_value = "./pgmeta-export")]
    pub output: PathBuf,

    /// Error-escalation policy: fail or warn
    #[arg(long, default_value = "fail", value_parser = ["fail", "warn"])]
    pub on_error: String,

    /// Saved connection name (falls back to the default, then the only profile)
    #[arg(long)]
    pub connection: Option<String>,

    /// Maximum concurrent DDL fetches (default 10)
    #[arg(long, default_value_t = 0)]
    pub concurrency_db: i64,

    /// Maximum concurrent file writes (default 50)
    #[arg(long, default_value_t = 0)]
    pub concurrency_fs: i64,
}

pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Connection { command } => run_connection_command(command),
        Commands::Export(args) => run_export(args).await,
        Commands::Version => {
            println!("pgmeta {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn run_connection_command(command: ConnectionCommands) -> Result<()> {
    let mut store = profiles::load()?;
    match command {
        ConnectionCommands::Create { name, url, default } => {
            let normalized = connection_url::normalize_params(&url);
            store.create(name, normalized, default)?;
            profiles::save(&store)?;
            println!("connection saved");
        }
        ConnectionCommands::List => {
            for connection in &store.connections {
                let marker = if connection.is_default { " (default)" } else { "" };
                println!("{}{marker}", connection.name);
            }
        }
        ConnectionCommands::Delete { name } => {
            store.delete(&name)?;
            profiles::save(&store)?;
            println!("connection deleted");
        }
        ConnectionCommands::MakeDefault { name } => {
            store.make_default(&name)?;
            profiles::save(&store)?;
            println!("default connection updated");
        }
    }
    Ok(())
}

fn parse_types(raw: &str) -> Result<BTreeSet<ObjectType>> {
    if raw.trim().eq_ignore_ascii_case(Request::ALL_SENTINEL) {
        return Ok(BTreeSet::new());
    }
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| ObjectType::parse(s).map_err(anyhow::Error::from))
        .collect()
}

fn parse_schemas(raw: &str) -> Vec<String> {
    if raw.trim().eq_ignore_ascii_case(Request::ALL_SENTINEL) {
        return vec![Request::ALL_SENTINEL.to_string()];
    }
    raw.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect()
}

async fn run_export(args: ExportArgs) -> Result<()> {
    let store = profiles::load()?;
    let url = store.resolve(args.connection.as_deref())?;

    let driver: Arc<dyn CatalogDriver> = Arc::new(
        PgCatalogDriver::connect(url)
            .await
            .context("failed to connect to the database")?,
    );

    let request = Request {
        types: parse_types(&args.types)?,
        schemas: parse_schemas(&args.schema),
        name_pattern: args.query,
    };
    let policy = ErrorPolicy::parse(&args.on_error)?;
    let budgets = Budgets::new(args.concurrency_db, args.concurrency_fs);
    let cancel = CancellationToken::new();

    let ctrl_c_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("received Ctrl-C, cancelling in-flight work");
            ctrl_c_cancel.cancel();
        }
    });

    let outcome = engine::facade::export(driver, request, &args.output, policy, budgets, cancel).await?;

    match outcome {
        ExportOutcome::NoObjectsFound => {
            println!("no objects matched the given filters");
        }
        ExportOutcome::Completed(summary) => {
            println!(
                "discovered {} objects, wrote {}, {} failed to fetch, {} failed to write",
                summary.discovered, summary.written, summary.failed_fetch, summary.failed_write
            );
        }
    }
    Ok(())
}
