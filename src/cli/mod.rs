//! CLI module - Command definitions and handlers
//!
//! Every subcommand maps onto one [`Notebook`] operation and prints either
//! a short human summary or, with `--json`, the same object the stdio
//! protocol would return.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::debug;

use crate::config::{home_dir, Config};
use crate::core::notebook::Notebook;

pub mod add;
pub mod append;
pub mod config;
pub mod index;
pub mod migrate;
pub mod search;
pub mod serve;
pub mod stats;
pub mod utils;
pub mod validate;

/// notes - Monthly markdown notes with relevance search
///
/// Entries live in `<root>/<YYYY>/<MM>-<MonthName>.md`; the index in
/// `<root>/.index.json` is derived and can be rebuilt at any time.
#[derive(Parser, Debug)]
#[command(name = "notes")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose (debug) logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path (falls back to NOTES_CONFIG, then the platform config dir)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Notes root directory
    #[arg(short, long, global = true, env = "NOTES_DIR")]
    pub root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Add a new entry to this month's document
    Add(add::AddArgs),

    /// Search entries by relevance
    Search(search::SearchArgs),

    /// Append a dated update to the best matching entry
    Append(append::AppendArgs),

    /// Rebuild the index from the documents
    Reindex(index::ReindexArgs),

    /// Delete the index, rebuilding it unless told not to
    CleanIndex(index::CleanIndexArgs),

    /// Entry counts, categories and date range
    Stats(stats::StatsArgs),

    /// Resolved root, index and platform details
    Info(stats::InfoArgs),

    /// Check documents for structural and encoding problems
    Validate(validate::ValidateArgs),

    /// Import a directory of markdown files
    Migrate(migrate::MigrateArgs),

    /// Serve line-delimited JSON commands on stdin/stdout
    Serve(serve::ServeArgs),

    /// Show the effective configuration
    Config(config::ConfigArgs),
}

/// Load config, resolve the root once and open the notebook
pub fn open_notebook(cli: &Cli) -> Result<Notebook> {
    let config = Config::load(cli.config.as_deref())?;
    let root = config.resolve_root(cli.root.clone(), home_dir().as_deref());
    debug!(root = %root.path.display(), source = ?root.source, "resolved root");
    Ok(Notebook::open(root, config))
}

/// Run the parsed command
pub fn run(cli: Cli) -> Result<()> {
    if let Commands::Config(args) = &cli.command {
        return config::run(cli.config.as_deref(), args);
    }

    let notebook = open_notebook(&cli)?;
    match cli.command {
        Commands::Add(args) => add::run(&notebook, args),
        Commands::Search(args) => search::run(&notebook, args),
        Commands::Append(args) => append::run(&notebook, args),
        Commands::Reindex(args) => index::run_reindex(&notebook, args),
        Commands::CleanIndex(args) => index::run_clean(&notebook, args),
        Commands::Stats(args) => stats::run_stats(&notebook, args),
        Commands::Info(args) => stats::run_info(&notebook, args),
        Commands::Validate(args) => validate::run(&notebook, args),
        Commands::Migrate(args) => migrate::run(&notebook, args),
        Commands::Serve(args) => serve::run(&notebook, args),
        Commands::Config(_) => Ok(()),
    }
}
