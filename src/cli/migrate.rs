//! `notes migrate` command
//!
//! # Usage
//! ```bash
//! notes migrate ~/old-notes
//! notes migrate ~/old-notes --recursive --json
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::utils::print_json;
use crate::core::notebook::Notebook;

#[derive(Args, Debug)]
pub struct MigrateArgs {
    /// Directory of markdown files to import
    pub source_dir: PathBuf,

    /// Descend into subdirectories
    #[arg(short = 'R', long)]
    pub recursive: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(notebook: &Notebook, args: MigrateArgs) -> Result<()> {
    let result = notebook.migrate(&args.source_dir, args.recursive)?;

    if args.json {
        return print_json(&result);
    }

    for file in &result.details.imported {
        println!("{} {} -> {}", "✓".green(), file.source, file.heading.bold());
    }
    for file in &result.details.skipped {
        println!("{} {} ({})", "-".dimmed(), file.file, file.reason);
    }
    for file in &result.details.errors {
        println!("{} {}: {}", "✗".red(), file.file, file.error);
    }

    println!(
        "\nImported {}, skipped {}, failed {}. Index now holds {} entries.",
        result.imported, result.skipped, result.errors, result.total_entries
    );
    Ok(())
}
