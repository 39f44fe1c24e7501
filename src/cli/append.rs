//! `notes append` command
//!
//! Adds a dated `**Update (YYYY-MM-DD):**` block to the single entry that
//! best matches the search term. Weak or missing matches are refused and
//! the command exits non-zero without touching any document.

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;
use colored::Colorize;

use super::utils::{print_json, read_content};
use crate::core::notebook::{AppendOutcome, Notebook};

#[derive(Args, Debug)]
pub struct AppendArgs {
    /// Words identifying the entry to update
    pub search_term: String,

    /// Update text ("-" reads stdin)
    pub content: Option<String>,

    /// Read the update from a file
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(notebook: &Notebook, args: AppendArgs) -> Result<()> {
    let content = read_content(args.content.as_deref(), args.file.as_deref())?;
    let outcome = notebook.append(&args.search_term, &content)?;

    if args.json {
        print_json(&outcome)?;
    } else {
        print_outcome(&outcome);
    }

    if !outcome.is_success() {
        bail!("No entry updated for '{}'", args.search_term);
    }
    Ok(())
}

fn print_outcome(outcome: &AppendOutcome) {
    match outcome {
        AppendOutcome::Success {
            heading,
            file,
            alternatives,
            ..
        } => {
            println!("{} Updated: {}", "✓".green(), heading.bold());
            println!("   File: {}", file);
            if !alternatives.is_empty() {
                println!("   {}", "Next closest:".dimmed());
                for alt in alternatives {
                    println!("     {}", alt.dimmed());
                }
            }
        }
        AppendOutcome::Ambiguous {
            message,
            alternatives,
            ..
        } => {
            println!("{} {}", "⚠".yellow(), message);
            for alt in alternatives {
                println!("   {} ({})", alt.heading.cyan(), alt.relevance);
            }
        }
        AppendOutcome::NotFound { message, .. } => {
            println!("{} {}", "✗".red(), message);
        }
    }
}
