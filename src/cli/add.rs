//! `notes add` command
//!
//! # Usage
//! ```bash
//! notes add "Work - Fixed login bug" "Session cookie was not refreshed"
//! notes add "Retro" --category Meeting --file retro.md
//! echo "body" | notes add "Idea - Sharding" -
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::utils::{print_json, read_content};
use crate::core::notebook::Notebook;

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Entry heading, conventionally "<Category> - <description>"
    pub heading: String,

    /// Entry body ("-" reads stdin)
    pub content: Option<String>,

    /// Read the body from a file
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Category prefix for a heading that has none
    #[arg(long)]
    pub category: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(notebook: &Notebook, args: AddArgs) -> Result<()> {
    let content = read_content(args.content.as_deref(), args.file.as_deref())?;
    let added = notebook.add(&args.heading, &content, args.category.as_deref())?;

    if args.json {
        return print_json(&added);
    }

    println!("{} Added: {}", "✓".green(), added.heading.bold());
    println!("   File: {}", added.file);
    Ok(())
}
