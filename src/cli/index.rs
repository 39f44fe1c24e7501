//! `notes reindex` and `notes clean-index`

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use serde_json::json;

use super::utils::print_json;
use crate::core::notebook::Notebook;

#[derive(Args, Debug)]
pub struct ReindexArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct CleanIndexArgs {
    /// Only delete the index; it is rebuilt on next use
    #[arg(long)]
    pub no_rebuild: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run_reindex(notebook: &Notebook, args: ReindexArgs) -> Result<()> {
    let summary = notebook.reindex()?;

    if args.json {
        return print_json(&json!({
            "status": "success",
            "total_files": summary.total_files,
            "total_entries": summary.total_entries,
            "index_path": summary.index_path,
        }));
    }

    println!(
        "{} Indexed {} entries in {} files",
        "✓".green(),
        summary.total_entries,
        summary.total_files
    );
    println!("   Index: {}", summary.index_path.display());
    Ok(())
}

pub fn run_clean(notebook: &Notebook, args: CleanIndexArgs) -> Result<()> {
    let cleaned = notebook.clean_index(!args.no_rebuild)?;

    if args.json {
        return print_json(&cleaned);
    }

    if cleaned.removed {
        println!("{} Removed existing index", "✓".green());
    } else {
        println!("No existing index");
    }
    if let Some(summary) = &cleaned.reindex {
        println!(
            "{} Rebuilt: {} entries in {} files",
            "✓".green(),
            summary.total_entries,
            summary.total_files
        );
    }
    Ok(())
}
