//! `notes search` command

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::utils::print_json;
use crate::core::notebook::Notebook;

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Search query (words are joined with spaces)
    #[arg(required = true)]
    pub query: Vec<String>,

    /// Maximum number of results (default: search.default_limit)
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(notebook: &Notebook, args: SearchArgs) -> Result<()> {
    let query = args.query.join(" ");
    let hits = notebook.search(&query, args.limit)?;

    if args.json {
        return print_json(&hits);
    }

    if hits.is_empty() {
        println!("No entries found matching '{}'", query);
        return Ok(());
    }

    println!("Found {} entries:\n", hits.len());
    for hit in &hits {
        println!(
            "{} {} {}",
            "#".dimmed(),
            hit.heading.cyan().bold(),
            format!("({})", hit.relevance).dimmed()
        );
        println!("   {} {}", hit.file.dimmed(), hit.date.to_string().dimmed());
        for line in hit.content.lines().take(3) {
            println!("   {}", line);
        }
        println!();
    }
    Ok(())
}
