//! Stats and info commands

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::utils::print_json;
use crate::core::notebook::Notebook;

/// Stats command arguments
#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run_stats(notebook: &Notebook, args: StatsArgs) -> Result<()> {
    let stats = notebook.stats()?;

    if args.json {
        return print_json(&stats);
    }

    println!("📊 Notes Statistics\n");
    println!("  Total entries:  {}", stats.total_entries);
    println!("  Total files:    {}", stats.total_files);
    if let Some(range) = &stats.date_range {
        println!("  Date range:     {} .. {}", range.earliest, range.latest);
    }

    if !stats.categories.is_empty() {
        let mut categories: Vec<_> = stats.categories.iter().collect();
        categories.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

        println!("\n📂 Categories:");
        let last = categories.len() - 1;
        for (i, (name, count)) in categories.iter().enumerate() {
            let branch = if i == last { "└──" } else { "├──" };
            let pct = *count * 100 / stats.total_entries.max(1);
            println!("  {} {:<14} {} ({}%)", branch, name, count, pct);
        }
    }

    if !stats.top_keywords.is_empty() {
        let words: Vec<String> = stats
            .top_keywords
            .iter()
            .map(|k| format!("{} ({})", k.keyword, k.count))
            .collect();
        println!("\n🔑 Top keywords: {}", words.join(", ").cyan());
    }

    println!("\n📁 Root: {}", notebook.root().path.display());
    Ok(())
}

pub fn run_info(notebook: &Notebook, args: InfoArgs) -> Result<()> {
    let info = notebook.info();

    if args.json {
        return print_json(&info);
    }

    let yes_no = |b: bool| if b { "yes".green() } else { "no".yellow() };

    println!("{}", "Notes".bold());
    println!("  Root:               {}", info.root.display());
    println!("  Source:             {:?}", info.source);
    println!("  Exists:             {}", yes_no(info.root_exists));
    println!("  Writable:           {}", yes_no(info.root_writable));
    println!("  Alternate detected: {}", yes_no(info.alternate_detected));
    println!("  Using alternate:    {}", yes_no(info.using_alternate));
    println!("  Index:              {}", info.index_file.display());
    println!("  Index exists:       {}", yes_no(info.index_exists));
    println!("  This month:         {}", info.current_month_file.display());
    println!("  Platform:           {}", info.platform.dimmed());
    Ok(())
}
