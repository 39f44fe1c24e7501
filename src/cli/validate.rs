//! `notes validate` command

use anyhow::{bail, Result};
use clap::Args;
use colored::Colorize;

use super::utils::print_json;
use crate::core::notebook::Notebook;
use crate::core::validate::Severity;

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(notebook: &Notebook, args: ValidateArgs) -> Result<()> {
    let report = notebook.validate()?;

    if args.json {
        print_json(&report)?;
    } else {
        println!("Checked {} files", report.files_checked);
        if report.issues.is_empty() {
            println!("{} No issues found", "✓".green());
        }
        for issue in &report.issues {
            let tag = match issue.severity {
                Severity::Error => "error".red().bold(),
                Severity::Warning => "warn ".yellow(),
                Severity::Info => "info ".dimmed(),
            };
            println!("  {} {}: {}", tag, issue.file, issue.issue);
        }
    }

    let errors = report
        .issues
        .iter()
        .filter(|i| i.severity == Severity::Error)
        .count();
    if errors > 0 {
        bail!("{} file(s) have errors", errors);
    }
    Ok(())
}
