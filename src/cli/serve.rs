//! Serve command - line-delimited JSON on stdio

use anyhow::Result;
use clap::Args;

use crate::core::notebook::Notebook;
use crate::protocol;

/// Answer `{"command": ...}` requests, one per line, until stdin closes
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Rebuild the index before serving
    #[arg(long)]
    pub reindex: bool,
}

pub fn run(notebook: &Notebook, args: ServeArgs) -> Result<()> {
    if args.reindex {
        notebook.reindex()?;
    }
    protocol::run_stdio(notebook)
}
