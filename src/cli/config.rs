//! `notes config` command
//!
//! # Usage
//! ```bash
//! notes config          # Effective config as TOML
//! notes config --path   # Where it was loaded from
//! notes config --init   # Write the defaults to the platform config file
//! ```

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use clap::Args;

use crate::config::{Config, CONFIG_ENV};

#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Show config file path
    #[arg(long)]
    pub path: bool,

    /// Write the default config to the config file if none exists
    #[arg(long)]
    pub init: bool,
}

/// Config file in effect: explicit flag, then NOTES_CONFIG, then the platform dir
fn config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    explicit
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from))
        .or_else(Config::global_config_path)
}

pub fn run(explicit: Option<&Path>, args: &ConfigArgs) -> Result<()> {
    let path = config_path(explicit);

    if args.path {
        match &path {
            Some(p) if p.exists() => println!("✓ Active: {}", p.display()),
            Some(p) => println!("⚠ No config file at {} (using defaults)", p.display()),
            None => println!("⚠ No config directory on this platform (using defaults)"),
        }
        return Ok(());
    }

    if args.init {
        let Some(path) = path else {
            bail!("No config directory on this platform; pass --config");
        };
        if path.exists() {
            bail!("Config already exists at {}", path.display());
        }
        Config::default().save_to(&path)?;
        println!("Created {}", path.display());
        return Ok(());
    }

    let config = Config::load(explicit)?;
    print!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}
