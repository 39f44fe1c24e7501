//! Command argument structs
//!
//! Each command's fields are deserialized from the request object itself,
//! so `{"command":"search","query":"x"}` yields a [`SearchArgs`]. Required
//! fields are `Option`s so a missing field becomes an input error with a
//! readable message instead of a serde error.

use serde::{Deserialize, Serialize};

/// Add a new entry to the current month
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct AddArgs {
    #[serde(default)]
    pub heading: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    /// Prefix applied when the heading has none
    #[serde(default)]
    pub category: Option<String>,
}

/// Ranked search
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct SearchArgs {
    #[serde(default)]
    pub query: String,
    /// Defaults to `search.default_limit`
    #[serde(default)]
    pub max_results: Option<usize>,
}

/// Append an update to the best matching entry
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct AppendArgs {
    #[serde(default)]
    pub search_term: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CleanIndexArgs {
    #[serde(default = "default_rebuild")]
    pub rebuild: bool,
}

fn default_rebuild() -> bool {
    true
}

/// Import loose markdown files
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct MigrateArgs {
    #[serde(default)]
    pub source_dir: Option<String>,
    #[serde(default)]
    pub recursive: bool,
}

/// Require a non-blank string field
pub fn required<'a>(value: &'a Option<String>, field: &str) -> Result<&'a str, String> {
    match value.as_deref() {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(format!("{} is required", field)),
    }
}
