//! Command protocol
//!
//! One JSON object per line in, one JSON object (or array, for `search`)
//! per line out. Logs go to stderr so stdout carries only responses.
//!
//! # Commands
//! - `add` - New entry in the current month
//! - `search` - Ranked search
//! - `append` - Dated update on the best match, or refusal with alternatives
//! - `reindex`, `clean-index` - Index maintenance
//! - `stats`, `info`, `validate` - Read-only reports
//! - `migrate` - Bulk import
//! - `help` - Command list

pub mod handlers;
pub mod request;
mod server;

pub use handlers::{dispatch, handle};
pub use server::{run_stdio, serve};
