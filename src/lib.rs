//! mdnotes - Monthly markdown notes with relevance search
//!
//! File-backed note store. Short entries are appended to one markdown
//! document per month, a rebuildable JSON index sits beside them, and a
//! relevance engine resolves free-text queries to entries, refusing to
//! guess when no match is confident.
//!
//! # Architecture
//!
//! ```text
//! cli / protocol  ->  Notebook  ->  Store  (documents, atomic writes, locks)
//!                              ->  Index  (derived .index.json)
//!                              ->  RelevanceEngine (scoring, resolution)
//!                              ->  Categorizer (import only)
//! ```
//!
//! ## Key Concepts
//!
//! - **Documents are authoritative**: the index can be deleted at any time
//! - **Append-only entries**: headings never change; updates are dated
//!   marker blocks added after the body
//! - **Explicit root**: resolved once from flags, env and config, then
//!   passed down

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod protocol;

pub use config::{Config, ResolvedRoot};
pub use core::entry::{DocumentId, Entry};
pub use core::notebook::{AppendOutcome, Notebook};
pub use error::{NotesError, Result};
