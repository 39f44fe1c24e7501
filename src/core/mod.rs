//! Core module - Business logic
//!
//! Documents, their parser, the derived index and the relevance engine,
//! wired together by [`notebook::Notebook`].

pub mod category;
pub mod entry;
pub mod import;
pub mod index;
pub mod notebook;
pub mod relevance;
pub mod store;
pub mod validate;
