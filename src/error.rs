//! Error types for the note store
//!
//! Every failure a command can produce maps onto one of the protocol
//! error kinds (`input`, `io`, `lock`, `resolution`) via [`NotesError::kind`].

use std::path::PathBuf;

use thiserror::Error;

/// Result alias used throughout the library
pub type Result<T> = std::result::Result<T, NotesError>;

#[derive(Debug, Error)]
pub enum NotesError {
    /// Missing or malformed caller input
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Heading vanished between index lookup and write (stale index)
    #[error("entry '{heading}' not found in {file}")]
    EntryNotFound { heading: String, file: String },

    /// Another process holds the document lock
    #[error("timed out waiting for lock on {}", path.display())]
    LockTimeout { path: PathBuf },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("source directory not usable: {0}")]
    InvalidSource(String),
}

/// Protocol-level classification of an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Input,
    Resolution,
    Io,
    Lock,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Input => "input",
            ErrorKind::Resolution => "resolution",
            ErrorKind::Io => "io",
            ErrorKind::Lock => "lock",
        }
    }
}

impl NotesError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        NotesError::InvalidInput(msg.into())
    }

    /// Attach a path to an I/O error
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        NotesError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            NotesError::InvalidInput(_) | NotesError::InvalidSource(_) => ErrorKind::Input,
            NotesError::EntryNotFound { .. } => ErrorKind::Resolution,
            NotesError::LockTimeout { .. } => ErrorKind::Lock,
            NotesError::Io { .. } | NotesError::Json(_) => ErrorKind::Io,
        }
    }
}
