//! Import - Bulk import of loose markdown files
//!
//! Each source file becomes exactly one entry in the month of its
//! modification time. Per-file failures are collected and reported; one
//! bad file never aborts the batch.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, NaiveDate};
use serde::Serialize;
use tracing::{debug, warn};
use walkdir::WalkDir;

use super::category::Categorizer;
use super::entry::{has_category_prefix, heading_text, DocumentId, UNTITLED};
use super::store::Store;
use crate::error::{NotesError, Result};

const MAX_HEADING_CHARS: usize = 80;

#[derive(Debug, Clone, Serialize)]
pub struct ImportedFile {
    pub source: String,
    pub destination: String,
    pub heading: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedFile {
    pub file: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedFile {
    pub file: String,
    pub error: String,
}

/// Per-file outcome of a migration
#[derive(Debug, Clone, Default, Serialize)]
pub struct MigrationReport {
    pub imported: Vec<ImportedFile>,
    pub skipped: Vec<SkippedFile>,
    pub errors: Vec<FailedFile>,
}

impl MigrationReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Entry synthesized from one source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedEntry {
    pub heading: String,
    pub body: String,
    pub date: NaiveDate,
}

/// Import every markdown file in `source` (recursively if asked)
pub fn migrate(
    store: &Store,
    categorizer: &dyn Categorizer,
    source: &Path,
    recursive: bool,
) -> Result<MigrationReport> {
    if !source.exists() {
        return Err(NotesError::InvalidSource(format!(
            "Source directory not found: {}",
            source.display()
        )));
    }
    if !source.is_dir() {
        return Err(NotesError::InvalidSource(format!(
            "Source path is not a directory: {}",
            source.display()
        )));
    }
    // Importing the store into itself would duplicate every entry
    if let (Ok(src), Ok(root)) = (source.canonicalize(), store.root().canonicalize()) {
        if src.starts_with(&root) {
            return Err(NotesError::InvalidSource(format!(
                "Source is inside the notes root: {}",
                source.display()
            )));
        }
    }

    let mut report = MigrationReport::default();
    let walker = WalkDir::new(source)
        .min_depth(1)
        .max_depth(if recursive { usize::MAX } else { 1 })
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name()));

    for item in walker {
        let dent = match item {
            Ok(dent) => dent,
            Err(e) => {
                let file = e
                    .path()
                    .map(|p| display_name(source, p))
                    .unwrap_or_else(|| source.display().to_string());
                report.errors.push(FailedFile {
                    file,
                    error: e.to_string(),
                });
                continue;
            }
        };
        let path = dent.path();
        if !dent.file_type().is_file() || !is_markdown(path) {
            continue;
        }

        let name = display_name(source, path);
        match import_file(store, categorizer, path) {
            Ok(Some((doc, heading))) => {
                debug!(source = %name, file = %doc, "imported");
                report.imported.push(ImportedFile {
                    source: name,
                    destination: doc.relative_path(),
                    heading,
                });
            }
            Ok(None) => report.skipped.push(SkippedFile {
                file: name,
                reason: "empty".to_string(),
            }),
            Err(e) => {
                warn!(source = %name, error = %e, "import failed");
                report.errors.push(FailedFile {
                    file: name,
                    error: e.to_string(),
                });
            }
        }
    }

    Ok(report)
}

fn import_file(
    store: &Store,
    categorizer: &dyn Categorizer,
    path: &Path,
) -> Result<Option<(DocumentId, String)>> {
    let bytes = fs::read(path).map_err(|e| NotesError::io(path, e))?;
    let content = String::from_utf8(bytes).map_err(|_| {
        NotesError::io(
            path,
            std::io::Error::new(std::io::ErrorKind::InvalidData, "not valid UTF-8"),
        )
    })?;

    let modified = fs::metadata(path)
        .and_then(|m| m.modified())
        .map_err(|e| NotesError::io(path, e))?;
    let date = DateTime::<Local>::from(modified).date_naive();

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();

    let Some(entry) = synthesize_entry(&content, &stem, date, categorizer) else {
        return Ok(None);
    };

    let doc = DocumentId::for_date(entry.date);
    store.append_entry(doc, &entry.heading, &entry.body, entry.date)?;
    Ok(Some((doc, entry.heading)))
}

/// Build the entry for one file: heading from the first non-blank line
/// (or the file name), category prefix inferred when missing, nested
/// top-level headings demoted so the body stays inside one entry.
/// Returns `None` for blank content.
pub fn synthesize_entry(
    content: &str,
    file_stem: &str,
    date: NaiveDate,
    categorizer: &dyn Categorizer,
) -> Option<ImportedEntry> {
    if content.trim().is_empty() {
        return None;
    }

    let mut lines = content.lines().skip_while(|l| l.trim().is_empty()).peekable();
    let first_line = lines.peek().copied().unwrap_or("").trim();
    let first = first_line.trim_start_matches('#').trim();

    let title = if first.is_empty() || first.eq_ignore_ascii_case(UNTITLED) {
        // Drop an empty or placeholder heading line
        if first_line.starts_with('#') {
            lines.next();
        }
        file_stem.to_string()
    } else {
        lines.next();
        first.to_string()
    };
    let rest: Vec<&str> = lines.collect();

    let title = if title.trim().is_empty() {
        "Imported note".to_string()
    } else {
        truncate_heading(title.trim())
    };

    let heading = if has_category_prefix(&title) {
        title
    } else {
        format!("{} - {}", categorizer.categorize(content), title)
    };

    let body = rest
        .iter()
        .map(|line| {
            if heading_text(line).is_some() {
                format!("#{}", line.trim_start())
            } else {
                (*line).to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n");

    Some(ImportedEntry {
        heading,
        body: body.trim().to_string(),
        date,
    })
}

fn truncate_heading(text: &str) -> String {
    if text.chars().count() <= MAX_HEADING_CHARS {
        text.to_string()
    } else {
        let cut: String = text.chars().take(MAX_HEADING_CHARS).collect();
        format!("{}...", cut.trim_end())
    }
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

fn is_markdown(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("md") || ext.eq_ignore_ascii_case("markdown"))
        .unwrap_or(false)
}

fn display_name(source: &Path, path: &Path) -> String {
    path.strip_prefix(source)
        .map(PathBuf::from)
        .unwrap_or_else(|_| path.to_path_buf())
        .to_string_lossy()
        .replace('\\', "/")
}
