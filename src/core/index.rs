//! Index - Derived entry metadata cache (`<root>/.index.json`)
//!
//! The index is a pure function of the documents. It holds headings,
//! dates, categories and short previews, never full bodies, and can be
//! deleted or rebuilt at any time. A missing or unreadable index is a
//! signal to rebuild, not an error.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::entry::{parse_document, DocumentId, Entry};
use super::store::{write_atomic, Store};
use crate::error::{NotesError, Result};

pub const INDEX_FILE: &str = ".index.json";
const INDEX_VERSION: u32 = 2;
const KEYWORDS_PER_ENTRY: usize = 10;
// Common words plus the vocabulary of the date markers
const STOP_WORDS: [&str; 12] = [
    "the", "and", "for", "that", "with", "this", "from", "have", "was", "were", "created",
    "update",
];

/// One indexed entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRecord {
    pub heading: String,
    pub file: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub category: Option<String>,
    pub preview: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl IndexRecord {
    pub fn from_entry(entry: &Entry, preview_chars: usize) -> Self {
        Self {
            heading: entry.heading.clone(),
            file: entry.document.relative_path(),
            date: entry.date(),
            category: entry.category().map(str::to_string),
            preview: entry.preview(preview_chars),
            keywords: keywords(&format!("{} {}", entry.heading, entry.body)),
        }
    }
}

/// Most frequent words of three or more ASCII letters, lowercased, minus
/// stop words. Ties sort alphabetically so rebuilds stay byte-identical.
pub fn keywords(text: &str) -> Vec<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"\b[a-zA-Z]{3,}\b").expect("valid regex"));

    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for word in re.find_iter(text) {
        let word = word.as_str().to_ascii_lowercase();
        if !STOP_WORDS.contains(&word.as_str()) {
            *counts.entry(word).or_insert(0) += 1;
        }
    }

    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked
        .into_iter()
        .take(KEYWORDS_PER_ENTRY)
        .map(|(word, _)| word)
        .collect()
}

/// Persisted index contents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexData {
    pub version: u32,
    pub total_files: usize,
    pub total_entries: usize,
    /// Relative document paths, newest first
    pub files: Vec<String>,
    pub entries: Vec<IndexRecord>,
}

impl IndexData {
    fn new(mut files: Vec<String>, mut entries: Vec<IndexRecord>) -> Self {
        files.sort_unstable_by(|a, b| b.cmp(a));
        files.dedup();
        // Stable: keeps document order within a file
        entries.sort_by(|a, b| b.file.cmp(&a.file));
        Self {
            version: INDEX_VERSION,
            total_files: files.len(),
            total_entries: entries.len(),
            files,
            entries,
        }
    }

    /// Documents named in the index, skipping anything unparsable
    pub fn documents(&self) -> Vec<DocumentId> {
        self.files.iter().filter_map(|f| DocumentId::parse(f)).collect()
    }
}

/// Summary of a rebuild
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReindexSummary {
    pub total_files: usize,
    pub total_entries: usize,
    pub index_path: PathBuf,
}

/// Outcome of deleting the index
#[derive(Debug, Clone, Serialize)]
pub struct CleanSummary {
    pub removed: bool,
    pub reindex: Option<ReindexSummary>,
}

/// Index handle bound to a store
#[derive(Debug, Clone)]
pub struct Index {
    store: Store,
    preview_chars: usize,
}

impl Index {
    pub fn new(store: Store, preview_chars: usize) -> Self {
        Self {
            store,
            preview_chars,
        }
    }

    pub fn path(&self) -> PathBuf {
        self.store.root().join(INDEX_FILE)
    }

    pub fn exists(&self) -> bool {
        self.path().is_file()
    }

    /// Scan every document and overwrite the index
    pub fn rebuild(&self) -> Result<ReindexSummary> {
        let docs = self.store.list_documents()?;
        let mut files = Vec::with_capacity(docs.len());
        let mut records = Vec::new();

        for doc in docs {
            let text = self.store.load(doc)?;
            records.extend(
                parse_document(&text, doc)
                    .iter()
                    .map(|e| IndexRecord::from_entry(e, self.preview_chars)),
            );
            files.push(doc.relative_path());
        }

        let data = IndexData::new(files, records);
        self.write(&data)?;
        info!(
            files = data.total_files,
            entries = data.total_entries,
            "rebuilt index"
        );

        Ok(ReindexSummary {
            total_files: data.total_files,
            total_entries: data.total_entries,
            index_path: self.path(),
        })
    }

    /// Current index, rebuilding it if it is missing or corrupt
    pub fn read(&self) -> Result<IndexData> {
        if let Some(data) = self.try_read() {
            return Ok(data);
        }
        self.rebuild()?;
        self.try_read().ok_or_else(|| {
            NotesError::io(
                self.path(),
                std::io::Error::new(ErrorKind::InvalidData, "index unreadable after rebuild"),
            )
        })
    }

    fn try_read(&self) -> Option<IndexData> {
        let path = self.path();
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("index missing");
                return None;
            }
            Err(e) => {
                warn!(error = %e, "index unreadable, rebuilding");
                return None;
            }
        };
        match serde_json::from_str::<IndexData>(&text) {
            Ok(data) if data.version == INDEX_VERSION => Some(data),
            Ok(data) => {
                warn!(version = data.version, "index version mismatch, rebuilding");
                None
            }
            Err(e) => {
                warn!(error = %e, "index corrupt, rebuilding");
                None
            }
        }
    }

    /// Replace one document's records after a write
    pub fn refresh_document(&self, doc: DocumentId) -> Result<()> {
        let Some(current) = self.try_read() else {
            self.rebuild()?;
            return Ok(());
        };

        let file = doc.relative_path();
        let text = self.store.load(doc)?;
        let fresh: Vec<IndexRecord> = parse_document(&text, doc)
            .iter()
            .map(|e| IndexRecord::from_entry(e, self.preview_chars))
            .collect();

        let mut files = current.files;
        if !files.contains(&file) {
            files.push(file.clone());
        }

        // Splice the fresh records where the old ones were to keep order
        let mut records = Vec::with_capacity(current.entries.len() + fresh.len());
        let mut fresh = Some(fresh);
        for record in current.entries {
            if record.file == file {
                if let Some(fresh) = fresh.take() {
                    records.extend(fresh);
                }
            } else {
                records.push(record);
            }
        }
        if let Some(fresh) = fresh {
            records.extend(fresh);
        }

        self.write(&IndexData::new(files, records))?;
        debug!(file = %doc, "refreshed index");
        Ok(())
    }

    /// Delete the index file, optionally rebuilding it
    pub fn clean(&self, rebuild: bool) -> Result<CleanSummary> {
        let path = self.path();
        let removed = match fs::remove_file(&path) {
            Ok(()) => true,
            Err(e) if e.kind() == ErrorKind::NotFound => false,
            Err(e) => return Err(NotesError::io(path, e)),
        };

        let reindex = if rebuild { Some(self.rebuild()?) } else { None };
        Ok(CleanSummary { removed, reindex })
    }

    fn write(&self, data: &IndexData) -> Result<()> {
        let mut json = serde_json::to_string_pretty(data)?;
        json.push('\n');
        write_atomic(&self.path(), &json)
    }
}
