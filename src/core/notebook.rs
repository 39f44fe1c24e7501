//! Notebook - One handle over store, index and relevance engine
//!
//! Every command the CLI and the stdio protocol expose is a method here.
//!
//! # Key Points
//! - The root is resolved once by the caller and never re-queried
//! - Documents are written first, then the index is refreshed; a failed
//!   refresh is logged and left for the next read to rebuild
//! - Resolution failures are returned as [`AppendOutcome`] values and
//!   leave every document untouched

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::category::{Categorizer, KeywordCategorizer};
use super::entry::{
    has_category_prefix, is_file_title, parse_document, preview, DocumentId, Entry, UNTITLED,
};
use super::import::{self, MigrationReport};
use super::index::{CleanSummary, Index, IndexData, ReindexSummary};
use super::relevance::{Query, Ranked, RelevanceEngine, Resolution};
use super::store::{LockOptions, Store};
use super::validate::{self, ValidationReport};
use crate::config::{Config, ResolvedRoot, RootSource};
use crate::error::{NotesError, Result};

/// Result of `add`
#[derive(Debug, Clone, Serialize)]
pub struct AddResult {
    pub status: &'static str,
    /// Document path relative to the root
    pub file: String,
    pub heading: String,
    /// Absolute document path
    pub path: PathBuf,
}

/// One search result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub heading: String,
    /// Body preview
    pub content: String,
    pub file: String,
    pub date: NaiveDate,
    pub relevance: u32,
}

/// Candidate offered when an append target is not confident
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    pub heading: String,
    pub file: String,
    pub relevance: u32,
}

impl From<&Ranked<'_>> for Candidate {
    fn from(r: &Ranked<'_>) -> Self {
        Self {
            heading: r.entry.heading.clone(),
            file: r.entry.document.relative_path(),
            relevance: r.relevance(),
        }
    }
}

/// Result of `append`
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AppendOutcome {
    Success {
        heading: String,
        file: String,
        relevance: u32,
        /// Next best headings, for the caller to double check
        alternatives: Vec<String>,
    },
    Ambiguous {
        query: String,
        message: String,
        alternatives: Vec<Candidate>,
    },
    NotFound {
        query: String,
        message: String,
        alternatives: Vec<Candidate>,
    },
}

impl AppendOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, AppendOutcome::Success { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub earliest: NaiveDate,
    pub latest: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeywordCount {
    pub keyword: String,
    /// Number of entries listing the keyword
    pub count: usize,
}

/// Result of `stats`
#[derive(Debug, Clone, Serialize)]
pub struct Stats {
    pub total_entries: usize,
    pub total_files: usize,
    pub categories: BTreeMap<String, usize>,
    pub date_range: Option<DateRange>,
    pub top_keywords: Vec<KeywordCount>,
}

/// Result of `info`
#[derive(Debug, Clone, Serialize)]
pub struct Info {
    pub root: PathBuf,
    pub source: RootSource,
    pub alternate_detected: bool,
    pub using_alternate: bool,
    pub root_exists: bool,
    pub root_writable: bool,
    pub index_file: PathBuf,
    pub index_exists: bool,
    pub current_month_file: PathBuf,
    pub platform: &'static str,
}

/// Result of `migrate`
#[derive(Debug, Clone, Serialize)]
pub struct MigrateResult {
    /// `success`, or `partial` when some files failed
    pub status: &'static str,
    pub imported: usize,
    pub skipped: usize,
    pub errors: usize,
    pub details: MigrationReport,
    pub index_rebuilt: bool,
    pub total_entries: usize,
}

const TOP_KEYWORDS: usize = 10;

pub struct Notebook {
    root: ResolvedRoot,
    config: Config,
    store: Store,
    index: Index,
    categorizer: Box<dyn Categorizer>,
    today: Option<NaiveDate>,
}

impl Notebook {
    pub fn open(root: ResolvedRoot, config: Config) -> Self {
        let lock = LockOptions {
            timeout: std::time::Duration::from_millis(config.storage.lock_timeout_ms),
            stale_after: std::time::Duration::from_secs(config.storage.stale_lock_secs),
        };
        let store = Store::new(root.path.clone()).with_lock_options(lock);
        let index = Index::new(store.clone(), config.search.preview_chars);
        Self {
            root,
            config,
            store,
            index,
            categorizer: Box::new(KeywordCategorizer::default()),
            today: None,
        }
    }

    /// Replace the category inference used by `migrate`
    pub fn with_categorizer(mut self, categorizer: Box<dyn Categorizer>) -> Self {
        self.categorizer = categorizer;
        self
    }

    /// Pin "today" for dating new entries and recency scoring
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn root(&self) -> &ResolvedRoot {
        &self.root
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn index(&self) -> &Index {
        &self.index
    }

    pub fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    fn engine(&self) -> RelevanceEngine {
        RelevanceEngine::new(self.config.scoring.clone(), self.today())
    }

    /// Add an entry to the current month's document
    pub fn add(&self, heading: &str, content: &str, category: Option<&str>) -> Result<AddResult> {
        let heading = heading.trim();
        if heading.is_empty() {
            return Err(NotesError::invalid("heading is required"));
        }
        if heading.eq_ignore_ascii_case(UNTITLED) {
            return Err(NotesError::invalid("heading must not be 'Untitled'"));
        }
        if heading.contains(['\n', '\r']) {
            return Err(NotesError::invalid("heading must be a single line"));
        }
        if content.trim().is_empty() {
            return Err(NotesError::invalid("content is required"));
        }

        let heading = match category.map(str::trim).filter(|c| !c.is_empty()) {
            Some(cat) if cat.contains(char::is_whitespace) => {
                return Err(NotesError::invalid(format!("invalid category: {}", cat)));
            }
            Some(cat) if !has_category_prefix(heading) => format!("{} - {}", cat, heading),
            _ => heading.to_string(),
        };
        if is_file_title(&heading) {
            return Err(NotesError::invalid(format!(
                "heading '{}' has the shape of a document title",
                heading
            )));
        }

        let today = self.today();
        let doc = DocumentId::for_date(today);
        let path = self.store.append_entry(doc, &heading, content, today)?;
        self.refresh_index(doc);
        info!(file = %doc, heading = %heading, "added entry");

        Ok(AddResult {
            status: "success",
            file: doc.relative_path(),
            heading,
            path,
        })
    }

    /// Ranked search; `limit` falls back to `search.default_limit`
    pub fn search(&self, query: &str, limit: Option<usize>) -> Result<Vec<SearchHit>> {
        let limit = limit.unwrap_or(self.config.search.default_limit);
        let query = Query::new(query);
        if query.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let entries = self.load_entries()?;
        let engine = self.engine();
        let preview_chars = self.config.search.preview_chars;
        let hits = engine
            .search(&query, &entries, limit)
            .iter()
            .map(|r| SearchHit {
                heading: r.entry.heading.clone(),
                content: preview(&r.entry.body, preview_chars),
                file: r.entry.document.relative_path(),
                date: r.entry.date(),
                relevance: r.relevance(),
            })
            .collect::<Vec<_>>();
        debug!(terms = ?query.terms(), hits = hits.len(), "search");
        Ok(hits)
    }

    /// Append a dated update to the single best match for `search_term`
    pub fn append(&self, search_term: &str, content: &str) -> Result<AppendOutcome> {
        if search_term.trim().is_empty() {
            return Err(NotesError::invalid("search_term is required"));
        }
        if content.trim().is_empty() {
            return Err(NotesError::invalid("content is required"));
        }

        let entries = self.load_entries()?;
        let engine = self.engine();
        let query = Query::new(search_term);

        let (target, runners_up) = match engine.resolve(&query, &entries) {
            Resolution::NotFound => {
                return Ok(AppendOutcome::NotFound {
                    query: search_term.to_string(),
                    message: "No matching entry found. Create a new note?".to_string(),
                    alternatives: Vec::new(),
                });
            }
            Resolution::Ambiguous { alternatives } => {
                return Ok(AppendOutcome::Ambiguous {
                    query: search_term.to_string(),
                    message: "No strong match found. Be more specific or use one of these headings."
                        .to_string(),
                    alternatives: alternatives.iter().map(Candidate::from).collect(),
                });
            }
            Resolution::Match { target, runners_up } => (target, runners_up),
        };

        let doc = target.entry.document;
        self.store.append_update(
            doc,
            &target.entry.heading,
            target.entry.ordinal,
            content,
            self.today(),
        )?;
        self.refresh_index(doc);
        info!(file = %doc, heading = %target.entry.heading, "appended update");

        Ok(AppendOutcome::Success {
            heading: target.entry.heading.clone(),
            file: doc.relative_path(),
            relevance: target.relevance(),
            alternatives: runners_up.iter().map(|r| r.entry.heading.clone()).collect(),
        })
    }

    pub fn reindex(&self) -> Result<ReindexSummary> {
        self.index.rebuild()
    }

    pub fn stats(&self) -> Result<Stats> {
        let data = self.index.read()?;
        Ok(stats_from_index(&data))
    }

    pub fn info(&self) -> Info {
        let root = &self.root.path;
        let root_exists = root.is_dir();
        let root_writable = root_exists
            && fs::metadata(root)
                .map(|m| !m.permissions().readonly())
                .unwrap_or(false);
        Info {
            root: root.clone(),
            source: self.root.source,
            alternate_detected: self.root.alternate_detected,
            using_alternate: self.root.using_alternate(),
            root_exists,
            root_writable,
            index_file: self.index.path(),
            index_exists: self.index.exists(),
            current_month_file: self.store.document_path(DocumentId::for_date(self.today())),
            platform: std::env::consts::OS,
        }
    }

    pub fn validate(&self) -> Result<ValidationReport> {
        validate::validate(&self.store)
    }

    pub fn clean_index(&self, rebuild: bool) -> Result<CleanSummary> {
        self.index.clean(rebuild)
    }

    /// Import a directory of markdown files, then rebuild the index
    pub fn migrate(&self, source: &std::path::Path, recursive: bool) -> Result<MigrateResult> {
        let report = import::migrate(&self.store, self.categorizer.as_ref(), source, recursive)?;
        let summary = self.index.rebuild()?;
        info!(
            imported = report.imported.len(),
            skipped = report.skipped.len(),
            errors = report.errors.len(),
            "migration finished"
        );

        Ok(MigrateResult {
            status: if report.is_clean() { "success" } else { "partial" },
            imported: report.imported.len(),
            skipped: report.skipped.len(),
            errors: report.errors.len(),
            details: report,
            index_rebuilt: true,
            total_entries: summary.total_entries,
        })
    }

    /// Runs after a document write has landed, so failures are logged
    /// rather than returned. A stale index is dropped for the next read to
    /// rebuild.
    fn refresh_index(&self, doc: DocumentId) {
        if let Err(e) = self.index.refresh_document(doc) {
            warn!(file = %doc, error = %e, "index refresh failed; will rebuild on next read");
            if let Err(e) = self.index.clean(false) {
                warn!(error = %e, "could not remove stale index");
            }
        }
    }

    /// Entries of every indexed document, in index order
    fn load_entries(&self) -> Result<Vec<Entry>> {
        let data = self.index.read()?;
        let mut entries = Vec::with_capacity(data.total_entries);
        for doc in data.documents() {
            let text = self.store.load(doc)?;
            entries.extend(parse_document(&text, doc));
        }
        Ok(entries)
    }
}

fn stats_from_index(data: &IndexData) -> Stats {
    let mut categories = BTreeMap::new();
    for record in &data.entries {
        let cat = record
            .category
            .clone()
            .unwrap_or_else(|| "Uncategorized".to_string());
        *categories.entry(cat).or_insert(0) += 1;
    }

    let mut keyword_counts: BTreeMap<&str, usize> = BTreeMap::new();
    for keyword in data.entries.iter().flat_map(|r| &r.keywords) {
        *keyword_counts.entry(keyword.as_str()).or_insert(0) += 1;
    }
    let mut top_keywords: Vec<KeywordCount> = keyword_counts
        .into_iter()
        .map(|(keyword, count)| KeywordCount {
            keyword: keyword.to_string(),
            count,
        })
        .collect();
    // BTreeMap order already breaks ties alphabetically
    top_keywords.sort_by(|a, b| b.count.cmp(&a.count));
    top_keywords.truncate(TOP_KEYWORDS);

    let earliest = data.entries.iter().map(|r| r.date).min();
    let latest = data.entries.iter().map(|r| r.date).max();
    let date_range = match (earliest, latest) {
        (Some(earliest), Some(latest)) => Some(DateRange { earliest, latest }),
        _ => None,
    };

    Stats {
        total_entries: data.total_entries,
        total_files: data.total_files,
        categories,
        date_range,
        top_keywords,
    }
}
