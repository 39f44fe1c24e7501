//! Store - Monthly markdown documents on disk
//!
//! Layout: `<root>/<YYYY>/<MM>-<MonthName>.md`.
//!
//! # Key Points
//! - Documents are authoritative; everything else is derived
//! - Every mutation is written to a temp file in the same directory and
//!   renamed over the original, so a crash never leaves half a document
//! - Writers hold an advisory `<document>.lock` file for the duration of
//!   the read-modify-write; the guard removes it on drop

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, SystemTime};

use chrono::NaiveDate;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use super::entry::{entry_spans, format_entry, format_update, DocumentId};
use crate::error::{NotesError, Result};

const LOCK_RETRY: Duration = Duration::from_millis(25);

/// Lock behaviour for writers
#[derive(Debug, Clone, Copy)]
pub struct LockOptions {
    pub timeout: Duration,
    pub stale_after: Duration,
}

impl Default for LockOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(2000),
            stale_after: Duration::from_secs(30),
        }
    }
}

/// File-backed document store
#[derive(Debug, Clone)]
pub struct Store {
    root: PathBuf,
    lock: LockOptions,
}

impl Store {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            lock: LockOptions::default(),
        }
    }

    pub fn with_lock_options(mut self, lock: LockOptions) -> Self {
        self.lock = lock;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn document_path(&self, doc: DocumentId) -> PathBuf {
        self.root
            .join(doc.year.to_string())
            .join(doc.file_name())
    }

    pub fn exists(&self, doc: DocumentId) -> bool {
        self.document_path(doc).is_file()
    }

    /// Document text, or an empty string if the document does not exist
    pub fn load(&self, doc: DocumentId) -> Result<String> {
        let path = self.document_path(doc);
        match fs::read_to_string(&path) {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(NotesError::io(path, e)),
        }
    }

    /// Replace a document's contents atomically
    pub fn save(&self, doc: DocumentId, text: &str) -> Result<()> {
        let path = self.document_path(doc);
        let _guard = self.lock_document(&path)?;
        write_atomic(&path, text)
    }

    /// Append a new entry, creating the year directory and document as needed
    pub fn append_entry(
        &self,
        doc: DocumentId,
        heading: &str,
        body: &str,
        created: NaiveDate,
    ) -> Result<PathBuf> {
        let path = self.document_path(doc);
        let _guard = self.lock_document(&path)?;

        let mut text = self.load(doc)?;
        if text.trim().is_empty() {
            text = format!("{}\n", doc.title());
        } else if !text.ends_with('\n') {
            text.push('\n');
        }
        text.push_str(&format_entry(heading, body, created));

        write_atomic(&path, &text)?;
        debug!(file = %doc, heading, "appended entry");
        Ok(path)
    }

    /// Insert an update block right after the body of the `ordinal`-th
    /// entry. Its heading must still read `heading`, otherwise the document
    /// changed underneath the caller and nothing is written.
    pub fn append_update(
        &self,
        doc: DocumentId,
        heading: &str,
        ordinal: usize,
        update: &str,
        date: NaiveDate,
    ) -> Result<PathBuf> {
        let path = self.document_path(doc);
        let _guard = self.lock_document(&path)?;

        let text = self.load(doc)?;
        let block = format_update(update, date);
        let updated = insert_update(&text, heading, ordinal, &block).ok_or_else(
            || NotesError::EntryNotFound {
                heading: heading.to_string(),
                file: doc.relative_path(),
            },
        )?;

        write_atomic(&path, &updated)?;
        debug!(file = %doc, heading, ordinal, "appended update");
        Ok(path)
    }

    /// All well-formed documents under the root, newest first
    pub fn list_documents(&self) -> Result<Vec<DocumentId>> {
        let mut docs = Vec::new();
        for year_dir in self.year_dirs()? {
            let entries = fs::read_dir(&year_dir).map_err(|e| NotesError::io(&year_dir, e))?;
            for entry in entries {
                let entry = entry.map_err(|e| NotesError::io(&year_dir, e))?;
                let name = entry.file_name().to_string_lossy().to_string();
                let year = year_dir
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default();
                match DocumentId::parse(&format!("{}/{}", year, name)) {
                    Some(doc) if entry.path().is_file() => docs.push(doc),
                    _ => {}
                }
            }
        }
        docs.sort_unstable_by(|a, b| b.cmp(a));
        Ok(docs)
    }

    /// Four-digit directories directly under the root, ascending
    pub fn year_dirs(&self) -> Result<Vec<PathBuf>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(NotesError::io(&self.root, e)),
        };

        let mut dirs = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| NotesError::io(&self.root, e))?;
            let name = entry.file_name().to_string_lossy().to_string();
            if name.len() == 4 && name.chars().all(|c| c.is_ascii_digit()) && entry.path().is_dir()
            {
                dirs.push(entry.path());
            }
        }
        dirs.sort();
        Ok(dirs)
    }

    fn lock_document(&self, path: &Path) -> Result<DocumentLock> {
        DocumentLock::acquire(path, self.lock)
    }
}

/// Splice `block` after the body of the `ordinal`-th entry.
/// Returns `None` when that entry is missing or headed differently.
fn insert_update(text: &str, heading: &str, ordinal: usize, block: &str) -> Option<String> {
    let lines: Vec<&str> = text.split('\n').collect();
    let span = entry_spans(&lines)
        .into_iter()
        .nth(ordinal)
        .filter(|span| span.heading == heading)?;
    let (start, next) = (span.start, span.end);

    // Last non-blank line of the body; the heading itself if the body is empty
    let body_end = lines[start..next]
        .iter()
        .rposition(|l| !l.trim().is_empty())
        .map(|i| start + i)
        .unwrap_or(start);

    let mut out: Vec<&str> = Vec::with_capacity(lines.len() + 2);
    out.extend_from_slice(&lines[..=body_end]);
    out.push("");
    out.push(block);
    if body_end + 1 == lines.len() {
        out.push("");
    } else {
        out.extend_from_slice(&lines[body_end + 1..]);
    }
    Some(out.join("\n"))
}

/// Write `contents` to a sibling temp file, fsync it, then rename it over `path`
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| NotesError::invalid(format!("no parent for {}", path.display())))?;
    fs::create_dir_all(dir).map_err(|e| NotesError::io(dir, e))?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| NotesError::io(dir, e))?;
    tmp.write_all(contents.as_bytes())
        .map_err(|e| NotesError::io(tmp.path(), e))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| NotesError::io(tmp.path(), e))?;
    tmp.persist(path)
        .map_err(|e| NotesError::io(path, e.error))?;
    Ok(())
}

/// Advisory lock held as `<path>.lock`; released on drop
#[derive(Debug)]
pub struct DocumentLock {
    path: PathBuf,
}

impl DocumentLock {
    pub fn acquire(target: &Path, opts: LockOptions) -> Result<Self> {
        let mut lock_name = target.as_os_str().to_owned();
        lock_name.push(".lock");
        let path = PathBuf::from(lock_name);

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|e| NotesError::io(dir, e))?;
        }

        let deadline = SystemTime::now() + opts.timeout;
        loop {
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    let _ = writeln!(file, "{}", std::process::id());
                    return Ok(Self { path });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    if is_stale(&path, opts.stale_after) {
                        warn!(lock = %path.display(), "breaking stale lock");
                        let _ = fs::remove_file(&path);
                        continue;
                    }
                    if SystemTime::now() >= deadline {
                        return Err(NotesError::LockTimeout { path });
                    }
                    thread::sleep(LOCK_RETRY);
                }
                Err(e) => return Err(NotesError::io(path, e)),
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for DocumentLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            if e.kind() != ErrorKind::NotFound {
                warn!(lock = %self.path.display(), error = %e, "failed to release lock");
            }
        }
    }
}

fn is_stale(path: &Path, stale_after: Duration) -> bool {
    fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .and_then(|modified| modified.elapsed().ok())
        .map(|age| age > stale_after)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::entry::parse_document;
    use anyhow::Result;
    use tempfile::TempDir;

    fn nov() -> DocumentId {
        DocumentId::new(2025, 11).unwrap()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 11, d).unwrap()
    }

    #[test]
    fn test_load_missing_is_empty() -> Result<()> {
        let dir = TempDir::new()?;
        let store = Store::new(dir.path());
        assert_eq!(store.load(nov())?, "");
        assert!(!store.exists(nov()));
        Ok(())
    }

    #[test]
    fn test_append_entry_creates_document() -> Result<()> {
        let dir = TempDir::new()?;
        let store = Store::new(dir.path().join("notes"));

        let path = store.append_entry(nov(), "Work - Fixed login bug", "Cookie refresh", day(1))?;
        assert_eq!(path, dir.path().join("notes/2025/11-November.md"));

        let text = store.load(nov())?;
        assert!(text.starts_with("# Notes - November 2025\n"));
        assert!(text.contains("# Work - Fixed login bug\nCookie refresh\n\n**Created:** 2025-11-01\n"));

        store.append_entry(nov(), "Idea - Second", "More", day(2))?;
        let entries = parse_document(&store.load(nov())?, nov());
        assert_eq!(entries.len(), 2);
        Ok(())
    }

    #[test]
    fn test_append_update_after_body_before_next_entry() -> Result<()> {
        let dir = TempDir::new()?;
        let store = Store::new(dir.path());
        store.append_entry(nov(), "Work - Fixed login bug", "Cookie refresh", day(1))?;
        store.append_entry(nov(), "Idea - Other", "Unrelated", day(2))?;

        store.append_update(nov(), "Work - Fixed login bug", 0, "Deployed fix", day(3))?;

        let text = store.load(nov())?;
        let entries = parse_document(&text, nov());
        assert_eq!(entries.len(), 2);
        assert_eq!(
            entries[0].body,
            "Cookie refresh\n\n**Created:** 2025-11-01\n\n**Update (2025-11-03):** Deployed fix"
        );
        assert_eq!(entries[0].created, Some(day(1)));
        assert_eq!(entries[1].body, "Unrelated\n\n**Created:** 2025-11-02");
        Ok(())
    }

    #[test]
    fn test_append_update_on_last_entry_keeps_order() -> Result<()> {
        let dir = TempDir::new()?;
        let store = Store::new(dir.path());
        store.append_entry(nov(), "Work - A", "a", day(1))?;

        store.append_update(nov(), "Work - A", 0, "first", day(2))?;
        store.append_update(nov(), "Work - A", 0, "second", day(3))?;

        let entries = parse_document(&store.load(nov())?, nov());
        let texts: Vec<_> = entries[0].updates.iter().map(|u| u.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second"]);
        assert!(store.load(nov())?.ends_with('\n'));
        Ok(())
    }

    #[test]
    fn test_append_update_missing_heading() -> Result<()> {
        let dir = TempDir::new()?;
        let store = Store::new(dir.path());
        store.append_entry(nov(), "Work - A", "a", day(1))?;

        let before = store.load(nov())?;
        let err = store
            .append_update(nov(), "Work - Missing", 0, "x", day(2))
            .unwrap_err();
        assert!(matches!(err, NotesError::EntryNotFound { .. }));
        let err = store
            .append_update(nov(), "Work - A", 1, "x", day(2))
            .unwrap_err();
        assert!(matches!(err, NotesError::EntryNotFound { .. }));
        assert_eq!(store.load(nov())?, before);
        Ok(())
    }

    #[test]
    fn test_append_update_targets_duplicate_heading_by_ordinal() -> Result<()> {
        let dir = TempDir::new()?;
        let store = Store::new(dir.path());
        store.append_entry(nov(), "Work - Standup", "monday", day(1))?;
        store.append_entry(nov(), "Work - Standup", "tuesday", day(2))?;

        store.append_update(nov(), "Work - Standup", 1, "moved to 10am", day(3))?;

        let entries = parse_document(&store.load(nov())?, nov());
        assert!(entries[0].updates.is_empty());
        assert_eq!(entries[1].updates.len(), 1);
        assert_eq!(entries[1].updates[0].text, "moved to 10am");
        Ok(())
    }

    #[test]
    fn test_append_update_skips_title_heading() -> Result<()> {
        let dir = TempDir::new()?;
        let store = Store::new(dir.path());
        store.save(
            nov(),
            "# Notes - November 2025\n\n# Notes - November 2025\nmonthly summary\n",
        )?;

        store.append_update(nov(), "Notes - November 2025", 0, "added totals", day(4))?;

        let text = store.load(nov())?;
        assert!(text.starts_with("# Notes - November 2025\n\n# Notes - November 2025\nmonthly summary\n"));
        let entries = parse_document(&text, nov());
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].updates.len(), 1);
        Ok(())
    }

    #[test]
    fn test_insert_update_empty_body() {
        let text = "# Work - A\n# Work - B\nb\n";
        let out = insert_update(text, "Work - A", 0, "**Update (2025-11-02):** x").unwrap();
        assert_eq!(out, "# Work - A\n\n**Update (2025-11-02):** x\n# Work - B\nb\n");
    }

    #[test]
    fn test_save_replaces_and_leaves_no_temp_files() -> Result<()> {
        let dir = TempDir::new()?;
        let store = Store::new(dir.path());
        store.save(nov(), "# Notes - November 2025\n")?;
        store.save(nov(), "# Notes - November 2025\n\n# Work - X\n")?;

        assert_eq!(store.load(nov())?, "# Notes - November 2025\n\n# Work - X\n");
        let names: Vec<_> = fs::read_dir(dir.path().join("2025"))?
            .map(|e| e.map(|e| e.file_name().to_string_lossy().to_string()))
            .collect::<std::result::Result<_, _>>()?;
        assert_eq!(names, vec!["11-November.md".to_string()]);
        Ok(())
    }

    #[test]
    fn test_lock_is_exclusive_and_released() -> Result<()> {
        let dir = TempDir::new()?;
        let target = dir.path().join("doc.md");
        let opts = LockOptions {
            timeout: Duration::from_millis(50),
            stale_after: Duration::from_secs(60),
        };

        let lock = DocumentLock::acquire(&target, opts)?;
        assert!(lock.path().exists());
        let err = DocumentLock::acquire(&target, opts).unwrap_err();
        assert!(matches!(err, NotesError::LockTimeout { .. }));

        let lock_path = lock.path().to_path_buf();
        drop(lock);
        assert!(!lock_path.exists());
        DocumentLock::acquire(&target, opts)?;
        Ok(())
    }

    #[test]
    fn test_stale_lock_is_broken() -> Result<()> {
        let dir = TempDir::new()?;
        let target = dir.path().join("doc.md");
        fs::write(dir.path().join("doc.md.lock"), "12345")?;

        let opts = LockOptions {
            timeout: Duration::from_millis(50),
            stale_after: Duration::ZERO,
        };
        thread::sleep(Duration::from_millis(10));
        let lock = DocumentLock::acquire(&target, opts)?;
        assert!(lock.path().exists());
        Ok(())
    }

    #[test]
    fn test_list_documents_newest_first() -> Result<()> {
        let dir = TempDir::new()?;
        let store = Store::new(dir.path());
        for (y, m) in [(2024, 12), (2025, 2), (2025, 11)] {
            let doc = DocumentId::new(y, m).unwrap();
            store.append_entry(doc, "Note - x", "y", doc.first_day())?;
        }
        fs::write(dir.path().join("2025").join("scratch.md"), "# x")?;
        fs::create_dir_all(dir.path().join(".hidden"))?;

        let docs: Vec<_> = store
            .list_documents()?
            .iter()
            .map(|d| d.relative_path())
            .collect();
        assert_eq!(
            docs,
            vec!["2025/11-November.md", "2025/02-February.md", "2024/12-December.md"]
        );
        Ok(())
    }
}
