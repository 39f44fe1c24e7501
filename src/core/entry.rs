//! Entry - Core data structure and document parser
//!
//! An entry is one discrete note inside a monthly document:
//!
//! ```markdown
//! # Notes - November 2025
//!
//! # Work - Fixed login bug
//! Session cookie was not refreshed.
//!
//! **Created:** 2025-11-01
//!
//! **Update (2025-11-03):** Deployed fix
//! ```
//!
//! The first heading is a file title only when it matches
//! `<word> - <MonthName> <YYYY>`. Every other top-level heading starts an
//! entry; `##` and deeper headings belong to the body.

use std::fmt;
use std::sync::OnceLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Heading placeholder that must never name an entry
pub const UNTITLED: &str = "Untitled";

pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Identifies one monthly document (`<YYYY>/<MM>-<MonthName>.md`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId {
    pub year: i32,
    pub month: u32,
}

impl DocumentId {
    /// Returns `None` for months outside 1..=12
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    pub fn for_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn month_name(&self) -> &'static str {
        MONTH_NAMES[(self.month - 1) as usize]
    }

    /// e.g. `11-November.md`
    pub fn file_name(&self) -> String {
        format!("{:02}-{}.md", self.month, self.month_name())
    }

    /// e.g. `2025/11-November.md`, always `/`-separated
    pub fn relative_path(&self) -> String {
        format!("{}/{}", self.year, self.file_name())
    }

    /// Title line written when the document is created
    pub fn title(&self) -> String {
        format!("# Notes - {} {}", self.month_name(), self.year)
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or_default()
    }

    /// Parse a relative path produced by [`relative_path`](Self::relative_path).
    /// The month name must agree with the month number.
    pub fn parse(relative: &str) -> Option<Self> {
        let relative = relative.replace('\\', "/");
        let (year, file) = relative.split_once('/')?;
        if year.len() != 4 || !year.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let stem = file.strip_suffix(".md")?;
        let (month, name) = stem.split_once('-')?;
        if month.len() != 2 {
            return None;
        }
        let doc = Self::new(year.parse().ok()?, month.parse().ok()?)?;
        (doc.month_name() == name).then_some(doc)
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.relative_path())
    }
}

/// A dated update appended to an entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Update {
    pub date: NaiveDate,
    pub text: String,
}

/// One note parsed out of a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub heading: String,
    pub body: String,
    /// Date from the `**Created:**` marker, if present
    pub created: Option<NaiveDate>,
    /// Update markers in document order
    pub updates: Vec<Update>,
    pub document: DocumentId,
    /// Position among the document's entries, starting at 0
    pub ordinal: usize,
}

impl Entry {
    /// Date used for ranking and indexing
    pub fn date(&self) -> NaiveDate {
        self.created.unwrap_or_else(|| self.document.first_day())
    }

    /// Category prefix of `"<Category> - <description>"` headings
    pub fn category(&self) -> Option<&str> {
        heading_category(&self.heading)
    }

    /// Body truncated to `max_chars` characters
    pub fn preview(&self, max_chars: usize) -> String {
        preview(&self.body, max_chars)
    }
}

pub fn heading_category(heading: &str) -> Option<&str> {
    heading
        .split_once(" - ")
        .map(|(cat, _)| cat.trim())
        .filter(|cat| !cat.is_empty())
}

/// Whether a heading already carries a `Category - ` prefix
pub fn has_category_prefix(heading: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\w+ - \S").expect("valid regex"))
        .is_match(heading)
}

/// Trimmed text of at most `max_chars` characters, ellipsis included
pub fn preview(text: &str, max_chars: usize) -> String {
    const ELLIPSIS: &str = "...";

    let trimmed = text.trim();
    if trimmed.chars().count() <= max_chars {
        return trimmed.to_string();
    }
    let keep = max_chars.saturating_sub(ELLIPSIS.len());
    let cut: String = trimmed.chars().take(keep).collect();
    let mut out = cut.trim_end().to_string();
    out.extend(ELLIPSIS.chars().take(max_chars - keep));
    out
}

/// If `line` is a top-level heading, return its text
pub fn heading_text(line: &str) -> Option<&str> {
    let rest = line.trim_start().strip_prefix('#')?;
    if !rest.starts_with(|c: char| c == ' ' || c == '\t') {
        return None;
    }
    let text = rest.trim();
    (!text.is_empty()).then_some(text)
}

/// Whether `heading` has the `<word> - <MonthName> <YYYY>` shape of a
/// document title
pub fn is_file_title(heading: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(r"^\w+ - ({}) \d{{4}}$", MONTH_NAMES.join("|"))).expect("valid regex")
    })
    .is_match(heading)
}

/// Where one entry sits in a document's lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntrySpan<'a> {
    pub heading: &'a str,
    /// Index of the heading line
    pub start: usize,
    /// Index of the next heading line, or the line count
    pub end: usize,
}

/// Locate entries in a document split into lines. A leading title heading
/// ends the preamble but is not an entry.
pub fn entry_spans<'a>(lines: &[&'a str]) -> Vec<EntrySpan<'a>> {
    let headings: Vec<(usize, &'a str)> = lines
        .iter()
        .copied()
        .enumerate()
        .filter_map(|(i, line)| heading_text(line).map(|h| (i, h)))
        .collect();

    headings
        .iter()
        .enumerate()
        .filter(|(n, (_, heading))| !(*n == 0 && is_file_title(heading)))
        .map(|(n, &(start, heading))| EntrySpan {
            heading,
            start,
            end: headings.get(n + 1).map_or(lines.len(), |&(i, _)| i),
        })
        .collect()
}

/// Split a document into entries. Never fails: text before the first
/// heading is ignored and a leading title heading is dropped.
pub fn parse_document(text: &str, document: DocumentId) -> Vec<Entry> {
    let lines: Vec<&str> = text.lines().collect();
    entry_spans(&lines)
        .into_iter()
        .enumerate()
        .map(|(ordinal, span)| {
            build_entry(
                span.heading.to_string(),
                &lines[span.start + 1..span.end],
                document,
                ordinal,
            )
        })
        .collect()
}

fn build_entry(heading: String, lines: &[&str], document: DocumentId, ordinal: usize) -> Entry {
    let end = lines
        .iter()
        .rposition(|l| !l.trim().is_empty())
        .map(|i| i + 1)
        .unwrap_or(0);
    let body = lines[..end].join("\n");

    Entry {
        created: parse_created(&body),
        updates: parse_updates(&body),
        heading,
        body,
        document,
        ordinal,
    }
}

/// `**Created:** YYYY-MM-DD` marker
pub fn parse_created(body: &str) -> Option<NaiveDate> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"(?m)^\s*\*\*Created:\*\*\s*(\d{4}-\d{2}-\d{2})").expect("valid regex")
    });
    re.captures(body)
        .and_then(|c| NaiveDate::parse_from_str(&c[1], "%Y-%m-%d").ok())
}

/// `**Update (YYYY-MM-DD):** text` markers, in order
pub fn parse_updates(body: &str) -> Vec<Update> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"(?m)^\s*\*\*Update \((\d{4}-\d{2}-\d{2})\):\*\*\s*(.*)$").expect("valid regex")
    });
    re.captures_iter(body)
        .filter_map(|c| {
            let date = NaiveDate::parse_from_str(&c[1], "%Y-%m-%d").ok()?;
            Some(Update {
                date,
                text: c[2].trim().to_string(),
            })
        })
        .collect()
}

/// Format a new entry block for appending to a document
pub fn format_entry(heading: &str, body: &str, created: NaiveDate) -> String {
    let body = body.trim();
    if body.is_empty() {
        format!("\n# {}\n\n**Created:** {}\n", heading, created)
    } else {
        format!("\n# {}\n{}\n\n**Created:** {}\n", heading, body, created)
    }
}

pub fn format_update(text: &str, date: NaiveDate) -> String {
    format!("**Update ({}):** {}", date, text.trim())
}
