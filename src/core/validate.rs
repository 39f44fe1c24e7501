//! Validate - Read-only health check of the documents under the root

use std::fs;
use std::path::Path;

use serde::Serialize;

use super::entry::{entry_spans, DocumentId};
use super::store::Store;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub file: String,
    pub issue: String,
    pub severity: Severity,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub files_checked: usize,
    pub issues_found: usize,
    pub issues: Vec<Issue>,
}

impl ValidationReport {
    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Error)
    }
}

/// Check every `.md` file in the year directories. Never mutates anything.
pub fn validate(store: &Store) -> Result<ValidationReport> {
    let mut report = ValidationReport::default();

    for year_dir in store.year_dirs()? {
        let year = year_dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        let mut files: Vec<_> = match fs::read_dir(&year_dir) {
            Ok(entries) => entries
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| p.is_file() && p.extension().map_or(false, |ext| ext == "md"))
                .collect(),
            Err(e) => {
                report.issues.push(Issue {
                    file: year.clone(),
                    issue: format!("Unreadable directory: {}", e),
                    severity: Severity::Error,
                });
                continue;
            }
        };
        files.sort();

        for path in files {
            report.files_checked += 1;
            check_file(&year, &path, &mut report.issues);
        }
    }

    report.issues_found = report.issues.len();
    Ok(report)
}

fn check_file(year: &str, path: &Path, issues: &mut Vec<Issue>) {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let relative = format!("{}/{}", year, name);
    let mut push = |issue: String, severity: Severity| {
        issues.push(Issue {
            file: relative.clone(),
            issue,
            severity,
        })
    };

    if DocumentId::parse(&relative).is_none() {
        push(
            "File name does not match MM-MonthName.md; ignored by search".to_string(),
            Severity::Info,
        );
    }

    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            push(format!("Unreadable: {}", e), Severity::Error);
            return;
        }
    };
    let Ok(text) = String::from_utf8(bytes) else {
        push("Not valid UTF-8".to_string(), Severity::Error);
        return;
    };

    if text.trim().is_empty() {
        push("Empty file".to_string(), Severity::Warning);
        return;
    }

    if !text.trim_start().starts_with('#') {
        push("No top-level heading".to_string(), Severity::Info);
    }

    // Counted from line structure alone, so odd file names are checked too
    let lines: Vec<&str> = text.lines().collect();
    if entry_spans(&lines).is_empty() {
        push("No entries found".to_string(), Severity::Warning);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    #[test]
    fn test_clean_store_has_no_issues() -> Result<()> {
        let dir = TempDir::new()?;
        let store = Store::new(dir.path());
        let doc = DocumentId::new(2025, 11).unwrap();
        store.append_entry(doc, "Work - A", "a", NaiveDate::from_ymd_opt(2025, 11, 1).unwrap())?;

        let report = validate(&store)?;
        assert_eq!(report.files_checked, 1);
        assert_eq!(report.issues_found, 0);
        assert!(!report.has_errors());
        Ok(())
    }

    #[test]
    fn test_flags_problems_without_mutating() -> Result<()> {
        let dir = TempDir::new()?;
        let year = dir.path().join("2025");
        fs::create_dir_all(&year)?;
        fs::write(year.join("01-January.md"), "")?;
        fs::write(year.join("02-February.md"), [0xc3, 0x28])?;
        fs::write(year.join("03-March.md"), "# Notes - March 2025\n\njust a title\n")?;
        fs::write(year.join("04-April.md"), "preamble\n# Work - ok\nbody\n")?;
        fs::write(year.join("scratch.md"), "# Idea - x\n")?;
        fs::write(year.join("draft.md"), "# Notes - May 2025\n")?;

        let store = Store::new(dir.path());
        let report = validate(&store)?;
        assert_eq!(report.files_checked, 6);

        let find = |file: &str| -> Vec<(String, Severity)> {
            report
                .issues
                .iter()
                .filter(|i| i.file == file)
                .map(|i| (i.issue.clone(), i.severity))
                .collect()
        };
        assert_eq!(find("2025/01-January.md"), vec![("Empty file".to_string(), Severity::Warning)]);
        assert_eq!(find("2025/02-February.md"), vec![("Not valid UTF-8".to_string(), Severity::Error)]);
        assert_eq!(find("2025/03-March.md"), vec![("No entries found".to_string(), Severity::Warning)]);
        assert_eq!(find("2025/04-April.md"), vec![("No top-level heading".to_string(), Severity::Info)]);
        assert_eq!(find("2025/scratch.md").len(), 1);
        assert_eq!(find("2025/draft.md").len(), 2);
        assert!(report.has_errors());

        assert_eq!(fs::read(year.join("02-February.md"))?, vec![0xc3, 0x28]);
        assert!(!dir.path().join(".index.json").exists());
        Ok(())
    }
}
