//! Category inference
//!
//! Maps free text to a note category with a keyword table. Kept behind the
//! [`Categorizer`] trait so the table can be swapped or extended without
//! touching storage or import code.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Work,
    Meeting,
    Learning,
    Idea,
    Decision,
    Question,
    Reference,
    Note,
}

impl Default for Category {
    fn default() -> Self {
        Category::Note
    }
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::Work,
        Category::Meeting,
        Category::Learning,
        Category::Idea,
        Category::Decision,
        Category::Question,
        Category::Reference,
        Category::Note,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Work => "Work",
            Category::Meeting => "Meeting",
            Category::Learning => "Learning",
            Category::Idea => "Idea",
            Category::Decision => "Decision",
            Category::Question => "Question",
            Category::Reference => "Reference",
            Category::Note => "Note",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown category: {}", s))
    }
}

/// Text to category
pub trait Categorizer {
    fn categorize(&self, text: &str) -> Category;
}

/// Keyword-table categorizer.
///
/// Single-word keywords match the start of a word (`fix` matches
/// `fixed`); keywords containing spaces or punctuation match as
/// substrings. The category with the most hits wins, ties go to the
/// earlier table row, and no hits at all gives [`Category::Note`].
#[derive(Debug, Clone)]
pub struct KeywordCategorizer {
    table: Vec<(Category, Vec<String>)>,
}

impl KeywordCategorizer {
    pub fn new(table: Vec<(Category, Vec<String>)>) -> Self {
        Self { table }
    }

    /// Add keywords to a category, appending a new row if needed
    pub fn with_keywords(mut self, category: Category, keywords: &[&str]) -> Self {
        let words = keywords.iter().map(|k| k.to_lowercase());
        match self.table.iter_mut().find(|(c, _)| *c == category) {
            Some((_, existing)) => existing.extend(words),
            None => self.table.push((category, words.collect())),
        }
        self
    }

    fn hits(keywords: &[String], text: &str, words: &[&str]) -> usize {
        keywords
            .iter()
            .filter(|k| {
                if k.chars().all(char::is_alphanumeric) {
                    words.iter().any(|w| w.starts_with(k.as_str()))
                } else {
                    text.contains(k.as_str())
                }
            })
            .count()
    }
}

impl Default for KeywordCategorizer {
    fn default() -> Self {
        let row = |category: Category, words: &[&str]| {
            (category, words.iter().map(|w| w.to_string()).collect())
        };
        Self::new(vec![
            row(
                Category::Work,
                &[
                    "fix", "deploy", "implement", "debug", "refactor", "release", "install",
                    "configur", "upgrad", "migrat", "shipped", "merged", "bug",
                ],
            ),
            row(
                Category::Meeting,
                &["meeting", "standup", "retrospective", "call with", "discussed", "sync with"],
            ),
            row(
                Category::Learning,
                &["learn", "realiz", "realis", "tutorial", "discovered", "today i learned", "til:"],
            ),
            row(
                Category::Idea,
                &["idea", "what if", "brainstorm", "proposal", "could we"],
            ),
            row(
                Category::Decision,
                &["decided", "decision", "chose", "approved", "rejected", "going with"],
            ),
            row(
                Category::Question,
                &["how to", "how do", "why does", "wonder", "question", "unclear"],
            ),
            row(
                Category::Reference,
                &["http://", "https://", "bookmark", "documentation", "reference"],
            ),
        ])
    }
}

impl Categorizer for KeywordCategorizer {
    fn categorize(&self, text: &str) -> Category {
        let text = text.to_lowercase();
        let words: Vec<&str> = text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();

        let mut best = (Category::Note, 0);
        for (category, keywords) in &self.table {
            let hits = Self::hits(keywords, &text, &words);
            if hits > best.1 {
                best = (*category, hits);
            }
        }
        best.0
    }
}
