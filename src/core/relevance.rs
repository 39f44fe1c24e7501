//! Relevance - Query scoring, ranking and update resolution
//!
//! Score = heading + content + recency:
//! - heading: whole query inside the heading beats every term inside the
//!   heading, which beats individual term hits
//! - content: per-occurrence points, capped so long bodies cannot outrank
//!   a precise heading match
//! - recency: small bonus for young entries, only on top of a positive score
//!
//! All weights come from [`ScoringConfig`].

use std::cmp::Reverse;

use chrono::NaiveDate;
use serde::Serialize;

use super::entry::Entry;
use crate::config::ScoringConfig;

/// Lower-cased query split into terms
#[derive(Debug, Clone)]
pub struct Query {
    phrase: String,
    terms: Vec<String>,
}

impl Query {
    pub fn new(text: &str) -> Self {
        let phrase = text.trim().to_lowercase();
        let terms = phrase.split_whitespace().map(str::to_string).collect();
        Self { phrase, terms }
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }
}

/// Score breakdown for one entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Score {
    pub heading: u32,
    pub content: u32,
    pub recency: u32,
}

impl Score {
    pub fn total(&self) -> u32 {
        self.heading
            .saturating_add(self.content)
            .saturating_add(self.recency)
    }
}

/// An entry with its score
#[derive(Debug, Clone)]
pub struct Ranked<'a> {
    pub entry: &'a Entry,
    pub score: Score,
}

impl Ranked<'_> {
    pub fn relevance(&self) -> u32 {
        self.score.total()
    }
}

/// Result of resolving an append target
#[derive(Debug, Clone)]
pub enum Resolution<'a> {
    /// Confident match; `runners_up` are the next best candidates
    Match {
        target: Ranked<'a>,
        runners_up: Vec<Ranked<'a>>,
    },
    /// Best candidate below the confidence threshold
    Ambiguous { alternatives: Vec<Ranked<'a>> },
    /// No entry scored above zero
    NotFound,
}

/// Scores entries against queries
#[derive(Debug, Clone)]
pub struct RelevanceEngine {
    config: ScoringConfig,
    today: NaiveDate,
}

impl RelevanceEngine {
    pub fn new(config: ScoringConfig, today: NaiveDate) -> Self {
        Self { config, today }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn heading_score(&self, query: &Query, heading: &str) -> u32 {
        if query.is_empty() {
            return 0;
        }
        let heading = heading.to_lowercase();

        if heading.contains(&query.phrase) {
            self.config.exact_phrase
        } else if query.terms.iter().all(|t| heading.contains(t.as_str())) {
            self.config.all_terms
        } else {
            let hits = query
                .terms
                .iter()
                .filter(|t| heading.contains(t.as_str()))
                .count() as u32;
            hits.saturating_mul(self.config.per_term)
        }
    }

    pub fn content_score(&self, query: &Query, body: &str) -> u32 {
        let body = body.to_lowercase();
        let occurrences: usize = query
            .terms
            .iter()
            .map(|t| body.matches(t.as_str()).count())
            .sum();
        let raw = (occurrences as u64).saturating_mul(self.config.content_per_occurrence as u64);
        raw.min(self.config.content_cap as u64) as u32
    }

    pub fn recency_bonus(&self, date: NaiveDate) -> u32 {
        let age = (self.today - date).num_days();
        self.config
            .recency_tiers
            .iter()
            .find(|(max_days, _)| age < *max_days)
            .map(|(_, bonus)| *bonus)
            .unwrap_or(0)
    }

    pub fn score(&self, query: &Query, entry: &Entry) -> Score {
        let heading = self.heading_score(query, &entry.heading);
        let content = self.content_score(query, &entry.body);
        // Recency alone never makes an entry relevant
        let recency = if heading.saturating_add(content) > 0 {
            self.recency_bonus(entry.date())
        } else {
            0
        };
        Score {
            heading,
            content,
            recency,
        }
    }

    /// Every positively scored entry, best first. Ties go to the more
    /// recent entry, then to the input order.
    pub fn rank<'a>(&self, query: &Query, entries: &'a [Entry]) -> Vec<Ranked<'a>> {
        let mut ranked: Vec<Ranked<'a>> = entries
            .iter()
            .map(|entry| Ranked {
                entry,
                score: self.score(query, entry),
            })
            .filter(|r| r.relevance() > 0)
            .collect();
        ranked.sort_by_key(|r| (Reverse(r.relevance()), Reverse(r.entry.date())));
        ranked
    }

    /// Top `limit` entries for a search
    pub fn search<'a>(&self, query: &Query, entries: &'a [Entry], limit: usize) -> Vec<Ranked<'a>> {
        let mut ranked = self.rank(query, entries);
        ranked.truncate(limit);
        ranked
    }

    /// Pick the single entry an update should go to, or refuse
    pub fn resolve<'a>(&self, query: &Query, entries: &'a [Entry]) -> Resolution<'a> {
        let mut ranked = self.rank(query, entries);
        if ranked.is_empty() {
            return Resolution::NotFound;
        }

        if ranked[0].relevance() < self.config.min_confidence {
            ranked.truncate(3);
            return Resolution::Ambiguous {
                alternatives: ranked,
            };
        }

        ranked.truncate(3);
        let target = ranked.remove(0);
        Resolution::Match {
            target,
            runners_up: ranked,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::entry::DocumentId;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 11, 10).unwrap()
    }

    fn engine() -> RelevanceEngine {
        RelevanceEngine::new(ScoringConfig::default(), today())
    }

    fn entry(heading: &str, body: &str, created: NaiveDate) -> Entry {
        Entry {
            heading: heading.to_string(),
            body: body.to_string(),
            created: Some(created),
            updates: Vec::new(),
            document: DocumentId::for_date(created),
            ordinal: 0,
        }
    }

    fn old() -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()
    }

    #[test]
    fn test_heading_tiers() {
        let e = engine();
        let heading = "Work - Fixed login bug";
        assert_eq!(e.heading_score(&Query::new("login bug"), heading), 500);
        assert_eq!(e.heading_score(&Query::new("LOGIN"), heading), 500);
        assert_eq!(e.heading_score(&Query::new("bug login"), heading), 100);
        assert_eq!(e.heading_score(&Query::new("login crash timeout"), heading), 20);
        assert_eq!(e.heading_score(&Query::new("bug login crash"), heading), 40);
        assert_eq!(e.heading_score(&Query::new("nothing"), heading), 0);
    }

    #[test]
    fn test_content_is_capped() {
        let e = engine();
        let q = Query::new("cache");
        let few = entry("Note - a", "cache cache", old());
        let many = entry("Note - a", &"cache ".repeat(100), old());

        assert_eq!(e.score(&q, &few).content, 10);
        assert_eq!(e.score(&q, &many).content, 50);
        assert_eq!(
            e.score(&q, &many).total() - e.score(&q, &few).total(),
            40
        );
    }

    #[test]
    fn test_recency_tiers() {
        let e = engine();
        let t = today();
        assert_eq!(e.recency_bonus(t), 10);
        assert_eq!(e.recency_bonus(t - chrono::Duration::days(29)), 10);
        assert_eq!(e.recency_bonus(t - chrono::Duration::days(30)), 5);
        assert_eq!(e.recency_bonus(t - chrono::Duration::days(100)), 2);
        assert_eq!(e.recency_bonus(t - chrono::Duration::days(400)), 0);
    }

    #[test]
    fn test_recency_needs_positive_base() {
        let e = engine();
        let fresh = entry("Meeting - Standup", "nothing relevant", today());
        let score = e.score(&Query::new("kubernetes"), &fresh);
        assert_eq!(score.total(), 0);
        assert!(e.search(&Query::new("kubernetes"), &[fresh], 10).is_empty());
    }

    #[test]
    fn test_empty_query_scores_nothing() {
        let e = engine();
        let entries = vec![entry("Work - A", "a", today())];
        assert!(e.search(&Query::new("   "), &entries, 10).is_empty());
        assert!(matches!(e.resolve(&Query::new(""), &entries), Resolution::NotFound));
    }

    #[test]
    fn test_heading_match_beats_noisy_body() {
        let e = engine();
        let entries = vec![
            entry("Note - Misc", &"deploy ".repeat(50), today()),
            entry("Work - Deploy pipeline", "short", old()),
        ];
        let ranked = e.search(&Query::new("deploy"), &entries, 10);
        assert_eq!(ranked[0].entry.heading, "Work - Deploy pipeline");
    }

    #[test]
    fn test_ties_break_by_recency_then_order() {
        let e = engine();
        let entries = vec![
            entry("Work - Alpha one", "", old()),
            entry("Work - Alpha two", "", NaiveDate::from_ymd_opt(2021, 1, 1).unwrap()),
            entry("Work - Alpha three", "", old()),
        ];
        let ranked = e.search(&Query::new("alpha"), &entries, 10);
        let headings: Vec<_> = ranked.iter().map(|r| r.entry.heading.as_str()).collect();
        assert_eq!(headings, vec!["Work - Alpha two", "Work - Alpha one", "Work - Alpha three"]);
    }

    #[test]
    fn test_search_limit() {
        let e = engine();
        let entries: Vec<_> = (0..20)
            .map(|i| entry(&format!("Work - Item {}", i), "", today()))
            .collect();
        assert_eq!(e.search(&Query::new("item"), &entries, 10).len(), 10);
    }

    #[test]
    fn test_resolve_match_with_runners_up() {
        let e = engine();
        let entries = vec![
            entry("Work - Fixed login bug", "session cookie", today()),
            entry("Work - Login page redesign", "", today()),
            entry("Note - Bug triage", "", today()),
        ];
        match e.resolve(&Query::new("login bug"), &entries) {
            Resolution::Match { target, runners_up } => {
                assert_eq!(target.entry.heading, "Work - Fixed login bug");
                assert_eq!(runners_up.len(), 2);
            }
            other => panic!("expected match, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_rejects_weak_match() {
        let e = engine();
        // One term in the heading plus recency: 20 + 10 < 50
        let entries = vec![entry("Work - Login page", "", today())];
        match e.resolve(&Query::new("login timeout retries"), &entries) {
            Resolution::Ambiguous { alternatives } => {
                assert_eq!(alternatives.len(), 1);
                assert_eq!(alternatives[0].relevance(), 30);
            }
            other => panic!("expected ambiguous, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_not_found() {
        let e = engine();
        let entries = vec![entry("Work - Login page", "", today())];
        assert!(matches!(
            e.resolve(&Query::new("zzqqxx-not-present"), &entries),
            Resolution::NotFound
        ));
    }

    #[test]
    fn test_threshold_is_configurable() {
        let config = ScoringConfig {
            min_confidence: 10,
            ..ScoringConfig::default()
        };
        let e = RelevanceEngine::new(config, today());
        let entries = vec![entry("Work - Login page", "", today())];
        assert!(matches!(
            e.resolve(&Query::new("login timeout retries"), &entries),
            Resolution::Match { .. }
        ));
    }

    #[test]
    fn test_extreme_weights_saturate() {
        let config = ScoringConfig {
            per_term: u32::MAX,
            content_per_occurrence: u32::MAX,
            content_cap: u32::MAX,
            recency_tiers: vec![(30, u32::MAX)],
            ..ScoringConfig::default()
        };
        let e = RelevanceEngine::new(config, today());
        let entries = vec![entry("Work - Login page", "timeout timeout retries", today())];

        let ranked = e.rank(&Query::new("login timeout retries"), &entries);
        assert_eq!(ranked[0].score.heading, u32::MAX);
        assert_eq!(ranked[0].relevance(), u32::MAX);
    }
}
