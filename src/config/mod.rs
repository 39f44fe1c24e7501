//! Configuration module
//!
//! Loaded once per process from TOML and resolved into a [`ResolvedRoot`]
//! that is handed to the store. Nothing below the CLI layer reads the
//! environment.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Environment variable overriding the storage root
pub const ROOT_ENV: &str = "NOTES_DIR";

/// Environment variable pointing at a config file
pub const CONFIG_ENV: &str = "NOTES_CONFIG";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub scoring: ScoringConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Fixed root; wins over the alternate and default roots
    #[serde(default)]
    pub root: Option<PathBuf>,

    /// Preferred root when its parent folder exists (cloud-sync folder)
    #[serde(default)]
    pub alternate_root: Option<PathBuf>,

    /// How long a writer waits for a document lock
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,

    /// Lock files older than this are assumed abandoned
    #[serde(default = "default_stale_lock_secs")]
    pub stale_lock_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: None,
            alternate_root: None,
            lock_timeout_ms: default_lock_timeout_ms(),
            stale_lock_secs: default_stale_lock_secs(),
        }
    }
}

fn default_lock_timeout_ms() -> u64 {
    2000
}

fn default_stale_lock_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_limit")]
    pub default_limit: usize,

    /// Maximum characters of body kept in index previews and search output
    #[serde(default = "default_preview_chars")]
    pub preview_chars: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            preview_chars: default_preview_chars(),
        }
    }
}

fn default_limit() -> usize {
    10
}

fn default_preview_chars() -> usize {
    300
}

/// Relevance weights.
///
/// `exact_phrase` and `min_confidence` were tuned by hand on a small
/// personal corpus; they are exposed here so they can be recalibrated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default = "default_exact_phrase")]
    pub exact_phrase: u32,

    #[serde(default = "default_all_terms")]
    pub all_terms: u32,

    #[serde(default = "default_per_term")]
    pub per_term: u32,

    #[serde(default = "default_content_per_occurrence")]
    pub content_per_occurrence: u32,

    #[serde(default = "default_content_cap")]
    pub content_cap: u32,

    /// Best score an append target must reach
    #[serde(default = "default_min_confidence")]
    pub min_confidence: u32,

    /// (max age in days, bonus) pairs, checked in order
    #[serde(default = "default_recency_tiers")]
    pub recency_tiers: Vec<(i64, u32)>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            exact_phrase: default_exact_phrase(),
            all_terms: default_all_terms(),
            per_term: default_per_term(),
            content_per_occurrence: default_content_per_occurrence(),
            content_cap: default_content_cap(),
            min_confidence: default_min_confidence(),
            recency_tiers: default_recency_tiers(),
        }
    }
}

fn default_exact_phrase() -> u32 {
    500
}

fn default_all_terms() -> u32 {
    100
}

fn default_per_term() -> u32 {
    20
}

fn default_content_per_occurrence() -> u32 {
    5
}

fn default_content_cap() -> u32 {
    50
}

fn default_min_confidence() -> u32 {
    50
}

fn default_recency_tiers() -> Vec<(i64, u32)> {
    vec![(30, 10), (90, 5), (180, 2)]
}

/// Where the storage root came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RootSource {
    /// `--root`, `NOTES_DIR` or `storage.root`
    Override,
    /// Cloud-sync folder
    Alternate,
    Default,
}

/// Storage root decided once per process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRoot {
    pub path: PathBuf,
    pub source: RootSource,
    /// Whether the alternate root's parent folder exists on this machine
    pub alternate_detected: bool,
}

impl ResolvedRoot {
    /// Root used as-is, e.g. in tests
    pub fn fixed(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            source: RootSource::Override,
            alternate_detected: false,
        }
    }

    pub fn using_alternate(&self) -> bool {
        self.source == RootSource::Alternate
    }
}

impl Config {
    /// Load config from `explicit`, then `NOTES_CONFIG`, then the platform
    /// config dir. A missing file yields the default config.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }

        if let Ok(env_path) = std::env::var(CONFIG_ENV) {
            let path = PathBuf::from(env_path);
            if path.exists() {
                return Self::load_from(&path);
            }
            return Ok(Self::default());
        }

        if let Some(global) = Self::global_config_path() {
            if global.exists() {
                return Self::load_from(&global);
            }
        }

        Ok(Self::default())
    }

    /// Load config from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        Ok(config)
    }

    /// Save config to a file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Platform config file (e.g. ~/.config/mdnotes/config.toml)
    pub fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "mdnotes")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Resolve the storage root for this process.
    ///
    /// Priority:
    /// 1. `override_root` (CLI flag or `NOTES_DIR`, decided by the caller)
    /// 2. `storage.root` from the config file
    /// 3. Alternate root, if its parent folder exists
    /// 4. `<home>/Documents/notes`
    pub fn resolve_root(&self, override_root: Option<PathBuf>, home: Option<&Path>) -> ResolvedRoot {
        let alternate = self
            .storage
            .alternate_root
            .clone()
            .or_else(|| home.map(|h| h.join("OneDrive").join("Documents").join("notes")));
        let alternate_detected = alternate
            .as_deref()
            .and_then(Path::parent)
            .map(Path::is_dir)
            .unwrap_or(false);

        if let Some(path) = override_root.or_else(|| self.storage.root.clone()) {
            return ResolvedRoot {
                path,
                source: RootSource::Override,
                alternate_detected,
            };
        }

        if alternate_detected {
            if let Some(path) = alternate {
                return ResolvedRoot {
                    path,
                    source: RootSource::Alternate,
                    alternate_detected,
                };
            }
        }

        let path = home
            .map(|h| h.join("Documents").join("notes"))
            .unwrap_or_else(|| PathBuf::from("notes"));
        ResolvedRoot {
            path,
            source: RootSource::Default,
            alternate_detected,
        }
    }
}

/// Current user's home directory
pub fn home_dir() -> Option<PathBuf> {
    directories::UserDirs::new().map(|u| u.home_dir().to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.search.default_limit, 10);
        assert_eq!(config.search.preview_chars, 300);
        assert_eq!(config.scoring.exact_phrase, 500);
        assert_eq!(config.scoring.min_confidence, 50);
        assert_eq!(config.scoring.content_cap, 50);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() -> Result<()> {
        let config: Config = toml::from_str("[scoring]\nmin_confidence = 80\n")?;
        assert_eq!(config.scoring.min_confidence, 80);
        assert_eq!(config.scoring.exact_phrase, 500);
        assert_eq!(config.storage.lock_timeout_ms, 2000);
        Ok(())
    }

    #[test]
    fn test_save_and_load_roundtrip() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.storage.root = Some(PathBuf::from("/srv/notes"));
        config.save_to(&path)?;

        let loaded = Config::load(Some(&path))?;
        assert_eq!(loaded.storage.root, Some(PathBuf::from("/srv/notes")));
        Ok(())
    }

    #[test]
    fn test_resolve_prefers_override() -> Result<()> {
        let home = TempDir::new()?;
        std::fs::create_dir_all(home.path().join("OneDrive").join("Documents"))?;

        let root = Config::default().resolve_root(Some(PathBuf::from("/tmp/x")), Some(home.path()));
        assert_eq!(root.path, PathBuf::from("/tmp/x"));
        assert_eq!(root.source, RootSource::Override);
        assert!(root.alternate_detected);
        Ok(())
    }

    #[test]
    fn test_resolve_alternate_when_present() -> Result<()> {
        let home = TempDir::new()?;
        std::fs::create_dir_all(home.path().join("OneDrive").join("Documents"))?;

        let root = Config::default().resolve_root(None, Some(home.path()));
        assert_eq!(
            root.path,
            home.path().join("OneDrive").join("Documents").join("notes")
        );
        assert!(root.using_alternate());
        Ok(())
    }

    #[test]
    fn test_resolve_default_without_alternate() -> Result<()> {
        let home = TempDir::new()?;

        let root = Config::default().resolve_root(None, Some(home.path()));
        assert_eq!(root.path, home.path().join("Documents").join("notes"));
        assert_eq!(root.source, RootSource::Default);
        assert!(!root.alternate_detected);
        Ok(())
    }

    #[test]
    fn test_config_root_beats_alternate() -> Result<()> {
        let home = TempDir::new()?;
        std::fs::create_dir_all(home.path().join("OneDrive").join("Documents"))?;

        let mut config = Config::default();
        config.storage.root = Some(home.path().join("mine"));
        let root = config.resolve_root(None, Some(home.path()));
        assert_eq!(root.path, home.path().join("mine"));
        assert_eq!(root.source, RootSource::Override);
        Ok(())
    }
}
