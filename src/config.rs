//! Reader configuration
//!
//! Every field has a default, so an empty or partial TOML file is valid.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Per-surah word files; `{surah}` is replaced with the surah number
pub const DEFAULT_SURAH_URL: &str = "https://cdn.mushaf.app/words/{surah}.json";
/// Monolithic word corpus, used when a per-surah file can't be fetched
pub const DEFAULT_CORPUS_URL: &str = "https://cdn.mushaf.app/words/all.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    pub surah_url: String,
    pub corpus_url: String,
    /// Read corpus files from this directory instead of over HTTP
    pub corpus_dir: Option<PathBuf>,
    /// Name of the monolithic file inside `corpus_dir`
    pub corpus_file: String,
    pub request_timeout_secs: u64,
    /// Persistent cache database; defaults to `cache.db` in the data directory
    pub cache_db: Option<PathBuf>,
    pub persistent_cache: bool,
    pub storage_prefix: String,
    pub expiry_hours: u64,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            surah_url: DEFAULT_SURAH_URL.to_string(),
            corpus_url: DEFAULT_CORPUS_URL.to_string(),
            corpus_dir: None,
            corpus_file: "all.json".to_string(),
            request_timeout_secs: 30,
            cache_db: None,
            persistent_cache: true,
            storage_prefix: crate::loader::DEFAULT_STORAGE_PREFIX.to_string(),
            expiry_hours: 24,
        }
    }
}

impl ReaderConfig {
    /// Load from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config at {:?}", path))?;
        Self::from_toml(&content).with_context(|| format!("Invalid config at {:?}", path))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn cache_db_path(&self) -> PathBuf {
        self.cache_db
            .clone()
            .unwrap_or_else(|| get_data_dir().join("cache.db"))
    }

    pub fn expiry_ms(&self) -> i64 {
        (self.expiry_hours as i64).saturating_mul(60 * 60 * 1000)
    }
}

/// Get the data directory
///
/// - Platform data dir (e.g. ~/.local/share/Mushaf) when available
/// - `data` relative to the working directory otherwise
pub fn get_data_dir() -> PathBuf {
    if let Some(data_dir) = dirs::data_dir() {
        return data_dir.join("Mushaf");
    }
    PathBuf::from("data")
}
