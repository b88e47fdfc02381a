//! Corpus resources: per-surah word files and the monolithic fallback
//!
//! Sources hand back raw JSON; parsing and filtering belong to the loader.

use crate::error::MushafError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Placeholder substituted with the surah number in URL and file templates
pub const SURAH_PLACEHOLDER: &str = "{surah}";

#[async_trait]
pub trait CorpusSource: Send + Sync {
    /// Word records of one surah, as a JSON object keyed by location
    async fn fetch_surah(&self, surah: u32) -> Result<String, MushafError>;

    /// Word records of every surah in one JSON object
    async fn fetch_corpus(&self) -> Result<String, MushafError>;
}

/// Fetches corpus files over HTTP
pub struct HttpCorpusSource {
    client: reqwest::Client,
    surah_url_template: String,
    corpus_url: String,
}

impl HttpCorpusSource {
    pub fn new(
        surah_url_template: impl Into<String>,
        corpus_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, MushafError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MushafError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            surah_url_template: surah_url_template.into(),
            corpus_url: corpus_url.into(),
        })
    }

    pub fn surah_url(&self, surah: u32) -> String {
        self.surah_url_template.replace(SURAH_PLACEHOLDER, &surah.to_string())
    }

    async fn fetch_text(&self, url: &str) -> Result<String, MushafError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| MushafError::ResourceUnreachable(format!("{}: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(MushafError::ResourceUnavailable(format!(
                "{}: HTTP {}",
                url,
                response.status()
            )));
        }

        response
            .text()
            .await
            .map_err(|e| MushafError::ResourceUnreachable(format!("{}: {}", url, e)))
    }
}

#[async_trait]
impl CorpusSource for HttpCorpusSource {
    async fn fetch_surah(&self, surah: u32) -> Result<String, MushafError> {
        let url = self.surah_url(surah);
        self.fetch_text(&url).await
    }

    async fn fetch_corpus(&self) -> Result<String, MushafError> {
        self.fetch_text(&self.corpus_url).await
    }
}

/// Reads corpus files from a local directory: `<dir>/<surah>.json` plus one
/// monolithic file.
pub struct DirCorpusSource {
    dir: PathBuf,
    corpus_file: String,
}

impl DirCorpusSource {
    pub fn new(dir: impl Into<PathBuf>, corpus_file: impl Into<String>) -> Self {
        Self { dir: dir.into(), corpus_file: corpus_file.into() }
    }

    async fn read(path: &Path) -> Result<String, MushafError> {
        tokio::fs::read_to_string(path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                MushafError::ResourceUnavailable(format!("{:?} not found", path))
            }
            _ => MushafError::ResourceUnreachable(format!("{:?}: {}", path, e)),
        })
    }
}

#[async_trait]
impl CorpusSource for DirCorpusSource {
    async fn fetch_surah(&self, surah: u32) -> Result<String, MushafError> {
        Self::read(&self.dir.join(format!("{}.json", surah))).await
    }

    async fn fetch_corpus(&self) -> Result<String, MushafError> {
        Self::read(&self.dir.join(&self.corpus_file)).await
    }
}
