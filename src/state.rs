//! Application state: wires sources, storage, loader and assembler from config

use crate::assembler::VerseTextAssembler;
use crate::cache::SystemClock;
use crate::config::ReaderConfig;
use crate::highlight::ActiveWordStore;
use crate::loader::{LoaderOptions, SurahDataLoader};
use crate::source::{CorpusSource, DirCorpusSource, HttpCorpusSource};
use crate::storage::{KeyValueStore, NullStore, SqliteStore};
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Application state holding the assembler (and through it the loader)
pub struct AppState {
    pub assembler: Arc<VerseTextAssembler>,
    pub active_word: ActiveWordStore,
    pub config: ReaderConfig,
}

impl AppState {
    /// Initialize application state
    pub fn new(config: ReaderConfig) -> Result<Self> {
        let source: Arc<dyn CorpusSource> = match &config.corpus_dir {
            Some(dir) => {
                info!(dir = ?dir, "Reading corpus from local directory");
                Arc::new(DirCorpusSource::new(dir.clone(), config.corpus_file.clone()))
            }
            None => {
                info!(url = %config.surah_url, "Fetching corpus over HTTP");
                Arc::new(
                    HttpCorpusSource::new(
                        config.surah_url.clone(),
                        config.corpus_url.clone(),
                        Duration::from_secs(config.request_timeout_secs),
                    )
                    .context("Failed to set up corpus source")?,
                )
            }
        };

        let storage = Self::open_storage(&config);

        let loader = SurahDataLoader::with_options(
            source,
            storage,
            LoaderOptions {
                storage_prefix: config.storage_prefix.clone(),
                expiry_ms: config.expiry_ms(),
            },
            Arc::new(SystemClock),
        );

        Ok(Self {
            assembler: Arc::new(VerseTextAssembler::new(loader)),
            active_word: ActiveWordStore::new(),
            config,
        })
    }

    pub fn loader(&self) -> &SurahDataLoader {
        self.assembler.loader()
    }

    /// The persistent tier is optional: if it can't be opened we run without it.
    fn open_storage(config: &ReaderConfig) -> Arc<dyn KeyValueStore> {
        if !config.persistent_cache {
            return Arc::new(NullStore);
        }
        let path = config.cache_db_path();
        match SqliteStore::open(&path) {
            Ok(store) => {
                info!(path = ?path, "Persistent cache ready");
                Arc::new(store)
            }
            Err(e) => {
                warn!(path = ?path, error = %e, "Persistent cache unavailable, continuing without it");
                Arc::new(NullStore)
            }
        }
    }
}
