//! Surah dataset resolution through memory, persistent storage and network
//!
//! Resolution order for a surah:
//! 1. memory tier (unexpired entry, returned without suspending)
//! 2. persistent tier (unexpired entry, promoted into memory)
//! 3. per-surah resource
//! 4. monolithic corpus, filtered down to the surah
//! 5. empty dataset
//!
//! Steps 3 and 4 write through to both tiers. Nothing here ever fails towards
//! the caller; every error is logged and degraded.

use crate::cache::{CacheEntry, Clock, SystemClock, EXPIRY_WINDOW_MS};
use crate::error::MushafError;
use crate::source::CorpusSource;
use crate::storage::KeyValueStore;
use crate::surahs;
use crate::words::SurahDataset;
use futures_util::future::{BoxFuture, FutureExt, Shared};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info, warn};

/// Default key prefix in the persistent tier: `surah_words_<n>`
pub const DEFAULT_STORAGE_PREFIX: &str = "surah_words";

type InFlight = Shared<BoxFuture<'static, Arc<SurahDataset>>>;

#[derive(Debug, Clone)]
pub struct LoaderOptions {
    pub storage_prefix: String,
    pub expiry_ms: i64,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            storage_prefix: DEFAULT_STORAGE_PREFIX.to_string(),
            expiry_ms: EXPIRY_WINDOW_MS,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoaderStats {
    pub memory_entries: usize,
    pub in_flight: usize,
    pub corpus_cached: bool,
}

/// Resolves surah numbers to their word datasets. Cheap to clone; clones
/// share caches.
#[derive(Clone)]
pub struct SurahDataLoader {
    inner: Arc<LoaderInner>,
}

struct LoaderInner {
    source: Arc<dyn CorpusSource>,
    storage: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    options: LoaderOptions,
    memory: Mutex<HashMap<u32, CacheEntry<Arc<SurahDataset>>>>,
    in_flight: Mutex<HashMap<u32, InFlight>>,
    /// Parsed monolithic corpus, kept once fetched
    corpus: Mutex<Option<Arc<SurahDataset>>>,
}

impl SurahDataLoader {
    pub fn new(source: Arc<dyn CorpusSource>, storage: Arc<dyn KeyValueStore>) -> Self {
        Self::with_options(source, storage, LoaderOptions::default(), Arc::new(SystemClock))
    }

    pub fn with_options(
        source: Arc<dyn CorpusSource>,
        storage: Arc<dyn KeyValueStore>,
        options: LoaderOptions,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            inner: Arc::new(LoaderInner {
                source,
                storage,
                clock,
                options,
                memory: Mutex::new(HashMap::new()),
                in_flight: Mutex::new(HashMap::new()),
                corpus: Mutex::new(None),
            }),
        }
    }

    /// Dataset for `surah`. Resolves to an empty dataset when nothing can be
    /// loaded; never fails.
    ///
    /// Concurrent calls for the same surah share one resolution.
    pub async fn load_surah_data(&self, surah: u32) -> Arc<SurahDataset> {
        if let Some(dataset) = self.inner.memory_hit(surah) {
            return dataset;
        }

        let pending = {
            let mut in_flight = self.inner.in_flight.lock().unwrap();
            in_flight
                .entry(surah)
                .or_insert_with(|| {
                    let inner = Arc::clone(&self.inner);
                    async move {
                        let dataset = inner.resolve(surah).await;
                        inner.in_flight.lock().unwrap().remove(&surah);
                        dataset
                    }
                    .boxed()
                    .shared()
                })
                .clone()
        };

        pending.await
    }

    /// Memory-tier lookup only
    pub fn cached_surah_data(&self, surah: u32) -> Option<Arc<SurahDataset>> {
        self.inner.memory_hit(surah)
    }

    /// Start loading `surah` in the background. Outcome is only logged.
    pub fn preload_surah_data(&self, surah: u32) {
        if self.inner.memory_hit(surah).is_some() {
            return;
        }
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let loader = self.clone();
                handle.spawn(async move {
                    let dataset = loader.load_surah_data(surah).await;
                    debug!(surah, words = dataset.len(), "Preloaded surah");
                });
            }
            Err(e) => warn!(surah, error = %e, "Cannot preload surah outside a runtime"),
        }
    }

    /// Warm the cache for the surahs either side of `current`.
    pub fn preload_adjacent_surahs(&self, current: u32) {
        for surah in surahs::adjacent(current) {
            self.preload_surah_data(surah);
        }
    }

    pub fn stats(&self) -> LoaderStats {
        LoaderStats {
            memory_entries: self.inner.memory.lock().unwrap().len(),
            in_flight: self.inner.in_flight.lock().unwrap().len(),
            corpus_cached: self.inner.corpus.lock().unwrap().is_some(),
        }
    }

    /// Drop the memory tier and the fallback corpus. Persistent entries stay.
    pub fn clear_memory(&self) {
        self.inner.memory.lock().unwrap().clear();
        *self.inner.corpus.lock().unwrap() = None;
    }

    pub fn storage_key(&self, surah: u32) -> String {
        self.inner.storage_key(surah)
    }
}

impl LoaderInner {
    fn storage_key(&self, surah: u32) -> String {
        format!("{}_{}", self.options.storage_prefix, surah)
    }

    fn memory_hit(&self, surah: u32) -> Option<Arc<SurahDataset>> {
        let now = self.clock.now_millis();
        let memory = self.memory.lock().unwrap();
        memory
            .get(&surah)
            .filter(|entry| entry.is_valid(now, self.options.expiry_ms))
            .map(|entry| Arc::clone(&entry.data))
    }

    async fn resolve(&self, surah: u32) -> Arc<SurahDataset> {
        // Another resolution may have finished since the caller looked
        if let Some(dataset) = self.memory_hit(surah) {
            return dataset;
        }

        if let Some(entry) = self.read_persistent(surah).await {
            debug!(surah, "Surah served from persistent cache");
            let dataset = Arc::new(entry.data);
            self.memory
                .lock()
                .unwrap()
                .insert(surah, CacheEntry::new(Arc::clone(&dataset), entry.timestamp));
            return dataset;
        }

        match self.fetch_surah(surah).await {
            Ok(dataset) => {
                info!(surah, words = dataset.len(), "Fetched surah words");
                let dataset = Arc::new(dataset);
                self.write_through(surah, &dataset).await;
                return dataset;
            }
            Err(e) => warn!(surah, error = %e, "Surah fetch failed, falling back to full corpus"),
        }

        match self.fetch_from_corpus(surah).await {
            Ok(dataset) => {
                info!(surah, words = dataset.len(), "Loaded surah words from full corpus");
                let dataset = Arc::new(dataset);
                self.write_through(surah, &dataset).await;
                dataset
            }
            Err(e) => {
                error!(surah, error = %e, "No word data available for surah");
                Arc::new(SurahDataset::default())
            }
        }
    }

    /// Storage access and (de)serialization run on the blocking pool.
    async fn read_persistent(&self, surah: u32) -> Option<CacheEntry<SurahDataset>> {
        let key = self.storage_key(surah);
        let storage = Arc::clone(&self.storage);
        let task_key = key.clone();
        let read = tokio::task::spawn_blocking(move || {
            let entry: Option<CacheEntry<SurahDataset>> = match storage.get(&task_key)? {
                Some(raw) => Some(serde_json::from_str(&raw)?),
                None => None,
            };
            Ok::<_, MushafError>(entry)
        })
        .await;

        let entry = match read {
            Ok(Ok(Some(entry))) => entry,
            Ok(Ok(None)) => return None,
            Ok(Err(e @ MushafError::Parse(_))) => {
                warn!(key = %key, error = %e, "Ignoring corrupt persistent cache entry");
                return None;
            }
            Ok(Err(e)) => {
                warn!(key = %key, error = %e, "Persistent cache read failed");
                return None;
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Persistent cache read task failed");
                return None;
            }
        };

        if !entry.is_valid(self.clock.now_millis(), self.options.expiry_ms) {
            debug!(key = %key, "Persistent cache entry expired");
            return None;
        }
        Some(entry)
    }

    /// Memory unconditionally, persistent tier best-effort.
    async fn write_through(&self, surah: u32, dataset: &Arc<SurahDataset>) {
        let timestamp = self.clock.now_millis();
        self.memory
            .lock()
            .unwrap()
            .insert(surah, CacheEntry::new(Arc::clone(dataset), timestamp));

        let key = self.storage_key(surah);
        let storage = Arc::clone(&self.storage);
        let dataset = Arc::clone(dataset);
        let task_key = key.clone();
        let write = tokio::task::spawn_blocking(move || -> Result<(), MushafError> {
            let json = serde_json::to_string(&CacheEntry::new(dataset.as_ref(), timestamp))?;
            storage.set(&task_key, &json)?;
            Ok(())
        })
        .await;

        match write {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(key = %key, error = %e, "Persistent cache write failed"),
            Err(e) => warn!(key = %key, error = %e, "Persistent cache write task failed"),
        }
    }

    async fn fetch_surah(&self, surah: u32) -> Result<SurahDataset, MushafError> {
        let json = self.source.fetch_surah(surah).await?;
        Ok(SurahDataset::from_json(&json)?)
    }

    async fn fetch_from_corpus(&self, surah: u32) -> Result<SurahDataset, MushafError> {
        let cached = self.corpus.lock().unwrap().clone();
        let corpus = match cached {
            Some(corpus) => corpus,
            None => {
                let json = self.source.fetch_corpus().await?;
                let corpus = Arc::new(SurahDataset::from_json(&json)?);
                *self.corpus.lock().unwrap() = Some(Arc::clone(&corpus));
                corpus
            }
        };
        Ok(corpus.for_surah(surah))
    }
}
