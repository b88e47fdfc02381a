//! End-to-end tests of verse assembly over a local corpus directory and a
//! SQLite persistent tier.

use async_trait::async_trait;
use mushaf_lib::{
    CorpusSource, DirCorpusSource, LoaderOptions, ManualClock, MushafError, SqliteStore,
    SurahDataLoader, VerseTextAssembler, EXPIRY_WINDOW_MS,
};
use serde_json::json;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

// ─── Test source ────────────────────────────────────────────────────

/// Directory source that counts how often each resource is requested.
struct CountingSource {
    inner: DirCorpusSource,
    surah_calls: AtomicUsize,
    corpus_calls: AtomicUsize,
}

impl CountingSource {
    fn new(dir: &Path) -> Self {
        Self {
            inner: DirCorpusSource::new(dir, "all.json"),
            surah_calls: AtomicUsize::new(0),
            corpus_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl CorpusSource for CountingSource {
    async fn fetch_surah(&self, surah: u32) -> Result<String, MushafError> {
        self.surah_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.fetch_surah(surah).await
    }

    async fn fetch_corpus(&self) -> Result<String, MushafError> {
        self.corpus_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.fetch_corpus().await
    }
}

// ─── Fixtures ───────────────────────────────────────────────────────

fn word(key: &str, index: u32, text: &str) -> (String, serde_json::Value) {
    (key.to_string(), json!({ "word_index": index, "location": key, "text": text }))
}

fn write_json(dir: &Path, name: &str, words: Vec<(String, serde_json::Value)>) {
    let map: serde_json::Map<String, serde_json::Value> = words.into_iter().collect();
    std::fs::write(dir.join(name), serde_json::Value::Object(map).to_string()).unwrap();
}

/// Al-Fatiha verse 1 and 2 as per-surah file, Al-Ikhlas only in the full corpus.
fn corpus_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    write_json(
        dir.path(),
        "1.json",
        vec![
            word("1:1:3", 3, "الرَّحْمَٰنِ"),
            word("1:1:1", 1, "بِسْمِ"),
            word("1:1:4", 4, "الرَّحِيمِ١"),
            word("1:1:2", 2, "اللَّهِ"),
            word("1:2:1", 1, "الْحَمْدُ"),
            word("1:2:2", 2, "لِلَّهِ"),
            word("1:2:3", 3, "رَبِّ"),
            word("1:2:4", 4, "الْعَالَمِينَ"),
            word("1:2:5", 5, "٢"),
        ],
    );
    write_json(
        dir.path(),
        "all.json",
        vec![
            word("1:1:1", 1, "بِسْمِ"),
            word("112:1:1", 1, "قُلْ"),
            word("112:1:2", 2, "هُوَ"),
            word("112:1:3", 3, "اللَّهُ"),
            word("112:1:4", 4, "أَحَدٌ١"),
            word("112:2:1", 1, "اللَّهُ"),
            word("112:2:2", 2, "الصَّمَدُ٢"),
            word("113:1:1", 1, "قُلْ"),
        ],
    );
    dir
}

fn build(
    corpus: &Path,
    cache_db: &Path,
    clock: Arc<ManualClock>,
) -> (VerseTextAssembler, Arc<CountingSource>) {
    let source = Arc::new(CountingSource::new(corpus));
    let storage = Arc::new(SqliteStore::open(cache_db).unwrap());
    let loader = SurahDataLoader::with_options(
        source.clone(),
        storage,
        LoaderOptions::default(),
        clock,
    );
    (VerseTextAssembler::new(loader), source)
}

// ─── Tests ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_fatiha_assembles_clean_text() {
    let corpus = corpus_dir();
    let cache = TempDir::new().unwrap();
    let (assembler, _) = build(corpus.path(), &cache.path().join("cache.db"), Arc::new(ManualClock::new(0)));

    assert_eq!(
        assembler.get_verse_text(1, 1).await,
        "بِسْمِ اللَّهِ الرَّحْمَٰنِ الرَّحِيمِ"
    );
    // The standalone verse-number word leaves no trace
    assert_eq!(assembler.get_verse_text(1, 2).await, "الْحَمْدُ لِلَّهِ رَبِّ الْعَالَمِينَ");
}

#[tokio::test]
async fn test_second_call_is_a_pure_cache_hit() {
    let corpus = corpus_dir();
    let cache = TempDir::new().unwrap();
    let (assembler, source) = build(corpus.path(), &cache.path().join("cache.db"), Arc::new(ManualClock::new(0)));

    let first = assembler.get_verse_text(1, 1).await;
    let second = assembler.get_verse_text(1, 1).await;
    assert_eq!(first, second);
    assert_eq!(source.surah_calls.load(Ordering::SeqCst), 1);
    assert_eq!(source.corpus_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_missing_surah_file_falls_back_to_corpus() {
    let corpus = corpus_dir();
    let cache = TempDir::new().unwrap();
    let (assembler, source) = build(corpus.path(), &cache.path().join("cache.db"), Arc::new(ManualClock::new(0)));

    let dataset = assembler.loader().load_surah_data(112).await;
    let mut keys: Vec<String> = dataset.keys().cloned().collect();
    keys.sort();
    assert_eq!(keys, vec!["112:1:1", "112:1:2", "112:1:3", "112:1:4", "112:2:1", "112:2:2"]);

    assert_eq!(assembler.get_verse_text(112, 1).await, "قُلْ هُوَ اللَّهُ أَحَدٌ");
    assert_eq!(source.corpus_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_both_sources_missing_degrades_to_empty() {
    let empty = TempDir::new().unwrap();
    let cache = TempDir::new().unwrap();
    let (assembler, _) = build(empty.path(), &cache.path().join("cache.db"), Arc::new(ManualClock::new(0)));

    assert!(assembler.loader().load_surah_data(2).await.is_empty());
    assert_eq!(assembler.get_verse_text(2, 255).await, "");
    assert!(assembler.get_verse_words(2, 255).await.is_empty());
    assert!(assembler.get_word_analysis_for_verse(2, 255).await.is_empty());
    assert_eq!(assembler.get_surah_verses(2, 3, 2).await, vec![String::new(); 3]);
}

#[tokio::test]
async fn test_persistent_tier_survives_restart_until_expiry() {
    let corpus = corpus_dir();
    let cache = TempDir::new().unwrap();
    let db = cache.path().join("cache.db");
    let clock = Arc::new(ManualClock::new(5_000));

    let (first, _) = build(corpus.path(), &db, clock.clone());
    first.loader().load_surah_data(1).await;

    // New process, same cache db: no fetch needed
    let (second, source) = build(corpus.path(), &db, clock.clone());
    assert_eq!(second.get_verse_text(1, 1).await, "بِسْمِ اللَّهِ الرَّحْمَٰنِ الرَّحِيمِ");
    assert_eq!(source.surah_calls.load(Ordering::SeqCst), 0);

    // A day later the stored entry is stale
    clock.advance(EXPIRY_WINDOW_MS);
    let (third, source) = build(corpus.path(), &db, clock);
    third.loader().load_surah_data(1).await;
    assert_eq!(source.surah_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_corrupt_cache_db_row_is_ignored() {
    let corpus = corpus_dir();
    let cache = TempDir::new().unwrap();
    let db = cache.path().join("cache.db");
    {
        use mushaf_lib::KeyValueStore;
        let store = SqliteStore::open(&db).unwrap();
        store.set("surah_words_1", "{\"data\": 42}").unwrap();
    }

    let (assembler, source) = build(corpus.path(), &db, Arc::new(ManualClock::new(0)));
    assert_eq!(assembler.get_verse_words(1, 2).await.len(), 5);
    assert_eq!(source.surah_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_full_surah_and_paged_retrieval() {
    let corpus = corpus_dir();
    let cache = TempDir::new().unwrap();
    let (assembler, source) = build(corpus.path(), &cache.path().join("cache.db"), Arc::new(ManualClock::new(0)));

    let verses = assembler.get_surah_verses(112, 4, 3).await;
    assert_eq!(verses.len(), 4);
    assert_eq!(verses[1], "اللَّهُ الصَّمَدُ");
    assert_eq!(verses[2], "");
    assert_eq!(verses[3], "");

    let page = assembler.get_visible_verses(112, 1, 2, 4).await;
    assert_eq!(page, verses[..2].to_vec());
    assert_eq!(source.corpus_calls.load(Ordering::SeqCst), 1);
}
