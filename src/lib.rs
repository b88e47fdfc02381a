//! Mushaf - word-indexed Quran text assembly
//!
//! Loads per-surah word datasets through a memory and a persistent cache tier
//! and turns them into clean verse strings and word arrays.

// Word types must be defined first as everything else builds on them
pub mod words;
pub mod surahs;
pub mod text;
pub mod cache;
pub mod error;
pub mod storage;
pub mod source;
pub mod loader;
pub mod assembler;
pub mod highlight;
pub mod config;
pub mod state;

pub use error::{MushafError, StorageError};
pub use state::AppState;
pub use assembler::{VerseTextAssembler, DEFAULT_BATCH_SIZE};
pub use loader::{LoaderOptions, LoaderStats, SurahDataLoader};
pub use cache::{CacheEntry, Clock, ManualClock, SystemClock, EXPIRY_WINDOW_MS};
pub use words::{LocationKey, SurahDataset, VerseKey, WordAnalysisEntry, WordRecord};
pub use source::{CorpusSource, DirCorpusSource, HttpCorpusSource};
pub use storage::{KeyValueStore, MemoryStore, NullStore, SqliteStore};
pub use highlight::{ActiveWordStore, Subscription};
pub use config::{get_data_dir, ReaderConfig};
