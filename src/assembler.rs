//! Verse text and word-array assembly on top of the surah loader

use crate::cache::VerseTextCache;
use crate::loader::SurahDataLoader;
use crate::text;
use crate::words::{SurahDataset, VerseKey, WordAnalysisEntry, WordRecord};
use futures_util::future::join_all;
use std::ops::RangeInclusive;
use tracing::debug;

/// Verses derived concurrently per batch in [`VerseTextAssembler::get_surah_verses`]
pub const DEFAULT_BATCH_SIZE: usize = 10;

pub struct VerseTextAssembler {
    loader: SurahDataLoader,
    verse_cache: VerseTextCache,
}

impl VerseTextAssembler {
    pub fn new(loader: SurahDataLoader) -> Self {
        Self { loader, verse_cache: VerseTextCache::new() }
    }

    pub fn loader(&self) -> &SurahDataLoader {
        &self.loader
    }

    /// Clean display text of one verse, `""` when the verse has no words.
    ///
    /// Results are cached for the session, empty ones included.
    pub async fn get_verse_text(&self, surah: u32, verse: u32) -> String {
        let key = VerseKey::new(surah, verse);
        if let Some(text) = self.verse_cache.get(&key) {
            return text;
        }

        let dataset = self.loader.load_surah_data(surah).await;
        self.verse_text_from(&dataset, key)
    }

    /// Raw word records of one verse in `word_index` order
    pub async fn get_verse_words(&self, surah: u32, verse: u32) -> Vec<WordRecord> {
        let dataset = self.loader.load_surah_data(surah).await;
        dataset.verse_words(VerseKey::new(surah, verse))
    }

    /// Cleaned words with positions renumbered `1..=n`. Translations are left
    /// empty for the caller to fill in.
    pub async fn get_word_analysis_for_verse(&self, surah: u32, verse: u32) -> Vec<WordAnalysisEntry> {
        self.get_verse_words(surah, verse)
            .await
            .iter()
            .enumerate()
            .map(|(i, word)| WordAnalysisEntry {
                position: i as u32 + 1,
                text: text::clean_word(&word.text),
                translation: String::new(),
            })
            .collect()
    }

    /// Text of every verse in the surah; index `i` holds verse `i + 1`.
    ///
    /// The dataset is resolved once up front. Verses are then derived in
    /// batches of `batch_size`: concurrently within a batch, one batch after
    /// the other.
    pub async fn get_surah_verses(&self, surah: u32, verses_count: u32, batch_size: usize) -> Vec<String> {
        let dataset = self.loader.load_surah_data(surah).await;
        let mut verses = vec![String::new(); verses_count as usize];

        for batch in batch_ranges(verses_count, batch_size) {
            debug!(surah, from = batch.start(), to = batch.end(), "Assembling verse batch");
            let dataset = &dataset;
            let texts = join_all(batch.clone().map(|verse| async move {
                (verse, self.verse_text_from(dataset, VerseKey::new(surah, verse)))
            }))
            .await;

            for (verse, text) in texts {
                verses[(verse - 1) as usize] = text;
            }
        }

        verses
    }

    /// Text of the verses on one page (1-based), in order.
    pub async fn get_visible_verses(
        &self,
        surah: u32,
        page: u32,
        verses_per_page: u32,
        total_verses: u32,
    ) -> Vec<String> {
        let Some(window) = visible_window(page, verses_per_page, total_verses) else {
            return Vec::new();
        };

        let mut verses = Vec::with_capacity(window.clone().count());
        for verse in window {
            verses.push(self.get_verse_text(surah, verse).await);
        }
        verses
    }

    pub fn verse_cache_len(&self) -> usize {
        self.verse_cache.len()
    }

    pub fn clear_verse_cache(&self) {
        self.verse_cache.clear();
    }

    fn verse_text_from(&self, dataset: &SurahDataset, key: VerseKey) -> String {
        if let Some(text) = self.verse_cache.get(&key) {
            return text;
        }
        let words = dataset.verse_words(key);
        let text = text::assemble(words.iter().map(|w| w.text.as_str()));
        self.verse_cache.insert(key, text.clone());
        text
    }
}

/// Consecutive verse ranges of at most `batch_size` covering `1..=count`.
/// A zero batch size is treated as one; sizes beyond `u32::MAX` are clamped.
pub fn batch_ranges(count: u32, batch_size: usize) -> Vec<RangeInclusive<u32>> {
    let size = u32::try_from(batch_size).unwrap_or(u32::MAX).max(1);
    let mut ranges = Vec::new();
    let mut start = 1u32;
    while start <= count {
        let end = start.saturating_add(size - 1).min(count);
        ranges.push(start..=end);
        match end.checked_add(1) {
            Some(next) => start = next,
            None => break,
        }
    }
    ranges
}

/// Verses shown on `page`, clamped to `total_verses`; `None` for an empty page.
pub fn visible_window(page: u32, verses_per_page: u32, total_verses: u32) -> Option<RangeInclusive<u32>> {
    if page == 0 || verses_per_page == 0 {
        return None;
    }
    let start = (page - 1).checked_mul(verses_per_page)?.checked_add(1)?;
    if start > total_verses {
        return None;
    }
    let end = start.saturating_add(verses_per_page - 1).min(total_verses);
    Some(start..=end)
}
