//! Word records, location keys and per-surah datasets

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordRecord {
    #[serde(default)]
    pub word_index: u32,
    #[serde(default)]
    pub location: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub text: String,
}

/// Anything that is not a string reads as empty text.
fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        _ => String::new(),
    })
}

/// Parsed `"surah:verse:word"` key
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct LocationKey {
    pub surah: u32,
    pub verse: u32,
    pub word: u32,
}

impl LocationKey {
    pub fn new(surah: u32, verse: u32, word: u32) -> Self {
        Self { surah, verse, word }
    }

    pub fn parse(key: &str) -> Option<Self> {
        let mut parts = key.split(':');
        let surah = parts.next()?.trim().parse().ok()?;
        let verse = parts.next()?.trim().parse().ok()?;
        let word = parts.next()?.trim().parse().ok()?;
        if parts.next().is_some() {
            return None;
        }
        Some(Self { surah, verse, word })
    }

    pub fn verse_key(&self) -> VerseKey {
        VerseKey::new(self.surah, self.verse)
    }
}

impl fmt::Display for LocationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.surah, self.verse, self.word)
    }
}

/// `"surah:verse"`, the key of the assembled verse-text cache
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct VerseKey {
    pub surah: u32,
    pub verse: u32,
}

impl VerseKey {
    pub fn new(surah: u32, verse: u32) -> Self {
        Self { surah, verse }
    }

    /// Prefix shared by every word key of this verse
    pub fn word_prefix(&self) -> String {
        format!("{}:{}:", self.surah, self.verse)
    }
}

impl fmt::Display for VerseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.surah, self.verse)
    }
}

/// Every word of one surah, keyed by location.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SurahDataset {
    words: HashMap<String, WordRecord>,
}

impl SurahDataset {
    pub fn new(words: HashMap<String, WordRecord>) -> Self {
        Self { words }
    }

    /// Parse a corpus payload, skipping records that don't deserialize.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let raw: HashMap<String, serde_json::Value> = serde_json::from_str(json)?;
        let mut words = HashMap::with_capacity(raw.len());
        for (key, value) in raw {
            match serde_json::from_value::<WordRecord>(value) {
                Ok(record) => {
                    words.insert(key, record);
                }
                Err(e) => warn!(key = %key, error = %e, "Skipping malformed word record"),
            }
        }
        Ok(Self { words })
    }

    /// Keep only the words whose key belongs to `surah`.
    pub fn for_surah(&self, surah: u32) -> Self {
        let prefix = format!("{}:", surah);
        let words = self
            .words
            .iter()
            .filter(|(key, _)| key.starts_with(&prefix))
            .map(|(key, record)| (key.clone(), record.clone()))
            .collect();
        Self { words }
    }

    /// Words of one verse, ordered by `word_index`.
    ///
    /// Key order is not trusted: `"1:1:10"` sorts before `"1:1:2"` as a string.
    pub fn verse_words(&self, verse: VerseKey) -> Vec<WordRecord> {
        let prefix = verse.word_prefix();
        let mut selected: Vec<(&String, &WordRecord)> = self
            .words
            .iter()
            .filter(|(key, _)| key.starts_with(&prefix))
            .collect();
        selected.sort_by(|(ka, a), (kb, b)| a.word_index.cmp(&b.word_index).then_with(|| ka.cmp(kb)));
        selected.into_iter().map(|(_, record)| record.clone()).collect()
    }

    pub fn get(&self, key: &str) -> Option<&WordRecord> {
        self.words.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.words.keys()
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// One word of a verse as the display layer sees it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordAnalysisEntry {
    /// 1-based and contiguous, independent of source `word_index` gaps
    pub position: u32,
    pub text: String,
    pub translation: String,
}
