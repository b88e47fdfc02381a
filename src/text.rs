//! Text cleaning for display: numeral stripping and whitespace normalization

use regex_lite::Regex;
use std::sync::OnceLock;

/// Trailing run of verse-number glyphs, possibly separated by whitespace
fn trailing_numerals() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"[\x{0660}-\x{0669}\x{06F0}-\x{06F9}\x{06DD}\s]+$")
            .expect("trailing numeral pattern is valid")
    })
}

/// Digit glyphs used in the source script to number verse endings.
#[inline]
pub fn is_numeral_glyph(c: char) -> bool {
    matches!(c,
        '\u{0660}'..='\u{0669}'   // Arabic-Indic digits
        | '\u{06F0}'..='\u{06F9}' // Extended Arabic-Indic digits
        | '\u{06DD}'              // End of ayah
    )
}

/// Clean a single word: drop numeral glyphs and all whitespace.
///
/// Whitespace inside a word is never meaningful in the corpus, so runs are
/// removed rather than collapsed. Leading/trailing whitespace goes with them.
pub fn clean_word(raw: &str) -> String {
    raw.chars()
        .filter(|c| !is_numeral_glyph(*c) && !c.is_whitespace())
        .collect()
}

/// Remove a trailing run of numeral glyphs from an assembled verse.
pub fn strip_trailing_numerals(text: &str) -> String {
    trailing_numerals().replace(text, "").trim().to_string()
}

/// Clean each word and join them with single spaces, in the given order.
///
/// Words that clean down to nothing (a standalone verse number, say) are
/// dropped so the result never contains doubled separators.
pub fn assemble<'a, I>(words: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let joined = words
        .into_iter()
        .map(clean_word)
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    strip_trailing_numerals(&joined)
}
