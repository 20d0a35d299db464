//! Title → slug text pipeline.
//!
//! ```text
//! percent-decode → entity-decode → tokenize → drop stopwords
//!     → ASCII or Unicode folding → truncate at hyphens → strip "-{id}"
//! ```

use std::collections::HashSet;

use percent_encoding::percent_decode_str;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::slug::{SlugMode, DEFAULT_MAX_LENGTH};

/// Quote-like characters removed when they sit inside a word.
const QUOTES: &[char] = &[
    '\'', '"', '`', '\u{2018}', '\u{2019}', '\u{201A}', '\u{201B}', '\u{201C}', '\u{201D}',
    '\u{02BC}', '\u{00B4}',
];

/// Knobs for [`clean_title`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlugOptions {
    pub mode: SlugMode,
    pub max_length: usize,
    /// Tokens shorter than this (in codepoints) are dropped.
    pub min_word_length: usize,
    /// Lowercased stopwords.
    pub stopwords: HashSet<String>,
}

impl Default for SlugOptions {
    fn default() -> Self {
        Self {
            mode: SlugMode::Ascii,
            max_length: DEFAULT_MAX_LENGTH,
            min_word_length: 2,
            stopwords: HashSet::new(),
        }
    }
}

impl SlugOptions {
    pub fn with_stopwords<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.stopwords = words.into_iter().map(|w| w.as_ref().to_lowercase()).collect();
        self
    }
}

/// Derives a slug from `source`. Deterministic for identical inputs.
pub fn clean_title(source: &str, id: u64, options: &SlugOptions) -> String {
    if source.trim().is_empty() {
        return String::new();
    }

    let decoded = percent_decode_str(source).decode_utf8_lossy();
    let decoded = html_escape::decode_html_entities(&decoded);

    let words: Vec<&str> = tokenize(&decoded, options.min_word_length)
        .into_iter()
        .filter(|w| !options.stopwords.contains(&w.to_lowercase()))
        .collect();
    let text = words.join(" ");

    let folded = match options.mode {
        SlugMode::Ascii => fold_ascii(&text),
        SlugMode::Unicode => fold_unicode(&text),
    };

    strip_id_suffix(truncate(folded, options.max_length), id)
}

/// Splits on anything that is not a letter, number, combining mark or
/// quote, trims quotes off word edges and drops short tokens.
fn tokenize(text: &str, min_len: usize) -> Vec<&str> {
    text.split(|c: char| !(c.is_alphanumeric() || is_combining_mark(c) || QUOTES.contains(&c)))
        .map(|w| w.trim_matches(QUOTES))
        .filter(|w| !w.is_empty() && w.chars().count() >= min_len)
        .collect()
}

fn fold_ascii(text: &str) -> String {
    let ascii = deunicode::deunicode(text).to_lowercase();
    let unquoted = strip_interior_quotes(&ascii, |c| c.is_ascii_alphanumeric());
    collapse(&unquoted, |c| c.is_ascii_alphanumeric())
}

fn fold_unicode(text: &str) -> String {
    let decomposed: String = text.to_lowercase().nfd().collect();
    let unquoted = strip_interior_quotes(&decomposed, |c| c.is_alphanumeric() || is_combining_mark(c));
    let unmarked: String = unquoted.chars().filter(|c| !is_combining_mark(*c)).collect();
    collapse(&unmarked, char::is_alphanumeric).nfc().collect()
}

/// Removes quote characters whose neighbours are both word characters.
fn strip_interior_quotes(text: &str, is_word: impl Fn(char) -> bool) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    for (i, &c) in chars.iter().enumerate() {
        if QUOTES.contains(&c) {
            let before = i.checked_sub(1).and_then(|j| chars.get(j)).copied();
            let after = chars.get(i + 1).copied();
            if before.is_some_and(&is_word) && after.is_some_and(&is_word) {
                continue;
            }
        }
        out.push(c);
    }
    out
}

/// Replaces each run of non-word characters with one hyphen and trims
/// hyphens from both ends.
fn collapse(text: &str, is_word: impl Fn(char) -> bool) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending = false;
    for c in text.chars() {
        if is_word(c) {
            if pending && !out.is_empty() {
                out.push('-');
            }
            out.push(c);
            pending = false;
        } else {
            pending = true;
        }
    }
    out
}

/// Cuts at the last hyphen until short enough; hard-cuts a single long word.
fn truncate(mut slug: String, max_length: usize) -> String {
    while slug.chars().count() > max_length {
        match slug.rfind('-') {
            Some(pos) => slug.truncate(pos),
            None => slug = slug.chars().take(max_length).collect(),
        }
    }
    slug
}

/// Removes a trailing `-{id}` so board 5 titled "Board 5" is not `board-5-5`.
fn strip_id_suffix(mut slug: String, id: u64) -> String {
    let suffix = format!("-{id}");
    while slug.ends_with(&suffix) {
        slug.truncate(slug.len() - suffix.len());
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ascii() -> SlugOptions {
        SlugOptions::default()
    }

    fn unicode() -> SlugOptions {
        SlugOptions {
            mode: SlugMode::Unicode,
            ..SlugOptions::default()
        }
    }

    #[test]
    fn test_basic_ascii() {
        assert_eq!(clean_title("My Great Topic!", 1, &ascii()), "my-great-topic");
        assert_eq!(clean_title("Don't panic", 1, &ascii()), "dont-panic");
        assert_eq!(clean_title("Café crème", 1, &ascii()), "cafe-creme");
    }

    #[test]
    fn test_decoding() {
        assert_eq!(clean_title("Fish%20%26%20Chips", 1, &ascii()), "fish-chips");
        assert_eq!(clean_title("Tom &amp; Jerry&#39;s", 1, &ascii()), "tom-jerrys");
    }

    #[test]
    fn test_short_words_and_stopwords() {
        let options = ascii().with_stopwords(["the", "of"]);
        assert_eq!(clean_title("The Lord of the Rings", 1, &options), "lord-rings");
        assert_eq!(clean_title("A b c", 1, &options), "");
    }

    #[test]
    fn test_empty_source() {
        assert_eq!(clean_title("", 3, &ascii()), "");
        assert_eq!(clean_title("   ", 3, &ascii()), "");
    }

    #[test]
    fn test_truncates_at_hyphens() {
        let slug = clean_title("alpha beta gamma delta epsilon zeta eta", 1, &ascii());
        assert_eq!(slug, "alpha-beta-gamma-delta-epsilon");

        let options = SlugOptions { max_length: 5, ..ascii() };
        assert_eq!(clean_title("Supercalifragilistic", 1, &options), "super");
    }

    #[test]
    fn test_strips_id_suffix() {
        assert_eq!(clean_title("Board 55", 55, &ascii()), "board");
        assert_eq!(clean_title("Board 55", 5, &ascii()), "board-55");
    }

    #[test]
    fn test_unicode_mode() {
        assert_eq!(clean_title("Über Straße", 1, &unicode()), "uber-straße");
        assert_eq!(clean_title("日本語 テスト", 1, &unicode()), "日本語-テスト");
        assert_eq!(clean_title("l'été", 1, &unicode()), "lete");
    }

    proptest! {
        #[test]
        fn prop_slug_bounds(source in "\\PC{0,80}", id in 1u64..10_000, max in 1usize..40) {
            for mode in [SlugMode::Ascii, SlugMode::Unicode] {
                let options = SlugOptions { mode, max_length: max, ..SlugOptions::default() };
                let slug = clean_title(&source, id, &options);
                prop_assert!(slug.chars().count() <= max);
                prop_assert!(!slug.starts_with('-'));
                prop_assert!(!slug.ends_with('-'));
                prop_assert!(!slug.contains("--"));
                let suffix = format!("-{}", id);
                prop_assert!(!slug.ends_with(&suffix));
                prop_assert_eq!(slug.clone(), clean_title(&source, id, &options));
            }
        }
    }
}
