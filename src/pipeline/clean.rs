//! Text cleaning: normalise raw page text extracted from a PDF.
//!
//! PDF text layers are noisy: page numbers and running headers arrive as
//! lines of their own, ligatures and bullets come through as stray symbols,
//! and layout whitespace is everywhere. [`clean`] removes all three with a
//! fixed sequence of passes applied to each line:
//!
//! 1. Strip characters outside word characters, whitespace and
//!    `. , ! ? ; : - ( ) [ ] " '`
//! 2. Collapse whitespace runs to one space and trim
//! 3. Drop lines of 3 characters or fewer (artifacts)
//!
//! Surviving lines are joined with single spaces. The output is a single
//! line, so cleaning it again changes nothing.

use once_cell::sync::Lazy;
use regex::Regex;

/// Lines this short (in chars, after cleaning) are treated as artifacts.
pub const ARTIFACT_LINE_MAX: usize = 3;

static RE_DISALLOWED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[^\w\s.,!?;:\-()\[\]"']+"#).unwrap());

static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Clean raw extracted text. Pure and total.
pub fn clean(raw: &str) -> String {
    raw.lines()
        .map(clean_line)
        .filter(|line| line.chars().count() > ARTIFACT_LINE_MAX)
        .collect::<Vec<_>>()
        .join(" ")
}

fn clean_line(line: &str) -> String {
    let stripped = RE_DISALLOWED.replace_all(line, "");
    RE_WHITESPACE.replace_all(&stripped, " ").trim().to_string()
}

/// Number of whitespace-separated words.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// The first `max_chars` characters of `text`, never splitting a code point.
pub fn char_prefix(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Split text into overlapping windows of `chunk_size` words.
///
/// Consecutive windows share `overlap` words. The last window may be shorter.
/// An `overlap` of `chunk_size` or more is reduced so windows always advance.
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() || chunk_size == 0 {
        return Vec::new();
    }

    let step = chunk_size.saturating_sub(overlap).max(1);
    let mut chunks = Vec::new();
    let mut start = 0;

    loop {
        let end = (start + chunk_size).min(words.len());
        chunks.push(words[start..end].join(" "));
        if end == words.len() {
            break;
        }
        start += step;
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_whitespace_within_lines() {
        assert_eq!(clean("hello   \t world  again"), "hello world again");
    }

    #[test]
    fn joins_lines_with_single_spaces() {
        assert_eq!(clean("first line\nsecond line\n"), "first line second line");
    }

    #[test]
    fn drops_short_artifact_lines() {
        let raw = "Introduction to physics\n12\n  iv  \nNewton wrote laws\n---";
        assert_eq!(clean(raw), "Introduction to physics Newton wrote laws");
    }

    #[test]
    fn strips_disallowed_symbols_keeps_punctuation() {
        let raw = "Cost: €20 (approx.) — see [ref] \"quoted\" it's ok!";
        assert_eq!(clean(raw), "Cost: 20 (approx.) see [ref] \"quoted\" it's ok!");
    }

    #[test]
    fn keeps_unicode_word_characters() {
        assert_eq!(clean("Schrödinger équation"), "Schrödinger équation");
    }

    #[test]
    fn line_shortened_by_stripping_is_dropped() {
        // Four chars before cleaning, two after.
        assert_eq!(clean("ab©©\nlong enough line"), "long enough line");
    }

    #[test]
    fn handles_crlf_line_endings() {
        assert_eq!(clean("alpha beta\r\ngamma delta\r\n"), "alpha beta gamma delta");
    }

    #[test]
    fn empty_and_blank_inputs() {
        assert_eq!(clean(""), "");
        assert_eq!(clean("\n\n   \n"), "");
    }

    #[test]
    fn idempotent_on_varied_inputs() {
        let samples = [
            "",
            "abc",
            "abcd",
            "a © b © c © d",
            "Title\n\n1\nBody text • with bullets\n\n\u{000C}Next page  here",
            "  leading and trailing   \n  x \n y  z  w ",
            "Ünïcödé — dashes – and “smart quotes”\nfine",
        ];
        for s in samples {
            let once = clean(s);
            assert_eq!(clean(&once), once, "not idempotent for {s:?}");
        }
    }

    #[test]
    fn word_count_counts_whitespace_separated() {
        assert_eq!(word_count("one two  three\nfour"), 4);
        assert_eq!(word_count(""), 0);
    }

    #[test]
    fn char_prefix_respects_code_points() {
        assert_eq!(char_prefix("héllo", 2), "hé");
        assert_eq!(char_prefix("short", 100), "short");
        assert_eq!(char_prefix("", 3), "");
    }

    #[test]
    fn chunk_text_overlaps() {
        let text = (1..=10).map(|i| i.to_string()).collect::<Vec<_>>().join(" ");
        let chunks = chunk_text(&text, 4, 1);
        assert_eq!(chunks, vec!["1 2 3 4", "4 5 6 7", "7 8 9 10"]);
    }

    #[test]
    fn chunk_text_single_window_and_empty() {
        assert_eq!(chunk_text("a b c", 2000, 200), vec!["a b c"]);
        assert!(chunk_text("", 10, 2).is_empty());
    }

    #[test]
    fn chunk_text_overlap_larger_than_chunk_still_advances() {
        let chunks = chunk_text("a b c", 2, 5);
        assert_eq!(chunks, vec!["a b", "b c"]);
    }
}
