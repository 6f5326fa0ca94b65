//! Pluggable tokenization.
//!
//! A tokenizer is a pure function from file text to a map of tokens
//! and their byte-range occurrences. The pipeline accepts any
//! implementation of [`Tokenizer`]; [`WhitespaceTokenizer`] is the
//! default.

use std::collections::HashMap;
use std::ops::Range;

/// Tokenizer output: token string to ordered byte ranges within the
/// input text. Ranges are half-open `[start, end)`, never overlap for
/// a single token, and always lie within the input.
pub type TokenMap = HashMap<String, Vec<Range<usize>>>;

/// A pure tokenization function over UTF-8 text.
pub trait Tokenizer: Send + Sync {
    /// Split `text` into tokens with their occurrence ranges, in
    /// textual order per token.
    fn tokenize(&self, text: &str) -> TokenMap;
}

/// Default tokenizer: maximal runs of non-whitespace characters.
///
/// All Unicode whitespace separates tokens; no case folding or
/// normalization is applied.
#[derive(Debug, Default, Clone, Copy)]
pub struct WhitespaceTokenizer;

impl Tokenizer for WhitespaceTokenizer {
    fn tokenize(&self, text: &str) -> TokenMap {
        let mut tokens: TokenMap = HashMap::new();
        let mut start: Option<usize> = None;

        for (idx, ch) in text.char_indices() {
            if ch.is_whitespace() {
                if let Some(s) = start.take() {
                    tokens
                        .entry(text[s..idx].to_string())
                        .or_default()
                        .push(s..idx);
                }
            } else if start.is_none() {
                start = Some(idx);
            }
        }

        if let Some(s) = start {
            tokens
                .entry(text[s..].to_string())
                .or_default()
                .push(s..text.len());
        }

        tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenize(text: &str) -> TokenMap {
        WhitespaceTokenizer.tokenize(text)
    }

    #[test]
    fn test_simple_split() {
        let map = tokenize("hello world");
        assert_eq!(map.len(), 2);
        assert_eq!(map["hello"], vec![0..5]);
        assert_eq!(map["world"], vec![6..11]);
    }

    #[test]
    fn test_repeated_token_ordered() {
        let map = tokenize("a b a");
        assert_eq!(map["a"], vec![0..1, 4..5]);
        assert_eq!(map["b"], vec![2..3]);
    }

    #[test]
    fn test_empty_text() {
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn test_whitespace_only() {
        assert!(tokenize(" \t\n  ").is_empty());
    }

    #[test]
    fn test_leading_and_trailing_whitespace() {
        let map = tokenize("  word  ");
        assert_eq!(map["word"], vec![2..6]);
    }

    #[test]
    fn test_unicode_whitespace_separates() {
        // U+00A0 no-break space is Unicode whitespace.
        let map = tokenize("foo\u{00A0}bar");
        assert_eq!(map.len(), 2);
        assert!(map.contains_key("foo"));
        assert!(map.contains_key("bar"));
    }

    #[test]
    fn test_no_case_folding() {
        let map = tokenize("Word word");
        assert_eq!(map.len(), 2);
        assert_eq!(map["Word"], vec![0..4]);
        assert_eq!(map["word"], vec![5..9]);
    }

    #[test]
    fn test_multibyte_ranges_are_byte_offsets() {
        let text = "héllo wörld";
        let map = tokenize(text);
        let r = map["héllo"][0].clone();
        assert_eq!(&text[r], "héllo");
        let r = map["wörld"][0].clone();
        assert_eq!(&text[r], "wörld");
    }

    #[test]
    fn test_token_at_end_of_text() {
        let map = tokenize("last");
        assert_eq!(map["last"], vec![0..4]);
    }

    #[test]
    fn test_ranges_within_bounds_and_disjoint() {
        let text = "x xx x  xx";
        let map = tokenize(text);
        for ranges in map.values() {
            let mut prev_end = 0;
            for r in ranges {
                assert!(r.start >= prev_end);
                assert!(r.end <= text.len());
                assert!(r.start < r.end);
                prev_end = r.end;
            }
        }
    }
}
