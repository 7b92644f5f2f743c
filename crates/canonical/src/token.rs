use std::collections::HashSet;

use serde::Serialize;

/// A whitespace-delimited token with its byte offsets in the source text.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct Token<'a> {
    pub text: &'a str,
    /// Byte offset (inclusive).
    pub start: usize,
    /// Byte offset (exclusive).
    pub end: usize,
}

impl AsRef<str> for Token<'_> {
    fn as_ref(&self) -> &str {
        self.text
    }
}

/// Splits normalized text into tokens, keeping byte offsets.
///
/// Duplicates are preserved in order; the scorer counts repeated query
/// tokens individually.
pub fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut offset = 0;
    for piece in text.split(char::is_whitespace) {
        if !piece.is_empty() {
            tokens.push(Token {
                text: piece,
                start: offset,
                end: offset + piece.len(),
            });
        }
        // Every separator matched by `split` is a single char; measure it.
        let sep_len = text[offset + piece.len()..]
            .chars()
            .next()
            .map(char::len_utf8)
            .unwrap_or(0);
        offset += piece.len() + sep_len;
    }
    tokens
}

/// Distinct tokens of `text`, borrowed from it.
pub fn token_set(text: &str) -> HashSet<&str> {
    text.split_whitespace().collect()
}
