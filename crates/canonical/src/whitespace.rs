//! Whitespace normalization.
//!
//! Whitespace here means Unicode whitespace (`char::is_whitespace`), so tabs,
//! newlines, carriage returns and non-breaking spaces are all separators.

/// Collapses repeated whitespace into single ASCII spaces and trims edges.
///
/// Returns an empty string for empty or whitespace-only input.
///
/// ```rust
/// use canonical::collapse_whitespace;
///
/// assert_eq!(collapse_whitespace("  unit   1\r\nflip book  "), "unit 1 flip book");
/// assert_eq!(collapse_whitespace("hello\u{00A0}world"), "hello world");
/// assert_eq!(collapse_whitespace("   \n\t   "), "");
/// ```
pub fn collapse_whitespace(text: &str) -> String {
    let mut collapsed = String::with_capacity(text.len());
    for segment in text.split_whitespace() {
        if !collapsed.is_empty() {
            collapsed.push(' ');
        }
        collapsed.push_str(segment);
    }
    collapsed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_word_untouched() {
        assert_eq!(collapse_whitespace("letter"), "letter");
    }

    #[test]
    fn windows_line_endings() {
        assert_eq!(collapse_whitespace("grade 1\r\nletter"), "grade 1 letter");
    }
}
