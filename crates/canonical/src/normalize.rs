use crate::whitespace::collapse_whitespace;

/// Reduces free text to the matcher's normal form.
///
/// Lowercases, keeps only ASCII lowercase letters, digits and whitespace,
/// then collapses whitespace runs to single spaces and trims.
///
/// ```rust
/// use canonical::normalize;
///
/// assert_eq!(normalize("Grade 1: Welcome   Letter!"), "grade 1 welcome letter");
/// assert_eq!(normalize("   "), "");
/// ```
pub fn normalize(raw: &str) -> String {
    let filtered: String = raw
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace())
        .collect();
    collapse_whitespace(&filtered)
}

/// Returns `true` when `text` is already in normal form.
pub fn is_normalized(text: &str) -> bool {
    if text.starts_with(' ') || text.ends_with(' ') || text.contains("  ") {
        return false;
    }
    text.chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == ' ')
}
