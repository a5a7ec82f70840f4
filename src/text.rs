//! Text normalisation shared by the audit matcher and the correction table.

/// Strips punctuation, lowercases, and collapses runs of whitespace.
///
/// Letters, digits and whitespace survive; everything else is removed, so
/// `"O'Neil, P."` becomes `"oneil p"`.
pub fn clean_text(text: &str) -> String {
    let stripped: String = text
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// True if `phrase` occurs in `haystack` on word boundaries. Both arguments
/// must already be cleaned.
pub fn contains_phrase(haystack: &str, phrase: &str) -> bool {
    if phrase.is_empty() {
        return false;
    }
    let padded_hay = format!(" {} ", haystack);
    let padded_phrase = format!(" {} ", phrase);
    padded_hay.contains(&padded_phrase)
}
