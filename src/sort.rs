//! Alphabetisation key for bibliography entries.

/// Leading articles ignored when alphabetising, checked in this order.
const ARTICLES: [&str; 3] = ["the ", "a ", "an "];

/// Returns the comparison key for a reference string.
///
/// The string is lowercased, leading `*` emphasis markers are dropped, and a
/// single leading `the `, `a ` or `an ` is removed. Total over all inputs:
/// the empty string yields the empty key.
pub fn sort_key(reference: &str) -> String {
    let lowered = reference.to_lowercase();
    let trimmed = lowered.trim_start_matches('*');
    for article in ARTICLES {
        if let Some(rest) = trimmed.strip_prefix(article) {
            return rest.to_string();
        }
    }
    trimmed.to_string()
}
