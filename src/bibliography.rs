//! The accumulated reference list for a session.

use std::collections::HashSet;

use serde::Serialize;

use crate::models::FormattedReference;

/// Ordered list of formatted references.
///
/// Order is insertion order until [`Bibliography::sort`] is called; sorting
/// is recomputed from the entries on every call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Bibliography {
    entries: Vec<FormattedReference>,
}

impl Bibliography {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<FormattedReference>) -> Self {
        Self { entries }
    }

    /// Reads one markup entry per line, skipping blank lines.
    pub fn from_markup_lines(text: &str) -> Self {
        let entries = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(FormattedReference::from_markup)
            .collect();
        Self { entries }
    }

    /// Renders one markup entry per line.
    pub fn to_markup_lines(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            out.push_str(&entry.markup());
            out.push('\n');
        }
        out
    }

    pub fn push(&mut self, reference: FormattedReference) {
        self.entries.push(reference);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Stable sort by [`FormattedReference::sort_key`].
    pub fn sort(&mut self) {
        self.entries.sort_by_cached_key(|r| r.sort_key());
    }

    /// Drops repeated entries, keeping the first occurrence of each.
    pub fn dedup(&mut self) {
        let mut seen = HashSet::new();
        self.entries.retain(|r| seen.insert(r.clone()));
    }

    pub fn entries(&self) -> &[FormattedReference] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<FormattedReference> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FormattedReference> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a Bibliography {
    type Item = &'a FormattedReference;
    type IntoIter = std::slice::Iter<'a, FormattedReference>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bib(lines: &[&str]) -> Bibliography {
        Bibliography::from_entries(lines.iter().map(|l| FormattedReference::from_markup(l)).collect())
    }

    #[test]
    fn sort_ignores_articles_and_leading_emphasis() {
        let mut b = bib(&[
            "Smith, J. (2020) *Care*. London: Sage.",
            "*The Lancet* (2019) Editorial.",
            "Brown, A. (2021) *Ethics*. Leeds: Pearson.",
            "A Guide to Practice (2018).",
        ]);
        b.sort();
        let plain: Vec<String> = b.iter().map(|r| r.plain()).collect();
        assert_eq!(
            plain,
            vec![
                "Brown, A. (2021) Ethics. Leeds: Pearson.",
                "A Guide to Practice (2018).",
                "The Lancet (2019) Editorial.",
                "Smith, J. (2020) Care. London: Sage.",
            ]
        );
    }

    #[test]
    fn dedup_keeps_first_occurrence() {
        let mut b = bib(&["B (2020) x.", "A (2020) y.", "B (2020) x."]);
        b.dedup();
        assert_eq!(b.len(), 2);
        assert_eq!(b.entries()[0].plain(), "B (2020) x.");
    }

    #[test]
    fn markup_lines_round_trip_skips_blanks() {
        let text = "Smith, J. (2024) *Title*. London: Pearson.\n\n  \nDoe, R. (2020) Art. *J*. **1**(2), pp.3.\n";
        let b = Bibliography::from_markup_lines(text);
        assert_eq!(b.len(), 2);
        assert_eq!(
            b.to_markup_lines(),
            "Smith, J. (2024) *Title*. London: Pearson.\nDoe, R. (2020) Art. *J*. **1**(2), pp.3.\n"
        );
    }

    #[test]
    fn clear_empties() {
        let mut b = bib(&["X (2000) y."]);
        b.clear();
        assert!(b.is_empty());
    }
}
