//! One-click correction against a table of gold-standard references.
//!
//! Any bibliography entry whose cleaned text contains a known keyword is
//! replaced wholesale by the canonical reference for that keyword. Keywords
//! are tried in table order and the first hit wins: entries from the
//! configuration come first, then the built-in table below. The corrected
//! list is deduplicated, keeping the first occurrence.

use crate::bibliography::Bibliography;
use crate::config::CorrectionEntry;
use crate::models::FormattedReference;
use crate::text::{clean_text, contains_phrase};

/// Built-in gold-standard references for frequently cited UK care sector
/// bodies and legislation.
const BUILTIN: &[(&str, &str)] = &[
    (
        "SSSC",
        "Scottish Social Services Council (2024) *Codes of Practice for Social Service Workers and Employers*. Dundee: SSSC.",
    ),
    (
        "Scottish Social Services Council",
        "Scottish Social Services Council (2024) *Codes of Practice for Social Service Workers and Employers*. Dundee: SSSC.",
    ),
    (
        "NMC",
        "Nursing and Midwifery Council (2018) *The Code: Professional Standards of Practice and Behaviour for Nurses, Midwives and Nursing Associates*. London: NMC.",
    ),
    (
        "Nursing and Midwifery Council",
        "Nursing and Midwifery Council (2018) *The Code: Professional Standards of Practice and Behaviour for Nurses, Midwives and Nursing Associates*. London: NMC.",
    ),
    (
        "Care Act",
        "Great Britain (2014) *Care Act 2014*. London: The Stationery Office.",
    ),
    (
        "Equality Act",
        "Great Britain (2010) *Equality Act 2010*. London: The Stationery Office.",
    ),
    (
        "Mental Capacity Act",
        "Great Britain (2005) *Mental Capacity Act 2005*. London: The Stationery Office.",
    ),
    (
        "Data Protection Act",
        "Great Britain (2018) *Data Protection Act 2018*. London: The Stationery Office.",
    ),
    (
        "Health and Safety at Work",
        "Great Britain (1974) *Health and Safety at Work etc. Act 1974*. London: HMSO.",
    ),
    (
        "Adults with Incapacity",
        "Scotland (2000) *Adults with Incapacity (Scotland) Act 2000*. Edinburgh: The Stationery Office.",
    ),
    (
        "World Health Organization",
        "World Health Organization (2022) *World Mental Health Report: Transforming Mental Health for All*. Geneva: WHO.",
    ),
];

/// Ordered keyword table. Keywords are stored cleaned.
#[derive(Debug, Clone)]
pub struct CorrectionTable {
    entries: Vec<(String, FormattedReference)>,
}

impl Default for CorrectionTable {
    fn default() -> Self {
        Self::with_extra(&[])
    }
}

impl CorrectionTable {
    /// Builds a table with `extra` entries ahead of the built-ins.
    pub fn with_extra(extra: &[CorrectionEntry]) -> Self {
        let entries = extra
            .iter()
            .map(|e| table_entry(&e.keyword, &e.citation))
            .chain(BUILTIN.iter().map(|(k, c)| table_entry(k, c)))
            .filter(|(keyword, _)| !keyword.is_empty())
            .collect();
        Self { entries }
    }

    /// The canonical reference for the first keyword found in `reference`.
    pub fn lookup(&self, reference: &FormattedReference) -> Option<&FormattedReference> {
        let cleaned = clean_text(&reference.plain());
        self.entries
            .iter()
            .find(|(keyword, _)| contains_phrase(&cleaned, keyword))
            .map(|(_, canonical)| canonical)
    }

    /// Replaces matching entries and drops duplicates from the result.
    pub fn apply(&self, bibliography: &Bibliography) -> Bibliography {
        let mut replaced = 0usize;
        let corrected = bibliography
            .iter()
            .map(|entry| match self.lookup(entry) {
                Some(canonical) => {
                    replaced += 1;
                    canonical.clone()
                }
                None => entry.clone(),
            })
            .collect();
        let mut out = Bibliography::from_entries(corrected);
        out.dedup();
        tracing::info!(
            replaced,
            before = bibliography.len(),
            after = out.len(),
            "applied gold-standard corrections"
        );
        out
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn table_entry(keyword: &str, citation: &str) -> (String, FormattedReference) {
    (clean_text(keyword), FormattedReference::from_markup(citation))
}
