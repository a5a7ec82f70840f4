//! Leeds Harvard reference formatting.
//!
//! Pure functions from [`CitationFields`] to a [`FormattedReference`]. The
//! formatter performs no validation: empty fields produce empty segments.
//! Callers reject incomplete input with [`CitationFields::validate`] first.
//!
//! | Kind | Template |
//! |------|----------|
//! | book | `A (Y) *Title*.[ 2nd edn.] Place: Publisher.` |
//! | journal | `A (Y) Article. *Journal*. **Vol**(Issue), pp.Pages.` |
//! | website | `A (Y) *Title*. [Online]. [Accessed Date]. Available from: URL` |
//! | chapter | `A (Y) Chapter. In: Editors ed. *Book*. Place: Publisher, pp.Pages.` |
//! | report | `Organisation (Y) *Title*. Place: Publisher.` |
//! | thesis | `A (Y) *Title*. Degree. University.` |

use crate::models::{CitationFields, FormattedReference, SourceKind, Span};

/// Placeholder used when no author is supplied.
pub const UNKNOWN_AUTHOR: &str = "Unknown Author";

/// Formats an author list: one author as is, two joined with `and`, three
/// or more as the first author followed by `et al.`
///
/// Entries that are blank after trimming are ignored.
pub fn format_authors(authors: &[String]) -> String {
    let names: Vec<&str> = authors
        .iter()
        .map(|a| a.trim())
        .filter(|a| !a.is_empty())
        .collect();
    match names.as_slice() {
        [] => UNKNOWN_AUTHOR.to_string(),
        [one] => one.to_string(),
        [first, second] => format!("{} and {}", first, second),
        [first, ..] => format!("{} et al.", first),
    }
}

/// Normalises an edition statement to the `edn.` abbreviation.
///
/// Returns `None` for an empty edition so the clause is omitted entirely.
/// `"2nd edition"`, `"2nd ed."` and `"2nd"` all become `"2nd edn."`.
/// Trailing `,`, `;` and `:` on each word are dropped.
pub fn normalize_edition(edition: &str) -> Option<String> {
    let lowered = edition.trim().to_lowercase();
    let mut tokens: Vec<String> = lowered
        .split_whitespace()
        .map(|token| token.trim_end_matches([',', ';', ':']))
        .filter(|token| !token.is_empty())
        .map(|token| match token {
            "ed" | "ed." | "edn" | "edn." => "edn.".to_string(),
            other => other.replace("edition", "edn."),
        })
        .collect();
    if tokens.is_empty() {
        return None;
    }
    if !tokens.iter().any(|t| t.contains("edn.")) {
        tokens.push("edn.".to_string());
    }
    Some(tokens.join(" "))
}

/// Today's date in the `20 September 2025` form used for access dates.
pub fn today() -> String {
    chrono::Local::now().format("%-d %B %Y").to_string()
}

/// Fills a missing website access date with `date`. Other kinds are left
/// untouched.
pub fn stamp_access_date(fields: &mut CitationFields, date: &str) {
    if fields.kind == SourceKind::Website && fields.access_date.trim().is_empty() {
        fields.access_date = date.to_string();
    }
}

/// Formats any kind of reference.
pub fn format_reference(fields: &CitationFields) -> FormattedReference {
    match fields.kind {
        SourceKind::Book => format_book(fields),
        SourceKind::Journal => format_journal(fields),
        SourceKind::Website => format_website(fields),
        SourceKind::Chapter => format_chapter(fields),
        SourceKind::Report => format_report(fields),
        SourceKind::Thesis => format_thesis(fields),
    }
}

pub fn format_book(f: &CitationFields) -> FormattedReference {
    let edition = normalize_edition(&f.edition)
        .map(|e| format!(" {}", e))
        .unwrap_or_default();
    FormattedReference::new(vec![
        Span::plain(format!("{} ({}) ", format_authors(&f.authors), f.year.trim())),
        Span::italic(f.title.trim()),
        Span::plain(format!(
            ".{} {}: {}.",
            edition,
            f.place.trim(),
            f.publisher.trim()
        )),
    ])
}

pub fn format_journal(f: &CitationFields) -> FormattedReference {
    FormattedReference::new(vec![
        Span::plain(format!(
            "{} ({}) {}. ",
            format_authors(&f.authors),
            f.year.trim(),
            f.title.trim()
        )),
        Span::italic(f.journal.trim()),
        Span::plain(". "),
        Span::bold(f.volume.trim()),
        Span::plain(format!("({}), pp.{}.", f.issue.trim(), f.pages.trim())),
    ])
}

pub fn format_website(f: &CitationFields) -> FormattedReference {
    FormattedReference::new(vec![
        Span::plain(format!("{} ({}) ", format_authors(&f.authors), f.year.trim())),
        Span::italic(f.title.trim()),
        Span::plain(format!(
            ". [Online]. [Accessed {}]. Available from: ",
            f.access_date.trim()
        )),
        Span::link(f.url.trim()),
    ])
}

pub fn format_chapter(f: &CitationFields) -> FormattedReference {
    let editor_count = f.editors.iter().filter(|e| !e.trim().is_empty()).count();
    let editors = match editor_count {
        0 => String::new(),
        1 => format!("{} ed. ", format_authors(&f.editors)),
        _ => format!("{} eds. ", format_authors(&f.editors)),
    };
    FormattedReference::new(vec![
        Span::plain(format!(
            "{} ({}) {}. In: {}",
            format_authors(&f.authors),
            f.year.trim(),
            f.title.trim(),
            editors
        )),
        Span::italic(f.book_title.trim()),
        Span::plain(format!(
            ". {}: {}, pp.{}.",
            f.place.trim(),
            f.publisher.trim(),
            f.pages.trim()
        )),
    ])
}

pub fn format_report(f: &CitationFields) -> FormattedReference {
    let author = if f.organisation.trim().is_empty() {
        format_authors(&f.authors)
    } else {
        f.organisation.trim().to_string()
    };
    FormattedReference::new(vec![
        Span::plain(format!("{} ({}) ", author, f.year.trim())),
        Span::italic(f.title.trim()),
        Span::plain(format!(". {}: {}.", f.place.trim(), f.publisher.trim())),
    ])
}

pub fn format_thesis(f: &CitationFields) -> FormattedReference {
    FormattedReference::new(vec![
        Span::plain(format!("{} ({}) ", format_authors(&f.authors), f.year.trim())),
        Span::italic(f.title.trim()),
        Span::plain(format!(". {}. {}.", f.degree.trim(), f.university.trim())),
    ])
}
