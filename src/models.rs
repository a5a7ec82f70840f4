//! Core data models used throughout the referencing tool.
//!
//! These types represent the citation fields collected from a form, the
//! formatted references that make up a bibliography, and the records an
//! essay audit produces.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The kind of source a reference describes. Selects the formatter template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[default]
    Book,
    Journal,
    Website,
    Chapter,
    Report,
    Thesis,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Book => "book",
            SourceKind::Journal => "journal",
            SourceKind::Website => "website",
            SourceKind::Chapter => "chapter",
            SourceKind::Report => "report",
            SourceKind::Thesis => "thesis",
        }
    }
}

impl std::str::FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "book" => Ok(SourceKind::Book),
            "journal" => Ok(SourceKind::Journal),
            "website" | "web" => Ok(SourceKind::Website),
            "chapter" => Ok(SourceKind::Chapter),
            "report" => Ok(SourceKind::Report),
            "thesis" => Ok(SourceKind::Thesis),
            other => Err(format!(
                "unknown source kind: '{}'. Must be book, journal, website, chapter, report, or thesis.",
                other
            )),
        }
    }
}

/// Field values collected for a single reference.
///
/// Only the fields relevant to `kind` are read by the formatter; the rest
/// stay empty. Authors are accepted pre-formatted (e.g. `"Smith, J."`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CitationFields {
    pub kind: SourceKind,
    pub authors: Vec<String>,
    pub year: String,
    pub title: String,
    pub publisher: String,
    pub place: String,
    pub edition: String,
    pub journal: String,
    pub volume: String,
    pub issue: String,
    pub pages: String,
    pub url: String,
    pub access_date: String,
    pub editors: Vec<String>,
    pub book_title: String,
    pub organisation: String,
    pub degree: String,
    pub university: String,
}

/// A required field was missing when a reference was submitted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("at least one author is required")]
    MissingAuthors,
    #[error("year is required")]
    MissingYear,
    #[error("title is required")]
    MissingTitle,
}

impl CitationFields {
    /// Checks the precondition the formatter relies on: authors, year and
    /// title must all be present. A report may name an organisation instead
    /// of individual authors.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let has_authors = self.authors.iter().any(|a| !a.trim().is_empty());
        let has_org = self.kind == SourceKind::Report && !self.organisation.trim().is_empty();
        if !has_authors && !has_org {
            return Err(ValidationError::MissingAuthors);
        }
        if self.year.trim().is_empty() {
            return Err(ValidationError::MissingYear);
        }
        if self.title.trim().is_empty() {
            return Err(ValidationError::MissingTitle);
        }
        Ok(())
    }
}

/// Emphasis applied to a span of reference text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emphasis {
    #[default]
    None,
    Italic,
    Bold,
}

/// A run of text with a single emphasis. `link` marks a span that should be
/// exported as a clickable hyperlink.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub text: String,
    #[serde(default)]
    pub emphasis: Emphasis,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl Span {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            emphasis: Emphasis::None,
            link: None,
        }
    }

    pub fn italic(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            emphasis: Emphasis::Italic,
            link: None,
        }
    }

    pub fn bold(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            emphasis: Emphasis::Bold,
            link: None,
        }
    }

    pub fn link(url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            text: url.clone(),
            emphasis: Emphasis::None,
            link: Some(url),
        }
    }
}

/// A formatted bibliography entry. Equality is by content, so duplicate
/// entries compare equal. Never mutated once built; corrections replace it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct FormattedReference {
    pub spans: Vec<Span>,
}

impl FormattedReference {
    pub fn new(spans: Vec<Span>) -> Self {
        // Adjacent spans with identical styling are merged so that equal
        // references always have equal span sequences.
        let mut merged: Vec<Span> = Vec::with_capacity(spans.len());
        for span in spans.into_iter().filter(|s| !s.text.is_empty()) {
            match merged.last_mut() {
                Some(last) if last.emphasis == span.emphasis && last.link.is_none() && span.link.is_none() => {
                    last.text.push_str(&span.text);
                }
                _ => merged.push(span),
            }
        }
        Self { spans: merged }
    }

    /// Text with all emphasis discarded.
    pub fn plain(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }

    /// Text with `*italic*` and `**bold**` markers.
    pub fn markup(&self) -> String {
        crate::markup::render(&self.spans)
    }

    /// Parses a line of `*italic*` / `**bold**` markup.
    pub fn from_markup(line: &str) -> Self {
        Self::new(crate::markup::parse(line))
    }

    /// Alphabetisation key, see [`crate::sort::sort_key`].
    pub fn sort_key(&self) -> String {
        crate::sort::sort_key(&self.markup())
    }
}

impl std::fmt::Display for FormattedReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.plain())
    }
}

/// An in-text citation found in essay text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CitationMention {
    /// Text between the parentheses, e.g. `Smith, 2023, p. 10`.
    pub raw: String,
    pub inferred_surname: String,
    pub year: String,
    pub has_page_ref: bool,
}

/// Outcome of checking one in-text citation against the bibliography.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditStatus {
    Matched,
    Missing,
    QuoteMissingPage,
}

impl AuditStatus {
    pub fn label(&self) -> &'static str {
        match self {
            AuditStatus::Matched => "Matched",
            AuditStatus::Missing => "Missing",
            AuditStatus::QuoteMissingPage => "Quote missing page",
        }
    }
}

/// One row of an audit table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditResult {
    pub location: String,
    pub citation: String,
    pub status: AuditStatus,
    pub feedback: String,
}

/// Counts shown above an audit table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuditSummary {
    pub total: usize,
    pub matched: usize,
    pub missing: usize,
    pub quote_missing_page: usize,
    pub unused: usize,
}

/// Full result of an audit run, regenerated on every run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuditReport {
    pub results: Vec<AuditResult>,
    /// Bibliography entries that no detected citation matched.
    pub unused: Vec<FormattedReference>,
    pub summary: AuditSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_requires_authors_year_title() {
        let mut f = CitationFields {
            authors: vec!["Smith, J.".into()],
            year: "2024".into(),
            title: "Example".into(),
            ..Default::default()
        };
        assert_eq!(f.validate(), Ok(()));

        f.year.clear();
        assert_eq!(f.validate(), Err(ValidationError::MissingYear));

        f.year = "2024".into();
        f.authors = vec!["  ".into()];
        assert_eq!(f.validate(), Err(ValidationError::MissingAuthors));
    }

    #[test]
    fn report_accepts_organisation_in_place_of_authors() {
        let f = CitationFields {
            kind: SourceKind::Report,
            organisation: "Scottish Social Services Council".into(),
            year: "2024".into(),
            title: "Codes of Practice".into(),
            ..Default::default()
        };
        assert!(f.validate().is_ok());
    }

    #[test]
    fn new_merges_adjacent_plain_spans() {
        let r = FormattedReference::new(vec![
            Span::plain("Smith "),
            Span::plain("(2024) "),
            Span::italic("Title"),
            Span::plain(""),
            Span::plain("."),
        ]);
        assert_eq!(r.spans.len(), 3);
        assert_eq!(r.plain(), "Smith (2024) Title.");
    }

    #[test]
    fn source_kind_parses_case_insensitively() {
        assert_eq!("Journal".parse::<SourceKind>(), Ok(SourceKind::Journal));
        assert!("podcast".parse::<SourceKind>().is_err());
    }
}
