//! In-text citation audit.
//!
//! Scans essay paragraphs for parenthetical author–date citations such as
//! `(Smith, 2023)` or `(Jones, 2020, p. 12)` and checks each one against the
//! bibliography.
//!
//! # Detection
//!
//! A citation is a `(...)` group with no nested parentheses containing a
//! four-digit year (optionally suffixed `a`–`z`). Between `min_lead` and
//! `max_lead` characters must precede the year and at most `max_trailing`
//! may follow it. Groups longer than `max_span` are rejected so that long
//! asides which merely mention a year are not reported.
//!
//! # Matching
//!
//! Grouped citations are split on `;` and each source is checked on its
//! own. Each citation is reduced to a [`CitationMention`]. It is **Matched** when
//! its cleaned surname occurs as a whole word in a cleaned bibliography
//! entry that also contains the cited year. If quote checking is enabled, a
//! paragraph containing a quotation mark turns every citation without a page
//! reference into **QuoteMissingPage**.
//!
//! Results are reported in document order.

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

use crate::bibliography::Bibliography;
use crate::config::AuditConfig;
use crate::models::{AuditReport, AuditResult, AuditStatus, AuditSummary, CitationMention};
use crate::text::{clean_text, contains_phrase};

lazy_static! {
    static ref YEAR_RE: Regex = Regex::new(r"\b(\d{4}[a-z]?)\b").unwrap();
    static ref PAGE_RE: Regex = Regex::new(r"(?i)\bpp?\.|\bpages?\b").unwrap();
}

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("invalid citation pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Compiled citation scanner.
#[derive(Debug, Clone)]
pub struct Scanner {
    pattern: Regex,
    max_span: usize,
    quote_check: bool,
    quote_chars: Vec<char>,
}

impl Scanner {
    pub fn new(config: &AuditConfig) -> Result<Self, AuditError> {
        let pattern = Regex::new(&format!(
            r"\(([^()]{{{min},{max}}}?\b(\d{{4}}[a-z]?)\b[^()]{{0,{trail}}})\)",
            min = config.min_lead,
            max = config.max_lead,
            trail = config.max_trailing,
        ))?;
        Ok(Self {
            pattern,
            max_span: config.max_span,
            quote_check: config.quote_check,
            quote_chars: config.quote_chars.chars().collect(),
        })
    }

    /// Finds the citations in one paragraph, in order of appearance.
    ///
    /// A grouped citation such as `(Smith, 2020; Jones, 2021)` yields one
    /// mention per `;` segment that carries its own year.
    pub fn detect(&self, paragraph: &str) -> Vec<CitationMention> {
        self.pattern
            .captures_iter(paragraph)
            .filter(|caps| caps[0].chars().count() <= self.max_span)
            .flat_map(|caps| split_group(&caps[1]))
            .collect()
    }

    /// Audits every paragraph against `bibliography`.
    ///
    /// Empty paragraphs are skipped and do not count towards locations.
    /// Finding no citations is a valid outcome, not an error.
    pub fn audit(&self, paragraphs: &[String], bibliography: &Bibliography) -> AuditReport {
        let cleaned: Vec<String> = bibliography
            .iter()
            .map(|entry| clean_text(&entry.plain()))
            .collect();
        let mut used = vec![false; cleaned.len()];
        let mut results = Vec::new();

        let non_empty = paragraphs.iter().filter(|p| !p.trim().is_empty());
        for (index, paragraph) in non_empty.enumerate() {
            let mentions = self.detect(paragraph);
            if mentions.is_empty() {
                continue;
            }
            tracing::debug!(paragraph = index + 1, citations = mentions.len(), "detected citations");

            let quoted = self.quote_check && paragraph.chars().any(|c| self.quote_chars.contains(&c));
            for mention in mentions {
                let hit = find_entry(&mention, &cleaned);
                if let Some(i) = hit {
                    used[i] = true;
                }
                let status = if quoted && !mention.has_page_ref {
                    AuditStatus::QuoteMissingPage
                } else if hit.is_some() {
                    AuditStatus::Matched
                } else {
                    AuditStatus::Missing
                };
                results.push(AuditResult {
                    location: format!("Paragraph {}", index + 1),
                    citation: format!("({})", mention.raw),
                    status,
                    feedback: feedback(status, &mention, hit.is_some()),
                });
            }
        }

        let unused: Vec<_> = bibliography
            .iter()
            .zip(&used)
            .filter(|(_, used)| !**used)
            .map(|(entry, _)| entry.clone())
            .collect();

        let summary = AuditSummary {
            total: results.len(),
            matched: count(&results, AuditStatus::Matched),
            missing: count(&results, AuditStatus::Missing),
            quote_missing_page: count(&results, AuditStatus::QuoteMissingPage),
            unused: unused.len(),
        };
        tracing::info!(
            total = summary.total,
            matched = summary.matched,
            missing = summary.missing,
            quote_missing_page = summary.quote_missing_page,
            unused = summary.unused,
            "audit complete"
        );

        AuditReport {
            results,
            unused,
            summary,
        }
    }
}

/// Splits the text inside a citation's parentheses into its parts.
///
/// The author part is the text before the first comma, or before the year
/// when there is no comma. Lead-in words such as `see` or `cf.` are skipped
/// by taking the first capitalised word; if there is none the first word is
/// used.
pub fn parse_mention(raw: &str, year: &str) -> CitationMention {
    let author_part = match raw.find(',') {
        Some(comma) => &raw[..comma],
        None => raw.find(year).map(|i| &raw[..i]).unwrap_or(raw),
    };
    let words: Vec<&str> = author_part
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|w| !w.is_empty())
        .collect();
    let surname = words
        .iter()
        .find(|w| w.chars().next().is_some_and(char::is_uppercase))
        .or_else(|| words.first())
        .map(|w| w.to_string())
        .unwrap_or_default();

    // Page qualifiers follow the year, so an author named Page or Knapp
    // does not count.
    let qualifier = raw.find(year).map(|i| &raw[i + year.len()..]).unwrap_or("");
    CitationMention {
        raw: raw.trim().to_string(),
        inferred_surname: surname,
        year: year.to_string(),
        has_page_ref: PAGE_RE.is_match(qualifier),
    }
}

/// Splits the inside of one bracketed group into its cited sources.
/// Segments without a year of their own (such as a trailing `e.g.`) are
/// dropped.
fn split_group(inner: &str) -> Vec<CitationMention> {
    inner
        .split(';')
        .filter_map(|segment| {
            let year = YEAR_RE.captures(segment)?.get(1)?.as_str();
            Some(parse_mention(segment, year))
        })
        .collect()
}

fn find_entry(mention: &CitationMention, cleaned_entries: &[String]) -> Option<usize> {
    let surname = clean_text(&mention.inferred_surname);
    let year = clean_text(&mention.year);
    if surname.is_empty() {
        return None;
    }
    cleaned_entries
        .iter()
        .position(|entry| contains_phrase(entry, &surname) && contains_phrase(entry, &year))
}

fn feedback(status: AuditStatus, mention: &CitationMention, matched: bool) -> String {
    match status {
        AuditStatus::Matched => "Found in bibliography.".to_string(),
        AuditStatus::Missing => format!(
            "No bibliography entry found for {} ({}). Add the full reference to your list.",
            mention.inferred_surname, mention.year
        ),
        AuditStatus::QuoteMissingPage => {
            let base = format!(
                "Direct quote detected: add a page number, e.g. ({}, {}, p. 10).",
                mention.inferred_surname, mention.year
            );
            if matched {
                base
            } else {
                format!("{} No bibliography entry found either.", base)
            }
        }
    }
}

fn count(results: &[AuditResult], status: AuditStatus) -> usize {
    results.iter().filter(|r| r.status == status).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FormattedReference;

    fn scanner() -> Scanner {
        Scanner::new(&AuditConfig::default()).unwrap()
    }

    fn bib(lines: &[&str]) -> Bibliography {
        Bibliography::from_entries(lines.iter().map(|l| FormattedReference::from_markup(l)).collect())
    }

    #[test]
    fn detects_two_citations_in_order() {
        let found = scanner()
            .detect("This is supported (Smith, 2023) and also (Jones, 2020, p. 12).");
        assert_eq!(found.len(), 2);
        assert!(found[0].raw.contains("2023"));
        assert!(found[1].raw.contains("2020"));
        assert!(!found[0].has_page_ref);
        assert!(found[1].has_page_ref);
        assert_eq!(found[1].inferred_surname, "Jones");
    }

    #[test]
    fn rejects_long_asides_and_non_years() {
        let s = scanner();
        let aside = format!("({} in 2019 this happened)", "long aside ".repeat(12));
        assert!(s.detect(&aside).is_empty());
        assert!(s.detect("(see figure 12)").is_empty());
        assert!(s.detect("(2023)").is_empty());
        assert!(s.detect("(Smith, 20234)").is_empty());
    }

    #[test]
    fn span_limit_is_configurable() {
        let cfg = AuditConfig {
            max_span: 15,
            ..Default::default()
        };
        let s = Scanner::new(&cfg).unwrap();
        assert_eq!(s.detect("(Smith, 2023)").len(), 1);
        assert!(s.detect("(Smith and Jones, 2023)").is_empty());
    }

    #[test]
    fn parses_lead_ins_and_suffixes() {
        let found = scanner().detect("As argued (see Bloggs et al., 2019a) and (cf. O'Neil 2021).");
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].inferred_surname, "Bloggs");
        assert_eq!(found[0].year, "2019a");
        assert_eq!(found[1].inferred_surname, "O'Neil");
        assert_eq!(found[1].year, "2021");
    }

    #[test]
    fn matched_and_missing() {
        let b = bib(&["Smith, J. (2023) Title. Place: Publisher."]);
        let paragraphs = vec![
            "Evidence (Smith, 2023) suggests.".to_string(),
            "Other work (Brown, 2023) disagrees.".to_string(),
        ];
        let report = scanner().audit(&paragraphs, &b);
        assert_eq!(report.results.len(), 2);
        assert_eq!(report.results[0].status, AuditStatus::Matched);
        assert_eq!(report.results[0].location, "Paragraph 1");
        assert_eq!(report.results[0].citation, "(Smith, 2023)");
        assert_eq!(report.results[1].status, AuditStatus::Missing);
        assert!(report.unused.is_empty());
    }

    #[test]
    fn year_must_agree() {
        let b = bib(&["Smith, J. (2021) Title. Place: Publisher."]);
        let report = scanner().audit(&["(Smith, 2023)".to_string()], &b);
        assert_eq!(report.results[0].status, AuditStatus::Missing);
        assert_eq!(report.unused.len(), 1);
    }

    #[test]
    fn quote_without_page_overrides_match() {
        let b = bib(&["Smith, J. (2023) Title. Place: Publisher."]);
        let paragraphs = vec![
            "She wrote \"care is relational\" (Smith, 2023).".to_string(),
            "\u{201C}Care is relational\u{201D} (Smith, 2023, p. 4).".to_string(),
        ];
        let report = scanner().audit(&paragraphs, &b);
        assert_eq!(report.results[0].status, AuditStatus::QuoteMissingPage);
        assert_eq!(report.results[1].status, AuditStatus::Matched);
        assert_eq!(report.summary.quote_missing_page, 1);
        assert!(report.unused.is_empty());
    }

    #[test]
    fn quote_check_can_be_disabled() {
        let cfg = AuditConfig {
            quote_check: false,
            ..Default::default()
        };
        let b = bib(&["Smith, J. (2023) Title."]);
        let report = Scanner::new(&cfg)
            .unwrap()
            .audit(&["\"Quoted\" (Smith, 2023).".to_string()], &b);
        assert_eq!(report.results[0].status, AuditStatus::Matched);
    }

    #[test]
    fn empty_paragraphs_do_not_advance_location() {
        let paragraphs = vec![
            "Intro.".to_string(),
            "   ".to_string(),
            "Body (Lee, 2010).".to_string(),
        ];
        let report = scanner().audit(&paragraphs, &Bibliography::new());
        assert_eq!(report.results[0].location, "Paragraph 2");
    }

    #[test]
    fn no_citations_is_empty_report() {
        let b = bib(&["Smith, J. (2023) Title."]);
        let report = scanner().audit(&["Nothing cited here.".to_string()], &b);
        assert!(report.results.is_empty());
        assert_eq!(report.summary.total, 0);
        assert_eq!(report.summary.unused, 1);
    }

    #[test]
    fn grouped_citation_checks_each_source() {
        let b = bib(&[
            "Smith, J. (2020) *Care*. London: Sage.",
            "Jones, A. (2021) *Rights*. Leeds: Pearson.",
        ]);
        let paragraphs = vec![
            "Both agree (Smith, 2020; Jones, 2021).".to_string(),
            "Others differ (Smith, 2020; Brown, 2019).".to_string(),
        ];
        let report = scanner().audit(&paragraphs, &b);

        let rows: Vec<(&str, &str, AuditStatus)> = report
            .results
            .iter()
            .map(|r| (r.location.as_str(), r.citation.as_str(), r.status))
            .collect();
        assert_eq!(
            rows,
            vec![
                ("Paragraph 1", "(Smith, 2020)", AuditStatus::Matched),
                ("Paragraph 1", "(Jones, 2021)", AuditStatus::Matched),
                ("Paragraph 2", "(Smith, 2020)", AuditStatus::Matched),
                ("Paragraph 2", "(Brown, 2019)", AuditStatus::Missing),
            ]
        );
        assert!(report.unused.is_empty());
        assert_eq!(report.summary.missing, 1);
    }

    #[test]
    fn grouped_citation_keeps_per_source_page_refs() {
        let found = scanner().detect("(Smith, 2020, p. 4; Jones, 2021; e.g. above)");
        assert_eq!(found.len(), 2);
        assert!(found[0].has_page_ref);
        assert_eq!(found[1].inferred_surname, "Jones");
        assert!(!found[1].has_page_ref);
    }

    #[test]
    fn page_ref_needs_a_page_qualifier() {
        let s = scanner();
        for cited in ["(Page, 2020)", "(Knapp., 2020)", "(Pagett, 2020)"] {
            assert!(!s.detect(cited)[0].has_page_ref, "{}", cited);
        }
        for cited in ["(Smith, 2020, p. 4)", "(Smith, 2020, pp.4-9)", "(Smith, 2020, page 12)", "(Smith, 2020: P.3)"] {
            assert!(s.detect(cited)[0].has_page_ref, "{}", cited);
        }
    }

    #[test]
    fn quote_by_author_named_page_is_flagged() {
        let b = bib(&["Page, L. (2020) *Voices*. London: Sage."]);
        let report = scanner().audit(&["\"Listen first\" (Page, 2020).".to_string()], &b);
        assert_eq!(report.results[0].status, AuditStatus::QuoteMissingPage);
    }

    #[test]
    fn surname_must_be_whole_word() {
        let b = bib(&["Smithson, A. (2020) Title."]);
        let report = scanner().audit(&["(Smith, 2020)".to_string()], &b);
        assert_eq!(report.results[0].status, AuditStatus::Missing);
    }
}
