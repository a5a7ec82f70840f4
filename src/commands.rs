//! CLI command implementations.
//!
//! Each `run_*` function backs one `lhr` subcommand. Results go to stdout;
//! diagnostics go through `tracing` to stderr. Bibliography files are UTF-8
//! with one markup entry per line.

use anyhow::{Context, Result};
use std::path::Path;

use crate::audit::Scanner;
use crate::bibliography::Bibliography;
use crate::config::Config;
use crate::correct::CorrectionTable;
use crate::export;
use crate::extract;
use crate::format::{format_reference, stamp_access_date, today};
use crate::models::{AuditReport, CitationFields};

/// Reads a line-based bibliography file.
pub fn read_bibliography(path: &Path) -> Result<Bibliography> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read bibliography: {}", path.display()))?;
    Ok(Bibliography::from_markup_lines(&text))
}

fn write_bibliography(path: &Path, bibliography: &Bibliography) -> Result<()> {
    std::fs::write(path, bibliography.to_markup_lines())
        .with_context(|| format!("Failed to write bibliography: {}", path.display()))
}

fn emit(path: &Path, bibliography: &Bibliography, write: bool) -> Result<()> {
    if write {
        write_bibliography(path, bibliography)?;
        println!("Wrote {} entries to {}", bibliography.len(), path.display());
    } else {
        print!("{}", bibliography.to_markup_lines());
    }
    Ok(())
}

/// `lhr format`: validates, formats and prints one reference.
pub fn run_format(mut fields: CitationFields, plain: bool) -> Result<()> {
    fields.validate()?;
    stamp_access_date(&mut fields, &today());
    let reference = format_reference(&fields);
    if plain {
        println!("{}", reference.plain());
    } else {
        println!("{}", reference.markup());
    }
    Ok(())
}

/// `lhr sort`: sorts a bibliography file by the Leeds Harvard sort key.
pub fn run_sort(path: &Path, write: bool) -> Result<()> {
    let mut bibliography = read_bibliography(path)?;
    bibliography.sort();
    emit(path, &bibliography, write)
}

/// `lhr correct`: replaces known sources with their gold-standard entries.
pub fn run_correct(config: &Config, path: &Path, write: bool) -> Result<()> {
    let table = CorrectionTable::with_extra(&config.corrections);
    let mut corrected = table.apply(&read_bibliography(path)?);
    corrected.sort();
    emit(path, &corrected, write)
}

/// `lhr export`: writes the sorted bibliography as a Word document.
pub fn run_export(config: &Config, path: &Path, output: &Path) -> Result<()> {
    let mut bibliography = read_bibliography(path)?;
    bibliography.sort();
    let bytes = export::bibliography_docx(&bibliography, &config.export)
        .context("Failed to build bibliography document")?;
    export::write_file(output, &bytes)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!(
        "Exported {} entries to {}",
        bibliography.len(),
        output.display()
    );
    Ok(())
}

/// Audits an essay file against a bibliography file.
pub fn audit_file(config: &Config, essay: &Path, bib: &Path) -> Result<AuditReport> {
    let content_type = extract::content_type_for_path(essay).with_context(|| {
        format!(
            "Cannot determine document type of {} (expected .docx, .pdf or .txt)",
            essay.display()
        )
    })?;
    let bytes = std::fs::read(essay)
        .with_context(|| format!("Failed to read essay: {}", essay.display()))?;
    let paragraphs = extract::extract_paragraphs(&bytes, content_type)
        .with_context(|| format!("Failed to extract text from {}", essay.display()))?;
    let bibliography = read_bibliography(bib)?;
    let scanner = Scanner::new(&config.audit)?;
    Ok(scanner.audit(&paragraphs, &bibliography))
}

/// `lhr audit`: prints the audit table (or JSON) and optionally writes a
/// Word report.
pub fn run_audit(
    config: &Config,
    essay: &Path,
    bib: &Path,
    report_path: Option<&Path>,
    json: bool,
) -> Result<()> {
    let report = audit_file(config, essay, bib)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if let Some(out) = report_path {
        let bytes = export::audit_report_docx(&report, &config.export)
            .context("Failed to build audit report")?;
        export::write_file(out, &bytes)
            .with_context(|| format!("Failed to write {}", out.display()))?;
        if !json {
            println!("Report written to {}", out.display());
        }
    }
    Ok(())
}

fn print_report(report: &AuditReport) {
    if report.results.is_empty() {
        println!("No in-text citations found.");
    }
    for r in &report.results {
        println!(
            "{:<14} {:<20} {}",
            r.location,
            r.status.label(),
            r.citation
        );
        println!("    {}", r.feedback);
    }
    if !report.unused.is_empty() {
        println!();
        println!("Unused references:");
        for entry in &report.unused {
            println!("    {}", entry.plain());
        }
    }
    let s = &report.summary;
    println!();
    println!(
        "{} citation(s): {} matched, {} missing, {} quote(s) missing a page. {} unused reference(s).",
        s.total, s.matched, s.missing, s.quote_missing_page, s.unused
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AuditStatus;

    #[test]
    fn audit_file_reads_text_essay() {
        let dir = tempfile::tempdir().unwrap();
        let essay = dir.path().join("essay.txt");
        let bib = dir.path().join("refs.txt");
        std::fs::write(
            &essay,
            "Care is relational (Smith, 2020).\n\nRights matter (Jones, 2019).\n",
        )
        .unwrap();
        std::fs::write(&bib, "Smith, J. (2020) *Care*. London: Sage.\n").unwrap();

        let report = audit_file(&Config::default(), &essay, &bib).unwrap();
        assert_eq!(report.results.len(), 2);
        assert_eq!(report.results[0].status, AuditStatus::Matched);
        assert_eq!(report.results[1].status, AuditStatus::Missing);
        assert_eq!(report.results[1].location, "Paragraph 2");
    }

    #[test]
    fn audit_file_rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let essay = dir.path().join("essay.odt");
        let bib = dir.path().join("refs.txt");
        std::fs::write(&essay, "x").unwrap();
        std::fs::write(&bib, "").unwrap();
        let err = audit_file(&Config::default(), &essay, &bib).unwrap_err();
        assert!(err.to_string().contains("Cannot determine document type"));
    }

    #[test]
    fn sort_in_place_rewrites_file() {
        let dir = tempfile::tempdir().unwrap();
        let bib = dir.path().join("refs.txt");
        std::fs::write(&bib, "Young, A. (2001) *Z*.\n\nThe Adams, B. (1999) *A*.\n").unwrap();
        run_sort(&bib, true).unwrap();
        let text = std::fs::read_to_string(&bib).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec!["The Adams, B. (1999) *A*.", "Young, A. (2001) *Z*."]);
    }
}
