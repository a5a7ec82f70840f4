//! Word (.docx) export for bibliographies and audit reports.
//!
//! Writes a minimal WordprocessingML package: content types, package and
//! document relationships, `word/styles.xml` carrying the document-wide font,
//! and `word/document.xml`. Emphasis spans become italic or bold runs and
//! link spans become external hyperlinks. An optional PNG banner is embedded
//! as an inline picture at the top of the document.

use std::io::Write;
use std::path::Path;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use thiserror::Error;
use zip::write::SimpleFileOptions;

use crate::bibliography::Bibliography;
use crate::config::ExportConfig;
use crate::models::{AuditReport, Emphasis, FormattedReference, Span};

pub const DOCX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

const NS_W: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_WP: &str = "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing";
const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const NS_PIC: &str = "http://schemas.openxmlformats.org/drawingml/2006/picture";
const NS_PKG_RELS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const NS_CONTENT_TYPES: &str = "http://schemas.openxmlformats.org/package/2006/content-types";

const REL_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
const REL_STYLES: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";
const REL_HYPERLINK: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink";
const REL_IMAGE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

const EMU_PER_INCH: f32 = 914_400.0;
const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

/// Audit table columns with their widths in twentieths of a point.
const AUDIT_COLUMNS: [(&str, &str); 4] = [
    ("Location", "1500"),
    ("Citation", "2500"),
    ("Status", "1700"),
    ("Feedback", "3300"),
];

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("XML write failed: {0}")]
    Xml(String),
    #[error("ZIP write failed: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Builds a document with one paragraph per bibliography entry, in the
/// order given.
pub fn bibliography_docx(
    bibliography: &Bibliography,
    config: &ExportConfig,
) -> Result<Vec<u8>, ExportError> {
    let mut doc = DocxBuilder::new(config);
    doc.banner()?;
    doc.heading(&config.bibliography_heading, 1)?;
    for entry in bibliography {
        doc.reference(entry, None)?;
    }
    doc.footer()?;
    doc.finish()
}

/// Builds the audit report: summary, a Location/Citation/Status/Feedback
/// table in document order, and the bibliography entries nothing cited.
pub fn audit_report_docx(report: &AuditReport, config: &ExportConfig) -> Result<Vec<u8>, ExportError> {
    let mut doc = DocxBuilder::new(config);
    doc.banner()?;
    doc.heading(&config.report_heading, 1)?;

    let s = &report.summary;
    doc.text_paragraph(&format!(
        "Found {} in-text citation(s): {} matched, {} missing, {} direct quote(s) without a page number. Unused references: {}.",
        s.total, s.matched, s.missing, s.quote_missing_page, s.unused
    ))?;

    if report.results.is_empty() {
        doc.text_paragraph("No in-text citations were detected.")?;
    } else {
        let rows: Vec<[String; 4]> = report
            .results
            .iter()
            .map(|r| {
                [
                    r.location.clone(),
                    r.citation.clone(),
                    r.status.label().to_string(),
                    r.feedback.clone(),
                ]
            })
            .collect();
        doc.table(&rows)?;
    }

    if !report.unused.is_empty() {
        doc.heading("Unused references", 2)?;
        for entry in &report.unused {
            doc.reference(entry, Some(" (not cited in text)"))?;
        }
    }
    doc.footer()?;
    doc.finish()
}

/// Writes `bytes` to `path`, creating parent directories.
pub fn write_file(path: &Path, bytes: &[u8]) -> Result<(), ExportError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, bytes)?;
    Ok(())
}

/// Thin wrapper over the quick-xml writer that maps its errors.
struct XmlOut {
    writer: Writer<Vec<u8>>,
}

impl XmlOut {
    fn new() -> Self {
        Self {
            writer: Writer::new(Vec::new()),
        }
    }

    fn part() -> Result<Self, ExportError> {
        let mut out = Self::new();
        out.event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
        Ok(out)
    }

    fn event(&mut self, event: Event<'_>) -> Result<(), ExportError> {
        self.writer
            .write_event(event)
            .map_err(|e| ExportError::Xml(e.to_string()))
    }

    fn start(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<(), ExportError> {
        let el = BytesStart::new(name).with_attributes(attrs.iter().copied());
        self.event(Event::Start(el))
    }

    fn empty(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<(), ExportError> {
        let el = BytesStart::new(name).with_attributes(attrs.iter().copied());
        self.event(Event::Empty(el))
    }

    fn end(&mut self, name: &str) -> Result<(), ExportError> {
        self.event(Event::End(BytesEnd::new(name)))
    }

    fn text(&mut self, text: &str) -> Result<(), ExportError> {
        self.event(Event::Text(BytesText::new(text)))
    }

    fn raw(&mut self, bytes: &[u8]) -> Result<(), ExportError> {
        self.writer.get_mut().write_all(bytes)?;
        Ok(())
    }

    fn into_bytes(self) -> Vec<u8> {
        self.writer.into_inner()
    }
}

struct Relationship {
    id: String,
    kind: &'static str,
    target: String,
    external: bool,
}

struct DocxBuilder<'c> {
    config: &'c ExportConfig,
    body: XmlOut,
    relationships: Vec<Relationship>,
    media: Vec<(String, Vec<u8>)>,
}

impl<'c> DocxBuilder<'c> {
    fn new(config: &'c ExportConfig) -> Self {
        let relationships = vec![Relationship {
            id: "rId1".to_string(),
            kind: REL_STYLES,
            target: "styles.xml".to_string(),
            external: false,
        }];
        Self {
            config,
            body: XmlOut::new(),
            relationships,
            media: Vec::new(),
        }
    }

    fn add_relationship(&mut self, kind: &'static str, target: &str, external: bool) -> String {
        let id = format!("rId{}", self.relationships.len() + 1);
        self.relationships.push(Relationship {
            id: id.clone(),
            kind,
            target: target.to_string(),
            external,
        });
        id
    }

    fn heading(&mut self, text: &str, level: u8) -> Result<(), ExportError> {
        let style = format!("Heading{}", level);
        self.body.start("w:p", &[])?;
        self.body.start("w:pPr", &[])?;
        self.body.empty("w:pStyle", &[("w:val", style.as_str())])?;
        self.body.end("w:pPr")?;
        self.run(text, Emphasis::None)?;
        self.body.end("w:p")
    }

    fn text_paragraph(&mut self, text: &str) -> Result<(), ExportError> {
        self.body.start("w:p", &[])?;
        self.run(text, Emphasis::None)?;
        self.body.end("w:p")
    }

    fn reference(&mut self, entry: &FormattedReference, suffix: Option<&str>) -> Result<(), ExportError> {
        self.body.start("w:p", &[])?;
        for span in &entry.spans {
            self.span(span)?;
        }
        if let Some(suffix) = suffix {
            self.run(suffix, Emphasis::None)?;
        }
        self.body.end("w:p")
    }

    fn span(&mut self, span: &Span) -> Result<(), ExportError> {
        match &span.link {
            Some(url) if !url.is_empty() => {
                let id = self.add_relationship(REL_HYPERLINK, url, true);
                self.body
                    .start("w:hyperlink", &[("r:id", id.as_str()), ("w:history", "1")])?;
                self.body.start("w:r", &[])?;
                self.body.start("w:rPr", &[])?;
                self.body.empty("w:rStyle", &[("w:val", "Hyperlink")])?;
                self.body.end("w:rPr")?;
                self.t(&span.text)?;
                self.body.end("w:r")?;
                self.body.end("w:hyperlink")
            }
            _ => self.run(&span.text, span.emphasis),
        }
    }

    fn run(&mut self, text: &str, emphasis: Emphasis) -> Result<(), ExportError> {
        self.body.start("w:r", &[])?;
        match emphasis {
            Emphasis::None => {}
            Emphasis::Italic => {
                self.body.start("w:rPr", &[])?;
                self.body.empty("w:i", &[])?;
                self.body.end("w:rPr")?;
            }
            Emphasis::Bold => {
                self.body.start("w:rPr", &[])?;
                self.body.empty("w:b", &[])?;
                self.body.end("w:rPr")?;
            }
        }
        self.t(text)?;
        self.body.end("w:r")
    }

    fn t(&mut self, text: &str) -> Result<(), ExportError> {
        self.body.start("w:t", &[("xml:space", "preserve")])?;
        self.body.text(text)?;
        self.body.end("w:t")
    }

    fn table(&mut self, rows: &[[String; 4]]) -> Result<(), ExportError> {
        self.body.start("w:tbl", &[])?;
        self.body.start("w:tblPr", &[])?;
        self.body.empty("w:tblStyle", &[("w:val", "TableGrid")])?;
        self.body.empty("w:tblW", &[("w:w", "0"), ("w:type", "auto")])?;
        self.body.end("w:tblPr")?;
        self.body.start("w:tblGrid", &[])?;
        for (_, width) in AUDIT_COLUMNS {
            self.body.empty("w:gridCol", &[("w:w", width)])?;
        }
        self.body.end("w:tblGrid")?;

        self.body.start("w:tr", &[])?;
        self.body.start("w:trPr", &[])?;
        self.body.empty("w:tblHeader", &[])?;
        self.body.end("w:trPr")?;
        for (title, width) in AUDIT_COLUMNS {
            self.cell(title, width, Emphasis::Bold)?;
        }
        self.body.end("w:tr")?;

        for row in rows {
            self.body.start("w:tr", &[])?;
            for (value, (_, width)) in row.iter().zip(AUDIT_COLUMNS) {
                self.cell(value, width, Emphasis::None)?;
            }
            self.body.end("w:tr")?;
        }
        self.body.end("w:tbl")?;
        // Word requires a paragraph between a table and the section end.
        self.body.empty("w:p", &[])
    }

    fn cell(&mut self, text: &str, width: &str, emphasis: Emphasis) -> Result<(), ExportError> {
        self.body.start("w:tc", &[])?;
        self.body.start("w:tcPr", &[])?;
        self.body.empty("w:tcW", &[("w:w", width), ("w:type", "dxa")])?;
        self.body.end("w:tcPr")?;
        self.body.start("w:p", &[])?;
        self.run(text, emphasis)?;
        self.body.end("w:p")?;
        self.body.end("w:tc")
    }

    fn footer(&mut self) -> Result<(), ExportError> {
        match self.config.footer.as_deref() {
            Some(footer) if !footer.trim().is_empty() => {
                let footer = footer.to_string();
                self.text_paragraph(&footer)
            }
            _ => Ok(()),
        }
    }

    /// Embeds the configured banner. A missing or unreadable banner is
    /// skipped with a warning; the export still succeeds.
    fn banner(&mut self) -> Result<(), ExportError> {
        let Some(path) = self.config.banner.clone() else {
            return Ok(());
        };
        let bytes = match std::fs::read(&path) {
            Ok(b) => b,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "banner not readable, skipping");
                return Ok(());
            }
        };
        let Some((width_px, height_px)) = png_dimensions(&bytes) else {
            tracing::warn!(path = %path.display(), "banner is not a PNG image, skipping");
            return Ok(());
        };

        let cx = (self.config.banner_width_inches * EMU_PER_INCH).round() as u64;
        let cy = cx * u64::from(height_px) / u64::from(width_px);
        let (cx, cy) = (cx.to_string(), cy.to_string());

        let name = format!("image{}.png", self.media.len() + 1);
        let rel_id = self.add_relationship(REL_IMAGE, &format!("media/{}", name), false);
        self.media.push((name.clone(), bytes));

        let b = &mut self.body;
        b.start("w:p", &[])?;
        b.start("w:r", &[])?;
        b.start("w:drawing", &[])?;
        b.start(
            "wp:inline",
            &[("distT", "0"), ("distB", "0"), ("distL", "0"), ("distR", "0")],
        )?;
        b.empty("wp:extent", &[("cx", cx.as_str()), ("cy", cy.as_str())])?;
        b.empty("wp:docPr", &[("id", "1"), ("name", "Banner")])?;
        b.start("a:graphic", &[])?;
        b.start(
            "a:graphicData",
            &[("uri", "http://schemas.openxmlformats.org/drawingml/2006/picture")],
        )?;
        b.start("pic:pic", &[])?;
        b.start("pic:nvPicPr", &[])?;
        b.empty("pic:cNvPr", &[("id", "0"), ("name", name.as_str())])?;
        b.empty("pic:cNvPicPr", &[])?;
        b.end("pic:nvPicPr")?;
        b.start("pic:blipFill", &[])?;
        b.empty("a:blip", &[("r:embed", rel_id.as_str())])?;
        b.start("a:stretch", &[])?;
        b.empty("a:fillRect", &[])?;
        b.end("a:stretch")?;
        b.end("pic:blipFill")?;
        b.start("pic:spPr", &[])?;
        b.start("a:xfrm", &[])?;
        b.empty("a:off", &[("x", "0"), ("y", "0")])?;
        b.empty("a:ext", &[("cx", cx.as_str()), ("cy", cy.as_str())])?;
        b.end("a:xfrm")?;
        b.start("a:prstGeom", &[("prst", "rect")])?;
        b.empty("a:avLst", &[])?;
        b.end("a:prstGeom")?;
        b.end("pic:spPr")?;
        b.end("pic:pic")?;
        b.end("a:graphicData")?;
        b.end("a:graphic")?;
        b.end("wp:inline")?;
        b.end("w:drawing")?;
        b.end("w:r")?;
        b.end("w:p")
    }

    fn finish(self) -> Result<Vec<u8>, ExportError> {
        let document = self.document_xml()?;
        let styles = styles_xml(self.config)?;
        let document_rels = document_rels_xml(&self.relationships)?;

        let mut zip = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        let parts: [(&str, Vec<u8>); 5] = [
            ("[Content_Types].xml", content_types_xml()?),
            ("_rels/.rels", package_rels_xml()?),
            ("word/document.xml", document),
            ("word/styles.xml", styles),
            ("word/_rels/document.xml.rels", document_rels),
        ];
        for (name, bytes) in parts {
            zip.start_file(name, options)?;
            zip.write_all(&bytes)?;
        }
        for (name, bytes) in &self.media {
            zip.start_file(format!("word/media/{}", name), options)?;
            zip.write_all(bytes)?;
        }
        let cursor = zip.finish()?;
        Ok(cursor.into_inner())
    }

    fn document_xml(&self) -> Result<Vec<u8>, ExportError> {
        let mut out = XmlOut::part()?;
        out.start(
            "w:document",
            &[
                ("xmlns:w", NS_W),
                ("xmlns:r", NS_R),
                ("xmlns:wp", NS_WP),
                ("xmlns:a", NS_A),
                ("xmlns:pic", NS_PIC),
            ],
        )?;
        out.start("w:body", &[])?;
        out.raw(self.body.writer.get_ref())?;
        out.start("w:sectPr", &[])?;
        out.empty("w:pgSz", &[("w:w", "11906"), ("w:h", "16838")])?;
        out.empty(
            "w:pgMar",
            &[
                ("w:top", "1440"),
                ("w:right", "1440"),
                ("w:bottom", "1440"),
                ("w:left", "1440"),
                ("w:header", "708"),
                ("w:footer", "708"),
                ("w:gutter", "0"),
            ],
        )?;
        out.end("w:sectPr")?;
        out.end("w:body")?;
        out.end("w:document")?;
        Ok(out.into_bytes())
    }
}

fn content_types_xml() -> Result<Vec<u8>, ExportError> {
    let mut out = XmlOut::part()?;
    out.start("Types", &[("xmlns", NS_CONTENT_TYPES)])?;
    out.empty(
        "Default",
        &[
            ("Extension", "rels"),
            ("ContentType", "application/vnd.openxmlformats-package.relationships+xml"),
        ],
    )?;
    out.empty("Default", &[("Extension", "xml"), ("ContentType", "application/xml")])?;
    out.empty("Default", &[("Extension", "png"), ("ContentType", "image/png")])?;
    out.empty(
        "Override",
        &[
            ("PartName", "/word/document.xml"),
            (
                "ContentType",
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml",
            ),
        ],
    )?;
    out.empty(
        "Override",
        &[
            ("PartName", "/word/styles.xml"),
            (
                "ContentType",
                "application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml",
            ),
        ],
    )?;
    out.end("Types")?;
    Ok(out.into_bytes())
}

fn package_rels_xml() -> Result<Vec<u8>, ExportError> {
    let mut out = XmlOut::part()?;
    out.start("Relationships", &[("xmlns", NS_PKG_RELS)])?;
    out.empty(
        "Relationship",
        &[
            ("Id", "rId1"),
            ("Type", REL_OFFICE_DOCUMENT),
            ("Target", "word/document.xml"),
        ],
    )?;
    out.end("Relationships")?;
    Ok(out.into_bytes())
}

fn document_rels_xml(relationships: &[Relationship]) -> Result<Vec<u8>, ExportError> {
    let mut out = XmlOut::part()?;
    out.start("Relationships", &[("xmlns", NS_PKG_RELS)])?;
    for rel in relationships {
        let mut attrs = vec![
            ("Id", rel.id.as_str()),
            ("Type", rel.kind),
            ("Target", rel.target.as_str()),
        ];
        if rel.external {
            attrs.push(("TargetMode", "External"));
        }
        out.empty("Relationship", &attrs)?;
    }
    out.end("Relationships")?;
    Ok(out.into_bytes())
}

fn styles_xml(config: &ExportConfig) -> Result<Vec<u8>, ExportError> {
    let font = config.font_family.as_str();
    // Word measures font size in half-points.
    let size = ((config.font_size_pt * 2.0).round() as u32).to_string();

    let mut out = XmlOut::part()?;
    out.start("w:styles", &[("xmlns:w", NS_W)])?;
    out.start("w:docDefaults", &[])?;
    out.start("w:rPrDefault", &[])?;
    out.start("w:rPr", &[])?;
    out.empty(
        "w:rFonts",
        &[
            ("w:ascii", font),
            ("w:hAnsi", font),
            ("w:eastAsia", font),
            ("w:cs", font),
        ],
    )?;
    out.empty("w:sz", &[("w:val", size.as_str())])?;
    out.empty("w:szCs", &[("w:val", size.as_str())])?;
    out.end("w:rPr")?;
    out.end("w:rPrDefault")?;
    out.start("w:pPrDefault", &[])?;
    out.start("w:pPr", &[])?;
    out.empty("w:spacing", &[("w:after", "160"), ("w:line", "276"), ("w:lineRule", "auto")])?;
    out.end("w:pPr")?;
    out.end("w:pPrDefault")?;
    out.end("w:docDefaults")?;

    out.start(
        "w:style",
        &[("w:type", "paragraph"), ("w:default", "1"), ("w:styleId", "Normal")],
    )?;
    out.empty("w:name", &[("w:val", "Normal")])?;
    out.end("w:style")?;

    for (level, half_points) in [(1u8, "32"), (2u8, "28")] {
        let id = format!("Heading{}", level);
        let name = format!("heading {}", level);
        let outline = (level - 1).to_string();
        out.start("w:style", &[("w:type", "paragraph"), ("w:styleId", id.as_str())])?;
        out.empty("w:name", &[("w:val", name.as_str())])?;
        out.empty("w:basedOn", &[("w:val", "Normal")])?;
        out.empty("w:next", &[("w:val", "Normal")])?;
        out.start("w:pPr", &[])?;
        out.empty("w:keepNext", &[])?;
        out.empty("w:spacing", &[("w:before", "240"), ("w:after", "120")])?;
        out.empty("w:outlineLvl", &[("w:val", outline.as_str())])?;
        out.end("w:pPr")?;
        out.start("w:rPr", &[])?;
        out.empty("w:b", &[])?;
        out.empty("w:sz", &[("w:val", half_points)])?;
        out.empty("w:szCs", &[("w:val", half_points)])?;
        out.end("w:rPr")?;
        out.end("w:style")?;
    }

    out.start("w:style", &[("w:type", "character"), ("w:styleId", "Hyperlink")])?;
    out.empty("w:name", &[("w:val", "Hyperlink")])?;
    out.start("w:rPr", &[])?;
    out.empty("w:color", &[("w:val", "0563C1")])?;
    out.empty("w:u", &[("w:val", "single")])?;
    out.end("w:rPr")?;
    out.end("w:style")?;

    out.start("w:style", &[("w:type", "table"), ("w:styleId", "TableGrid")])?;
    out.empty("w:name", &[("w:val", "Table Grid")])?;
    out.start("w:tblPr", &[])?;
    out.start("w:tblBorders", &[])?;
    for side in ["w:top", "w:left", "w:bottom", "w:right", "w:insideH", "w:insideV"] {
        out.empty(
            side,
            &[("w:val", "single"), ("w:sz", "4"), ("w:space", "0"), ("w:color", "auto")],
        )?;
    }
    out.end("w:tblBorders")?;
    out.end("w:tblPr")?;
    out.end("w:style")?;

    out.end("w:styles")?;
    Ok(out.into_bytes())
}

/// Width and height from a PNG IHDR chunk.
fn png_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    if bytes.len() < 24 || !bytes.starts_with(PNG_SIGNATURE) || &bytes[12..16] != b"IHDR" {
        return None;
    }
    let width = u32::from_be_bytes(bytes[16..20].try_into().ok()?);
    let height = u32::from_be_bytes(bytes[20..24].try_into().ok()?);
    if width == 0 || height == 0 {
        return None;
    }
    Some((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AuditResult, AuditStatus, AuditSummary};
    use std::io::Read;

    fn read_part(docx: &[u8], name: &str) -> String {
        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(docx)).unwrap();
        let mut s = String::new();
        archive.by_name(name).unwrap().read_to_string(&mut s).unwrap();
        s
    }

    fn tiny_png(width: u32, height: u32) -> Vec<u8> {
        let mut out = PNG_SIGNATURE.to_vec();
        out.extend_from_slice(&13u32.to_be_bytes());
        out.extend_from_slice(b"IHDR");
        out.extend_from_slice(&width.to_be_bytes());
        out.extend_from_slice(&height.to_be_bytes());
        out.extend_from_slice(&[8, 6, 0, 0, 0]);
        out
    }

    #[test]
    fn bibliography_runs_carry_emphasis() {
        let bib = Bibliography::from_markup_lines(
            "Smith, J. (2024) *Example Title*. London: Pearson.\nDoe, R. (2020) Art. *Journal*. **12**(3), pp.1-9.\n",
        );
        let docx = bibliography_docx(&bib, &ExportConfig::default()).unwrap();
        let xml = read_part(&docx, "word/document.xml");

        assert!(xml.contains("<w:rPr><w:i/></w:rPr><w:t xml:space=\"preserve\">Example Title</w:t>"));
        assert!(xml.contains("<w:rPr><w:b/></w:rPr><w:t xml:space=\"preserve\">12</w:t>"));
        assert!(xml.contains(">Bibliography<"));
        assert!(!xml.contains('*'));
    }

    #[test]
    fn styles_apply_font_and_size() {
        let config = ExportConfig {
            font_family: "Calibri".into(),
            font_size_pt: 11.0,
            ..Default::default()
        };
        let docx = bibliography_docx(&Bibliography::new(), &config).unwrap();
        let styles = read_part(&docx, "word/styles.xml");
        assert!(styles.contains("w:ascii=\"Calibri\""));
        assert!(styles.contains("<w:sz w:val=\"22\"/>"));
    }

    #[test]
    fn links_become_external_hyperlinks() {
        let bib = Bibliography::from_markup_lines(
            "NHS (2023) *Guide*. [Online]. [Accessed 1 May 2024]. Available from: https://www.nhs.uk/a?b=1&c=2",
        );
        let docx = bibliography_docx(&bib, &ExportConfig::default()).unwrap();
        let rels = read_part(&docx, "word/_rels/document.xml.rels");
        assert!(rels.contains("Target=\"https://www.nhs.uk/a?b=1&amp;c=2\""));
        assert!(rels.contains("TargetMode=\"External\""));
        let xml = read_part(&docx, "word/document.xml");
        assert!(xml.contains("<w:hyperlink r:id=\"rId2\""));
    }

    #[test]
    fn audit_report_has_table_and_unused_section() {
        let report = AuditReport {
            results: vec![AuditResult {
                location: "Paragraph 1".into(),
                citation: "(Brown, 2023)".into(),
                status: AuditStatus::Missing,
                feedback: "No bibliography entry found for Brown (2023).".into(),
            }],
            unused: vec![FormattedReference::from_markup("Smith, J. (2023) *Title*.")],
            summary: AuditSummary {
                total: 1,
                missing: 1,
                unused: 1,
                ..Default::default()
            },
        };
        let docx = audit_report_docx(&report, &ExportConfig::default()).unwrap();
        let xml = read_part(&docx, "word/document.xml");
        for header in ["Location", "Citation", "Status", "Feedback"] {
            assert!(xml.contains(&format!(">{}</w:t>", header)));
        }
        assert!(xml.contains(">(Brown, 2023)</w:t>"));
        assert!(xml.contains(">Unused references</w:t>"));
        assert!(xml.contains(" (not cited in text)</w:t>"));
    }

    #[test]
    fn banner_is_embedded_when_present() {
        let dir = tempfile::tempdir().unwrap();
        let banner = dir.path().join("Header.png");
        std::fs::write(&banner, tiny_png(1200, 300)).unwrap();
        let config = ExportConfig {
            banner: Some(banner),
            footer: Some("Produced with the referencing tool".into()),
            ..Default::default()
        };
        let docx = bibliography_docx(&Bibliography::new(), &config).unwrap();
        let xml = read_part(&docx, "word/document.xml");
        assert!(xml.contains("<wp:extent cx=\"5486400\" cy=\"1371600\"/>"));
        assert!(xml.contains(">Produced with the referencing tool</w:t>"));
        let archive = zip::ZipArchive::new(std::io::Cursor::new(docx.as_slice())).unwrap();
        assert!(archive.file_names().any(|n| n == "word/media/image1.png"));
    }

    #[test]
    fn missing_banner_is_skipped() {
        let config = ExportConfig {
            banner: Some("/nonexistent/Header.png".into()),
            ..Default::default()
        };
        let docx = bibliography_docx(&Bibliography::new(), &config).unwrap();
        let xml = read_part(&docx, "word/document.xml");
        assert!(!xml.contains("w:drawing"));
    }

    #[test]
    fn png_dimensions_rejects_other_formats() {
        assert_eq!(png_dimensions(&tiny_png(10, 20)), Some((10, 20)));
        assert_eq!(png_dimensions(b"GIF89a"), None);
    }
}
