//! Paragraph extraction for uploaded essays (DOCX, PDF, plain text).
//!
//! Callers supply bytes and a content type; this module returns the essay
//! as a list of paragraph strings. DOCX paragraphs follow `w:p` elements.
//! PDF and plain text are split on blank lines, with the lines of each
//! block joined by single spaces.

use std::io::Read;
use std::path::Path;

use thiserror::Error;

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_DOCX: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const MIME_TEXT: &str = "text/plain";

/// Maximum decompressed bytes to read from a single ZIP entry (zip-bomb protection).
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

/// Extraction failure. Never fatal: the caller reports it and keeps its state.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported content-type: {0}")]
    UnsupportedContentType(String),
    #[error("PDF extraction failed: {0}")]
    Pdf(String),
    #[error("DOCX extraction failed: {0}")]
    Ooxml(String),
    #[error("text is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
    #[error("no text could be extracted from this file")]
    NoText,
}

/// Maps a file extension to one of the supported content types.
pub fn content_type_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "docx" => Some(MIME_DOCX),
        "pdf" => Some(MIME_PDF),
        "txt" | "text" | "md" => Some(MIME_TEXT),
        _ => None,
    }
}

/// Extracts the non-empty paragraphs of a document.
///
/// A document with no text at all is an error ([`ExtractError::NoText`]),
/// distinct from a document that has text but no citations.
pub fn extract_paragraphs(bytes: &[u8], content_type: &str) -> Result<Vec<String>, ExtractError> {
    // Parameters such as "; charset=utf-8" are ignored.
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    let paragraphs = match mime.as_str() {
        MIME_DOCX => extract_docx(bytes)?,
        MIME_PDF => split_blocks(&extract_pdf(bytes)?),
        MIME_TEXT => split_blocks(&String::from_utf8(bytes.to_vec())?),
        _ => return Err(ExtractError::UnsupportedContentType(mime)),
    };
    if paragraphs.is_empty() {
        return Err(ExtractError::NoText);
    }
    tracing::debug!(content_type = %mime, paragraphs = paragraphs.len(), "extracted document");
    Ok(paragraphs)
}

fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractError> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| ExtractError::Pdf(e.to_string()))
}

/// Splits text into blank-line separated blocks.
fn split_blocks(text: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            if !current.is_empty() {
                blocks.push(current.join(" "));
                current.clear();
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        blocks.push(current.join(" "));
    }
    blocks
}

fn read_zip_entry_bounded(
    archive: &mut zip::ZipArchive<std::io::Cursor<&[u8]>>,
    name: &str,
    max_bytes: u64,
) -> Result<Vec<u8>, ExtractError> {
    let entry = archive
        .by_name(name)
        .map_err(|e| ExtractError::Ooxml(format!("{}: {}", name, e)))?;
    let mut out = Vec::new();
    entry
        .take(max_bytes)
        .read_to_end(&mut out)
        .map_err(|e| ExtractError::Ooxml(e.to_string()))?;
    if out.len() as u64 >= max_bytes {
        return Err(ExtractError::Ooxml(format!(
            "ZIP entry {} exceeds size limit ({} bytes)",
            name, max_bytes
        )));
    }
    Ok(out)
}

fn extract_docx(bytes: &[u8]) -> Result<Vec<String>, ExtractError> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes))
        .map_err(|e| ExtractError::Ooxml(e.to_string()))?;
    let doc_xml = read_zip_entry_bounded(&mut archive, "word/document.xml", MAX_XML_ENTRY_BYTES)?;
    extract_w_p_paragraphs(&doc_xml)
}

/// Collects the `w:t` text of each `w:p`. Tabs and breaks become spaces.
fn extract_w_p_paragraphs(xml: &[u8]) -> Result<Vec<String>, ExtractError> {
    use quick_xml::events::Event;

    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut in_text = false;
    let mut reader = quick_xml::Reader::from_reader(xml);
    // Run boundaries often fall on spaces, so text is kept untrimmed.
    reader.config_mut().trim_text(false);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                if e.local_name().as_ref() == b"t" {
                    in_text = true;
                }
            }
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"tab" | b"br" | b"cr" => current.push(' '),
                _ => {}
            },
            Ok(Event::Text(te)) if in_text => {
                let text = te
                    .unescape()
                    .map_err(|e| ExtractError::Ooxml(e.to_string()))?;
                current.push_str(&text);
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => {
                    let text = current.split_whitespace().collect::<Vec<_>>().join(" ");
                    if !text.is_empty() {
                        paragraphs.push(text);
                    }
                    current.clear();
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(ExtractError::Ooxml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(paragraphs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn docx_with_body(body: &str) -> Vec<u8> {
        let mut buf = Vec::new();
        {
            let mut zip = zip::ZipWriter::new(std::io::Cursor::new(&mut buf));
            zip.start_file("word/document.xml", zip::write::SimpleFileOptions::default())
                .unwrap();
            let xml = format!(
                "<?xml version=\"1.0\"?><w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\"><w:body>{}</w:body></w:document>",
                body
            );
            zip.write_all(xml.as_bytes()).unwrap();
            zip.finish().unwrap();
        }
        buf
    }

    #[test]
    fn unsupported_content_type_returns_error() {
        let err = extract_paragraphs(b"foo", "application/octet-stream").unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedContentType(_)));
    }

    #[test]
    fn invalid_pdf_returns_error() {
        let err = extract_paragraphs(b"not a pdf", MIME_PDF).unwrap_err();
        assert!(matches!(err, ExtractError::Pdf(_)));
    }

    #[test]
    fn invalid_zip_returns_error_for_docx() {
        let err = extract_paragraphs(b"not a zip", MIME_DOCX).unwrap_err();
        assert!(matches!(err, ExtractError::Ooxml(_)));
    }

    #[test]
    fn docx_paragraphs_join_runs() {
        let doc = docx_with_body(
            "<w:p><w:r><w:t xml:space=\"preserve\">Care is </w:t></w:r><w:r><w:t>relational (Smith, 2023).</w:t></w:r></w:p>\
             <w:p></w:p>\
             <w:p><w:r><w:t>Second</w:t><w:tab/><w:t>para &amp; more</w:t></w:r></w:p>",
        );
        let paragraphs = extract_paragraphs(&doc, MIME_DOCX).unwrap();
        assert_eq!(
            paragraphs,
            vec!["Care is relational (Smith, 2023).", "Second para & more"]
        );
    }

    #[test]
    fn docx_without_text_is_no_text() {
        let doc = docx_with_body("<w:p></w:p>");
        let err = extract_paragraphs(&doc, MIME_DOCX).unwrap_err();
        assert!(matches!(err, ExtractError::NoText));
    }

    #[test]
    fn plain_text_splits_on_blank_lines() {
        let text = "First line\ncontinues here.\n\n\nSecond (Lee, 2010).\n";
        let paragraphs = extract_paragraphs(text.as_bytes(), "text/plain; charset=utf-8").unwrap();
        assert_eq!(
            paragraphs,
            vec!["First line continues here.", "Second (Lee, 2010)."]
        );
    }

    #[test]
    fn content_type_from_extension() {
        assert_eq!(content_type_for_path(Path::new("essay.DOCX")), Some(MIME_DOCX));
        assert_eq!(content_type_for_path(Path::new("essay.pdf")), Some(MIME_PDF));
        assert_eq!(content_type_for_path(Path::new("essay.odt")), None);
    }
}
