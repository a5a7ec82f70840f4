//! Conversion between spans and the line-based `*italic*` / `**bold**`
//! markup used in bibliography files and gold-standard strings.
//!
//! Unmatched markers are kept as literal text. Bare `http(s)://` URLs in
//! plain text become link spans.

use lazy_static::lazy_static;
use regex::Regex;

use crate::models::{Emphasis, Span};

lazy_static! {
    static ref URL_RE: Regex = Regex::new(r"https?://\S+").unwrap();
}

pub fn render(spans: &[Span]) -> String {
    let mut out = String::new();
    for span in spans {
        match span.emphasis {
            Emphasis::None => out.push_str(&span.text),
            Emphasis::Italic => {
                out.push('*');
                out.push_str(&span.text);
                out.push('*');
            }
            Emphasis::Bold => {
                out.push_str("**");
                out.push_str(&span.text);
                out.push_str("**");
            }
        }
    }
    out
}

pub fn parse(line: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut plain = String::new();
    let mut rest = line;

    while let Some(pos) = rest.find('*') {
        plain.push_str(&rest[..pos]);
        let after = &rest[pos..];

        let (marker, emphasis) = if after.starts_with("**") {
            ("**", Emphasis::Bold)
        } else {
            ("*", Emphasis::Italic)
        };
        let body = &after[marker.len()..];

        match body.find(marker) {
            Some(end) if end > 0 => {
                push_plain(&mut spans, std::mem::take(&mut plain));
                spans.push(Span {
                    text: body[..end].to_string(),
                    emphasis,
                    link: None,
                });
                rest = &body[end + marker.len()..];
            }
            _ => {
                plain.push_str(marker);
                rest = body;
            }
        }
    }
    plain.push_str(rest);
    push_plain(&mut spans, plain);
    spans
}

fn push_plain(spans: &mut Vec<Span>, text: String) {
    if text.is_empty() {
        return;
    }
    let mut last = 0;
    for m in URL_RE.find_iter(&text) {
        if m.start() > last {
            spans.push(Span::plain(&text[last..m.start()]));
        }
        spans.push(Span::link(m.as_str()));
        last = m.end();
    }
    if last < text.len() {
        spans.push(Span::plain(&text[last..]));
    }
}
