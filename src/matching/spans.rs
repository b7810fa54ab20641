//! Span computation for citation grounding
//!
//! This module locates a citation inside a source document and reports the
//! half-open character range it occupies in the original text.
//!
//! # Matching passes
//!
//! - **Exact**: literal substring search. Offsets need no translation.
//! - **Normalized**: whitespace runs collapse to a single space on both sides,
//!   the citation is trimmed, and the match offset is walked back into the
//!   coordinates of the original document.
//!
//! All offsets are Unicode scalar (char) offsets, never UTF-8 byte offsets.

use serde::{Deserialize, Serialize};

/// Half-open `[start, end)` char range into an original document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Returns the document text covered by this span
    ///
    /// Offsets past the end of the document are clamped.
    pub fn slice<'a>(&self, document: &'a str) -> &'a str {
        let start = char_to_byte(document, self.start);
        let end = char_to_byte(document, self.end).max(start);
        &document[start..end]
    }
}

/// Which pass located the citation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMethod {
    /// Literal substring match
    Exact,
    /// Match after whitespace normalization, offsets mapped back
    Normalized,
}

impl MatchMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchMethod::Exact => "exact",
            MatchMethod::Normalized => "normalized",
        }
    }
}

/// A resolved span together with the pass that produced it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub span: Span,
    pub method: MatchMethod,
}

/// Serialized result of a span lookup
///
/// When `found` is false both offsets are `-1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanLookup {
    pub found: bool,
    pub start_index: i64,
    pub end_index: i64,
}

impl SpanLookup {
    pub const NOT_FOUND: SpanLookup = SpanLookup {
        found: false,
        start_index: -1,
        end_index: -1,
    };

    /// Converts back into a span, `None` for the not-found sentinel
    pub fn span(&self) -> Option<Span> {
        if !self.found || self.start_index < 0 || self.end_index < self.start_index {
            return None;
        }
        Some(Span {
            start: self.start_index as usize,
            end: self.end_index as usize,
        })
    }
}

impl From<Option<Span>> for SpanLookup {
    fn from(span: Option<Span>) -> Self {
        match span {
            Some(span) => SpanLookup {
                found: true,
                start_index: span.start as i64,
                end_index: span.end as i64,
            },
            None => SpanLookup::NOT_FOUND,
        }
    }
}

/// Resolve a citation to its span in the document
///
/// Returns `None` when either input is empty or no match exists even after
/// whitespace normalization.
pub fn resolve(citation: &str, document: &str) -> Option<Span> {
    resolve_detailed(citation, document).map(|r| r.span)
}

/// Resolve a citation and report which pass matched
pub fn resolve_detailed(citation: &str, document: &str) -> Option<Resolution> {
    if citation.is_empty() || document.is_empty() {
        return None;
    }

    if let Some(byte_idx) = document.find(citation) {
        let start = document[..byte_idx].chars().count();
        let end = start + citation.chars().count();
        return Some(Resolution {
            span: Span { start, end },
            method: MatchMethod::Exact,
        });
    }

    let normalized_citation = collapse_whitespace(citation.trim());
    if normalized_citation.is_empty() {
        return None;
    }
    let normalized_document = collapse_whitespace(document);

    let byte_idx = normalized_document.find(&normalized_citation)?;
    let norm_start = normalized_document[..byte_idx].chars().count();
    let norm_len = normalized_citation.chars().count();

    map_to_original(document, norm_start, norm_len).map(|span| Resolution {
        span,
        method: MatchMethod::Normalized,
    })
}

/// Collapse every maximal whitespace run to a single space
///
/// Leading and trailing runs are kept (as one space each).
pub fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_run = false;

    for c in text.chars() {
        if c.is_whitespace() {
            if !in_run {
                out.push(' ');
                in_run = true;
            }
        } else {
            out.push(c);
            in_run = false;
        }
    }

    out
}

/// Class of the last character emitted into the normalized stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Emitted {
    Text,
    Space,
}

/// Map a match in normalized coordinates back to the original document
///
/// Walks the original text with two cursors. Whitespace that normalization
/// collapsed away advances only the original cursor; every other character
/// advances both. `start` is taken when the normalized cursor reaches the
/// match start, `end` when it reaches the match end. If the document runs out
/// first, `end` clamps to the final original cursor.
fn map_to_original(document: &str, norm_start: usize, norm_len: usize) -> Option<Span> {
    let norm_end = norm_start + norm_len;
    let mut norm = 0;
    let mut orig = 0;
    let mut last = Emitted::Text;
    let mut start = None;

    for c in document.chars() {
        if c.is_whitespace() && last == Emitted::Space {
            orig += 1;
            continue;
        }

        if norm == norm_start && start.is_none() {
            start = Some(orig);
        }
        if norm == norm_end {
            return start.map(|start| Span { start, end: orig });
        }

        last = if c.is_whitespace() {
            Emitted::Space
        } else {
            Emitted::Text
        };
        norm += 1;
        orig += 1;
    }

    start.map(|start| Span { start, end: orig })
}

/// Byte index of the char at `char_offset`, or the text length past the end
fn char_to_byte(text: &str, char_offset: usize) -> usize {
    text.char_indices()
        .nth(char_offset)
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}

/// Line and column position (1-indexed for editor compatibility)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LineCol {
    pub line: usize,
    pub col: usize,
}

/// Convert a char offset to a 1-indexed line/column position
pub fn offset_to_line_col(document: &str, offset: usize) -> LineCol {
    let mut line = 1;
    let mut col = 1;

    for c in document.chars().take(offset) {
        if c == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }

    LineCol { line, col }
}
