//! Preview extraction with matched-term highlighting.
//!
//! Previews are produced as structured spans; the marked-string form is derived from them
//! with caller-chosen markers. Span text is copied verbatim from the chunk, so rendering
//! layers must still treat it as untrusted text.

use serde::{Deserialize, Serialize};
use std::ops::Range;

use super::tokenize::Tokenizer;

/// Emphasis markers for the marked-string form of a preview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighlightMarkers {
    pub open: String,
    pub close: String,
}

impl Default for HighlightMarkers {
    fn default() -> Self {
        Self {
            open: "<mark>".to_string(),
            close: "</mark>".to_string(),
        }
    }
}

/// A run of preview text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreviewSpan {
    pub text: String,
    pub highlighted: bool,
}

/// A window of chunk text with matched words marked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Preview {
    pub spans: Vec<PreviewSpan>,
    /// Text was cut before the window.
    pub truncated_start: bool,
    /// Text was cut after the window.
    pub truncated_end: bool,
}

impl Preview {
    pub fn has_highlights(&self) -> bool {
        self.spans.iter().any(|s| s.highlighted)
    }

    /// Highlighted words, in order.
    pub fn highlighted(&self) -> impl Iterator<Item = &str> {
        self.spans
            .iter()
            .filter(|s| s.highlighted)
            .map(|s| s.text.as_str())
    }

    /// Whether some highlighted word carries `term` as its stem or surface form.
    pub fn marks(&self, tokenizer: &Tokenizer, term: &str) -> bool {
        self.highlighted().any(|word| {
            tokenizer
                .tokens(word)
                .iter()
                .any(|t| t.term == term || t.surface == term)
        })
    }

    /// Preview text without markers.
    pub fn plain_text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }

    /// Render with every highlighted span wrapped in `markers`.
    pub fn to_marked(&self, markers: &HighlightMarkers) -> String {
        let mut out = String::new();
        for span in &self.spans {
            if span.highlighted {
                out.push_str(&markers.open);
                out.push_str(&span.text);
                out.push_str(&markers.close);
            } else {
                out.push_str(&span.text);
            }
        }
        out
    }
}

/// Separator placed between preview fragments.
const FRAGMENT_SEPARATOR: &str = " ... ";

/// A matched word: its byte span and the indices of the matched terms it carries.
#[derive(Debug, Clone)]
struct Match {
    span: Range<usize>,
    terms: Vec<usize>,
}

/// Extract a `window`-character preview of `text` centred on the first word matching any
/// of `matched_terms`, marking every matching word inside it.
///
/// A word matches when its stemmed term or its normalized surface form is one of
/// `matched_terms`. A term whose occurrences all fall outside the first window gets a
/// further fragment of its own, joined with `" ... "`, so every term that occurs in
/// `text` is marked at least once. The window is never narrower than the word it is
/// centred on. Without any match the first `window` characters are returned unmarked.
pub fn highlight(
    tokenizer: &Tokenizer,
    text: &str,
    matched_terms: &[String],
    window: usize,
) -> Preview {
    let matches = find_matches(tokenizer, text, matched_terms);
    let total_chars = text.chars().count();

    let Some(first) = matches.first() else {
        let end = byte_offset(text, window.min(total_chars));
        return Preview {
            spans: plain_span(&text[..end]).into_iter().collect(),
            truncated_start: false,
            truncated_end: end < text.len(),
        };
    };

    let mut fragments = vec![fragment_around(text, &first.span, total_chars, window)];
    for term in 0..matched_terms.len() {
        let mut carrying = matches.iter().filter(|m| m.terms.contains(&term));
        let covered = carrying
            .clone()
            .any(|m| fragments.iter().any(|f| contains(f, &m.span)));
        if !covered && let Some(m) = carrying.next() {
            fragments.push(fragment_around(text, &m.span, total_chars, window));
        }
    }
    let fragments = merge_overlapping(fragments);

    let mut spans = vec![];
    for (idx, fragment) in fragments.iter().enumerate() {
        if idx > 0 {
            spans.extend(plain_span(FRAGMENT_SEPARATOR));
        }
        let mut cursor = fragment.start;
        for m in matches.iter().filter(|m| contains(fragment, &m.span)) {
            spans.extend(plain_span(&text[cursor..m.span.start]));
            spans.push(PreviewSpan {
                text: text[m.span.clone()].to_string(),
                highlighted: true,
            });
            cursor = m.span.end;
        }
        spans.extend(plain_span(&text[cursor..fragment.end]));
    }

    Preview {
        spans,
        truncated_start: fragments.first().is_some_and(|f| f.start > 0),
        truncated_end: fragments.last().is_some_and(|f| f.end < text.len()),
    }
}

/// Matching words in text order, CamelCase sub-words merged into their whole word.
fn find_matches(tokenizer: &Tokenizer, text: &str, matched_terms: &[String]) -> Vec<Match> {
    let mut found: Vec<Match> = tokenizer
        .tokens(text)
        .into_iter()
        .filter_map(|token| {
            let terms: Vec<usize> = matched_terms
                .iter()
                .enumerate()
                .filter(|(_, term)| **term == token.term || **term == token.surface)
                .map(|(idx, _)| idx)
                .collect();
            (!terms.is_empty()).then_some(Match {
                span: token.span,
                terms,
            })
        })
        .collect();
    found.sort_by_key(|m| (m.span.start, m.span.end));

    let mut merged: Vec<Match> = Vec::with_capacity(found.len());
    for m in found {
        match merged.last_mut() {
            Some(last) if m.span.start < last.span.end => {
                last.span.end = last.span.end.max(m.span.end);
                last.terms.extend(m.terms);
            }
            _ => merged.push(m),
        }
    }
    merged
}

/// Byte range of a `window`-character fragment around `span`, widened to fit the span.
fn fragment_around(text: &str, span: &Range<usize>, total_chars: usize, window: usize) -> Range<usize> {
    let match_len = text[span.clone()].chars().count();
    let (start, end) = centre_window(
        text[..span.start].chars().count(),
        match_len,
        total_chars,
        window.max(match_len),
    );
    byte_offset(text, start)..byte_offset(text, end)
}

fn contains(outer: &Range<usize>, inner: &Range<usize>) -> bool {
    inner.start >= outer.start && inner.end <= outer.end
}

/// Character bounds of a `window`-wide range around a match, clamped to the text.
fn centre_window(match_start: usize, match_len: usize, total: usize, window: usize) -> (usize, usize) {
    if total <= window {
        return (0, total);
    }
    let lead = window.saturating_sub(match_len) / 2;
    let start = match_start.saturating_sub(lead);
    let end = (start + window).min(total);
    (end.saturating_sub(window), end)
}

/// Union of overlapping ranges, in order.
fn merge_overlapping(mut ranges: Vec<Range<usize>>) -> Vec<Range<usize>> {
    ranges.sort_by_key(|r| (r.start, r.end));
    let mut merged: Vec<Range<usize>> = Vec::with_capacity(ranges.len());
    for range in ranges {
        match merged.last_mut() {
            Some(last) if range.start <= last.end => last.end = last.end.max(range.end),
            _ => merged.push(range),
        }
    }
    merged
}

fn plain_span(text: &str) -> Option<PreviewSpan> {
    (!text.is_empty()).then(|| PreviewSpan {
        text: text.to_string(),
        highlighted: false,
    })
}

fn byte_offset(text: &str, char_index: usize) -> usize {
    text.char_indices()
        .nth(char_index)
        .map_or(text.len(), |(offset, _)| offset)
}
