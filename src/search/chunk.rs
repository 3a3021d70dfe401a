//! Splits documents into heading-delimited chunks.
//!
//! A chunk is the unit of indexing and the granularity of search results. Markdown ATX
//! headings (`#` through `######`) start a new chunk; heading lines inside fenced code
//! blocks are ordinary text. Concatenating every chunk's `text` gives back the body with
//! the heading lines removed.

use regex::Regex;
use std::sync::LazyLock;

use crate::types::Document;

static HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^ {0,3}#{1,6}[ \t]+(.*?)(?:[ \t]+#+)?[ \t]*$").expect("valid heading regex")
});

/// An addressable section of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// `"{version}/{document id}#{order}"`, stable for the life of the corpus.
    pub id: String,
    pub document_id: String,
    /// Position of the chunk within its document, starting at 0.
    pub order: u32,
    /// Heading text that opened this chunk, if any.
    pub heading: Option<String>,
    pub text: String,
}

/// Split `document` into chunks at heading boundaries.
///
/// A body without headings yields a single chunk holding the whole body; an empty body
/// yields no chunks. Whitespace before the first heading is dropped rather than emitted
/// as its own chunk.
pub fn chunk(document: &Document) -> Vec<Chunk> {
    if document.body.is_empty() {
        return vec![];
    }

    let mut sections: Vec<(Option<String>, String)> = vec![(None, String::new())];
    let mut fence: Option<&str> = None;

    for line in document.body.split_inclusive('\n') {
        let content = line.trim_end_matches(['\n', '\r']);
        let trimmed = content.trim_start();

        if let Some(marker) = fence {
            if trimmed.starts_with(marker) {
                fence = None;
            }
        } else if trimmed.starts_with("```") {
            fence = Some("```");
        } else if trimmed.starts_with("~~~") {
            fence = Some("~~~");
        } else if let Some(captures) = HEADING.captures(content) {
            let heading = captures.get(1).map_or("", |m| m.as_str()).trim().to_string();
            sections.push((Some(heading), String::new()));
            continue;
        }

        if let Some((_, text)) = sections.last_mut() {
            text.push_str(line);
        }
    }

    // Leading whitespace before the first heading is not a section of its own
    if sections.len() > 1 && sections[0].1.trim().is_empty() {
        sections.remove(0);
    }

    sections
        .into_iter()
        .enumerate()
        .map(|(order, (heading, text))| Chunk {
            id: chunk_id(document, order as u32),
            document_id: document.id.clone(),
            order: order as u32,
            heading,
            text,
        })
        .collect()
}

fn chunk_id(document: &Document, order: u32) -> String {
    format!("{}/{}#{}", document.version, document.id, order)
}
