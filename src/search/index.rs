//! Inverted index over document chunks and the builder that populates it.

use ahash::{AHashMap, AHashSet};
use std::time::Instant;

use super::chunk::{Chunk, chunk};
use super::tokenize::{Token, Tokenizer, normalize};
use crate::error::{IngestDiagnostic, IngestError};
use crate::types::Document;

/// Dense chunk identifier, an index into the corpus chunk table.
pub type ChunkId = u32;

/// Occurrences of one term within one chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Posting {
    pub chunk: ChunkId,
    /// Occurrences in the chunk body.
    pub body_freq: u32,
    /// Occurrences in the chunk's title field (heading, plus document title for the
    /// first chunk).
    pub title_freq: u32,
    /// Word position of the first occurrence (title field first, then body).
    pub first_position: u32,
}

impl Posting {
    pub const fn in_title(&self) -> bool {
        self.title_freq > 0
    }
}

/// A chunk together with the data the query side needs about it.
#[derive(Debug, Clone)]
pub struct IndexedChunk {
    pub chunk: Chunk,
    /// Index into [`InvertedIndex::documents`].
    pub document: u32,
    /// Text indexed as the title field.
    pub title_field: String,
    /// Body length in characters.
    pub length: usize,
}

/// Read-only term → postings mapping for one corpus generation.
///
/// All mutation happens in [`IndexBuilder`]; a finished index is never patched.
#[derive(Debug, Default)]
pub struct InvertedIndex {
    /// Postings per stemmed term, ordered by chunk id, one per chunk.
    terms: AHashMap<String, Vec<Posting>>,
    /// Every indexed term, sorted.
    sorted_terms: Vec<String>,
    /// Surface words with their corpus frequency, sorted by word.
    vocabulary: Vec<(String, u32)>,
    documents: Vec<Document>,
    chunks: Vec<IndexedChunk>,
}

impl InvertedIndex {
    /// Postings for `term`, empty if the term is not indexed.
    pub fn lookup(&self, term: &str) -> &[Posting] {
        let key = normalize(term);
        self.terms.get(&key).map_or(&[], Vec::as_slice)
    }

    /// All indexed terms in lexicographic order.
    pub fn all_terms(&self) -> &[String] {
        &self.sorted_terms
    }

    /// Surface words and their corpus frequency, sorted by word.
    pub fn vocabulary(&self) -> &[(String, u32)] {
        &self.vocabulary
    }

    /// Inverse document frequency of `term` across chunks: `ln(1 + N / df)`.
    pub fn idf(&self, term: &str) -> f64 {
        let df = self.lookup(term).len();
        if df == 0 {
            return 0.0;
        }
        (1.0 + self.chunks.len() as f64 / df as f64).ln()
    }

    pub fn chunk(&self, id: ChunkId) -> Option<&IndexedChunk> {
        self.chunks.get(id as usize)
    }

    pub fn document(&self, index: u32) -> Option<&Document> {
        self.documents.get(index as usize)
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// Get the number of unique terms in the index
    pub fn term_count(&self) -> usize {
        self.terms.len()
    }

    /// Get the number of chunks in the index
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Get the number of documents in the index
    pub fn document_count(&self) -> usize {
        self.documents.len()
    }
}

/// Accumulates postings while a corpus is ingested.
pub struct IndexBuilder<'t> {
    tokenizer: &'t Tokenizer,
    terms: AHashMap<String, Vec<Posting>>,
    vocabulary: AHashMap<String, u32>,
    documents: Vec<Document>,
    chunks: Vec<IndexedChunk>,
    seen: AHashSet<(String, String)>,
    diagnostics: Vec<IngestDiagnostic>,
}

impl<'t> IndexBuilder<'t> {
    pub fn new(tokenizer: &'t Tokenizer) -> Self {
        Self {
            tokenizer,
            terms: AHashMap::default(),
            vocabulary: AHashMap::default(),
            documents: vec![],
            chunks: vec![],
            seen: AHashSet::default(),
            diagnostics: vec![],
        }
    }

    /// Ingest one document, or record why it was skipped.
    pub fn add_document(&mut self, document: Document) {
        if let Err(error) = self.try_add_document(document.clone()) {
            tracing::warn!(
                "Skipping document '{}' ({}): {}",
                document.id,
                document.version,
                error
            );
            self.diagnostics.push(IngestDiagnostic::new(
                &document.id,
                &document.version,
                &error,
            ));
        }
    }

    fn try_add_document(&mut self, document: Document) -> Result<(), IngestError> {
        validate(&document)?;

        let key = (document.version.clone(), document.id.clone());
        if !self.seen.insert(key) {
            return Err(IngestError::DuplicateDocument {
                id: document.id,
                version: document.version,
            });
        }

        let doc_index = self.documents.len() as u32;
        for chunk in chunk(&document) {
            self.add_chunk(&document, doc_index, chunk);
        }
        self.documents.push(document);
        Ok(())
    }

    fn add_chunk(&mut self, document: &Document, doc_index: u32, chunk: Chunk) {
        let chunk_id = self.chunks.len() as ChunkId;

        let title_field = match (&chunk.heading, chunk.order) {
            (Some(heading), 0) => format!("{}\n{}", document.title, heading),
            (Some(heading), _) => heading.clone(),
            (None, _) => document.title.clone(),
        };

        let title_tokens = self.tokenizer.tokens(&title_field);
        let body_tokens = self.tokenizer.tokens(&chunk.text);
        let title_len = title_tokens.last().map_or(0, |t| t.position + 1);

        // term → (body_freq, title_freq, first_position)
        let mut counts: AHashMap<String, (u32, u32, u32)> =
            AHashMap::with_capacity(title_tokens.len() + body_tokens.len());

        let mut record = |token: &Token, in_title: bool, offset: u32| {
            let entry = counts
                .entry(token.term.clone())
                .or_insert((0, 0, offset + token.position));
            if in_title {
                entry.1 += 1;
            } else {
                entry.0 += 1;
            }
        };
        for token in &title_tokens {
            record(token, true, 0);
        }
        for token in &body_tokens {
            record(token, false, title_len);
        }

        for token in title_tokens.iter().chain(&body_tokens) {
            *self.vocabulary.entry(token.surface.clone()).or_insert(0) += 1;
        }

        // Insert in sorted term order so posting lists stay deterministic
        let mut counts: Vec<_> = counts.into_iter().collect();
        counts.sort_by(|(a, _), (b, _)| a.cmp(b));
        for (term, (body_freq, title_freq, first_position)) in counts {
            self.terms.entry(term).or_default().push(Posting {
                chunk: chunk_id,
                body_freq,
                title_freq,
                first_position,
            });
        }

        self.chunks.push(IndexedChunk {
            length: chunk.text.chars().count(),
            chunk,
            document: doc_index,
            title_field,
        });
    }

    /// Documents skipped so far.
    pub fn diagnostics(&self) -> &[IngestDiagnostic] {
        &self.diagnostics
    }

    /// Produce the finished, read-only index and the ingestion diagnostics.
    pub fn finalize(self) -> (InvertedIndex, Vec<IngestDiagnostic>) {
        let start = Instant::now();
        let total_pairs: usize = self.terms.values().map(Vec::len).sum();

        let mut sorted_terms: Vec<String> = self.terms.keys().cloned().collect();
        sorted_terms.sort_unstable();

        let mut vocabulary: Vec<(String, u32)> = self.vocabulary.into_iter().collect();
        vocabulary.sort_unstable_by(|(a, _), (b, _)| a.cmp(b));

        let index = InvertedIndex {
            terms: self.terms,
            sorted_terms,
            vocabulary,
            documents: self.documents,
            chunks: self.chunks,
        };

        tracing::info!(
            "Built search index: {} unique terms, {} documents, {} chunks, {} term-chunk pairs in {:?}",
            index.term_count(),
            index.document_count(),
            index.chunk_count(),
            total_pairs,
            start.elapsed()
        );

        (index, self.diagnostics)
    }
}

fn validate(document: &Document) -> Result<(), IngestError> {
    if document.id.trim().is_empty() {
        return Err(IngestError::MissingId);
    }
    if document.version.trim().is_empty() {
        return Err(IngestError::MissingVersion {
            id: document.id.clone(),
        });
    }
    if document.body.trim().is_empty() {
        return Err(IngestError::EmptyBody {
            id: document.id.clone(),
        });
    }
    Ok(())
}

/// Build an index for `documents` in one pass.
pub fn build_index(
    tokenizer: &Tokenizer,
    documents: impl IntoIterator<Item = Document>,
) -> (InvertedIndex, Vec<IngestDiagnostic>) {
    let mut builder = IndexBuilder::new(tokenizer);
    for document in documents {
        builder.add_document(document);
    }
    builder.finalize()
}
