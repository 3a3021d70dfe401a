//! Full-text search pipeline for documentation chunks.
//!
//! Text flows tokenizer → chunker → index builder at load time, and query parser →
//! index lookup (plus fuzzy expansion) → scorer → scope filter → highlighter at query
//! time. [`crate::SearchEngine`] drives both halves.

pub mod chunk;
pub mod fuzzy;
pub mod highlight;
pub mod index;
pub(crate) mod query;
pub mod scope;
pub mod scoring;
pub mod suggest;
pub mod tokenize;

pub use chunk::Chunk;
pub use fuzzy::FuzzyCandidate;
pub use highlight::{HighlightMarkers, Preview, PreviewSpan};
pub use index::{ChunkId, IndexBuilder, InvertedIndex, Posting};
pub use scoring::ScoringWeights;
pub use tokenize::{Token, Tokenizer};
