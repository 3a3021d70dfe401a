pub mod config;
pub mod corpus;
pub mod engine;
pub mod error;
pub mod search;
pub mod tracing;
pub mod types;

pub use config::EngineConfig;
pub use corpus::{CorpusSource, StaticCorpus, documents_from_json};
pub use engine::{IndexReport, IndexStats, SearchEngine};
pub use error::{IngestDiagnostic, IngestError, Result, SearchError};
pub use search::{HighlightMarkers, Preview, PreviewSpan};
pub use types::{
    ChunkRef, Document, DocumentRef, SearchOptions, SearchOutcome, SearchResult, SearchResults,
    SearchScope,
};
