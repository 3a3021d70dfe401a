//! Error handling types and utilities.

use thiserror::Error;

/// A specialized Result type for docsite-search operations.
pub type Result<T, E = SearchError> = std::result::Result<T, E>;

/// Hard failures surfaced to the caller.
///
/// Expected query outcomes (index not ready, empty query, no matches) are not errors;
/// see [`crate::SearchOutcome`].
#[derive(Debug, Error)]
pub enum SearchError {
    /// A posting refers to a chunk that is not part of the live corpus.
    #[error("corrupt search index: posting for term '{term}' refers to missing chunk {chunk}")]
    CorruptIndex { term: String, chunk: u32 },

    /// Engine configuration failed validation.
    #[error("invalid search configuration: {0}")]
    InvalidConfig(String),

    /// The corpus source could not deliver documents for a version.
    #[error("corpus for version '{version}' is unavailable")]
    CorpusUnavailable {
        version: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A newer corpus load started before this one finished; its documents were
    /// discarded.
    #[error("corpus load for version '{version}' was superseded by a newer load")]
    ReloadSuperseded { version: String },

    /// Serialized corpus or configuration could not be parsed.
    #[error("failed to parse {what}")]
    InvalidInput {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Error raised while ingesting a single document.
///
/// The indexer skips the offending document and keeps going.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IngestError {
    #[error("document has no identifier")]
    MissingId,
    #[error("document '{id}' has no version tag")]
    MissingVersion { id: String },
    #[error("document '{id}' has an empty body")]
    EmptyBody { id: String },
    #[error("document '{id}' appears more than once in version '{version}'")]
    DuplicateDocument { id: String, version: String },
}

/// Record of a document that was skipped during an index build.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct IngestDiagnostic {
    pub document_id: String,
    pub version: String,
    pub reason: String,
}

impl IngestDiagnostic {
    pub(crate) fn new(document_id: &str, version: &str, error: &IngestError) -> Self {
        Self {
            document_id: document_id.to_string(),
            version: version.to_string(),
            reason: error.to_string(),
        }
    }
}
