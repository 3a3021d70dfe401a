use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::search::Preview;

/// One documentation page as delivered by the content pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub category: String,
    pub version: String,
    #[serde(default)]
    pub url: String,
    pub body: String,
}

impl Document {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        version: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        let id = id.into();
        Self {
            url: format!("/{}", id),
            id,
            title: title.into(),
            category: String::new(),
            version: version.into(),
            body: body.into(),
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }
}

/// Which versions a query may return results from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchScope {
    /// Only the active documentation version.
    #[default]
    Current,
    /// Every indexed version, with cross-version duplicates collapsed.
    All,
}

/// Per-call query options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchOptions {
    /// Proportional edit-distance tolerance. `None` or `0` disables explicit fuzzy mode.
    pub fuzzy: Option<f64>,
    pub scope: SearchScope,
    /// Restrict results to a single documentation category.
    pub category: Option<String>,
    /// Overrides the engine's result cap for this call.
    pub limit: Option<usize>,
}

impl SearchOptions {
    pub fn fuzzy(mut self, threshold: f64) -> Self {
        self.fuzzy = Some(threshold);
        self
    }

    pub fn scope(mut self, scope: SearchScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Document fields surfaced alongside a hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentRef {
    pub id: String,
    pub title: String,
    pub category: String,
    pub url: String,
    pub version: String,
}

impl From<&Document> for DocumentRef {
    fn from(doc: &Document) -> Self {
        Self {
            id: doc.id.clone(),
            title: doc.title.clone(),
            category: doc.category.clone(),
            url: doc.url.clone(),
            version: doc.version.clone(),
        }
    }
}

/// The chunk a hit landed in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChunkRef {
    pub id: String,
    pub heading: Option<String>,
    pub order: u32,
}

/// A single ranked hit.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub document: DocumentRef,
    pub chunk: ChunkRef,
    pub score: f64,
    pub matched_terms: Vec<String>,
    pub preview: Preview,
    pub highlighted_preview: String,
}

/// Ranked hits for one query plus timing metadata.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResults {
    pub query: String,
    pub results: Vec<SearchResult>,
    /// Number of scoring chunks before scope filtering and the result cap.
    pub total_matches: usize,
    /// Whether fuzzy expansion contributed candidates.
    pub fuzzy_expanded: bool,
    pub generation: u64,
    pub elapsed: Duration,
}

/// Outcome of [`crate::SearchEngine::search`].
///
/// `NotReady` is deliberately distinct from an empty hit list so callers can render a
/// loading state instead of "no results".
#[derive(Debug, Clone)]
pub enum SearchOutcome {
    NotReady,
    EmptyQuery,
    Hits(Arc<SearchResults>),
}

impl SearchOutcome {
    pub const fn is_ready(&self) -> bool {
        !matches!(self, Self::NotReady)
    }

    /// Hits for a ready index; `None` while the index is being built.
    pub fn results(&self) -> Option<&[SearchResult]> {
        match self {
            Self::NotReady => None,
            Self::EmptyQuery => Some(&[]),
            Self::Hits(hits) => Some(&hits.results),
        }
    }

    /// A real "no results" answer from a ready index.
    pub fn is_no_match(&self) -> bool {
        matches!(self, Self::Hits(hits) if hits.results.is_empty())
    }
}
