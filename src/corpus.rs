//! Corpus acquisition: where documents come from before they are indexed.

use futures::FutureExt;
use futures::future::BoxFuture;

use crate::error::{Result, SearchError};
use crate::types::Document;

/// A collaborator that delivers the document collection for a documentation version.
///
/// This is the engine's only asynchronous boundary; everything after the fetch runs to
/// completion without suspending.
pub trait CorpusSource: Send + Sync {
    /// Every document to index when `version` becomes the active version. Sources serving
    /// several versions should include all of them so scope "all" can search across.
    fn fetch<'a>(&'a self, version: &'a str) -> BoxFuture<'a, anyhow::Result<Vec<Document>>>;
}

/// An in-memory corpus that returns the same documents for every version.
#[derive(Debug, Clone, Default)]
pub struct StaticCorpus {
    documents: Vec<Document>,
}

impl StaticCorpus {
    pub const fn new(documents: Vec<Document>) -> Self {
        Self { documents }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        documents_from_json(json).map(Self::new)
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }
}

impl CorpusSource for StaticCorpus {
    fn fetch<'a>(&'a self, _version: &'a str) -> BoxFuture<'a, anyhow::Result<Vec<Document>>> {
        let documents = self.documents.clone();
        async move { Ok(documents) }.boxed()
    }
}

/// Parse a JSON array of documents as produced by the content pipeline.
pub fn documents_from_json(json: &str) -> Result<Vec<Document>> {
    serde_json::from_str(json).map_err(|source| SearchError::InvalidInput {
        what: "corpus",
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::{check, let_assert};

    const CORPUS: &str = r#"[
        {"id": "receptors", "title": "Receptors Guide", "category": "guides",
         "version": "v1", "url": "/v1/receptors", "body": "Receptors are stateless message handlers."},
        {"id": "dispatcher", "title": "Dispatcher Guide",
         "version": "v1", "body": "The dispatcher routes commands."}
    ]"#;

    #[test]
    fn test_documents_from_json() {
        let_assert!(Ok(documents) = documents_from_json(CORPUS));
        check!(documents.len() == 2);
        check!(documents[0].category == "guides");
        check!(documents[1].category.is_empty());
        check!(documents[1].url.is_empty());
    }

    #[test]
    fn test_documents_from_json_rejects_garbage() {
        let_assert!(Err(SearchError::InvalidInput { what, .. }) = documents_from_json("[{"));
        check!(what == "corpus");
    }

    #[tokio::test]
    async fn test_static_corpus_fetch() {
        let_assert!(Ok(corpus) = StaticCorpus::from_json(CORPUS));
        let_assert!(Ok(documents) = corpus.fetch("v2").await);
        check!(documents == corpus.documents());
    }
}
