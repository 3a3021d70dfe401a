//! Shared test fixtures and utilities for integration tests.
//!
//! # Available Fixtures
//!
//! - `guide_corpus`: the two-document receptor/dispatcher corpus, version `v1`
//! - `versioned_corpus`: the same "Lenses" page published under `v1` and `v2`
//! - `ready_engine`: an engine with `guide_corpus` indexed and `v1` active
//!
//! Every fixture builds fresh state, so tests never share an engine or its query cache.

use docsite_search::{Document, SearchEngine, SearchOutcome};
use rstest::fixture;

#[fixture]
pub fn guide_corpus() -> Vec<Document> {
    docsite_search::tracing::init();
    vec![
        Document::new(
            "receptors",
            "Receptors Guide",
            "v1",
            "Receptors are stateless message handlers.",
        )
        .with_category("guides"),
        Document::new(
            "dispatcher",
            "Dispatcher Guide",
            "v1",
            "The dispatcher routes commands.",
        )
        .with_category("guides"),
    ]
}

#[fixture]
pub fn versioned_corpus() -> Vec<Document> {
    docsite_search::tracing::init();
    ["v1", "v2"]
        .into_iter()
        .map(|version| {
            Document::new(
                "lenses",
                "Lenses",
                version,
                "Lenses focus on a slice of state. Compose lenses to reach nested data.",
            )
            .with_url(format!("/{}/lenses", version))
        })
        .collect()
}

#[fixture]
pub fn ready_engine(guide_corpus: Vec<Document>) -> SearchEngine {
    let engine = SearchEngine::default();
    engine.build_index(guide_corpus, "v1");
    engine
}

/// Document ids of the results, in rank order. Empty for `NotReady`.
#[allow(dead_code)] // Used across different integration test crates
pub fn result_ids(outcome: &SearchOutcome) -> Vec<String> {
    outcome
        .results()
        .unwrap_or_default()
        .iter()
        .map(|r| r.document.id.clone())
        .collect()
}

/// A multi-section corpus large enough to exercise ranking ties and caps.
#[allow(dead_code)] // Used across different integration test crates
pub fn handbook() -> Vec<Document> {
    vec![
        Document::new(
            "routing",
            "Routing",
            "v2",
            "Routes map paths to handlers.\n\n## Route guards\nGuards run before a route handler.\n\n## Nested routes\nNested routes inherit guards from their parent route.\n",
        )
        .with_category("guides"),
        Document::new(
            "handlers",
            "Message Handlers",
            "v2",
            "Handlers receive messages from the dispatcher.\n\n## Error handling\nA handler may return an error; the dispatcher logs it.\n",
        )
        .with_category("api"),
        Document::new(
            "state",
            "State",
            "v2",
            "State lives in stores. Lenses focus on part of a store.\n\n```text\n# not a heading, just a comment in a code block\n```\n",
        )
        .with_category("guides"),
        Document::new(
            "routing",
            "Routing",
            "v1",
            "Routes map paths to handlers.\n\n## Route guards\nGuards run before a route handler.\n",
        )
        .with_category("guides"),
    ]
}
