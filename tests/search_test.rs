mod common;

use assert2::{check, let_assert};
use common::{guide_corpus, handbook, ready_engine, result_ids, versioned_corpus};
use docsite_search::{
    Document, EngineConfig, SearchEngine, SearchOptions, SearchOutcome, SearchScope,
    search::Tokenizer,
};
use rstest::rstest;

// --- Literal scenarios ---

/// Test: an exact term finds the one document that contains it.
#[rstest]
fn exact_term_finds_single_document(ready_engine: SearchEngine) {
    let options = SearchOptions::default().scope(SearchScope::Current);
    let_assert!(Ok(outcome) = ready_engine.search("receptor", &options));
    let_assert!(Some([result]) = outcome.results());

    check!(result.document.id == "receptors");
    check!(result.document.title == "Receptors Guide");
    check!(result.score > 0.0);
    check!(result.matched_terms == vec!["receptor"]);
    check!(result.highlighted_preview.contains("<mark>Receptors</mark>"));
}

/// Test: a misspelled term with fuzzy enabled reaches the same document.
#[rstest]
fn fuzzy_query_recovers_typo(ready_engine: SearchEngine) {
    let_assert!(Ok(exact) = ready_engine.search("receptor", &SearchOptions::default()));
    let_assert!(Ok(fuzzy) = ready_engine.search("recptor", &SearchOptions::default().fuzzy(0.4)));

    check!(result_ids(&fuzzy) == result_ids(&exact));
    let_assert!(SearchOutcome::Hits(hits) = fuzzy);
    check!(hits.fuzzy_expanded);
    check!(hits.results[0].matched_terms == vec!["receptor"]);
}

/// Test: an empty query short-circuits before readiness is even consulted.
#[rstest]
#[case("")]
#[case("   \t")]
fn empty_query_returns_nothing(#[case] query: &str) {
    let engine = SearchEngine::default();
    let_assert!(Ok(outcome) = engine.search(query, &SearchOptions::default()));
    check!(matches!(outcome, SearchOutcome::EmptyQuery));
    check!(outcome.results().is_some_and(<[_]>::is_empty));
}

/// Test: querying before the first build reports "not ready", not "no results".
#[test]
fn query_before_build_is_not_ready() {
    let engine = SearchEngine::default();
    let_assert!(Ok(outcome) = engine.search("dispatcher", &SearchOptions::default()));
    check!(!outcome.is_ready());
    check!(!outcome.is_no_match());
    check!(outcome.results().is_none());
}

/// Test: the same page in two versions comes back once under scope "all".
#[rstest]
fn all_scope_collapses_version_duplicates(versioned_corpus: Vec<Document>) {
    let engine = SearchEngine::default();
    engine.build_index(versioned_corpus, "v2");

    let options = SearchOptions::default().scope(SearchScope::All);
    let_assert!(Ok(SearchOutcome::Hits(hits)) = engine.search("lens", &options));
    check!(hits.results.len() == 1);
    check!(hits.total_matches == 2);
    check!(hits.results[0].document.title == "Lenses");
}

/// Test: prefix suggestions come from indexed words.
#[rstest]
fn auto_suggest_completes_prefix(ready_engine: SearchEngine) {
    check!(ready_engine.auto_suggest("di") == vec!["dispatcher"]);
    check!(ready_engine.auto_suggest("xyz").is_empty());
}

// --- Properties ---

#[rstest]
#[case("dispatcher routes")]
#[case("guide")]
#[case("handlers messages")]
fn search_is_deterministic(#[case] query: &str) {
    let engine = SearchEngine::default();
    engine.build_index(handbook(), "v2");
    let options = SearchOptions::default().scope(SearchScope::All);

    let_assert!(Ok(first) = engine.search(query, &options));
    engine.clear();
    let_assert!(Ok(second) = engine.search(query, &options));

    let scores = |outcome: &SearchOutcome| -> Vec<(String, String, u64)> {
        outcome
            .results()
            .unwrap_or_default()
            .iter()
            .map(|r| (r.document.id.clone(), r.chunk.id.clone(), r.score.to_bits()))
            .collect()
    };
    check!(scores(&first) == scores(&second));
}

/// Test: a chunk matching every query term outranks one matching a subset.
#[test]
fn more_query_terms_rank_higher() {
    let engine = SearchEngine::default();
    engine.build_index(
        vec![
            Document::new("one", "Alpha", "v1", "dispatcher dispatcher dispatcher"),
            Document::new("both", "Beta", "v1", "dispatcher routes"),
        ],
        "v1",
    );
    let_assert!(Ok(outcome) = engine.search("dispatcher routes", &SearchOptions::default()));
    check!(result_ids(&outcome) == vec!["both", "one"]);
    let_assert!(Some(results) = outcome.results());
    check!(results[0].score >= results[1].score);
}

/// Test: title matches outrank body-only matches.
#[test]
fn title_match_ranks_above_body_match() {
    let engine = SearchEngine::default();
    engine.build_index(
        vec![
            Document::new("body", "Overview", "v1", "Talks about routing in passing."),
            Document::new("title", "Routing", "v1", "How requests find handlers."),
        ],
        "v1",
    );
    let_assert!(Ok(outcome) = engine.search("routing", &SearchOptions::default()));
    check!(result_ids(&outcome) == vec!["title", "body"]);
}

/// Test: every matched term is marked in its result's preview.
#[rstest]
#[case("dispatcher")]
#[case("route guards")]
#[case("handler")]
#[case("lenses")]
fn matched_terms_are_highlighted(#[case] query: &str) {
    let engine = SearchEngine::default();
    engine.build_index(handbook(), "v2");

    let_assert!(Ok(outcome) = engine.search(query, &SearchOptions::default()));
    let_assert!(Some(results) = outcome.results());
    check!(!results.is_empty());

    for result in results {
        let marked: Vec<String> = result.preview.highlighted().map(str::to_lowercase).collect();
        for term in &result.matched_terms {
            check!(
                marked.iter().any(|word| word.contains(term.as_str())),
                "term {} not marked in {}",
                term,
                result.highlighted_preview
            );
        }
        check!(result.highlighted_preview.contains("<mark>"));
    }
}

/// Test: scope "current" never leaks other versions.
#[rstest]
#[case("v1")]
#[case("v2")]
fn current_scope_respects_version(#[case] version: &str) {
    let engine = SearchEngine::default();
    engine.build_index(handbook(), version);

    let_assert!(Ok(outcome) = engine.search("route", &SearchOptions::default()));
    let_assert!(Some(results) = outcome.results());
    check!(!results.is_empty());
    check!(results.iter().all(|r| r.document.version == version));
}

/// Test: scope "all" spans versions but collapses each section to one instance.
#[test]
fn all_scope_spans_versions_without_duplicates() {
    let engine = SearchEngine::default();
    engine.build_index(handbook(), "v2");

    let options = SearchOptions::default().scope(SearchScope::All);
    let_assert!(Ok(outcome) = engine.search("guards", &options));
    let_assert!(Some(results) = outcome.results());

    let mut sections: Vec<(String, Option<String>)> = results
        .iter()
        .map(|r| (r.document.title.to_lowercase(), r.chunk.heading.clone()))
        .collect();
    let before = sections.len();
    sections.sort();
    sections.dedup();
    check!(sections.len() == before);
}

/// Test: an unknown current version yields an empty list, not an error.
#[rstest]
fn unknown_version_is_no_match(guide_corpus: Vec<Document>) {
    let engine = SearchEngine::default();
    engine.build_index(guide_corpus, "v9");
    let_assert!(Ok(outcome) = engine.search("receptor", &SearchOptions::default()));
    check!(outcome.is_no_match());
}

/// Test: clear resets query state only.
#[rstest]
fn clear_is_idempotent_and_keeps_index(ready_engine: SearchEngine) {
    let_assert!(Ok(before) = ready_engine.search("dispatcher", &SearchOptions::default()));
    ready_engine.clear();
    ready_engine.clear();

    let_assert!(Ok(empty) = ready_engine.search("", &SearchOptions::default()));
    check!(empty.results().is_some_and(<[_]>::is_empty));
    check!(ready_engine.is_index_ready());

    let_assert!(Ok(after) = ready_engine.search("dispatcher", &SearchOptions::default()));
    check!(result_ids(&after) == result_ids(&before));
}

// --- Supplementary behaviour ---

/// Test: headings inside code fences do not create chunks.
#[test]
fn fenced_headings_do_not_split_chunks() {
    let engine = SearchEngine::default();
    let report = engine.build_index(handbook(), "v2");
    // routing v2: 3, handlers: 2, state: 1, routing v1: 2
    check!(report.chunks == 8);
    check!(report.skipped.is_empty());
}

/// Test: results can be restricted to one category.
#[test]
fn category_filter() {
    let engine = SearchEngine::default();
    engine.build_index(handbook(), "v2");

    let options = SearchOptions::default().category("api");
    let_assert!(Ok(outcome) = engine.search("handler", &options));
    let_assert!(Some(results) = outcome.results());
    check!(!results.is_empty());
    check!(results.iter().all(|r| r.document.category == "api"));
}

/// Test: the result cap bounds the returned list.
#[test]
fn result_cap_bounds_results() {
    let_assert!(Ok(engine) = SearchEngine::new(EngineConfig {
        result_cap: 1,
        ..EngineConfig::default()
    }));
    engine.build_index(handbook(), "v2");

    let_assert!(Ok(SearchOutcome::Hits(hits)) = engine.search("route", &SearchOptions::default()));
    check!(hits.results.len() == 1);
    check!(hits.total_matches > 1);
}

/// Test: custom markers flow through to the marked preview.
#[rstest]
fn custom_markers(guide_corpus: Vec<Document>) {
    let_assert!(Ok(config) = EngineConfig::from_json(r#"{"markers": {"open": "[[", "close": "]]"}}"#));
    let_assert!(Ok(engine) = SearchEngine::new(config));
    engine.build_index(guide_corpus, "v1");

    let_assert!(Ok(outcome) = engine.search("dispatcher", &SearchOptions::default()));
    let_assert!(Some([result]) = outcome.results());
    check!(result.highlighted_preview.contains("[[dispatcher]]"));
    check!(result.preview.plain_text().contains("The dispatcher routes commands."));
}

/// Test: matched terms far apart in one chunk are each marked in their own fragment.
#[test]
fn distant_terms_are_all_marked() {
    let body = format!("receptor {} dispatcher", "filler words here ".repeat(30));
    let engine = SearchEngine::default();
    engine.build_index(vec![Document::new("notes", "Notes", "v1", body)], "v1");

    let_assert!(Ok(outcome) = engine.search("receptor dispatcher", &SearchOptions::default()));
    let_assert!(Some([result]) = outcome.results());
    check!(result.matched_terms.len() == 2);

    let tokenizer = Tokenizer::new();
    for term in &result.matched_terms {
        check!(result.preview.marks(&tokenizer, term), "term {} not marked", term);
    }
    check!(result.highlighted_preview.contains("<mark>receptor</mark>"));
    check!(result.highlighted_preview.contains("<mark>dispatcher</mark>"));
    check!(result.highlighted_preview.contains(" ... "));
}

/// Test: a preview window narrower than the matched word still shows the whole word.
#[rstest]
fn narrow_window_keeps_whole_match(guide_corpus: Vec<Document>) {
    let config = EngineConfig {
        preview_window: 6,
        ..EngineConfig::default()
    };
    let_assert!(Ok(engine) = SearchEngine::new(config));
    engine.build_index(guide_corpus, "v1");

    let_assert!(Ok(outcome) = engine.search("dispatcher", &SearchOptions::default()));
    let_assert!(Some([result]) = outcome.results());
    check!(result.highlighted_preview.contains("<mark>dispatcher</mark>"));
}

/// Test: malformed documents are skipped without failing the build.
#[rstest]
fn malformed_documents_are_skipped(guide_corpus: Vec<Document>) {
    let mut documents = guide_corpus;
    documents.push(Document::new("", "Nameless", "v1", "orphan text"));
    documents.push(Document::new("blank", "Blank", "v1", "   "));

    let engine = SearchEngine::default();
    let report = engine.build_index(documents, "v1");
    check!(report.documents_indexed == 2);
    check!(report.skipped.len() == 2);
    check!(engine.is_index_ready());

    let_assert!(Ok(outcome) = engine.search("orphan", &SearchOptions::default()));
    check!(outcome.is_no_match());
}
