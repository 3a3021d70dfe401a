//! The query engine facade: owns the live index generation, gates queries on readiness
//! and runs the lookup → score → rank → scope → highlight pipeline.
//!
//! The live index is held as an immutable [`Snapshot`] behind an `Arc`. A rebuild swaps
//! the whole snapshot, so a query that already cloned the `Arc` finishes against the
//! generation it started with and never sees a half-built index.

use ahash::AHashMap;
use lru::LruCache;
use serde::Serialize;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::{Duration, Instant};
use tokio::sync::watch;

use crate::config::EngineConfig;
use crate::corpus::CorpusSource;
use crate::error::{IngestDiagnostic, Result, SearchError};
use crate::search::fuzzy;
use crate::search::highlight::{Preview, highlight};
use crate::search::index::{ChunkId, IndexedChunk, InvertedIndex, build_index};
use crate::search::query::{self, QueryTerm};
use crate::search::scope::ScopeFilter;
use crate::search::scoring::{self, RankedChunk, ScoringWeights, TermHit};
use crate::search::suggest::suggest;
use crate::search::tokenize::Tokenizer;
use crate::types::{
    ChunkRef, Document, DocumentRef, SearchOptions, SearchOutcome, SearchResult, SearchResults,
    SearchScope,
};

/// One complete, read-only index generation together with the active version.
#[derive(Debug)]
struct Snapshot {
    generation: u64,
    current_version: String,
    index: Arc<InvertedIndex>,
}

/// Summary of a finished index build.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexReport {
    pub generation: u64,
    pub documents_indexed: usize,
    pub chunks: usize,
    pub terms: usize,
    /// Documents that could not be ingested.
    pub skipped: Vec<IngestDiagnostic>,
    pub elapsed: Duration,
}

/// Counts for the live index generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexStats {
    pub generation: u64,
    pub current_version: String,
    pub documents: usize,
    pub chunks: usize,
    pub terms: usize,
}

/// Cache key: everything that can change the answer to a query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct QueryKey {
    generation: u64,
    current_version: String,
    query: String,
    fuzzy: Option<u64>,
    scope: SearchScope,
    category: Option<String>,
    limit: usize,
}

/// Candidate chunks with their best hit per query-term slot.
type Candidates = AHashMap<ChunkId, Vec<Option<TermHit>>>;

/// In-memory search engine for a versioned documentation corpus.
///
/// Queries are synchronous and may run concurrently from many threads; only index builds
/// are serialized.
pub struct SearchEngine {
    config: EngineConfig,
    tokenizer: Tokenizer,
    /// `None` while no complete index is available.
    live: RwLock<Option<Arc<Snapshot>>>,
    /// Most recently installed complete snapshot, restored when a load fails.
    last_complete: RwLock<Option<Arc<Snapshot>>>,
    readiness: watch::Sender<bool>,
    generation: AtomicU64,
    /// Ticket of the most recently started corpus load.
    loads: AtomicU64,
    build_lock: Mutex<()>,
    cache: Option<Mutex<LruCache<QueryKey, Arc<SearchResults>>>>,
}

impl std::fmt::Debug for SearchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchEngine")
            .field("ready", &self.is_index_ready())
            .field("generation", &self.generation.load(Ordering::Acquire))
            .field("has_cache", &self.cache.is_some())
            .finish()
    }
}

impl Default for SearchEngine {
    fn default() -> Self {
        Self::with_validated(EngineConfig::default())
    }
}

impl SearchEngine {
    /// Create an engine with a validated configuration. The index starts out not ready.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_validated(config))
    }

    fn with_validated(config: EngineConfig) -> Self {
        let (readiness, _) = watch::channel(false);
        let cache = NonZeroUsize::new(config.query_cache_size)
            .map(|capacity| Mutex::new(LruCache::new(capacity)));
        Self {
            cache,
            config,
            tokenizer: Tokenizer::new(),
            live: RwLock::new(None),
            last_complete: RwLock::new(None),
            readiness,
            generation: AtomicU64::new(0),
            loads: AtomicU64::new(0),
            build_lock: Mutex::new(()),
        }
    }

    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Whether a complete index is available for queries.
    pub fn is_index_ready(&self) -> bool {
        self.snapshot().is_some()
    }

    /// Subscribe to readiness transitions. The receiver is woken on every change between
    /// not ready and ready, never for a rebuild that leaves the state unchanged.
    pub fn readiness(&self) -> watch::Receiver<bool> {
        self.readiness.subscribe()
    }

    /// Index `documents` as a new corpus generation with `current_version` active.
    ///
    /// Readiness drops to false for the duration of the build and returns to true once the
    /// finished index is installed. Malformed documents are skipped and reported.
    pub fn build_index(
        &self,
        documents: impl IntoIterator<Item = Document>,
        current_version: &str,
    ) -> IndexReport {
        self.begin_load();
        let _build = self.build_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.rebuild(documents, current_version)
    }

    /// Build and install a new generation. Callers hold `build_lock`.
    fn rebuild(
        &self,
        documents: impl IntoIterator<Item = Document>,
        current_version: &str,
    ) -> IndexReport {
        let start = Instant::now();

        self.install(None);

        let (index, skipped) = build_index(&self.tokenizer, documents);
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        let report = IndexReport {
            generation,
            documents_indexed: index.document_count(),
            chunks: index.chunk_count(),
            terms: index.term_count(),
            skipped,
            elapsed: start.elapsed(),
        };

        self.install(Some(Arc::new(Snapshot {
            generation,
            current_version: current_version.to_string(),
            index: Arc::new(index),
        })));

        report
    }

    /// Rebuild for a newly activated version and its corpus.
    pub fn on_version_change(
        &self,
        version: &str,
        documents: impl IntoIterator<Item = Document>,
    ) -> IndexReport {
        tracing::info!("Active documentation version changed to '{}'", version);
        self.build_index(documents, version)
    }

    /// Fetch the corpus for `version` from `source` and rebuild.
    ///
    /// Readiness is false while the fetch is in flight. Only the most recently started
    /// load may install or restore an index:
    /// - a failed fetch reinstates the last complete generation and returns
    ///   [`SearchError::CorpusUnavailable`], unless a newer load has started, which then
    ///   owns readiness;
    /// - a fetch that completes after a newer load started is discarded with
    ///   [`SearchError::ReloadSuperseded`].
    pub async fn reload<S>(&self, source: &S, version: &str) -> Result<IndexReport>
    where
        S: CorpusSource + ?Sized,
    {
        let ticket = self.begin_load();
        self.install(None);

        let fetched = source.fetch(version).await;

        let _build = self.build_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let superseded = self.loads.load(Ordering::Acquire) != ticket;

        match fetched {
            Ok(_) if superseded => {
                tracing::debug!(
                    "Discarding corpus for version '{}': a newer load has started",
                    version
                );
                Err(SearchError::ReloadSuperseded {
                    version: version.to_string(),
                })
            }
            Ok(documents) => Ok(self.rebuild(documents, version)),
            Err(error) => {
                tracing::warn!("Failed to fetch corpus for version '{}': {:#}", version, error);
                if !superseded {
                    let restored = self
                        .last_complete
                        .read()
                        .unwrap_or_else(PoisonError::into_inner)
                        .clone();
                    self.install(restored);
                }
                Err(SearchError::CorpusUnavailable {
                    version: version.to_string(),
                    source: error.into(),
                })
            }
        }
    }

    /// Switch the active version without rebuilding the index.
    ///
    /// Returns false if no index is loaded.
    pub fn set_current_version(&self, version: &str) -> bool {
        let mut live = self.live.write().unwrap_or_else(PoisonError::into_inner);
        let Some(snapshot) = live.as_ref() else {
            return false;
        };
        let switched = Arc::new(Snapshot {
            generation: snapshot.generation,
            current_version: version.to_string(),
            index: Arc::clone(&snapshot.index),
        });
        *self
            .last_complete
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&switched));
        *live = Some(switched);
        true
    }

    /// Active version of the live index, if any.
    pub fn current_version(&self) -> Option<String> {
        self.snapshot().map(|s| s.current_version.clone())
    }

    /// Counts for the live index, if any.
    pub fn stats(&self) -> Option<IndexStats> {
        self.snapshot().map(|s| IndexStats {
            generation: s.generation,
            current_version: s.current_version.clone(),
            documents: s.index.document_count(),
            chunks: s.index.chunk_count(),
            terms: s.index.term_count(),
        })
    }

    /// Reset transient query state. The index and readiness are untouched.
    pub fn clear(&self) {
        if let Some(cache) = &self.cache {
            cache.lock().unwrap_or_else(PoisonError::into_inner).clear();
        }
    }

    /// Completions for a partially typed query, empty while the index is not ready.
    pub fn auto_suggest(&self, partial: &str) -> Vec<String> {
        self.snapshot().map_or_else(Vec::new, |s| {
            suggest(s.index.vocabulary(), partial, self.config.suggestion_limit)
        })
    }

    /// Run a query against the live index.
    ///
    /// Empty queries and a not-ready index are reported as [`SearchOutcome`] variants;
    /// only an internally inconsistent index is an error.
    pub fn search(&self, query: &str, options: &SearchOptions) -> Result<SearchOutcome> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(SearchOutcome::EmptyQuery);
        }

        let Some(snapshot) = self.snapshot() else {
            return Ok(SearchOutcome::NotReady);
        };

        let limit = options
            .limit
            .filter(|&limit| limit > 0)
            .unwrap_or(self.config.result_cap);
        let key = QueryKey {
            generation: snapshot.generation,
            current_version: snapshot.current_version.clone(),
            query: query.to_string(),
            fuzzy: options.fuzzy.map(f64::to_bits),
            scope: options.scope,
            category: options.category.clone(),
            limit,
        };

        if let Some(cached) = self.cached(&key) {
            tracing::debug!("Query '{}' served from cache", query);
            return Ok(SearchOutcome::Hits(cached));
        }

        let results = Arc::new(self.execute(&snapshot, query, options, limit)?);

        if let Some(cache) = &self.cache {
            cache
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .put(key, Arc::clone(&results));
        }

        Ok(SearchOutcome::Hits(results))
    }

    fn execute(
        &self,
        snapshot: &Snapshot,
        query: &str,
        options: &SearchOptions,
        limit: usize,
    ) -> Result<SearchResults> {
        let start = Instant::now();
        let index = &snapshot.index;
        let terms = query::parse(&self.tokenizer, query);

        let weights = self.config.weights();
        let mut candidates = exact_candidates(index, &terms, &weights);

        let explicit_fuzzy = options.fuzzy.filter(|&threshold| threshold > 0.0);
        let fuzzy_threshold = explicit_fuzzy.or_else(|| {
            (candidates.is_empty() && self.config.fallback_fuzzy > 0.0)
                .then_some(self.config.fallback_fuzzy)
        });
        let fuzzy_expanded = fuzzy_threshold.is_some_and(|threshold| {
            expand_unmatched(index, &terms, threshold, &weights, &mut candidates)
        });

        let mut ranked = rank(index, &candidates, &weights)?;
        ranked.sort_by(scoring::compare);
        let total_matches = ranked.len();

        let mut scope_filter = ScopeFilter::new(options.scope, &snapshot.current_version)
            .with_category(options.category.as_deref());
        let mut results = Vec::with_capacity(limit.min(total_matches));

        for candidate in ranked {
            if results.len() == limit {
                break;
            }
            let (indexed, document) = resolve(index, candidate.chunk, &candidate.matched_terms)?;
            if !scope_filter.admit(
                &document.version,
                &document.category,
                &document.title,
                indexed.chunk.heading.as_deref(),
            ) {
                continue;
            }

            let preview = self.preview(indexed, &candidate.matched_terms);
            results.push(SearchResult {
                document: DocumentRef::from(document),
                chunk: ChunkRef {
                    id: indexed.chunk.id.clone(),
                    heading: indexed.chunk.heading.clone(),
                    order: indexed.chunk.order,
                },
                score: candidate.score,
                highlighted_preview: preview.to_marked(&self.config.markers),
                preview,
                matched_terms: candidate.matched_terms,
            });
        }

        let elapsed = start.elapsed();
        tracing::debug!(
            "Query '{}': {} terms, {} candidates, {} returned in {:?} (fuzzy: {})",
            query,
            terms.len(),
            total_matches,
            results.len(),
            elapsed,
            fuzzy_expanded
        );

        Ok(SearchResults {
            query: query.to_string(),
            results,
            total_matches,
            fuzzy_expanded,
            generation: snapshot.generation,
            elapsed,
        })
    }

    /// Preview that marks every matched term: the body when it carries them all, else the
    /// title field when that does, else the title field and body together.
    fn preview(&self, indexed: &IndexedChunk, matched_terms: &[String]) -> Preview {
        let window = self.config.preview_window;
        let marks_all = |preview: &Preview| {
            matched_terms
                .iter()
                .all(|term| preview.marks(&self.tokenizer, term))
        };

        let body = highlight(&self.tokenizer, &indexed.chunk.text, matched_terms, window);
        if marks_all(&body) {
            return body;
        }
        let title = highlight(&self.tokenizer, &indexed.title_field, matched_terms, window);
        if marks_all(&title) {
            return title;
        }
        let combined = format!("{}\n{}", indexed.title_field, indexed.chunk.text);
        let both = highlight(&self.tokenizer, &combined, matched_terms, window);
        if both.has_highlights() { both } else { body }
    }

    fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.live
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn cached(&self, key: &QueryKey) -> Option<Arc<SearchResults>> {
        let cache = self.cache.as_ref()?;
        cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Start a corpus load, returning its ticket.
    fn begin_load(&self) -> u64 {
        self.loads.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Swap the live snapshot and publish the resulting readiness.
    fn install(&self, snapshot: Option<Arc<Snapshot>>) {
        if let Some(complete) = &snapshot {
            *self
                .last_complete
                .write()
                .unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(complete));
        }
        *self.live.write().unwrap_or_else(PoisonError::into_inner) = snapshot;
        self.publish_readiness();
    }

    fn publish_readiness(&self) {
        let ready = self.is_index_ready();
        self.readiness.send_if_modified(|current| {
            let changed = *current != ready;
            *current = ready;
            changed
        });
    }
}

/// Exact postings for every query term, trying each lookup form in turn.
fn exact_candidates(
    index: &InvertedIndex,
    terms: &[QueryTerm],
    weights: &ScoringWeights,
) -> Candidates {
    let mut candidates = Candidates::default();
    for (slot, term) in terms.iter().enumerate() {
        let Some(form) = term.forms.iter().find(|form| !index.lookup(form).is_empty()) else {
            continue;
        };
        let slot_hit = SlotHit {
            slots: terms.len(),
            slot,
            penalty: 1.0,
        };
        add_hits(index, form, slot_hit, weights, &mut candidates);
    }
    candidates
}

/// Expand every query term with no exact hit and merge the fuzzy hits in.
/// Returns whether any expansion matched.
fn expand_unmatched(
    index: &InvertedIndex,
    terms: &[QueryTerm],
    threshold: f64,
    weights: &ScoringWeights,
    candidates: &mut Candidates,
) -> bool {
    let mut expanded = false;
    for (slot, term) in terms.iter().enumerate() {
        if term.forms.iter().any(|form| !index.lookup(form).is_empty()) {
            continue;
        }
        let max_distance = fuzzy::max_edit_distance(threshold, &term.term);
        if max_distance == 0 {
            continue;
        }
        for candidate in fuzzy::expand(index.all_terms(), &term.term, max_distance) {
            let slot_hit = SlotHit {
                slots: terms.len(),
                slot,
                penalty: candidate.penalty(),
            };
            add_hits(index, &candidate.term, slot_hit, weights, candidates);
            expanded = true;
        }
    }
    expanded
}

/// Where a batch of postings lands among a query's term slots.
#[derive(Debug, Clone, Copy)]
struct SlotHit {
    slots: usize,
    slot: usize,
    penalty: f64,
}

/// Record `indexed`'s postings in the target slot, keeping each chunk's strongest hit
/// per slot.
fn add_hits(
    index: &InvertedIndex,
    indexed: &str,
    target: SlotHit,
    weights: &ScoringWeights,
    candidates: &mut Candidates,
) {
    let idf = index.idf(indexed);

    for posting in index.lookup(indexed) {
        let hit = TermHit {
            term: indexed.to_string(),
            posting: *posting,
            idf,
            penalty: target.penalty,
        };
        let hits = candidates
            .entry(posting.chunk)
            .or_insert_with(|| vec![None; target.slots]);
        let better = hits[target.slot]
            .as_ref()
            .is_none_or(|current| hit.contribution(weights) > current.contribution(weights));
        if better {
            hits[target.slot] = Some(hit);
        }
    }
}

/// Score every candidate chunk, dropping those that score zero.
fn rank(
    index: &InvertedIndex,
    candidates: &Candidates,
    weights: &ScoringWeights,
) -> Result<Vec<RankedChunk>> {
    let mut ranked = Vec::with_capacity(candidates.len());
    for (&chunk_id, hits) in candidates {
        let score = scoring::score(hits, weights);
        if score <= 0.0 {
            continue;
        }

        let mut matched_terms: Vec<String> = vec![];
        for hit in hits.iter().flatten() {
            if !matched_terms.contains(&hit.term) {
                matched_terms.push(hit.term.clone());
            }
        }

        let (indexed, document) = resolve(index, chunk_id, &matched_terms)?;
        ranked.push(RankedChunk {
            chunk: chunk_id,
            score,
            title_hits: hits.iter().flatten().map(|h| h.posting.title_freq).sum(),
            length: indexed.length,
            key: (document.id.clone(), document.version.clone(), indexed.chunk.order),
            matched_terms,
        });
    }
    Ok(ranked)
}

/// Look up a chunk and its document; a dangling reference means the index is corrupt.
fn resolve<'i>(
    index: &'i InvertedIndex,
    chunk_id: ChunkId,
    matched_terms: &[String],
) -> Result<(&'i IndexedChunk, &'i Document)> {
    let corrupt = || SearchError::CorruptIndex {
        term: matched_terms.first().cloned().unwrap_or_default(),
        chunk: chunk_id,
    };
    let indexed = index.chunk(chunk_id).ok_or_else(corrupt)?;
    let document = index.document(indexed.document).ok_or_else(corrupt)?;
    Ok((indexed, document))
}
