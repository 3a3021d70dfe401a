//! Relevance scoring and ranking order.
//!
//! Per matched query term a chunk earns
//! `idf · (sat(body_freq) + title_weight · sat(title_freq)) · penalty`, where `sat` is the
//! BM25 saturation curve and `penalty` discounts fuzzy expansions. The sum is scaled by
//! the fraction `f` of distinct query terms the chunk matched: `· f · (1 + bonus · f)`.
//! Every factor is non-decreasing in term frequency and in `f`, so a chunk matching a
//! superset of another chunk's terms at equal or higher frequency never scores lower.

use std::cmp::Ordering;

use super::index::{ChunkId, Posting};

/// BM25 term-frequency saturation constant.
const K1: f64 = 1.2;

/// Score multipliers, taken from the engine configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringWeights {
    pub title_weight: f64,
    pub coverage_bonus: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            title_weight: 3.0,
            coverage_bonus: 1.0,
        }
    }
}

/// The best match a chunk has for one query term.
#[derive(Debug, Clone, PartialEq)]
pub struct TermHit {
    /// Indexed term that matched.
    pub term: String,
    pub posting: Posting,
    pub idf: f64,
    /// 1.0 for exact matches, lower for fuzzy expansions.
    pub penalty: f64,
}

impl TermHit {
    /// Contribution of this hit to the chunk score.
    pub fn contribution(&self, weights: &ScoringWeights) -> f64 {
        let field = saturate(self.posting.body_freq)
            + weights.title_weight * saturate(self.posting.title_freq);
        self.idf * field * self.penalty
    }
}

fn saturate(freq: u32) -> f64 {
    if freq == 0 {
        return 0.0;
    }
    let tf = f64::from(freq);
    tf * (K1 + 1.0) / (tf + K1)
}

/// Score a chunk given its best hit per query term.
///
/// `hits` has one slot per distinct query term; `None` marks a term the chunk does not
/// contain. Returns 0 when nothing matched.
pub fn score(hits: &[Option<TermHit>], weights: &ScoringWeights) -> f64 {
    if hits.is_empty() {
        return 0.0;
    }

    let matched = hits.iter().flatten().count();
    if matched == 0 {
        return 0.0;
    }

    let raw: f64 = hits.iter().flatten().map(|h| h.contribution(weights)).sum();
    let coverage = matched as f64 / hits.len() as f64;
    raw * coverage * weights.coverage_bonus.mul_add(coverage, 1.0)
}

/// A scored chunk waiting to be ranked.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedChunk {
    pub chunk: ChunkId,
    pub score: f64,
    /// Total title-field occurrences of the matched terms.
    pub title_hits: u32,
    /// Body length in characters.
    pub length: usize,
    /// Determinism key: (document id, version, chunk order).
    pub key: (String, String, u32),
    pub matched_terms: Vec<String>,
}

/// Ranking order: score descending, then more title hits, then shorter chunks, then
/// document id / version / chunk order.
pub fn compare(a: &RankedChunk, b: &RankedChunk) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| b.title_hits.cmp(&a.title_hits))
        .then_with(|| a.length.cmp(&b.length))
        .then_with(|| a.key.cmp(&b.key))
}
