//! Edit-distance expansion of query terms against the indexed vocabulary.

use rapidfuzz::distance::levenshtein;

/// Score discount per edit for fuzzy-expanded terms.
const EDIT_DISTANCE_PENALTY: f64 = 0.2;

/// Floor for the fuzzy discount so distant matches still rank above nothing.
const MIN_FUZZY_PENALTY: f64 = 0.2;

/// An indexed term within range of a query term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuzzyCandidate {
    pub term: String,
    pub distance: usize,
}

impl FuzzyCandidate {
    /// Multiplier applied to the candidate's score contribution.
    pub fn penalty(&self) -> f64 {
        EDIT_DISTANCE_PENALTY
            .mul_add(-(self.distance as f64), 1.0)
            .max(MIN_FUZZY_PENALTY)
    }
}

/// Map a proportional threshold to an absolute edit distance: `round(threshold × len)`.
///
/// The threshold is clamped to `[0, 1]`; longer terms tolerate more edits.
pub fn max_edit_distance(threshold: f64, term: &str) -> usize {
    let len = term.chars().count() as f64;
    (threshold.clamp(0.0, 1.0) * len).round() as usize
}

/// All of `indexed_terms` within `max_distance` edits of `term`, ordered by increasing
/// distance then alphabetically.
pub fn expand(indexed_terms: &[String], term: &str, max_distance: usize) -> Vec<FuzzyCandidate> {
    let term_len = term.chars().count();

    let mut candidates: Vec<FuzzyCandidate> = indexed_terms
        .iter()
        .filter_map(|candidate| {
            // Length difference is a lower bound on edit distance
            let len = candidate.chars().count();
            if len.abs_diff(term_len) > max_distance {
                return None;
            }

            let distance = levenshtein::distance(term.chars(), candidate.chars());
            (distance <= max_distance).then(|| FuzzyCandidate {
                term: candidate.clone(),
                distance,
            })
        })
        .collect();

    candidates.sort_by(|a, b| a.distance.cmp(&b.distance).then_with(|| a.term.cmp(&b.term)));
    candidates
}
