//! Prefix completions drawn from the indexed vocabulary.

use super::tokenize::normalize;

/// Up to `max_results` vocabulary words starting with `partial`.
///
/// Matching is case- and diacritic-insensitive. Words are ranked by corpus frequency,
/// then shorter first, then alphabetically, so repeated calls against the same corpus
/// return the same list.
pub fn suggest(vocabulary: &[(String, u32)], partial: &str, max_results: usize) -> Vec<String> {
    let prefix = normalize(partial.trim());
    if prefix.is_empty() || max_results == 0 {
        return vec![];
    }

    // Vocabulary is sorted, so prefix matches form one contiguous run
    let first = vocabulary.partition_point(|(word, _)| word.as_str() < prefix.as_str());
    let mut matches: Vec<&(String, u32)> = vocabulary[first..]
        .iter()
        .take_while(|(word, _)| word.starts_with(&prefix))
        .collect();

    matches.sort_by(|(a, fa), (b, fb)| {
        fb.cmp(fa)
            .then_with(|| a.chars().count().cmp(&b.chars().count()))
            .then_with(|| a.cmp(b))
    });

    matches
        .into_iter()
        .take(max_results)
        .map(|(word, _)| word.clone())
        .collect()
}
