//! Query parsing: turns raw query text into the distinct terms the engine looks up.

use ahash::AHashSet;

use super::tokenize::Tokenizer;

/// One distinct query term with the index keys to try for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct QueryTerm {
    /// Stemmed form, the identity of the term within a query.
    pub(crate) term: String,
    /// Lookup keys in preference order: the stem, then the unstemmed surface word when
    /// it differs.
    pub(crate) forms: Vec<String>,
}

/// Tokenize `query` into distinct terms, in order of first appearance.
///
/// Stop words and one-character tokens are dropped by the tokenizer, so a query made only
/// of those parses to nothing.
pub(crate) fn parse(tokenizer: &Tokenizer, query: &str) -> Vec<QueryTerm> {
    let mut seen = AHashSet::new();
    tokenizer
        .tokens(query)
        .into_iter()
        .filter(|token| seen.insert(token.term.clone()))
        .map(|token| {
            let mut forms = vec![token.term.clone()];
            if token.surface != token.term {
                forms.push(token.surface);
            }
            QueryTerm {
                term: token.term,
                forms,
            }
        })
        .collect()
}
