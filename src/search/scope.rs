//! Version scoping of ranked results.

use ahash::AHashSet;

use crate::types::{SearchResult, SearchScope};

/// Streaming filter applied to results in rank order.
///
/// Under [`SearchScope::Current`] only results from the active version pass. Under
/// [`SearchScope::All`] every version passes, but a section that appears under several
/// versions (same document title and heading) is kept only once: the first, best-ranked
/// instance wins.
#[derive(Debug)]
pub struct ScopeFilter<'a> {
    scope: SearchScope,
    current_version: &'a str,
    category: Option<&'a str>,
    seen: AHashSet<(String, String)>,
}

impl<'a> ScopeFilter<'a> {
    pub fn new(scope: SearchScope, current_version: &'a str) -> Self {
        Self {
            scope,
            current_version,
            category: None,
            seen: AHashSet::default(),
        }
    }

    /// Additionally require results to belong to `category`.
    pub fn with_category(mut self, category: Option<&'a str>) -> Self {
        self.category = category;
        self
    }

    /// Whether the next result in rank order should be kept.
    pub fn admit(
        &mut self,
        version: &str,
        category: &str,
        title: &str,
        heading: Option<&str>,
    ) -> bool {
        if self.category.is_some_and(|wanted| wanted != category) {
            return false;
        }

        match self.scope {
            SearchScope::Current => version == self.current_version,
            SearchScope::All => self.seen.insert((
                title.trim().to_lowercase(),
                heading.unwrap_or_default().trim().to_lowercase(),
            )),
        }
    }
}

/// Apply scope rules to already-ranked results.
pub fn filter(
    results: Vec<SearchResult>,
    scope: SearchScope,
    current_version: &str,
) -> Vec<SearchResult> {
    let mut scope_filter = ScopeFilter::new(scope, current_version);
    results
        .into_iter()
        .filter(|r| {
            scope_filter.admit(
                &r.document.version,
                &r.document.category,
                &r.document.title,
                r.chunk.heading.as_deref(),
            )
        })
        .collect()
}
