//! Filtered similarity search over stored memories

use crate::dedup::{validate_text, validate_threshold};
use crate::embedding::SearchResult;
use crate::error::MnemosResult;
use crate::filter::{KindFilter, TagFilter};
use crate::index::RangeQuery;
use crate::record::{MemoryKind, MemoryRecord};
use crate::store::LongTermMemory;
use tracing::{debug, warn};

/// A retrieval request
///
/// Unset fields fall back to the memory's configuration: owner to the
/// default owner, threshold to the retrieval threshold, limit to the default
/// limit.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryQuery {
    /// Text to search for
    pub text: String,

    /// Kinds to include
    pub kinds: KindFilter,

    /// Owner whose memories are searched
    pub owner_id: Option<String>,

    /// Restrict to one conversation thread
    pub thread_id: Option<String>,

    /// Maximum cosine distance of a result
    pub threshold: Option<f32>,

    /// Maximum number of results
    pub limit: Option<usize>,
}

impl MemoryQuery {
    /// Query any kind of memory for `text`
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kinds: KindFilter::Any,
            owner_id: None,
            thread_id: None,
            threshold: None,
            limit: None,
        }
    }

    /// Restrict to a single kind
    pub fn with_kind(mut self, kind: MemoryKind) -> Self {
        self.kinds = KindFilter::One(kind);
        self
    }

    /// Restrict to a set of kinds
    pub fn with_kinds(mut self, kinds: impl Into<KindFilter>) -> Self {
        self.kinds = kinds.into();
        self
    }

    /// Search another owner's memories
    pub fn with_owner(mut self, owner_id: impl Into<String>) -> Self {
        self.owner_id = Some(owner_id.into());
        self
    }

    /// Restrict to a thread
    pub fn with_thread(mut self, thread_id: impl Into<String>) -> Self {
        self.thread_id = Some(thread_id.into());
        self
    }

    /// Override the distance threshold
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = Some(threshold);
        self
    }

    /// Override the result limit
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

impl LongTermMemory {
    /// Memories relevant to the query, nearest first
    pub async fn retrieve(&self, query: &MemoryQuery) -> MnemosResult<Vec<MemoryRecord>> {
        Ok(self
            .retrieve_scored(query)
            .await?
            .into_iter()
            .map(|result| result.item)
            .collect())
    }

    /// Memories relevant to the query with their distances, nearest first
    pub async fn retrieve_scored(
        &self,
        query: &MemoryQuery,
    ) -> MnemosResult<Vec<SearchResult<MemoryRecord>>> {
        validate_text("text", &query.text)?;
        let threshold = query.threshold.unwrap_or(self.config.retrieval_threshold);
        validate_threshold(threshold)?;

        let limit = query.limit.unwrap_or(self.config.default_limit);
        if limit == 0 {
            return Ok(Vec::new());
        }

        let owner_id = self.resolve_owner(query.owner_id.as_deref());
        let vector = self.embed_vector(&query.text).await?;
        let thread_id = Self::resolve_thread(query.thread_id.as_deref());
        let filter = TagFilter::scope(owner_id, &query.kinds, thread_id);
        debug!(
            owner_id = %owner_id,
            filter = %filter.to_query_string(),
            threshold,
            limit,
            "Retrieving memories"
        );

        let range = RangeQuery::new(vector, filter, threshold).with_limit(limit);
        let hits = self.index.range_query(&range).await?;

        let mut results: Vec<SearchResult<MemoryRecord>> = hits
            .iter()
            .filter_map(|hit| match MemoryRecord::from_hit(hit) {
                Ok(_) if !range.filter.matches_fields(&hit.fields) => {
                    warn!(
                        key = %hit.key,
                        owner_id = %owner_id,
                        "Dropping memory outside the requested scope"
                    );
                    None
                }
                Ok(record) => Some(SearchResult::from_distance(record, hit.distance)),
                Err(e) => {
                    warn!(key = %hit.key, error = %e, "Skipping unreadable memory");
                    None
                }
            })
            .collect();

        results.sort_by(|a, b| {
            let (a, b) = (a.distance.unwrap_or(f32::MAX), b.distance.unwrap_or(f32::MAX));
            a.total_cmp(&b)
        });
        results.truncate(limit);

        debug!(owner_id = %owner_id, count = results.len(), "Retrieved memories");
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_builder() {
        let query = MemoryQuery::new("seat preference")
            .with_kind(MemoryKind::Episodic)
            .with_owner("u1")
            .with_limit(3);

        assert_eq!(query.kinds, KindFilter::One(MemoryKind::Episodic));
        assert_eq!(query.owner_id.as_deref(), Some("u1"));
        assert_eq!(query.limit, Some(3));
        assert_eq!(query.threshold, None);

        let query = query.with_kinds(vec![MemoryKind::Episodic, MemoryKind::Semantic]);
        assert!(query.kinds.allows(MemoryKind::Semantic));
    }
}
