//! Similarity-based duplicate detection

use crate::error::{MnemosError, MnemosResult};
use crate::filter::{KindFilter, TagFilter};
use crate::index::RangeQuery;
use crate::record::{fields, MemoryKind};
use crate::store::{excerpt, LongTermMemory};
use tracing::{debug, error, info, warn};

/// Candidates fetched per duplicate check; hits outside the exact scope are
/// discarded, so more than one is needed
const DEDUP_CANDIDATES: usize = 5;

/// Check that a cosine distance threshold is usable
pub(crate) fn validate_threshold(threshold: f32) -> MnemosResult<()> {
    if threshold.is_finite() && (0.0..=2.0).contains(&threshold) {
        Ok(())
    } else {
        Err(MnemosError::validation(
            "threshold",
            "cosine distance must be within [0, 2]",
            threshold,
        ))
    }
}

pub(crate) fn validate_text(field: &str, text: &str) -> MnemosResult<()> {
    if text.trim().is_empty() {
        return Err(MnemosError::validation(field, "must not be empty", "\"\""));
    }
    Ok(())
}

impl LongTermMemory {
    /// Whether a memory similar to `content` already exists in scope
    ///
    /// Scope is the owner and kind, narrowed to `thread_id` when it is not blank. A
    /// memory within `threshold` cosine distance counts as similar. Errors
    /// from the embedding service or the index are returned, never read as
    /// "no duplicate".
    pub async fn exists_similar(
        &self,
        content: &str,
        kind: MemoryKind,
        owner_id: &str,
        thread_id: Option<&str>,
        threshold: f32,
    ) -> MnemosResult<bool> {
        validate_text("content", content)?;
        validate_threshold(threshold)?;

        let vector = self.embed_vector(content).await.map_err(|e| {
            error!(owner_id = %owner_id, error = %e, "Embedding failed during duplicate check");
            e
        })?;

        self.similar_in_scope(vector, content, kind, owner_id, thread_id, threshold)
            .await
    }

    /// Duplicate check against an already embedded `content`
    pub(crate) async fn similar_in_scope(
        &self,
        vector: Vec<f32>,
        content: &str,
        kind: MemoryKind,
        owner_id: &str,
        thread_id: Option<&str>,
        threshold: f32,
    ) -> MnemosResult<bool> {
        let thread_id = Self::resolve_thread(thread_id);
        let filter = TagFilter::scope(owner_id, &KindFilter::One(kind), thread_id);
        let query = RangeQuery::new(vector, filter, threshold)
            .with_limit(DEDUP_CANDIDATES)
            .with_return_fields(vec![
                fields::MEMORY_ID,
                fields::USER_ID,
                fields::MEMORY_TYPE,
                fields::THREAD_ID,
            ]);

        let hits = self.index.range_query(&query).await.map_err(|e| {
            error!(owner_id = %owner_id, error = %e, "Vector query failed during duplicate check");
            e
        })?;

        // Stores may match tags loosely; only an exact scope match is a duplicate
        let in_scope = hits.iter().find(|hit| {
            let exact = query.filter.matches_fields(&hit.fields);
            if !exact {
                warn!(key = %hit.key, owner_id = %owner_id, "Ignoring hit outside the exact scope");
            }
            exact
        });

        match in_scope {
            Some(hit) => {
                info!(
                    owner_id = %owner_id,
                    kind = %kind,
                    distance = hit.distance,
                    existing = %hit.key,
                    content = %excerpt(content),
                    "Similar memory found"
                );
                Ok(true)
            }
            None => {
                debug!(owner_id = %owner_id, kind = %kind, "No similar memory");
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_bounds() {
        assert!(validate_threshold(0.0).is_ok());
        assert!(validate_threshold(2.0).is_ok());
        assert!(validate_threshold(-0.1).is_err());
        assert!(validate_threshold(f32::NAN).is_err());
    }

    #[test]
    fn test_blank_text_is_rejected() {
        assert!(validate_text("content", "  \n").is_err());
        assert!(validate_text("content", "aisle").is_ok());
    }
}
