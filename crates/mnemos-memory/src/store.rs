//! Long-term memory facade
//!
//! [`LongTermMemory`] owns the two service handles (vector index and
//! embedding provider) plus the configuration. Its operations are split by
//! concern: deduplication in `dedup`, writes in `writer`, queries in
//! `retriever`.

use crate::config::MemoryConfig;
use crate::embedding::EmbeddingProvider;
use crate::error::MnemosResult;
use crate::index::VectorIndex;
use crate::record::MemoryRecord;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{error, info};
use ulid::{Generator, Ulid};

/// Maximum characters of memory content written to logs
const LOG_EXCERPT_CHARS: usize = 80;

/// Outcome of a single write
#[derive(Debug, Clone, PartialEq)]
pub enum StoreOutcome {
    /// The memory was persisted
    Stored(MemoryRecord),

    /// A similar memory already exists for the same owner, kind and thread
    Skipped,

    /// The memory could not be persisted
    Failed {
        /// What went wrong
        reason: String,
    },
}

impl StoreOutcome {
    /// Whether a new record was written
    pub fn is_stored(&self) -> bool {
        matches!(self, StoreOutcome::Stored(_))
    }

    /// Whether the write was skipped as a duplicate
    pub fn is_skipped(&self) -> bool {
        matches!(self, StoreOutcome::Skipped)
    }

    /// The written record, if any
    pub fn record(&self) -> Option<&MemoryRecord> {
        match self {
            StoreOutcome::Stored(record) => Some(record),
            _ => None,
        }
    }
}

/// Long-term memory for agents
///
/// `Send + Sync`; share it behind an `Arc`. Writes are check-then-act: two
/// concurrent writers of the same content may both pass the duplicate check.
pub struct LongTermMemory {
    pub(crate) index: Arc<dyn VectorIndex>,
    pub(crate) embedder: Arc<dyn EmbeddingProvider>,
    pub(crate) config: MemoryConfig,
    ids: Mutex<Generator>,
}

impl LongTermMemory {
    /// Create a memory over the given index and embedding provider
    pub fn new(
        index: Arc<dyn VectorIndex>,
        embedder: Arc<dyn EmbeddingProvider>,
        config: MemoryConfig,
    ) -> Self {
        Self {
            index,
            embedder,
            config,
            ids: Mutex::new(Generator::new()),
        }
    }

    /// Create or recreate the search index
    ///
    /// Failures are logged and swallowed; later operations surface the
    /// problem if the index is really unusable.
    pub async fn ensure_index(&self) {
        let schema = self.config.schema();
        match self.index.create(&schema, true).await {
            Ok(()) => info!(
                index = %schema.name,
                backend = %self.index.name(),
                dimensions = self.config.dimensions,
                "Long-term memory index ready"
            ),
            Err(e) => error!(
                index = %schema.name,
                backend = %self.index.name(),
                error = %e,
                "Error creating long-term memory index"
            ),
        }
    }

    /// Active configuration
    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    /// Underlying vector index
    pub fn index(&self) -> &Arc<dyn VectorIndex> {
        &self.index
    }

    /// Underlying embedding provider
    pub fn embedder(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedder
    }

    /// Next record id, strictly increasing for this instance
    pub(crate) fn next_id(&self) -> Ulid {
        // Overflow needs 2^80 ids in one millisecond
        self.ids.lock().generate().unwrap_or_else(|_| Ulid::new())
    }

    pub(crate) fn resolve_owner<'a>(&'a self, owner_id: Option<&'a str>) -> &'a str {
        owner_id
            .filter(|o| !o.trim().is_empty())
            .unwrap_or(self.config.default_owner.as_str())
    }

    /// Blank thread ids mean "no thread"
    pub(crate) fn resolve_thread(thread_id: Option<&str>) -> Option<&str> {
        thread_id.filter(|t| !t.trim().is_empty())
    }

    pub(crate) async fn embed_vector(&self, text: &str) -> MnemosResult<Vec<f32>> {
        Ok(self.embedder.embed(text).await?.into_vector())
    }
}

/// Truncate content for log lines
pub(crate) fn excerpt(content: &str) -> String {
    match content.char_indices().nth(LOG_EXCERPT_CHARS) {
        Some((cut, _)) => format!("{}...", &content[..cut]),
        None => content.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashEmbeddingProvider;
    use crate::index::InMemoryVectorIndex;

    fn memory() -> LongTermMemory {
        LongTermMemory::new(
            Arc::new(InMemoryVectorIndex::new()),
            Arc::new(HashEmbeddingProvider::new(16)),
            MemoryConfig::default().with_dimensions(16),
        )
    }

    #[test]
    fn test_ids_are_strictly_increasing() {
        let memory = memory();
        let ids: Vec<Ulid> = (0..100).map(|_| memory.next_id()).collect();
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_owner_resolution() {
        let memory = memory();
        assert_eq!(memory.resolve_owner(None), "system");
        assert_eq!(memory.resolve_owner(Some("  ")), "system");
        assert_eq!(memory.resolve_owner(Some("u1")), "u1");
    }

    #[test]
    fn test_thread_resolution() {
        assert_eq!(LongTermMemory::resolve_thread(None), None);
        assert_eq!(LongTermMemory::resolve_thread(Some("")), None);
        assert_eq!(LongTermMemory::resolve_thread(Some(" \t")), None);
        assert_eq!(LongTermMemory::resolve_thread(Some("t1")), Some("t1"));
    }

    #[test]
    fn test_excerpt() {
        assert_eq!(excerpt("short"), "short");
        let long = "é".repeat(100);
        let cut = excerpt(&long);
        assert!(cut.ends_with("..."));
        assert_eq!(cut.chars().count(), LOG_EXCERPT_CHARS + 3);
    }

    #[tokio::test]
    async fn test_ensure_index_creates_schema() {
        let index = Arc::new(InMemoryVectorIndex::new());
        let memory = LongTermMemory::new(
            index.clone(),
            Arc::new(HashEmbeddingProvider::new(16)),
            MemoryConfig::default().with_dimensions(16),
        );
        memory.ensure_index().await;
        assert_eq!(index.schema().and_then(|s| s.dimensions()), Some(16));
    }
}
