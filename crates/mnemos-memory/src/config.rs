//! Runtime configuration for long-term memory

use crate::index::IndexSchema;
use crate::settings::MemorySettings;

/// System owner used when a memory is written without one
pub const SYSTEM_USER_ID: &str = "system";

/// Configuration for a [`LongTermMemory`](crate::LongTermMemory)
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryConfig {
    /// Search index name
    pub index_name: String,

    /// Key prefix for stored documents
    pub key_prefix: String,

    /// Embedding dimensionality the index is created with
    pub dimensions: usize,

    /// Cosine distance under which a new memory is a duplicate
    pub dedup_threshold: f32,

    /// Default cosine distance cutoff for retrieval
    pub retrieval_threshold: f32,

    /// Default number of memories returned by a query
    pub default_limit: usize,

    /// Owner injected when a write or query names none
    pub default_owner: String,
}

impl MemoryConfig {
    /// Create a configuration for the given index
    pub fn new(index_name: impl Into<String>, dimensions: usize) -> Self {
        Self {
            index_name: index_name.into(),
            dimensions,
            ..Self::default()
        }
    }

    /// Set the document key prefix
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// Set the embedding dimensionality
    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = dimensions;
        self
    }

    /// Set the duplicate distance threshold
    pub fn with_dedup_threshold(mut self, threshold: f32) -> Self {
        self.dedup_threshold = threshold;
        self
    }

    /// Set the default retrieval distance threshold
    pub fn with_retrieval_threshold(mut self, threshold: f32) -> Self {
        self.retrieval_threshold = threshold;
        self
    }

    /// Set the default result limit
    pub fn with_default_limit(mut self, limit: usize) -> Self {
        self.default_limit = limit;
        self
    }

    /// Set the default owner
    pub fn with_default_owner(mut self, owner_id: impl Into<String>) -> Self {
        self.default_owner = owner_id.into();
        self
    }

    /// Index schema implied by this configuration
    pub fn schema(&self) -> IndexSchema {
        IndexSchema::memories(&self.index_name, &self.key_prefix, self.dimensions)
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            index_name: "agent_memories".to_string(),
            key_prefix: "memory".to_string(),
            dimensions: 768,
            dedup_threshold: 0.1,
            retrieval_threshold: 0.1,
            default_limit: 5,
            default_owner: SYSTEM_USER_ID.to_string(),
        }
    }
}

impl From<&MemorySettings> for MemoryConfig {
    fn from(settings: &MemorySettings) -> Self {
        Self {
            index_name: settings.index_name.clone(),
            key_prefix: settings.key_prefix.clone(),
            dimensions: settings.embedding.dimensions,
            dedup_threshold: settings.dedup_threshold,
            retrieval_threshold: settings.retrieval_threshold,
            default_limit: settings.default_limit,
            default_owner: settings.default_owner.clone(),
        }
    }
}
