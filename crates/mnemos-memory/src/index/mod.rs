//! Vector index abstraction
//!
//! The vector store is an external collaborator reached through
//! [`VectorIndex`]: schema creation, JSON document insert and filtered
//! vector-range queries. [`InMemoryVectorIndex`] is a brute-force local
//! implementation; [`RedisVectorIndex`] talks to RediSearch.

mod memory;
#[cfg(feature = "redis-store")]
mod redis_store;

pub use memory::InMemoryVectorIndex;
#[cfg(feature = "redis-store")]
pub use redis_store::RedisVectorIndex;

use crate::error::MnemosResult;
use crate::filter::TagFilter;
use crate::record::fields;
use std::collections::HashMap;

/// Kind of a schema field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Full-text field
    Text,
    /// Exact-match tag field
    Tag,
    /// Float32 vector field using cosine distance
    Vector {
        /// Vector length
        dimensions: usize,
    },
}

/// One field of an index schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaField {
    /// Document field name
    pub name: &'static str,

    /// How the field is indexed
    pub kind: FieldKind,
}

/// Index definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSchema {
    /// Index name
    pub name: String,

    /// Key prefix documents live under (without separator)
    pub prefix: String,

    /// Indexed fields
    pub fields: Vec<SchemaField>,
}

impl IndexSchema {
    /// Schema for long-term memory documents
    pub fn memories(name: impl Into<String>, prefix: impl Into<String>, dimensions: usize) -> Self {
        let field = |name, kind| SchemaField { name, kind };
        Self {
            name: name.into(),
            prefix: prefix.into(),
            fields: vec![
                field(fields::CONTENT, FieldKind::Text),
                field(fields::MEMORY_TYPE, FieldKind::Tag),
                field(fields::METADATA, FieldKind::Text),
                field(fields::CREATED_AT, FieldKind::Text),
                field(fields::USER_ID, FieldKind::Tag),
                field(fields::MEMORY_ID, FieldKind::Tag),
                field(fields::THREAD_ID, FieldKind::Tag),
                field(fields::EMBEDDING, FieldKind::Vector { dimensions }),
            ],
        }
    }

    /// Dimensionality of the vector field, if any
    pub fn dimensions(&self) -> Option<usize> {
        self.fields.iter().find_map(|f| match f.kind {
            FieldKind::Vector { dimensions } => Some(dimensions),
            _ => None,
        })
    }

    /// Name of the vector field, if any
    pub fn vector_field(&self) -> Option<&'static str> {
        self.fields
            .iter()
            .find(|f| matches!(f.kind, FieldKind::Vector { .. }))
            .map(|f| f.name)
    }
}

/// Filtered nearest-neighbour query bounded by distance
#[derive(Debug, Clone)]
pub struct RangeQuery {
    /// Query vector
    pub vector: Vec<f32>,

    /// Scope filter applied before ranking
    pub filter: TagFilter,

    /// Maximum cosine distance of a hit
    pub distance_threshold: f32,

    /// Maximum number of hits
    pub num_results: usize,

    /// Fields to return with each hit
    pub return_fields: Vec<&'static str>,
}

impl RangeQuery {
    /// Create a query returning every memory field
    pub fn new(vector: Vec<f32>, filter: TagFilter, distance_threshold: f32) -> Self {
        Self {
            vector,
            filter,
            distance_threshold,
            num_results: 10,
            return_fields: fields::RETURNED.to_vec(),
        }
    }

    /// Cap the number of hits
    pub fn with_limit(mut self, num_results: usize) -> Self {
        self.num_results = num_results;
        self
    }

    /// Restrict the returned fields
    pub fn with_return_fields(mut self, return_fields: Vec<&'static str>) -> Self {
        self.return_fields = return_fields;
        self
    }
}

/// A raw hit as returned by the store, before record reconstruction
#[derive(Debug, Clone, PartialEq)]
pub struct IndexHit {
    /// Store key of the document
    pub key: String,

    /// Cosine distance to the query vector
    pub distance: f32,

    /// Returned fields, as strings
    pub fields: HashMap<String, String>,
}

impl IndexHit {
    /// Create a new hit
    pub fn new(key: impl Into<String>, distance: f32, fields: HashMap<String, String>) -> Self {
        Self {
            key: key.into(),
            distance,
            fields,
        }
    }

    /// Look up a returned field
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

/// Vector store operations used by long-term memory
#[async_trait::async_trait]
pub trait VectorIndex: Send + Sync {
    /// Create the index; with `overwrite` an existing definition is replaced
    async fn create(&self, schema: &IndexSchema, overwrite: bool) -> MnemosResult<()>;

    /// Insert a JSON document under `key`
    async fn insert(&self, key: &str, document: serde_json::Value) -> MnemosResult<()>;

    /// Hits within the query's distance threshold, nearest first
    async fn range_query(&self, query: &RangeQuery) -> MnemosResult<Vec<IndexHit>>;

    /// Backend name for logs
    fn name(&self) -> &str;
}
