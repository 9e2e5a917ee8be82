//! Vector embeddings and similarity metrics
//!
//! The embedding service is consumed through [`EmbeddingProvider`]. Two
//! backends ship with the crate: a deterministic offline
//! [`HashEmbeddingProvider`] and, behind the `vertex` feature, a Vertex AI
//! client.

mod hash;
#[cfg(feature = "vertex")]
mod vertex;

pub use hash::HashEmbeddingProvider;
#[cfg(feature = "vertex")]
pub use vertex::{VertexEmbeddingConfig, VertexEmbeddingProvider};

use crate::error::{MnemosError, MnemosResult};
use serde::{Deserialize, Serialize};

/// A vector embedding (dense float vector)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embedding {
    /// The vector dimensions
    pub vector: Vec<f32>,

    /// Dimensionality of the embedding
    pub dimensions: usize,

    /// Model used to generate the embedding
    pub model: String,
}

impl Embedding {
    /// Create a new embedding
    pub fn new(vector: Vec<f32>, model: impl Into<String>) -> Self {
        let dimensions = vector.len();
        Self {
            vector,
            dimensions,
            model: model.into(),
        }
    }

    /// Calculate cosine similarity with another embedding
    pub fn cosine_similarity(&self, other: &Embedding) -> MnemosResult<f32> {
        cosine_similarity(&self.vector, &other.vector)
    }

    /// Calculate cosine distance (`1 - similarity`) to another embedding
    pub fn cosine_distance(&self, other: &Embedding) -> MnemosResult<f32> {
        cosine_distance(&self.vector, &other.vector)
    }

    /// Take the raw vector
    pub fn into_vector(self) -> Vec<f32> {
        self.vector
    }
}

/// Cosine similarity of two equally sized vectors
///
/// A zero vector is treated as orthogonal to everything.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> MnemosResult<f32> {
    if a.len() != b.len() {
        return Err(MnemosError::validation(
            "embedding_dimensions",
            "dimensions must match",
            format!("{} vs {}", a.len(), b.len()),
        ));
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }

    Ok(dot_product / (norm_a * norm_b))
}

/// Cosine distance in `[0, 2]`, lower is more similar
pub fn cosine_distance(a: &[f32], b: &[f32]) -> MnemosResult<f32> {
    let similarity = cosine_similarity(a, b)?;
    Ok((1.0 - similarity).clamp(0.0, 2.0))
}

/// Trait for embedding generation backends
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding for the given text
    async fn embed(&self, text: &str) -> MnemosResult<Embedding>;

    /// Get the model name
    fn model_name(&self) -> &str;

    /// Get the embedding dimensions
    fn dimensions(&self) -> usize;
}

/// Search result with distance to the query
#[derive(Debug, Clone)]
pub struct SearchResult<T> {
    /// The item that was found
    pub item: T,

    /// Similarity score (`1 - distance`, higher is more similar)
    pub score: f32,

    /// Cosine distance to the query
    pub distance: Option<f32>,
}

impl<T> SearchResult<T> {
    /// Create a new search result
    pub fn new(item: T, score: f32) -> Self {
        Self {
            item,
            score,
            distance: None,
        }
    }

    /// Create a result from a cosine distance
    pub fn from_distance(item: T, distance: f32) -> Self {
        Self::new(item, 1.0 - distance).with_distance(distance)
    }

    /// Set the distance metric
    pub fn with_distance(mut self, distance: f32) -> Self {
        self.distance = Some(distance);
        self
    }
}
