//! Offline embedding by feature hashing

use super::{Embedding, EmbeddingProvider};
use crate::error::MnemosResult;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

const WORD_WEIGHT: f32 = 1.0;
const TRIGRAM_WEIGHT: f32 = 0.5;

/// Deterministic bag-of-words embedding provider
///
/// Hashes lowercase words and their character trigrams into a fixed number of
/// signed buckets and L2-normalizes the result. Features are hashed with
/// 64-bit FNV-1a, so identical text embeds identically across processes and
/// toolchains, and texts sharing words or word stems land close together,
/// which is enough for demos and tests. Not a semantic model.
pub struct HashEmbeddingProvider {
    dimensions: usize,
}

impl HashEmbeddingProvider {
    /// Create a new hash-based embedding provider
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    fn hash_embed(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];

        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(str::to_lowercase)
        {
            self.accumulate(&mut vector, &word, WORD_WEIGHT);

            let padded: Vec<char> = format!("#{}#", word).chars().collect();
            for trigram in padded.windows(3) {
                let trigram: String = trigram.iter().collect();
                self.accumulate(&mut vector, &trigram, TRIGRAM_WEIGHT);
            }
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        vector
    }

    fn accumulate(&self, vector: &mut [f32], feature: &str, weight: f32) {
        let hash = fnv1a(feature.as_bytes());

        let bucket = (hash % self.dimensions as u64) as usize;
        let sign = if (hash >> 63) & 1 == 0 { 1.0 } else { -1.0 };
        vector[bucket] += sign * weight;
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, &b| {
        (hash ^ u64::from(b)).wrapping_mul(FNV_PRIME)
    })
}

#[async_trait::async_trait]
impl EmbeddingProvider for HashEmbeddingProvider {
    async fn embed(&self, text: &str) -> MnemosResult<Embedding> {
        Ok(Embedding::new(self.hash_embed(text), self.model_name()))
    }

    fn model_name(&self) -> &str {
        "hash-embedding"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fnv1a_reference_values() {
        assert_eq!(fnv1a(b""), 0xcbf2_9ce4_8422_2325);
        assert_eq!(fnv1a(b"a"), 0xaf63_dc4c_8601_ec8c);
    }

    #[tokio::test]
    async fn test_hash_embedding_provider() {
        let provider = HashEmbeddingProvider::new(256);

        let emb1 = provider.embed("User prefers aisle seats").await.unwrap();
        let emb2 = provider.embed("user prefers AISLE seats!").await.unwrap();
        let emb3 = provider.embed("Tokyo has excellent public transit").await.unwrap();

        assert_eq!(emb1.dimensions, 256);

        // Case and punctuation do not matter
        let dist = emb1.cosine_distance(&emb2).unwrap();
        assert!(dist < 1e-5);

        // Unrelated text is far away
        let dist = emb1.cosine_distance(&emb3).unwrap();
        assert!(dist > 0.5);
    }

    #[tokio::test]
    async fn test_shared_stems_are_closer() {
        let provider = HashEmbeddingProvider::new(512);

        let stored = provider.embed("User prefers aisle seats").await.unwrap();
        let related = provider.embed("seat preference").await.unwrap();
        let unrelated = provider.embed("Tokyo visa rules").await.unwrap();

        let near = stored.cosine_distance(&related).unwrap();
        let far = stored.cosine_distance(&unrelated).unwrap();
        assert!(near < far, "{} should be below {}", near, far);
    }

    #[tokio::test]
    async fn test_empty_text_is_zero_vector() {
        let provider = HashEmbeddingProvider::new(8);
        let emb = provider.embed("   ").await.unwrap();
        assert!(emb.vector.iter().all(|x| *x == 0.0));
    }
}
