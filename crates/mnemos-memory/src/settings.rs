//! Settings loaded from the environment
//!
//! Tuning knobs come from `MNEMOS__*` variables (`__` separates nesting, so
//! `MNEMOS__EMBEDDING__MODEL` sets `embedding.model`). The plain service
//! variables (`REDIS_URL`, `GOOGLE_CLOUD_PROJECT`, `GOOGLE_CLOUD_LOCATION`,
//! `GOOGLE_ACCESS_TOKEN`) are honoured as-is and take precedence. A `.env`
//! file is read first when present.

use crate::error::{MnemosError, MnemosResult};
use config::{Config, Environment};
use serde::Deserialize;
use std::collections::HashMap;

/// Embedding backend settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Google Cloud project id (required by the Vertex backend)
    pub project_id: Option<String>,

    /// Google Cloud region
    pub location: String,

    /// Embedding model name
    pub model: String,

    /// Vector dimensionality, fixed for the lifetime of the index
    pub dimensions: usize,

    /// Bearer token for the Vertex endpoint
    pub access_token: Option<String>,

    /// Endpoint override
    pub base_url: Option<String>,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            project_id: None,
            location: "us-central1".to_string(),
            model: "text-embedding-004".to_string(),
            dimensions: 768,
            access_token: None,
            base_url: None,
        }
    }
}

/// Everything needed to stand up a long-term memory
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MemorySettings {
    /// Redis connection string
    pub redis_url: String,

    /// Search index name
    pub index_name: String,

    /// Key prefix for stored documents
    pub key_prefix: String,

    /// Cosine distance below which a new memory counts as a duplicate
    pub dedup_threshold: f32,

    /// Default cosine distance cutoff for retrieval
    pub retrieval_threshold: f32,

    /// Default number of memories returned
    pub default_limit: usize,

    /// Owner used when a caller gives none
    pub default_owner: String,

    /// Embedding backend
    pub embedding: EmbeddingSettings,
}

impl Default for MemorySettings {
    fn default() -> Self {
        Self {
            redis_url: "redis://localhost:6379".to_string(),
            index_name: "agent_memories".to_string(),
            key_prefix: "memory".to_string(),
            dedup_threshold: 0.1,
            retrieval_threshold: 0.1,
            default_limit: 5,
            default_owner: "system".to_string(),
            embedding: EmbeddingSettings::default(),
        }
    }
}

impl MemorySettings {
    /// Load from the process environment (after reading `.env`)
    pub fn from_env() -> MnemosResult<Self> {
        dotenv::dotenv().ok();
        Self::from_vars(std::env::vars().collect())
    }

    /// Load from an explicit set of variables
    pub fn from_vars(vars: HashMap<String, String>) -> MnemosResult<Self> {
        let direct = |name: &str| vars.get(name).filter(|v| !v.trim().is_empty()).cloned();

        let config = Config::builder()
            .add_source(
                Environment::with_prefix("MNEMOS")
                    .separator("__")
                    .source(Some(vars.clone().into_iter().collect())),
            )
            .set_override_option("redis_url", direct("REDIS_URL"))
            .and_then(|b| {
                b.set_override_option("embedding.project_id", direct("GOOGLE_CLOUD_PROJECT"))
            })
            .and_then(|b| {
                b.set_override_option("embedding.location", direct("GOOGLE_CLOUD_LOCATION"))
            })
            .and_then(|b| {
                b.set_override_option("embedding.access_token", direct("GOOGLE_ACCESS_TOKEN"))
            })
            .and_then(|b| b.build())
            .map_err(|e| MnemosError::configuration("environment", e.to_string()))?;

        let settings: MemorySettings = config
            .try_deserialize()
            .map_err(|e| MnemosError::configuration("environment", e.to_string()))?;

        settings.validate()?;
        Ok(settings)
    }

    /// Check value ranges
    pub fn validate(&self) -> MnemosResult<()> {
        for (name, value) in [
            ("dedup_threshold", self.dedup_threshold),
            ("retrieval_threshold", self.retrieval_threshold),
        ] {
            if !(0.0..=2.0).contains(&value) {
                return Err(MnemosError::configuration(
                    name,
                    format!("cosine distance must be within [0, 2], got {}", value),
                ));
            }
        }
        if self.embedding.dimensions == 0 {
            return Err(MnemosError::configuration(
                "embedding.dimensions",
                "must be greater than zero",
            ));
        }
        if self.default_owner.trim().is_empty() {
            return Err(MnemosError::configuration("default_owner", "must not be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults_without_variables() {
        let settings = MemorySettings::from_vars(HashMap::new()).unwrap();
        assert_eq!(settings.redis_url, "redis://localhost:6379");
        assert_eq!(settings.index_name, "agent_memories");
        assert_eq!(settings.default_limit, 5);
        assert_eq!(settings.embedding.location, "us-central1");
        assert!(settings.embedding.project_id.is_none());
    }

    #[test]
    fn test_service_variables_are_honoured() {
        let settings = MemorySettings::from_vars(vars(&[
            ("REDIS_URL", "redis://cache:6380"),
            ("GOOGLE_CLOUD_PROJECT", "travel-demo"),
            ("GOOGLE_CLOUD_LOCATION", "europe-west1"),
            ("UNRELATED", "ignored"),
        ]))
        .unwrap();

        assert_eq!(settings.redis_url, "redis://cache:6380");
        assert_eq!(settings.embedding.project_id.as_deref(), Some("travel-demo"));
        assert_eq!(settings.embedding.location, "europe-west1");
    }

    #[test]
    fn test_prefixed_tuning_variables() {
        let settings = MemorySettings::from_vars(vars(&[
            ("MNEMOS__DEDUP_THRESHOLD", "0.05"),
            ("MNEMOS__DEFAULT_OWNER", "concierge"),
            ("MNEMOS__EMBEDDING__DIMENSIONS", "3072"),
        ]))
        .unwrap();

        assert!((settings.dedup_threshold - 0.05).abs() < 1e-6);
        assert_eq!(settings.default_owner, "concierge");
        assert_eq!(settings.embedding.dimensions, 3072);
    }

    #[test]
    fn test_out_of_range_threshold_is_rejected() {
        let err = MemorySettings::from_vars(vars(&[("MNEMOS__RETRIEVAL_THRESHOLD", "2.5")]))
            .unwrap_err();
        assert!(matches!(err, MnemosError::Configuration { .. }));
    }
}
