//! Vertex AI text embeddings over HTTP

use super::{Embedding, EmbeddingProvider};
use crate::error::{MnemosError, MnemosResult};
use crate::settings::EmbeddingSettings;
use reqwest::{header, Client};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

/// Connection details for the Vertex AI prediction endpoint
#[derive(Debug, Clone)]
pub struct VertexEmbeddingConfig {
    /// Google Cloud project id
    pub project_id: String,

    /// Region, e.g. `us-central1`
    pub location: String,

    /// Publisher model name
    pub model: String,

    /// Requested output dimensionality
    pub dimensions: usize,

    /// OAuth access token sent as a bearer token
    pub access_token: Option<String>,

    /// Endpoint override; defaults to the regional Vertex host
    pub base_url: Option<String>,
}

impl VertexEmbeddingConfig {
    /// Create a config for `text-embedding-004` (768 dimensions)
    pub fn new(project_id: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            location: location.into(),
            model: "text-embedding-004".to_string(),
            dimensions: 768,
            access_token: None,
            base_url: None,
        }
    }

    /// Build from loaded settings; the project id is mandatory
    pub fn from_settings(settings: &EmbeddingSettings) -> MnemosResult<Self> {
        let project_id = settings
            .project_id
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| {
                MnemosError::configuration(
                    "GOOGLE_CLOUD_PROJECT",
                    "environment variable is not set",
                )
            })?;

        Ok(Self {
            project_id: project_id.to_string(),
            location: settings.location.clone(),
            model: settings.model.clone(),
            dimensions: settings.dimensions,
            access_token: settings.access_token.clone(),
            base_url: settings.base_url.clone(),
        })
    }

    /// Set the model and its dimensionality
    pub fn with_model(mut self, model: impl Into<String>, dimensions: usize) -> Self {
        self.model = model.into();
        self.dimensions = dimensions;
        self
    }

    /// Set the bearer token
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Point at a different host
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Full `:predict` URL for the configured model
    pub fn endpoint(&self) -> String {
        let base = self
            .base_url
            .clone()
            .unwrap_or_else(|| format!("https://{}-aiplatform.googleapis.com", self.location));
        format!(
            "{}/v1/projects/{}/locations/{}/publishers/google/models/{}:predict",
            base.trim_end_matches('/'),
            self.project_id,
            self.location,
            self.model
        )
    }
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
struct Prediction {
    embeddings: PredictionEmbeddings,
}

#[derive(Debug, Deserialize)]
struct PredictionEmbeddings {
    values: Vec<f32>,
}

/// Embedding provider backed by Vertex AI
pub struct VertexEmbeddingProvider {
    client: Client,
    config: VertexEmbeddingConfig,
}

impl VertexEmbeddingProvider {
    /// Create a new provider
    pub fn new(config: VertexEmbeddingConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Provider configuration
    pub fn config(&self) -> &VertexEmbeddingConfig {
        &self.config
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for VertexEmbeddingProvider {
    async fn embed(&self, text: &str) -> MnemosResult<Embedding> {
        let body = json!({
            "instances": [{ "content": text }],
            "parameters": { "outputDimensionality": self.config.dimensions },
        });

        debug!(
            model = %self.config.model,
            text_len = text.len(),
            "Requesting Vertex embedding"
        );

        let mut request = self
            .client
            .post(self.config.endpoint())
            .header(header::CONTENT_TYPE, "application/json")
            .json(&body);
        if let Some(token) = &self.config.access_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| MnemosError::embedding("vertex_predict", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_else(|_| "<no body>".into());
            return Err(MnemosError::embedding(
                "vertex_predict",
                format!("Vertex AI embedding API error ({}): {}", status, error_text),
            ));
        }

        let result: PredictResponse = response
            .json()
            .await
            .map_err(|e| MnemosError::embedding("vertex_decode", e))?;

        let values = result
            .predictions
            .into_iter()
            .next()
            .map(|p| p.embeddings.values)
            .ok_or_else(|| MnemosError::embedding("vertex_decode", "no predictions in response"))?;

        if values.len() != self.config.dimensions {
            return Err(MnemosError::embedding(
                "vertex_decode",
                format!(
                    "expected {} dimensions, got {}",
                    self.config.dimensions,
                    values.len()
                ),
            ));
        }

        Ok(Embedding::new(values, self.config.model.clone()))
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }

    fn dimensions(&self) -> usize {
        self.config.dimensions
    }
}
