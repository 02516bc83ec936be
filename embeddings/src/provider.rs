//! Embedding providers.
//!
//! The organizer embeds documents and queries asymmetrically through the
//! Gemini embedding API; the provider itself performs no retries.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{EmbeddingError, Result};
use crate::{DEFAULT_DIMENSION, Embedding, similarity};

/// Default embedding model.
pub const DEFAULT_MODEL: &str = "models/gemini-embedding-001";

/// Default timeout for a single embedding call.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Which side of the asymmetric embedding space a text belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbedIntent {
    /// Stored content (documents, events, conversation snippets).
    Document,

    /// A lookup query to be matched against stored content.
    Query,
}

impl EmbedIntent {
    /// The provider-side task type for this intent.
    pub fn task_type(&self) -> &'static str {
        match self {
            Self::Document => "RETRIEVAL_DOCUMENT",
            Self::Query => "RETRIEVAL_QUERY",
        }
    }
}

/// Request for generating an embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRequest {
    /// Text to embed.
    pub text: String,

    /// Embedding intent (document vs query).
    pub intent: EmbedIntent,

    /// Model override (provider default when absent).
    pub model: Option<String>,

    /// Output dimension override (provider default when absent).
    pub dimensions: Option<usize>,
}

impl EmbeddingRequest {
    /// Create a new embedding request.
    pub fn new(text: impl Into<String>, intent: EmbedIntent) -> Self {
        Self {
            text: text.into(),
            intent,
            model: None,
            dimensions: None,
        }
    }

    /// Set the model to use.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the output dimensions.
    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = Some(dimensions);
        self
    }
}

/// Response from embedding generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingResponse {
    /// The generated embedding, L2-normalized so dot product equals cosine.
    pub embedding: Embedding,

    /// Model used to generate the embedding.
    pub model: String,

    /// Dimension of the embedding.
    pub dimension: usize,
}

/// Trait for embedding providers.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Get the name of this provider.
    fn name(&self) -> &str;

    /// Get the default model for this provider.
    fn default_model(&self) -> &str;

    /// Get the default embedding dimension.
    fn default_dimension(&self) -> usize;

    /// Generate an embedding for the given text.
    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse>;

    /// Check if the provider is available (API key set, etc.).
    fn is_available(&self) -> bool;
}

/// Gemini embedding provider.
///
/// Configuration is held on the instance rather than in module globals so
/// that key, model, and timeout can be injected per deployment and per test.
pub struct GeminiProvider {
    /// API key.
    api_key: Option<String>,

    /// API base URL.
    base_url: String,

    /// HTTP client.
    client: reqwest::Client,

    /// Default model.
    model: String,

    /// Output dimension requested from the provider.
    dimension: usize,

    /// Hard timeout for a single call.
    request_timeout: Duration,
}

impl GeminiProvider {
    /// Create a new Gemini provider, reading the key from `GEMINI_API_KEY`.
    pub fn new() -> Self {
        Self {
            api_key: std::env::var("GEMINI_API_KEY").ok(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            client: reqwest::Client::new(),
            model: DEFAULT_MODEL.to_string(),
            dimension: DEFAULT_DIMENSION,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Set the API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the default model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the output dimension.
    ///
    /// Changing this invalidates every previously stored vector; there is no
    /// migration path.
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = dimension;
        self
    }

    /// Set the per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

impl Default for GeminiProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn default_model(&self) -> &str {
        &self.model
    }

    fn default_dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or(EmbeddingError::ProviderNotConfigured)?;

        if request.text.trim().is_empty() {
            return Err(EmbeddingError::EmptyInput);
        }

        let model = request.model.unwrap_or_else(|| self.model.clone());
        let dimensions = request.dimensions.unwrap_or(self.dimension);

        debug!(
            "Generating {} embedding with model: {model}",
            request.intent.task_type()
        );

        let body = serde_json::json!({
            "content": { "parts": [{ "text": request.text }] },
            "taskType": request.intent.task_type(),
            "outputDimensionality": dimensions,
        });

        let response = self
            .client
            .post(format!("{}/{model}:embedContent", self.base_url))
            .query(&[("key", api_key.as_str())])
            .header("Content-Type", "application/json")
            .timeout(self.request_timeout)
            .json(&body)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);

            return Err(EmbeddingError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::ApiRequest(format!(
                "API error: {error_text}"
            )));
        }

        let result: GeminiEmbedResponse = response.json().await?;

        let mut embedding = result.embedding.values;
        if embedding.is_empty() {
            return Err(EmbeddingError::InvalidResponse(
                "no embedding in response".to_string(),
            ));
        }

        // Normalize so that dot product equals cosine similarity downstream.
        similarity::normalize(&mut embedding);
        let dimension = embedding.len();

        info!("Generated embedding with {dimension} dimensions");

        Ok(EmbeddingResponse {
            embedding,
            model,
            dimension,
        })
    }

    fn is_available(&self) -> bool {
        self.api_key.is_some()
    }
}

/// Gemini API response format.
#[derive(Debug, Deserialize)]
struct GeminiEmbedResponse {
    embedding: GeminiEmbedding,
}

#[derive(Debug, Deserialize)]
struct GeminiEmbedding {
    values: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_embedding_request() {
        let request = EmbeddingRequest::new("Hello world", EmbedIntent::Query)
            .with_model("models/gemini-embedding-001")
            .with_dimensions(512);

        assert_eq!(request.text, "Hello world");
        assert_eq!(request.intent, EmbedIntent::Query);
        assert_eq!(request.dimensions, Some(512));
    }

    #[test]
    fn test_intent_task_types() {
        assert_eq!(EmbedIntent::Document.task_type(), "RETRIEVAL_DOCUMENT");
        assert_eq!(EmbedIntent::Query.task_type(), "RETRIEVAL_QUERY");
    }

    #[test]
    fn test_provider_availability() {
        let provider = GeminiProvider::new().with_api_key("test-key");
        assert!(provider.is_available());
    }

    #[tokio::test]
    async fn test_embed_normalizes_output() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/models/gemini-embedding-001:embedContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "embedding": { "values": [3.0, 4.0, 0.0] }
            })))
            .mount(&server)
            .await;

        let provider = GeminiProvider::new()
            .with_api_key("test-key")
            .with_base_url(server.uri());

        let response = provider
            .embed(EmbeddingRequest::new("some text", EmbedIntent::Document))
            .await
            .unwrap();

        assert_eq!(response.dimension, 3);
        let norm = similarity::l2_norm(&response.embedding);
        assert!((norm - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_embed_rate_limited() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "7"))
            .mount(&server)
            .await;

        let provider = GeminiProvider::new()
            .with_api_key("test-key")
            .with_base_url(server.uri());

        let err = provider
            .embed(EmbeddingRequest::new("some text", EmbedIntent::Query))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            EmbeddingError::RateLimited {
                retry_after_secs: 7
            }
        ));
    }

    #[tokio::test]
    async fn test_embed_empty_input() {
        let provider = GeminiProvider::new().with_api_key("test-key");
        let err = provider
            .embed(EmbeddingRequest::new("   ", EmbedIntent::Document))
            .await
            .unwrap_err();
        assert!(matches!(err, EmbeddingError::EmptyInput));
    }

    #[tokio::test]
    async fn test_embed_without_key() {
        let provider = GeminiProvider {
            api_key: None,
            ..GeminiProvider::new()
        };
        let err = provider
            .embed(EmbeddingRequest::new("text", EmbedIntent::Document))
            .await
            .unwrap_err();
        assert!(matches!(err, EmbeddingError::ProviderNotConfigured));
    }
}
