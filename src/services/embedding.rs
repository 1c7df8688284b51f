//! Embedding provider for generating text embeddings.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::EmbeddingError;
use crate::models::EmbeddingConfig;

/// A provider that turns a batch of texts into one vector per text, in
/// input order. Implementations make one provider call per invocation;
/// batching and pacing are the caller's concern.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch of texts. The result has exactly one vector per input,
    /// positionally aligned.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Deployment or model name, for display.
    fn model(&self) -> &str;

    /// Embed a single query as a one-item batch.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let texts = [text.to_string()];
        let embeddings = self.embed(&texts).await?;
        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| EmbeddingError::InvalidResponse("empty embedding response".to_string()))
    }
}

/// Request body for the embeddings endpoint.
#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    input: &'a [String],
}

/// Response from the embeddings endpoint.
#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingItem {
    embedding: Vec<f32>,
    index: usize,
}

/// Client for the Azure OpenAI embeddings REST API.
#[derive(Debug, Clone)]
pub struct AzureOpenAiEmbedder {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    api_version: String,
}

impl AzureOpenAiEmbedder {
    /// Create a new embedder against the given resource endpoint.
    pub fn new(
        endpoint: &str,
        api_key: &str,
        config: &EmbeddingConfig,
    ) -> Result<Self, EmbeddingError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| EmbeddingError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: config.model.clone(),
            api_version: config.api_version.clone(),
        })
    }

    /// Get the resource endpoint this embedder talks to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn embeddings_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/embeddings?api-version={}",
            self.endpoint, self.model, self.api_version
        )
    }
}

#[async_trait]
impl Embedder for AzureOpenAiEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let response = self
            .client
            .post(self.embeddings_url())
            .header("api-key", &self.api_key)
            .json(&EmbeddingsRequest { input: texts })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EmbeddingError::Timeout
                } else if e.is_connect() {
                    EmbeddingError::ConnectionError(e.to_string())
                } else {
                    EmbeddingError::RequestError(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::ApiError(format!(
                "status {}: {}",
                status, body
            )));
        }

        let embeddings: EmbeddingsResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))?;

        vectors_in_input_order(embeddings, texts.len())
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Reassemble response items into input order. Items carry their input
/// index; the response order is not part of the API contract.
fn vectors_in_input_order(
    response: EmbeddingsResponse,
    expected: usize,
) -> Result<Vec<Vec<f32>>, EmbeddingError> {
    let mut items = response.data;
    if items.len() != expected {
        return Err(EmbeddingError::InvalidResponse(format!(
            "expected {} embeddings, got {}",
            expected,
            items.len()
        )));
    }
    items.sort_unstable_by_key(|item| item.index);
    Ok(items.into_iter().map(|item| item.embedding).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedder_creation() {
        let config = EmbeddingConfig::default();
        let embedder = AzureOpenAiEmbedder::new("https://example.openai.azure.com", "key", &config);
        assert!(embedder.is_ok());
    }

    #[test]
    fn test_endpoint_trimming() {
        let config = EmbeddingConfig::default();
        let embedder =
            AzureOpenAiEmbedder::new("https://example.openai.azure.com/", "key", &config).unwrap();
        assert_eq!(embedder.endpoint(), "https://example.openai.azure.com");
    }

    #[test]
    fn test_embeddings_url() {
        let config = EmbeddingConfig::default();
        let embedder =
            AzureOpenAiEmbedder::new("https://example.openai.azure.com", "key", &config).unwrap();
        assert_eq!(
            embedder.embeddings_url(),
            "https://example.openai.azure.com/openai/deployments/text-embedding-ada-002/embeddings?api-version=2024-02-01"
        );
    }

    #[test]
    fn test_response_items_reordered_by_index() {
        let response: EmbeddingsResponse = serde_json::from_str(
            r#"{"data": [
                {"embedding": [2.0], "index": 1},
                {"embedding": [3.0], "index": 2},
                {"embedding": [1.0], "index": 0}
            ]}"#,
        )
        .unwrap();

        let vectors = vectors_in_input_order(response, 3).unwrap();
        assert_eq!(vectors, vec![vec![1.0], vec![2.0], vec![3.0]]);
    }

    #[test]
    fn test_response_count_mismatch() {
        let response: EmbeddingsResponse =
            serde_json::from_str(r#"{"data": [{"embedding": [1.0], "index": 0}]}"#).unwrap();

        let err = vectors_in_input_order(response, 2).unwrap_err();
        assert!(matches!(err, EmbeddingError::InvalidResponse(_)));
        assert!(err.to_string().contains("expected 2 embeddings, got 1"));
    }
}
