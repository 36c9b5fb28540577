use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use corpusdb_core::error::{Error, Result};
use corpusdb_core::traits::EmbeddingClient;

#[derive(Debug, Clone)]
pub struct RemoteEmbeddingConfig {
    /// Full URL of an OpenAI-style `/embeddings` endpoint.
    pub url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub dimension: usize,
    pub timeout_secs: u64,
}

/// HTTP client for an OpenAI-style embeddings endpoint.
///
/// Request: `{"model": ..., "input": [...]}`. Response vectors are
/// length-checked against the configured dimension. Rate limits,
/// timeouts, and server errors map to transient failures; other client
/// errors are permanent since retrying the same input cannot help.
pub struct RemoteEmbeddingClient {
    http: reqwest::Client,
    config: RemoteEmbeddingConfig,
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Deserialize)]
struct EmbeddingItem {
    index: usize,
    embedding: Vec<f32>,
}

impl RemoteEmbeddingClient {
    pub fn new(config: RemoteEmbeddingConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::InvalidConfiguration(format!("failed to build http client: {}", e)))?;
        Ok(Self { http, config })
    }

    async fn request(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>> {
        debug!(count = inputs.len(), model = %self.config.model, "requesting embeddings");
        let body = serde_json::json!({ "model": self.config.model, "input": inputs });
        let mut req = self.http.post(&self.config.url).json(&body);
        if let Some(key) = &self.config.api_key {
            req = req.bearer_auth(key);
        }
        let resp = req.send().await.map_err(|e| {
            if e.is_timeout() || e.is_connect() {
                Error::EmbeddingTransient(format!("embedding request failed: {}", e))
            } else {
                Error::EmbeddingPermanent(format!("embedding request failed: {}", e))
            }
        })?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(classify_status(status.as_u16(), &text));
        }

        let parsed: EmbeddingsResponse = resp
            .json()
            .await
            .map_err(|e| Error::EmbeddingPermanent(format!("malformed embedding response: {}", e)))?;
        if parsed.data.len() != inputs.len() {
            return Err(Error::EmbeddingPermanent(format!(
                "embedding response has {} vectors for {} inputs",
                parsed.data.len(),
                inputs.len()
            )));
        }
        let mut items = parsed.data;
        items.sort_by_key(|item| item.index);
        let mut vectors = Vec::with_capacity(items.len());
        for item in items {
            if item.embedding.len() != self.config.dimension {
                return Err(Error::InvalidConfiguration(format!(
                    "embedding dimension {} does not match configured dimension {}",
                    item.embedding.len(),
                    self.config.dimension
                )));
            }
            vectors.push(item.embedding);
        }
        Ok(vectors)
    }
}

fn classify_status(status: u16, body: &str) -> Error {
    match status {
        408 | 429 | 500..=599 => {
            Error::EmbeddingTransient(format!("embedding service returned {}: {}", status, body))
        }
        _ => Error::EmbeddingPermanent(format!("embedding service returned {}: {}", status, body)),
    }
}

#[async_trait]
impl EmbeddingClient for RemoteEmbeddingClient {
    fn model_id(&self) -> &str {
        &self.config.model
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.request(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| Error::EmbeddingPermanent("empty embedding response".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.request(texts).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_statuses_map_to_transient_errors() {
        for status in [408, 429, 500, 503] {
            let err = classify_status(status, "slow down");
            assert!(
                matches!(err, Error::EmbeddingTransient(_)),
                "status {status} should be transient, got {err:?}"
            );
            assert!(err.is_transient());
        }
    }

    #[test]
    fn client_errors_map_to_permanent_errors() {
        for status in [400, 401, 404] {
            let err = classify_status(status, "bad request");
            assert!(
                matches!(err, Error::EmbeddingPermanent(_)),
                "status {status} should be permanent, got {err:?}"
            );
            assert!(!err.is_transient());
        }
    }

    #[test]
    fn classified_errors_carry_the_status_and_body() {
        let message = classify_status(429, "rate limited").to_string();
        assert!(message.contains("429"));
        assert!(message.contains("rate limited"));
    }
}
