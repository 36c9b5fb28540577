#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod hashing;
pub mod remote;

pub use hashing::HashingEmbeddingClient;
pub use remote::{RemoteEmbeddingClient, RemoteEmbeddingConfig};

use std::sync::Arc;

use corpusdb_core::error::{Error, Result};
use corpusdb_core::traits::EmbeddingClient;

/// Pick the embedding client for this process.
///
/// `APP_USE_FAKE_EMBEDDINGS=1` selects the deterministic hashing client.
/// Otherwise the remote client is configured from `APP_EMBEDDINGS_URL`,
/// `APP_EMBEDDINGS_MODEL`, and `APP_EMBEDDINGS_API_KEY`.
pub fn default_client(dimension: usize) -> Result<Arc<dyn EmbeddingClient>> {
    let use_fake = std::env::var("APP_USE_FAKE_EMBEDDINGS")
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    if use_fake {
        tracing::info!(dimension, "using hashing embedding client");
        return Ok(Arc::new(HashingEmbeddingClient::new(dimension)));
    }

    let url = std::env::var("APP_EMBEDDINGS_URL").map_err(|_| {
        Error::InvalidConfiguration(
            "APP_EMBEDDINGS_URL is not set (set APP_USE_FAKE_EMBEDDINGS=1 for the offline client)"
                .to_string(),
        )
    })?;
    let model = std::env::var("APP_EMBEDDINGS_MODEL")
        .unwrap_or_else(|_| "text-embedding-3-small".to_string());
    let api_key = std::env::var("APP_EMBEDDINGS_API_KEY").ok();
    tracing::info!(url = %url, model = %model, dimension, "using remote embedding client");
    Ok(Arc::new(RemoteEmbeddingClient::new(RemoteEmbeddingConfig {
        url,
        model,
        api_key,
        dimension,
        timeout_secs: 30,
    })?))
}
