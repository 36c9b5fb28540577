//! Pipeline configuration.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*`
//! env vars over built-in defaults, extracted into one typed struct that
//! every component receives at construction.

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

use crate::error::{Error, Result};
use crate::types::{IndexDescriptor, SimilarityMetric};

/// Everything the pipeline needs at construction: the retrieval options
/// plus the operational knobs for batching, retries, and provisioning
/// polls. Delays are milliseconds; the backoff factor is fixed at 2.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub index_name: String,
    pub dimension: usize,
    pub metric: SimilarityMetric,
    pub chunk_size: usize,
    pub overlap: usize,
    pub top_k: usize,
    pub max_context_size: usize,
    pub upsert_batch_size: usize,
    pub max_concurrent_batches: usize,
    pub retry_max_attempts: usize,
    pub retry_base_delay_ms: u64,
    pub poll_max_attempts: usize,
    pub poll_base_delay_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            index_name: "documents".to_string(),
            dimension: 1024,
            metric: SimilarityMetric::Cosine,
            chunk_size: 1000,
            overlap: 200,
            top_k: 10,
            max_context_size: 4000,
            upsert_batch_size: 100,
            max_concurrent_batches: 4,
            retry_max_attempts: 3,
            retry_base_delay_ms: 1000,
            poll_max_attempts: 5,
            poll_base_delay_ms: 1000,
        }
    }
}

impl PipelineConfig {
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("."))
    }

    /// Loads from `<dir>/config.toml` plus the `RUST_ENV`-selected
    /// overlay file, with `APP_*` environment variables on top.
    pub fn load_from(dir: &Path) -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::new().merge(Toml::file(dir.join("config.toml")));
        match env_name.as_str() {
            "dev" | "development" => {
                figment = figment.merge(Toml::file(dir.join("config.dev.toml")));
            }
            "prod" | "production" => {
                figment = figment.merge(Toml::file(dir.join("config.prod.toml")));
            }
            "test" | "testing" => {
                figment = figment.merge(Toml::file(dir.join("config.test.toml")));
            }
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_"));

        let config: Self = figment
            .extract()
            .map_err(|e| Error::InvalidConfiguration(format!("failed to load config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.index_name.trim().is_empty() {
            return Err(Error::InvalidConfiguration(
                "index_name must not be empty".to_string(),
            ));
        }
        if self.dimension == 0 {
            return Err(Error::InvalidConfiguration(
                "dimension must be at least 1".to_string(),
            ));
        }
        if self.chunk_size == 0 {
            return Err(Error::InvalidConfiguration(
                "chunk_size must be at least 1".to_string(),
            ));
        }
        if self.overlap >= self.chunk_size {
            return Err(Error::InvalidConfiguration(format!(
                "overlap {} must be smaller than chunk_size {}",
                self.overlap, self.chunk_size
            )));
        }
        if self.top_k == 0 {
            return Err(Error::InvalidConfiguration(
                "top_k must be at least 1".to_string(),
            ));
        }
        if self.upsert_batch_size == 0 {
            return Err(Error::InvalidConfiguration(
                "upsert_batch_size must be at least 1".to_string(),
            ));
        }
        if self.max_concurrent_batches == 0 {
            return Err(Error::InvalidConfiguration(
                "max_concurrent_batches must be at least 1".to_string(),
            ));
        }
        if self.retry_max_attempts == 0 || self.poll_max_attempts == 0 {
            return Err(Error::InvalidConfiguration(
                "retry_max_attempts and poll_max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// The descriptor this configuration provisions and queries against.
    pub fn descriptor(&self) -> IndexDescriptor {
        IndexDescriptor {
            name: self.index_name.clone(),
            dimension: self.dimension,
            metric: self.metric,
        }
    }
}
