//! Command-line and environment configuration shared by the binaries.

use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use tracing_subscriber::EnvFilter;

use crate::embedder::openai::{OpenAiEmbedder, OpenAiSettings};
use crate::embedder::EmbeddingGateway;
use crate::error::{Error, Result};
use crate::pipeline::{SearchOptions, DEFAULT_NAME_FIELD, DEFAULT_VECTOR_FIELD};
use crate::search::solr::SolrBackend;
use crate::vector::DEFAULT_DIMENSIONS;

/// Installs the stderr log subscriber, honoring `RUST_LOG` (default `info`).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Embedding provider settings.
#[derive(Args, Debug, Clone)]
pub struct EmbeddingArgs {
    /// OpenAI API key used for embedding calls
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    /// Embedding model identifier (e.g. text-embedding-3-small)
    #[arg(
        long,
        env = "SOLRVEC_OPENAI_MODEL",
        default_value = "text-embedding-3-small"
    )]
    pub openai_model: String,

    /// Base URL for the OpenAI-compatible API
    #[arg(
        long,
        env = "SOLRVEC_OPENAI_BASE",
        default_value = "https://api.openai.com/v1"
    )]
    pub openai_base_url: String,

    /// Dimension override sent to the model; also the dimensionality every
    /// vector is validated against (1536 when unset)
    #[arg(long, env = "SOLRVEC_OPENAI_DIMENSIONS")]
    pub openai_dimensions: Option<usize>,

    /// Max seconds to wait for each embedding request
    #[arg(long, env = "SOLRVEC_OPENAI_TIMEOUT_SECS", default_value_t = 30)]
    pub openai_timeout_secs: u64,

    /// Retries for rate limits or transient errors (0 disables)
    #[arg(long, env = "SOLRVEC_OPENAI_MAX_RETRIES", default_value_t = 0)]
    pub max_retries: usize,
}

impl EmbeddingArgs {
    /// Dimensionality vectors must have.
    pub fn dimensions(&self) -> usize {
        self.openai_dimensions.unwrap_or(DEFAULT_DIMENSIONS)
    }

    /// Builds the gateway, failing fast when credentials are missing.
    pub fn build_gateway(&self) -> Result<EmbeddingGateway> {
        let api_key = self
            .openai_api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                Error::Configuration(
                    "API key not found; set OPENAI_API_KEY or pass --openai-api-key".into(),
                )
            })?;
        if self.openai_dimensions == Some(0) {
            return Err(Error::Configuration("--openai-dimensions must be positive".into()));
        }
        let embedder = OpenAiEmbedder::new(OpenAiSettings {
            api_key: api_key.to_string(),
            base_url: self.openai_base_url.clone(),
            model: self.openai_model.clone(),
            dimensions: self.openai_dimensions,
            timeout: Duration::from_secs(self.openai_timeout_secs.max(1)),
            max_retries: self.max_retries,
        })?;
        Ok(EmbeddingGateway::new(Arc::new(embedder), self.dimensions()))
    }
}

/// Search backend settings.
#[derive(Args, Debug, Clone)]
pub struct SolrArgs {
    /// Solr root URL
    #[arg(long, env = "SOLR_BASE_URL", default_value = "http://localhost:8983/solr")]
    pub solr_base_url: String,

    /// Solr collection holding the embedded documents
    #[arg(long, env = "SOLR_COLLECTION", default_value = "films")]
    pub solr_collection: String,

    /// Max seconds to wait for each Solr request
    #[arg(long, env = "SOLR_TIMEOUT_SECS", default_value_t = 30)]
    pub solr_timeout_secs: u64,

    /// Dense vector field targeted by the KNN clause
    #[arg(long, env = "SOLRVEC_VECTOR_FIELD", default_value = DEFAULT_VECTOR_FIELD)]
    pub vector_field: String,

    /// Fields returned per hit, comma separated
    #[arg(long, env = "SOLRVEC_FIELDS", default_value = "id,name,score")]
    pub fields: String,

    /// Field printed as the hit's display name
    #[arg(long, env = "SOLRVEC_NAME_FIELD", default_value = DEFAULT_NAME_FIELD)]
    pub name_field: String,
}

impl SolrArgs {
    /// Builds the Solr client.
    pub fn build_backend(&self) -> Result<SolrBackend> {
        SolrBackend::new(
            &self.solr_base_url,
            &self.solr_collection,
            Duration::from_secs(self.solr_timeout_secs.max(1)),
        )
    }

    /// Search options with the given neighbor and row counts.
    pub fn search_options(&self, top_k: usize, rows: usize) -> SearchOptions {
        SearchOptions {
            vector_field: self.vector_field.clone(),
            top_k,
            rows,
            fields: self.fields_vec(),
        }
    }

    /// Requested fields, always including the display-name field.
    fn fields_vec(&self) -> Vec<String> {
        let mut fields: Vec<String> = self
            .fields
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        let name_field = self.name_field.trim();
        if !name_field.is_empty() && !fields.iter().any(|field| field == name_field) {
            fields.push(name_field.to_string());
        }
        fields
    }
}
