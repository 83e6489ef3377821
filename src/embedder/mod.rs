//! Embedding gateway: turns text into fixed-length vectors through a
//! pluggable provider.
//!
//! Providers implement [`Embedder`] and only deal with transport. The
//! [`EmbeddingGateway`] wrapped around them owns the checks every caller
//! needs: non-empty input, one vector per input, and the configured
//! dimensionality.

pub mod openai;

use std::sync::Arc;

use tracing::debug;

use crate::error::{Error, Result};
use crate::vector;

/// Text to vector provider boundary.
pub trait Embedder: Send + Sync {
    /// Embeds every input, returning vectors in input order.
    fn embed_batch(&self, inputs: &[&str]) -> Result<Vec<Vec<f32>>>;
}

/// Validating front door to an [`Embedder`], cheap to clone across workers.
#[derive(Clone)]
pub struct EmbeddingGateway {
    embedder: Arc<dyn Embedder>,
    dimensions: usize,
}

impl EmbeddingGateway {
    /// Wraps `embedder`, expecting every vector to have `dimensions` entries.
    pub fn new(embedder: Arc<dyn Embedder>, dimensions: usize) -> Self {
        Self {
            embedder,
            dimensions,
        }
    }

    /// Dimensionality vectors are validated against.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Embeds a single text.
    pub fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text])?;
        vectors
            .pop()
            .ok_or_else(|| Error::Provider("provider returned no embedding".into()))
    }

    /// Embeds `inputs` in one provider call.
    pub fn embed_batch(&self, inputs: &[&str]) -> Result<Vec<Vec<f32>>> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }
        if let Some(position) = inputs.iter().position(|text| text.trim().is_empty()) {
            return Err(Error::InvalidQuery(format!(
                "input {position} has no text to embed"
            )));
        }
        debug!(inputs = inputs.len(), "requesting embeddings");
        let vectors = self.embedder.embed_batch(inputs)?;
        if vectors.len() != inputs.len() {
            return Err(Error::Provider(format!(
                "provider returned {} embeddings for {} inputs",
                vectors.len(),
                inputs.len()
            )));
        }
        for vector in &vectors {
            vector::validate(vector, self.dimensions)?;
        }
        Ok(vectors)
    }
}
