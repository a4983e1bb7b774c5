//! No-op embedder for tests and dry runs.

use async_trait::async_trait;
use stache_core::{EmbedError, EmbeddingProvider};

use crate::hashing::DEFAULT_DIMENSION;

/// Embedder that returns zero-vectors for every input.
pub struct NoopEmbedder {
    dimension: usize,
}

impl NoopEmbedder {
    /// Create a no-op embedder with the default dimension (384).
    #[must_use]
    pub fn new() -> Self {
        Self::with_dimension(DEFAULT_DIMENSION)
    }

    #[must_use]
    pub fn with_dimension(dimension: usize) -> Self {
        Self { dimension }
    }
}

impl Default for NoopEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingProvider for NoopEmbedder {
    fn name(&self) -> &str {
        "noop"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedError> {
        Ok(texts.iter().map(|_| vec![0.0; self.dimension]).collect())
    }
}
