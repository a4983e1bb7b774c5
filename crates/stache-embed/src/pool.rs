//! Embedding pool for concurrent batch embedding.

use futures::future::try_join_all;
use stache_core::{EmbedError, EmbeddingProvider};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::debug;

/// Pool around an embedding provider with concurrency control.
pub struct EmbeddingPool {
    provider: Arc<dyn EmbeddingProvider>,
    /// Semaphore to limit concurrent requests
    semaphore: Semaphore,
    /// Maximum concurrent requests
    max_concurrent: usize,
    /// Texts sent per provider call
    batch_size: usize,
}

impl EmbeddingPool {
    /// Create a new pool.
    pub fn new(provider: Arc<dyn EmbeddingProvider>, max_concurrent: usize, batch_size: usize) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            provider,
            semaphore: Semaphore::new(max_concurrent),
            max_concurrent,
            batch_size: batch_size.max(1),
        }
    }

    /// Get the embedding dimension.
    pub fn dimension(&self) -> usize {
        self.provider.dimension()
    }

    pub fn provider(&self) -> Arc<dyn EmbeddingProvider> {
        Arc::clone(&self.provider)
    }

    /// Embed texts in batches, returning vectors in input order.
    pub async fn embed_all(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        let batches = texts.chunks(self.batch_size).map(|batch| async move {
            let _permit = self
                .semaphore
                .acquire()
                .await
                .map_err(|e| EmbedError::Inference(format!("semaphore error: {e}")))?;
            let refs: Vec<&str> = batch.iter().map(String::as_str).collect();
            self.provider.embed(&refs).await
        });

        let vectors: Vec<Vec<f32>> = try_join_all(batches).await?.into_iter().flatten().collect();
        if vectors.len() != texts.len() {
            return Err(EmbedError::Inference(format!(
                "{} returned {} vectors for {} texts",
                self.provider.name(),
                vectors.len(),
                texts.len()
            )));
        }
        debug!("Embedded {} texts with {}", texts.len(), self.provider.name());
        Ok(vectors)
    }

    /// Embed a single query.
    pub async fn embed_query(&self, query: &str) -> Result<Vec<f32>, EmbedError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|e| EmbedError::Inference(format!("semaphore error: {e}")))?;

        self.provider.embed_query(query).await
    }

    /// Get pool statistics.
    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Get max concurrent operations.
    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }
}
