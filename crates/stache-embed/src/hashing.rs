//! Feature-hashing embedder.
//!
//! Maps each lowercase word to a signed bucket picked by its blake3 hash and
//! L2-normalises the counts. Texts sharing words get similar vectors, which
//! is enough for local retrieval without a model download.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use stache_core::{EmbedError, EmbeddingProvider, Error};
use stache_registry::ProviderOptions;

/// Default embedding dimension.
pub const DEFAULT_DIMENSION: usize = 384;

/// Options of the `hashing` and `noop` providers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DimensionOptions {
    #[serde(default = "default_dimension")]
    pub dimension: usize,
}

fn default_dimension() -> usize {
    DEFAULT_DIMENSION
}

impl DimensionOptions {
    /// Parse provider options, rejecting a zero dimension.
    pub fn from_options(options: &ProviderOptions) -> Result<Self, Error> {
        let parsed: Self = serde_json::from_value(serde_json::Value::Object(options.clone()))?;
        if parsed.dimension == 0 {
            return Err(Error::Config("dimension must be positive".to_string()));
        }
        Ok(parsed)
    }
}

/// Bag-of-words embedder using the hashing trick.
///
/// # Example
///
/// ```rust
/// use stache_embed::HashingEmbedder;
/// use stache_core::EmbeddingProvider;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let embedder = HashingEmbedder::new(64);
/// let vectors = embedder.embed(&["vector stores", "stores of vectors"]).await?;
/// assert_eq!(vectors[0].len(), 64);
/// # Ok(())
/// # }
/// ```
pub struct HashingEmbedder {
    dimension: usize,
}

impl HashingEmbedder {
    #[must_use]
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let hash = blake3::hash(word.to_lowercase().as_bytes());
            let bytes = hash.as_bytes();
            let mut bucket = [0u8; 8];
            bucket.copy_from_slice(&bytes[..8]);
            let index = (u64::from_le_bytes(bucket) % self.dimension as u64) as usize;
            let sign = if bytes[8] & 1 == 0 { 1.0 } else { -1.0 };
            vector[index] += sign;
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut vector {
                *x /= norm;
            }
        }
        vector
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSION)
    }
}

#[async_trait]
impl EmbeddingProvider for HashingEmbedder {
    fn name(&self) -> &str {
        "hashing"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedError> {
        Ok(texts.iter().map(|text| self.embed_one(text)).collect())
    }
}
