//! Core traits for Stache providers.
//!
//! This module defines the trait interfaces every provider plugin implements:
//!
//! - [`VectorBackend`]: Raw vector database adapter
//! - [`NamespaceProvider`]: Namespace lifecycle
//! - [`DocumentIndex`]: Document bookkeeping
//! - [`EmbeddingProvider`]: Text to vector
//! - [`LlmProvider`]: Text completion
//! - [`DocumentLoader`]: File to text
//!
//! These traits enable a pluggable architecture where providers are selected
//! by name at startup without changing the rest of the system.

use async_trait::async_trait;
use std::path::Path;

use crate::error::{EmbedError, LlmError, LoadError, StoreError};
use crate::filter::FilterExpression;
use crate::types::{
    BatchResult, CapabilityDescriptor, Collection, CompletionOptions, Document, Metadata,
    ScoredRecord, VectorRecord,
};

// ============================================================================
// Vector Storage
// ============================================================================

/// Adapter over one vector database.
///
/// Adapters only translate calls; chunking, update emulation, namespace
/// emulation and client-side filtering live in the store contract above them.
/// Every call receives at most `capabilities().max_batch_size` records or
/// identifiers, and a filter is only passed when the descriptor declares every
/// operator in it.
#[async_trait]
pub trait VectorBackend: Send + Sync {
    /// Provider name.
    fn name(&self) -> &str;

    /// What this instance supports.
    fn capabilities(&self) -> &CapabilityDescriptor;

    /// Create a collection. Re-creating an identical definition is a no-op.
    async fn create_collection(&self, collection: &Collection) -> Result<(), StoreError>;

    /// Look up a collection definition.
    async fn get_collection(&self, name: &str) -> Result<Option<Collection>, StoreError>;

    /// Write records. Per-record failures are reported in the result; an
    /// `Err` means the whole call failed.
    async fn insert(
        &self,
        collection: &str,
        namespace: &str,
        records: &[VectorRecord],
    ) -> Result<BatchResult, StoreError>;

    /// Rank records by similarity to `query`.
    async fn search(
        &self,
        collection: &str,
        namespace: &str,
        query: &[f32],
        k: usize,
        filter: Option<&FilterExpression>,
    ) -> Result<Vec<ScoredRecord>, StoreError>;

    /// Remove records, returning the identifiers that existed.
    async fn delete(
        &self,
        collection: &str,
        namespace: &str,
        ids: &[String],
    ) -> Result<Vec<String>, StoreError>;

    /// Fetch records with their vectors. Missing identifiers are omitted.
    async fn fetch(
        &self,
        collection: &str,
        namespace: &str,
        ids: &[String],
    ) -> Result<Vec<VectorRecord>, StoreError>;

    /// Patch metadata in place. Only called when the descriptor declares
    /// `supports_native_update`.
    async fn update(
        &self,
        _collection: &str,
        _namespace: &str,
        _id: &str,
        _patch: &Metadata,
    ) -> Result<(), StoreError> {
        Err(StoreError::CapabilityUnsupported(format!(
            "{} does not support native update",
            self.name()
        )))
    }
}

// ============================================================================
// Namespaces
// ============================================================================

/// Lifecycle of logical tenant partitions.
#[async_trait]
pub trait NamespaceProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Create a namespace. Creating an existing namespace is a no-op.
    async fn create_namespace(&self, namespace: &str) -> Result<(), StoreError>;

    /// All known namespaces, sorted.
    async fn list_namespaces(&self) -> Result<Vec<String>, StoreError>;

    /// Delete a namespace, returning whether it existed.
    async fn delete_namespace(&self, namespace: &str) -> Result<bool, StoreError>;

    async fn namespace_exists(&self, namespace: &str) -> Result<bool, StoreError> {
        Ok(self
            .list_namespaces()
            .await?
            .iter()
            .any(|known| known == namespace))
    }
}

// ============================================================================
// Document Index
// ============================================================================

/// Bookkeeping of ingested documents, keyed by document id.
#[async_trait]
pub trait DocumentIndex: Send + Sync {
    fn name(&self) -> &str;

    /// Insert or replace a document.
    async fn put_document(&self, document: &Document) -> Result<(), StoreError>;

    async fn get_document(&self, namespace: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// Remove a document, returning whether it existed.
    async fn delete_document(&self, namespace: &str, id: &str) -> Result<bool, StoreError>;

    async fn list_documents(&self, namespace: &str) -> Result<Vec<Document>, StoreError>;
}

// ============================================================================
// Embedding
// ============================================================================

/// Converts text to vectors.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Model name/identifier.
    fn name(&self) -> &str;

    /// Embedding dimension.
    fn dimension(&self) -> usize;

    /// Embed a batch of texts.
    async fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedError>;

    /// Embed a query (may use a different instruction).
    async fn embed_query(&self, query: &str) -> Result<Vec<f32>, EmbedError> {
        self.embed(&[query])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| EmbedError::Inference("empty embedding result".to_string()))
    }
}

// ============================================================================
// Language Models
// ============================================================================

/// Text completion.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Model name/identifier.
    fn name(&self) -> &str;

    async fn complete(&self, prompt: &str, options: &CompletionOptions) -> Result<String, LlmError>;
}

// ============================================================================
// Document Loaders
// ============================================================================

/// Reads a file format into plain text.
#[async_trait]
pub trait DocumentLoader: Send + Sync {
    fn name(&self) -> &str;

    /// Lowercase file extensions (without the dot) this loader handles.
    fn extensions(&self) -> &[&str];

    /// Check if this loader can handle the given file.
    fn can_load(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions().contains(&ext.to_lowercase().as_str()))
    }

    async fn load(&self, path: &Path) -> Result<String, LoadError>;
}
