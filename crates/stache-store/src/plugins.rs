//! Builtin store-side providers and the configured store entry point.

use stache_core::{Error, RegistryError};
use stache_registry::{ProviderOptions, ProviderRegistry, Settings};
use std::sync::Arc;
use tracing::info;

use crate::contract::{StoreConfig, VectorStore};
use crate::document_index::MemoryDocumentIndex;
use crate::memory::{MemoryBackend, MemoryOptions};
use crate::namespace_provider::MemoryNamespaceProvider;

/// Register the in-memory vector, namespace and document-index providers.
///
/// | Category | Name |
/// |----------|------|
/// | vectordb | `memory`, `memory-immutable` |
/// | namespace | `memory` |
/// | document_index | `memory` |
pub fn register_builtins(registry: &mut ProviderRegistry) {
    registry.register_vectordb("memory", |options: ProviderOptions| async move {
        let options = MemoryOptions::mutable().with_overrides(&options)?;
        Ok::<_, Error>(MemoryBackend::with_options("memory", options))
    });
    registry.register_vectordb("memory-immutable", |options: ProviderOptions| async move {
        let options = MemoryOptions::immutable().with_overrides(&options)?;
        Ok::<_, Error>(MemoryBackend::with_options("memory-immutable", options))
    });
    registry.register_namespace("memory", |_| async {
        Ok::<_, Error>(MemoryNamespaceProvider::new())
    });
    registry.register_document_index("memory", |_| async {
        Ok::<_, Error>(MemoryDocumentIndex::new())
    });
}

/// Resolve the configured vector backend and wrap it in the store contract.
pub async fn open_vector_store(
    registry: &ProviderRegistry,
    settings: &Settings,
    config: StoreConfig,
) -> Result<VectorStore, RegistryError> {
    let (backend, capabilities) = registry
        .resolve_vectordb(&settings.vectordb_provider)
        .await?;
    info!(
        "Opened vector store '{}' (max batch {})",
        settings.vectordb_provider, capabilities.max_batch_size
    );
    Ok(VectorStore::new(Arc::clone(&backend), config))
}
