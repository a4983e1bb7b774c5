//! In-memory namespace provider.

use async_trait::async_trait;
use stache_core::{DEFAULT_NAMESPACE, NamespaceProvider, StoreError};
use std::collections::BTreeSet;
use tokio::sync::RwLock;
use tracing::debug;

/// Namespace registry kept in memory. The default namespace always exists.
pub struct MemoryNamespaceProvider {
    namespaces: RwLock<BTreeSet<String>>,
}

impl MemoryNamespaceProvider {
    #[must_use]
    pub fn new() -> Self {
        Self {
            namespaces: RwLock::new(BTreeSet::from([DEFAULT_NAMESPACE.to_string()])),
        }
    }
}

impl Default for MemoryNamespaceProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NamespaceProvider for MemoryNamespaceProvider {
    fn name(&self) -> &str {
        "memory"
    }

    async fn create_namespace(&self, namespace: &str) -> Result<(), StoreError> {
        if self.namespaces.write().await.insert(namespace.to_string()) {
            debug!("Created namespace '{}'", namespace);
        }
        Ok(())
    }

    async fn list_namespaces(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.namespaces.read().await.iter().cloned().collect())
    }

    async fn delete_namespace(&self, namespace: &str) -> Result<bool, StoreError> {
        if namespace == DEFAULT_NAMESPACE {
            return Err(StoreError::Permanent(
                "the default namespace cannot be deleted".to_string(),
            ));
        }
        let removed = self.namespaces.write().await.remove(namespace);
        debug!("Deleted namespace '{}': {}", namespace, removed);
        Ok(removed)
    }

    async fn namespace_exists(&self, namespace: &str) -> Result<bool, StoreError> {
        Ok(self.namespaces.read().await.contains(namespace))
    }
}
