//! In-memory document index.

use async_trait::async_trait;
use stache_core::{Document, DocumentIndex, StoreError};
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use tracing::debug;

/// Document bookkeeping kept in memory, keyed by (namespace, id).
pub struct MemoryDocumentIndex {
    documents: RwLock<BTreeMap<(String, String), Document>>,
}

impl MemoryDocumentIndex {
    #[must_use]
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(BTreeMap::new()),
        }
    }
}

impl Default for MemoryDocumentIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentIndex for MemoryDocumentIndex {
    fn name(&self) -> &str {
        "memory"
    }

    async fn put_document(&self, document: &Document) -> Result<(), StoreError> {
        let key = (document.namespace.clone(), document.id.clone());
        self.documents.write().await.insert(key, document.clone());
        debug!(
            "Indexed document {} ({} chunks)",
            document.id,
            document.chunk_ids.len()
        );
        Ok(())
    }

    async fn get_document(&self, namespace: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let documents = self.documents.read().await;
        Ok(documents
            .get(&(namespace.to_string(), id.to_string()))
            .cloned())
    }

    async fn delete_document(&self, namespace: &str, id: &str) -> Result<bool, StoreError> {
        let mut documents = self.documents.write().await;
        Ok(documents
            .remove(&(namespace.to_string(), id.to_string()))
            .is_some())
    }

    async fn list_documents(&self, namespace: &str) -> Result<Vec<Document>, StoreError> {
        let documents = self.documents.read().await;
        Ok(documents
            .iter()
            .filter(|((doc_namespace, _), _)| doc_namespace == namespace)
            .map(|(_, document)| document.clone())
            .collect())
    }
}
