//! Uniform vector store contract over capability-diverse backends.
//!
//! [`VectorStore`] wraps one [`VectorBackend`] and its capability descriptor
//! and presents the same operations whatever the backend can do:
//!
//! - multi-record calls are chunked to the backend's batch limit by the
//!   [`BatchScheduler`], with transient failures retried
//! - filters run natively when the backend understands the whole tree and
//!   client-side on an over-fetched candidate set otherwise
//! - namespaces are emulated on backends without native partitions
//! - metadata updates are emulated on write-once backends by fetch, merge,
//!   delete and reinsert
//!
//! The contract holds no record state of its own.

use serde::{Deserialize, Serialize};
use stache_core::{
    BatchResult, CapabilityDescriptor, Collection, FailureReason, FetchResult, FilterExpression,
    FilterPlan, Metadata, ScoredRecord, StoreError, UpdateConsistencyError, VectorBackend,
    VectorRecord,
};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::namespace::NamespaceManager;
use crate::scheduler::{
    BatchScheduler, Cancellation, DEFAULT_MAX_CONCURRENCY, RetryPolicy, aggregate,
};

/// Store contract configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Candidates fetched per requested result when filtering client-side
    #[serde(default = "default_overfetch_factor")]
    pub overfetch_factor: usize,

    /// Chunks dispatched concurrently
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    #[serde(default)]
    pub retry: RetryPolicy,

    #[serde(default)]
    pub update: UpdateConfig,
}

fn default_overfetch_factor() -> usize {
    4
}

fn default_max_concurrency() -> usize {
    DEFAULT_MAX_CONCURRENCY
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            overfetch_factor: default_overfetch_factor(),
            max_concurrency: default_max_concurrency(),
            retry: RetryPolicy::default(),
            update: UpdateConfig::default(),
        }
    }
}

/// Update emulation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateConfig {
    /// Emulate updates on backends without native update
    #[serde(default = "default_emulate")]
    pub emulate: bool,

    /// Automatic reconciliation passes before a consistency error surfaces
    /// (0 leaves reconciliation to the caller)
    #[serde(default)]
    pub reconcile_attempts: u32,
}

fn default_emulate() -> bool {
    true
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            emulate: default_emulate(),
            reconcile_attempts: 0,
        }
    }
}

/// The vector store contract.
pub struct VectorStore {
    backend: Arc<dyn VectorBackend>,
    capabilities: CapabilityDescriptor,
    namespaces: NamespaceManager,
    scheduler: BatchScheduler,
    config: StoreConfig,
}

impl VectorStore {
    /// Wrap a backend. Its capability descriptor is read once here.
    pub fn new(backend: Arc<dyn VectorBackend>, config: StoreConfig) -> Self {
        let capabilities = backend.capabilities().clone();
        let namespaces = NamespaceManager::for_capabilities(&capabilities);
        let scheduler = BatchScheduler::new(config.max_concurrency, config.retry.clone());
        debug!(
            "Vector store over {} (batch {}, namespaces {:?}, native update {})",
            backend.name(),
            capabilities.max_batch_size,
            namespaces.mode(),
            capabilities.supports_native_update
        );
        Self {
            backend,
            capabilities,
            namespaces,
            scheduler,
            config,
        }
    }

    pub fn backend(&self) -> &Arc<dyn VectorBackend> {
        &self.backend
    }

    pub fn capabilities(&self) -> &CapabilityDescriptor {
        &self.capabilities
    }

    pub fn namespaces(&self) -> &NamespaceManager {
        &self.namespaces
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    // ========================================================================
    // Collections
    // ========================================================================

    /// Create a collection; an identical definition is a no-op.
    pub async fn create_collection(&self, collection: &Collection) -> Result<(), StoreError> {
        self.scheduler
            .with_retry(|| self.backend.create_collection(collection))
            .await
    }

    /// Look up a collection definition.
    pub async fn collection(&self, name: &str) -> Result<Collection, StoreError> {
        self.scheduler
            .with_retry(|| self.backend.get_collection(name))
            .await?
            .ok_or_else(|| StoreError::CollectionNotFound(name.to_string()))
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Insert records into a namespace.
    pub async fn insert(
        &self,
        collection: &str,
        records: &[VectorRecord],
        namespace: &str,
    ) -> Result<BatchResult, StoreError> {
        self.insert_with_cancellation(collection, records, namespace, &Cancellation::new())
            .await
    }

    /// Insert records, stopping before the next chunk once `cancel` fires.
    ///
    /// Duplicate identifiers, records owned by another namespace and reserved
    /// metadata keys are rejected before any backend call.
    pub async fn insert_with_cancellation(
        &self,
        collection: &str,
        records: &[VectorRecord],
        namespace: &str,
        cancel: &Cancellation,
    ) -> Result<BatchResult, StoreError> {
        let duplicates = duplicate_ids(records.iter().map(|r| r.id.as_str()));
        if !duplicates.is_empty() {
            return Err(StoreError::DuplicateIdentifier(duplicates));
        }

        if let Some(record) = records
            .iter()
            .find(|r| !r.namespace.is_empty() && r.namespace != namespace)
        {
            return Err(StoreError::NamespaceMismatch {
                identifier: record.id.clone(),
                expected: namespace.to_string(),
                found: record.namespace.clone(),
            });
        }

        let stored = records
            .iter()
            .map(|record| self.namespaces.to_backend(namespace, record))
            .collect::<Result<Vec<_>, _>>()?;

        let backend_namespace = self.namespaces.backend_namespace(namespace);
        let reports = self
            .scheduler
            .run(
                &stored,
                self.capabilities.max_batch_size,
                |record| record.id.clone(),
                cancel,
                |chunk| self.backend.insert(collection, backend_namespace, chunk),
            )
            .await;

        let result = aggregate(reports, |result, _, chunk_result| result.merge(chunk_result))
            .map_ids(|id| self.namespaces.unmangle_id(namespace, id).map(str::to_string));

        info!(
            "Inserted {}/{} records into {} (namespace '{}')",
            result.succeeded.len(),
            records.len(),
            collection,
            namespace
        );
        if !result.failed.is_empty() {
            warn!("{} records failed to insert into {}", result.failed.len(), collection);
        }
        Ok(result)
    }

    /// Delete records from a namespace.
    ///
    /// Idempotent: `succeeded` lists the identifiers actually removed and
    /// absent identifiers are neither succeeded nor failed.
    pub async fn delete(
        &self,
        collection: &str,
        ids: &[String],
        namespace: &str,
    ) -> Result<BatchResult, StoreError> {
        self.delete_with_cancellation(collection, ids, namespace, &Cancellation::new())
            .await
    }

    pub async fn delete_with_cancellation(
        &self,
        collection: &str,
        ids: &[String],
        namespace: &str,
        cancel: &Cancellation,
    ) -> Result<BatchResult, StoreError> {
        let mut seen = HashSet::new();
        let backend_ids: Vec<String> = ids
            .iter()
            .filter(|id| seen.insert(id.as_str()))
            .map(|id| self.namespaces.mangle_id(namespace, id))
            .collect();

        let backend_namespace = self.namespaces.backend_namespace(namespace);
        let reports = self
            .scheduler
            .run(
                &backend_ids,
                self.capabilities.max_batch_size,
                String::clone,
                cancel,
                |chunk| self.backend.delete(collection, backend_namespace, chunk),
            )
            .await;

        let result = aggregate(reports, |result, _, removed| {
            result.succeeded.extend(removed);
        })
        .map_ids(|id| self.namespaces.unmangle_id(namespace, id).map(str::to_string));

        info!(
            "Deleted {} of {} records from {} (namespace '{}')",
            result.succeeded.len(),
            backend_ids.len(),
            collection,
            namespace
        );
        Ok(result)
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Rank records by similarity, honoring the filter and the namespace.
    ///
    /// The effective filter (caller filter AND namespace isolation) is either
    /// evaluated entirely by the backend or entirely here, never split.
    pub async fn search(
        &self,
        collection: &str,
        query: &[f32],
        k: usize,
        filter: Option<&FilterExpression>,
        namespace: &str,
    ) -> Result<Vec<ScoredRecord>, StoreError> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let effective = self.namespaces.scope_filter(namespace, filter);
        let plan = FilterPlan::for_capabilities(effective.as_ref(), &self.capabilities);
        let backend_namespace = self.namespaces.backend_namespace(namespace);

        let hits = match plan {
            FilterPlan::Unfiltered | FilterPlan::Native(_) => {
                debug!("Searching {} with {:?}", collection, plan);
                self.scheduler
                    .with_retry(|| {
                        self.backend
                            .search(collection, backend_namespace, query, k, plan.native())
                    })
                    .await?
            }
            FilterPlan::ClientSide(expr) => {
                let mut candidates = k.saturating_mul(self.config.overfetch_factor.max(1));
                warn!(
                    "{} cannot evaluate the filter natively; ranking {} candidates client-side",
                    self.backend.name(),
                    candidates
                );
                // Widen until k matches survive or the backend runs out of records
                loop {
                    let mut hits = self
                        .scheduler
                        .with_retry(|| {
                            self.backend
                                .search(collection, backend_namespace, query, candidates, None)
                        })
                        .await?;
                    let exhausted = hits.len() < candidates || candidates == usize::MAX;
                    hits.retain(|hit| expr.matches(&hit.record.metadata));
                    if hits.len() >= k || exhausted {
                        break hits;
                    }
                    candidates = candidates.saturating_mul(2);
                    debug!(
                        "Only {} of {} matches in the window, widening to {} candidates",
                        hits.len(),
                        k,
                        candidates
                    );
                }
            }
        };

        Ok(hits
            .into_iter()
            .filter_map(|hit| {
                let score = hit.score;
                self.namespaces
                    .from_backend(namespace, hit.record)
                    .map(|record| ScoredRecord { record, score })
            })
            .take(k)
            .collect())
    }

    /// Fetch records with their vectors.
    ///
    /// Found identifiers are reported as succeeded and misses as
    /// [`FailureReason::NotFound`]; one miss never aborts the rest.
    pub async fn get_vectors_with_embeddings(
        &self,
        collection: &str,
        ids: &[String],
        namespace: &str,
    ) -> Result<FetchResult, StoreError> {
        let mut seen = HashSet::new();
        let unique: Vec<&String> = ids.iter().filter(|id| seen.insert(id.as_str())).collect();
        let backend_ids: Vec<String> = unique
            .iter()
            .map(|id| self.namespaces.mangle_id(namespace, id))
            .collect();

        let backend_namespace = self.namespaces.backend_namespace(namespace);
        let reports = self
            .scheduler
            .run(
                &backend_ids,
                self.capabilities.max_batch_size,
                String::clone,
                &Cancellation::new(),
                |chunk| self.backend.fetch(collection, backend_namespace, chunk),
            )
            .await;

        let mut found: HashMap<String, VectorRecord> = HashMap::new();
        let outcome = aggregate(reports, |result, chunk_ids, records| {
            let mut returned = HashSet::new();
            for record in records {
                let backend_id = record.id.clone();
                if let Some(record) = self.namespaces.from_backend(namespace, record) {
                    returned.insert(backend_id);
                    found.insert(record.id.clone(), record);
                }
            }
            for backend_id in chunk_ids {
                if returned.contains(&backend_id) {
                    result.succeed(backend_id);
                } else {
                    result.fail(backend_id, FailureReason::NotFound);
                }
            }
        })
        .map_ids(|id| self.namespaces.unmangle_id(namespace, id).map(str::to_string));

        let records = unique.into_iter().filter_map(|id| found.remove(id)).collect();
        Ok(FetchResult { records, outcome })
    }

    // ========================================================================
    // Update
    // ========================================================================

    /// Merge a metadata patch into one record.
    ///
    /// Patch keys overwrite, other keys are preserved and the vector is kept.
    /// Concurrent updates of the same identifier race; the last reinsert wins.
    pub async fn update(
        &self,
        collection: &str,
        id: &str,
        patch: &Metadata,
        namespace: &str,
    ) -> Result<(), StoreError> {
        self.namespaces.check_metadata(patch)?;

        if self.capabilities.supports_native_update {
            let backend_id = self.namespaces.mangle_id(namespace, id);
            let backend_namespace = self.namespaces.backend_namespace(namespace);
            return self
                .scheduler
                .with_retry(|| {
                    self.backend
                        .update(collection, backend_namespace, &backend_id, patch)
                })
                .await
                .map_err(|e| match e {
                    StoreError::RecordNotFound { collection, .. } => StoreError::RecordNotFound {
                        collection,
                        identifier: id.to_string(),
                        namespace: namespace.to_string(),
                    },
                    other => other,
                });
        }

        if !self.config.update.emulate {
            return Err(StoreError::CapabilityUnsupported(format!(
                "{} does not support update and emulation is disabled",
                self.backend.name()
            )));
        }

        match self.emulate_update(collection, id, patch, namespace).await {
            Err(StoreError::UpdateConsistency(pending)) => {
                self.reconcile_automatically(*pending).await
            }
            other => other,
        }
    }

    async fn emulate_update(
        &self,
        collection: &str,
        id: &str,
        patch: &Metadata,
        namespace: &str,
    ) -> Result<(), StoreError> {
        let current = self
            .fetch_one(collection, id, namespace)
            .await?
            .ok_or_else(|| StoreError::RecordNotFound {
                collection: collection.to_string(),
                identifier: id.to_string(),
                namespace: namespace.to_string(),
            })?;

        let mut merged = current;
        merged.metadata.extend(patch.clone());
        let stored = self.namespaces.to_backend(namespace, &merged)?;
        let backend_namespace = self.namespaces.backend_namespace(namespace);
        let backend_ids = [stored.id.clone()];

        self.scheduler
            .with_retry(|| self.backend.delete(collection, backend_namespace, &backend_ids))
            .await?;

        // The record is gone until the reinsert lands
        if let Err(e) = self.write_one(collection, backend_namespace, &stored).await {
            warn!(
                "Update of {} in {} deleted the record but could not reinsert it: {}",
                id, collection, e
            );
            return Err(UpdateConsistencyError {
                collection: collection.to_string(),
                identifier: id.to_string(),
                namespace: namespace.to_string(),
                pending: merged,
                patch: patch.clone(),
                reason: e.to_string(),
            }
            .into());
        }

        debug!("Emulated update of {} in {}", id, collection);
        Ok(())
    }

    async fn reconcile_automatically(
        &self,
        mut pending: UpdateConsistencyError,
    ) -> Result<(), StoreError> {
        for attempt in 1..=self.config.update.reconcile_attempts {
            match self.reconcile(&pending).await {
                Ok(()) => return Ok(()),
                Err(StoreError::UpdateConsistency(next)) => {
                    warn!(
                        "Reconciliation {}/{} of {} left the record deleted again: {}",
                        attempt, self.config.update.reconcile_attempts, next.identifier, next.reason
                    );
                    pending = *next;
                }
                Err(e) => warn!(
                    "Reconciliation {}/{} of {} failed: {}",
                    attempt, self.config.update.reconcile_attempts, pending.identifier, e
                ),
            }
        }
        Err(pending.into())
    }

    /// Repair the outcome of a failed update emulation.
    ///
    /// Re-fetches the record. When it is absent the pending merged record is
    /// written. When another writer restored it, the patch is merged into the
    /// restored record unless every patched key already holds the patched
    /// value; that merge can fail with a fresh `UpdateConsistency` error.
    pub async fn reconcile(&self, pending: &UpdateConsistencyError) -> Result<(), StoreError> {
        let namespace = pending.namespace.as_str();
        if let Some(current) = self
            .fetch_one(&pending.collection, &pending.identifier, namespace)
            .await?
        {
            if patch_applied(&current.metadata, &pending.patch) {
                info!(
                    "Record {} in {} already carries the update, nothing to reconcile",
                    pending.identifier, pending.collection
                );
                return Ok(());
            }
            info!(
                "Record {} in {} was restored without the update, merging again",
                pending.identifier, pending.collection
            );
            return self
                .emulate_update(
                    &pending.collection,
                    &pending.identifier,
                    &pending.patch,
                    namespace,
                )
                .await;
        }

        let stored = self.namespaces.to_backend(namespace, &pending.pending)?;
        self.write_one(
            &pending.collection,
            self.namespaces.backend_namespace(namespace),
            &stored,
        )
        .await?;
        info!(
            "Reconciled {} in {} (namespace '{}')",
            pending.identifier, pending.collection, namespace
        );
        Ok(())
    }

    async fn fetch_one(
        &self,
        collection: &str,
        id: &str,
        namespace: &str,
    ) -> Result<Option<VectorRecord>, StoreError> {
        let backend_ids = [self.namespaces.mangle_id(namespace, id)];
        let backend_namespace = self.namespaces.backend_namespace(namespace);
        let records = self
            .scheduler
            .with_retry(|| self.backend.fetch(collection, backend_namespace, &backend_ids))
            .await?;
        Ok(records
            .into_iter()
            .find_map(|record| self.namespaces.from_backend(namespace, record)))
    }

    /// Write one already-translated record, surfacing a per-record failure
    /// as an error.
    async fn write_one(
        &self,
        collection: &str,
        backend_namespace: &str,
        stored: &VectorRecord,
    ) -> Result<(), StoreError> {
        let records = std::slice::from_ref(stored);
        let result = self
            .scheduler
            .with_retry(|| self.backend.insert(collection, backend_namespace, records))
            .await?;

        match result.failed.get(&stored.id) {
            None if result.succeeded.contains(&stored.id) => Ok(()),
            None => Err(StoreError::Permanent(format!(
                "backend did not acknowledge '{}'",
                stored.id
            ))),
            Some(FailureReason::Transient(msg)) => Err(StoreError::Transient(msg.clone())),
            Some(reason) => Err(StoreError::Permanent(reason.to_string())),
        }
    }
}

/// Whether every patched key holds the patched value.
fn patch_applied(metadata: &Metadata, patch: &Metadata) -> bool {
    patch.iter().all(|(key, value)| metadata.get(key) == Some(value))
}

/// Identifiers appearing more than once, sorted.
fn duplicate_ids<'a>(ids: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    let duplicates: BTreeSet<&str> = ids.filter(|id| !seen.insert(*id)).collect();
    duplicates.into_iter().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryBackend;
    use crate::namespace::NAMESPACE_FIELD;
    use stache_core::{DistanceMetric, MetadataValue};

    async fn store(backend: MemoryBackend) -> VectorStore {
        let store = VectorStore::new(Arc::new(backend), StoreConfig::default());
        store
            .create_collection(&Collection::new("docs", 2, DistanceMetric::Cosine))
            .await
            .unwrap();
        store
    }

    #[test]
    fn test_store_config_defaults() {
        let config = StoreConfig::default();
        assert_eq!(config.overfetch_factor, 4);
        assert_eq!(config.max_concurrency, 4);
        assert!(config.update.emulate);
        assert_eq!(config.update.reconcile_attempts, 0);
    }

    #[test]
    fn test_store_config_partial_toml() {
        let config: StoreConfig = toml::from_str(
            r#"
            overfetch_factor = 8

            [update]
            reconcile_attempts = 2
            "#,
        )
        .unwrap();
        assert_eq!(config.overfetch_factor, 8);
        assert_eq!(config.max_concurrency, 4);
        assert!(config.update.emulate);
        assert_eq!(config.update.reconcile_attempts, 2);
        assert_eq!(config.retry, RetryPolicy::default());
    }

    #[test]
    fn test_duplicate_ids() {
        assert_eq!(duplicate_ids(["a", "b", "a", "c", "b", "a"].into_iter()), vec!["a", "b"]);
        assert!(duplicate_ids(["a", "b"].into_iter()).is_empty());
    }

    #[tokio::test]
    async fn test_collection_lookup() {
        let store = store(MemoryBackend::new()).await;
        assert_eq!(store.collection("docs").await.unwrap().dimension, 2);
        assert_eq!(
            store.collection("nope").await.unwrap_err(),
            StoreError::CollectionNotFound("nope".to_string())
        );
    }

    #[tokio::test]
    async fn test_duplicate_identifiers_rejected_before_backend() {
        let store = store(MemoryBackend::new()).await;
        let records = vec![
            VectorRecord::new("a", vec![1.0, 0.0]),
            VectorRecord::new("a", vec![0.0, 1.0]),
        ];
        let err = store.insert("docs", &records, "").await.unwrap_err();
        assert_eq!(err, StoreError::DuplicateIdentifier(vec!["a".to_string()]));

        let fetched = store
            .get_vectors_with_embeddings("docs", &["a".to_string()], "")
            .await
            .unwrap();
        assert!(fetched.records.is_empty());
    }

    #[tokio::test]
    async fn test_record_namespace_must_match_call() {
        let store = store(MemoryBackend::new()).await;
        let records = vec![VectorRecord::new("a", vec![1.0, 0.0]).in_namespace("tenant2")];
        let err = store.insert("docs", &records, "tenant1").await.unwrap_err();
        assert!(matches!(err, StoreError::NamespaceMismatch { .. }));

        // A record without a namespace takes the call's
        let records = vec![VectorRecord::new("a", vec![1.0, 0.0])];
        let result = store.insert("docs", &records, "tenant1").await.unwrap();
        assert!(result.is_complete());
    }

    #[tokio::test]
    async fn test_reserved_field_rejected_on_emulated_namespaces() {
        let store = store(MemoryBackend::immutable()).await;
        let records = vec![VectorRecord::new("a", vec![1.0, 0.0]).with_metadata(NAMESPACE_FIELD, "x")];
        let err = store.insert("docs", &records, "").await.unwrap_err();
        assert_eq!(err, StoreError::ReservedField(NAMESPACE_FIELD.to_string()));

        let mut patch = Metadata::new();
        patch.insert(NAMESPACE_FIELD.to_string(), MetadataValue::from("tenant2"));
        let err = store.update("docs", "a", &patch, "").await.unwrap_err();
        assert_eq!(err, StoreError::ReservedField(NAMESPACE_FIELD.to_string()));
    }

    #[tokio::test]
    async fn test_native_update_path() {
        let store = store(MemoryBackend::new()).await;
        store
            .insert("docs", &[VectorRecord::new("a", vec![1.0, 0.0]).with_metadata("v", 1)], "")
            .await
            .unwrap();

        let mut patch = Metadata::new();
        patch.insert("v".to_string(), MetadataValue::from(2));
        store.update("docs", "a", &patch, "").await.unwrap();

        let fetched = store
            .get_vectors_with_embeddings("docs", &["a".to_string()], "")
            .await
            .unwrap();
        assert_eq!(fetched.records[0].metadata["v"], MetadataValue::from(2));
    }

    #[tokio::test]
    async fn test_update_emulation_disabled() {
        let config = StoreConfig {
            update: UpdateConfig {
                emulate: false,
                reconcile_attempts: 0,
            },
            ..StoreConfig::default()
        };
        let store = VectorStore::new(Arc::new(MemoryBackend::immutable()), config);
        let err = store
            .update("docs", "a", &Metadata::new(), "")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::CapabilityUnsupported(_)));
    }

    #[tokio::test]
    async fn test_emulated_update_of_missing_record() {
        let store = store(MemoryBackend::immutable()).await;
        let err = store
            .update("docs", "ghost", &Metadata::new(), "tenant1")
            .await
            .unwrap_err();
        assert_eq!(
            err,
            StoreError::RecordNotFound {
                collection: "docs".to_string(),
                identifier: "ghost".to_string(),
                namespace: "tenant1".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_search_zero_k() {
        let store = store(MemoryBackend::new()).await;
        assert!(store.search("docs", &[1.0, 0.0], 0, None, "").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_reports_misses_in_request_order() {
        let store = store(MemoryBackend::immutable()).await;
        store
            .insert(
                "docs",
                &[
                    VectorRecord::new("a", vec![1.0, 0.0]),
                    VectorRecord::new("b", vec![0.0, 1.0]),
                ],
                "tenant1",
            )
            .await
            .unwrap();

        let ids = vec!["b".to_string(), "missing".to_string(), "a".to_string()];
        let fetched = store
            .get_vectors_with_embeddings("docs", &ids, "tenant1")
            .await
            .unwrap();

        let order: Vec<&str> = fetched.records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(order, vec!["b", "a"]);
        assert_eq!(fetched.outcome.succeeded, vec!["b", "a"]);
        assert_eq!(fetched.outcome.failed["missing"], FailureReason::NotFound);
        assert!(fetched.records.iter().all(|r| r.namespace == "tenant1"));
        assert!(fetched
            .records
            .iter()
            .all(|r| !r.metadata.contains_key(NAMESPACE_FIELD)));
    }
}
