//! Integration tests for the vector store contract.
//!
//! Exercises the contract over the in-memory backends, with a scripted
//! wrapper that injects failures into chosen backend calls.

use async_trait::async_trait;
use stache_core::{
    BatchResult, CapabilityDescriptor, Collection, DistanceMetric, FailureReason,
    FilterExpression, Metadata, MetadataValue, ScoredRecord, StoreError, VectorBackend,
    VectorRecord,
};
use stache_store::{
    Cancellation, MemoryBackend, MemoryOptions, NAMESPACE_FIELD, RetryPolicy, StoreConfig,
    UpdateConfig, VectorStore,
};
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

const COLLECTION: &str = "docs";

/// Backend wrapper that fails chosen insert calls and can simulate a
/// concurrent writer.
struct ScriptedBackend {
    inner: MemoryBackend,
    /// Errors keyed by 1-based insert call number
    insert_failures: Mutex<HashMap<usize, StoreError>>,
    insert_calls: AtomicUsize,
    insert_sizes: Mutex<Vec<usize>>,
    /// Cancelled during the first insert call
    cancel_on_insert: Option<Cancellation>,
    /// Put the deleted records back after the next delete call
    restore_on_delete: AtomicBool,
}

impl ScriptedBackend {
    fn new(inner: MemoryBackend) -> Self {
        Self {
            inner,
            insert_failures: Mutex::new(HashMap::new()),
            insert_calls: AtomicUsize::new(0),
            insert_sizes: Mutex::new(Vec::new()),
            cancel_on_insert: None,
            restore_on_delete: AtomicBool::new(false),
        }
    }

    fn fail_insert(self, call: usize, err: StoreError) -> Self {
        self.insert_failures.lock().unwrap().insert(call, err);
        self
    }

    fn cancel_on_insert(mut self, cancel: Cancellation) -> Self {
        self.cancel_on_insert = Some(cancel);
        self
    }

    fn restore_after_next_delete(self) -> Self {
        self.restore_on_delete.store(true, Ordering::SeqCst);
        self
    }

    fn insert_calls(&self) -> usize {
        self.insert_calls.load(Ordering::SeqCst)
    }

    fn insert_sizes(&self) -> Vec<usize> {
        self.insert_sizes.lock().unwrap().clone()
    }
}

#[async_trait]
impl VectorBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    fn capabilities(&self) -> &CapabilityDescriptor {
        self.inner.capabilities()
    }

    async fn create_collection(&self, collection: &Collection) -> Result<(), StoreError> {
        self.inner.create_collection(collection).await
    }

    async fn get_collection(&self, name: &str) -> Result<Option<Collection>, StoreError> {
        self.inner.get_collection(name).await
    }

    async fn insert(
        &self,
        collection: &str,
        namespace: &str,
        records: &[VectorRecord],
    ) -> Result<BatchResult, StoreError> {
        let call = self.insert_calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.insert_sizes.lock().unwrap().push(records.len());
        if let Some(cancel) = &self.cancel_on_insert {
            cancel.cancel();
        }
        let scripted = self.insert_failures.lock().unwrap().remove(&call);
        if let Some(err) = scripted {
            return Err(err);
        }
        self.inner.insert(collection, namespace, records).await
    }

    async fn search(
        &self,
        collection: &str,
        namespace: &str,
        query: &[f32],
        k: usize,
        filter: Option<&FilterExpression>,
    ) -> Result<Vec<ScoredRecord>, StoreError> {
        self.inner.search(collection, namespace, query, k, filter).await
    }

    async fn delete(
        &self,
        collection: &str,
        namespace: &str,
        ids: &[String],
    ) -> Result<Vec<String>, StoreError> {
        if !self.restore_on_delete.swap(false, Ordering::SeqCst) {
            return self.inner.delete(collection, namespace, ids).await;
        }
        let snapshot = self.inner.fetch(collection, namespace, ids).await?;
        let removed = self.inner.delete(collection, namespace, ids).await?;
        self.inner.insert(collection, namespace, &snapshot).await?;
        Ok(removed)
    }

    async fn fetch(
        &self,
        collection: &str,
        namespace: &str,
        ids: &[String],
    ) -> Result<Vec<VectorRecord>, StoreError> {
        self.inner.fetch(collection, namespace, ids).await
    }

    async fn update(
        &self,
        collection: &str,
        namespace: &str,
        id: &str,
        patch: &Metadata,
    ) -> Result<(), StoreError> {
        self.inner.update(collection, namespace, id, patch).await
    }
}

fn fast_config() -> StoreConfig {
    StoreConfig {
        max_concurrency: 1,
        retry: RetryPolicy {
            max_attempts: 3,
            initial_backoff_ms: 1,
            max_backoff_ms: 2,
        },
        ..StoreConfig::default()
    }
}

fn small_batches(max_batch_size: usize) -> MemoryBackend {
    MemoryBackend::with_options(
        "memory",
        MemoryOptions {
            max_batch_size,
            ..MemoryOptions::mutable()
        },
    )
}

async fn open(backend: Arc<ScriptedBackend>, config: StoreConfig) -> VectorStore {
    let store = VectorStore::new(backend, config);
    store
        .create_collection(&Collection::new(COLLECTION, 2, DistanceMetric::Cosine))
        .await
        .unwrap();
    store
}

fn records(n: usize) -> Vec<VectorRecord> {
    (0..n)
        .map(|i| VectorRecord::new(format!("rec-{i:04}"), vec![1.0, i as f32]))
        .collect()
}

fn ids(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| (*v).to_string()).collect()
}

fn patch(pairs: &[(&str, MetadataValue)]) -> Metadata {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), v.clone()))
        .collect()
}

fn id_set(hits: &[ScoredRecord]) -> BTreeSet<String> {
    hits.iter().map(|hit| hit.record.id.clone()).collect()
}

// ============================================================================
// Batching
// ============================================================================

#[tokio::test]
async fn test_insert_chunks_to_backend_batch_limit() {
    let backend = Arc::new(ScriptedBackend::new(MemoryBackend::new()));
    let store = open(Arc::clone(&backend), fast_config()).await;

    let input = records(2500);
    let result = store.insert(COLLECTION, &input, "").await.unwrap();

    assert_eq!(backend.insert_sizes(), vec![1000, 1000, 500]);
    assert!(result.is_complete());
    let expected: Vec<String> = input.iter().map(|r| r.id.clone()).collect();
    assert_eq!(result.succeeded, expected);
}

#[tokio::test]
async fn test_transient_chunk_failure_is_retried() {
    let backend = Arc::new(
        ScriptedBackend::new(MemoryBackend::new())
            .fail_insert(1, StoreError::Transient("429 too many requests".to_string()))
            .fail_insert(2, StoreError::Transient("connection reset".to_string())),
    );
    let store = open(Arc::clone(&backend), fast_config()).await;

    let result = store.insert(COLLECTION, &records(10), "").await.unwrap();

    assert_eq!(backend.insert_calls(), 3);
    assert!(result.is_complete());
    assert_eq!(result.succeeded.len(), 10);
}

#[tokio::test]
async fn test_permanent_chunk_failure_is_not_retried() {
    let backend = Arc::new(
        ScriptedBackend::new(MemoryBackend::new())
            .fail_insert(1, StoreError::Permanent("invalid payload".to_string())),
    );
    let store = open(Arc::clone(&backend), fast_config()).await;

    let result = store.insert(COLLECTION, &records(10), "").await.unwrap();

    assert_eq!(backend.insert_calls(), 1);
    assert!(result.succeeded.is_empty());
    assert_eq!(result.failed.len(), 10);
    assert!(result
        .failed
        .values()
        .all(|reason| matches!(reason, FailureReason::Permanent(_))));
}

#[tokio::test]
async fn test_failed_chunk_does_not_stop_siblings() {
    let backend = Arc::new(
        ScriptedBackend::new(small_batches(2))
            .fail_insert(2, StoreError::Permanent("shard offline".to_string())),
    );
    let store = open(Arc::clone(&backend), fast_config()).await;

    let result = store.insert(COLLECTION, &records(6), "").await.unwrap();

    assert_eq!(result.succeeded, ids(&["rec-0000", "rec-0001", "rec-0004", "rec-0005"]));
    assert_eq!(
        result.failed.keys().cloned().collect::<Vec<_>>(),
        ids(&["rec-0002", "rec-0003"])
    );
}

#[tokio::test]
async fn test_per_record_failures_are_reported() {
    let backend = Arc::new(ScriptedBackend::new(MemoryBackend::new()));
    let store = open(backend, fast_config()).await;

    let input = vec![
        VectorRecord::new("ok", vec![1.0, 0.0]),
        VectorRecord::new("wrong-dimension", vec![1.0, 0.0, 0.0]),
    ];
    let result = store.insert(COLLECTION, &input, "").await.unwrap();

    assert_eq!(result.succeeded, ids(&["ok"]));
    assert!(matches!(
        &result.failed["wrong-dimension"],
        FailureReason::Permanent(msg) if msg.contains("dimension")
    ));
}

#[tokio::test]
async fn test_cancellation_skips_unstarted_chunks() {
    let cancel = Cancellation::new();
    let backend = Arc::new(ScriptedBackend::new(small_batches(2)).cancel_on_insert(cancel.clone()));
    let store = open(Arc::clone(&backend), fast_config()).await;

    let result = store
        .insert_with_cancellation(COLLECTION, &records(6), "", &cancel)
        .await
        .unwrap();

    assert_eq!(backend.insert_calls(), 1);
    assert_eq!(result.succeeded, ids(&["rec-0000", "rec-0001"]));
    assert_eq!(result.skipped, ids(&["rec-0002", "rec-0003", "rec-0004", "rec-0005"]));
    assert!(result.cancelled);
    assert!(result.failed.is_empty());
}

// ============================================================================
// Update Emulation
// ============================================================================

#[tokio::test]
async fn test_emulated_update_merges_metadata() {
    let backend = Arc::new(ScriptedBackend::new(MemoryBackend::immutable()));
    let store = open(Arc::clone(&backend), fast_config()).await;

    let record = VectorRecord::new("x", vec![0.3, 0.4])
        .with_metadata("a", 1)
        .with_metadata("b", 2);
    store.insert(COLLECTION, &[record], "tenant1").await.unwrap();

    store
        .update(COLLECTION, "x", &patch(&[("b", MetadataValue::from(3))]), "tenant1")
        .await
        .unwrap();

    let fetched = store
        .get_vectors_with_embeddings(COLLECTION, &ids(&["x"]), "tenant1")
        .await
        .unwrap();
    let updated = &fetched.records[0];
    assert_eq!(
        updated.metadata,
        patch(&[("a", MetadataValue::from(1)), ("b", MetadataValue::from(3))])
    );
    assert_eq!(updated.vector, vec![0.3, 0.4]);
    assert_eq!(updated.namespace, "tenant1");
}

#[tokio::test]
async fn test_reinsert_failure_raises_consistency_error_and_reconciles() {
    let backend = Arc::new(
        ScriptedBackend::new(MemoryBackend::immutable())
            .fail_insert(2, StoreError::Permanent("quota exceeded".to_string())),
    );
    let store = open(Arc::clone(&backend), fast_config()).await;

    let record = VectorRecord::new("x", vec![1.0, 0.0]).with_metadata("status", "draft");
    store.insert(COLLECTION, &[record], "tenant1").await.unwrap();

    let err = store
        .update(
            COLLECTION,
            "x",
            &patch(&[("status", MetadataValue::from("published"))]),
            "tenant1",
        )
        .await
        .unwrap_err();

    let StoreError::UpdateConsistency(pending) = err else {
        panic!("Expected UpdateConsistency, got {err:?}");
    };
    assert_eq!(pending.collection, COLLECTION);
    assert_eq!(pending.identifier, "x");
    assert_eq!(pending.namespace, "tenant1");
    assert_eq!(pending.pending.metadata["status"], MetadataValue::from("published"));
    assert!(pending.reason.contains("quota exceeded"));

    // The record is gone until reconciled
    let fetched = store
        .get_vectors_with_embeddings(COLLECTION, &ids(&["x"]), "tenant1")
        .await
        .unwrap();
    assert!(fetched.records.is_empty());
    assert_eq!(fetched.outcome.failed["x"], FailureReason::NotFound);

    store.reconcile(&pending).await.unwrap();
    let fetched = store
        .get_vectors_with_embeddings(COLLECTION, &ids(&["x"]), "tenant1")
        .await
        .unwrap();
    assert_eq!(fetched.records[0].metadata["status"], MetadataValue::from("published"));
    assert_eq!(fetched.records[0].vector, vec![1.0, 0.0]);

    // Reconciling a present record is a no-op
    let calls = backend.insert_calls();
    store.reconcile(&pending).await.unwrap();
    assert_eq!(backend.insert_calls(), calls);
}

#[tokio::test]
async fn test_automatic_reconciliation() {
    let backend = Arc::new(
        ScriptedBackend::new(MemoryBackend::immutable())
            .fail_insert(2, StoreError::Permanent("quota exceeded".to_string())),
    );
    let config = StoreConfig {
        update: UpdateConfig {
            emulate: true,
            reconcile_attempts: 1,
        },
        ..fast_config()
    };
    let store = open(Arc::clone(&backend), config).await;

    store
        .insert(COLLECTION, &[VectorRecord::new("x", vec![1.0, 0.0])], "")
        .await
        .unwrap();
    store
        .update(COLLECTION, "x", &patch(&[("seen", MetadataValue::from(true))]), "")
        .await
        .unwrap();

    assert_eq!(backend.insert_calls(), 3);
    let fetched = store
        .get_vectors_with_embeddings(COLLECTION, &ids(&["x"]), "")
        .await
        .unwrap();
    assert_eq!(fetched.records[0].metadata["seen"], MetadataValue::from(true));
}

#[tokio::test]
async fn test_reconciliation_merges_into_record_restored_by_another_writer() {
    let backend = Arc::new(
        ScriptedBackend::new(MemoryBackend::immutable()).restore_after_next_delete(),
    );
    let config = StoreConfig {
        update: UpdateConfig {
            emulate: true,
            reconcile_attempts: 1,
        },
        ..fast_config()
    };
    let store = open(Arc::clone(&backend), config).await;

    let record = VectorRecord::new("x", vec![1.0, 0.0])
        .with_metadata("a", 1)
        .with_metadata("b", 2);
    store.insert(COLLECTION, &[record], "").await.unwrap();

    store
        .update(COLLECTION, "x", &patch(&[("b", MetadataValue::from(3))]), "")
        .await
        .unwrap();

    // Initial write, the rejected reinsert, then the merge during reconciliation
    assert_eq!(backend.insert_calls(), 3);
    let fetched = store
        .get_vectors_with_embeddings(COLLECTION, &ids(&["x"]), "")
        .await
        .unwrap();
    assert_eq!(
        fetched.records[0].metadata,
        patch(&[("a", MetadataValue::from(1)), ("b", MetadataValue::from(3))])
    );
}

#[tokio::test]
async fn test_manual_reconcile_merges_into_restored_record() {
    let backend = Arc::new(
        ScriptedBackend::new(MemoryBackend::immutable()).restore_after_next_delete(),
    );
    let store = open(Arc::clone(&backend), fast_config()).await;

    let record = VectorRecord::new("x", vec![1.0, 0.0]).with_metadata("status", "draft");
    store.insert(COLLECTION, &[record], "tenant1").await.unwrap();

    let err = store
        .update(
            COLLECTION,
            "x",
            &patch(&[("status", MetadataValue::from("published"))]),
            "tenant1",
        )
        .await
        .unwrap_err();
    let StoreError::UpdateConsistency(pending) = err else {
        panic!("Expected UpdateConsistency, got {err:?}");
    };
    assert_eq!(pending.patch["status"], MetadataValue::from("published"));

    // The other writer's copy survives without the update
    let fetched = store
        .get_vectors_with_embeddings(COLLECTION, &ids(&["x"]), "tenant1")
        .await
        .unwrap();
    assert_eq!(fetched.records[0].metadata["status"], MetadataValue::from("draft"));

    store.reconcile(&pending).await.unwrap();
    let fetched = store
        .get_vectors_with_embeddings(COLLECTION, &ids(&["x"]), "tenant1")
        .await
        .unwrap();
    assert_eq!(fetched.records[0].metadata["status"], MetadataValue::from("published"));
    assert_eq!(fetched.records[0].namespace, "tenant1");
}

#[tokio::test]
async fn test_native_update_reports_caller_identifier_under_emulated_namespaces() {
    let backend = Arc::new(ScriptedBackend::new(MemoryBackend::with_options(
        "memory",
        MemoryOptions {
            supports_namespaces: false,
            ..MemoryOptions::mutable()
        },
    )));
    let store = open(backend, fast_config()).await;
    assert!(store.namespaces().is_emulated());

    let err = store
        .update(COLLECTION, "x", &patch(&[("b", MetadataValue::from(3))]), "tenant1")
        .await
        .unwrap_err();
    match err {
        StoreError::RecordNotFound {
            collection,
            identifier,
            namespace,
        } => {
            assert_eq!(collection, COLLECTION);
            assert_eq!(identifier, "x");
            assert_eq!(namespace, "tenant1");
        }
        other => panic!("Expected RecordNotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn test_transient_reinsert_failure_is_retried() {
    let backend = Arc::new(
        ScriptedBackend::new(MemoryBackend::immutable())
            .fail_insert(2, StoreError::Transient("timeout".to_string())),
    );
    let store = open(Arc::clone(&backend), fast_config()).await;

    store
        .insert(COLLECTION, &[VectorRecord::new("x", vec![1.0, 0.0])], "")
        .await
        .unwrap();
    store
        .update(COLLECTION, "x", &patch(&[("v", MetadataValue::from(2))]), "")
        .await
        .unwrap();

    assert_eq!(backend.insert_calls(), 3);
}

// ============================================================================
// Filtering
// ============================================================================

fn filter_fixture() -> Vec<VectorRecord> {
    (0..20)
        .map(|i| {
            let kind = if i % 3 == 0 { "faq" } else { "guide" };
            let mut record = VectorRecord::new(format!("doc-{i:02}"), vec![1.0, i as f32 / 10.0])
                .with_metadata("kind", kind)
                .with_metadata("year", 2010 + i64::from(i));
            if i % 7 == 0 {
                record = record.with_metadata("pinned", true);
            }
            record
        })
        .collect()
}

/// (kind = guide AND year >= 2020) OR pinned exists
fn compound_filter() -> FilterExpression {
    FilterExpression::eq("kind", "guide")
        .and(FilterExpression::gte("year", 2020))
        .or(FilterExpression::exists("pinned"))
}

async fn search_with(backend: MemoryBackend, namespace: &str) -> BTreeSet<String> {
    let store = open(Arc::new(ScriptedBackend::new(backend)), fast_config()).await;
    store
        .insert(COLLECTION, &filter_fixture(), namespace)
        .await
        .unwrap();
    let hits = store
        .search(COLLECTION, &[1.0, 0.5], 20, Some(&compound_filter()), namespace)
        .await
        .unwrap();
    id_set(&hits)
}

#[tokio::test]
async fn test_native_and_client_side_filtering_agree() {
    let expected: BTreeSet<String> = filter_fixture()
        .into_iter()
        .filter(|r| compound_filter().matches(&r.metadata))
        .map(|r| r.id)
        .collect();
    assert!(!expected.is_empty());

    let native = search_with(MemoryBackend::new(), "").await;

    let no_filtering = MemoryBackend::with_options(
        "memory",
        MemoryOptions {
            supports_filtering: false,
            ..MemoryOptions::mutable()
        },
    );
    let client_side = search_with(no_filtering, "").await;

    // Emulated namespaces lack gte and exists, so the whole tree runs client-side
    let emulated = search_with(MemoryBackend::immutable(), "tenant1").await;

    assert_eq!(native, expected);
    assert_eq!(client_side, expected);
    assert_eq!(emulated, expected);
}

#[tokio::test]
async fn test_client_side_filter_truncates_to_k() {
    let backend = MemoryBackend::with_options(
        "memory",
        MemoryOptions {
            supports_filtering: false,
            ..MemoryOptions::mutable()
        },
    );
    let store = open(Arc::new(ScriptedBackend::new(backend)), fast_config()).await;
    store.insert(COLLECTION, &filter_fixture(), "").await.unwrap();

    let filter = FilterExpression::eq("kind", "guide");
    let hits = store
        .search(COLLECTION, &[1.0, 0.5], 3, Some(&filter), "")
        .await
        .unwrap();

    assert_eq!(hits.len(), 3);
    assert!(hits
        .iter()
        .all(|hit| hit.record.metadata["kind"] == MetadataValue::from("guide")));
    assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
}

#[tokio::test]
async fn test_client_side_filter_widens_past_crowded_neighbours() {
    let backend = Arc::new(ScriptedBackend::new(MemoryBackend::immutable()));
    let store = open(backend, fast_config()).await;

    let crowd: Vec<VectorRecord> = (0..10)
        .map(|i| {
            VectorRecord::new(format!("near-{i}"), vec![1.0, 0.01 * i as f32])
                .with_metadata("year", 2020)
        })
        .collect();
    store.insert(COLLECTION, &crowd, "tenant2").await.unwrap();
    store
        .insert(
            COLLECTION,
            &[VectorRecord::new("far", vec![0.2, 1.0]).with_metadata("year", 2021)],
            "tenant1",
        )
        .await
        .unwrap();

    let recent = FilterExpression::gt("year", 2000);
    let hits = store
        .search(COLLECTION, &[1.0, 0.0], 1, Some(&recent), "tenant1")
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].record.id, "far");
    assert_eq!(hits[0].record.namespace, "tenant1");
}

// ============================================================================
// Namespaces
// ============================================================================

#[tokio::test]
async fn test_emulated_namespaces_isolate_tenants() {
    let backend = Arc::new(ScriptedBackend::new(MemoryBackend::immutable()));
    let store = open(Arc::clone(&backend), fast_config()).await;
    assert!(store.namespaces().is_emulated());

    store
        .insert(
            COLLECTION,
            &[VectorRecord::new("doc", vec![1.0, 0.0]).with_metadata("owner", "t1")],
            "t1",
        )
        .await
        .unwrap();
    store
        .insert(
            COLLECTION,
            &[VectorRecord::new("doc", vec![1.0, 0.1]).with_metadata("owner", "t2")],
            "t2",
        )
        .await
        .unwrap();

    let hits = store.search(COLLECTION, &[1.0, 0.0], 10, None, "t1").await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].record.id, "doc");
    assert_eq!(hits[0].record.metadata["owner"], MetadataValue::from("t1"));
    assert!(!hits[0].record.metadata.contains_key(NAMESPACE_FIELD));

    let foreign = FilterExpression::eq("owner", "t2");
    let hits = store
        .search(COLLECTION, &[1.0, 0.0], 10, Some(&foreign), "t1")
        .await
        .unwrap();
    assert!(hits.is_empty());

    // Both tenants share the backend under mangled identifiers
    let raw = backend
        .fetch(COLLECTION, "", &ids(&["2:t1:doc", "2:t2:doc"]))
        .await
        .unwrap();
    assert_eq!(raw.len(), 2);
    assert_eq!(raw[0].metadata[NAMESPACE_FIELD], MetadataValue::from("t1"));

    // Deleting in one tenant leaves the other untouched
    let deleted = store.delete(COLLECTION, &ids(&["doc"]), "t1").await.unwrap();
    assert_eq!(deleted.succeeded, ids(&["doc"]));
    let remaining = store
        .get_vectors_with_embeddings(COLLECTION, &ids(&["doc"]), "t2")
        .await
        .unwrap();
    assert_eq!(remaining.records.len(), 1);
    assert_eq!(remaining.records[0].metadata["owner"], MetadataValue::from("t2"));
}

#[tokio::test]
async fn test_fetch_collapses_repeated_identifiers() {
    let backend = Arc::new(ScriptedBackend::new(MemoryBackend::new()));
    let store = open(backend, fast_config()).await;
    store.insert(COLLECTION, &records(2), "").await.unwrap();

    let fetched = store
        .get_vectors_with_embeddings(
            COLLECTION,
            &ids(&["rec-0001", "rec-0001", "missing", "missing"]),
            "",
        )
        .await
        .unwrap();
    assert_eq!(fetched.records.len(), 1);
    assert_eq!(fetched.records[0].id, "rec-0001");
    assert_eq!(fetched.outcome.succeeded, ids(&["rec-0001"]));
    assert_eq!(fetched.outcome.failed.len(), 1);
    assert_eq!(fetched.outcome.failed["missing"], FailureReason::NotFound);
}

#[tokio::test]
async fn test_delete_is_idempotent() {
    let backend = Arc::new(ScriptedBackend::new(MemoryBackend::new()));
    let store = open(backend, fast_config()).await;
    store.insert(COLLECTION, &records(3), "").await.unwrap();

    let first = store
        .delete(COLLECTION, &ids(&["rec-0000", "missing"]), "")
        .await
        .unwrap();
    assert_eq!(first.succeeded, ids(&["rec-0000"]));
    assert!(first.failed.is_empty());

    let second = store
        .delete(COLLECTION, &ids(&["rec-0000", "missing"]), "")
        .await
        .unwrap();
    assert!(second.succeeded.is_empty());
    assert!(second.failed.is_empty());
    assert!(second.is_complete());
}
