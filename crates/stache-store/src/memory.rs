//! In-memory vector backend.
//!
//! [`MemoryBackend`] keeps collections in memory and ranks with brute-force
//! scoring. Its capability descriptor is configurable, so one type covers
//! both the full-featured `memory` provider and the write-once
//! `memory-immutable` provider that exercises every emulation path of the
//! store contract.
//!
//! Native filters are translated to the JSON dialect through
//! [`JsonFilterTranslator`] and evaluated in that form.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use stache_core::{
    BatchResult, CapabilityDescriptor, Collection, Error, FailureReason, FilterExpression,
    FilterOperator, LogicalOperator, Metadata, ScoredRecord, StoreError, VectorBackend,
    VectorRecord, translate,
};
use stache_registry::ProviderOptions;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::translate::{JsonFilterTranslator, evaluate_json_filter};

/// Batch limit of the builtin memory providers.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 1000;

/// Options accepted by the memory providers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MemoryOptions {
    pub max_batch_size: usize,
    pub supports_filtering: bool,
    pub supports_namespaces: bool,
    pub supports_native_update: bool,
    /// Comparison operators evaluated natively
    pub filter_operators: Vec<FilterOperator>,
    /// Combinators evaluated natively
    pub logical_operators: Vec<LogicalOperator>,
    /// Reject writes to an existing identifier
    pub write_once: bool,
}

impl MemoryOptions {
    /// Options of the `memory` provider: everything supported.
    #[must_use]
    pub fn mutable() -> Self {
        Self {
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            supports_filtering: true,
            supports_namespaces: true,
            supports_native_update: true,
            filter_operators: FilterOperator::ALL.to_vec(),
            logical_operators: LogicalOperator::ALL.to_vec(),
            write_once: false,
        }
    }

    /// Options of the `memory-immutable` provider: write-once, no native
    /// namespaces, equality filters only.
    #[must_use]
    pub fn immutable() -> Self {
        Self {
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            supports_filtering: true,
            supports_namespaces: false,
            supports_native_update: false,
            filter_operators: vec![FilterOperator::Eq, FilterOperator::In],
            logical_operators: vec![LogicalOperator::And, LogicalOperator::Or],
            write_once: true,
        }
    }

    /// Apply provider options on top of these defaults.
    pub fn with_overrides(self, overrides: &ProviderOptions) -> Result<Self, Error> {
        let Value::Object(mut merged) = serde_json::to_value(&self)? else {
            return Err(Error::Config("memory options must serialize to a table".to_string()));
        };
        merged.extend(overrides.clone());
        Ok(serde_json::from_value(Value::Object(merged))?)
    }

    /// Capability descriptor these options produce.
    #[must_use]
    pub fn capabilities(&self) -> CapabilityDescriptor {
        CapabilityDescriptor {
            max_batch_size: self.max_batch_size,
            supports_filtering: self.supports_filtering,
            supported_filter_operators: self.filter_operators.iter().copied().collect(),
            supported_logical_operators: self.logical_operators.iter().copied().collect(),
            supports_namespaces: self.supports_namespaces,
            supports_native_update: self.supports_native_update && !self.write_once,
        }
    }
}

impl Default for MemoryOptions {
    fn default() -> Self {
        Self::mutable()
    }
}

struct CollectionData {
    definition: Collection,
    /// Records keyed by (namespace, id)
    records: BTreeMap<(String, String), VectorRecord>,
}

/// In-memory vector backend.
///
/// # Example
///
/// ```rust
/// use stache_core::{Collection, DistanceMetric, VectorBackend, VectorRecord};
/// use stache_store::MemoryBackend;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = MemoryBackend::new();
/// backend.create_collection(&Collection::new("docs", 2, DistanceMetric::Cosine)).await?;
/// let result = backend.insert("docs", "", &[VectorRecord::new("a", vec![1.0, 0.0])]).await?;
/// assert!(result.is_complete());
/// # Ok(())
/// # }
/// ```
pub struct MemoryBackend {
    name: String,
    capabilities: CapabilityDescriptor,
    write_once: bool,
    translator: JsonFilterTranslator,
    collections: Arc<RwLock<HashMap<String, CollectionData>>>,
}

impl MemoryBackend {
    /// Create a full-featured backend named `memory`.
    #[must_use]
    pub fn new() -> Self {
        Self::with_options("memory", MemoryOptions::mutable())
    }

    /// Create a write-once backend named `memory-immutable`.
    #[must_use]
    pub fn immutable() -> Self {
        Self::with_options("memory-immutable", MemoryOptions::immutable())
    }

    /// Create a backend from explicit options.
    #[must_use]
    pub fn with_options(name: impl Into<String>, options: MemoryOptions) -> Self {
        let capabilities = options.capabilities();
        let translator = JsonFilterTranslator::new(options.filter_operators.iter().copied());
        Self {
            name: name.into(),
            capabilities,
            write_once: options.write_once,
            translator,
            collections: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Number of records stored in a collection, across namespaces.
    pub async fn count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, |data| data.records.len())
    }

    /// Partition key for a namespace argument.
    fn partition<'a>(&self, namespace: &'a str) -> &'a str {
        if self.capabilities.supports_namespaces {
            namespace
        } else {
            ""
        }
    }

    fn native_query(&self, filter: &FilterExpression) -> Result<Value, StoreError> {
        if !filter.is_native_for(&self.capabilities) {
            return Err(StoreError::InvalidFilter(format!(
                "{} cannot evaluate this filter natively",
                self.name
            )));
        }
        translate(filter, &self.translator)
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn missing(collection: &str) -> StoreError {
    StoreError::CollectionNotFound(collection.to_string())
}

#[async_trait]
impl VectorBackend for MemoryBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> &CapabilityDescriptor {
        &self.capabilities
    }

    async fn create_collection(&self, collection: &Collection) -> Result<(), StoreError> {
        if collection.dimension == 0 {
            return Err(StoreError::Permanent(format!(
                "collection '{}' must have a positive dimension",
                collection.name
            )));
        }

        let mut collections = self.collections.write().await;
        if let Some(existing) = collections.get(&collection.name) {
            if existing.definition == *collection {
                return Ok(());
            }
            return Err(StoreError::CollectionConflict(collection.name.clone()));
        }

        collections.insert(
            collection.name.clone(),
            CollectionData {
                definition: collection.clone(),
                records: BTreeMap::new(),
            },
        );
        debug!(
            "Created collection {} (dimension {}, {:?})",
            collection.name, collection.dimension, collection.metric
        );
        Ok(())
    }

    async fn get_collection(&self, name: &str) -> Result<Option<Collection>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections.get(name).map(|data| data.definition.clone()))
    }

    async fn insert(
        &self,
        collection: &str,
        namespace: &str,
        records: &[VectorRecord],
    ) -> Result<BatchResult, StoreError> {
        let partition = self.partition(namespace).to_string();
        let mut collections = self.collections.write().await;
        let data = collections.get_mut(collection).ok_or_else(|| missing(collection))?;
        let dimension = data.definition.dimension;

        let mut result = BatchResult::new();
        for record in records {
            if record.vector.len() != dimension {
                let err = StoreError::dimension(dimension, record.vector.len());
                result.fail(record.id.clone(), err.failure_reason());
                continue;
            }

            let key = (partition.clone(), record.id.clone());
            if self.write_once && data.records.contains_key(&key) {
                result.fail(
                    record.id.clone(),
                    FailureReason::Permanent(format!("record '{}' already exists", record.id)),
                );
                continue;
            }

            let mut stored = record.clone();
            stored.namespace = partition.clone();
            data.records.insert(key, stored);
            result.succeed(record.id.clone());
        }

        debug!(
            "Inserted {}/{} records into {}",
            result.succeeded.len(),
            records.len(),
            collection
        );
        Ok(result)
    }

    async fn search(
        &self,
        collection: &str,
        namespace: &str,
        query: &[f32],
        k: usize,
        filter: Option<&FilterExpression>,
    ) -> Result<Vec<ScoredRecord>, StoreError> {
        let native = filter.map(|f| self.native_query(f)).transpose()?;
        let partition = self.partition(namespace);

        let collections = self.collections.read().await;
        let data = collections.get(collection).ok_or_else(|| missing(collection))?;
        let definition = &data.definition;
        if query.len() != definition.dimension {
            return Err(StoreError::dimension(definition.dimension, query.len()));
        }

        let mut results = Vec::new();
        for ((record_partition, _), record) in &data.records {
            if record_partition != partition {
                continue;
            }
            if let Some(native) = &native {
                if !evaluate_json_filter(native, &record.metadata)? {
                    continue;
                }
            }
            let score = definition.metric.score(query, &record.vector);
            results.push(ScoredRecord {
                record: record.clone(),
                score,
            });
        }

        // Sort by score descending
        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(k);
        Ok(results)
    }

    async fn delete(
        &self,
        collection: &str,
        namespace: &str,
        ids: &[String],
    ) -> Result<Vec<String>, StoreError> {
        let partition = self.partition(namespace).to_string();
        let mut collections = self.collections.write().await;
        let data = collections.get_mut(collection).ok_or_else(|| missing(collection))?;

        let removed: Vec<String> = ids
            .iter()
            .filter(|id| data.records.remove(&(partition.clone(), (*id).clone())).is_some())
            .cloned()
            .collect();

        debug!("Deleted {} of {} records from {}", removed.len(), ids.len(), collection);
        Ok(removed)
    }

    async fn fetch(
        &self,
        collection: &str,
        namespace: &str,
        ids: &[String],
    ) -> Result<Vec<VectorRecord>, StoreError> {
        let partition = self.partition(namespace).to_string();
        let collections = self.collections.read().await;
        let data = collections.get(collection).ok_or_else(|| missing(collection))?;

        Ok(ids
            .iter()
            .filter_map(|id| data.records.get(&(partition.clone(), id.clone())).cloned())
            .collect())
    }

    async fn update(
        &self,
        collection: &str,
        namespace: &str,
        id: &str,
        patch: &Metadata,
    ) -> Result<(), StoreError> {
        if !self.capabilities.supports_native_update {
            return Err(StoreError::CapabilityUnsupported(format!(
                "{} does not support native update",
                self.name
            )));
        }

        let partition = self.partition(namespace).to_string();
        let mut collections = self.collections.write().await;
        let data = collections.get_mut(collection).ok_or_else(|| missing(collection))?;
        let record = data
            .records
            .get_mut(&(partition, id.to_string()))
            .ok_or_else(|| StoreError::RecordNotFound {
                collection: collection.to_string(),
                identifier: id.to_string(),
                namespace: namespace.to_string(),
            })?;

        record.metadata.extend(patch.clone());
        debug!("Updated metadata of {} in {}", id, collection);
        Ok(())
    }
}
