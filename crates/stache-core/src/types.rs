//! Core types for Stache AI.
//!
//! This module contains the shared data structures used across the workspace:
//!
//! ## Records
//! - [`VectorRecord`]: A vector with its identifier, metadata and namespace
//! - [`MetadataValue`]: Scalar or array value stored under a metadata key
//! - [`Collection`]: Named set of vectors with a fixed dimension and metric
//! - [`ScoredRecord`]: A search hit with its ranking score
//!
//! ## Capabilities
//! - [`CapabilityDescriptor`]: What a vector backend instance supports
//! - [`FilterOperator`] / [`LogicalOperator`]: Filter vocabulary a backend understands
//!
//! ## Outcomes
//! - [`BatchResult`]: Aggregated per-identifier outcome of a multi-record operation
//! - [`FetchResult`]: Records returned by a fetch plus the per-identifier outcome
//!
//! ## Providers
//! - [`ProviderCategory`]: Functional category a provider plugs into
//! - [`Document`]: Entry kept by a document index

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Namespace used when the caller does not name one.
pub const DEFAULT_NAMESPACE: &str = "";

/// Metadata attached to a record. Keys are unique and kept in sorted order.
pub type Metadata = BTreeMap<String, MetadataValue>;

// ============================================================================
// Metadata Values
// ============================================================================

/// Value stored under a metadata key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Array(Vec<MetadataValue>),
}

impl MetadataValue {
    /// Numeric view of the value, if it is a number.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// String view of the value, if it is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Equality where integers and floats compare numerically.
    #[must_use]
    pub fn loose_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Array(a), Self::Array(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.loose_eq(y))
            }
            _ => match (self.as_f64(), other.as_f64()) {
                (Some(x), Some(y)) => x == y,
                _ => self == other,
            },
        }
    }

    /// Ordering between two numbers or two strings. Anything else is unordered.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        if let (Some(x), Some(y)) = (self.as_f64(), other.as_f64()) {
            return x.partial_cmp(&y);
        }
        match (self, other) {
            (Self::String(a), Self::String(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Parse a loosely typed string (as typed on a command line).
    ///
    /// Tries bool, then integer, then float, and falls back to a string.
    #[must_use]
    pub fn parse_loose(raw: &str) -> Self {
        if let Ok(b) = raw.parse::<bool>() {
            return Self::Bool(b);
        }
        if let Ok(i) = raw.parse::<i64>() {
            return Self::Int(i);
        }
        if let Ok(f) = raw.parse::<f64>() {
            return Self::Float(f);
        }
        Self::String(raw.to_string())
    }
}

impl From<bool> for MetadataValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for MetadataValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for MetadataValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for MetadataValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl<T: Into<MetadataValue>> From<Vec<T>> for MetadataValue {
    fn from(values: Vec<T>) -> Self {
        Self::Array(values.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::String(s) => write!(f, "{s}"),
            Self::Array(values) => {
                write!(f, "[")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{value}")?;
                }
                write!(f, "]")
            }
        }
    }
}

// ============================================================================
// Records & Collections
// ============================================================================

/// A vector with its identifier and metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord {
    /// Opaque identifier, unique within (namespace, collection)
    pub id: String,
    /// Embedding vector; length must match the collection dimension
    pub vector: Vec<f32>,
    /// Caller metadata
    #[serde(default)]
    pub metadata: Metadata,
    /// Owning namespace (empty = default partition)
    #[serde(default)]
    pub namespace: String,
}

impl VectorRecord {
    /// Create a record in the default namespace with no metadata.
    pub fn new(id: impl Into<String>, vector: Vec<f32>) -> Self {
        Self {
            id: id.into(),
            vector,
            metadata: Metadata::new(),
            namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }

    /// Attach a metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Set the namespace.
    #[must_use]
    pub fn in_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }
}

/// Distance metric of a collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    #[default]
    Cosine,
    Dot,
    Euclidean,
}

impl DistanceMetric {
    /// Score two vectors so that a higher score always ranks first.
    ///
    /// Cosine yields similarity, dot yields the raw product and euclidean
    /// yields `1 / (1 + distance)`.
    #[must_use]
    pub fn score(self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            Self::Cosine => {
                let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
                let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
                let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
                if norm_a == 0.0 || norm_b == 0.0 {
                    return 0.0;
                }
                dot / (norm_a * norm_b)
            }
            Self::Dot => a.iter().zip(b).map(|(x, y)| x * y).sum(),
            Self::Euclidean => {
                let distance: f32 = a
                    .iter()
                    .zip(b)
                    .map(|(x, y)| (x - y) * (x - y))
                    .sum::<f32>()
                    .sqrt();
                1.0 / (1.0 + distance)
            }
        }
    }
}

/// A named collection of vectors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    /// Collection name
    pub name: String,
    /// Vector dimension, fixed at creation
    pub dimension: usize,
    /// Distance metric, fixed at creation
    #[serde(default)]
    pub metric: DistanceMetric,
}

impl Collection {
    pub fn new(name: impl Into<String>, dimension: usize, metric: DistanceMetric) -> Self {
        Self {
            name: name.into(),
            dimension,
            metric,
        }
    }
}

/// A search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredRecord {
    /// Matching record
    pub record: VectorRecord,
    /// Ranking score (higher is better)
    pub score: f32,
}

// ============================================================================
// Capabilities
// ============================================================================

/// Comparison operators usable in filter leaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOperator {
    Eq,
    Ne,
    In,
    Gt,
    Gte,
    Lt,
    Lte,
    Exists,
}

impl FilterOperator {
    /// Every comparison operator.
    pub const ALL: [FilterOperator; 8] = [
        Self::Eq,
        Self::Ne,
        Self::In,
        Self::Gt,
        Self::Gte,
        Self::Lt,
        Self::Lte,
        Self::Exists,
    ];
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::In => "in",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::Exists => "exists",
        };
        f.write_str(name)
    }
}

/// Boolean combinators of a filter tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogicalOperator {
    And,
    Or,
    Not,
}

impl LogicalOperator {
    pub const ALL: [LogicalOperator; 3] = [Self::And, Self::Or, Self::Not];
}

impl fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::And => "and",
            Self::Or => "or",
            Self::Not => "not",
        };
        f.write_str(name)
    }
}

/// What a vector backend instance supports.
///
/// Produced once when the provider is constructed and read-only afterwards.
/// Callers must consult it before relying on native update, server-side
/// filtering or namespace isolation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityDescriptor {
    /// Largest number of records accepted by one backend call (must be > 0)
    pub max_batch_size: usize,
    /// Whether the backend evaluates filters server-side
    pub supports_filtering: bool,
    /// Comparison operators the backend evaluates natively
    #[serde(default)]
    pub supported_filter_operators: BTreeSet<FilterOperator>,
    /// Boolean combinators the backend evaluates natively
    #[serde(default)]
    pub supported_logical_operators: BTreeSet<LogicalOperator>,
    /// Whether the backend partitions data by namespace natively
    pub supports_namespaces: bool,
    /// Whether record metadata can be patched in place
    pub supports_native_update: bool,
}

impl CapabilityDescriptor {
    /// A backend that supports everything with the given batch limit.
    #[must_use]
    pub fn full(max_batch_size: usize) -> Self {
        Self {
            max_batch_size,
            supports_filtering: true,
            supported_filter_operators: FilterOperator::ALL.into_iter().collect(),
            supported_logical_operators: LogicalOperator::ALL.into_iter().collect(),
            supports_namespaces: true,
            supports_native_update: true,
        }
    }

    /// A backend that only stores and ranks vectors.
    #[must_use]
    pub fn minimal(max_batch_size: usize) -> Self {
        Self {
            max_batch_size,
            supports_filtering: false,
            supported_filter_operators: BTreeSet::new(),
            supported_logical_operators: BTreeSet::new(),
            supports_namespaces: false,
            supports_native_update: false,
        }
    }

    /// Check the descriptor is usable.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_batch_size == 0 {
            return Err("max_batch_size must be positive".to_string());
        }
        Ok(())
    }

    /// Whether a comparison operator is evaluated natively.
    #[must_use]
    pub fn supports_operator(&self, op: FilterOperator) -> bool {
        self.supports_filtering && self.supported_filter_operators.contains(&op)
    }

    /// Whether a combinator is evaluated natively.
    #[must_use]
    pub fn supports_logical(&self, op: LogicalOperator) -> bool {
        self.supports_filtering && self.supported_logical_operators.contains(&op)
    }
}

// ============================================================================
// Outcomes
// ============================================================================

/// Why a single identifier failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum FailureReason {
    /// The identifier does not exist
    NotFound,
    /// A retryable failure that persisted through every attempt
    Transient(String),
    /// A non-retryable failure
    Permanent(String),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => f.write_str("not found"),
            Self::Transient(msg) => write!(f, "transient: {msg}"),
            Self::Permanent(msg) => write!(f, "permanent: {msg}"),
        }
    }
}

/// Aggregated outcome of a multi-record operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResult {
    /// Identifiers the operation applied to
    pub succeeded: Vec<String>,
    /// Identifiers that failed, with the reason
    pub failed: BTreeMap<String, FailureReason>,
    /// Identifiers in chunks that never started because of cancellation
    pub skipped: Vec<String>,
    /// Whether the operation was cancelled before every chunk started
    pub cancelled: bool,
}

impl BatchResult {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether every identifier succeeded.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.skipped.is_empty() && !self.cancelled
    }

    /// Record a success.
    pub fn succeed(&mut self, id: impl Into<String>) {
        self.succeeded.push(id.into());
    }

    /// Record a failure.
    pub fn fail(&mut self, id: impl Into<String>, reason: FailureReason) {
        self.failed.insert(id.into(), reason);
    }

    /// Merge another outcome into this one, keeping order.
    pub fn merge(&mut self, other: BatchResult) {
        self.succeeded.extend(other.succeeded);
        self.failed.extend(other.failed);
        self.skipped.extend(other.skipped);
        self.cancelled |= other.cancelled;
    }

    /// Rewrite every identifier, dropping those the mapping rejects.
    #[must_use]
    pub fn map_ids<F>(self, mut f: F) -> Self
    where
        F: FnMut(&str) -> Option<String>,
    {
        Self {
            succeeded: self.succeeded.iter().filter_map(|id| f(id)).collect(),
            failed: self
                .failed
                .into_iter()
                .filter_map(|(id, reason)| f(&id).map(|id| (id, reason)))
                .collect(),
            skipped: self.skipped.iter().filter_map(|id| f(id)).collect(),
            cancelled: self.cancelled,
        }
    }
}

/// Records returned by a fetch together with per-identifier outcomes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchResult {
    /// Found records, in request order
    pub records: Vec<VectorRecord>,
    /// Found identifiers as successes, misses as [`FailureReason::NotFound`]
    pub outcome: BatchResult,
}

// ============================================================================
// Providers
// ============================================================================

/// Functional category a provider plugs into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderCategory {
    Llm,
    Embedding,
    #[serde(rename = "vectordb")]
    VectorDb,
    Namespace,
    DocumentIndex,
}

impl ProviderCategory {
    pub const ALL: [ProviderCategory; 5] = [
        Self::Llm,
        Self::Embedding,
        Self::VectorDb,
        Self::Namespace,
        Self::DocumentIndex,
    ];

    /// Configuration key of this category.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Llm => "llm",
            Self::Embedding => "embedding",
            Self::VectorDb => "vectordb",
            Self::Namespace => "namespace",
            Self::DocumentIndex => "document_index",
        }
    }
}

impl fmt::Display for ProviderCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A document tracked by a document index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Document identifier
    pub id: String,
    /// Owning namespace
    #[serde(default)]
    pub namespace: String,
    /// Where the document came from (path, URL)
    pub source: String,
    /// Optional title
    pub title: Option<String>,
    /// Document-level metadata
    #[serde(default)]
    pub metadata: Metadata,
    /// Vector records produced from this document
    #[serde(default)]
    pub chunk_ids: Vec<String>,
    /// When the document was indexed
    pub indexed_at: Option<DateTime<Utc>>,
}

/// Options for a completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionOptions {
    /// Maximum tokens to generate
    pub max_tokens: usize,
    /// Sampling temperature
    pub temperature: f32,
    /// Optional system prompt
    pub system: Option<String>,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            max_tokens: 1000,
            temperature: 0.3,
            system: None,
        }
    }
}
