//! Error types for Stache AI.

use thiserror::Error;

use crate::types::{FailureReason, Metadata, ProviderCategory, VectorRecord};

/// Main error type for Stache operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Provider resolution failed
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Vector store operation failed
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Embedding generation failed
    #[error("embedding error: {0}")]
    Embedding(#[from] EmbedError),

    /// Completion failed
    #[error("llm error: {0}")]
    Llm(#[from] LlmError),

    /// Document loading failed
    #[error("load error: {0}")]
    Load(#[from] LoadError),

    /// I/O error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("config error: {0}")]
    Config(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Provider registry errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Nothing is registered under the (category, name) pair
    #[error("no {category} provider registered as '{name}'")]
    ProviderNotFound {
        category: ProviderCategory,
        name: String,
    },

    /// The provider factory failed
    #[error("failed to initialize {category} provider '{name}': {reason}")]
    ProviderInitialization {
        category: ProviderCategory,
        name: String,
        reason: String,
    },
}

/// Context needed to repair an update that deleted a record but did not
/// manage to write it back.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateConsistencyError {
    /// Collection of the record
    pub collection: String,
    /// Logical identifier of the record
    pub identifier: String,
    /// Namespace of the record
    pub namespace: String,
    /// The merged record that still has to be written
    pub pending: VectorRecord,
    /// The caller's patch, re-merged when another writer restored the record
    pub patch: Metadata,
    /// Why the reinsert failed
    pub reason: String,
}

/// Vector store errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// A capability-gated feature was requested on a backend lacking it
    #[error("capability unsupported: {0}")]
    CapabilityUnsupported(String),

    /// The same identifier appears more than once in one call
    #[error("duplicate identifiers in batch: {}", .0.join(", "))]
    DuplicateIdentifier(Vec<String>),

    /// Update or fetch target is absent
    #[error("record '{identifier}' not found in {collection} (namespace '{namespace}')")]
    RecordNotFound {
        collection: String,
        identifier: String,
        namespace: String,
    },

    /// Caller metadata collides with a key reserved for namespace emulation
    #[error("metadata key '{0}' is reserved")]
    ReservedField(String),

    /// Rate limiting or transient network failure; safe to retry
    #[error("transient provider error: {0}")]
    Transient(String),

    /// Non-retryable backend failure
    #[error("permanent provider error: {0}")]
    Permanent(String),

    /// Update emulation deleted the record but could not reinsert it
    #[error(
        "update of '{}' in {} (namespace '{}') left the record deleted: {}",
        .0.identifier, .0.collection, .0.namespace, .0.reason
    )]
    UpdateConsistency(Box<UpdateConsistencyError>),

    #[error("collection not found: {0}")]
    CollectionNotFound(String),

    #[error("collection '{0}' already exists with a different definition")]
    CollectionConflict(String),

    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// A record names a namespace other than the one the call targets
    #[error("record '{identifier}' belongs to namespace '{found}', call targets '{expected}'")]
    NamespaceMismatch {
        identifier: String,
        expected: String,
        found: String,
    },

    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    #[error("operation cancelled")]
    Cancelled,
}

impl StoreError {
    /// Whether the batch scheduler may retry the failed call.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }

    /// Per-identifier reason recorded in a [`crate::BatchResult`].
    #[must_use]
    pub fn failure_reason(&self) -> FailureReason {
        match self {
            Self::Transient(msg) => FailureReason::Transient(msg.clone()),
            Self::RecordNotFound { .. } => FailureReason::NotFound,
            other => FailureReason::Permanent(other.to_string()),
        }
    }

    /// Shorthand for a dimension mismatch.
    #[must_use]
    pub fn dimension(expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch { expected, actual }
    }
}

impl From<UpdateConsistencyError> for StoreError {
    fn from(err: UpdateConsistencyError) -> Self {
        Self::UpdateConsistency(Box::new(err))
    }
}

/// Embedding errors.
#[derive(Error, Debug)]
pub enum EmbedError {
    #[error("inference failed: {0}")]
    Inference(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("transient provider error: {0}")]
    Transient(String),
}

/// Completion errors.
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("completion request failed: {0}")]
    Request(String),

    #[error("transient provider error: {0}")]
    Transient(String),
}

/// Document loader errors.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("no loader registered for extension: {0}")]
    UnsupportedExtension(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Stache operations.
pub type Result<T> = std::result::Result<T, Error>;
