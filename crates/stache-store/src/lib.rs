//! # stache-store
//!
//! The vector store contract for Stache AI and the machinery behind it.
//!
//! - [`VectorStore`]: uniform insert, search, delete, update and fetch over any
//!   [`stache_core::VectorBackend`]
//! - [`BatchScheduler`]: chunking, bounded concurrency, retry and cancellation
//! - [`NamespaceManager`]: native or emulated namespace isolation
//! - [`JsonFilterTranslator`]: document-store JSON filter dialect
//! - [`MemoryBackend`], [`MemoryNamespaceProvider`], [`MemoryDocumentIndex`]:
//!   builtin in-memory providers
//!
//! ```rust,ignore
//! let mut registry = ProviderRegistry::new();
//! stache_store::register_builtins(&mut registry);
//! let store = stache_store::open_vector_store(&registry, &settings, StoreConfig::default()).await?;
//! let result = store.insert("docs", &records, "tenant1").await?;
//! ```

pub mod contract;
pub mod document_index;
pub mod memory;
pub mod namespace;
pub mod namespace_provider;
pub mod plugins;
pub mod scheduler;
pub mod translate;

pub use contract::{StoreConfig, UpdateConfig, VectorStore};
pub use document_index::MemoryDocumentIndex;
pub use memory::{MemoryBackend, MemoryOptions};
pub use namespace::{NAMESPACE_FIELD, NamespaceManager, NamespaceMode};
pub use namespace_provider::MemoryNamespaceProvider;
pub use plugins::{open_vector_store, register_builtins};
pub use scheduler::{
    BatchScheduler, Cancellation, ChunkOutcome, ChunkReport, RetryPolicy, split_chunks,
};
pub use translate::{JsonFilterTranslator, evaluate_json_filter, parse_json_filter};
