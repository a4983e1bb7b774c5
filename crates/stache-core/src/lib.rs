//! # stache-core
//!
//! Core types and traits for Stache AI, a retrieval-augmented-generation
//! toolkit built from swappable provider plugins.
//!
//! This crate provides the foundational abstractions used throughout Stache:
//!
//! - **Vector Storage**: [`VectorBackend`] trait every vector database adapter implements
//! - **Capabilities**: [`CapabilityDescriptor`] declaring what a backend can do
//! - **Filtering**: [`FilterExpression`] predicate trees and the [`FilterTranslator`] walk
//! - **Providers**: [`EmbeddingProvider`], [`LlmProvider`], [`NamespaceProvider`],
//!   [`DocumentIndex`] and [`DocumentLoader`]
//!
//! ## Architecture
//!
//! ```text
//! Settings → ProviderRegistry → VectorStore contract → BatchScheduler → VectorBackend
//!                                     │
//!                          FilterPlan + NamespaceManager
//! ```
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`VectorRecord`] | A vector with id, metadata and namespace |
//! | [`Collection`] | Fixed dimension and metric for a set of vectors |
//! | [`CapabilityDescriptor`] | Batch limit, filter vocabulary, namespace and update support |
//! | [`BatchResult`] | Per-identifier outcome, never dropping partial failures |
//! | [`FilterExpression`] | Backend-agnostic metadata predicate |
//!
//! ## Related Crates
//!
//! - `stache-registry`: Provider registry and settings
//! - `stache-store`: Vector store contract, batch scheduler, namespace manager
//! - `stache-embed`: Built-in embedding and LLM providers
//! - `stache-loaders`: Document loaders by file extension

pub mod error;
pub mod filter;
pub mod traits;
pub mod types;

pub use error::{
    EmbedError, Error, LlmError, LoadError, RegistryError, Result, StoreError,
    UpdateConsistencyError,
};
pub use filter::{Comparison, FilterExpression, FilterPlan, FilterTranslator, translate};
pub use traits::*;
pub use types::*;
