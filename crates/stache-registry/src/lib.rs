//! Provider registry for Stache AI.
//!
//! The registry maps a (category, name) pair to a factory and caches the
//! instance it builds. [`Settings`] names the provider selected for each
//! category and carries the options handed to its factory.
//!
//! ```rust,ignore
//! let mut registry = ProviderRegistry::new();
//! registry.register_vectordb("memory", |options| async move { MemoryBackend::from_options(&options) });
//! registry.configure(&settings);
//! let (backend, capabilities) = registry.resolve_vectordb(&settings.vectordb_provider).await?;
//! ```

pub mod registry;
pub mod settings;

pub use registry::{ProviderFactory, ProviderHandle, ProviderRegistry};
pub use settings::{ProviderOptions, Settings};
