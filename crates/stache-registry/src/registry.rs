//! Provider registry for managing pluggable backends.
//!
//! Providers register a factory under a (category, name) pair with static
//! registration calls at startup. Instances are built lazily on first
//! resolve and cached for the lifetime of the registry; each entry carries
//! its own async once-cell so concurrent resolves never construct twice.

use futures::FutureExt;
use futures::future::BoxFuture;
use stache_core::{
    CapabilityDescriptor, DocumentIndex, EmbeddingProvider, Error, LlmProvider,
    NamespaceProvider, ProviderCategory, RegistryError, VectorBackend,
};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::settings::{ProviderOptions, Settings};

/// A constructed provider instance.
#[derive(Clone)]
pub enum ProviderHandle {
    Llm(Arc<dyn LlmProvider>),
    Embedding(Arc<dyn EmbeddingProvider>),
    VectorDb(Arc<dyn VectorBackend>),
    Namespace(Arc<dyn NamespaceProvider>),
    DocumentIndex(Arc<dyn DocumentIndex>),
}

impl ProviderHandle {
    /// Category of the wrapped provider.
    #[must_use]
    pub fn category(&self) -> ProviderCategory {
        match self {
            Self::Llm(_) => ProviderCategory::Llm,
            Self::Embedding(_) => ProviderCategory::Embedding,
            Self::VectorDb(_) => ProviderCategory::VectorDb,
            Self::Namespace(_) => ProviderCategory::Namespace,
            Self::DocumentIndex(_) => ProviderCategory::DocumentIndex,
        }
    }

    /// Name reported by the provider.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Llm(p) => p.name(),
            Self::Embedding(p) => p.name(),
            Self::VectorDb(p) => p.name(),
            Self::Namespace(p) => p.name(),
            Self::DocumentIndex(p) => p.name(),
        }
    }

    /// Capability descriptor, for vector backends.
    #[must_use]
    pub fn capabilities(&self) -> Option<&CapabilityDescriptor> {
        match self {
            Self::VectorDb(p) => Some(p.capabilities()),
            _ => None,
        }
    }

    /// Whether both handles point at the same instance.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Llm(a), Self::Llm(b)) => Arc::ptr_eq(a, b),
            (Self::Embedding(a), Self::Embedding(b)) => Arc::ptr_eq(a, b),
            (Self::VectorDb(a), Self::VectorDb(b)) => Arc::ptr_eq(a, b),
            (Self::Namespace(a), Self::Namespace(b)) => Arc::ptr_eq(a, b),
            (Self::DocumentIndex(a), Self::DocumentIndex(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for ProviderHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderHandle")
            .field("category", &self.category())
            .field("name", &self.name())
            .finish()
    }
}

/// Async constructor for a provider.
pub type ProviderFactory =
    Arc<dyn Fn(ProviderOptions) -> BoxFuture<'static, Result<ProviderHandle, Error>> + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct ProviderKey {
    category: ProviderCategory,
    name: String,
}

impl ProviderKey {
    fn new(category: ProviderCategory, name: &str) -> Self {
        Self {
            category,
            name: name.to_string(),
        }
    }
}

struct Entry {
    factory: ProviderFactory,
    instance: OnceCell<ProviderHandle>,
}

/// Registry of provider factories and their cached instances.
pub struct ProviderRegistry {
    /// Registered factories with their lazily built instance
    entries: HashMap<ProviderKey, Entry>,
    /// Options handed to each factory
    options: HashMap<ProviderKey, ProviderOptions>,
}

impl ProviderRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            options: HashMap::new(),
        }
    }

    /// Register a factory. A later registration under the same key replaces it.
    pub fn register<F, Fut>(&mut self, category: ProviderCategory, name: &str, factory: F) -> &mut Self
    where
        F: Fn(ProviderOptions) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ProviderHandle, Error>> + Send + 'static,
    {
        let factory: ProviderFactory = Arc::new(move |options| factory(options).boxed());
        let key = ProviderKey::new(category, name);
        if self.entries.contains_key(&key) {
            debug!("Replacing {} provider '{}'", category, name);
        }
        self.entries.insert(
            key,
            Entry {
                factory,
                instance: OnceCell::new(),
            },
        );
        self
    }

    /// Register a vector backend factory.
    pub fn register_vectordb<F, Fut, B>(&mut self, name: &str, factory: F) -> &mut Self
    where
        F: Fn(ProviderOptions) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<B, Error>> + Send + 'static,
        B: VectorBackend + 'static,
    {
        self.register(ProviderCategory::VectorDb, name, move |options| {
            let built = factory(options);
            async move { built.await.map(|p| ProviderHandle::VectorDb(Arc::new(p))) }
        })
    }

    /// Register an embedding provider factory.
    pub fn register_embedding<F, Fut, P>(&mut self, name: &str, factory: F) -> &mut Self
    where
        F: Fn(ProviderOptions) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<P, Error>> + Send + 'static,
        P: EmbeddingProvider + 'static,
    {
        self.register(ProviderCategory::Embedding, name, move |options| {
            let built = factory(options);
            async move { built.await.map(|p| ProviderHandle::Embedding(Arc::new(p))) }
        })
    }

    /// Register an LLM provider factory.
    pub fn register_llm<F, Fut, P>(&mut self, name: &str, factory: F) -> &mut Self
    where
        F: Fn(ProviderOptions) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<P, Error>> + Send + 'static,
        P: LlmProvider + 'static,
    {
        self.register(ProviderCategory::Llm, name, move |options| {
            let built = factory(options);
            async move { built.await.map(|p| ProviderHandle::Llm(Arc::new(p))) }
        })
    }

    /// Register a namespace provider factory.
    pub fn register_namespace<F, Fut, P>(&mut self, name: &str, factory: F) -> &mut Self
    where
        F: Fn(ProviderOptions) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<P, Error>> + Send + 'static,
        P: NamespaceProvider + 'static,
    {
        self.register(ProviderCategory::Namespace, name, move |options| {
            let built = factory(options);
            async move { built.await.map(|p| ProviderHandle::Namespace(Arc::new(p))) }
        })
    }

    /// Register a document index factory.
    pub fn register_document_index<F, Fut, P>(&mut self, name: &str, factory: F) -> &mut Self
    where
        F: Fn(ProviderOptions) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<P, Error>> + Send + 'static,
        P: DocumentIndex + 'static,
    {
        self.register(ProviderCategory::DocumentIndex, name, move |options| {
            let built = factory(options);
            async move { built.await.map(|p| ProviderHandle::DocumentIndex(Arc::new(p))) }
        })
    }

    /// Set the options handed to one provider's factory.
    pub fn set_options(&mut self, category: ProviderCategory, name: &str, options: ProviderOptions) {
        self.options.insert(ProviderKey::new(category, name), options);
    }

    /// Load every provider option table from settings.
    pub fn configure(&mut self, settings: &Settings) {
        for (category_key, by_name) in &settings.options {
            let Some(category) = ProviderCategory::ALL
                .into_iter()
                .find(|c| c.as_str() == category_key)
            else {
                warn!("Ignoring options for unknown provider category '{}'", category_key);
                continue;
            };
            for (name, options) in by_name {
                self.set_options(category, name, options.clone());
            }
        }
    }

    /// Check every provider named by the settings is registered.
    pub fn validate(&self, settings: &Settings) -> Result<(), RegistryError> {
        for category in ProviderCategory::ALL {
            let name = settings.provider_for(category);
            if !self.is_registered(category, name) {
                return Err(RegistryError::ProviderNotFound {
                    category,
                    name: name.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Whether a factory is registered under (category, name).
    #[must_use]
    pub fn is_registered(&self, category: ProviderCategory, name: &str) -> bool {
        self.entries.contains_key(&ProviderKey::new(category, name))
    }

    /// Whether the instance under (category, name) has been built.
    #[must_use]
    pub fn is_initialized(&self, category: ProviderCategory, name: &str) -> bool {
        self.entries
            .get(&ProviderKey::new(category, name))
            .is_some_and(|entry| entry.instance.initialized())
    }

    /// Registered names for a category, sorted.
    #[must_use]
    pub fn registered(&self, category: ProviderCategory) -> Vec<String> {
        let mut names: Vec<String> = self
            .entries
            .keys()
            .filter(|key| key.category == category)
            .map(|key| key.name.clone())
            .collect();
        names.sort();
        names
    }

    /// Resolve a provider, building it on first use.
    ///
    /// A failed construction leaves the entry empty so a later call can retry,
    /// and never affects other entries.
    pub async fn resolve(
        &self,
        category: ProviderCategory,
        name: &str,
    ) -> Result<ProviderHandle, RegistryError> {
        let key = ProviderKey::new(category, name);
        let entry = self
            .entries
            .get(&key)
            .ok_or_else(|| RegistryError::ProviderNotFound {
                category,
                name: name.to_string(),
            })?;

        let init_error = |reason: String| RegistryError::ProviderInitialization {
            category,
            name: name.to_string(),
            reason,
        };

        let handle = entry
            .instance
            .get_or_try_init(|| async {
                info!("Initializing {} provider '{}'", category, name);
                let options = self.options.get(&key).cloned().unwrap_or_default();
                let handle = (entry.factory)(options)
                    .await
                    .map_err(|e| init_error(e.to_string()))?;

                if handle.category() != category {
                    return Err(init_error(format!(
                        "factory produced a {} provider",
                        handle.category()
                    )));
                }
                if let Some(capabilities) = handle.capabilities() {
                    capabilities.validate().map_err(init_error)?;
                    debug!("{} '{}' capabilities: {:?}", category, name, capabilities);
                }
                Ok(handle)
            })
            .await?;

        Ok(handle.clone())
    }

    /// Resolve the provider the settings select for a category.
    pub async fn resolve_configured(
        &self,
        settings: &Settings,
        category: ProviderCategory,
    ) -> Result<ProviderHandle, RegistryError> {
        self.resolve(category, settings.provider_for(category)).await
    }

    /// Capability descriptor of a handle (vector backends only).
    #[must_use]
    pub fn capabilities(&self, handle: &ProviderHandle) -> Option<CapabilityDescriptor> {
        handle.capabilities().cloned()
    }

    /// Resolve a vector backend together with its capabilities.
    pub async fn resolve_vectordb(
        &self,
        name: &str,
    ) -> Result<(Arc<dyn VectorBackend>, CapabilityDescriptor), RegistryError> {
        match self.resolve(ProviderCategory::VectorDb, name).await? {
            ProviderHandle::VectorDb(backend) => {
                let capabilities = backend.capabilities().clone();
                Ok((backend, capabilities))
            }
            other => Err(mismatch(ProviderCategory::VectorDb, name, &other)),
        }
    }

    pub async fn resolve_embedding(
        &self,
        name: &str,
    ) -> Result<Arc<dyn EmbeddingProvider>, RegistryError> {
        match self.resolve(ProviderCategory::Embedding, name).await? {
            ProviderHandle::Embedding(provider) => Ok(provider),
            other => Err(mismatch(ProviderCategory::Embedding, name, &other)),
        }
    }

    pub async fn resolve_llm(&self, name: &str) -> Result<Arc<dyn LlmProvider>, RegistryError> {
        match self.resolve(ProviderCategory::Llm, name).await? {
            ProviderHandle::Llm(provider) => Ok(provider),
            other => Err(mismatch(ProviderCategory::Llm, name, &other)),
        }
    }

    pub async fn resolve_namespace(
        &self,
        name: &str,
    ) -> Result<Arc<dyn NamespaceProvider>, RegistryError> {
        match self.resolve(ProviderCategory::Namespace, name).await? {
            ProviderHandle::Namespace(provider) => Ok(provider),
            other => Err(mismatch(ProviderCategory::Namespace, name, &other)),
        }
    }

    pub async fn resolve_document_index(
        &self,
        name: &str,
    ) -> Result<Arc<dyn DocumentIndex>, RegistryError> {
        match self.resolve(ProviderCategory::DocumentIndex, name).await? {
            ProviderHandle::DocumentIndex(provider) => Ok(provider),
            other => Err(mismatch(ProviderCategory::DocumentIndex, name, &other)),
        }
    }

    /// Drop every cached instance; factories stay registered.
    pub fn clear_instances(&mut self) {
        for entry in self.entries.values_mut() {
            entry.instance.take();
        }
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn mismatch(category: ProviderCategory, name: &str, handle: &ProviderHandle) -> RegistryError {
    RegistryError::ProviderInitialization {
        category,
        name: name.to_string(),
        reason: format!("resolved a {} provider", handle.category()),
    }
}
