//! Provider selection settings.
//!
//! Settings pick, per category, the provider name to resolve and carry the
//! option table handed to each provider factory:
//!
//! ```toml
//! llm_provider = "echo"
//! embedding_provider = "hashing"
//! vectordb_provider = "memory"
//! namespace_provider = "memory"
//! document_index_provider = "memory"
//!
//! [options.vectordb.memory]
//! max_batch_size = 500
//! ```

use serde::{Deserialize, Serialize};
use stache_core::ProviderCategory;
use std::collections::BTreeMap;

/// Option table handed to a provider factory.
pub type ProviderOptions = serde_json::Map<String, serde_json::Value>;

/// Provider selection for every category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_llm_provider")]
    pub llm_provider: String,

    #[serde(default = "default_embedding_provider")]
    pub embedding_provider: String,

    #[serde(default = "default_memory_provider")]
    pub vectordb_provider: String,

    #[serde(default = "default_memory_provider")]
    pub namespace_provider: String,

    #[serde(default = "default_memory_provider")]
    pub document_index_provider: String,

    /// Options keyed by category then provider name
    #[serde(default)]
    pub options: BTreeMap<String, BTreeMap<String, ProviderOptions>>,
}

fn default_llm_provider() -> String {
    "echo".to_string()
}

fn default_embedding_provider() -> String {
    "hashing".to_string()
}

fn default_memory_provider() -> String {
    "memory".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            llm_provider: default_llm_provider(),
            embedding_provider: default_embedding_provider(),
            vectordb_provider: default_memory_provider(),
            namespace_provider: default_memory_provider(),
            document_index_provider: default_memory_provider(),
            options: BTreeMap::new(),
        }
    }
}

impl Settings {
    /// Provider name configured for a category.
    #[must_use]
    pub fn provider_for(&self, category: ProviderCategory) -> &str {
        match category {
            ProviderCategory::Llm => &self.llm_provider,
            ProviderCategory::Embedding => &self.embedding_provider,
            ProviderCategory::VectorDb => &self.vectordb_provider,
            ProviderCategory::Namespace => &self.namespace_provider,
            ProviderCategory::DocumentIndex => &self.document_index_provider,
        }
    }

    /// Options for a provider, empty when none are configured.
    #[must_use]
    pub fn options_for(&self, category: ProviderCategory, name: &str) -> ProviderOptions {
        self.options
            .get(category.as_str())
            .and_then(|by_name| by_name.get(name))
            .cloned()
            .unwrap_or_default()
    }

    /// Set an option for a provider.
    pub fn set_option(
        &mut self,
        category: ProviderCategory,
        name: &str,
        key: &str,
        value: serde_json::Value,
    ) {
        self.options
            .entry(category.as_str().to_string())
            .or_default()
            .entry(name.to_string())
            .or_default()
            .insert(key.to_string(), value);
    }
}
