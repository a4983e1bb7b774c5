//! Registration of the builtin embedding and LLM providers.

use stache_core::Error;
use stache_registry::{ProviderOptions, ProviderRegistry};

use crate::hashing::{DimensionOptions, HashingEmbedder};
use crate::llm::EchoLlm;
use crate::noop::NoopEmbedder;

/// Register `hashing` and `noop` embedders and the `echo` LLM.
///
/// Both embedders accept a `dimension` option (default 384).
pub fn register_builtins(registry: &mut ProviderRegistry) {
    registry.register_embedding("hashing", |options: ProviderOptions| async move {
        let options = DimensionOptions::from_options(&options)?;
        Ok::<_, Error>(HashingEmbedder::new(options.dimension))
    });
    registry.register_embedding("noop", |options: ProviderOptions| async move {
        let options = DimensionOptions::from_options(&options)?;
        Ok::<_, Error>(NoopEmbedder::with_dimension(options.dimension))
    });
    registry.register_llm("echo", |_| async { Ok::<_, Error>(EchoLlm::new()) });
}

#[cfg(test)]
mod tests {
    use super::*;
    use stache_core::{ProviderCategory, RegistryError};
    use stache_registry::Settings;

    #[tokio::test]
    async fn test_builtins_resolve_with_options() {
        let mut registry = ProviderRegistry::new();
        register_builtins(&mut registry);

        let mut settings = Settings::default();
        settings.set_option(
            ProviderCategory::Embedding,
            "hashing",
            "dimension",
            serde_json::json!(48),
        );
        registry.configure(&settings);

        let embedder = registry.resolve_embedding("hashing").await.unwrap();
        assert_eq!(embedder.dimension(), 48);

        let llm = registry.resolve_llm("echo").await.unwrap();
        assert_eq!(llm.name(), "echo");

        assert_eq!(
            registry.registered(ProviderCategory::Embedding),
            vec!["hashing".to_string(), "noop".to_string()]
        );
    }

    #[tokio::test]
    async fn test_zero_dimension_fails_initialization() {
        let mut registry = ProviderRegistry::new();
        register_builtins(&mut registry);
        let mut options = ProviderOptions::new();
        options.insert("dimension".to_string(), serde_json::json!(0));
        registry.set_options(ProviderCategory::Embedding, "noop", options);

        let err = registry.resolve_embedding("noop").await.err().unwrap();
        assert!(matches!(err, RegistryError::ProviderInitialization { .. }));
    }
}
