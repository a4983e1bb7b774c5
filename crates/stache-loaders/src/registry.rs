//! Loader registry keyed by file extension.

use stache_core::{DocumentLoader, LoadError};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Registry of document loaders.
pub struct LoaderRegistry {
    /// Named loaders
    loaders: HashMap<String, Arc<dyn DocumentLoader>>,
    /// Lowercase extension to loader name mapping
    extension_mapping: HashMap<String, String>,
}

impl LoaderRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            loaders: HashMap::new(),
            extension_mapping: HashMap::new(),
        }
    }

    /// Registry with the builtin loaders.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(crate::TextLoader::new());
        registry
    }

    /// Register a loader under its name. Later registrations take over the
    /// extensions they declare.
    pub fn register<L: DocumentLoader + 'static>(&mut self, loader: L) {
        let loader = Arc::new(loader);
        let name = loader.name().to_string();
        for ext in loader.extensions() {
            self.extension_mapping
                .insert(ext.to_lowercase(), name.clone());
        }
        self.loaders.insert(name, loader);
    }

    /// Get the loader for an extension (case-insensitive, without the dot).
    #[must_use]
    pub fn get_for_extension(&self, extension: &str) -> Option<Arc<dyn DocumentLoader>> {
        self.extension_mapping
            .get(&extension.to_lowercase())
            .and_then(|name| self.loaders.get(name))
            .cloned()
    }

    /// Get the loader for a file.
    #[must_use]
    pub fn get_for_file(&self, path: &Path) -> Option<Arc<dyn DocumentLoader>> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| self.get_for_extension(ext))
    }

    /// Sorted list of handled extensions.
    #[must_use]
    pub fn extensions(&self) -> Vec<String> {
        let mut extensions: Vec<String> = self.extension_mapping.keys().cloned().collect();
        extensions.sort();
        extensions
    }

    /// Load a file with the loader registered for its extension.
    pub async fn load(&self, path: &Path) -> Result<String, LoadError> {
        let loader = self.get_for_file(path).ok_or_else(|| {
            let ext = path
                .extension()
                .and_then(|ext| ext.to_str())
                .unwrap_or_default();
            LoadError::UnsupportedExtension(ext.to_string())
        })?;

        debug!("Loading {} with {}", path.display(), loader.name());
        loader.load(path).await
    }
}

impl Default for LoaderRegistry {
    fn default() -> Self {
        Self::new()
    }
}
