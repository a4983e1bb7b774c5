//! Namespace isolation over backends with or without native partitions.
//!
//! Backends that declare `supports_namespaces` receive the namespace as-is.
//! For the rest, every namespace shares the backend's default partition and
//! isolation is emulated:
//!
//! - identifiers are mangled as `"{len}:{namespace}:{id}"`, with `len` the
//!   namespace's byte length, so no two (namespace, id) pairs collide
//! - records carry the namespace under [`NAMESPACE_FIELD`], injected on write
//!   and stripped on read
//! - searches AND an isolation filter on that field into the caller filter
//! - records read back from another namespace are dropped

use stache_core::{
    CapabilityDescriptor, DEFAULT_NAMESPACE, FilterExpression, Metadata, MetadataValue,
    StoreError, VectorRecord,
};

/// Metadata key reserved for namespace emulation.
pub const NAMESPACE_FIELD: &str = "__stache_namespace";

/// How namespaces reach the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamespaceMode {
    /// The backend partitions data itself
    Native,
    /// Partitions are emulated with mangled ids and a reserved field
    Emulated,
}

/// Maps logical (namespace, id) pairs to what the backend stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamespaceManager {
    mode: NamespaceMode,
}

impl NamespaceManager {
    #[must_use]
    pub fn new(mode: NamespaceMode) -> Self {
        Self { mode }
    }

    /// Pick the mode a backend's capabilities call for.
    #[must_use]
    pub fn for_capabilities(capabilities: &CapabilityDescriptor) -> Self {
        if capabilities.supports_namespaces {
            Self::new(NamespaceMode::Native)
        } else {
            Self::new(NamespaceMode::Emulated)
        }
    }

    #[must_use]
    pub fn mode(&self) -> NamespaceMode {
        self.mode
    }

    #[must_use]
    pub fn is_emulated(&self) -> bool {
        self.mode == NamespaceMode::Emulated
    }

    /// Namespace argument passed to the backend.
    #[must_use]
    pub fn backend_namespace<'a>(&self, namespace: &'a str) -> &'a str {
        match self.mode {
            NamespaceMode::Native => namespace,
            NamespaceMode::Emulated => DEFAULT_NAMESPACE,
        }
    }

    /// Identifier stored by the backend.
    #[must_use]
    pub fn mangle_id(&self, namespace: &str, id: &str) -> String {
        match self.mode {
            NamespaceMode::Native => id.to_string(),
            NamespaceMode::Emulated => format!("{}:{}:{}", namespace.len(), namespace, id),
        }
    }

    /// Logical identifier of a backend id, or `None` when it belongs to
    /// another namespace.
    #[must_use]
    pub fn unmangle_id<'a>(&self, namespace: &str, backend_id: &'a str) -> Option<&'a str> {
        match self.mode {
            NamespaceMode::Native => Some(backend_id),
            NamespaceMode::Emulated => {
                let prefix = format!("{}:{}:", namespace.len(), namespace);
                backend_id.strip_prefix(prefix.as_str())
            }
        }
    }

    /// Reject caller metadata that uses the reserved key.
    pub fn check_metadata(&self, metadata: &Metadata) -> Result<(), StoreError> {
        if self.is_emulated() && metadata.contains_key(NAMESPACE_FIELD) {
            return Err(StoreError::ReservedField(NAMESPACE_FIELD.to_string()));
        }
        Ok(())
    }

    /// Record as written to the backend.
    pub fn to_backend(&self, namespace: &str, record: &VectorRecord) -> Result<VectorRecord, StoreError> {
        self.check_metadata(&record.metadata)?;
        let mut stored = record.clone();
        stored.id = self.mangle_id(namespace, &record.id);
        stored.namespace = self.backend_namespace(namespace).to_string();
        if self.is_emulated() {
            stored
                .metadata
                .insert(NAMESPACE_FIELD.to_string(), MetadataValue::from(namespace));
        }
        Ok(stored)
    }

    /// Record as seen by the caller, or `None` when it belongs to another
    /// namespace.
    #[must_use]
    pub fn from_backend(&self, namespace: &str, mut record: VectorRecord) -> Option<VectorRecord> {
        if self.is_emulated() {
            let owner = record.metadata.remove(NAMESPACE_FIELD)?;
            if owner.as_str() != Some(namespace) {
                return None;
            }
            record.id = self.unmangle_id(namespace, &record.id)?.to_string();
        }
        record.namespace = namespace.to_string();
        Some(record)
    }

    /// Filter restricting a search to one namespace.
    #[must_use]
    pub fn isolation_filter(&self, namespace: &str) -> Option<FilterExpression> {
        self.is_emulated()
            .then(|| FilterExpression::eq(NAMESPACE_FIELD, namespace))
    }

    /// Caller filter with the isolation filter ANDed in.
    #[must_use]
    pub fn scope_filter(
        &self,
        namespace: &str,
        filter: Option<&FilterExpression>,
    ) -> Option<FilterExpression> {
        FilterExpression::conjoin(filter.cloned(), self.isolation_filter(namespace))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emulated() -> NamespaceManager {
        NamespaceManager::new(NamespaceMode::Emulated)
    }

    fn native() -> NamespaceManager {
        NamespaceManager::new(NamespaceMode::Native)
    }

    #[test]
    fn test_mode_from_capabilities() {
        let full = CapabilityDescriptor::full(100);
        assert_eq!(NamespaceManager::for_capabilities(&full).mode(), NamespaceMode::Native);

        let minimal = CapabilityDescriptor::minimal(100);
        assert!(NamespaceManager::for_capabilities(&minimal).is_emulated());
    }

    #[test]
    fn test_native_mode_passes_through() {
        let manager = native();
        assert_eq!(manager.backend_namespace("tenant1"), "tenant1");
        assert_eq!(manager.mangle_id("tenant1", "doc"), "doc");
        assert_eq!(manager.unmangle_id("tenant1", "doc"), Some("doc"));
        assert!(manager.isolation_filter("tenant1").is_none());
    }

    #[test]
    fn test_mangled_ids_include_namespace_length() {
        let manager = emulated();
        assert_eq!(manager.mangle_id("tenant1", "doc"), "7:tenant1:doc");
        assert_eq!(manager.mangle_id("", "doc"), "0::doc");
        assert_eq!(manager.backend_namespace("tenant1"), DEFAULT_NAMESPACE);
    }

    #[test]
    fn test_mangling_is_unambiguous_with_separators() {
        let manager = emulated();
        // "a:b" + "c" and "a" + "b:c" would collide without the length prefix
        let first = manager.mangle_id("a:b", "c");
        let second = manager.mangle_id("a", "b:c");
        assert_ne!(first, second);

        assert_eq!(manager.unmangle_id("a:b", &first), Some("c"));
        assert_eq!(manager.unmangle_id("a", &first), None);
        assert_eq!(manager.unmangle_id("a", &second), Some("b:c"));
    }

    #[test]
    fn test_to_backend_injects_reserved_field() {
        let manager = emulated();
        let record = VectorRecord::new("doc", vec![1.0]).with_metadata("kind", "guide");
        let stored = manager.to_backend("tenant1", &record).unwrap();

        assert_eq!(stored.id, "7:tenant1:doc");
        assert_eq!(stored.namespace, DEFAULT_NAMESPACE);
        assert_eq!(stored.metadata[NAMESPACE_FIELD], MetadataValue::from("tenant1"));
        assert_eq!(stored.metadata["kind"], MetadataValue::from("guide"));
    }

    #[test]
    fn test_from_backend_strips_field_and_drops_foreign_records() {
        let manager = emulated();
        let record = VectorRecord::new("doc", vec![1.0]).with_metadata("kind", "guide");
        let stored = manager.to_backend("tenant1", &record).unwrap();

        let restored = manager.from_backend("tenant1", stored.clone()).unwrap();
        assert_eq!(restored.id, "doc");
        assert_eq!(restored.namespace, "tenant1");
        assert!(!restored.metadata.contains_key(NAMESPACE_FIELD));

        assert!(manager.from_backend("tenant2", stored).is_none());
    }

    #[test]
    fn test_reserved_field_rejected_only_when_emulated() {
        let record = VectorRecord::new("doc", vec![1.0]).with_metadata(NAMESPACE_FIELD, "x");

        let err = emulated().to_backend("tenant1", &record).unwrap_err();
        assert_eq!(err, StoreError::ReservedField(NAMESPACE_FIELD.to_string()));

        assert!(native().to_backend("tenant1", &record).is_ok());
    }

    #[test]
    fn test_scope_filter_ands_isolation() {
        let manager = emulated();
        let caller = FilterExpression::eq("kind", "guide");
        let scoped = manager.scope_filter("tenant1", Some(&caller)).unwrap();
        assert_eq!(
            scoped,
            FilterExpression::And(vec![caller, FilterExpression::eq(NAMESPACE_FIELD, "tenant1")])
        );

        let only_isolation = manager.scope_filter("", None).unwrap();
        assert_eq!(only_isolation, FilterExpression::eq(NAMESPACE_FIELD, ""));

        assert!(native().scope_filter("tenant1", None).is_none());
    }
}
