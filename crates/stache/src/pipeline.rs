//! Load, embed, store, search: the in-process retrieval pipeline.

use anyhow::{Context, Result, bail};
use chrono::Utc;
use stache_core::{
    BatchResult, Collection, CompletionOptions, DistanceMetric, Document, DocumentIndex,
    FilterExpression, LlmProvider, Metadata, MetadataValue, NamespaceProvider, ScoredRecord,
    VectorRecord,
};
use stache_embed::EmbeddingPool;
use stache_loaders::{LoaderRegistry, split_paragraphs};
use stache_registry::{ProviderRegistry, Settings};
use stache_store::{StoreConfig, VectorStore, open_vector_store};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Texts per embedding call.
const EMBED_BATCH_SIZE: usize = 32;

/// Registry with every builtin provider, configured from settings.
pub fn builtin_registry(settings: &Settings) -> ProviderRegistry {
    let mut registry = ProviderRegistry::new();
    stache_store::register_builtins(&mut registry);
    stache_embed::register_builtins(&mut registry);
    registry.configure(settings);
    registry
}

/// Outcome of ingesting one file.
#[derive(Debug, Clone)]
pub struct IngestedFile {
    pub path: PathBuf,
    pub document_id: String,
    pub result: BatchResult,
}

/// Every provider the pipeline talks to, resolved once.
pub struct Pipeline {
    store: VectorStore,
    embedder: EmbeddingPool,
    loaders: LoaderRegistry,
    documents: Arc<dyn DocumentIndex>,
    namespaces: Arc<dyn NamespaceProvider>,
    llm: Arc<dyn LlmProvider>,
    collection: String,
    namespace: String,
}

impl Pipeline {
    /// Resolve the configured providers and create the collection.
    pub async fn open(
        registry: &ProviderRegistry,
        settings: &Settings,
        store_config: StoreConfig,
        collection: &str,
        namespace: &str,
    ) -> Result<Self> {
        registry
            .validate(settings)
            .context("Provider configuration is invalid")?;

        let concurrency = store_config.max_concurrency;
        let store = open_vector_store(registry, settings, store_config).await?;
        let embedder = registry
            .resolve_embedding(&settings.embedding_provider)
            .await?;
        let documents = registry
            .resolve_document_index(&settings.document_index_provider)
            .await?;
        let namespaces = registry
            .resolve_namespace(&settings.namespace_provider)
            .await?;
        let llm = registry.resolve_llm(&settings.llm_provider).await?;

        store
            .create_collection(&Collection::new(
                collection,
                embedder.dimension(),
                DistanceMetric::Cosine,
            ))
            .await
            .with_context(|| format!("Failed to create collection '{collection}'"))?;
        namespaces.create_namespace(namespace).await?;

        Ok(Self {
            store,
            embedder: EmbeddingPool::new(embedder, concurrency, EMBED_BATCH_SIZE),
            loaders: LoaderRegistry::with_builtins(),
            documents,
            namespaces,
            llm,
            collection: collection.to_string(),
            namespace: namespace.to_string(),
        })
    }

    #[cfg(test)]
    pub fn documents(&self) -> &Arc<dyn DocumentIndex> {
        &self.documents
    }

    #[cfg(test)]
    pub fn namespaces(&self) -> &Arc<dyn NamespaceProvider> {
        &self.namespaces
    }

    /// Ingest files and directories. Directory entries without a loader are
    /// skipped; an explicitly named file without one is an error.
    pub async fn ingest(&self, paths: &[PathBuf]) -> Result<Vec<IngestedFile>> {
        let mut files = Vec::new();
        for path in paths {
            if path.is_dir() {
                for file in collect_files(path).await? {
                    if self.loaders.get_for_file(&file).is_some() {
                        files.push(file);
                    } else {
                        debug!("Skipping {} (no loader)", file.display());
                    }
                }
            } else if path.exists() {
                files.push(path.clone());
            } else {
                bail!("Path does not exist: {}", path.display());
            }
        }

        let mut ingested = Vec::with_capacity(files.len());
        for file in files {
            ingested.push(self.ingest_file(&file).await?);
        }
        Ok(ingested)
    }

    /// Split a file into paragraphs, embed and insert them, and record the
    /// document in the index.
    pub async fn ingest_file(&self, path: &Path) -> Result<IngestedFile> {
        let text = self
            .loaders
            .load(path)
            .await
            .with_context(|| format!("Failed to load {}", path.display()))?;
        let paragraphs = split_paragraphs(&text);
        let document_id = Uuid::new_v4().to_string();
        let source = path.display().to_string();

        let vectors = self.embedder.embed_all(&paragraphs).await?;
        let records: Vec<VectorRecord> = paragraphs
            .iter()
            .zip(vectors)
            .enumerate()
            .map(|(index, (paragraph, vector))| {
                VectorRecord::new(format!("{document_id}:{index}"), vector)
                    .with_metadata("document", document_id.as_str())
                    .with_metadata("source", source.as_str())
                    .with_metadata("paragraph", index as i64)
                    .with_metadata("text", paragraph.as_str())
                    .in_namespace(self.namespace.as_str())
            })
            .collect();

        let result = self
            .store
            .insert(&self.collection, &records, &self.namespace)
            .await?;
        if !result.failed.is_empty() {
            warn!(
                "{}: {} of {} paragraphs failed to store",
                source,
                result.failed.len(),
                records.len()
            );
        }

        let mut metadata = Metadata::new();
        if let Some(ext) = path.extension().and_then(|ext| ext.to_str()) {
            metadata.insert("extension".to_string(), MetadataValue::from(ext.to_lowercase()));
        }
        self.documents
            .put_document(&Document {
                id: document_id.clone(),
                namespace: self.namespace.clone(),
                source: source.clone(),
                title: path
                    .file_stem()
                    .and_then(|stem| stem.to_str())
                    .map(str::to_string),
                metadata,
                chunk_ids: result.succeeded.clone(),
                indexed_at: Some(Utc::now()),
            })
            .await?;

        info!("Ingested {} ({} paragraphs)", source, result.succeeded.len());
        Ok(IngestedFile {
            path: path.to_path_buf(),
            document_id,
            result,
        })
    }

    /// Nearest paragraphs to a query.
    pub async fn query(
        &self,
        query: &str,
        limit: usize,
        filter: Option<&FilterExpression>,
    ) -> Result<Vec<ScoredRecord>> {
        let vector = self.embedder.embed_query(query).await?;
        Ok(self
            .store
            .search(&self.collection, &vector, limit, filter, &self.namespace)
            .await?)
    }

    /// Ask the language model to answer from retrieved paragraphs.
    pub async fn answer(&self, query: &str, hits: &[ScoredRecord]) -> Result<String> {
        let context: Vec<&str> = hits
            .iter()
            .filter_map(|hit| hit.record.metadata.get("text").and_then(MetadataValue::as_str))
            .collect();
        let prompt = format!(
            "Answer using only this context.\n\n{}\n\nQuestion: {query}\n",
            context.join("\n\n")
        );
        Ok(self
            .llm
            .complete(&prompt, &CompletionOptions::default())
            .await?)
    }
}

/// Parse `key=value` pairs into a conjunction of equality filters.
pub fn parse_filters(pairs: &[String]) -> Result<Option<FilterExpression>> {
    let mut filter = None;
    for pair in pairs {
        let Some((key, value)) = pair.split_once('=') else {
            bail!("Invalid filter '{pair}', expected key=value");
        };
        if key.is_empty() {
            bail!("Invalid filter '{pair}', key is empty");
        }
        let condition = FilterExpression::eq(key, MetadataValue::parse_loose(value));
        filter = FilterExpression::conjoin(filter, Some(condition));
    }
    Ok(filter)
}

/// Files under a directory, sorted.
async fn collect_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let mut entries = tokio::fs::read_dir(&dir)
            .await
            .with_context(|| format!("Failed to read {}", dir.display()))?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if entry.file_type().await?.is_dir() {
                pending.push(path);
            } else {
                files.push(path);
            }
        }
    }
    files.sort();
    Ok(files)
}
