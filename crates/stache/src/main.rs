//! # Stache CLI
//!
//! Command-line interface for Stache AI, a retrieval toolkit assembled from
//! swappable provider plugins.
//!
//! ## Commands
//!
//! - `stache providers` - List registered providers
//! - `stache check` - Resolve the configured providers and show capabilities
//! - `stache ingest <PATHS>... --query <QUERY>` - Load, embed, store and search in one run
//! - `stache config show|init|path` - Manage configuration
//!
//! ## Examples
//!
//! ```bash
//! # Search a notes directory
//! stache ingest ~/notes --query "tenant isolation"
//!
//! # Only paragraphs from one file, as JSON
//! stache ingest ~/notes --query "batches" --filter source=/home/me/notes/store.md --format json
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use stache_core::{CapabilityDescriptor, MetadataValue, ProviderCategory, ScoredRecord};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

mod config;
mod pipeline;

use config::Config;
use pipeline::{Pipeline, builtin_registry, parse_filters};

#[derive(Parser)]
#[command(name = "stache")]
#[command(about = "Retrieval-augmented generation over pluggable providers")]
#[command(version)]
struct Cli {
    /// Path to config file (default: ~/.config/stache/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered providers by category
    Providers,

    /// Resolve the configured providers and print vector store capabilities
    Check,

    /// Ingest files, then search them
    Ingest {
        /// Files or directories to ingest
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Query string
        #[arg(short, long)]
        query: String,

        /// Maximum results
        #[arg(short, long, default_value = "5")]
        limit: usize,

        /// Metadata filter as key=value (repeatable, ANDed)
        #[arg(long = "filter")]
        filters: Vec<String>,

        /// Namespace to ingest into and search
        #[arg(short, long, default_value = "")]
        namespace: String,

        /// Collection name
        #[arg(long, default_value = "documents")]
        collection: String,

        /// Ask the language model to answer from the results
        #[arg(long)]
        answer: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Print sample configuration file
    Init,
    /// Show config file path
    Path,
}

/// Output structure for `check`.
#[derive(Serialize)]
struct CheckOutput {
    providers: BTreeMap<String, String>,
    capabilities: CapabilityDescriptor,
}

/// Output structure for `ingest`.
#[derive(Serialize)]
struct IngestOutput {
    documents: Vec<DocumentItem>,
    query: String,
    results: Vec<ResultItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    answer: Option<String>,
}

#[derive(Serialize)]
struct DocumentItem {
    source: String,
    id: String,
    paragraphs: usize,
    failed: usize,
}

#[derive(Serialize)]
struct ResultItem {
    id: String,
    source: String,
    score: f32,
    content: String,
}

impl ResultItem {
    fn from_hit(hit: &ScoredRecord, max_len: usize) -> Self {
        let field = |key: &str| {
            hit.record
                .metadata
                .get(key)
                .and_then(MetadataValue::as_str)
                .unwrap_or_default()
        };
        Self {
            id: hit.record.id.clone(),
            source: field("source").to_string(),
            score: hit.score,
            content: truncate(field("text"), max_len),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = if let Some(ref path) = cli.config {
        Config::load_from(Some(path.clone()))
            .context(format!("Failed to load config from {}", path.display()))?
    } else {
        Config::load().context("Failed to load config")?
    };

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        config.logging.level()?
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    let settings = &config.providers;

    match cli.command {
        Commands::Providers => {
            let registry = builtin_registry(settings);
            let listing: BTreeMap<String, Vec<String>> = ProviderCategory::ALL
                .into_iter()
                .map(|category| (category.to_string(), registry.registered(category)))
                .collect();

            match cli.format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&listing)?);
                }
                OutputFormat::Text => {
                    for (category, names) in &listing {
                        println!("{category}: {}", names.join(", "));
                    }
                }
            }
        }

        Commands::Check => {
            let registry = builtin_registry(settings);
            registry
                .validate(settings)
                .context("Provider configuration is invalid")?;

            let mut providers = BTreeMap::new();
            for category in ProviderCategory::ALL {
                let handle = registry
                    .resolve_configured(settings, category)
                    .await
                    .with_context(|| format!("Failed to resolve {category} provider"))?;
                providers.insert(category.to_string(), handle.name().to_string());
            }
            let (_, capabilities) = registry
                .resolve_vectordb(&settings.vectordb_provider)
                .await?;
            info!("All configured providers resolved");

            match cli.format {
                OutputFormat::Json => {
                    let output = CheckOutput {
                        providers,
                        capabilities,
                    };
                    println!("{}", serde_json::to_string_pretty(&output)?);
                }
                OutputFormat::Text => {
                    for (category, name) in &providers {
                        println!("{category}: {name}");
                    }
                    println!();
                    println!("Vector store capabilities:");
                    println!("  Max batch size:     {}", capabilities.max_batch_size);
                    println!("  Filtering:          {}", capabilities.supports_filtering);
                    println!(
                        "  Filter operators:   {}",
                        join(&capabilities.supported_filter_operators)
                    );
                    println!(
                        "  Logical operators:  {}",
                        join(&capabilities.supported_logical_operators)
                    );
                    println!("  Namespaces:         {}", capabilities.supports_namespaces);
                    println!("  Native update:      {}", capabilities.supports_native_update);
                }
            }
        }

        Commands::Ingest {
            paths,
            query,
            limit,
            filters,
            namespace,
            collection,
            answer,
        } => {
            let filter = parse_filters(&filters)?;
            let registry = builtin_registry(settings);
            let pipeline = Pipeline::open(
                &registry,
                settings,
                config.store.clone(),
                &collection,
                &namespace,
            )
            .await?;

            let ingested = pipeline.ingest(&paths).await?;
            let hits = pipeline
                .query(&query, limit, filter.as_ref())
                .await
                .context("Query execution failed")?;
            let answer = if answer {
                Some(pipeline.answer(&query, &hits).await?)
            } else {
                None
            };

            match cli.format {
                OutputFormat::Json => {
                    let output = IngestOutput {
                        documents: ingested
                            .iter()
                            .map(|file| DocumentItem {
                                source: file.path.display().to_string(),
                                id: file.document_id.clone(),
                                paragraphs: file.result.succeeded.len(),
                                failed: file.result.failed.len(),
                            })
                            .collect(),
                        query: query.clone(),
                        results: hits.iter().map(|hit| ResultItem::from_hit(hit, 200)).collect(),
                        answer,
                    };
                    println!("{}", serde_json::to_string_pretty(&output)?);
                }
                OutputFormat::Text => {
                    let paragraphs: usize =
                        ingested.iter().map(|file| file.result.succeeded.len()).sum();
                    println!("Ingested {} files ({paragraphs} paragraphs)\n", ingested.len());
                    println!("Query: {query}\n");
                    if hits.is_empty() {
                        println!("No results found.");
                    } else {
                        for (i, hit) in hits.iter().enumerate() {
                            let item = ResultItem::from_hit(hit, 100);
                            println!("{}. {} (score: {:.3})", i + 1, item.source, item.score);
                            println!("   {}", item.content);
                            println!();
                        }
                    }
                    if let Some(answer) = answer {
                        println!("Answer: {answer}");
                    }
                }
            }
        }

        Commands::Config { action } => match action {
            ConfigAction::Show => match cli.format {
                OutputFormat::Json => {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&config)
                            .context("Failed to serialize config")?
                    );
                }
                OutputFormat::Text => {
                    println!(
                        "{}",
                        toml::to_string_pretty(&config).context("Failed to serialize config")?
                    );
                }
            },
            ConfigAction::Init => {
                println!("{}", Config::sample_toml());
            }
            ConfigAction::Path => {
                if let Some(path) = Config::config_path() {
                    println!("{}", path.display());
                } else {
                    println!("Could not determine config directory");
                }
            }
        },
    }

    Ok(())
}

fn join<T: std::fmt::Display>(items: impl IntoIterator<Item = T>) -> String {
    let items: Vec<String> = items.into_iter().map(|item| item.to_string()).collect();
    if items.is_empty() {
        "none".to_string()
    } else {
        items.join(", ")
    }
}

/// Truncate a string to max length, adding ellipsis if needed.
fn truncate(s: &str, max_len: usize) -> String {
    let s = s.replace('\n', " ").replace('\r', "");
    if s.chars().count() <= max_len {
        s
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}
