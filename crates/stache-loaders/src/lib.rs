//! # stache-loaders
//!
//! Document loaders for Stache AI, selected by file extension.
//!
//! [`LoaderRegistry`] maps lowercase extensions to [`DocumentLoader`]s. The
//! builtin [`TextLoader`] reads text-based formats as UTF-8.
//!
//! [`DocumentLoader`]: stache_core::DocumentLoader

pub mod registry;
pub mod text;

pub use registry::LoaderRegistry;
pub use text::{TextLoader, split_paragraphs};
