//! # stache-embed
//!
//! Builtin text providers for Stache AI. They run fully offline.
//!
//! | Type | Category | Registered as |
//! |------|----------|---------------|
//! | [`HashingEmbedder`] | embedding | `hashing` |
//! | [`NoopEmbedder`] | embedding | `noop` |
//! | [`EchoLlm`] | llm | `echo` |
//!
//! [`EmbeddingPool`] wraps any embedding provider with batching and a
//! concurrency limit.

pub mod hashing;
pub mod llm;
pub mod noop;
pub mod plugins;
pub mod pool;

pub use hashing::{DEFAULT_DIMENSION, DimensionOptions, HashingEmbedder};
pub use llm::EchoLlm;
pub use noop::NoopEmbedder;
pub use plugins::register_builtins;
pub use pool::EmbeddingPool;
