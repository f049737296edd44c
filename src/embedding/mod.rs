//! Embedding generation and volatile vector memory
//!
//! - EmbeddingProvider trait for abstraction over hosted models
//! - MemoryStore for cosine recall over a handful of chunks
mod provider;
mod store;

pub use provider::{EmbeddingProvider, ProviderError};
pub use store::{cosine_similarity, MemoryQueryResult, MemoryRecord, MemoryStore, MemoryStoreError};
