//! docqa - question answering over semantically searched documents
//!
//! Queries a hosted semantic search index, keeps the hits whose reranker
//! score clears a threshold, embeds their pages into volatile memory and asks
//! a hosted chat model to answer from the most related ones.

pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod llm;
pub mod openai;
pub mod pipeline;
pub mod retrieval;
pub mod search;

pub use error::{DocqaError, Result};
