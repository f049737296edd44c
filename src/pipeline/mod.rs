//! Question answering over filtered search results
//!
//! Two interchangeable strategies share the same inputs:
//! - `chain`: embed every chunk, recall the top-k most similar, stuff them
//!   into one prompt and ask for an answer with a SOURCES list
//! - `kernel`: store chunks under `<file>_<n>` ids, recall the single most
//!   related page and answer from a question/page template

mod chain;
mod kernel;
pub mod prompt;

pub use chain::ChainPipeline;
pub use kernel::KernelPipeline;

use serde::Serialize;

use crate::config::Config;
use crate::embedding::EmbeddingProvider;
use crate::error::Result;
use crate::llm::ChatProvider;
use crate::retrieval::FilteredDocuments;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PipelineKind {
    Chain,
    Kernel,
}

impl std::fmt::Display for PipelineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineKind::Chain => f.write_str("chain"),
            PipelineKind::Kernel => f.write_str("kernel"),
        }
    }
}

/// Model parameters and recall settings for one run
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub temperature: f32,
    pub max_tokens: usize,
    pub top_p: f32,
    pub retriever_k: usize,
    pub memory_collection: String,
    pub min_relevance: f32,
}

impl PipelineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            temperature: config.openai.temperature,
            max_tokens: config.openai.max_tokens,
            top_p: config.pipeline.top_p,
            retriever_k: config.pipeline.retriever_k,
            memory_collection: config.pipeline.memory_collection.clone(),
            min_relevance: config.pipeline.min_relevance,
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Final answer with the references it was grounded on
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub pipeline: PipelineKind,
    pub question: String,
    pub answer: String,
    pub references: Vec<String>,
    /// Chunks embedded into memory for this answer
    pub chunks_indexed: usize,
}

/// Answer `question` from `documents` with the chosen strategy
pub fn answer_question(
    kind: PipelineKind,
    documents: &FilteredDocuments,
    question: &str,
    embedder: &dyn EmbeddingProvider,
    chat: &dyn ChatProvider,
    settings: &PipelineSettings,
) -> Result<Answer> {
    tracing::info!(
        pipeline = %kind,
        documents = documents.len(),
        chunks = documents.chunk_count(),
        "Answering question"
    );

    match kind {
        PipelineKind::Chain => ChainPipeline::new(embedder, chat, settings).run(documents, question),
        PipelineKind::Kernel => {
            KernelPipeline::new(embedder, chat, settings).run(documents, question)
        }
    }
}
