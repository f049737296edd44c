use crate::embedding::{EmbeddingProvider, MemoryRecord, MemoryStore, ProviderError};
use crate::error::{DocqaError, Result};
use crate::llm::{ChatMessage, ChatProvider, ChatRequest};
use crate::retrieval::FilteredDocuments;

use super::prompt::{split_sources, stuff_prompt, STUFF_SYSTEM_PROMPT};
use super::{Answer, PipelineKind, PipelineSettings};

const COLLECTION: &str = "chain";

/// Retrieval chain: embed all chunks, stuff the top-k into one prompt
pub struct ChainPipeline<'a> {
    embedder: &'a dyn EmbeddingProvider,
    chat: &'a dyn ChatProvider,
    settings: &'a PipelineSettings,
}

impl<'a> ChainPipeline<'a> {
    pub fn new(
        embedder: &'a dyn EmbeddingProvider,
        chat: &'a dyn ChatProvider,
        settings: &'a PipelineSettings,
    ) -> Self {
        Self {
            embedder,
            chat,
            settings,
        }
    }

    pub fn run(&self, documents: &FilteredDocuments, question: &str) -> Result<Answer> {
        let mut chunks = documents.sourced_chunks();
        chunks.retain(|chunk| !chunk.text.trim().is_empty());
        if chunks.is_empty() {
            return Err(DocqaError::NoChunks);
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts)?;
        if embeddings.len() != texts.len() {
            return Err(ProviderError::InvalidResponse(format!(
                "{} embeddings for {} chunks",
                embeddings.len(),
                texts.len()
            ))
            .into());
        }

        let mut store = MemoryStore::new();
        for (i, (chunk, embedding)) in chunks.into_iter().zip(embeddings).enumerate() {
            store.save_information(
                COLLECTION,
                MemoryRecord {
                    id: i.to_string(),
                    text: chunk.text,
                    description: chunk.source,
                    embedding,
                },
            )?;
        }
        let indexed = store.len(COLLECTION);
        tracing::debug!(indexed, "Chunks embedded into memory");

        let query = self.embedder.embed(question)?;
        let related = store.search(COLLECTION, &query, self.settings.retriever_k, f32::MIN)?;

        let request = ChatRequest {
            messages: vec![
                ChatMessage::system(STUFF_SYSTEM_PROMPT),
                ChatMessage::user(stuff_prompt(question, &related)),
            ],
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
            top_p: None,
        };
        let reply = self.chat.complete(&request)?;

        let (answer, mut references) = split_sources(&reply);
        if references.is_empty() {
            tracing::debug!("Reply has no SOURCES line, citing retrieved chunks");
            for result in &related {
                if !references.contains(&result.description) {
                    references.push(result.description.clone());
                }
            }
        }

        Ok(Answer {
            pipeline: PipelineKind::Chain,
            question: question.to_string(),
            answer,
            references,
            chunks_indexed: indexed,
        })
    }
}
