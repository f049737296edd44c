use crate::embedding::{EmbeddingProvider, MemoryRecord, MemoryStore, ProviderError};
use crate::error::{DocqaError, Result};
use crate::llm::{ChatMessage, ChatProvider, ChatRequest};
use crate::retrieval::FilteredDocuments;

use super::prompt::{render_template, RELATED_PAGE_TEMPLATE};
use super::{Answer, PipelineKind, PipelineSettings};

/// Memory-backed semantic function: recall one related page, answer from a template
pub struct KernelPipeline<'a> {
    embedder: &'a dyn EmbeddingProvider,
    chat: &'a dyn ChatProvider,
    settings: &'a PipelineSettings,
}

impl<'a> KernelPipeline<'a> {
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

    /// Save every retained chunk under its `<file>_<n>` id.
    ///
    /// A page whose id is already stored replaces the earlier one.
    pub fn memorize(&self, documents: &FilteredDocuments, store: &mut MemoryStore) -> Result<usize> {
        let collection = &self.settings.memory_collection;
        store.create_collection(collection);

        for page in documents.keyed_chunks() {
            if page.text.trim().is_empty() {
                tracing::debug!(id = %page.id, "Skipping blank page");
                continue;
            }
            let embedding = self.embedder.embed(&page.text)?;
            if store.get(collection, &page.id).is_some() {
                tracing::debug!(
                    id = %page.id,
                    source = %page.source,
                    "Page id already stored, overwriting"
                );
            } else {
                tracing::debug!(id = %page.id, "Saving page to memory");
            }
            store.save_information(
                collection,
                MemoryRecord {
                    id: page.id,
                    text: page.text,
                    description: page.source,
                    embedding,
                },
            )?;
        }

        Ok(store.len(collection))
    }

    pub fn run(&self, documents: &FilteredDocuments, question: &str) -> Result<Answer> {
        let mut store = MemoryStore::new();
        let indexed = self.memorize(documents, &mut store)?;
        if indexed == 0 {
            return Err(DocqaError::NoChunks);
        }

        let query = self.embedder.embed(question)?;
        let related = store
            .search(
                &self.settings.memory_collection,
                &query,
                1,
                self.settings.min_relevance,
            )?
            .into_iter()
            .next()
            .ok_or(DocqaError::NoRelatedContent {
                min_relevance: self.settings.min_relevance,
            })?;
        tracing::info!(id = %related.id, relevance = related.relevance, "Recalled related page");

        let prompt = render_template(
            RELATED_PAGE_TEMPLATE,
            &[("question", question), ("related_page", &related.text)],
        );
        let request = ChatRequest {
            messages: vec![ChatMessage::user(prompt)],
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
            top_p: Some(self.settings.top_p),
        };
        let reply = self.chat.complete(&request)?;
        if reply.trim().is_empty() {
            return Err(ProviderError::InvalidResponse("empty answer".to_string()).into());
        }

        Ok(Answer {
            pipeline: PipelineKind::Kernel,
            question: question.to_string(),
            answer: reply.trim().to_string(),
            references: vec![related.id],
            chunks_indexed: indexed,
        })
    }
}
