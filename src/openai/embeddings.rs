use serde::{Deserialize, Serialize};

use super::{OpenAiClient, Operation};
use crate::embedding::{EmbeddingProvider, ProviderError};

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

impl EmbeddingProvider for OpenAiClient {
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            let request = EmbeddingRequest {
                model: self.body_model(&self.embedding_model),
                input: batch,
            };
            let parsed: EmbeddingResponse =
                self.post(Operation::Embeddings, &self.embedding_model, &request)?;
            embeddings.extend(ordered_embeddings(parsed, batch.len())?);
        }

        tracing::debug!(
            inputs = texts.len(),
            model = %self.embedding_model,
            "Generated embeddings"
        );

        Ok(embeddings)
    }

    fn model_name(&self) -> &str {
        &self.embedding_model
    }
}

fn ordered_embeddings(
    mut parsed: EmbeddingResponse,
    expected: usize,
) -> Result<Vec<Vec<f32>>, ProviderError> {
    if parsed.data.len() != expected {
        return Err(ProviderError::InvalidResponse(format!(
            "returned {} embeddings for {} inputs",
            parsed.data.len(),
            expected
        )));
    }
    parsed.data.sort_by_key(|entry| entry.index);
    Ok(parsed.data.into_iter().map(|entry| entry.embedding).collect())
}
