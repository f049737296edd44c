//! Embedding provider trait and the error shared by hosted model providers
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("{service} request failed: {message}")]
    Transport {
        service: &'static str,
        message: String,
    },

    #[error("{service} returned {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Trait for embedding providers
///
/// Allows pipelines to run against hosted models or test doubles alike.
pub trait EmbeddingProvider: Send + Sync {
    /// Generate embeddings for multiple texts, one vector per input in order
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError>;

    /// Get the model name
    fn model_name(&self) -> &str;

    /// Generate embedding for a single text
    fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        if text.trim().is_empty() {
            return Err(ProviderError::InvalidInput("Empty text".to_string()));
        }

        self.embed_batch(&[text.to_string()])?
            .pop()
            .ok_or_else(|| ProviderError::InvalidResponse("No embedding generated".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct LengthEmbedder;

    impl EmbeddingProvider for LengthEmbedder {
        fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
            Ok(texts.iter().map(|t| vec![t.len() as f32, 1.0]).collect())
        }

        fn model_name(&self) -> &str {
            "length"
        }
    }

    #[test]
    fn test_single_embed_uses_batch() {
        let embedding = LengthEmbedder.embed("abcd").unwrap();
        assert_eq!(embedding, vec![4.0, 1.0]);
    }

    #[test]
    fn test_empty_text() {
        assert!(matches!(
            LengthEmbedder.embed("  "),
            Err(ProviderError::InvalidInput(_))
        ));
    }
}
