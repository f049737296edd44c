use std::path::PathBuf;
use thiserror::Error;

use crate::embedding::{MemoryStoreError, ProviderError};
use crate::retrieval::MalformedHitError;

/// Main error type for docqa
#[derive(Error, Debug)]
pub enum DocqaError {
    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration validation errors
    #[error("Configuration validation failed: {errors:?}")]
    ConfigValidation { errors: Vec<ValidationError> },

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Invalid configuration value
    #[error("Invalid configuration value at {path}: {message}")]
    InvalidConfigValue { path: String, message: String },

    /// IO errors
    #[error("IO error: {context}: {source}")]
    Io {
        source: std::io::Error,
        context: String,
    },

    /// TOML deserialization errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization errors
    #[error("TOML serialization error: {0}")]
    TomlSerialization(#[from] toml::ser::Error),

    /// JSON errors
    #[error("JSON error: {context}: {source}")]
    Json {
        source: serde_json::Error,
        context: String,
    },

    /// Transport-level HTTP failures
    #[error("HTTP error: {context}: {source}")]
    Http {
        source: reqwest::Error,
        context: String,
    },

    /// A hosted service answered with a non-success status
    #[error("{service} returned {status}: {body}")]
    Api {
        service: &'static str,
        status: u16,
        body: String,
    },

    /// A search hit is missing a required field
    #[error(transparent)]
    MalformedHit(#[from] MalformedHitError),

    /// Embedding or chat provider failures
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Memory store failures
    #[error(transparent)]
    MemoryStore(#[from] MemoryStoreError),

    /// No search hit scored above the relevance threshold
    #[error("No documents scored above the relevance threshold {threshold}")]
    NoRelevantDocuments { threshold: f64 },

    /// Filtered documents carried no text to embed
    #[error("Filtered documents contain no chunks to index")]
    NoChunks,

    /// The memory collection had nothing related to the question
    #[error("No stored page is related to the question (min relevance {min_relevance})")]
    NoRelatedContent { min_relevance: f32 },

    /// Generic errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Configuration validation error
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Path to the configuration key that failed validation
    pub path: String,
    /// Error message describing the validation failure
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result type for docqa operations
pub type Result<T> = std::result::Result<T, DocqaError>;
