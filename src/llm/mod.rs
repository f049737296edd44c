//! Chat completion abstraction

use serde::Serialize;

use crate::embedding::ProviderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Request envelope shared by chat providers
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: usize,
    pub top_p: Option<f32>,
}

/// Trait implemented by chat completion backends
pub trait ChatProvider: Send + Sync {
    /// Return the assistant's reply to the request
    fn complete(&self, request: &ChatRequest) -> Result<String, ProviderError>;

    fn model_name(&self) -> &str;
}
