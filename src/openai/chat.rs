use serde::{Deserialize, Serialize};

use super::{OpenAiClient, Operation};
use crate::embedding::ProviderError;
use crate::llm::{ChatMessage, ChatProvider, ChatRequest};

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatProvider for OpenAiClient {
    fn complete(&self, request: &ChatRequest) -> Result<String, ProviderError> {
        let body = ChatCompletionRequest {
            model: self.body_model(&self.chat_model),
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            top_p: request.top_p,
        };

        tracing::info!(model = %self.chat_model, "Requesting chat completion");
        let parsed: ChatCompletionResponse =
            self.post(Operation::ChatCompletions, &self.chat_model, &body)?;

        first_answer(parsed)
    }

    fn model_name(&self) -> &str {
        &self.chat_model
    }
}

fn first_answer(parsed: ChatCompletionResponse) -> Result<String, ProviderError> {
    parsed
        .choices
        .into_iter()
        .find_map(|choice| choice.message.content)
        .ok_or_else(|| ProviderError::InvalidResponse("chat response has no content".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_choice_content() {
        let parsed: ChatCompletionResponse = serde_json::from_str(
            r#"{"choices": [{"index": 0, "finish_reason": "stop",
                "message": {"role": "assistant", "content": "Be explicit."}}]}"#,
        )
        .unwrap();
        assert_eq!(first_answer(parsed).unwrap(), "Be explicit.");
    }

    #[test]
    fn test_empty_choices_rejected() {
        let parsed: ChatCompletionResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(first_answer(parsed).is_err());
    }

    #[test]
    fn test_request_body_shape() {
        let messages = vec![ChatMessage::system("sys"), ChatMessage::user("hi")];
        let body = ChatCompletionRequest {
            model: Some("gpt-4o-mini"),
            messages: &messages,
            temperature: 0.0,
            max_tokens: 500,
            top_p: None,
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["max_tokens"], 500);
        assert!(json.get("top_p").is_none());
    }
}
