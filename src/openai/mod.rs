//! Blocking client for OpenAI-compatible embeddings and chat endpoints.
//!
//! Talks either to an Azure OpenAI resource (deployment in the path,
//! `api-key` header) or to the public OpenAI API (model in the body, bearer
//! token).

mod chat;
mod embeddings;

use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::{ApiFlavor, OpenAiConfig};
use crate::embedding::ProviderError;
use crate::error::{DocqaError, Result};

/// Operation exposed by the model service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Embeddings,
    ChatCompletions,
}

impl Operation {
    fn path(self) -> &'static str {
        match self {
            Operation::Embeddings => "embeddings",
            Operation::ChatCompletions => "chat/completions",
        }
    }

    fn service(self) -> &'static str {
        match self {
            Operation::Embeddings => "embeddings",
            Operation::ChatCompletions => "chat completions",
        }
    }
}

/// Client for one model service, shared by the embedding and chat roles
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    flavor: ApiFlavor,
    endpoint: String,
    api_version: Option<String>,
    embedding_model: String,
    chat_model: String,
    batch_size: usize,
    max_retries: usize,
}

impl OpenAiClient {
    pub fn new(
        config: &OpenAiConfig,
        api_key: &str,
        organization: Option<&str>,
        timeout: Duration,
    ) -> Result<Self> {
        let invalid_header =
            |what: &str| DocqaError::Config(format!("{} is not a valid header value", what));

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        match config.flavor {
            ApiFlavor::Azure => {
                headers.insert(
                    "api-key",
                    HeaderValue::from_str(api_key.trim())
                        .map_err(|_| invalid_header("OpenAI API key"))?,
                );
            }
            ApiFlavor::OpenAi => {
                let auth = format!("Bearer {}", api_key.trim());
                headers.insert(
                    AUTHORIZATION,
                    HeaderValue::from_str(&auth).map_err(|_| invalid_header("OpenAI API key"))?,
                );
                if let Some(org) = organization.filter(|o| !o.trim().is_empty()) {
                    headers.insert(
                        "openai-organization",
                        HeaderValue::from_str(org.trim())
                            .map_err(|_| invalid_header("OpenAI organization"))?,
                    );
                }
            }
        }

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| DocqaError::Http {
                source: e,
                context: "Failed to build OpenAI HTTP client".to_string(),
            })?;

        Ok(Self {
            client,
            flavor: config.flavor,
            endpoint: config.endpoint.clone(),
            api_version: config.api_version.clone(),
            embedding_model: config.embedding_model.clone(),
            chat_model: config.chat_model.clone(),
            batch_size: config.embedding_batch_size.max(1),
            max_retries: config.max_retries.max(1),
        })
    }

    fn url(&self, operation: Operation, model: &str) -> String {
        operation_url(
            self.flavor,
            &self.endpoint,
            self.api_version.as_deref(),
            model,
            operation,
        )
    }

    /// Model name to send in the request body; Azure routes by deployment instead
    fn body_model<'a>(&self, model: &'a str) -> Option<&'a str> {
        match self.flavor {
            ApiFlavor::Azure => None,
            ApiFlavor::OpenAi => Some(model),
        }
    }

    fn post<B, R>(
        &self,
        operation: Operation,
        model: &str,
        body: &B,
    ) -> std::result::Result<R, ProviderError>
    where
        B: Serialize,
        R: DeserializeOwned,
    {
        let url = self.url(operation, model);
        let service = operation.service();

        let mut attempt = 0usize;
        loop {
            match self.client.post(&url).json(body).send() {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        return resp.json::<R>().map_err(|e| {
                            ProviderError::InvalidResponse(format!(
                                "failed to parse {} response: {}",
                                service, e
                            ))
                        });
                    }

                    let body = resp
                        .text()
                        .unwrap_or_else(|_| "<body unavailable>".to_string());
                    if should_retry(status) && attempt + 1 < self.max_retries {
                        attempt += 1;
                        tracing::warn!(%status, attempt, "Retrying {} request", service);
                        thread::sleep(retry_backoff(attempt));
                        continue;
                    }
                    return Err(ProviderError::Status {
                        service,
                        status: status.as_u16(),
                        body,
                    });
                }
                Err(err) => {
                    if is_retryable_error(&err) && attempt + 1 < self.max_retries {
                        attempt += 1;
                        tracing::warn!(error = %err, attempt, "Retrying {} request", service);
                        thread::sleep(retry_backoff(attempt));
                        continue;
                    }
                    return Err(ProviderError::Transport {
                        service,
                        message: err.to_string(),
                    });
                }
            }
        }
    }
}

/// Full URL for an operation against a deployment (Azure) or API root (OpenAI)
pub fn operation_url(
    flavor: ApiFlavor,
    endpoint: &str,
    api_version: Option<&str>,
    model: &str,
    operation: Operation,
) -> String {
    let base = endpoint.trim_end_matches('/');
    match flavor {
        ApiFlavor::Azure => {
            let mut url = format!(
                "{}/openai/deployments/{}/{}",
                base,
                model,
                operation.path()
            );
            if let Some(version) = api_version {
                url.push_str("?api-version=");
                url.push_str(version);
            }
            url
        }
        ApiFlavor::OpenAi => format!("{}/{}", base, operation.path()),
    }
}

fn should_retry(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn is_retryable_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}

fn retry_backoff(attempt: usize) -> Duration {
    let capped = attempt.min(5) as u32;
    Duration::from_millis(500 * (1 << capped))
}
