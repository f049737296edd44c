//! Client for the hosted semantic search service

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};

use crate::config::SearchConfig;
use crate::error::{DocqaError, Result};
use crate::retrieval::{FilteredDocuments, RelevanceFilter, SearchResponse};

/// Raw search response alongside the documents that passed the filter
#[derive(Debug, Clone)]
pub struct Retrieval {
    pub response: SearchResponse,
    pub documents: FilteredDocuments,
}

impl Retrieval {
    /// Total matches reported by the service, falling back to hits returned
    pub fn total_found(&self) -> u64 {
        self.response
            .total_count
            .unwrap_or(self.response.value.len() as u64)
    }
}

/// Blocking client issuing semantic queries against one index
pub struct SearchClient {
    client: Client,
    url: String,
    config: SearchConfig,
}

impl SearchClient {
    pub fn new(config: SearchConfig, api_key: &str, timeout: std::time::Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "api-key",
            HeaderValue::from_str(api_key.trim()).map_err(|_| {
                DocqaError::Config("Search service API key is not a valid header value".into())
            })?,
        );

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| DocqaError::Http {
                source: e,
                context: "Failed to build search HTTP client".to_string(),
            })?;

        Ok(Self {
            client,
            url: docs_url(&config),
            config,
        })
    }

    /// Run one semantic query and return the raw ranked hits
    pub fn search(&self, question: &str) -> Result<SearchResponse> {
        tracing::info!(index = %self.config.index_name, "Querying search service");

        let resp = self
            .client
            .get(&self.url)
            .query(&query_params(&self.config, question))
            .send()
            .map_err(|e| DocqaError::Http {
                source: e,
                context: format!("Failed to call search service at {}", self.url),
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp
                .text()
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(DocqaError::Api {
                service: "search service",
                status: status.as_u16(),
                body,
            });
        }

        let parsed: SearchResponse = resp.json().map_err(|e| DocqaError::Http {
            source: e,
            context: "Failed to parse search response".to_string(),
        })?;

        tracing::debug!(
            hits = parsed.value.len(),
            total = ?parsed.total_count,
            answers = parsed.answers.len(),
            "Search completed"
        );

        Ok(parsed)
    }

    /// Search, then keep only the hits that clear `filter`
    pub fn retrieve(&self, question: &str, filter: &RelevanceFilter) -> Result<Retrieval> {
        let response = self.search(question)?;
        let documents = filter.filter(&response.value)?;

        tracing::info!(
            hits = response.value.len(),
            kept = documents.len(),
            threshold = filter.threshold,
            "Filtered search hits"
        );

        Ok(Retrieval {
            response,
            documents,
        })
    }
}

/// `{endpoint}/indexes/{index}/docs`
pub fn docs_url(config: &SearchConfig) -> String {
    format!(
        "{}/indexes/{}/docs",
        config.endpoint.trim_end_matches('/'),
        config.index_name
    )
}

/// Query string for a semantic search with captions, answers and a total count
pub fn query_params(config: &SearchConfig, question: &str) -> Vec<(&'static str, String)> {
    vec![
        ("api-version", config.api_version.clone()),
        ("search", question.to_string()),
        ("select", "*".to_string()),
        ("$top", config.top.to_string()),
        ("queryLanguage", config.query_language.clone()),
        ("queryType", "semantic".to_string()),
        (
            "semanticConfiguration",
            config.semantic_configuration.clone(),
        ),
        ("$count", "true".to_string()),
        ("speller", "lexicon".to_string()),
        ("answers", "extractive|count-3".to_string()),
        ("captions", "extractive|highlight-false".to_string()),
    ]
}
