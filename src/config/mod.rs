//! Configuration management for docqa
//!
//! Settings live in a TOML file, may be overridden from the environment, and
//! are validated as a whole before use. Secrets are never stored in the file:
//! each service names the environment variable holding its key.

use crate::error::{DocqaError, Result};
use crate::retrieval::RelevanceFilter;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

mod validator;

pub use validator::ConfigValidator;

pub const SCHEMA_VERSION: &str = "1.0.0";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(rename = "_meta")]
    pub meta: MetaConfig,
    pub search: SearchConfig,
    pub openai: OpenAiConfig,
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

/// Metadata about the configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaConfig {
    pub schema_version: String,
    #[serde(default = "current_timestamp")]
    pub created_at: String,
    #[serde(default = "current_timestamp")]
    pub last_modified: String,
}

fn current_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Hosted semantic search service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Service root, e.g. https://my-service.search.windows.net/
    pub endpoint: String,
    pub api_key_env: String,
    pub api_version: String,
    pub index_name: String,
    pub semantic_configuration: String,
    /// Number of hits requested per query
    pub top: usize,
    pub query_language: String,
}

/// Which OpenAI-compatible API family to talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiFlavor {
    /// Azure OpenAI: deployment in the path, `api-key` header
    Azure,
    /// api.openai.com: model in the body, bearer token
    OpenAi,
}

/// Embedding and chat model service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    pub flavor: ApiFlavor,
    pub endpoint: String,
    pub api_key_env: String,
    /// Required for the azure flavor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    /// Organization header for the openai flavor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_env: Option<String>,
    pub embedding_model: String,
    pub chat_model: String,
    /// Inputs per embeddings request
    pub embedding_batch_size: usize,
    pub temperature: f32,
    pub max_tokens: usize,
    pub max_retries: usize,
}

/// Relevance gate applied to search hits
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FilterConfig {
    pub threshold: f64,
    pub chunk_cap: usize,
    pub caption_cap: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        let filter = RelevanceFilter::default();
        Self {
            threshold: filter.threshold,
            chunk_cap: filter.chunk_cap,
            caption_cap: filter.caption_cap,
        }
    }
}

impl FilterConfig {
    pub fn relevance_filter(&self) -> RelevanceFilter {
        RelevanceFilter::new(self.threshold, self.chunk_cap, self.caption_cap)
    }
}

/// Answering pipeline settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub default_question: String,
    /// Chunks handed to the chat model by the chain pipeline
    pub retriever_k: usize,
    /// Memory collection used by the kernel pipeline
    pub memory_collection: String,
    pub min_relevance: f32,
    pub top_p: f32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            default_question: "Tell me about effective prompting strategies".to_string(),
            retriever_k: 4,
            memory_collection: "TeachGPTtoPDF".to_string(),
            min_relevance: 0.7,
            top_p: 0.5,
        }
    }
}

/// HTTP transport settings shared by all clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_secs: 60 }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(DocqaError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| DocqaError::Io {
            source: e,
            context: format!("Failed to read config file: {:?}", path),
        })?;
        let mut config: Config = toml::from_str(&content)?;

        config.apply_env_overrides();

        ConfigValidator::validate(&config)?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| DocqaError::Io {
            source: e,
            context: format!("Failed to write config file: {:?}", path),
        })?;
        Ok(())
    }

    /// Apply environment variable overrides
    /// Environment variables in format: DOCQA_SECTION__KEY=value
    pub fn apply_env_overrides(&mut self) {
        for (key, value) in std::env::vars() {
            if let Some(config_key) = key.strip_prefix("DOCQA_") {
                if let Err(e) = self.set_value_from_env(config_key, &value) {
                    tracing::warn!("Failed to apply env override {}: {}", key, e);
                }
            }
        }
    }

    pub(crate) fn set_value_from_env(&mut self, path: &str, value: &str) -> Result<()> {
        match path {
            "SEARCH__ENDPOINT" => self.search.endpoint = value.to_string(),
            "SEARCH__INDEX_NAME" => self.search.index_name = value.to_string(),
            "SEARCH__API_VERSION" => self.search.api_version = value.to_string(),
            "SEARCH__SEMANTIC_CONFIGURATION" => {
                self.search.semantic_configuration = value.to_string()
            }
            "SEARCH__TOP" => self.search.top = parse_env(path, value)?,
            "OPENAI__ENDPOINT" => self.openai.endpoint = value.to_string(),
            "OPENAI__API_VERSION" => self.openai.api_version = Some(value.to_string()),
            "OPENAI__EMBEDDING_MODEL" => self.openai.embedding_model = value.to_string(),
            "OPENAI__CHAT_MODEL" => self.openai.chat_model = value.to_string(),
            "OPENAI__FLAVOR" => {
                self.openai.flavor = match value.to_ascii_lowercase().as_str() {
                    "azure" => ApiFlavor::Azure,
                    "openai" => ApiFlavor::OpenAi,
                    _ => {
                        return Err(DocqaError::InvalidConfigValue {
                            path: path.to_string(),
                            message: format!("Unknown API flavor '{}'", value),
                        })
                    }
                }
            }
            "FILTER__THRESHOLD" => self.filter.threshold = parse_env(path, value)?,
            "PIPELINE__RETRIEVER_K" => self.pipeline.retriever_k = parse_env(path, value)?,
            _ => {
                tracing::debug!("Unknown env config key: {}", path);
            }
        }
        Ok(())
    }

    /// Get the default configuration file path
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| DocqaError::Config("Cannot determine config directory".to_string()))?;

        Ok(config_dir.join("docqa").join("config.toml"))
    }
}

/// Read a secret from the environment variable named in config
pub fn secret_from_env(env_var: &str) -> Result<String> {
    std::env::var(env_var)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| DocqaError::Config(format!("Environment variable {} is not set", env_var)))
}

fn parse_env<T: std::str::FromStr>(path: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| DocqaError::InvalidConfigValue {
        path: path.to_string(),
        message: format!("Cannot parse '{}'", value),
    })
}

impl Default for Config {
    fn default() -> Self {
        Self {
            meta: MetaConfig {
                schema_version: SCHEMA_VERSION.to_string(),
                created_at: current_timestamp(),
                last_modified: current_timestamp(),
            },
            search: SearchConfig {
                endpoint: "https://your-search-service-name.search.windows.net/".to_string(),
                api_key_env: "SEARCH_SERVICE_KEY".to_string(),
                api_version: "2023-07-01-preview".to_string(),
                index_name: "azureblob-index1".to_string(),
                semantic_configuration: "default".to_string(),
                top: 3,
                query_language: "en-us".to_string(),
            },
            openai: OpenAiConfig {
                flavor: ApiFlavor::Azure,
                endpoint: "https://your-openai-name.openai.azure.com/".to_string(),
                api_key_env: "AZURE_OPENAI_KEY".to_string(),
                api_version: Some("2023-08-01-preview".to_string()),
                organization_env: None,
                embedding_model: "text-embedding-ada-002".to_string(),
                chat_model: "gpt-35-turbo".to_string(),
                embedding_batch_size: 1,
                temperature: 0.0,
                max_tokens: 500,
                max_retries: 3,
            },
            filter: FilterConfig::default(),
            pipeline: PipelineConfig::default(),
            http: HttpConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_matches_relevance_filter() {
        let config = Config::default();
        assert_eq!(config.filter.relevance_filter(), RelevanceFilter::default());
    }

    #[test]
    fn test_env_override_values() {
        let mut config = Config::default();
        config.set_value_from_env("FILTER__THRESHOLD", "2.25").unwrap();
        config.set_value_from_env("OPENAI__FLAVOR", "openai").unwrap();
        config.set_value_from_env("SEARCH__TOP", "7").unwrap();

        assert_eq!(config.filter.threshold, 2.25);
        assert_eq!(config.openai.flavor, ApiFlavor::OpenAi);
        assert_eq!(config.search.top, 7);
    }

    #[test]
    fn test_env_override_rejects_bad_number() {
        let mut config = Config::default();
        assert!(config.set_value_from_env("SEARCH__TOP", "lots").is_err());
        assert_eq!(config.search.top, 3);
    }

    #[test]
    fn test_optional_sections_default() {
        let mut toml_text = toml::to_string(&Config::default()).unwrap();
        let cut = toml_text.find("[filter]").unwrap();
        toml_text.truncate(cut);

        let config: Config = toml::from_str(&toml_text).unwrap();
        assert_eq!(config.pipeline.memory_collection, "TeachGPTtoPDF");
        assert_eq!(config.http.timeout_secs, 60);
    }
}
