use crate::config::{ApiFlavor, Config, SCHEMA_VERSION};
use crate::error::{DocqaError, Result, ValidationError};

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration, collecting every problem found
    pub fn validate(config: &Config) -> Result<()> {
        let mut errors = Vec::new();

        Self::validate_schema_version(config, &mut errors);
        Self::validate_search(config, &mut errors);
        Self::validate_openai(config, &mut errors);
        Self::validate_filter(config, &mut errors);
        Self::validate_pipeline(config, &mut errors);

        if config.http.timeout_secs == 0 {
            errors.push(ValidationError::new(
                "http.timeout_secs",
                "Timeout must be greater than 0",
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(DocqaError::ConfigValidation { errors })
        }
    }

    /// Check that the API key variables named in config are set and non-empty
    pub fn validate_credentials(config: &Config) -> Result<()> {
        let mut errors = Vec::new();

        Self::require_env("search.api_key_env", &config.search.api_key_env, &mut errors);
        Self::require_env("openai.api_key_env", &config.openai.api_key_env, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(DocqaError::ConfigValidation { errors })
        }
    }

    fn validate_schema_version(config: &Config, errors: &mut Vec<ValidationError>) {
        let version = &config.meta.schema_version;
        if version != SCHEMA_VERSION {
            errors.push(ValidationError::new(
                "_meta.schema_version",
                format!("Unsupported schema version: {}", version),
            ));
        }
    }

    fn validate_search(config: &Config, errors: &mut Vec<ValidationError>) {
        let search = &config.search;

        if !Self::is_http_url(&search.endpoint) {
            errors.push(ValidationError::new(
                "search.endpoint",
                format!("Endpoint must be an http(s) URL, got '{}'", search.endpoint),
            ));
        }

        if search.index_name.trim().is_empty() {
            errors.push(ValidationError::new(
                "search.index_name",
                "Index name cannot be empty",
            ));
        }

        if search.api_version.trim().is_empty() {
            errors.push(ValidationError::new(
                "search.api_version",
                "API version cannot be empty",
            ));
        }

        if search.semantic_configuration.trim().is_empty() {
            errors.push(ValidationError::new(
                "search.semantic_configuration",
                "Semantic configuration name cannot be empty",
            ));
        }

        if search.top == 0 {
            errors.push(ValidationError::new(
                "search.top",
                "Top must be greater than 0",
            ));
        }
    }

    fn validate_openai(config: &Config, errors: &mut Vec<ValidationError>) {
        let openai = &config.openai;

        if !Self::is_http_url(&openai.endpoint) {
            errors.push(ValidationError::new(
                "openai.endpoint",
                format!("Endpoint must be an http(s) URL, got '{}'", openai.endpoint),
            ));
        }

        if openai.flavor == ApiFlavor::Azure
            && openai
                .api_version
                .as_deref()
                .map_or(true, |v| v.trim().is_empty())
        {
            errors.push(ValidationError::new(
                "openai.api_version",
                "API version is required for the azure flavor",
            ));
        }

        if openai.embedding_model.trim().is_empty() {
            errors.push(ValidationError::new(
                "openai.embedding_model",
                "Embedding model cannot be empty",
            ));
        }

        if openai.chat_model.trim().is_empty() {
            errors.push(ValidationError::new(
                "openai.chat_model",
                "Chat model cannot be empty",
            ));
        }

        if openai.embedding_batch_size == 0 {
            errors.push(ValidationError::new(
                "openai.embedding_batch_size",
                "Batch size must be greater than 0",
            ));
        }

        if openai.max_tokens == 0 {
            errors.push(ValidationError::new(
                "openai.max_tokens",
                "Max tokens must be greater than 0",
            ));
        }

        let temp = openai.temperature;
        if !(0.0..=2.0).contains(&temp) {
            errors.push(ValidationError::new(
                "openai.temperature",
                format!("Temperature must be between 0.0 and 2.0, got {}", temp),
            ));
        }
    }

    fn validate_filter(config: &Config, errors: &mut Vec<ValidationError>) {
        let filter = &config.filter;

        // Reranker scores live in [1.0, 4.0]
        if !(0.0..=4.0).contains(&filter.threshold) {
            errors.push(ValidationError::new(
                "filter.threshold",
                format!(
                    "Threshold must be between 0.0 and 4.0, got {}",
                    filter.threshold
                ),
            ));
        }

        if filter.chunk_cap == 0 {
            errors.push(ValidationError::new(
                "filter.chunk_cap",
                "Chunk cap must be greater than 0",
            ));
        }

        if filter.caption_cap == 0 {
            errors.push(ValidationError::new(
                "filter.caption_cap",
                "Caption cap must be greater than 0",
            ));
        }
    }

    fn validate_pipeline(config: &Config, errors: &mut Vec<ValidationError>) {
        let pipeline = &config.pipeline;

        if pipeline.retriever_k == 0 {
            errors.push(ValidationError::new(
                "pipeline.retriever_k",
                "Retriever k must be greater than 0",
            ));
        }

        if pipeline.memory_collection.trim().is_empty() {
            errors.push(ValidationError::new(
                "pipeline.memory_collection",
                "Memory collection name cannot be empty",
            ));
        }

        if !(-1.0..=1.0).contains(&pipeline.min_relevance) {
            errors.push(ValidationError::new(
                "pipeline.min_relevance",
                format!(
                    "Min relevance must be between -1.0 and 1.0, got {}",
                    pipeline.min_relevance
                ),
            ));
        }

        if !(0.0..=1.0).contains(&pipeline.top_p) {
            errors.push(ValidationError::new(
                "pipeline.top_p",
                format!("Top p must be between 0.0 and 1.0, got {}", pipeline.top_p),
            ));
        }
    }

    fn require_env(path: &str, env_var: &str, errors: &mut Vec<ValidationError>) {
        match std::env::var(env_var) {
            Ok(key) if key.trim().is_empty() => errors.push(ValidationError::new(
                path,
                format!("Environment variable {} is empty", env_var),
            )),
            Ok(_) => {}
            Err(_) => errors.push(ValidationError::new(
                path,
                format!("Environment variable {} is not set", env_var),
            )),
        }
    }

    fn is_http_url(s: &str) -> bool {
        s.starts_with("https://") || s.starts_with("http://")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn error_paths(config: &Config) -> Vec<String> {
        match ConfigValidator::validate(config) {
            Err(DocqaError::ConfigValidation { errors }) => {
                errors.into_iter().map(|e| e.path).collect()
            }
            other => panic!("expected validation failure, got {:?}", other),
        }
    }

    #[test]
    fn test_valid_config() {
        let config = Config::default();
        assert!(ConfigValidator::validate(&config).is_ok());
    }

    #[test]
    fn test_threshold_out_of_range() {
        let mut config = Config::default();
        config.filter.threshold = 4.5;
        assert_eq!(error_paths(&config), vec!["filter.threshold"]);
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = Config::default();
        config.filter.chunk_cap = 0;
        config.search.top = 0;
        config.openai.endpoint = "ftp://nope".to_string();

        let paths = error_paths(&config);
        assert_eq!(paths.len(), 3);
        assert!(paths.contains(&"filter.chunk_cap".to_string()));
        assert!(paths.contains(&"search.top".to_string()));
        assert!(paths.contains(&"openai.endpoint".to_string()));
    }

    #[test]
    fn test_azure_requires_api_version() {
        let mut config = Config::default();
        config.openai.api_version = None;
        assert_eq!(error_paths(&config), vec!["openai.api_version"]);

        config.openai.flavor = ApiFlavor::OpenAi;
        assert!(ConfigValidator::validate(&config).is_ok());
    }

    #[test]
    fn test_missing_credentials_reported() {
        let mut config = Config::default();
        config.search.api_key_env = "DOCQA_TEST_UNSET_SEARCH_KEY".to_string();
        config.openai.api_key_env = "DOCQA_TEST_UNSET_OPENAI_KEY".to_string();
        assert!(ConfigValidator::validate_credentials(&config).is_err());
    }
}
