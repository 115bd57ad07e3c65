//! Configuration management
//!
//! All credentials and tunables are explicit values loaded from a TOML file
//! (with environment-variable fallback for API keys) and handed to each
//! component's constructor; no ambient lookups inside components.

use crate::error::{ErrorContext, ScoutError, ScoutResult};
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration for the Scout system
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoutConfig {
    /// LLM provider configuration
    pub llm: LlmConfig,
    /// External tool credentials and limits
    pub tools: ToolsConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider type (openai, anthropic, ollama, groq)
    pub provider: String,
    /// Model name
    pub model: String,
    /// API key (optional, can be set via environment)
    pub api_key: Option<String>,
    /// Base URL for custom providers
    pub base_url: Option<String>,
    /// Temperature for generation
    pub temperature: f32,
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key: None,
            base_url: None,
            temperature: 0.7,
            max_tokens: Some(2000),
        }
    }
}

/// Configuration for the external tool layer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Web search and page extraction
    pub web: WebToolsConfig,
    /// Document store access
    pub docstore: DocStoreConfig,
}

/// Web search / content extraction configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebToolsConfig {
    /// Brave Search API key; the search tool falls back to DuckDuckGo
    /// instant answers when absent
    pub brave_api_key: Option<String>,
    /// Firecrawl API key; the extraction tool falls back to a raw fetch
    /// when absent
    pub firecrawl_api_key: Option<String>,
    /// Maximum extracted content length in characters
    pub max_content_length: usize,
}

impl Default for WebToolsConfig {
    fn default() -> Self {
        Self {
            brave_api_key: None,
            firecrawl_api_key: None,
            max_content_length: 8000,
        }
    }
}

/// Document store configuration
///
/// The store is reached over its REST API with an already-obtained bearer
/// token; interactive authentication flows are out of scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DocStoreConfig {
    /// API base URL
    pub api_base: String,
    /// Bearer token for API access
    pub api_token: Option<String>,
    /// Maximum extracted content length in characters
    pub max_content_length: usize,
}

impl Default for DocStoreConfig {
    fn default() -> Self {
        Self {
            api_base: "https://www.googleapis.com/drive/v3".to_string(),
            api_token: None,
            max_content_length: 8000,
        }
    }
}

impl ScoutConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> ScoutResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ScoutError::Config {
            message: format!("Failed to read config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("read_file")
                .with_suggestion("Check if the config file exists and is readable"),
        })?;

        let config: ScoutConfig = toml::from_str(&content).map_err(|e| ScoutError::Config {
            message: format!("Failed to parse config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("parse_toml")
                .with_suggestion("Check TOML syntax in config file"),
        })?;

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> ScoutResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| ScoutError::Config {
            message: format!("Failed to serialize config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config").with_operation("serialize_toml"),
        })?;

        std::fs::write(path, content).map_err(|e| ScoutError::Config {
            message: format!("Failed to write config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("write_file")
                .with_suggestion("Check if the directory exists and is writable"),
        })?;

        Ok(())
    }

    /// Fill unset credentials from environment variables
    pub fn apply_env(mut self) -> Self {
        if self.llm.api_key.is_none() {
            if let Some(var) = llm_key_var(&self.llm.provider) {
                self.llm.api_key = std::env::var(var).ok();
            }
        }
        self.tools.web.brave_api_key = self
            .tools
            .web
            .brave_api_key
            .or_else(|| std::env::var("BRAVE_SEARCH_API_KEY").ok());
        self.tools.web.firecrawl_api_key = self
            .tools
            .web
            .firecrawl_api_key
            .or_else(|| std::env::var("FIRECRAWL_API_KEY").ok());
        self.tools.docstore.api_token = self
            .tools
            .docstore
            .api_token
            .or_else(|| std::env::var("DOCSTORE_API_TOKEN").ok());
        self
    }

    /// Validate configuration values
    pub fn validate(&self) -> ScoutResult<()> {
        if self.llm.provider.is_empty() {
            return Err(ScoutError::Config {
                message: "LLM provider must be set".to_string(),
                source: None,
                context: ErrorContext::new("config")
                    .with_operation("validate")
                    .with_suggestion("Set llm.provider to one of: openai, anthropic, ollama, groq"),
            });
        }

        if self.llm.model.is_empty() {
            return Err(ScoutError::Config {
                message: "LLM model must be set".to_string(),
                source: None,
                context: ErrorContext::new("config")
                    .with_operation("validate")
                    .with_suggestion("Set llm.model to a model supported by the provider"),
            });
        }

        if let Some(max_tokens) = self.llm.max_tokens {
            if max_tokens == 0 {
                return Err(ScoutError::Config {
                    message: "LLM max_tokens must be greater than 0".to_string(),
                    source: None,
                    context: ErrorContext::new("config")
                        .with_operation("validate")
                        .with_suggestion("Set llm.max_tokens to a positive value"),
                });
            }
        }

        if self.tools.web.max_content_length == 0 {
            return Err(ScoutError::Config {
                message: "tools.web.max_content_length must be greater than 0".to_string(),
                source: None,
                context: ErrorContext::new("config").with_operation("validate"),
            });
        }

        Ok(())
    }
}

/// Environment variable carrying the API key for a provider
fn llm_key_var(provider: &str) -> Option<&'static str> {
    match provider {
        "openai" => Some("OPENAI_API_KEY"),
        "anthropic" => Some("ANTHROPIC_API_KEY"),
        "groq" => Some("GROQ_API_KEY"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(ScoutConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let config: ScoutConfig = toml::from_str(
            r#"
            [llm]
            provider = "anthropic"
            model = "claude-3-5-haiku-latest"
            "#,
        )
        .unwrap();

        assert_eq!(config.llm.provider, "anthropic");
        assert_eq!(config.tools.web.max_content_length, 8000);
        assert!(config.tools.docstore.api_token.is_none());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = ScoutConfig::default();
        config.llm.model = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn config_round_trips_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scout.toml");

        let mut config = ScoutConfig::default();
        config.llm.provider = "groq".to_string();
        config.save_to_file(&path).unwrap();

        let loaded = ScoutConfig::from_file(&path).unwrap();
        assert_eq!(loaded.llm.provider, "groq");
    }
}
