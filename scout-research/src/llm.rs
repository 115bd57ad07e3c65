//! LLM client integration using siumai
//!
//! Builds a provider-appropriate chat client from configuration. The rest
//! of the crate depends only on `ChatCapability`, so tests can substitute
//! scripted clients.

use crate::{ResearchError, ResearchResult};
use scout_core::LlmConfig;
use siumai::prelude::*;
use std::sync::Arc;
use tracing::{info, warn};

/// Build a chat client for the configured provider
pub async fn build_chat_client(config: &LlmConfig) -> ResearchResult<Arc<dyn ChatCapability>> {
    match config.provider.as_str() {
        "openai" => {
            let api_key = config
                .api_key
                .clone()
                .or_else(|| std::env::var("OPENAI_API_KEY").ok())
                .ok_or_else(|| ResearchError::config("OpenAI API key not found"))?;

            let mut builder = LlmBuilder::new()
                .openai()
                .api_key(&api_key)
                .model(&config.model)
                .temperature(config.temperature);

            if let Some(max_tokens) = config.max_tokens {
                builder = builder.max_tokens(max_tokens);
            }

            if let Some(base_url) = &config.base_url {
                builder = builder.base_url(base_url);
            }

            let client = builder.build().await.map_err(|e| {
                ResearchError::llm(format!("Failed to build OpenAI client: {}", e))
            })?;

            Ok(Arc::new(client))
        }
        "anthropic" => {
            let api_key = config
                .api_key
                .clone()
                .or_else(|| std::env::var("ANTHROPIC_API_KEY").ok())
                .ok_or_else(|| ResearchError::config("Anthropic API key not found"))?;

            let mut builder = LlmBuilder::new()
                .anthropic()
                .api_key(&api_key)
                .model(&config.model)
                .temperature(config.temperature);

            if let Some(max_tokens) = config.max_tokens {
                builder = builder.max_tokens(max_tokens);
            }

            let client = builder.build().await.map_err(|e| {
                ResearchError::llm(format!("Failed to build Anthropic client: {}", e))
            })?;

            Ok(Arc::new(client))
        }
        "ollama" => {
            let base_url = config
                .base_url
                .clone()
                .unwrap_or_else(|| "http://localhost:11434".to_string());

            let mut builder = LlmBuilder::new()
                .ollama()
                .model(&config.model)
                .base_url(&base_url)
                .temperature(config.temperature);

            if let Some(max_tokens) = config.max_tokens {
                builder = builder.max_tokens(max_tokens);
            }

            let client = builder.build().await.map_err(|e| {
                ResearchError::llm(format!("Failed to build Ollama client: {}", e))
            })?;

            Ok(Arc::new(client))
        }
        "groq" => {
            let api_key = config
                .api_key
                .clone()
                .or_else(|| std::env::var("GROQ_API_KEY").ok())
                .ok_or_else(|| ResearchError::config("Groq API key not found"))?;

            let mut builder = LlmBuilder::new()
                .groq()
                .api_key(&api_key)
                .model(&config.model)
                .temperature(config.temperature);

            if let Some(max_tokens) = config.max_tokens {
                builder = builder.max_tokens(max_tokens);
            }

            let client = builder.build().await.map_err(|e| {
                ResearchError::llm(format!("Failed to build Groq client: {}", e))
            })?;

            Ok(Arc::new(client))
        }
        provider => Err(ResearchError::config(format!(
            "Unsupported LLM provider: {}",
            provider
        ))),
    }
}

/// Build a client by probing for provider credentials in the environment
pub async fn create_auto_client() -> ResearchResult<Arc<dyn ChatCapability>> {
    let candidates = [
        ("openai", "OPENAI_API_KEY", "gpt-4o-mini"),
        ("anthropic", "ANTHROPIC_API_KEY", "claude-3-5-haiku-latest"),
        ("groq", "GROQ_API_KEY", "llama-3.1-8b-instant"),
    ];

    for (provider, env_var, model) in candidates {
        if std::env::var(env_var).is_ok() {
            info!(provider, "Auto-detected LLM provider");
            let config = LlmConfig {
                provider: provider.to_string(),
                model: model.to_string(),
                ..Default::default()
            };
            match build_chat_client(&config).await {
                Ok(client) => return Ok(client),
                Err(e) => {
                    warn!(provider, error = %e, "Failed to create client, trying next provider");
                    continue;
                }
            }
        }
    }

    // Ollama needs no API key
    info!("No provider key found, trying local Ollama");
    let config = LlmConfig {
        provider: "ollama".to_string(),
        model: "llama3.2".to_string(),
        ..Default::default()
    };
    build_chat_client(&config).await
}

/// One system + user exchange, returning the reply text
pub(crate) async fn chat_text(
    llm: &Arc<dyn ChatCapability>,
    system_prompt: &str,
    user_message: &str,
) -> ResearchResult<String> {
    let messages = vec![system!(system_prompt), user!(user_message)];

    let response = llm
        .chat_with_tools(messages, None)
        .await
        .map_err(|e| ResearchError::llm(format!("LLM request failed: {}", e)))?;

    response
        .content_text()
        .map(|text| text.to_string())
        .ok_or_else(|| ResearchError::llm("No text content in LLM response"))
}
