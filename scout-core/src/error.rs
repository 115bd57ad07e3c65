//! Unified error handling
//!
//! Structured error types with context, recovery suggestions, and proper
//! error chaining

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};

pub type ScoutResult<T> = Result<T, ScoutError>;

/// Error context providing additional information for debugging and recovery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Unique error ID for tracking
    pub error_id: String,
    /// Timestamp when error occurred
    pub timestamp: DateTime<Utc>,
    /// Component where error originated
    pub component: String,
    /// Operation being performed when error occurred
    pub operation: Option<String>,
    /// Recovery suggestions
    pub recovery_suggestions: Vec<String>,
}

impl ErrorContext {
    pub fn new(component: &str) -> Self {
        Self {
            error_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            component: component.to_string(),
            operation: None,
            recovery_suggestions: Vec::new(),
        }
    }

    pub fn with_operation(mut self, operation: &str) -> Self {
        self.operation = Some(operation.to_string());
        self
    }

    pub fn with_suggestion(mut self, suggestion: &str) -> Self {
        self.recovery_suggestions.push(suggestion.to_string());
        self
    }
}

/// Main error type for the Scout system
#[derive(Error, Debug)]
pub enum ScoutError {
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("LLM error: {message}")]
    Llm {
        message: String,
        provider: Option<String>,
        context: ErrorContext,
    },

    #[error("Tool error: {message}")]
    Tool {
        message: String,
        tool: Option<String>,
        context: ErrorContext,
    },

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
        context: ErrorContext,
    },

    #[error("Resource not found: {resource}")]
    NotFound {
        resource: String,
        context: ErrorContext,
    },

    #[error("Operation timeout: {operation}")]
    Timeout {
        operation: String,
        duration_ms: u64,
        context: ErrorContext,
    },

    #[error("Rate limit exceeded: {message}")]
    RateLimit {
        message: String,
        retry_after_ms: Option<u64>,
        context: ErrorContext,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },
}

impl ScoutError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>, component: &str) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
            context: ErrorContext::new(component)
                .with_suggestion("Check your configuration file")
                .with_suggestion("Run 'scout config init' to create a default config"),
        }
    }

    /// Create a network error
    pub fn network(message: impl Into<String>, component: &str) -> Self {
        Self::Network {
            message: message.into(),
            source: None,
            context: ErrorContext::new(component),
        }
    }

    /// Create an LLM error
    pub fn llm(message: impl Into<String>, component: &str) -> Self {
        Self::Llm {
            message: message.into(),
            provider: None,
            context: ErrorContext::new(component),
        }
    }

    /// Create a tool error
    pub fn tool(message: impl Into<String>, tool: &str) -> Self {
        Self::Tool {
            message: message.into(),
            tool: Some(tool.to_string()),
            context: ErrorContext::new("tools"),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>, component: &str) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
            context: ErrorContext::new(component),
        }
    }

    /// Get the error context
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            ScoutError::Config { context, .. } => Some(context),
            ScoutError::Network { context, .. } => Some(context),
            ScoutError::Llm { context, .. } => Some(context),
            ScoutError::Tool { context, .. } => Some(context),
            ScoutError::Validation { context, .. } => Some(context),
            ScoutError::NotFound { context, .. } => Some(context),
            ScoutError::Timeout { context, .. } => Some(context),
            ScoutError::RateLimit { context, .. } => Some(context),
            ScoutError::Internal { context, .. } => Some(context),
            _ => None,
        }
    }

    /// Check if error is recoverable
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ScoutError::Network { .. } | ScoutError::Timeout { .. } | ScoutError::RateLimit { .. }
        )
    }

    /// Get retry delay in milliseconds for recoverable errors
    pub fn retry_delay_ms(&self) -> Option<u64> {
        match self {
            ScoutError::Network { .. } => Some(1000),
            ScoutError::Timeout { .. } => Some(2000),
            ScoutError::RateLimit { retry_after_ms, .. } => *retry_after_ms,
            _ => None,
        }
    }

    /// Log the error with appropriate level
    pub fn log(&self) {
        match self {
            ScoutError::Network { .. } | ScoutError::Timeout { .. } => {
                warn!(
                    error_id = ?self.context().map(|c| &c.error_id),
                    error = %self,
                    "Network or timeout error (may be recoverable)"
                );
            }
            _ => {
                error!(
                    error_id = ?self.context().map(|c| &c.error_id),
                    error = %self,
                    "Error occurred"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_builder_accumulates_fields() {
        let context = ErrorContext::new("tools")
            .with_operation("search")
            .with_suggestion("Check the API key");

        assert_eq!(context.component, "tools");
        assert_eq!(context.operation.as_deref(), Some("search"));
        assert_eq!(context.recovery_suggestions.len(), 1);
        assert!(!context.error_id.is_empty());
    }

    #[test]
    fn recoverability_follows_variant() {
        let network = ScoutError::network("connection refused", "tools");
        assert!(network.is_recoverable());
        assert_eq!(network.retry_delay_ms(), Some(1000));

        let config = ScoutError::config("missing key", "config");
        assert!(!config.is_recoverable());
        assert_eq!(config.retry_delay_ms(), None);
    }
}
