//! The tool contract shared by all external capabilities

use async_trait::async_trait;
use scout_core::ScoutResult;
use serde_json::{Map, Value};

/// Marker prefixing every ordinary-failure result text
///
/// Callers receive failures as normal text so the research loop never has
/// to handle a secondary error channel for expected failure modes.
pub const FAILURE_MARKER: &str = "[tool-error]";

/// Wrap an ordinary failure description as a marked result string
pub fn failure(message: impl std::fmt::Display) -> String {
    format!("{} {}", FAILURE_MARKER, message)
}

/// Check whether a tool result text reports an ordinary failure
pub fn is_failure(result: &str) -> bool {
    result.starts_with(FAILURE_MARKER)
}

/// A named, schema-described external capability
///
/// `execute` returns `Ok` text for both successes and ordinary failures
/// (the latter marked with [`FAILURE_MARKER`]); `Err` is reserved for
/// unexpected errors and is caught per call by the orchestrator.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Stable tool name
    fn name(&self) -> &str;

    /// Human-readable description of what the tool does
    fn description(&self) -> &str;

    /// Declared input schema (field names, types, defaults, bounds)
    fn input_schema(&self) -> Value;

    /// Capability probe: whether the tool can be used with its current
    /// configuration. Queried once at session setup.
    fn usable(&self) -> bool {
        true
    }

    /// Execute the tool with the provided named arguments
    async fn execute(&self, args: ToolArgs) -> ScoutResult<String>;
}

/// Named arguments for a tool invocation
#[derive(Debug, Clone, Default)]
pub struct ToolArgs(Map<String, Value>);

impl ToolArgs {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Set an argument, consuming and returning self for chaining
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    /// Get a required string argument
    pub fn require_str(&self, key: &str) -> Result<&str, String> {
        self.0
            .get(key)
            .and_then(|v| v.as_str())
            .ok_or_else(|| format!("missing required string argument '{}'", key))
    }

    /// Get an optional string argument
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.as_str())
    }

    /// Get an optional integer argument with a default
    pub fn get_usize(&self, key: &str, default: usize) -> usize {
        self.0
            .get(key)
            .and_then(|v| v.as_u64())
            .map(|v| v as usize)
            .unwrap_or(default)
    }
}
