//! Scout Tools - external search and retrieval capabilities
//!
//! Every tool conforms to one contract: a stable name, a human-readable
//! description, a declared input schema, and an asynchronous `execute`
//! returning text. Ordinary failures (network errors, missing credentials,
//! malformed remote responses) are converted into a marked error string
//! returned as a normal result; only unexpected errors surface as `Err`.

pub mod docstore;
pub mod tool;
pub mod web;

pub use docstore::{DocStoreContentTool, DocStoreSearchTool, extract_item_ids, ID_LINE_MARKER};
pub use tool::{failure, is_failure, Tool, ToolArgs, FAILURE_MARKER};
pub use web::{extract_result_urls, PageContentTool, WebSearchTool, URL_LINE_MARKER};

use scout_core::{ScoutError, ScoutResult};
use std::time::Duration;

/// Build the HTTP client shared by all tools
///
/// The 30 second timeout is the only request deadline in the system; the
/// research loop itself imposes none beyond its iteration bound.
pub fn default_http_client() -> ScoutResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .user_agent("scout-research/0.1")
        .build()
        .map_err(|e| ScoutError::internal(format!("Failed to build HTTP client: {}", e), "tools"))
}

/// Truncate text to at most `max_len` characters, appending a notice
pub(crate) fn truncate_content(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_len).collect();
    format!("{}\n\n... (content truncated)", cut)
}
