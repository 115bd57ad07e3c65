//! Document store search and content extraction tools
//!
//! Talks to a Drive-style document store over its REST API with an
//! already-obtained bearer token. Interactive authentication flows and
//! binary-format extraction are out of scope; items are exported as plain
//! text.

use crate::tool::{failure, Tool, ToolArgs};
use crate::truncate_content;
use async_trait::async_trait;
use scout_core::{DocStoreConfig, ScoutResult};
use serde_json::{json, Value};

/// Canonical tool names
pub const DOCSTORE_SEARCH: &str = "docstore_search";
pub const DOCSTORE_FETCH: &str = "docstore_fetch";

/// Line prefix carrying an item identifier in formatted search output
///
/// The orchestrator scans result text for this marker to pick items for
/// follow-up content extraction.
pub const ID_LINE_MARKER: &str = "ID:";

const DEFAULT_RESULT_COUNT: usize = 10;
const MAX_RESULT_COUNT: usize = 50;

/// Search the document store by full-text query
pub struct DocStoreSearchTool {
    client: reqwest::Client,
    api_base: String,
    api_token: Option<String>,
}

impl DocStoreSearchTool {
    pub fn new(client: reqwest::Client, config: &DocStoreConfig) -> Self {
        Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
        }
    }
}

#[async_trait]
impl Tool for DocStoreSearchTool {
    fn name(&self) -> &str {
        DOCSTORE_SEARCH
    }

    fn description(&self) -> &str {
        "Search the configured document store by content or name. Returns matching items with their identifiers."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Full-text search query"
                },
                "max_results": {
                    "type": "integer",
                    "description": "Maximum number of results to return",
                    "default": DEFAULT_RESULT_COUNT,
                    "minimum": 1,
                    "maximum": MAX_RESULT_COUNT
                },
                "order_by": {
                    "type": "string",
                    "description": "Sort order for results",
                    "enum": ["modifiedTime", "name", "createdTime"],
                    "default": "modifiedTime"
                }
            },
            "required": ["query"]
        })
    }

    fn usable(&self) -> bool {
        self.api_token.is_some()
    }

    async fn execute(&self, args: ToolArgs) -> ScoutResult<String> {
        let Some(token) = self.api_token.clone() else {
            return Ok(failure("document store token not configured"));
        };
        let query = match args.require_str("query") {
            Ok(q) => q.to_string(),
            Err(e) => return Ok(failure(e)),
        };
        let max_results = args.get_usize("max_results", DEFAULT_RESULT_COUNT);
        let order_by = args.get_str("order_by").unwrap_or("modifiedTime");

        let search_query = format!(
            "fullText contains '{}' and trashed=false",
            query.replace('\'', "\\'")
        );

        let response = match self
            .client
            .get(format!("{}/files", self.api_base))
            .bearer_auth(&token)
            .query(&[
                ("q", search_query),
                ("pageSize", max_results.min(MAX_RESULT_COUNT).to_string()),
                ("orderBy", format!("{} desc", order_by)),
                (
                    "fields",
                    "files(id,name,mimeType,modifiedTime,webViewLink)".to_string(),
                ),
            ])
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => return Ok(failure(format!("document store request failed: {}", e))),
        };

        if !response.status().is_success() {
            return Ok(failure(format!(
                "document store returned {}",
                response.status()
            )));
        }

        let body: Value = match response.json().await {
            Ok(b) => b,
            Err(e) => return Ok(failure(format!("failed to parse store response: {}", e))),
        };

        Ok(format_store_results(&query, &body))
    }
}

/// Extract text content from a document store item
pub struct DocStoreContentTool {
    client: reqwest::Client,
    api_base: String,
    api_token: Option<String>,
    max_content_length: usize,
}

impl DocStoreContentTool {
    pub fn new(client: reqwest::Client, config: &DocStoreConfig) -> Self {
        Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
            max_content_length: config.max_content_length,
        }
    }

    async fn fetch_metadata(&self, item_id: &str, token: &str) -> Result<Value, String> {
        let response = self
            .client
            .get(format!("{}/files/{}", self.api_base, item_id))
            .bearer_auth(token)
            .query(&[("fields", "name,mimeType,modifiedTime")])
            .send()
            .await
            .map_err(|e| format!("metadata request failed: {}", e))?;

        if !response.status().is_success() {
            return Err(format!("metadata request returned {}", response.status()));
        }

        response
            .json()
            .await
            .map_err(|e| format!("failed to parse metadata: {}", e))
    }

    async fn fetch_content(
        &self,
        item_id: &str,
        mime_type: &str,
        token: &str,
    ) -> Result<String, String> {
        // Native store documents need an export; uploaded files download
        // directly as media.
        let request = if mime_type.contains("google-apps") {
            self.client
                .get(format!("{}/files/{}/export", self.api_base, item_id))
                .query(&[("mimeType", "text/plain")])
        } else {
            self.client
                .get(format!("{}/files/{}", self.api_base, item_id))
                .query(&[("alt", "media")])
        };

        let response = request
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| format!("content request failed: {}", e))?;

        if !response.status().is_success() {
            return Err(format!("content request returned {}", response.status()));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| format!("failed to read content: {}", e))?;

        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

#[async_trait]
impl Tool for DocStoreContentTool {
    fn name(&self) -> &str {
        DOCSTORE_FETCH
    }

    fn description(&self) -> &str {
        "Read the text content of a document store item by its identifier."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "item_id": {
                    "type": "string",
                    "description": "Identifier of the item to read"
                },
                "max_length": {
                    "type": "integer",
                    "description": "Maximum content length in characters",
                    "default": self.max_content_length,
                    "minimum": 500
                }
            },
            "required": ["item_id"]
        })
    }

    fn usable(&self) -> bool {
        self.api_token.is_some()
    }

    async fn execute(&self, args: ToolArgs) -> ScoutResult<String> {
        let Some(token) = self.api_token.clone() else {
            return Ok(failure("document store token not configured"));
        };
        let item_id = match args.require_str("item_id") {
            Ok(id) => id.to_string(),
            Err(e) => return Ok(failure(e)),
        };
        let max_length = args.get_usize("max_length", self.max_content_length);

        let metadata = match self.fetch_metadata(&item_id, &token).await {
            Ok(m) => m,
            Err(e) => return Ok(failure(e)),
        };

        let name = metadata["name"].as_str().unwrap_or("Unknown");
        let mime_type = metadata["mimeType"].as_str().unwrap_or("");

        let content = match self.fetch_content(&item_id, mime_type, &token).await {
            Ok(c) => c,
            Err(e) => return Ok(failure(e)),
        };

        if content.trim().is_empty() {
            return Ok(failure(format!("no text content in item: {}", name)));
        }

        let mut output = format!("Document: {}\n", name);
        if let Some(modified) = metadata["modifiedTime"].as_str() {
            output.push_str(&format!("Modified: {}\n", modified));
        }
        output.push_str("\n---\n\n");
        output.push_str(&truncate_content(&content, max_length));

        Ok(output)
    }
}

/// Format store search results with `ID:` marker lines
fn format_store_results(query: &str, body: &Value) -> String {
    let files = body["files"].as_array().cloned().unwrap_or_default();
    if files.is_empty() {
        return format!("No items found in the document store matching: {}", query);
    }

    let mut output = format!("Document store results for: {}\n\n", query);
    for (i, file) in files.iter().enumerate() {
        let name = file["name"].as_str().unwrap_or("Untitled");
        output.push_str(&format!("{}. {}\n", i + 1, name));
        if let Some(modified) = file["modifiedTime"].as_str() {
            output.push_str(&format!("   Modified: {}\n", modified));
        }
        if let Some(link) = file["webViewLink"].as_str() {
            output.push_str(&format!("   Link: {}\n", link));
        }
        if let Some(id) = file["id"].as_str() {
            output.push_str(&format!("   {} {}\n", ID_LINE_MARKER, id));
        }
        output.push('\n');
    }

    output
}

/// Pull item identifiers out of formatted search output
///
/// Scans for [`ID_LINE_MARKER`] lines.
pub fn extract_item_ids(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| {
            let trimmed = line.trim_start();
            let rest = trimmed.strip_prefix(ID_LINE_MARKER)?;
            let id = rest.trim();
            if id.is_empty() {
                None
            } else {
                Some(id.to_string())
            }
        })
        .collect()
}
