//! `web_search` tool
//!
//! Searches the web through the Brave Search API when a key is configured,
//! falling back to the DuckDuckGo Instant Answer API (which needs no key)
//! when it is not, or when the Brave request fails.

use crate::tool::{failure, Tool, ToolArgs};
use async_trait::async_trait;
use scout_core::{ScoutResult, WebToolsConfig};
use serde_json::{json, Value};
use tracing::{debug, warn};

/// Canonical tool name
pub const WEB_SEARCH: &str = "web_search";

/// Line prefix carrying a result URL in formatted search output
///
/// The orchestrator scans result text for this marker to pick URLs for
/// follow-up content extraction.
pub const URL_LINE_MARKER: &str = "URL:";

const BRAVE_API_URL: &str = "https://api.search.brave.com/res/v1/web/search";
const DDG_API_URL: &str = "https://api.duckduckgo.com/";

const DEFAULT_RESULT_COUNT: usize = 5;
const MAX_RESULT_COUNT: usize = 20;

/// Web search over Brave Search with a DuckDuckGo fallback
pub struct WebSearchTool {
    client: reqwest::Client,
    api_key: Option<String>,
}

impl WebSearchTool {
    pub fn new(client: reqwest::Client, config: &WebToolsConfig) -> Self {
        Self {
            client,
            api_key: config.brave_api_key.clone(),
        }
    }

    async fn brave_search(&self, query: &str, count: usize, api_key: &str) -> ScoutResult<String> {
        let response = match self
            .client
            .get(BRAVE_API_URL)
            .header("Accept", "application/json")
            .header("X-Subscription-Token", api_key)
            .query(&[
                ("q", query.to_string()),
                ("count", count.min(MAX_RESULT_COUNT).to_string()),
                ("search_lang", "en".to_string()),
            ])
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "Brave search request failed, using fallback");
                return self.fallback_search(query).await;
            }
        };

        if !response.status().is_success() {
            warn!(status = %response.status(), "Brave search returned an error, using fallback");
            return self.fallback_search(query).await;
        }

        let body: Value = match response.json().await {
            Ok(b) => b,
            Err(e) => {
                warn!(error = %e, "Failed to parse Brave search response, using fallback");
                return self.fallback_search(query).await;
            }
        };

        match format_brave_results(query, &body, count) {
            Some(formatted) => Ok(formatted),
            None => self.fallback_search(query).await,
        }
    }

    async fn fallback_search(&self, query: &str) -> ScoutResult<String> {
        debug!(query, "Running DuckDuckGo instant answer search");

        let response = match self
            .client
            .get(DDG_API_URL)
            .query(&[
                ("q", query),
                ("format", "json"),
                ("no_html", "1"),
                ("skip_disambig", "1"),
            ])
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => return Ok(failure(format!("search request failed: {}", e))),
        };

        if !response.status().is_success() {
            return Ok(failure(format!(
                "search API returned error: {}",
                response.status()
            )));
        }

        let body: Value = match response.json().await {
            Ok(b) => b,
            Err(e) => return Ok(failure(format!("failed to parse search results: {}", e))),
        };

        Ok(format_instant_answer(query, &body))
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        WEB_SEARCH
    }

    fn description(&self) -> &str {
        "Search the web for current information. Returns recent search results with snippets and URLs."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query to find information about"
                },
                "count": {
                    "type": "integer",
                    "description": "Number of search results to return",
                    "default": DEFAULT_RESULT_COUNT,
                    "minimum": 1,
                    "maximum": MAX_RESULT_COUNT
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, args: ToolArgs) -> ScoutResult<String> {
        let query = match args.require_str("query") {
            Ok(q) => q.to_string(),
            Err(e) => return Ok(failure(e)),
        };
        let count = args.get_usize("count", DEFAULT_RESULT_COUNT);

        match self.api_key.clone() {
            Some(key) => self.brave_search(&query, count, &key).await,
            None => self.fallback_search(&query).await,
        }
    }
}

/// Format Brave web results into readable text with `URL:` marker lines
///
/// Returns `None` when the response carries no results, so the caller can
/// fall back to the instant-answer path.
fn format_brave_results(query: &str, body: &Value, count: usize) -> Option<String> {
    let results = body["web"]["results"].as_array()?;
    if results.is_empty() {
        return None;
    }

    let mut output = format!("Web search results for: {}\n\n", query);
    for (i, result) in results.iter().take(count).enumerate() {
        let title = result["title"].as_str().unwrap_or("Untitled");
        output.push_str(&format!("{}. {}\n", i + 1, title));
        if let Some(description) = result["description"].as_str() {
            if !description.is_empty() {
                output.push_str(&format!("   {}\n", description));
            }
        }
        if let Some(url) = result["url"].as_str() {
            output.push_str(&format!("   {} {}\n", URL_LINE_MARKER, url));
        }
        output.push('\n');
    }

    Some(output)
}

/// Format a DuckDuckGo instant answer into readable text
fn format_instant_answer(query: &str, body: &Value) -> String {
    let mut sections: Vec<String> = Vec::new();

    if let Some(answer) = body["Answer"].as_str() {
        if !answer.is_empty() {
            let mut section = format!("Instant answer: {}", answer);
            if let Some(url) = body["AnswerURL"].as_str() {
                if !url.is_empty() {
                    section.push_str(&format!("\n{} {}", URL_LINE_MARKER, url));
                }
            }
            sections.push(section);
        }
    }

    if let Some(abstract_text) = body["AbstractText"].as_str() {
        if !abstract_text.is_empty() {
            let heading = body["Heading"].as_str().unwrap_or("Abstract");
            let mut section = format!("{}: {}", heading, abstract_text);
            if let Some(url) = body["AbstractURL"].as_str() {
                if !url.is_empty() {
                    section.push_str(&format!("\n{} {}", URL_LINE_MARKER, url));
                }
            }
            sections.push(section);
        }
    }

    if let Some(topics) = body["RelatedTopics"].as_array() {
        let lines: Vec<String> = topics
            .iter()
            .filter_map(|topic| {
                let text = topic["Text"].as_str().filter(|t| !t.is_empty())?;
                match topic["FirstURL"].as_str().filter(|u| !u.is_empty()) {
                    Some(url) => Some(format!("- {}\n  {} {}", text, URL_LINE_MARKER, url)),
                    None => Some(format!("- {}", text)),
                }
            })
            .take(3)
            .collect();
        if !lines.is_empty() {
            sections.push(format!("Related topics:\n{}", lines.join("\n")));
        }
    }

    if sections.is_empty() {
        return format!(
            "Search completed for '{}'. Limited results available from the fallback provider.",
            query
        );
    }

    format!(
        "Search results for: {}\n\n{}",
        query,
        sections.join("\n\n")
    )
}

/// Pull result URLs out of formatted search output
///
/// Scans for [`URL_LINE_MARKER`] lines; only http(s) URLs are kept.
pub fn extract_result_urls(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| {
            let (_, rest) = line.split_once(URL_LINE_MARKER)?;
            let url = rest.trim();
            if url.starts_with("http") {
                Some(url.to_string())
            } else {
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brave_results_carry_url_markers() {
        let body = json!({
            "web": {
                "results": [
                    {
                        "title": "Rust Programming Language",
                        "url": "https://www.rust-lang.org/",
                        "description": "A language empowering everyone."
                    }
                ]
            }
        });

        let output = format_brave_results("rust", &body, 5).unwrap();
        assert!(output.contains("Rust Programming Language"));
        assert_eq!(
            extract_result_urls(&output),
            vec!["https://www.rust-lang.org/".to_string()]
        );
    }

    #[test]
    fn empty_brave_results_signal_fallback() {
        let body = json!({"web": {"results": []}});
        assert!(format_brave_results("rust", &body, 5).is_none());
    }

    #[test]
    fn instant_answer_formats_abstract_and_topics() {
        let body = json!({
            "AbstractText": "Paris is the capital of France.",
            "AbstractURL": "https://en.wikipedia.org/wiki/Paris",
            "Heading": "Paris",
            "Answer": "",
            "RelatedTopics": [
                {"Text": "Geography of Paris", "FirstURL": "https://example.com/geo"}
            ]
        });

        let output = format_instant_answer("capital of France", &body);
        assert!(output.contains("Paris is the capital of France."));
        assert!(output.contains("Related topics:"));

        let urls = extract_result_urls(&output);
        assert_eq!(urls.len(), 2);
        assert_eq!(urls[0], "https://en.wikipedia.org/wiki/Paris");
    }

    #[test]
    fn empty_instant_answer_reports_limited_results() {
        let body = json!({
            "AbstractText": "",
            "Answer": "",
            "RelatedTopics": []
        });
        let output = format_instant_answer("obscure query", &body);
        assert!(output.contains("Limited results"));
        assert!(extract_result_urls(&output).is_empty());
    }

    #[test]
    fn url_extraction_ignores_non_http_lines() {
        let text = "1. Result\n   URL: ftp://example.com\n   URL: https://example.com/page\n";
        assert_eq!(
            extract_result_urls(text),
            vec!["https://example.com/page".to_string()]
        );
    }
}
