//! `page_extract` tool
//!
//! Extracts readable content from a web page through the Firecrawl scrape
//! API when a key is configured, falling back to a raw fetch with
//! tag-level text extraction when it is not.

use crate::tool::{failure, Tool, ToolArgs};
use crate::truncate_content;
use async_trait::async_trait;
use scout_core::{ScoutResult, WebToolsConfig};
use scraper::{Html, Selector};
use serde_json::{json, Value};
use tracing::warn;
use url::Url;

/// Canonical tool name
pub const PAGE_EXTRACT: &str = "page_extract";

const FIRECRAWL_API_URL: &str = "https://api.firecrawl.dev/v1/scrape";

/// Page content extraction with a raw-fetch fallback
pub struct PageContentTool {
    client: reqwest::Client,
    api_key: Option<String>,
    max_content_length: usize,
}

impl PageContentTool {
    pub fn new(client: reqwest::Client, config: &WebToolsConfig) -> Self {
        Self {
            client,
            api_key: config.firecrawl_api_key.clone(),
            max_content_length: config.max_content_length,
        }
    }

    async fn extract_with_firecrawl(
        &self,
        url: &str,
        max_length: usize,
        api_key: &str,
    ) -> ScoutResult<String> {
        let request = json!({
            "url": url,
            "formats": ["markdown"],
        });

        let response = match self
            .client
            .post(FIRECRAWL_API_URL)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "Firecrawl request failed, using raw fetch");
                return self.extract_fallback(url, max_length).await;
            }
        };

        if !response.status().is_success() {
            warn!(status = %response.status(), "Firecrawl returned an error, using raw fetch");
            return self.extract_fallback(url, max_length).await;
        }

        let body: Value = match response.json().await {
            Ok(b) => b,
            Err(e) => {
                warn!(error = %e, "Failed to parse Firecrawl response, using raw fetch");
                return self.extract_fallback(url, max_length).await;
            }
        };

        let data = &body["data"];
        let content = data["markdown"].as_str().unwrap_or_default();
        if content.is_empty() {
            return self.extract_fallback(url, max_length).await;
        }

        let mut output = format!("Content extracted from: {}\n", url);
        if let Some(title) = data["metadata"]["title"].as_str() {
            if !title.is_empty() {
                output.push_str(&format!("Title: {}\n", title));
            }
        }
        output.push_str("\n---\n\n");
        output.push_str(&truncate_content(content, max_length));

        Ok(output)
    }

    async fn extract_fallback(&self, url: &str, max_length: usize) -> ScoutResult<String> {
        let response = match self.client.get(url).send().await {
            Ok(r) => r,
            Err(e) => return Ok(failure(format!("failed to fetch {}: {}", url, e))),
        };

        if !response.status().is_success() {
            return Ok(failure(format!(
                "fetch of {} returned {}",
                url,
                response.status()
            )));
        }

        let html = match response.text().await {
            Ok(t) => t,
            Err(e) => return Ok(failure(format!("failed to read body of {}: {}", url, e))),
        };

        let (title, text) = html_to_text(&html);
        if text.is_empty() {
            return Ok(failure(format!("no readable content at {}", url)));
        }

        let mut output = format!("Content extracted from: {}\n", url);
        if let Some(title) = title {
            output.push_str(&format!("Title: {}\n", title));
        }
        output.push_str("\n---\n\n");
        output.push_str(&truncate_content(&text, max_length));

        Ok(output)
    }
}

#[async_trait]
impl Tool for PageContentTool {
    fn name(&self) -> &str {
        PAGE_EXTRACT
    }

    fn description(&self) -> &str {
        "Extract clean, readable text content from a web page by URL."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "The URL to extract content from"
                },
                "max_length": {
                    "type": "integer",
                    "description": "Maximum content length in characters",
                    "default": self.max_content_length,
                    "minimum": 500
                }
            },
            "required": ["url"]
        })
    }

    async fn execute(&self, args: ToolArgs) -> ScoutResult<String> {
        let url = match args.require_str("url") {
            Ok(u) => u.to_string(),
            Err(e) => return Ok(failure(e)),
        };
        let max_length = args.get_usize("max_length", self.max_content_length);

        if Url::parse(&url).is_err() {
            return Ok(failure(format!("invalid URL: {}", url)));
        }

        match self.api_key.clone() {
            Some(key) => self.extract_with_firecrawl(&url, max_length, &key).await,
            None => self.extract_fallback(&url, max_length).await,
        }
    }
}

/// Extract the title and readable text from an HTML document
///
/// Pulls text from headings, paragraphs and list items only, which skips
/// scripts, styles and navigation chrome without a full readability pass.
fn html_to_text(html: &str) -> (Option<String>, String) {
    let document = Html::parse_document(html);

    let title_selector = Selector::parse("title").expect("static selector");
    let title = document
        .select(&title_selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty());

    let content_selector =
        Selector::parse("h1, h2, h3, h4, p, li, blockquote, pre").expect("static selector");
    let mut lines: Vec<String> = Vec::new();
    for element in document.select(&content_selector) {
        let text = element
            .text()
            .collect::<String>()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        if !text.is_empty() {
            lines.push(text);
        }
    }

    (title, lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html_to_text_extracts_title_and_paragraphs() {
        let html = "<html><head><title>Test Page</title></head>\
                    <body><h1>Heading</h1><p>First paragraph.</p></body></html>";
        let (title, text) = html_to_text(html);
        assert_eq!(title.as_deref(), Some("Test Page"));
        assert!(text.contains("Heading"));
        assert!(text.contains("First paragraph."));
    }

    #[test]
    fn html_to_text_skips_scripts_and_styles() {
        let html = "<html><body><script>var x = 1;</script>\
                    <style>.a { color: red; }</style><p>Visible</p></body></html>";
        let (_, text) = html_to_text(html);
        assert!(text.contains("Visible"));
        assert!(!text.contains("var x"));
        assert!(!text.contains("color: red"));
    }

    #[test]
    fn html_to_text_handles_empty_document() {
        let (title, text) = html_to_text("");
        assert!(title.is_none());
        assert!(text.is_empty());
    }

    #[test]
    fn truncation_appends_notice() {
        let long = "a".repeat(100);
        let truncated = truncate_content(&long, 10);
        assert!(truncated.starts_with("aaaaaaaaaa"));
        assert!(truncated.contains("content truncated"));

        let short = "short";
        assert_eq!(truncate_content(short, 10), "short");
    }
}
