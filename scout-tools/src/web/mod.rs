//! Web search and page content extraction tools

pub mod extract;
pub mod search;

pub use extract::PageContentTool;
pub use search::{extract_result_urls, WebSearchTool, URL_LINE_MARKER};
