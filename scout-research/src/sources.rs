//! Binding source kinds to their tool implementations
//!
//! Each enabled source is bound at session setup to a search tool and an
//! optional content-extraction tool. Tools whose capability probe fails
//! are dropped here, once, with a warning, so the loop never has to test
//! tool usability mid-iteration.

use crate::types::SourceKind;
use crate::ResearchResult;
use scout_core::ToolsConfig;
use scout_tools::{
    default_http_client, DocStoreContentTool, DocStoreSearchTool, PageContentTool, Tool,
    WebSearchTool,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// The tool pair serving one source kind
pub struct SourceBinding {
    /// Search tool invoked for each recommended query
    pub search: Arc<dyn Tool>,
    /// Content tool invoked for locators found in search results
    pub extract: Option<Arc<dyn Tool>>,
}

/// Registry of enabled sources and their tools for one session setup
#[derive(Default)]
pub struct SourceRegistry {
    bindings: BTreeMap<SourceKind, SourceBinding>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a source kind, replacing any existing binding
    pub fn register(
        &mut self,
        kind: SourceKind,
        search: Arc<dyn Tool>,
        extract: Option<Arc<dyn Tool>>,
    ) {
        self.bindings.insert(kind, SourceBinding { search, extract });
    }

    /// Build the registry for the enabled sources from tool configuration
    ///
    /// Probes each search tool once; sources whose tool is unusable with
    /// the current configuration are dropped with a warning.
    pub fn from_config(config: &ToolsConfig, enabled: &[SourceKind]) -> ResearchResult<Self> {
        let client = default_http_client()?;
        let mut registry = Self::new();

        for kind in enabled {
            match kind {
                SourceKind::Web => {
                    let search = WebSearchTool::new(client.clone(), &config.web);
                    let extract = PageContentTool::new(client.clone(), &config.web);
                    registry.probe_and_register(
                        SourceKind::Web,
                        Arc::new(search),
                        Some(Arc::new(extract)),
                    );
                }
                SourceKind::DocStore => {
                    let search = DocStoreSearchTool::new(client.clone(), &config.docstore);
                    let extract = DocStoreContentTool::new(client.clone(), &config.docstore);
                    registry.probe_and_register(
                        SourceKind::DocStore,
                        Arc::new(search),
                        Some(Arc::new(extract)),
                    );
                }
            }
        }

        Ok(registry)
    }

    fn probe_and_register(
        &mut self,
        kind: SourceKind,
        search: Arc<dyn Tool>,
        extract: Option<Arc<dyn Tool>>,
    ) {
        if !search.usable() {
            warn!(source = %kind, tool = search.name(), "Source dropped: tool not usable with current configuration");
            return;
        }

        // An unusable extraction tool only disables enrichment
        let extract = match extract {
            Some(tool) if tool.usable() => Some(tool),
            Some(tool) => {
                warn!(source = %kind, tool = tool.name(), "Content extraction disabled: tool not usable");
                None
            }
            None => None,
        };

        debug!(source = %kind, "Source registered");
        self.register(kind, search, extract);
    }

    /// Binding for a source, if it is enabled and usable
    pub fn get(&self, kind: SourceKind) -> Option<&SourceBinding> {
        self.bindings.get(&kind)
    }

    /// The enabled, usable source kinds in deterministic order
    pub fn kinds(&self) -> Vec<SourceKind> {
        self.bindings.keys().copied().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
