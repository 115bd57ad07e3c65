//! The research orchestrator
//!
//! Drives the think / act / observe / reflect cycle: INITIALIZING →
//! ITERATING → SYNTHESIZING → DONE. Failures inside a single tool
//! invocation are caught and logged; they never transition the whole
//! session to an error state. The two single-shot calls (objective
//! extraction and synthesis) are the only session-level failure points.

use crate::llm::chat_text;
use crate::reasoning::ReasoningEngine;
use crate::sources::SourceRegistry;
use crate::synthesizer::Synthesizer;
use crate::types::{Finding, ResearchOptions, ResearchReport, ResearchState, SourceKind, ThoughtProcess};
use crate::ResearchResult;
use scout_tools::{extract_item_ids, extract_result_urls, ToolArgs};
use siumai::prelude::ChatCapability;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Relevance assigned to search-result findings
///
/// A fixed default: no scoring signal exists yet, refinement is left to
/// the model's own reasoning over the content.
const DEFAULT_RELEVANCE: f64 = 0.8;
/// Relevance assigned to extracted-content findings
const ENRICHED_RELEVANCE: f64 = 0.9;

const OBJECTIVE_PROMPT: &str =
    "Extract the main research objective from the query in one clear sentence.";

/// A research agent: reasoning engine + tool registry + synthesizer
///
/// Holds no per-session state, so one agent value can serve any number of
/// concurrent sessions; each call to [`conduct_research`] owns its state
/// exclusively.
///
/// [`conduct_research`]: ResearchAgent::conduct_research
pub struct ResearchAgent {
    engine: ReasoningEngine,
    synthesizer: Synthesizer,
    llm: Arc<dyn ChatCapability>,
    registry: SourceRegistry,
    options: ResearchOptions,
}

impl ResearchAgent {
    pub fn new(
        llm: Arc<dyn ChatCapability>,
        registry: SourceRegistry,
        options: ResearchOptions,
    ) -> Self {
        Self {
            engine: ReasoningEngine::new(llm.clone()),
            synthesizer: Synthesizer::new(llm.clone()),
            llm,
            registry,
            options,
        }
    }

    /// Conduct one research session for a natural-language query
    pub async fn conduct_research(&self, query: &str) -> ResearchResult<ResearchReport> {
        info!(query, "Starting research session");

        let objective = self.extract_objective(query).await?;
        debug!(objective, "Derived research objective");

        let mut state = ResearchState::new(query, objective, &self.options);
        let available = self.registry.kinds();

        while state.should_continue() {
            let iteration = state.iteration + 1;
            info!(
                iteration,
                max_iterations = state.max_iterations,
                confidence = state.confidence,
                "Research iteration"
            );

            // THINK
            let thought = self.engine.think(&state, &available).await?;
            debug!(
                analysis = %thought.analysis,
                assessment = thought.confidence_assessment,
                "Thought produced"
            );

            // ACT
            let (new_findings, issued_queries) = self.act(&thought).await;

            // OBSERVE
            for (source, query) in issued_queries {
                state.record_query(source, &query);
            }
            state.findings.extend(new_findings.iter().cloned());
            info!(new_findings = new_findings.len(), "Observation complete");

            // REFLECT
            let reflection = self.engine.reflect(&state, &new_findings).await?;
            debug!(
                quality = %reflection.quality_assessment,
                confidence_update = reflection.confidence_update,
                should_continue = reflection.should_continue,
                "Reflection produced"
            );

            // UPDATE STATE
            state.apply_reflection(&reflection);

            // EARLY EXIT
            if !reflection.should_continue {
                info!(iteration = state.iteration, "Research complete per reflection");
                break;
            }
        }

        info!(
            iterations = state.iteration,
            findings = state.findings.len(),
            confidence = state.confidence,
            "Synthesizing final report"
        );
        self.synthesizer.synthesize(&state).await
    }

    /// Derive the session objective with one auxiliary model call
    async fn extract_objective(&self, query: &str) -> ResearchResult<String> {
        let objective = chat_text(&self.llm, OBJECTIVE_PROMPT, query).await?;
        Ok(objective.trim().to_string())
    }

    /// Execute the thought's recommended queries against the tool set
    ///
    /// Returns the findings gathered and the queries actually dispatched,
    /// in dispatch order. Recommendations for sources absent from the
    /// registry (disabled, or dropped by the capability probe) are
    /// ignored. An `Err` from any single tool call is logged and that one
    /// query or locator is skipped; it never aborts the iteration.
    async fn act(&self, thought: &ThoughtProcess) -> (Vec<Finding>, Vec<(SourceKind, String)>) {
        let mut findings = Vec::new();
        let mut issued = Vec::new();

        for (source, queries) in &thought.recommended_queries {
            let Some(binding) = self.registry.get(*source) else {
                debug!(source = %source, "Ignoring recommendation for disabled source");
                continue;
            };

            for query in queries {
                debug!(source = %source, query, "Dispatching query");
                issued.push((*source, query.clone()));

                let result = match binding
                    .search
                    .execute(ToolArgs::new().with("query", query.as_str()))
                    .await
                {
                    Ok(result) => result,
                    Err(e) => {
                        warn!(source = %source, query, error = %e, "Tool call failed, skipping query");
                        continue;
                    }
                };

                findings.push(Finding::new(
                    result.clone(),
                    *source,
                    None,
                    Some(format!("{} search: {}", source, query)),
                    DEFAULT_RELEVANCE,
                ));

                if let Some(extract) = &binding.extract {
                    findings
                        .extend(self.enrich(*source, extract.as_ref(), &result).await);
                }
            }
        }

        (findings, issued)
    }

    /// Follow up a search result with content extraction
    ///
    /// Scans the result text for the source's locator marker and extracts
    /// the first few locators found.
    async fn enrich(
        &self,
        source: SourceKind,
        extract: &dyn scout_tools::Tool,
        search_result: &str,
    ) -> Vec<Finding> {
        let mut findings = Vec::new();

        let locators = match source {
            SourceKind::Web => extract_result_urls(search_result),
            SourceKind::DocStore => extract_item_ids(search_result),
        };

        for locator in locators.into_iter().take(self.options.max_enrichments) {
            debug!(source = %source, locator, "Extracting content");

            let args = match source {
                SourceKind::Web => ToolArgs::new().with("url", locator.as_str()),
                SourceKind::DocStore => ToolArgs::new().with("item_id", locator.as_str()),
            };

            let content = match extract.execute(args).await {
                Ok(content) => content,
                Err(e) => {
                    warn!(source = %source, locator, error = %e, "Content extraction failed, skipping");
                    continue;
                }
            };

            let (locator_value, title) = match source {
                SourceKind::Web => (locator.clone(), format!("Web content from {}", locator)),
                SourceKind::DocStore => (
                    format!("docstore://{}", locator),
                    format!("Document store item: {}", locator),
                ),
            };

            findings.push(Finding::new(
                content,
                source,
                Some(locator_value),
                Some(title),
                ENRICHED_RELEVANCE,
            ));
        }

        findings
    }
}
