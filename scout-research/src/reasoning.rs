//! The think / reflect reasoning engine
//!
//! Wraps the remote model in two structured calls per iteration: a
//! "thought" deciding which sources to query next, and a "reflection"
//! assessing the new findings and driving the continue/stop decision.
//! The model is not guaranteed to emit well-formed structured output, so
//! both calls carry a documented default the loop falls back to; the
//! loop's liveness never depends on a parseable reply.

use crate::json;
use crate::llm::chat_text;
use crate::types::{Finding, Reflection, ResearchState, SourceKind, ThoughtProcess};
use crate::ResearchResult;
use siumai::prelude::ChatCapability;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::warn;

/// Recent findings included in the think context
const RECENT_FINDINGS_WINDOW: usize = 5;
/// Per-finding preview length in the think context
const THINK_PREVIEW_CHARS: usize = 200;
/// Per-finding preview length in the reflect context
const REFLECT_PREVIEW_CHARS: usize = 300;
/// Confidence nudge applied by the fallback reflection
const FALLBACK_CONFIDENCE_STEP: f64 = 0.1;

const REASONING_PROMPT: &str = r#"You are a research orchestrator. Your role is to:

1. Analyze the current research state and identify what information is still needed
2. Reason about which data sources would be most valuable to consult next
3. Plan specific queries for each data source
4. Assess confidence in current findings

For each reasoning step, consider:
- What do we know so far?
- What are the gaps in our knowledge?
- Which sources haven't been consulted yet?
- Would cross-referencing sources provide validation?

Available sources:
- web: best for current events, public information, broad coverage
- docstore: best for internal documents, reports, structured data

Output your reasoning in JSON format:
{
    "analysis": "current understanding of the research state",
    "identified_gaps": ["gap1", "gap2"],
    "recommended_sources": {"source_name": "reason for using this source"},
    "recommended_queries": {"source_name": ["query1", "query2"]},
    "confidence_assessment": 0.0 to 1.0
}"#;

const REFLECTION_PROMPT: &str = r#"You are evaluating research results. Your role is to:

1. Assess the quality and relevance of new information
2. Integrate new findings with existing knowledge
3. Identify contradictions or confirmations
4. Determine if the research objective is met
5. Recommend next steps if needed

For each reflection, consider:
- Does this information answer our questions?
- How reliable are these sources?
- Are there contradictions with previous findings?
- Should we pivot our research approach?

Output your reflection in JSON format:
{
    "quality_assessment": "high/medium/low with reasons",
    "new_insights": ["insight1", "insight2"],
    "remaining_questions": ["question1", "question2"],
    "suggested_pivots": ["pivot1", "pivot2"],
    "confidence_update": 0.0 to 1.0,
    "should_continue": true or false
}"#;

/// Structured think/reflect calls against the remote model
pub struct ReasoningEngine {
    llm: Arc<dyn ChatCapability>,
}

impl ReasoningEngine {
    pub fn new(llm: Arc<dyn ChatCapability>) -> Self {
        Self { llm }
    }

    /// Reason about the next research steps
    ///
    /// Transport failures propagate; a malformed reply falls back to the
    /// default thought (one generic web query for the original query).
    pub async fn think(
        &self,
        state: &ResearchState,
        available_sources: &[SourceKind],
    ) -> ResearchResult<ThoughtProcess> {
        let context = build_think_context(state, available_sources);
        let reply = chat_text(&self.llm, REASONING_PROMPT, &context).await?;

        Ok(parse_thought(&reply, state).unwrap_or_else(|| {
            warn!("Could not parse reasoning reply, using default thought");
            fallback_thought(state)
        }))
    }

    /// Reflect on the findings gathered in the just-completed iteration
    ///
    /// Transport failures propagate; a malformed reply falls back to the
    /// default reflection (small confidence nudge, continue while under
    /// the iteration bound).
    pub async fn reflect(
        &self,
        state: &ResearchState,
        new_findings: &[Finding],
    ) -> ResearchResult<Reflection> {
        let context = build_reflect_context(state, new_findings);
        let reply = chat_text(&self.llm, REFLECTION_PROMPT, &context).await?;

        Ok(parse_reflection(&reply, state).unwrap_or_else(|| {
            warn!("Could not parse reflection reply, using default reflection");
            fallback_reflection(state)
        }))
    }
}

/// Context block summarizing the session for the think call
///
/// Bounded: only the last few findings appear, each truncated, so prompt
/// size does not grow with the session.
fn build_think_context(state: &ResearchState, available_sources: &[SourceKind]) -> String {
    let consulted: BTreeMap<&str, &Vec<String>> = state
        .sources_consulted
        .iter()
        .map(|(kind, queries)| (kind.as_str(), queries))
        .collect();
    let available: Vec<&str> = available_sources.iter().map(|s| s.as_str()).collect();

    let mut context = format!(
        "Current research state:\n\
         - Query: {}\n\
         - Objective: {}\n\
         - Findings so far: {} items\n\
         - Sources consulted: {}\n\
         - Current confidence: {:.2}\n\
         - Identified gaps: {}\n\
         - Iteration: {}/{}\n\n\
         Available sources: {}\n\n\
         Recent findings summary:\n",
        state.query,
        state.objective,
        state.findings.len(),
        serde_json::to_string(&consulted).unwrap_or_default(),
        state.confidence,
        serde_json::to_string(&state.gaps).unwrap_or_default(),
        state.iteration + 1,
        state.max_iterations,
        serde_json::to_string(&available).unwrap_or_default(),
    );

    let recent_start = state.findings.len().saturating_sub(RECENT_FINDINGS_WINDOW);
    for finding in &state.findings[recent_start..] {
        context.push_str(&format!(
            "- [{}] {}\n",
            finding.source,
            preview(&finding.content, THINK_PREVIEW_CHARS)
        ));
    }

    context
}

/// Context block describing this iteration's new findings for reflection
fn build_reflect_context(state: &ResearchState, new_findings: &[Finding]) -> String {
    let mut context = format!(
        "Research objective: {}\n\
         Current confidence level: {:.2}\n\
         Iteration: {}/{}\n\n\
         New findings from this iteration:\n",
        state.objective, state.confidence, state.iteration, state.max_iterations,
    );

    for finding in new_findings {
        context.push_str(&format!(
            "\n[{}] {}\nContent: {}\nRelevance: {:.2}\n",
            finding.source,
            finding.title.as_deref().unwrap_or("Untitled"),
            preview(&finding.content, REFLECT_PREVIEW_CHARS),
            finding.relevance,
        ));
    }

    context.push_str(&format!(
        "\nTotal findings so far: {}",
        state.findings.len()
    ));
    context
}

/// Parse a think reply; `None` means the caller should use the fallback
fn parse_thought(reply: &str, state: &ResearchState) -> Option<ThoughtProcess> {
    let value = json::extract_object(reply)?;
    let obj = value.as_object()?;

    // A reply that carries neither an analysis nor queries is treated as
    // malformed rather than interpreted as an empty recommendation.
    if !obj.contains_key("analysis") && !obj.contains_key("recommended_queries") {
        return None;
    }

    let mut recommended_sources = BTreeMap::new();
    if let Some(sources) = obj.get("recommended_sources").and_then(|v| v.as_object()) {
        for (name, reason) in sources {
            match SourceKind::parse(name) {
                Some(kind) => {
                    recommended_sources
                        .insert(kind, reason.as_str().unwrap_or_default().to_string());
                }
                None => warn!(source = %name, "Ignoring recommendation for unknown source"),
            }
        }
    }

    let mut recommended_queries = BTreeMap::new();
    if let Some(queries) = obj.get("recommended_queries").and_then(|v| v.as_object()) {
        for (name, value) in queries {
            let Some(kind) = SourceKind::parse(name) else {
                warn!(source = %name, "Ignoring queries for unknown source");
                continue;
            };
            let list: Vec<String> = value
                .as_array()
                .map(|items| {
                    items
                        .iter()
                        .filter_map(|item| item.as_str())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default();
            if !list.is_empty() {
                recommended_queries.insert(kind, list);
            }
        }
    }

    Some(ThoughtProcess {
        analysis: json::str_field(obj, "analysis").unwrap_or_default(),
        identified_gaps: json::string_list(obj, "identified_gaps"),
        recommended_sources,
        recommended_queries,
        confidence_assessment: json::f64_field(obj, "confidence_assessment")
            .unwrap_or(state.confidence)
            .clamp(0.0, 1.0),
    })
}

/// Parse a reflect reply; `None` means the caller should use the fallback
fn parse_reflection(reply: &str, state: &ResearchState) -> Option<Reflection> {
    let value = json::extract_object(reply)?;
    let obj = value.as_object()?;

    if !obj.contains_key("confidence_update") && !obj.contains_key("should_continue") {
        return None;
    }

    Some(Reflection {
        quality_assessment: json::str_field(obj, "quality_assessment")
            .unwrap_or_else(|| "medium".to_string()),
        new_insights: json::string_list(obj, "new_insights"),
        remaining_questions: json::string_list(obj, "remaining_questions"),
        suggested_pivots: json::string_list(obj, "suggested_pivots"),
        confidence_update: json::f64_field(obj, "confidence_update")
            .unwrap_or(state.confidence)
            .clamp(0.0, 1.0),
        should_continue: json::bool_field(obj, "should_continue").unwrap_or(true),
    })
}

/// Default thought: one generic web query for the original query
fn fallback_thought(state: &ResearchState) -> ThoughtProcess {
    let mut recommended_sources = BTreeMap::new();
    recommended_sources.insert(SourceKind::Web, "general search".to_string());

    let mut recommended_queries = BTreeMap::new();
    recommended_queries.insert(SourceKind::Web, vec![state.query.clone()]);

    ThoughtProcess {
        analysis: "Need to search for more information".to_string(),
        identified_gaps: Vec::new(),
        recommended_sources,
        recommended_queries,
        confidence_assessment: state.confidence,
    }
}

/// Default reflection: nudge confidence up, continue while under the bound
fn fallback_reflection(state: &ResearchState) -> Reflection {
    Reflection {
        quality_assessment: "medium".to_string(),
        new_insights: Vec::new(),
        remaining_questions: Vec::new(),
        suggested_pivots: Vec::new(),
        confidence_update: (state.confidence + FALLBACK_CONFIDENCE_STEP).min(1.0),
        should_continue: state.iteration < state.max_iterations,
    }
}

/// Char-safe content preview
fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ResearchOptions;

    fn test_state() -> ResearchState {
        let options = ResearchOptions::default();
        let mut state = ResearchState::new("test query", "test objective".into(), &options);
        state.confidence = 0.3;
        state
    }

    #[test]
    fn well_formed_thought_is_parsed() {
        let state = test_state();
        let reply = r#"Some preamble.
        {
            "analysis": "We know little so far",
            "identified_gaps": ["population data"],
            "recommended_sources": {"web": "broad coverage", "docstore": "internal reports"},
            "recommended_queries": {"web": ["france capital", "paris history"]},
            "confidence_assessment": 0.45
        }"#;

        let thought = parse_thought(reply, &state).unwrap();
        assert_eq!(thought.analysis, "We know little so far");
        assert_eq!(thought.identified_gaps, vec!["population data"]);
        assert_eq!(
            thought.recommended_queries[&SourceKind::Web],
            vec!["france capital", "paris history"]
        );
        assert!(thought.recommended_sources.contains_key(&SourceKind::DocStore));
        assert!((thought.confidence_assessment - 0.45).abs() < 1e-9);
    }

    #[test]
    fn unknown_sources_are_rejected_at_parse_time() {
        let state = test_state();
        let reply = r#"{
            "analysis": "ok",
            "recommended_sources": {"gmail": "mailbox", "web": "search"},
            "recommended_queries": {"gmail": ["inbox"], "web": ["query"]}
        }"#;

        let thought = parse_thought(reply, &state).unwrap();
        assert_eq!(thought.recommended_sources.len(), 1);
        assert_eq!(thought.recommended_queries.len(), 1);
        assert!(thought.recommended_queries.contains_key(&SourceKind::Web));
    }

    #[test]
    fn reply_without_json_falls_back() {
        let state = test_state();
        assert!(parse_thought("I could not produce JSON, sorry.", &state).is_none());

        let thought = fallback_thought(&state);
        assert_eq!(
            thought.recommended_queries[&SourceKind::Web],
            vec![state.query.clone()]
        );
        assert_eq!(thought.confidence_assessment, state.confidence);
        assert!(thought.identified_gaps.is_empty());
    }

    #[test]
    fn object_without_recognized_keys_falls_back() {
        let state = test_state();
        assert!(parse_thought(r#"{"unrelated": true}"#, &state).is_none());
        assert!(parse_reflection(r#"{"unrelated": true}"#, &state).is_none());
    }

    #[test]
    fn reflection_confidence_is_clamped() {
        let state = test_state();
        let reply = r#"{"confidence_update": 1.6, "should_continue": false}"#;

        let reflection = parse_reflection(reply, &state).unwrap();
        assert_eq!(reflection.confidence_update, 1.0);
        assert!(!reflection.should_continue);
        assert_eq!(reflection.quality_assessment, "medium");
    }

    #[test]
    fn fallback_reflection_nudges_confidence() {
        let mut state = test_state();
        state.confidence = 0.95;

        let reflection = fallback_reflection(&state);
        assert_eq!(reflection.confidence_update, 1.0);
        assert!(reflection.should_continue);

        state.iteration = state.max_iterations;
        assert!(!fallback_reflection(&state).should_continue);
    }

    #[test]
    fn think_context_is_bounded_to_recent_findings() {
        let mut state = test_state();
        for i in 0..8 {
            state.findings.push(Finding::new(
                format!("finding number {} {}", i, "x".repeat(300)),
                SourceKind::Web,
                None,
                None,
                0.8,
            ));
        }

        let context = build_think_context(&state, &[SourceKind::Web]);
        assert!(!context.contains("finding number 2"));
        assert!(context.contains("finding number 3"));
        assert!(context.contains("finding number 7"));
        assert!(context.contains("Findings so far: 8 items"));
    }

    #[test]
    fn reflect_context_lists_new_findings() {
        let state = test_state();
        let findings = vec![Finding::new(
            "Paris is the capital of France".into(),
            SourceKind::Web,
            Some("https://example.com".into()),
            Some("web search: capital".into()),
            0.8,
        )];

        let context = build_reflect_context(&state, &findings);
        assert!(context.contains("web search: capital"));
        assert!(context.contains("Relevance: 0.80"));
    }
}
