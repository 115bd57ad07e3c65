//! Final report synthesis
//!
//! One terminal model call turns the session's accumulated findings into
//! a narrative. There is no retry or fallback here: if synthesis fails,
//! the whole session fails; there is no partial-report recovery path.

use crate::llm::chat_text;
use crate::types::{Finding, ResearchReport, ResearchState, SourceKind};
use crate::ResearchResult;
use chrono::Utc;
use siumai::prelude::ChatCapability;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

/// Per-finding content preview length in the synthesis digest
const DIGEST_PREVIEW_CHARS: usize = 500;

const SYNTHESIS_PROMPT: &str = r#"You are a research synthesis expert. Your role is to:

1. Analyze findings from multiple sources
2. Identify key themes and patterns
3. Resolve contradictions between sources
4. Provide a comprehensive, well-structured summary
5. Maintain source attribution for all claims

When synthesizing research:
- Prioritize recent and authoritative sources
- Highlight agreements and disagreements between sources
- Identify gaps in the available information
- Use clear, concise language

Always cite sources using [Source: title] format."#;

/// Turns a terminal research state into a report
pub struct Synthesizer {
    llm: Arc<dyn ChatCapability>,
}

impl Synthesizer {
    pub fn new(llm: Arc<dyn ChatCapability>) -> Self {
        Self { llm }
    }

    /// Produce the final report from the session's terminal state
    pub async fn synthesize(&self, state: &ResearchState) -> ResearchResult<ResearchReport> {
        info!(
            findings = state.findings.len(),
            "Creating research synthesis"
        );

        let digest = build_digest(&state.findings);
        let request = format!(
            "Research query: {}\nResearch objective: {}\n\n{}\n\n\
             Please provide a comprehensive synthesis of these findings that:\n\
             1. Answers the original query\n\
             2. Integrates information from all sources\n\
             3. Highlights key insights\n\
             4. Notes any contradictions or gaps\n\
             5. Provides a clear conclusion",
            state.query, state.objective, digest,
        );

        let synthesis = chat_text(&self.llm, SYNTHESIS_PROMPT, &request).await?;

        Ok(ResearchReport {
            query: state.query.clone(),
            objective: state.objective.clone(),
            findings: state.findings.clone(),
            synthesis,
            confidence: state.confidence,
            sources_consulted: state.sources_consulted.clone(),
            iterations: state.iteration,
            completed_at: Utc::now(),
        })
    }
}

/// Bounded text digest of the findings, grouped by source
fn build_digest(findings: &[Finding]) -> String {
    let mut by_source: BTreeMap<SourceKind, Vec<&Finding>> = BTreeMap::new();
    for finding in findings {
        by_source.entry(finding.source).or_default().push(finding);
    }

    let mut digest = String::from("Research findings:\n");
    if by_source.is_empty() {
        digest.push_str("\n(no findings were gathered)\n");
        return digest;
    }

    for (source, group) in by_source {
        digest.push_str(&format!("\n## From {}:\n", source));
        for (i, finding) in group.iter().enumerate() {
            digest.push_str(&format!("\n{}. ", i + 1));
            if let Some(title) = &finding.title {
                digest.push_str(&format!("{}\n", title));
            }
            digest.push_str(&preview(&finding.content, DIGEST_PREVIEW_CHARS));
            digest.push('\n');
        }
    }

    digest
}

fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}
