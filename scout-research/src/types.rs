//! Types for the research orchestration core

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// External source categories a finding or tool belongs to
///
/// A closed set: every kind is bound at session setup to its tool
/// implementation, and recommendations naming anything else are rejected
/// explicitly rather than silently dropped mid-loop.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Public web search
    Web,
    /// Document store lookup
    DocStore,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Web => "web",
            SourceKind::DocStore => "docstore",
        }
    }

    /// Parse a source name; `None` for unknown names
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "web" => Some(SourceKind::Web),
            "docstore" | "doc_store" | "document_store" => Some(SourceKind::DocStore),
            _ => None,
        }
    }

    /// All supported kinds
    pub fn all() -> [SourceKind; 2] {
        [SourceKind::Web, SourceKind::DocStore]
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One atomic piece of retrieved information
///
/// Immutable once created; owned exclusively by the session state that
/// holds it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    /// The retrieved content
    pub content: String,
    /// Which source produced it
    pub source: SourceKind,
    /// URL or item identifier, when one exists
    pub locator: Option<String>,
    /// Source title
    pub title: Option<String>,
    /// Creation time
    pub timestamp: DateTime<Utc>,
    /// Relevance score in [0, 1]
    pub relevance: f64,
    /// Free-form metadata
    pub metadata: HashMap<String, String>,
}

impl Finding {
    pub fn new(
        content: String,
        source: SourceKind,
        locator: Option<String>,
        title: Option<String>,
        relevance: f64,
    ) -> Self {
        Self {
            content,
            source,
            locator,
            title,
            timestamp: Utc::now(),
            relevance: relevance.clamp(0.0, 1.0),
            metadata: HashMap::new(),
        }
    }
}

/// Output of one "think" step
///
/// Produced once per iteration by the reasoning engine and consumed
/// immediately by the orchestrator; not retained afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThoughtProcess {
    /// Analysis of the current research state
    pub analysis: String,
    /// Knowledge gaps the engine identified
    pub identified_gaps: Vec<String>,
    /// Recommended sources with the reason for each
    pub recommended_sources: BTreeMap<SourceKind, String>,
    /// Queries to run, per source, in order
    pub recommended_queries: BTreeMap<SourceKind, Vec<String>>,
    /// The engine's independent confidence estimate in [0, 1]
    pub confidence_assessment: f64,
}

/// Output of one "reflect" step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reflection {
    /// Free-text quality label for the iteration's findings
    pub quality_assessment: String,
    /// New insights gained this iteration
    pub new_insights: Vec<String>,
    /// Questions still open
    pub remaining_questions: Vec<String>,
    /// Suggested alternate next steps
    pub suggested_pivots: Vec<String>,
    /// Updated session confidence in [0, 1]
    pub confidence_update: f64,
    /// Whether the loop should continue
    pub should_continue: bool,
}

/// Session configuration for one research run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchOptions {
    /// Sources the session is allowed to consult
    pub enabled_sources: Vec<SourceKind>,
    /// Maximum number of loop iterations
    pub max_iterations: usize,
    /// Confidence level at which research is considered complete
    pub confidence_target: f64,
    /// Follow-up content extractions per search result, per source
    pub max_enrichments: usize,
}

impl Default for ResearchOptions {
    fn default() -> Self {
        Self {
            enabled_sources: vec![SourceKind::Web],
            max_iterations: 10,
            confidence_target: 0.8,
            max_enrichments: 2,
        }
    }
}

/// Sentinel next-step recorded when a reflection suggests no pivots
pub const CONTINUE_STEP: &str = "continue";

/// Sentinel next-step a fresh session starts with
pub const INITIAL_STEP: &str = "initial-search";

/// The mutable ledger of one research session
///
/// Threaded by exclusive reference through every loop iteration, read by
/// the synthesizer at the end, then discarded. Findings and consulted
/// queries are append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchState {
    /// Original query, immutable for the session
    pub query: String,
    /// Derived research objective, set once at session start
    pub objective: String,
    /// Accumulated findings, append-only
    pub findings: Vec<Finding>,
    /// Queries already issued, per source, in dispatch order
    pub sources_consulted: BTreeMap<SourceKind, Vec<String>>,
    /// Current confidence level in [0, 1]
    pub confidence: f64,
    /// Current knowledge gaps
    pub gaps: Vec<String>,
    /// Current next steps
    pub next_steps: Vec<String>,
    /// Completed loop iterations
    pub iteration: usize,
    /// Iteration ceiling, fixed at session start
    pub max_iterations: usize,
    /// Confidence level that ends the session, fixed at session start
    pub confidence_target: f64,
}

impl ResearchState {
    pub fn new(query: &str, objective: String, options: &ResearchOptions) -> Self {
        Self {
            query: query.to_string(),
            objective,
            findings: Vec::new(),
            sources_consulted: BTreeMap::new(),
            confidence: 0.0,
            gaps: Vec::new(),
            next_steps: vec![INITIAL_STEP.to_string()],
            iteration: 0,
            max_iterations: options.max_iterations,
            confidence_target: options.confidence_target,
        }
    }

    /// Continuation predicate, evaluated before each iteration
    ///
    /// A conjunction: any single condition failing halts the loop before
    /// the iteration body runs.
    pub fn should_continue(&self) -> bool {
        self.confidence < self.confidence_target
            && self.iteration < self.max_iterations
            && !self.next_steps.is_empty()
    }

    /// Record a dispatched query under its source
    pub fn record_query(&mut self, source: SourceKind, query: &str) {
        self.sources_consulted
            .entry(source)
            .or_default()
            .push(query.to_string());
    }

    /// Fold a reflection into the state and advance the iteration counter
    pub fn apply_reflection(&mut self, reflection: &Reflection) {
        self.confidence = reflection.confidence_update.clamp(0.0, 1.0);
        self.gaps = reflection.remaining_questions.clone();
        self.next_steps = if reflection.suggested_pivots.is_empty() {
            vec![CONTINUE_STEP.to_string()]
        } else {
            reflection.suggested_pivots.clone()
        };
        self.iteration += 1;
    }
}

/// Terminal artifact of a research session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchReport {
    /// Original query
    pub query: String,
    /// Derived objective
    pub objective: String,
    /// All findings gathered across the session
    pub findings: Vec<Finding>,
    /// Synthesized narrative
    pub synthesis: String,
    /// Final confidence level
    pub confidence: f64,
    /// Queries issued per source
    pub sources_consulted: BTreeMap<SourceKind, Vec<String>>,
    /// Iterations performed
    pub iterations: usize,
    /// Completion time
    pub completed_at: DateTime<Utc>,
}

impl ResearchReport {
    /// Render the report as a markdown document
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("# Research Report: {}\n\n", self.query));
        out.push_str(&format!("**Objective:** {}\n\n", self.objective));
        out.push_str(&format!(
            "**Confidence:** {:.0}% | **Iterations:** {} | **Findings:** {}\n\n",
            self.confidence * 100.0,
            self.iterations,
            self.findings.len()
        ));

        out.push_str("## Synthesis\n\n");
        out.push_str(&self.synthesis);
        out.push_str("\n\n");

        if !self.sources_consulted.is_empty() {
            out.push_str("## Sources Consulted\n\n");
            for (source, queries) in &self.sources_consulted {
                out.push_str(&format!("- **{}** ({} queries)\n", source, queries.len()));
                for query in queries {
                    out.push_str(&format!("  - {}\n", query));
                }
            }
            out.push('\n');
        }

        out.push_str(&format!(
            "---\nCompleted at {}\n",
            self.completed_at.format("%Y-%m-%d %H:%M UTC")
        ));
        out
    }
}
