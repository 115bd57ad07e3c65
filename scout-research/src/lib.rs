//! Scout Research - the iterative research orchestration core
//!
//! Drives a think / act / observe / reflect cycle over the external tool
//! set: a reasoning engine decides which sources to query next, tool
//! results accumulate as findings, and a reflection step updates the
//! session's confidence and decides when to stop. A terminal synthesis
//! call turns the accumulated findings into a report.

pub mod agent;
pub mod json;
pub mod llm;
pub mod reasoning;
pub mod sources;
pub mod store;
pub mod synthesizer;
pub mod types;

pub use agent::ResearchAgent;
pub use llm::{build_chat_client, create_auto_client};
pub use reasoning::ReasoningEngine;
pub use sources::{SourceBinding, SourceRegistry};
pub use store::{FileReportStore, ReportSummary};
pub use synthesizer::Synthesizer;
pub use types::{
    Finding, Reflection, ResearchOptions, ResearchReport, ResearchState, SourceKind,
    ThoughtProcess,
};

/// Research-layer error type
#[derive(Debug, thiserror::Error)]
pub enum ResearchError {
    #[error("Core error: {0}")]
    Core(#[from] scout_core::ScoutError),

    #[error("LLM error: {message}")]
    Llm { message: String },

    #[error("Research error: {message}")]
    Research { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type ResearchResult<T> = Result<T, ResearchError>;

impl ResearchError {
    /// Create an LLM error
    pub fn llm<S: Into<String>>(message: S) -> Self {
        Self::Llm {
            message: message.into(),
        }
    }

    /// Create a research error
    pub fn research<S: Into<String>>(message: S) -> Self {
        Self::Research {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }
}
