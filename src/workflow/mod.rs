//! # Workflow Module
//!
//! The plan -> research -> summarize state machine that makes up the core of
//! the agent. Each phase lives in its own submodule; the orchestrator wires
//! them together and owns the run state.

pub mod orchestrator;
pub mod planner;
pub mod research;
pub mod state;
pub mod summarizer;

pub use orchestrator::Orchestrator;

use thiserror::Error;

use crate::llm::ModelError;

/// Failures that abort a run.
///
/// Tool failures never appear here - the router degrades those to error-tagged
/// log entries locally. Only the two model calls can take the whole run down.
#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("Planning failed: {source}")]
    Planning {
        #[source]
        source: ModelError,
    },

    #[error("Summarization failed: {source}")]
    Summarization {
        #[source]
        source: ModelError,
    },
}
