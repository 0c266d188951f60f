//! Planning phase: ask the model for search queries and parse them.

use tracing::{debug, info};

use crate::llm::{normalize_model_text, LanguageModel};

use super::WorkflowError;

/// Minimum trimmed line length for a parsed query. Anything at or below this
/// is treated as a blank or junk line and dropped.
const MIN_QUERY_CHARS: usize = 2;

fn plan_prompt(topic: &str) -> String {
    format!(
        "Plan 3 search queries for: {}. Return queries on new lines only.",
        topic
    )
}

/// Ask the model for search queries on `topic`.
///
/// A model failure here aborts the run - with no queries there is nothing to
/// research. An output that parses to zero queries is NOT an error and is not
/// retried; the research loop simply terminates immediately.
pub async fn plan(
    model: &dyn LanguageModel,
    topic: &str,
    temperature: f32,
) -> Result<Vec<String>, WorkflowError> {
    info!(topic = %topic, "Generating research plan");

    let raw = model
        .invoke(&plan_prompt(topic), temperature)
        .await
        .map_err(|source| WorkflowError::Planning { source })?;

    let queries = parse_queries(&normalize_model_text(raw));
    debug!(count = queries.len(), "Plan parsed");

    Ok(queries)
}

/// Parse free-text model output into queries: one per line, trimmed, with
/// lines of `MIN_QUERY_CHARS` or fewer characters discarded. Order is
/// preserved and no upper bound is enforced. Running this over its own output
/// yields the same sequence.
pub fn parse_queries(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| line.chars().count() > MIN_QUERY_CHARS)
        .map(String::from)
        .collect()
}
