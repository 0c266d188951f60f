//! Summarize phase: fold the accumulated log entries into a short answer.

use tracing::info;

use crate::llm::{normalize_model_text, LanguageModel};

use super::WorkflowError;

fn summary_prompt(topic: &str, context: &str) -> String {
    format!(
        "Context:\n{}\n\nQuestion: {}\n\n\
         Please answer the question using the context provided. Keep it short.",
        context, topic
    )
}

/// Produce the final answer from everything the research loop collected.
///
/// All log entries are joined in accumulation order into one context block
/// and sent with the original topic in a single prompt. The model's
/// (normalized) reply is returned as-is - whether the answer actually sticks
/// to the context is the model's problem, not ours. A model failure here
/// aborts the run; the accumulated research is not preserved or retried.
pub async fn summarize(
    model: &dyn LanguageModel,
    topic: &str,
    results: &[String],
    temperature: f32,
) -> Result<String, WorkflowError> {
    info!(entries = results.len(), "Summarizing findings");

    let context = results.join("\n");
    let raw = model
        .invoke(&summary_prompt(topic, &context), temperature)
        .await
        .map_err(|source| WorkflowError::Summarization { source })?;

    Ok(normalize_model_text(raw))
}
