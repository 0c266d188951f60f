//! Research phase: one FIFO step per call.

use tracing::info;

use crate::tools::{BackendTag, ToolRouter};

use super::state::{RunState, StepUpdate};

/// Execute one research step against the current state.
///
/// Pops the front pending query, routes it through the tool router and
/// packages the outcome as exactly one log entry. On an empty queue this is a
/// no-op terminal step contributing zero entries. The decision to keep
/// looping belongs to the orchestrator, not to this function.
pub async fn step(router: &ToolRouter, state: &RunState) -> StepUpdate {
    let Some((current_query, remaining)) = state.pending_queries.split_first() else {
        return StepUpdate {
            new_result: None,
            remaining: Vec::new(),
        };
    };

    info!(query = %current_query, remaining = remaining.len(), "Executing research step");

    let outcome = router.lookup(current_query).await;
    let entry = format_log_entry(outcome.tag, current_query, &outcome.text);

    StepUpdate {
        new_result: Some(entry),
        remaining: remaining.to_vec(),
    }
}

/// One log entry: backend tag, the literal query, and the result text.
/// The exact layout is part of the summarizer's context format.
fn format_log_entry(tag: BackendTag, query: &str, text: &str) -> String {
    format!("{} Q: {} \n A: {}\n", tag.label(), query, text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use crate::tools::{SearchError, SearchTool, LOOKUP_FAILED};

    struct StaticTool(&'static str);

    #[async_trait]
    impl SearchTool for StaticTool {
        async fn run(&self, _query: &str) -> Result<String, SearchError> {
            Ok(self.0.to_string())
        }
    }

    struct FailingTool;

    #[async_trait]
    impl SearchTool for FailingTool {
        async fn run(&self, _query: &str) -> Result<String, SearchError> {
            Err(SearchError::RateLimited)
        }
    }

    fn router() -> ToolRouter {
        ToolRouter::new(Box::new(StaticTool("web text")), Box::new(StaticTool("wiki text")))
    }

    fn state_with(queries: &[&str]) -> RunState {
        let mut state = RunState::new("topic");
        state.pending_queries = queries.iter().map(|q| q.to_string()).collect();
        state
    }

    #[tokio::test]
    async fn test_step_pops_front_and_produces_one_entry() {
        let state = state_with(&["best pizza nyc", "second query"]);
        let update = step(&router(), &state).await;

        assert_eq!(update.remaining, vec!["second query".to_string()]);
        let entry = update.new_result.unwrap();
        assert_eq!(entry, "[WEB] Q: best pizza nyc \n A: web text\n");
    }

    #[tokio::test]
    async fn test_step_on_empty_queue_is_noop() {
        let state = state_with(&[]);
        let update = step(&router(), &state).await;

        assert!(update.new_result.is_none());
        assert!(update.remaining.is_empty());
    }

    #[tokio::test]
    async fn test_queue_shrinks_by_exactly_one_per_step() {
        let mut state = state_with(&["q one", "q two", "q three"]);

        for expected_len in [2usize, 1, 0] {
            let update = step(&router(), &state).await;
            state.apply(update);
            assert_eq!(state.pending_queries.len(), expected_len);
        }
        assert_eq!(state.accumulated_results.len(), 3);
    }

    #[tokio::test]
    async fn test_results_len_is_min_of_steps_and_queries() {
        // 2 queries, 4 steps: the extra steps are no-ops
        let mut state = state_with(&["q one", "q two"]);

        for steps_taken in 1..=4usize {
            let update = step(&router(), &state).await;
            state.apply(update);
            assert_eq!(state.accumulated_results.len(), steps_taken.min(2));
        }
    }

    #[tokio::test]
    async fn test_failed_lookup_is_logged_not_raised() {
        let failing = ToolRouter::new(Box::new(FailingTool), Box::new(FailingTool));
        let state = state_with(&["doomed query"]);

        let update = step(&failing, &state).await;
        let entry = update.new_result.unwrap();
        assert_eq!(entry, format!("[ERR] Q: doomed query \n A: {}\n", LOOKUP_FAILED));
    }
}
