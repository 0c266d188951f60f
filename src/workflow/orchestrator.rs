//! Orchestrator: drives the phase machine from a topic to a final answer.

use tracing::{debug, info};

use crate::llm::LanguageModel;
use crate::tools::ToolRouter;

use super::state::RunState;
use super::{planner, research, summarizer, WorkflowError};

/// The phases of one run.
///
/// `Plan` transitions unconditionally into `Research`; `Research` loops on
/// itself while pending queries remain and otherwise moves to `Summarize`,
/// which transitions unconditionally to `Done`. There is no cancel path; the
/// monotonically shrinking queue bounds the loop at the initial plan length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Plan,
    Research,
    Summarize,
    Done,
}

/// Wires the planner, research loop and summarizer together and owns the
/// [`RunState`] for the duration of one call to [`Orchestrator::run`].
///
/// Collaborators are constructed by the caller and passed in - the
/// orchestrator holds them but creates nothing itself, so tests can hand it
/// fakes for both the model and the lookup backends.
pub struct Orchestrator {
    model: Box<dyn LanguageModel>,
    router: ToolRouter,
    planner_temperature: f32,
    summary_temperature: f32,
}

impl Orchestrator {
    pub fn new(
        model: Box<dyn LanguageModel>,
        router: ToolRouter,
        planner_temperature: f32,
        summary_temperature: f32,
    ) -> Self {
        Self {
            model,
            router,
            planner_temperature,
            summary_temperature,
        }
    }

    /// Run the whole workflow for one topic and return the final answer.
    pub async fn run(&self, topic: &str) -> Result<String, WorkflowError> {
        let mut state = RunState::new(topic);
        let mut phase = Phase::Plan;

        info!(topic = %topic, "Starting research run");

        loop {
            let next = match phase {
                Phase::Plan => {
                    state.pending_queries = planner::plan(
                        self.model.as_ref(),
                        &state.topic,
                        self.planner_temperature,
                    )
                    .await?;
                    Phase::Research
                }

                Phase::Research => {
                    let update = research::step(&self.router, &state).await;
                    state.apply(update);

                    // Continuation predicate, checked after every step
                    if state.pending_queries.is_empty() {
                        Phase::Summarize
                    } else {
                        Phase::Research
                    }
                }

                Phase::Summarize => {
                    state.final_answer = summarizer::summarize(
                        self.model.as_ref(),
                        &state.topic,
                        &state.accumulated_results,
                        self.summary_temperature,
                    )
                    .await?;
                    Phase::Done
                }

                Phase::Done => {
                    info!(entries = state.accumulated_results.len(), "Research run complete");
                    return Ok(state.final_answer);
                }
            };

            debug!(from = ?phase, to = ?next, "Phase transition");
            phase = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    use crate::llm::{ModelError, ModelText};
    use crate::tools::{SearchError, SearchTool};

    /// Fake model scripted with one reply per expected invocation.
    struct ScriptedModel {
        replies: Mutex<Vec<Result<ModelText, ModelError>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedModel {
        fn new(replies: Vec<Result<ModelText, ModelError>>) -> Self {
            Self {
                replies: Mutex::new(replies),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl LanguageModel for Arc<ScriptedModel> {
        async fn invoke(&self, prompt: &str, _temperature: f32) -> Result<ModelText, ModelError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            let mut replies = self.replies.lock().unwrap();
            assert!(!replies.is_empty(), "model invoked more times than scripted");
            replies.remove(0)
        }
    }

    struct EchoTool(&'static str);

    #[async_trait]
    impl SearchTool for EchoTool {
        async fn run(&self, query: &str) -> Result<String, SearchError> {
            Ok(format!("{} answer for {}", self.0, query))
        }
    }

    struct FailingTool;

    #[async_trait]
    impl SearchTool for FailingTool {
        async fn run(&self, _query: &str) -> Result<String, SearchError> {
            Err(SearchError::RateLimited)
        }
    }

    fn echo_router() -> ToolRouter {
        ToolRouter::new(Box::new(EchoTool("web")), Box::new(EchoTool("wiki")))
    }

    /// Build an orchestrator around a scripted fake, keeping a shared handle
    /// so tests can assert on the prompts after the run.
    fn orchestrator_with(model: ScriptedModel, router: ToolRouter) -> (Orchestrator, Arc<ScriptedModel>) {
        let model = Arc::new(model);
        let handle = Arc::clone(&model);
        (Orchestrator::new(Box::new(model), router, 0.0, 0.7), handle)
    }

    #[tokio::test]
    async fn test_end_to_end_capital_of_france() {
        let model = ScriptedModel::new(vec![
            Ok(ModelText::Single(
                "capital of France\nhistory of Paris\ndefine Eiffel Tower".to_string(),
            )),
            Ok(ModelText::Single("Paris is the capital of France.".to_string())),
        ]);
        let (orchestrator, handle) = orchestrator_with(model, echo_router());

        let answer = orchestrator.run("Capital of France").await.unwrap();
        assert_eq!(answer, "Paris is the capital of France.");

        // Exactly two model calls: one plan, one summary
        assert_eq!(handle.calls(), 2);

        // The summary prompt carries all three log entries with their tags
        let prompts = handle.prompts.lock().unwrap();
        let summary_prompt = &prompts[1];
        assert!(summary_prompt.contains("[WEB] Q: capital of France"));
        assert!(summary_prompt.contains("[WIKI] Q: history of Paris"));
        assert!(summary_prompt.contains("[WIKI] Q: define Eiffel Tower"));
    }

    #[tokio::test]
    async fn test_run_completes_with_always_failing_backends() {
        let model = ScriptedModel::new(vec![
            Ok(ModelText::Single("first query\nsecond query".to_string())),
            Ok(ModelText::Single("nothing worked but we finished".to_string())),
        ]);
        let router = ToolRouter::new(Box::new(FailingTool), Box::new(FailingTool));
        let (orchestrator, handle) = orchestrator_with(model, router);

        let answer = orchestrator.run("doomed topic").await.unwrap();
        assert_eq!(answer, "nothing worked but we finished");

        let prompts = handle.prompts.lock().unwrap();
        assert!(prompts[1].contains("[ERR] Q: first query \n A: lookup_failed"));
    }

    #[tokio::test]
    async fn test_empty_plan_still_summarizes_exactly_once() {
        let model = ScriptedModel::new(vec![
            Ok(ModelText::Single("\n \n".to_string())), // parses to zero queries
            Ok(ModelText::Single("no research happened".to_string())),
        ]);
        let (orchestrator, handle) = orchestrator_with(model, echo_router());

        let answer = orchestrator.run("anything").await.unwrap();
        assert_eq!(answer, "no research happened");
        assert_eq!(handle.calls(), 2);
    }

    #[tokio::test]
    async fn test_planning_failure_aborts_run() {
        let model = ScriptedModel::new(vec![Err(ModelError::EmptyResponse)]);
        let (orchestrator, _) = orchestrator_with(model, echo_router());

        let result = orchestrator.run("anything").await;
        assert!(matches!(result, Err(WorkflowError::Planning { .. })));
    }

    #[tokio::test]
    async fn test_summarization_failure_aborts_after_research() {
        let model = ScriptedModel::new(vec![
            Ok(ModelText::Single("only query".to_string())),
            Err(ModelError::HttpStatus(reqwest::StatusCode::INTERNAL_SERVER_ERROR)),
        ]);
        let (orchestrator, _) = orchestrator_with(model, echo_router());

        let result = orchestrator.run("anything").await;
        assert!(matches!(result, Err(WorkflowError::Summarization { .. })));
    }

    #[tokio::test]
    async fn test_composite_plan_reply_is_normalized_before_parsing() {
        // Gemini sometimes splits one reply across parts; the fragments are
        // joined with newlines before the line parser runs.
        let model = ScriptedModel::new(vec![
            Ok(ModelText::Fragments(vec![
                "fragment query one".to_string(),
                "fragment query two".to_string(),
            ])),
            Ok(ModelText::Single("done".to_string())),
        ]);
        let (orchestrator, handle) = orchestrator_with(model, echo_router());

        orchestrator.run("anything").await.unwrap();

        let prompts = handle.prompts.lock().unwrap();
        assert!(prompts[1].contains("Q: fragment query one"));
        assert!(prompts[1].contains("Q: fragment query two"));
    }
}
