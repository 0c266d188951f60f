//! Run state for one research invocation.
//!
//! The orchestrator owns exactly one [`RunState`] per run and throws it away
//! once the final answer is produced - nothing here persists across runs.

/// Mutable state accumulated over one run.
#[derive(Debug, Default)]
pub struct RunState {
    /// The user-supplied research question. Set once, never changed.
    pub topic: String,

    /// Planned queries not yet executed. FIFO: the front is removed on each
    /// research step, and the queue never re-grows.
    pub pending_queries: Vec<String>,

    /// Append-only log entries, one per research step that saw a non-empty
    /// queue.
    pub accumulated_results: Vec<String>,

    /// Written exactly once by the summarizer; empty before that.
    pub final_answer: String,
}

impl RunState {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            ..Self::default()
        }
    }

    /// Apply one research-step delta.
    ///
    /// This is the reducer: steps describe their contribution as a delta
    /// (zero or one new entries plus the shortened queue) and the state is
    /// only ever changed by appending it here.
    pub fn apply(&mut self, update: StepUpdate) {
        self.accumulated_results.extend(update.new_result);
        self.pending_queries = update.remaining;
    }
}

/// The delta produced by a single research step.
#[derive(Debug)]
pub struct StepUpdate {
    /// The one log entry this step produced, or `None` for the no-op step on
    /// an already-empty queue.
    pub new_result: Option<String>,

    /// The queue with this step's query removed.
    pub remaining: Vec<String>,
}
