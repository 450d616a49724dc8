//! Drives one turn through the workflow state machine

use std::sync::Arc;
use std::time::Instant;

use tokio::task::JoinHandle;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::domain::workflow::{transition, AskResponse, Outcome, RetryBudget, StageEvent, WorkflowState};
use crate::domain::{
    ConversationStore, DomainError, FailureReason, QueryExecutor, QueryValidator, ThreadId, Turn,
    Verdict, WorkflowError,
};
use crate::infrastructure::generation::{AnswerGenerator, QueryGenerator};
use crate::infrastructure::observability::{record_generation_retry, record_turn};

/// Prior turns handed to the query generator by default
pub const DEFAULT_HISTORY_TURNS: usize = 3;

/// Question-answering workflow over the phone catalogue
pub struct WorkflowEngine {
    generator: QueryGenerator,
    validator: QueryValidator,
    executor: Arc<dyn QueryExecutor>,
    answerer: AnswerGenerator,
    store: Arc<dyn ConversationStore>,
    budget: RetryBudget,
    history_turns: usize,
}

impl std::fmt::Debug for WorkflowEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowEngine")
            .field("validator", &self.validator)
            .field("budget", &self.budget)
            .field("history_turns", &self.history_turns)
            .finish_non_exhaustive()
    }
}

impl WorkflowEngine {
    pub fn new(
        generator: QueryGenerator,
        validator: QueryValidator,
        executor: Arc<dyn QueryExecutor>,
        answerer: AnswerGenerator,
        store: Arc<dyn ConversationStore>,
    ) -> Self {
        Self {
            generator,
            validator,
            executor,
            answerer,
            store,
            budget: RetryBudget::default(),
            history_turns: DEFAULT_HISTORY_TURNS,
        }
    }

    pub fn with_budget(mut self, budget: RetryBudget) -> Self {
        self.budget = budget;
        self
    }

    pub fn with_history_turns(mut self, turns: usize) -> Self {
        self.history_turns = turns;
        self
    }

    pub fn store(&self) -> &Arc<dyn ConversationStore> {
        &self.store
    }

    /// Answer `question` within `thread_id` (a fresh thread when `None`)
    ///
    /// Never fails: every failure is folded into the response status. Exactly one turn
    /// is appended once the run completes; dropping the future first appends nothing.
    pub async fn ask(&self, question: &str, thread_id: Option<ThreadId>) -> AskResponse {
        let thread_id = thread_id.unwrap_or_else(ThreadId::generate);
        let span = info_span!("ask", thread_id = %thread_id);

        self.ask_in_thread(question, thread_id).instrument(span).await
    }

    async fn ask_in_thread(&self, question: &str, thread_id: ThreadId) -> AskResponse {
        let started = Instant::now();

        let history = match self.store.recent(&thread_id, self.history_turns).await {
            Ok(turns) => turns,
            Err(e) => {
                warn!(error = %e, "Failed to load conversation history, continuing without it");
                Vec::new()
            }
        };

        let mut turn = self.run(question, &history).await.into_turn(question);
        record_turn(turn.status().as_str(), started.elapsed());

        match self.store.append(&thread_id, &mut turn).await {
            Ok(length) => debug!(length, "Turn appended"),
            Err(e) => error!(error = %e, "Failed to append turn"),
        }

        info!(
            status = %turn.status(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Turn completed"
        );

        AskResponse::from_turn(thread_id, &turn)
    }

    /// Run `ask` on its own task so the caller can cancel it
    pub fn spawn_ask(
        self: &Arc<Self>,
        question: impl Into<String>,
        thread_id: Option<ThreadId>,
    ) -> AskHandle {
        let thread_id = thread_id.unwrap_or_else(ThreadId::generate);
        let question = question.into();
        let engine = Arc::clone(self);
        let id = thread_id.clone();

        let task = tokio::spawn(async move { engine.ask(&question, Some(id)).await });

        AskHandle { thread_id, task }
    }

    pub async fn history(&self, thread_id: &ThreadId) -> Result<Vec<Turn>, DomainError> {
        self.store.history(thread_id).await
    }

    async fn run(&self, question: &str, history: &[Turn]) -> Outcome {
        let mut state = WorkflowState::Start;
        let max_steps = self.budget.max_transitions();

        for _ in 0..max_steps {
            state = match state {
                WorkflowState::Done(outcome) => return outcome,
                other => other,
            };

            let from = state.name();
            let event = self.perform(&state, question, history).await;

            state = match transition(state, event, &self.budget) {
                Ok(next) => next,
                Err(e) => {
                    error!(error = %e, "Workflow transition rejected");
                    return aborted();
                }
            };

            debug!(from, to = state.name(), "Workflow transition");
        }

        error!(max_steps, "Workflow did not terminate");
        aborted()
    }

    /// Side effect attached to `state`, reported as the event it produced
    async fn perform(&self, state: &WorkflowState, question: &str, history: &[Turn]) -> StageEvent {
        match state {
            WorkflowState::Start | WorkflowState::Failed { .. } | WorkflowState::Done(_) => {
                StageEvent::Proceed
            }

            WorkflowState::GenerateQuery(round) => {
                if round.attempt > 1 {
                    record_generation_retry("generation");
                } else if round.validation_retries > 0 {
                    record_generation_retry("validation");
                }

                let generated = self
                    .generator
                    .generate(question, history, round.feedback.as_ref())
                    .await;

                if let Err(e) = &generated {
                    warn!(attempt = round.attempt, error = %e, "Query generation failed");
                }

                StageEvent::Generated(generated)
            }

            WorkflowState::ValidateQuery { candidate, .. } => {
                let verdict = self.validator.validate(candidate, self.generator.schema());

                if let Verdict::Invalid(reason) = &verdict {
                    warn!(candidate = %candidate, reason = %reason, "Candidate query rejected");
                }

                StageEvent::Validated(verdict)
            }

            WorkflowState::ExecuteQuery { query } => {
                let executed = self.executor.execute(query).await;

                match &executed {
                    Ok(result) => debug!(rows = result.row_count, "Query executed"),
                    Err(e) => warn!(kind = e.kind.as_str(), error = %e.message, "Query execution failed"),
                }

                StageEvent::Executed(executed)
            }

            WorkflowState::GenerateAnswer { query, result } => {
                let no_match = result.is_empty();
                let answered = self
                    .answerer
                    .generate(question, query, result, no_match)
                    .await;

                if let Err(e) = &answered {
                    warn!(error = %e, "Answer generation failed, using fallback answer");
                }

                StageEvent::Answered(answered)
            }
        }
    }
}

/// Outcome for a run the state machine could not finish
fn aborted() -> Outcome {
    Outcome::Failed {
        reason: FailureReason::Generation,
        query: None,
    }
}

/// In-flight `ask` running on a spawned task
#[derive(Debug)]
pub struct AskHandle {
    thread_id: ThreadId,
    task: JoinHandle<AskResponse>,
}

impl AskHandle {
    pub fn thread_id(&self) -> &ThreadId {
        &self.thread_id
    }

    /// Abort the run; in-flight calls are abandoned and no turn is appended
    pub fn cancel(&self) {
        self.task.abort();
    }

    pub async fn join(self) -> Result<AskResponse, WorkflowError> {
        match self.task.await {
            Ok(response) => Ok(response),
            Err(e) if e.is_cancelled() => Err(WorkflowError::Cancelled),
            Err(e) => Err(WorkflowError::task_failed(e.to_string())),
        }
    }
}
