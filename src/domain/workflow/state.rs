//! Workflow state machine

use crate::domain::conversation::{FailureReason, Turn};
use crate::domain::query::{
    ExecutionError, GenerationError, QueryResult, Row, ValidatedQuery, ValidationError, Verdict,
};

use super::answer::fallback_answer;
use super::error::WorkflowError;

/// Bounds on the generation/validation loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryBudget {
    /// Generation calls allowed per round before giving up
    pub max_generation_attempts: u32,
    /// Regeneration rounds allowed after a rejected candidate
    pub max_validation_retries: u32,
}

impl RetryBudget {
    /// Most transitions one run can take before reaching `Done`
    pub fn max_transitions(&self) -> usize {
        let attempts = self.max_generation_attempts as usize + 1;
        let rounds = self.max_validation_retries as usize + 1;
        attempts.saturating_mul(rounds).saturating_add(4)
    }
}

impl Default for RetryBudget {
    fn default() -> Self {
        Self {
            max_generation_attempts: 2,
            max_validation_retries: 1,
        }
    }
}

/// A rejected candidate, fed back into the next generation round
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub query: String,
    pub reason: ValidationError,
}

/// Retry counters for the current generation round
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Round {
    /// 1-based generation attempt within this round
    pub attempt: u32,
    /// Validation retries spent so far in this turn
    pub validation_retries: u32,
    pub feedback: Option<Rejection>,
}

impl Round {
    fn first() -> Self {
        Self {
            attempt: 1,
            validation_retries: 0,
            feedback: None,
        }
    }
}

/// How a run ended, before it is folded into a [`Turn`]
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Answered {
        query: String,
        rows: Vec<Row>,
        answer: String,
    },
    Failed {
        reason: FailureReason,
        query: Option<String>,
    },
}

impl Outcome {
    pub fn into_turn(self, question: impl Into<String>) -> Turn {
        match self {
            Self::Answered {
                query,
                rows,
                answer,
            } => Turn::answered(question, query, rows, answer),
            Self::Failed { reason, query } => Turn::failed(question, reason, query),
        }
    }
}

/// In-flight record of a single turn
#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowState {
    Start,
    GenerateQuery(Round),
    ValidateQuery {
        round: Round,
        candidate: String,
    },
    ExecuteQuery {
        query: ValidatedQuery,
    },
    GenerateAnswer {
        query: ValidatedQuery,
        result: QueryResult,
    },
    Failed {
        reason: FailureReason,
        query: Option<String>,
    },
    Done(Outcome),
}

impl WorkflowState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::GenerateQuery(_) => "generate_query",
            Self::ValidateQuery { .. } => "validate_query",
            Self::ExecuteQuery { .. } => "execute_query",
            Self::GenerateAnswer { .. } => "generate_answer",
            Self::Failed { .. } => "failed",
            Self::Done(_) => "done",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done(_))
    }
}

/// Result of performing the work attached to a state
#[derive(Debug, Clone, PartialEq)]
pub enum StageEvent {
    /// Leaves `Start` and `Failed`, which do no work of their own
    Proceed,
    Generated(Result<String, GenerationError>),
    Validated(Verdict),
    Executed(Result<QueryResult, ExecutionError>),
    Answered(Result<String, GenerationError>),
}

impl StageEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Proceed => "proceed",
            Self::Generated(_) => "generated",
            Self::Validated(_) => "validated",
            Self::Executed(_) => "executed",
            Self::Answered(_) => "answered",
        }
    }
}

/// Next state for `state` after `event`
pub fn transition(
    state: WorkflowState,
    event: StageEvent,
    budget: &RetryBudget,
) -> Result<WorkflowState, WorkflowError> {
    use StageEvent as E;
    use WorkflowState as S;

    let next = match (state, event) {
        (S::Start, E::Proceed) => S::GenerateQuery(Round::first()),

        (S::GenerateQuery(round), E::Generated(Ok(candidate))) => S::ValidateQuery { round, candidate },
        (S::GenerateQuery(round), E::Generated(Err(error))) => {
            if error.is_retryable() && round.attempt < budget.max_generation_attempts {
                S::GenerateQuery(Round {
                    attempt: round.attempt + 1,
                    ..round
                })
            } else {
                S::Failed {
                    reason: FailureReason::Generation,
                    query: None,
                }
            }
        }

        (S::ValidateQuery { .. }, E::Validated(Verdict::Valid(query))) => S::ExecuteQuery { query },
        (S::ValidateQuery { round, candidate }, E::Validated(Verdict::Invalid(reason))) => {
            if round.validation_retries < budget.max_validation_retries {
                S::GenerateQuery(Round {
                    attempt: 1,
                    validation_retries: round.validation_retries + 1,
                    feedback: Some(Rejection {
                        query: candidate,
                        reason,
                    }),
                })
            } else {
                S::Failed {
                    reason: FailureReason::Validation,
                    query: Some(candidate),
                }
            }
        }

        (S::ExecuteQuery { query }, E::Executed(Ok(result))) => S::GenerateAnswer { query, result },
        (S::ExecuteQuery { query }, E::Executed(Err(_))) => S::Failed {
            reason: FailureReason::Execution,
            query: Some(query.sql().to_string()),
        },

        (S::GenerateAnswer { query, result }, E::Answered(answer)) => {
            let rows = result.into_rows();
            let answer = match answer {
                Ok(answer) => answer,
                Err(_) => fallback_answer(&rows),
            };

            S::Done(Outcome::Answered {
                query: query.sql().to_string(),
                rows,
                answer,
            })
        }

        (S::Failed { reason, query }, E::Proceed) => S::Done(Outcome::Failed { reason, query }),

        (state, event) => {
            return Err(WorkflowError::invalid_transition(state.name(), event.name()));
        }
    };

    Ok(next)
}
