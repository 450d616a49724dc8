//! Domain layer - Core types, contracts and the workflow state machine

pub mod conversation;
pub mod error;
pub mod llm;
pub mod query;
pub mod schema;
pub mod workflow;

pub use conversation::{ConversationStore, FailureReason, ThreadId, Turn, TurnStatus};
pub use error::DomainError;
pub use llm::{
    FinishReason, LlmProvider, LlmRequest, LlmRequestBuilder, LlmResponse, Message, MessageRole,
    Usage,
};
pub use query::{
    ExecutionError, ExecutionErrorKind, GenerationError, QueryExecutor, QueryResult,
    QueryValidator, Row, ValidatedQuery, ValidationError, ValidatorConfig, Verdict,
};
pub use schema::{FewShotExample, FewShotExamples, FieldDescriptor, FieldType, SchemaDescriptor};
pub use workflow::{
    transition, AskResponse, Outcome, RetryBudget, StageEvent, WorkflowError, WorkflowState,
};
