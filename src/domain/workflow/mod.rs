//! Question-answering workflow
//!
//! A turn moves through an explicit finite-state machine:
//!
//! ```text
//! Start -> GenerateQuery -> ValidateQuery -> ExecuteQuery -> GenerateAnswer -> Done
//!              ^                 |
//!              +--- rejected ----+        any stage -> Failed(reason) -> Done
//! ```
//!
//! [`transition`] is pure. The engine in the infrastructure layer performs the side
//! effect belonging to each state and feeds the outcome back as a [`StageEvent`].

mod answer;
mod error;
mod response;
mod state;

pub use answer::{fallback_answer, NO_MATCH_ANSWER};
pub use error::WorkflowError;
pub use response::AskResponse;
pub use state::{transition, Outcome, Rejection, RetryBudget, Round, StageEvent, WorkflowState};
