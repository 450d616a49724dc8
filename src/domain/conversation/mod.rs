//! Per-thread conversation memory

mod store;
mod thread_id;
mod turn;

pub use store::ConversationStore;
pub use thread_id::{validate_thread_id, ThreadId, MAX_THREAD_ID_LENGTH};
pub use turn::{FailureReason, Turn, TurnStatus};

#[cfg(test)]
pub use store::MockConversationStore;
