//! Conversation store trait

use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use super::{ThreadId, Turn};
use crate::domain::DomainError;

/// Append-only turn log keyed by thread
///
/// Implementations serialize appends per thread so a thread's order is the order in
/// which `append` calls completed. Distinct threads never contend with each other.
/// `append` stamps the turn's `created_at` inside that serialized section, so timestamps
/// never run backwards within a thread.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Stamps and appends a turn, returning the thread's new length
    async fn append(&self, thread_id: &ThreadId, turn: &mut Turn) -> Result<usize, DomainError>;

    /// Full history in completion order; unknown threads are empty
    async fn history(&self, thread_id: &ThreadId) -> Result<Vec<Turn>, DomainError>;

    /// The last `n` turns, oldest first
    async fn recent(&self, thread_id: &ThreadId, n: usize) -> Result<Vec<Turn>, DomainError>;

    /// Backend health check
    async fn ping(&self) -> Result<(), DomainError>;
}
