//! In-process conversation store

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, RwLock};

use crate::domain::{ConversationStore, DomainError, ThreadId, Turn};

type ThreadLog = Arc<Mutex<Vec<Turn>>>;

/// Turn logs held in memory for the lifetime of the process
///
/// The outer map is only locked to find or create a thread's log, so appends on
/// different threads proceed in parallel while appends on one thread are serialized.
#[derive(Debug, Default)]
pub struct InMemoryConversationStore {
    threads: RwLock<HashMap<ThreadId, ThreadLog>>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn log(&self, thread_id: &ThreadId) -> Option<ThreadLog> {
        self.threads.read().await.get(thread_id).cloned()
    }

    async fn log_or_create(&self, thread_id: &ThreadId) -> ThreadLog {
        if let Some(log) = self.log(thread_id).await {
            return log;
        }

        let mut threads = self.threads.write().await;
        threads.entry(thread_id.clone()).or_default().clone()
    }

    pub async fn thread_count(&self) -> usize {
        self.threads.read().await.len()
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn append(&self, thread_id: &ThreadId, turn: &mut Turn) -> Result<usize, DomainError> {
        let log = self.log_or_create(thread_id).await;
        let mut turns = log.lock().await;

        let now = Utc::now();
        turn.stamp(turns.last().map_or(now, |last| last.created_at().max(now)));
        turns.push(turn.clone());
        Ok(turns.len())
    }

    async fn history(&self, thread_id: &ThreadId) -> Result<Vec<Turn>, DomainError> {
        match self.log(thread_id).await {
            Some(log) => Ok(log.lock().await.clone()),
            None => Ok(Vec::new()),
        }
    }

    async fn recent(&self, thread_id: &ThreadId, n: usize) -> Result<Vec<Turn>, DomainError> {
        let Some(log) = self.log(thread_id).await else {
            return Ok(Vec::new());
        };

        let turns = log.lock().await;
        let start = turns.len().saturating_sub(n);
        Ok(turns[start..].to_vec())
    }

    async fn ping(&self) -> Result<(), DomainError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FailureReason;

    fn thread(id: &str) -> ThreadId {
        ThreadId::new(id).unwrap()
    }

    fn turn(question: &str) -> Turn {
        Turn::answered(question, "SELECT name FROM samsung_phones LIMIT 5", vec![], "none")
    }

    #[tokio::test]
    async fn test_unknown_thread_is_empty() {
        let store = InMemoryConversationStore::new();

        assert!(store.history(&thread("nobody")).await.unwrap().is_empty());
        assert!(store.recent(&thread("nobody"), 3).await.unwrap().is_empty());
        assert_eq!(store.thread_count().await, 0);
    }

    #[tokio::test]
    async fn test_append_returns_length_and_keeps_order() {
        let store = InMemoryConversationStore::new();
        let id = thread("t1");

        assert_eq!(store.append(&id, &mut turn("first")).await.unwrap(), 1);
        assert_eq!(store.append(&id, &mut turn("second")).await.unwrap(), 2);
        assert_eq!(
            store
                .append(&id, &mut Turn::failed("third", FailureReason::Validation, None))
                .await
                .unwrap(),
            3
        );

        let history = store.history(&id).await.unwrap();
        let questions: Vec<&str> = history.iter().map(|t| t.question()).collect();
        assert_eq!(questions, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_history_reads_do_not_mutate() {
        let store = InMemoryConversationStore::new();
        let id = thread("t1");
        store.append(&id, &mut turn("first")).await.unwrap();

        let a = store.history(&id).await.unwrap();
        let b = store.history(&id).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 1);
    }

    #[tokio::test]
    async fn test_recent_returns_tail() {
        let store = InMemoryConversationStore::new();
        let id = thread("t1");
        for q in ["a", "b", "c", "d"] {
            store.append(&id, &mut turn(q)).await.unwrap();
        }

        let recent = store.recent(&id, 3).await.unwrap();
        let questions: Vec<&str> = recent.iter().map(|t| t.question()).collect();
        assert_eq!(questions, vec!["b", "c", "d"]);

        assert_eq!(store.recent(&id, 10).await.unwrap().len(), 4);
        assert!(store.recent(&id, 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_threads_are_isolated() {
        let store = InMemoryConversationStore::new();
        store.append(&thread("a"), &mut turn("for a")).await.unwrap();
        store.append(&thread("b"), &mut turn("for b")).await.unwrap();

        let a = store.history(&thread("a")).await.unwrap();
        assert_eq!(a.len(), 1);
        assert_eq!(a[0].question(), "for a");
        assert_eq!(store.thread_count().await, 2);
    }

    #[tokio::test]
    async fn test_concurrent_appends_lose_nothing() {
        let store = Arc::new(InMemoryConversationStore::new());
        let id = thread("busy");

        let handles: Vec<_> = (0..32)
            .map(|i| {
                let store = store.clone();
                let id = id.clone();
                tokio::spawn(async move { store.append(&id, &mut turn(&format!("q{}", i))).await })
            })
            .collect();

        let mut lengths = Vec::new();
        for handle in futures::future::join_all(handles).await {
            lengths.push(handle.unwrap().unwrap());
        }

        lengths.sort_unstable();
        assert_eq!(lengths, (1..=32).collect::<Vec<_>>());

        let history = store.history(&id).await.unwrap();
        assert_eq!(history.len(), 32);
        assert!(history
            .windows(2)
            .all(|pair| pair[0].created_at() <= pair[1].created_at()));
    }

    #[tokio::test]
    async fn test_append_stamps_turn_in_append_order() {
        let store = InMemoryConversationStore::new();
        let id = thread("t1");

        let mut built_first = turn("built first");
        let mut built_second = turn("built second");
        built_second.stamp(Utc::now() + chrono::Duration::hours(1));

        store.append(&id, &mut built_second).await.unwrap();
        store.append(&id, &mut built_first).await.unwrap();

        let history = store.history(&id).await.unwrap();
        assert_eq!(history[0].question(), "built second");
        assert!(history[0].created_at() <= history[1].created_at());
        assert!(history[0].created_at() <= Utc::now());
        assert_eq!(history[1].created_at(), built_first.created_at());
    }
}
