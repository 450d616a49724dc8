//! Data-store boundary

use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use super::error::ExecutionError;
use super::result::QueryResult;
use super::validator::ValidatedQuery;

/// Read-only query execution against the phone store
#[cfg_attr(test, automock)]
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Run a validated query, returning at most `query.limit()` rows
    async fn execute(&self, query: &ValidatedQuery) -> Result<QueryResult, ExecutionError>;

    /// Cheap connectivity check used by readiness probes
    async fn ping(&self) -> Result<(), ExecutionError>;
}
