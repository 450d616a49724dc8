//! Read-only execution of validated queries

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::PgPool;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::domain::{ExecutionError, QueryExecutor, QueryResult, ValidatedQuery};
use crate::infrastructure::observability::record_query_execution;

/// Extra time granted to the client-side deadline over the server-side statement timeout
const CLIENT_GRACE: Duration = Duration::from_secs(2);

/// Runs validated queries inside read-only transactions
#[derive(Debug, Clone)]
pub struct PostgresQueryExecutor {
    pool: PgPool,
    statement_timeout: Duration,
}

impl PostgresQueryExecutor {
    pub fn new(pool: PgPool, statement_timeout: Duration) -> Self {
        Self {
            pool,
            statement_timeout,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn run(&self, query: &ValidatedQuery) -> Result<QueryResult, ExecutionError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        sqlx::query("SET TRANSACTION READ ONLY")
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        sqlx::query(&format!(
            "SET LOCAL statement_timeout = {}",
            self.statement_timeout.as_millis()
        ))
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        let wrapped = format!("SELECT row_to_json(q) FROM ({}) q", query.sql());
        let rows: Vec<(Value,)> = sqlx::query_as(&wrapped)
            .fetch_all(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        tx.rollback().await.map_err(map_sqlx_error)?;

        let rows = rows
            .into_iter()
            .filter_map(|(value,)| match value {
                Value::Object(row) => Some(row),
                _ => None,
            })
            .collect();

        Ok(QueryResult::new(rows).truncated(query.limit()))
    }
}

#[async_trait]
impl QueryExecutor for PostgresQueryExecutor {
    async fn execute(&self, query: &ValidatedQuery) -> Result<QueryResult, ExecutionError> {
        let start = Instant::now();
        let deadline = self.statement_timeout + CLIENT_GRACE;

        let result = match timeout(deadline, self.run(query)).await {
            Ok(result) => result,
            Err(_) => Err(ExecutionError::timeout(format!(
                "query did not finish within {}ms",
                deadline.as_millis()
            ))),
        };

        let elapsed = start.elapsed();
        match &result {
            Ok(rows) => {
                debug!(rows = rows.row_count, elapsed_ms = elapsed.as_millis() as u64, "Query executed");
                record_query_execution("success", elapsed);
            }
            Err(e) => {
                warn!(kind = %e.kind, error = %e.message, "Query execution failed");
                record_query_execution(e.kind.as_str(), elapsed);
            }
        }

        result
    }

    async fn ping(&self) -> Result<(), ExecutionError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(map_sqlx_error)
    }
}

/// Classify a driver error
pub fn map_sqlx_error(error: sqlx::Error) -> ExecutionError {
    match &error {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => ExecutionError::connection(error.to_string()),
        sqlx::Error::Database(db) => match db.code().as_deref() {
            Some("57014") => ExecutionError::timeout(db.message().to_string()),
            Some(code) if code.starts_with("23") || code == "25006" || code == "42501" => {
                ExecutionError::constraint(db.message().to_string())
            }
            Some(code) if code.starts_with("08") => ExecutionError::connection(db.message().to_string()),
            _ => ExecutionError::unknown(db.message().to_string()),
        },
        _ => ExecutionError::unknown(error.to_string()),
    }
}

/// Stand-in used when no database is configured; every call is a connection error
#[derive(Debug, Clone, Copy, Default)]
pub struct DisconnectedExecutor;

const NOT_CONFIGURED: &str = "no database configured (set database.url or DATABASE_URL)";

#[async_trait]
impl QueryExecutor for DisconnectedExecutor {
    async fn execute(&self, _query: &ValidatedQuery) -> Result<QueryResult, ExecutionError> {
        Err(ExecutionError::connection(NOT_CONFIGURED))
    }

    async fn ping(&self) -> Result<(), ExecutionError> {
        Err(ExecutionError::connection(NOT_CONFIGURED))
    }
}
