//! Structured query generation, validation and execution contracts

mod error;
mod executor;
mod result;
mod validator;

pub use error::{ExecutionError, ExecutionErrorKind, GenerationError};
pub use executor::QueryExecutor;
pub use result::{QueryResult, Row};
pub use validator::{QueryValidator, ValidatedQuery, ValidationError, ValidatorConfig, Verdict};

#[cfg(test)]
pub use executor::MockQueryExecutor;
