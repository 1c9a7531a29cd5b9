//! Query construction errors

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QueryError {
    /// The caller supplied unusable TQL, or asked for a single expression
    /// spanning both resource kinds.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Base query and filters together produced no clauses.
    #[error("Query build failed: {0}")]
    BuildFailed(String),
}

pub type QueryResult<T> = Result<T, QueryError>;
