//! Error types for a benchmark run.
//!
//! None of these are retried: any error aborts the current pass and with it
//! the whole run.

use thiserror::Error;

/// Boxed driver error carried as the source of a benchmark failure.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum BenchError {
    /// Endpoint unreachable or authentication failed.
    #[error("failed to connect to target '{target}': {source}")]
    Connection { target: String, source: BoxError },

    /// The collection could not be dropped or re-created.
    #[error("failed to provision collection '{collection}': {source}")]
    Provisioning { collection: String, source: BoxError },

    /// The bulk insert failed. There is no partial-success handling.
    #[error("bulk insert of {count} records failed: {source}")]
    Insert { count: usize, source: BoxError },

    /// The lookup query itself failed. A lookup that matches nothing is not an error.
    #[error("lookup of {id} failed: {source}")]
    Retrieval { id: String, source: BoxError },

    #[error("cannot sample identifiers from an empty pool")]
    EmptyPool,

    #[error("malformed results file at line {line}: {message}")]
    MalformedResults { line: usize, message: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BenchError>;
