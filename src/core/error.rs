//! Store errors
//!
//! Every store and facade operation returns a tagged `StoreResult` so a
//! caller can tell "nothing matched" apart from "the request failed".

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("data service returned {status}: {message}")]
    Remote { status: u16, message: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{collection} not found: {id}")]
    NotFound { collection: &'static str, id: String },

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("storage lock poisoned")]
    Lock,

    #[error("configuration error: {0}")]
    Config(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// One sub-query of a combined read that failed
///
/// Combined reads (search, analytics, context lookup) keep the parts that
/// succeeded and report the rest here.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct QueryFailure {
    /// Table the failed query ran against
    pub source: &'static str,
    pub reason: String,
}

impl QueryFailure {
    pub fn new(source: &'static str, error: &StoreError) -> Self {
        Self {
            source,
            reason: error.to_string(),
        }
    }
}

impl std::fmt::Display for QueryFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.source, self.reason)
    }
}
