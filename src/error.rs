use thiserror::Error;

/// Errors surfaced by the walk engine.
///
/// Builders never return an error for a missing focal label; that case is
/// "not ready" and is modelled as `None` by the query builders.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WalkError {
    #[error("invalid property selection: {0}")]
    InvalidSelection(String),
    #[error("invalid step: {0}")]
    InvalidStep(String),
    /// Executor rejected the query; message is kept verbatim.
    #[error("{0}")]
    Execution(String),
    #[error("could not decode row {row}: {reason}")]
    Decode { row: usize, reason: String },
    #[error("query timed out after {0} ms")]
    Timeout(u64),
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error("could not restore walk: {0}")]
    Restore(String),
}

pub type Result<T> = std::result::Result<T, WalkError>;
