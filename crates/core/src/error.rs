use thiserror::Error;

/// Engine error taxonomy.
///
/// `NotFound` covers unknown ids, revisions and unresolvable paths — including
/// documents whose backing file is absent. `Conflict` is reserved for a future
/// optimistic-concurrency layer; nothing produces it yet.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("not found")]
    NotFound,

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        // Serialization failures on write are storage failures from the
        // caller's point of view; reads normalize parse failures to absent.
        EngineError::Storage(std::io::Error::new(std::io::ErrorKind::InvalidData, err))
    }
}

/// Convenience type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
