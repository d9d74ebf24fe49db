use thiserror::Error;

/// Failure kinds surfaced to API callers.
#[derive(Debug, Error)]
pub enum WikiError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{0} is locked")]
    Locked(String),

    #[error("not allowed to {0}")]
    NotAllowed(String),

    /// Expected values sent by the client no longer match what is stored.
    /// The client should re-fetch and retry.
    #[error("wiki has been changed since it was loaded:\n{diff}")]
    ConcurrentModification { diff: String },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl WikiError {
    /// Stable machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            WikiError::NotFound(_) => "NOT_FOUND",
            WikiError::InvalidArgument(_) => "INVALID_ARGUMENT",
            WikiError::Locked(_) => "LOCKED",
            WikiError::NotAllowed(_) => "NOT_ALLOWED",
            WikiError::ConcurrentModification { .. } => "CONCURRENT_MODIFICATION",
            WikiError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}
