use thiserror::Error;

/// Domain errors surfaced by the service layer.
///
/// `Validation` and `NotFound` reject before any mutation. `Conflict` marks a
/// get-or-create race that still failed after its single retry, or a reorder
/// batch that could not be applied as a whole. Anything else is `Internal`.
#[derive(Debug, Error)]
pub enum ForumError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ForumError {
    /// Recovers a typed error that crossed an `anyhow` boundary (the
    /// repository closures run under `anyhow::Result`).
    pub fn from_anyhow(err: anyhow::Error) -> Self {
        match err.downcast::<ForumError>() {
            Ok(domain) => domain,
            Err(other) => ForumError::Internal(other),
        }
    }
}

pub type ForumResult<T> = Result<T, ForumError>;
