/// Errors from blob operations.
#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    /// I/O error from the underlying backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The handle has already been closed.
    #[error("blob access already closed")]
    Closed,

    /// A one-shot stream has already been consumed.
    #[error("blob stream already consumed")]
    Exhausted,

    /// The backend opener failed.
    #[error("cannot open blob source: {reason}")]
    Open { reason: String },
}

impl BlobError {
    pub fn open(reason: impl Into<String>) -> Self {
        Self::Open {
            reason: reason.into(),
        }
    }
}

/// Result alias for blob operations.
pub type BlobResult<T> = Result<T, BlobError>;
