/// Errors from decoding and encoding typed objects.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SchemeError {
    /// The envelope is malformed: not an object, or the `type` field is
    /// missing or invalid. Also raised when a registered decoder rejects the
    /// structure.
    #[error("decode error: {reason}")]
    Decode { reason: String },

    /// A decoder returned an object whose kind differs from the lookup key.
    #[error("decoder for {expected:?} produced an object of kind {actual:?}")]
    KindMismatch { expected: String, actual: String },

    /// An object of an unregistered kind was used where a concrete
    /// capability is required.
    #[error("unsupported kind {kind:?}")]
    UnsupportedKind { kind: String },

    /// Serialization of an object failed.
    #[error("encode error: {0}")]
    Encode(String),
}

impl SchemeError {
    pub fn decode(reason: impl Into<String>) -> Self {
        Self::Decode {
            reason: reason.into(),
        }
    }

    pub fn unsupported(kind: impl Into<String>) -> Self {
        Self::UnsupportedKind { kind: kind.into() }
    }
}

/// Result alias for scheme operations.
pub type SchemeResult<T> = Result<T, SchemeError>;
