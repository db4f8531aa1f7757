/// Errors from signing and verification.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SigningError {
    #[error("invalid signature")]
    InvalidSignature,

    #[error("invalid key")]
    InvalidKey,

    /// The registered key is not usable with the requested algorithm.
    #[error("key is not a {expected} key")]
    KeyTypeMismatch { expected: String },

    /// The digest to sign or verify is not a hex string.
    #[error("invalid digest: {0}")]
    InvalidDigest(String),

    /// A handler lacks the capability it was registered for.
    #[error("handler {name:?} does not support {capability}")]
    CapabilityUnsupported { name: String, capability: String },

    #[error("unknown algorithm {0:?}")]
    UnknownAlgorithm(String),
}

/// Result alias for signing operations.
pub type SigningResult<T> = Result<T, SigningError>;
