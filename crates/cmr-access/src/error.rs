use cmr_blob::BlobError;
use cmr_crypto::SigningError;
use cmr_runtime::SchemeError;

#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    #[error("decode error: {0}")]
    Decode(SchemeError),

    #[error("unsupported access kind {kind:?}")]
    UnsupportedKind { kind: String },

    #[error("media type mismatch: spec declares {expected:?}, blob has {actual:?}")]
    SpecMismatch { expected: String, actual: String },

    #[error("{kind} {id:?} not found")]
    NotFound { kind: String, id: String },

    #[error("no digester for resource type {resource_type:?}")]
    NoDigester { resource_type: String },

    #[error("access kind {kind:?} does not support {capability}")]
    CapabilityUnsupported { kind: String, capability: String },

    #[error("blob error: {0}")]
    Blob(#[from] BlobError),

    #[error("signing error: {0}")]
    Signing(#[from] SigningError),

    #[error("configuration error: {0}")]
    Config(String),
}

impl AccessError {
    pub fn not_found(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: kind.into(),
            id: id.into(),
        }
    }

    pub fn capability(kind: impl Into<String>, capability: impl Into<String>) -> Self {
        Self::CapabilityUnsupported {
            kind: kind.into(),
            capability: capability.into(),
        }
    }
}

impl From<SchemeError> for AccessError {
    fn from(err: SchemeError) -> Self {
        match err {
            SchemeError::UnsupportedKind { kind } => Self::UnsupportedKind { kind },
            other => Self::Decode(other),
        }
    }
}

impl From<std::io::Error> for AccessError {
    fn from(err: std::io::Error) -> Self {
        Self::Blob(BlobError::Io(err))
    }
}

pub type AccessResult<T> = std::result::Result<T, AccessError>;
