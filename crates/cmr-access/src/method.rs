use std::fmt;
use std::io::Read;
use std::sync::Arc;

use bytes::Bytes;
use cmr_blob::BlobAccess;
use cmr_types::TypeName;

use crate::error::{AccessError, AccessResult};
use crate::spec::AccessSpec;

/// A resolved binding of an access spec to content.
///
/// The method owns its blob handle; [`AccessMethod::close`] releases it once
/// and is idempotent.
pub trait AccessMethod: Send + Sync + fmt::Debug {
    /// `true` if reading requires no remote fetch.
    fn is_local(&self) -> bool;

    /// Kind name of the bound spec, without version.
    fn kind(&self) -> &str;

    fn mime_type(&self) -> &str;

    /// The spec this method was resolved from.
    fn access_spec(&self) -> Arc<dyn AccessSpec>;

    fn get(&self) -> AccessResult<Bytes>;

    fn reader(&self) -> AccessResult<Box<dyn Read + Send>>;

    fn close(&self) -> AccessResult<()>;
}

/// An access method backed by an already-materialized blob.
pub struct BlobMethod {
    spec: Arc<dyn AccessSpec>,
    kind: String,
    blob: BlobAccess,
    local: bool,
}

impl BlobMethod {
    /// Bind `spec` to `blob`, taking ownership of the handle.
    ///
    /// Fails with [`AccessError::SpecMismatch`] unless the blob's media type
    /// equals `media_type` exactly; the handle is released in that case.
    pub fn new(
        spec: Arc<dyn AccessSpec>,
        media_type: &str,
        blob: BlobAccess,
        local: bool,
    ) -> AccessResult<Self> {
        if blob.mime_type() != media_type {
            return Err(AccessError::SpecMismatch {
                expected: media_type.to_string(),
                actual: blob.mime_type().to_string(),
            });
        }
        let kind = TypeName::parse(spec.kind())
            .map(|t| t.name().to_string())
            .unwrap_or_else(|_| spec.kind().to_string());
        Ok(Self {
            spec,
            kind,
            blob,
            local,
        })
    }

    pub fn blob(&self) -> &BlobAccess {
        &self.blob
    }
}

impl AccessMethod for BlobMethod {
    fn is_local(&self) -> bool {
        self.local
    }

    fn kind(&self) -> &str {
        &self.kind
    }

    fn mime_type(&self) -> &str {
        self.blob.mime_type()
    }

    fn access_spec(&self) -> Arc<dyn AccessSpec> {
        Arc::clone(&self.spec)
    }

    fn get(&self) -> AccessResult<Bytes> {
        Ok(self.blob.get()?)
    }

    fn reader(&self) -> AccessResult<Box<dyn Read + Send>> {
        Ok(self.blob.reader()?)
    }

    fn close(&self) -> AccessResult<()> {
        Ok(self.blob.close()?)
    }
}

impl fmt::Debug for BlobMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlobMethod")
            .field("kind", &self.kind)
            .field("mime_type", &self.blob.mime_type())
            .field("local", &self.local)
            .field("closed", &self.blob.is_closed())
            .finish()
    }
}
