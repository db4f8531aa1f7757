use std::io::Read;

use bytes::Bytes;

use crate::error::BlobResult;

/// Backend contract behind a [`BlobAccess`](crate::BlobAccess).
///
/// Implementations must be thread-safe. The owning handles guarantee that
/// [`BlobSource::release`] is called exactly once, after which no other
/// method is called.
pub trait BlobSource: Send + Sync {
    /// A fresh reader positioned at the start of the content.
    ///
    /// Sources that can only be read once return
    /// [`BlobError::Exhausted`](crate::BlobError::Exhausted) on later calls.
    fn reader(&self) -> BlobResult<Box<dyn Read + Send>>;

    /// The full content.
    ///
    /// Default implementation drains a fresh reader. Backends may override
    /// when the content is already materialized.
    fn get(&self) -> BlobResult<Bytes> {
        let mut buf = Vec::new();
        self.reader()?.read_to_end(&mut buf)?;
        Ok(Bytes::from(buf))
    }

    /// Release backend resources.
    fn release(&self) -> BlobResult<()> {
        Ok(())
    }
}
