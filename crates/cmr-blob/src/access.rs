use std::fmt;
use std::io::Read;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, warn};

use crate::error::{BlobError, BlobResult};
use crate::file::FileSource;
use crate::lazy::LazySource;
use crate::memory::MemorySource;
use crate::source::BlobSource;
use crate::stream::StreamSource;

struct Shared {
    mime_type: String,
    source: Box<dyn BlobSource>,
    refs: AtomicUsize,
}

/// Reference-counted handle to byte content with a declared media type.
///
/// Every handle is an independent owner. A new handle starts the shared count
/// at one; [`BlobAccess::dup`] adds an owner. [`BlobAccess::close`] gives up
/// this handle's ownership, and the handle whose close takes the count from
/// one to zero runs the source's release routine. Closing the same handle
/// twice is a no-op, and dropping an unclosed handle closes it.
pub struct BlobAccess {
    shared: Arc<Shared>,
    closed: AtomicBool,
}

impl BlobAccess {
    /// Wrap an arbitrary backend source.
    pub fn for_source(mime_type: impl Into<String>, source: impl BlobSource + 'static) -> Self {
        Self {
            shared: Arc::new(Shared {
                mime_type: mime_type.into(),
                source: Box::new(source),
                refs: AtomicUsize::new(1),
            }),
            closed: AtomicBool::new(false),
        }
    }

    /// Content from a fixed byte buffer.
    pub fn for_data(mime_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self::for_source(mime_type, MemorySource::new(data))
    }

    /// Content from a string.
    pub fn for_string(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self::for_data(mime_type, Bytes::from(data.into()))
    }

    /// Content of a file, opened per read.
    pub fn for_file(mime_type: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::for_source(mime_type, FileSource::new(path))
    }

    /// Content of a one-shot stream.
    pub fn for_reader(mime_type: impl Into<String>, reader: impl Read + Send + 'static) -> Self {
        Self::for_source(mime_type, StreamSource::new(reader))
    }

    /// Content from a backend opener, invoked on first access.
    pub fn for_opener<F>(mime_type: impl Into<String>, opener: F) -> Self
    where
        F: Fn() -> BlobResult<Box<dyn BlobSource>> + Send + Sync + 'static,
    {
        Self::for_source(mime_type, LazySource::new(opener))
    }

    /// The declared media type. Never performs I/O.
    pub fn mime_type(&self) -> &str {
        &self.shared.mime_type
    }

    /// The full content.
    pub fn get(&self) -> BlobResult<Bytes> {
        self.ensure_open()?;
        self.shared.source.get()
    }

    /// A fresh reader from the start of the content.
    pub fn reader(&self) -> BlobResult<Box<dyn Read + Send>> {
        self.ensure_open()?;
        self.shared.source.reader()
    }

    /// A new owner of the same content.
    pub fn dup(&self) -> BlobResult<Self> {
        self.ensure_open()?;
        let mut current = self.shared.refs.load(Ordering::Acquire);
        loop {
            if current == 0 {
                return Err(BlobError::Closed);
            }
            match self.shared.refs.compare_exchange_weak(
                current,
                current + 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }
        Ok(Self {
            shared: Arc::clone(&self.shared),
            closed: AtomicBool::new(false),
        })
    }

    /// Give up this handle's ownership.
    ///
    /// The error of a failing release routine is returned to the closing
    /// caller; the handle counts as closed either way.
    pub fn close(&self) -> BlobResult<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        if self.shared.refs.fetch_sub(1, Ordering::AcqRel) == 1 {
            debug!(mime_type = %self.shared.mime_type, "releasing blob source");
            return self.shared.source.release();
        }
        Ok(())
    }

    /// Returns `true` once this handle has been closed.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Number of open owners sharing this content.
    pub fn ref_count(&self) -> usize {
        self.shared.refs.load(Ordering::Acquire)
    }

    /// Returns `true` if both handles share the same content.
    pub fn same_content(&self, other: &BlobAccess) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }

    fn ensure_open(&self) -> BlobResult<()> {
        if self.is_closed() {
            return Err(BlobError::Closed);
        }
        Ok(())
    }
}

impl Drop for BlobAccess {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(mime_type = %self.shared.mime_type, error = %e, "blob release failed on drop");
        }
    }
}

impl fmt::Debug for BlobAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlobAccess")
            .field("mime_type", &self.shared.mime_type)
            .field("refs", &self.ref_count())
            .field("closed", &self.is_closed())
            .finish()
    }
}
