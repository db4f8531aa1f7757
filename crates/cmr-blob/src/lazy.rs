use std::io::Read;
use std::sync::{Arc, Mutex, PoisonError};

use bytes::Bytes;
use tracing::debug;

use crate::error::BlobResult;
use crate::source::BlobSource;

type Opener = Box<dyn Fn() -> BlobResult<Box<dyn BlobSource>> + Send + Sync>;

/// A source produced by an injected backend opener.
///
/// The opener runs on the first `reader`/`get`, never at construction. A
/// successful open is memoized: later accesses reuse the opened source. A
/// failed open is not memoized, so the next access calls the opener again.
/// Release is forwarded to the opened source, if there is one.
pub struct LazySource {
    opener: Opener,
    opened: Mutex<Option<Arc<dyn BlobSource>>>,
}

impl LazySource {
    pub fn new<F>(opener: F) -> Self
    where
        F: Fn() -> BlobResult<Box<dyn BlobSource>> + Send + Sync + 'static,
    {
        Self {
            opener: Box::new(opener),
            opened: Mutex::new(None),
        }
    }

    /// Returns `true` once the opener has succeeded.
    pub fn is_opened(&self) -> bool {
        self.opened
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    fn source(&self) -> BlobResult<Arc<dyn BlobSource>> {
        let mut opened = self.opened.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(src) = opened.as_ref() {
            return Ok(Arc::clone(src));
        }
        let src: Arc<dyn BlobSource> = Arc::from((self.opener)()?);
        debug!("opened lazy blob source");
        *opened = Some(Arc::clone(&src));
        Ok(src)
    }
}

impl BlobSource for LazySource {
    fn reader(&self) -> BlobResult<Box<dyn Read + Send>> {
        self.source()?.reader()
    }

    fn get(&self) -> BlobResult<Bytes> {
        self.source()?.get()
    }

    fn release(&self) -> BlobResult<()> {
        let opened = self
            .opened
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match opened {
            Some(src) => src.release(),
            None => Ok(()),
        }
    }
}

impl std::fmt::Debug for LazySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazySource")
            .field("opened", &self.is_opened())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BlobError;
    use crate::memory::MemorySource;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn opens_once_on_first_access() {
        let opens = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&opens);
        let src = LazySource::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(MemorySource::new(&b"lazy"[..])) as Box<dyn BlobSource>)
        });
        assert_eq!(opens.load(Ordering::SeqCst), 0);
        assert!(!src.is_opened());

        assert_eq!(src.get().unwrap(), Bytes::from_static(b"lazy"));
        let mut out = Vec::new();
        src.reader().unwrap().read_to_end(&mut out).unwrap();
        assert_eq!(out, b"lazy");
        assert_eq!(opens.load(Ordering::SeqCst), 1);
        assert!(src.is_opened());
    }

    #[test]
    fn failed_open_is_not_memoized() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&attempts);
        let src = LazySource::new(move || {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(BlobError::open("backend unavailable"))
            } else {
                Ok(Box::new(MemorySource::new(&b"ok"[..])) as Box<dyn BlobSource>)
            }
        });
        assert!(matches!(src.get(), Err(BlobError::Open { .. })));
        assert_eq!(src.get().unwrap(), Bytes::from_static(b"ok"));
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }
}
