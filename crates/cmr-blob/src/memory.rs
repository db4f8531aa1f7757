use std::io::{Cursor, Read};

use bytes::Bytes;

use crate::error::BlobResult;
use crate::source::BlobSource;

/// Fixed in-memory content.
///
/// Readers share the underlying buffer; nothing is copied per read.
#[derive(Clone, Debug)]
pub struct MemorySource {
    data: Bytes,
}

impl MemorySource {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self { data: data.into() }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl BlobSource for MemorySource {
    fn reader(&self) -> BlobResult<Box<dyn Read + Send>> {
        Ok(Box::new(Cursor::new(self.data.clone())))
    }

    fn get(&self) -> BlobResult<Bytes> {
        Ok(self.data.clone())
    }
}
