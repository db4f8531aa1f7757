use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use bytes::Bytes;

use crate::error::BlobResult;
use crate::source::BlobSource;

/// Content of a file on disk.
///
/// The file is opened per reader, so reading is repeatable and nothing is
/// held open between reads.
#[derive(Clone, Debug)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BlobSource for FileSource {
    fn reader(&self) -> BlobResult<Box<dyn Read + Send>> {
        Ok(Box::new(File::open(&self.path)?))
    }

    fn get(&self) -> BlobResult<Bytes> {
        Ok(Bytes::from(std::fs::read(&self.path)?))
    }
}
