use std::io::{Cursor, Read};
use std::sync::{Mutex, PoisonError};

use bytes::Bytes;

use crate::error::{BlobError, BlobResult};
use crate::source::BlobSource;

enum State {
    Pending(Box<dyn Read + Send>),
    Buffered(Bytes),
    Consumed,
}

/// A one-shot stream.
///
/// The first [`BlobSource::reader`] hands out the stream itself; later
/// readers fail with [`BlobError::Exhausted`]. A [`BlobSource::get`] before
/// that buffers the whole stream, after which both `get` and `reader` are
/// served from the buffer.
pub struct StreamSource {
    state: Mutex<State>,
}

impl StreamSource {
    pub fn new(reader: impl Read + Send + 'static) -> Self {
        Self {
            state: Mutex::new(State::Pending(Box::new(reader))),
        }
    }
}

impl BlobSource for StreamSource {
    fn reader(&self) -> BlobResult<Box<dyn Read + Send>> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        match std::mem::replace(&mut *state, State::Consumed) {
            State::Pending(r) => Ok(r),
            State::Buffered(data) => {
                *state = State::Buffered(data.clone());
                Ok(Box::new(Cursor::new(data)))
            }
            State::Consumed => Err(BlobError::Exhausted),
        }
    }

    fn get(&self) -> BlobResult<Bytes> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        match std::mem::replace(&mut *state, State::Consumed) {
            State::Pending(mut r) => {
                let mut buf = Vec::new();
                r.read_to_end(&mut buf)?;
                let data = Bytes::from(buf);
                *state = State::Buffered(data.clone());
                Ok(data)
            }
            State::Buffered(data) => {
                *state = State::Buffered(data.clone());
                Ok(data)
            }
            State::Consumed => Err(BlobError::Exhausted),
        }
    }
}

impl std::fmt::Debug for StreamSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match &*self.state.lock().unwrap_or_else(PoisonError::into_inner) {
            State::Pending(_) => "pending",
            State::Buffered(_) => "buffered",
            State::Consumed => "consumed",
        };
        f.debug_struct("StreamSource").field("state", &state).finish()
    }
}
