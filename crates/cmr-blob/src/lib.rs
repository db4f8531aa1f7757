//! Blob access for component model resolution.
//!
//! A [`BlobAccess`] is a handle to byte content with a declared media type.
//! Handles are reference counted: [`BlobAccess::dup`] creates another owner
//! of the same content, and the backend's release routine runs exactly once,
//! when the last owner closes.
//!
//! # Sources
//!
//! All content comes from a [`BlobSource`]:
//!
//! - [`MemorySource`] -- fixed in-memory bytes
//! - [`FileSource`] -- a file, reopened for every reader
//! - [`StreamSource`] -- a one-shot stream, buffered on first full read
//! - [`LazySource`] -- an injected backend opener, invoked on first access
//!
//! # Design Rules
//!
//! 1. The media type is fixed at construction and never triggers I/O.
//! 2. Lazy sources open on first `get`/`reader`, never at construction.
//! 3. `close` on a handle is idempotent; `Drop` closes an open handle.
//! 4. No operation retries or times out; that belongs to the backend.

pub mod access;
pub mod error;
pub mod file;
pub mod lazy;
pub mod memory;
pub mod source;
pub mod stream;

pub use access::BlobAccess;
pub use error::{BlobError, BlobResult};
pub use file::FileSource;
pub use lazy::LazySource;
pub use memory::MemorySource;
pub use source::BlobSource;
pub use stream::StreamSource;

/// Media type for opaque binary content.
pub const MIME_OCTET: &str = "application/octet-stream";
/// Media type for plain text.
pub const MIME_TEXT: &str = "text/plain";
/// Media type for JSON documents.
pub const MIME_JSON: &str = "application/json";
