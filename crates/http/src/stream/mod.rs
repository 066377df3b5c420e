//! Byte streams backing message bodies.
//!
//! Every message body is a [`Stream`]. Two implementations are provided:
//!
//! - [`BufferStream`]: an in-memory buffer, consumed as it is read
//! - [`ResourceStream`]: an OS file handle opened with an fopen style [`OpenMode`]
//!
//! Messages do not hold a stream directly. They hold a [`Body`], a cloneable handle
//! that shares a single stream between every message derived from the same original,
//! so reading the body of one copy advances the cursor seen by all of them.
//!
//! A stream is either attached or detached. Detaching (or closing a [`ResourceStream`])
//! is terminal: reads, writes, `tell`, `seek` and `contents` fail with
//! [`StreamError::Detached`] afterwards.

use std::fmt::Debug;
use std::fs::File;
use std::io::SeekFrom;

use bytes::Bytes;

use crate::protocol::StreamError;

mod body;
pub use body::Body;

mod buffer_stream;
pub use buffer_stream::BufferStream;

mod open_mode;
pub use open_mode::ModeKind;
pub use open_mode::OpenMode;

mod resource_stream;
pub use resource_stream::ResourceStream;

/// Chunk size used when copying a stream elsewhere.
pub const CHUNK_SIZE: usize = 8192;

pub trait Stream: Send + Debug {
    /// Read up to `len` bytes. An empty result means nothing is left.
    fn read(&mut self, len: usize) -> Result<Bytes, StreamError>;

    fn write(&mut self, buf: &[u8]) -> Result<usize, StreamError>;

    fn is_readable(&self) -> bool;

    fn is_writable(&self) -> bool;

    fn is_seekable(&self) -> bool;

    fn seek(&mut self, pos: SeekFrom) -> Result<u64, StreamError>;

    fn rewind(&mut self) -> Result<(), StreamError> {
        self.seek(SeekFrom::Start(0)).map(|_| ())
    }

    fn tell(&self) -> Result<u64, StreamError>;

    /// True when nothing more can be read. Always true once detached.
    fn eof(&self) -> bool;

    /// Size in bytes, `None` when unknown or detached.
    fn size(&self) -> Option<u64>;

    /// Everything that is left to read.
    fn contents(&mut self) -> Result<Bytes, StreamError>;

    fn close(&mut self);

    /// Give up the underlying resource, if there is one. The stream is unusable afterwards.
    fn detach(&mut self) -> Option<File>;

    fn metadata(&self) -> StreamMetadata;
}

/// What is known about the resource under a stream. Empty for in-memory and detached streams.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamMetadata {
    pub mode: Option<OpenMode>,
    pub seekable: bool,
    pub readable: bool,
    pub writable: bool,
}
