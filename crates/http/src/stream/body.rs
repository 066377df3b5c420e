use std::fmt;
use std::fs::File;
use std::io::SeekFrom;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use bytes::Bytes;
use http_body::{Frame, SizeHint};

use super::{BufferStream, CHUNK_SIZE, ResourceStream, Stream, StreamMetadata};
use crate::protocol::StreamError;
use crate::utils::lock;

/// A shared handle to the stream carrying a message body.
///
/// Cloning the handle does not copy the stream: every clone reads and writes the
/// same cursor. Use [`Body::ptr_eq`] to check whether two handles point at the same
/// stream.
#[derive(Clone)]
pub struct Body {
    stream: Arc<Mutex<Box<dyn Stream>>>,
}

impl Body {
    pub fn new<S: Stream + 'static>(stream: S) -> Self {
        Self { stream: Arc::new(Mutex::new(Box::new(stream))) }
    }

    pub fn empty() -> Self {
        Self::new(BufferStream::default())
    }

    pub fn ptr_eq(&self, other: &Body) -> bool {
        Arc::ptr_eq(&self.stream, &other.stream)
    }

    pub fn read(&self, len: usize) -> Result<Bytes, StreamError> {
        lock(&self.stream).read(len)
    }

    pub fn write(&self, buf: &[u8]) -> Result<usize, StreamError> {
        lock(&self.stream).write(buf)
    }

    pub fn is_readable(&self) -> bool {
        lock(&self.stream).is_readable()
    }

    pub fn is_writable(&self) -> bool {
        lock(&self.stream).is_writable()
    }

    pub fn is_seekable(&self) -> bool {
        lock(&self.stream).is_seekable()
    }

    pub fn seek(&self, pos: SeekFrom) -> Result<u64, StreamError> {
        lock(&self.stream).seek(pos)
    }

    pub fn rewind(&self) -> Result<(), StreamError> {
        lock(&self.stream).rewind()
    }

    pub fn tell(&self) -> Result<u64, StreamError> {
        lock(&self.stream).tell()
    }

    pub fn eof(&self) -> bool {
        lock(&self.stream).eof()
    }

    pub fn size(&self) -> Option<u64> {
        lock(&self.stream).size()
    }

    pub fn contents(&self) -> Result<Bytes, StreamError> {
        lock(&self.stream).contents()
    }

    pub fn close(&self) {
        lock(&self.stream).close();
    }

    pub fn detach(&self) -> Option<File> {
        lock(&self.stream).detach()
    }

    pub fn metadata(&self) -> StreamMetadata {
        lock(&self.stream).metadata()
    }
}

impl Default for Body {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.stream.try_lock() {
            Ok(stream) => f.debug_tuple("Body").field(&stream).finish(),
            Err(_) => f.debug_tuple("Body").field(&"<locked>").finish(),
        }
    }
}

impl From<BufferStream> for Body {
    fn from(stream: BufferStream) -> Self {
        Self::new(stream)
    }
}

impl From<ResourceStream> for Body {
    fn from(stream: ResourceStream) -> Self {
        Self::new(stream)
    }
}

impl From<&str> for Body {
    fn from(value: &str) -> Self {
        Self::new(BufferStream::from(value))
    }
}

impl From<String> for Body {
    fn from(value: String) -> Self {
        Self::new(BufferStream::from(value))
    }
}

impl From<Bytes> for Body {
    fn from(value: Bytes) -> Self {
        Self::new(BufferStream::from(value))
    }
}

impl From<Vec<u8>> for Body {
    fn from(value: Vec<u8>) -> Self {
        Self::new(BufferStream::from(Bytes::from(value)))
    }
}

/// Streams whatever is left to read, [`CHUNK_SIZE`] bytes per frame.
impl http_body::Body for Body {
    type Data = Bytes;
    type Error = StreamError;

    fn poll_frame(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let mut stream = lock(&self.stream);
        if stream.eof() {
            return Poll::Ready(None);
        }

        match stream.read(CHUNK_SIZE) {
            Ok(bytes) if bytes.is_empty() => Poll::Ready(None),
            Ok(bytes) => Poll::Ready(Some(Ok(Frame::data(bytes)))),
            Err(e) => Poll::Ready(Some(Err(e))),
        }
    }

    fn is_end_stream(&self) -> bool {
        lock(&self.stream).eof()
    }

    fn size_hint(&self) -> SizeHint {
        let stream = lock(&self.stream);
        match (stream.size(), stream.tell()) {
            (Some(size), Ok(position)) => SizeHint::with_exact(size.saturating_sub(position)),
            _ => SizeHint::default(),
        }
    }
}
