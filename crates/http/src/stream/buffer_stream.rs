use std::fs::File;
use std::io::SeekFrom;

use bytes::{Bytes, BytesMut};

use super::{Stream, StreamMetadata};
use crate::protocol::StreamError;

/// An in-memory stream.
///
/// Reading consumes bytes from the front of the buffer, so [`tell`](Stream::tell)
/// stays at zero and [`size`](Stream::size) is whatever has not been read yet.
/// The buffer cannot seek.
#[derive(Debug)]
pub struct BufferStream {
    buffer: Option<BytesMut>,
}

impl Default for BufferStream {
    fn default() -> Self {
        Self { buffer: Some(BytesMut::new()) }
    }
}

impl BufferStream {
    pub fn new<B: AsRef<[u8]>>(content: B) -> Self {
        Self { buffer: Some(BytesMut::from(content.as_ref())) }
    }

    fn buffer_mut(&mut self) -> Result<&mut BytesMut, StreamError> {
        self.buffer.as_mut().ok_or(StreamError::Detached)
    }
}

impl Stream for BufferStream {
    fn read(&mut self, len: usize) -> Result<Bytes, StreamError> {
        let buffer = self.buffer_mut()?;
        let len = len.min(buffer.len());
        Ok(buffer.split_to(len).freeze())
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize, StreamError> {
        self.buffer_mut()?.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn is_readable(&self) -> bool {
        self.buffer.is_some()
    }

    fn is_writable(&self) -> bool {
        self.buffer.is_some()
    }

    fn is_seekable(&self) -> bool {
        false
    }

    fn seek(&mut self, _pos: SeekFrom) -> Result<u64, StreamError> {
        self.buffer_mut()?;
        Err(StreamError::NotSeekable)
    }

    fn tell(&self) -> Result<u64, StreamError> {
        self.buffer.as_ref().map(|_| 0).ok_or(StreamError::Detached)
    }

    fn eof(&self) -> bool {
        self.buffer.as_ref().is_none_or(BytesMut::is_empty)
    }

    fn size(&self) -> Option<u64> {
        self.buffer.as_ref().map(|buffer| buffer.len() as u64)
    }

    fn contents(&mut self) -> Result<Bytes, StreamError> {
        Ok(self.buffer_mut()?.split().freeze())
    }

    fn close(&mut self) {
        if let Some(buffer) = self.buffer.as_mut() {
            buffer.clear();
        }
    }

    fn detach(&mut self) -> Option<File> {
        self.buffer = None;
        None
    }

    fn metadata(&self) -> StreamMetadata {
        StreamMetadata::default()
    }
}

impl From<&str> for BufferStream {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for BufferStream {
    fn from(value: String) -> Self {
        Self { buffer: Some(BytesMut::from(value.as_bytes())) }
    }
}

impl From<Bytes> for BufferStream {
    fn from(value: Bytes) -> Self {
        Self { buffer: Some(BytesMut::from(value)) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_consumes_from_front() {
        let mut stream = BufferStream::new("Capsule!");

        assert_eq!(stream.read(2).unwrap(), "Ca");
        assert_eq!(stream.size(), Some(6));
        assert_eq!(stream.tell().unwrap(), 0);
        assert_eq!(stream.contents().unwrap(), "psule!");
        assert!(stream.eof());
        assert_eq!(stream.size(), Some(0));
    }

    #[test]
    fn test_read_past_end() {
        let mut stream = BufferStream::new("ok");
        assert_eq!(stream.read(100).unwrap(), "ok");
        assert_eq!(stream.read(100).unwrap(), "");
        assert!(stream.eof());
    }

    #[test]
    fn test_write_appends() {
        let mut stream = BufferStream::new("Hello");
        assert_eq!(stream.write(b", world").unwrap(), 7);
        assert_eq!(stream.contents().unwrap(), "Hello, world");
    }

    #[test]
    fn test_not_seekable() {
        let mut stream = BufferStream::new("Capsule!");
        assert!(!stream.is_seekable());
        assert!(matches!(stream.seek(SeekFrom::Start(0)), Err(StreamError::NotSeekable)));
        assert!(matches!(stream.rewind(), Err(StreamError::NotSeekable)));
    }

    #[test]
    fn test_close_empties_without_detaching() {
        let mut stream = BufferStream::new("Capsule!");
        stream.close();

        assert!(stream.eof());
        assert!(stream.is_readable());
        assert_eq!(stream.size(), Some(0));
        assert_eq!(stream.contents().unwrap(), "");
    }

    #[test]
    fn test_detached() {
        let mut stream = BufferStream::new("Capsule!");
        assert!(stream.detach().is_none());

        assert!(matches!(stream.read(1), Err(StreamError::Detached)));
        assert!(matches!(stream.write(b"x"), Err(StreamError::Detached)));
        assert!(matches!(stream.tell(), Err(StreamError::Detached)));
        assert!(matches!(stream.contents(), Err(StreamError::Detached)));
        assert!(matches!(stream.seek(SeekFrom::Start(0)), Err(StreamError::Detached)));
        assert_eq!(stream.size(), None);
        assert!(!stream.is_readable());
        assert!(!stream.is_writable());
        assert!(stream.eof());
        assert_eq!(stream.metadata(), StreamMetadata::default());
    }
}
