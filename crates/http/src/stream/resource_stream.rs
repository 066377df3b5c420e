use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use bytes::Bytes;
use tracing::trace;

use super::{OpenMode, Stream, StreamMetadata};
use crate::protocol::StreamError;
use crate::utils::ensure;

/// A stream over an OS file handle.
///
/// The stream owns the handle until it is closed or detached. Regular files are
/// seekable; anything else (pipes, character devices) is read and written in order.
#[derive(Debug)]
pub struct ResourceStream {
    file: Option<File>,
    mode: OpenMode,
    seekable: bool,
    hit_eof: bool,
}

impl ResourceStream {
    /// Wrap an already opened handle. `mode` must describe how it was opened.
    pub fn new(file: File, mode: OpenMode) -> Result<Self, StreamError> {
        let metadata = file.metadata()?;
        ensure!(!metadata.is_dir(), StreamError::invalid_resource("a directory handle is not a stream"));

        Ok(Self { file: Some(file), mode, seekable: metadata.is_file(), hit_eof: false })
    }

    pub fn open<P: AsRef<Path>>(path: P, mode: &str) -> Result<Self, StreamError> {
        let path = path.as_ref();
        let mode: OpenMode = mode.parse()?;
        let file = mode.open_options().open(path)?;
        trace!(path = %path.display(), %mode, "opened resource stream");
        Self::new(file, mode)
    }

    /// An anonymous temporary file opened for reading and writing, removed once released.
    pub fn temp() -> Result<Self, StreamError> {
        let file = tempfile::tempfile()?;
        Self::new(file, OpenMode::WRITE_READ)
    }

    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    fn file(&self) -> Result<&File, StreamError> {
        self.file.as_ref().ok_or(StreamError::Detached)
    }
}

impl Stream for ResourceStream {
    fn read(&mut self, len: usize) -> Result<Bytes, StreamError> {
        let file = self.file()?;
        ensure!(self.mode.is_readable(), StreamError::NotReadable);

        // fills up to `len` without allocating it up front
        let limit = u64::try_from(len).unwrap_or(u64::MAX);
        let mut buf = Vec::new();
        let n = file.take(limit).read_to_end(&mut buf)?;
        if n < len {
            self.hit_eof = true;
        }
        Ok(Bytes::from(buf))
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize, StreamError> {
        let mut file = self.file()?;
        ensure!(self.mode.is_writable(), StreamError::NotWritable);

        file.write_all(buf)?;
        Ok(buf.len())
    }

    fn is_readable(&self) -> bool {
        self.file.is_some() && self.mode.is_readable()
    }

    fn is_writable(&self) -> bool {
        self.file.is_some() && self.mode.is_writable()
    }

    fn is_seekable(&self) -> bool {
        self.file.is_some() && self.seekable
    }

    fn seek(&mut self, pos: SeekFrom) -> Result<u64, StreamError> {
        let mut file = self.file()?;
        ensure!(self.seekable, StreamError::NotSeekable);

        let position = file.seek(pos)?;
        self.hit_eof = false;
        Ok(position)
    }

    fn tell(&self) -> Result<u64, StreamError> {
        let mut file = self.file()?;
        Ok(file.stream_position()?)
    }

    fn eof(&self) -> bool {
        let Some(mut file) = self.file.as_ref() else {
            return true;
        };

        if !self.seekable {
            return self.hit_eof;
        }

        match (file.stream_position(), self.size()) {
            (Ok(position), Some(size)) => position >= size,
            _ => self.hit_eof,
        }
    }

    fn size(&self) -> Option<u64> {
        let metadata = self.file.as_ref()?.metadata().ok()?;
        metadata.is_file().then(|| metadata.len())
    }

    fn contents(&mut self) -> Result<Bytes, StreamError> {
        let mut file = self.file()?;
        ensure!(self.mode.is_readable(), StreamError::NotReadable);

        if self.seekable {
            file.rewind()?;
        }

        let mut buf = Vec::new();
        file.read_to_end(&mut buf)?;
        self.hit_eof = true;
        Ok(Bytes::from(buf))
    }

    fn close(&mut self) {
        if self.file.take().is_some() {
            trace!(mode = %self.mode, "closed resource stream");
        }
    }

    fn detach(&mut self) -> Option<File> {
        self.file.take()
    }

    fn metadata(&self) -> StreamMetadata {
        if self.file.is_none() {
            return StreamMetadata::default();
        }

        StreamMetadata {
            mode: Some(self.mode),
            seekable: self.seekable,
            readable: self.mode.is_readable(),
            writable: self.mode.is_writable(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn stream_with(content: &str) -> ResourceStream {
        let mut stream = ResourceStream::temp().unwrap();
        stream.write(content.as_bytes()).unwrap();
        stream.rewind().unwrap();
        stream
    }

    #[test]
    fn test_read_and_tell() {
        let mut stream = stream_with("Capsule!");

        assert_eq!(stream.read(2).unwrap(), "Ca");
        assert_eq!(stream.tell().unwrap(), 2);
        assert!(!stream.eof());
        assert_eq!(stream.read(100).unwrap(), "psule!");
        assert!(stream.eof());
        assert_eq!(stream.size(), Some(8));
    }

    #[test]
    fn test_read_unbounded_length() {
        let mut stream = stream_with("Capsule!");
        stream.read(1).unwrap();

        assert_eq!(stream.read(usize::MAX).unwrap(), "apsule!");
        assert!(stream.eof());
        assert_eq!(stream.read(usize::MAX).unwrap(), "");
    }

    #[test]
    fn test_contents_rewinds() {
        let mut stream = stream_with("Capsule!");
        stream.read(4).unwrap();

        assert_eq!(stream.contents().unwrap(), "Capsule!");
        assert!(stream.eof());
    }

    #[test]
    fn test_seek() {
        let mut stream = stream_with("Capsule!");

        assert_eq!(stream.seek(SeekFrom::Start(3)).unwrap(), 3);
        assert_eq!(stream.read(4).unwrap(), "sule");
        assert_eq!(stream.seek(SeekFrom::End(-1)).unwrap(), 7);
        assert_eq!(stream.read(1).unwrap(), "!");
    }

    #[test]
    fn test_mode_governs_access() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("body.txt");
        fs::write(&path, "Capsule!").unwrap();

        let mut read_only = ResourceStream::open(&path, "r").unwrap();
        assert!(read_only.is_readable());
        assert!(!read_only.is_writable());
        assert!(matches!(read_only.write(b"x"), Err(StreamError::NotWritable)));

        let mut write_only = ResourceStream::open(&path, "w").unwrap();
        assert!(!write_only.is_readable());
        assert!(matches!(write_only.read(1), Err(StreamError::NotReadable)));
        assert_eq!(write_only.write(b"truncated").unwrap(), 9);
        drop(write_only);

        assert_eq!(fs::read_to_string(&path).unwrap(), "truncated");
    }

    #[test]
    fn test_directory_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let file = File::open(dir.path()).unwrap();

        let result = ResourceStream::new(file, OpenMode::READ);
        assert!(matches!(result, Err(StreamError::InvalidResource { .. })));
    }

    #[test]
    fn test_unknown_mode_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let result = ResourceStream::open(dir.path().join("body.txt"), "z+");
        assert!(matches!(result, Err(StreamError::InvalidResource { .. })));
    }

    #[test]
    fn test_detach_returns_handle() {
        let mut stream = stream_with("Capsule!");
        let mut file = stream.detach().unwrap();

        let mut content = String::new();
        file.rewind().unwrap();
        file.read_to_string(&mut content).unwrap();
        assert_eq!(content, "Capsule!");

        assert!(matches!(stream.read(1), Err(StreamError::Detached)));
        assert!(matches!(stream.write(b"x"), Err(StreamError::Detached)));
        assert!(matches!(stream.tell(), Err(StreamError::Detached)));
        assert!(matches!(stream.contents(), Err(StreamError::Detached)));
        assert!(matches!(stream.seek(SeekFrom::Start(0)), Err(StreamError::Detached)));
        assert_eq!(stream.size(), None);
        assert!(!stream.is_readable());
        assert!(!stream.is_writable());
        assert!(stream.detach().is_none());
    }

    #[test]
    fn test_metadata() {
        let mut stream = stream_with("Capsule!");
        let metadata = stream.metadata();

        assert_eq!(metadata.mode.map(|mode| mode.to_string()), Some("w+".to_string()));
        assert!(metadata.seekable);
        assert!(metadata.readable);
        assert!(metadata.writable);

        stream.close();
        assert_eq!(stream.metadata(), StreamMetadata::default());
    }
}
