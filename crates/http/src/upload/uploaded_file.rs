use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use super::UploadErrorCode;
use crate::protocol::UploadError;
use crate::stream::{Body, CHUNK_SIZE, ResourceStream};
use crate::utils::{ensure, lock};

fn is_same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

#[derive(Debug)]
enum Source {
    Stream,
    Path(PathBuf),
}

#[derive(Debug)]
struct UploadState {
    stream: Option<Body>,
    moved: bool,
}

#[derive(Debug)]
struct UploadedFileInner {
    source: Source,
    client_filename: Option<String>,
    client_media_type: Option<String>,
    size: Option<u64>,
    error: UploadErrorCode,
    state: Mutex<UploadState>,
}

/// A file received in a request.
///
/// Clones share state: moving one clone makes every clone unusable.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    inner: Arc<UploadedFileInner>,
}

impl UploadedFile {
    /// An upload whose content is already available as a stream.
    pub fn from_stream<B: Into<Body>>(stream: B) -> UploadedFileBuilder {
        UploadedFileBuilder::new(Source::Stream, Some(stream.into()))
    }

    /// An upload stored at `path`, opened read-only on first use.
    pub fn from_path<P: Into<PathBuf>>(path: P) -> UploadedFileBuilder {
        UploadedFileBuilder::new(Source::Path(path.into()), None)
    }

    pub fn client_filename(&self) -> Option<&str> {
        self.inner.client_filename.as_deref()
    }

    pub fn client_media_type(&self) -> Option<&str> {
        self.inner.client_media_type.as_deref()
    }

    pub fn size(&self) -> Option<u64> {
        self.inner.size
    }

    pub fn error(&self) -> UploadErrorCode {
        self.inner.error
    }

    pub fn is_moved(&self) -> bool {
        lock(&self.inner.state).moved
    }

    fn check_usable(&self, state: &UploadState) -> Result<(), UploadError> {
        ensure!(self.inner.error.is_ok(), UploadError::unusable(self.inner.error));
        ensure!(!state.moved, UploadError::unusable("the file has already been moved"));
        Ok(())
    }

    fn open_stream(&self, state: &mut UploadState) -> Result<Body, UploadError> {
        if let Some(stream) = &state.stream {
            return Ok(stream.clone());
        }

        let stream = match &self.inner.source {
            Source::Path(path) => Body::from(ResourceStream::open(path, "r")?),
            Source::Stream => return Err(UploadError::unusable("the stream is no longer available")),
        };
        state.stream = Some(stream.clone());
        Ok(stream)
    }

    /// The upload content. Every call returns a handle to the same stream.
    pub fn stream(&self) -> Result<Body, UploadError> {
        let mut state = lock(&self.inner.state);
        self.check_usable(&state)?;
        self.open_stream(&mut state)
    }

    /// Copy the upload to `target` and release it. Only the first successful call does anything,
    /// later calls fail with [`UploadError::Unusable`].
    pub fn move_to<P: AsRef<Path>>(&self, target: P) -> Result<(), UploadError> {
        let target = target.as_ref();
        let mut state = lock(&self.inner.state);
        self.check_usable(&state)?;
        ensure!(!target.as_os_str().is_empty(), UploadError::EmptyTarget);

        if let Source::Path(path) = &self.inner.source
            && is_same_file(path, target)
        {
            state.moved = true;
            if let Some(stream) = state.stream.take() {
                stream.close();
            }
            debug!(destination = %target.display(), "uploaded file is already at its destination");
            return Ok(());
        }

        let stream = self.open_stream(&mut state)?;
        let mut output = File::create(target)?;

        if stream.is_seekable() {
            stream.rewind()?;
        }

        let mut written = 0u64;
        while !stream.eof() {
            let chunk = stream.read(CHUNK_SIZE)?;
            if chunk.is_empty() {
                break;
            }
            output.write_all(&chunk)?;
            written += chunk.len() as u64;
        }
        output.flush()?;

        state.moved = true;
        stream.close();
        state.stream = None;

        if let Source::Path(path) = &self.inner.source
            && let Err(e) = fs::remove_file(path)
        {
            warn!(path = %path.display(), cause = %e, "failed to remove moved upload");
        }

        debug!(destination = %target.display(), bytes = written, "moved uploaded file");
        Ok(())
    }
}

#[derive(Debug)]
pub struct UploadedFileBuilder {
    source: Source,
    stream: Option<Body>,
    client_filename: Option<String>,
    client_media_type: Option<String>,
    size: Option<u64>,
    error: UploadErrorCode,
}

impl UploadedFileBuilder {
    fn new(source: Source, stream: Option<Body>) -> Self {
        Self { source, stream, client_filename: None, client_media_type: None, size: None, error: UploadErrorCode::Ok }
    }

    pub fn client_filename<S: Into<String>>(mut self, filename: S) -> Self {
        self.client_filename = Some(filename.into());
        self
    }

    pub fn client_media_type<S: Into<String>>(mut self, media_type: S) -> Self {
        self.client_media_type = Some(media_type.into());
        self
    }

    /// Size as reported by the client. Defaults to the size of the stream or file.
    pub fn size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    pub fn error(mut self, error: UploadErrorCode) -> Self {
        self.error = error;
        self
    }

    pub fn build(self) -> UploadedFile {
        let size = self.size.or_else(|| match (&self.source, &self.stream) {
            (_, Some(stream)) => stream.size(),
            (Source::Path(path), None) => fs::metadata(path).ok().map(|metadata| metadata.len()),
            (Source::Stream, None) => None,
        });

        UploadedFile {
            inner: Arc::new(UploadedFileInner {
                source: self.source,
                client_filename: self.client_filename,
                client_media_type: self.client_media_type,
                size,
                error: self.error,
                state: Mutex::new(UploadState { stream: self.stream, moved: false }),
            }),
        }
    }
}
