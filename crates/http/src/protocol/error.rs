use std::io;
use thiserror::Error;

use crate::protocol::ResponseStatus;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("message error: {source}")]
    MessageError {
        #[from]
        source: MessageError,
    },

    #[error("uri error: {source}")]
    UriError {
        #[from]
        source: UriError,
    },

    #[error("stream error: {source}")]
    StreamError {
        #[from]
        source: StreamError,
    },

    #[error("upload error: {source}")]
    UploadError {
        #[from]
        source: UploadError,
    },
}

impl HttpError {
    /// The status a server consuming this library should answer with when this error
    /// escapes request handling.
    ///
    /// Failures while building a message from client input map to `400 Bad Request`.
    /// Stream, upload, encoding and response status failures map to `500 Internal Server Error`.
    pub fn response_status(&self) -> ResponseStatus {
        match self {
            HttpError::MessageError { source: MessageError::UnknownStatusCode(_) | MessageError::Encode { .. } } => {
                ResponseStatus::InternalServerError
            }
            HttpError::MessageError { .. } | HttpError::UriError { .. } => ResponseStatus::BadRequest,
            HttpError::StreamError { .. } | HttpError::UploadError { .. } => ResponseStatus::InternalServerError,
        }
    }
}

#[derive(Error, Debug)]
pub enum MessageError {
    #[error("invalid protocol version {version}")]
    InvalidVersion { version: String },

    #[error("invalid http method {method}")]
    InvalidMethod { method: String },

    #[error("unknown status code {0}")]
    UnknownStatusCode(u16),

    #[error("invalid header: {reason}")]
    InvalidHeader { reason: String },

    #[error("cannot deserialize params: {reason}")]
    Deserialize { reason: String },

    #[error("cannot encode body: {reason}")]
    Encode { reason: String },
}

impl MessageError {
    pub fn invalid_version<S: ToString>(version: S) -> Self {
        Self::InvalidVersion { version: version.to_string() }
    }

    pub fn invalid_method<S: ToString>(method: S) -> Self {
        Self::InvalidMethod { method: method.to_string() }
    }

    pub fn invalid_header<S: ToString>(str: S) -> Self {
        Self::InvalidHeader { reason: str.to_string() }
    }

    pub fn deserialize<S: ToString>(str: S) -> Self {
        Self::Deserialize { reason: str.to_string() }
    }

    pub fn encode<S: ToString>(str: S) -> Self {
        Self::Encode { reason: str.to_string() }
    }
}

#[derive(Error, Debug)]
pub enum UriError {
    #[error("malformed uri {uri:?}: {reason}")]
    MalformedUri { uri: String, reason: String },
}

impl UriError {
    pub fn malformed<U: ToString, S: ToString>(uri: U, reason: S) -> Self {
        Self::MalformedUri { uri: uri.to_string(), reason: reason.to_string() }
    }
}

#[derive(Error, Debug)]
pub enum StreamError {
    #[error("underlying resource has been detached")]
    Detached,

    #[error("stream is not seekable")]
    NotSeekable,

    #[error("stream is not readable")]
    NotReadable,

    #[error("stream is not writable")]
    NotWritable,

    #[error("invalid resource: {reason}")]
    InvalidResource { reason: String },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl StreamError {
    pub fn invalid_resource<S: ToString>(str: S) -> Self {
        Self::InvalidResource { reason: str.to_string() }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }
}

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("uploaded file is unusable: {reason}")]
    Unusable { reason: String },

    #[error("target path is empty")]
    EmptyTarget,

    #[error("malformed file upload specification: {reason}")]
    MalformedSpec { reason: String },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },

    #[error("stream error: {source}")]
    Stream {
        #[from]
        source: StreamError,
    },
}

impl UploadError {
    pub fn unusable<S: ToString>(str: S) -> Self {
        Self::Unusable { reason: str.to_string() }
    }

    pub fn malformed_spec<S: ToString>(str: S) -> Self {
        Self::MalformedSpec { reason: str.to_string() }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }
}
