//! Thin constructors for every value type.
//!
//! The factories are stateless unit structs, useful where a component should be
//! handed "something that makes requests" rather than a concrete constructor.
//! [`interop`] converts between these types and the `http` crate.

use std::fs::File;
use std::path::Path;

use serde_json::Value;

use crate::protocol::{
    HttpError, IntoUri, MessageError, Params, Request, Response, ServerRequest, StreamError, UploadError, Uri, UriError,
};
use crate::stream::{Body, BufferStream, ResourceStream};
use crate::upload::{UploadErrorCode, UploadedFile, UploadedFiles, normalize_specs};

pub mod interop;

#[derive(Debug, Default, Clone, Copy)]
pub struct UriFactory;

impl UriFactory {
    /// Parse a URI. No scheme is assumed when the input has none.
    pub fn create_uri(uri: &str) -> Result<Uri, UriError> {
        Uri::parse(uri)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct StreamFactory;

impl StreamFactory {
    /// A temporary file holding `content`, positioned at the start.
    pub fn create_stream<C: AsRef<[u8]>>(content: C) -> Result<Body, StreamError> {
        let body = Body::from(ResourceStream::temp()?);
        body.write(content.as_ref())?;
        body.rewind()?;
        Ok(body)
    }

    /// An in-memory stream holding `content`.
    pub fn create_from_string<C: AsRef<[u8]>>(content: C) -> Body {
        Body::from(BufferStream::new(content))
    }

    pub fn create_from_file<P: AsRef<Path>>(path: P, mode: &str) -> Result<Body, StreamError> {
        Ok(Body::from(ResourceStream::open(path, mode)?))
    }

    /// Wrap a handle that was opened with `mode`.
    pub fn create_from_resource(file: File, mode: &str) -> Result<Body, StreamError> {
        Ok(Body::from(ResourceStream::new(file, mode.parse()?)?))
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RequestFactory;

impl RequestFactory {
    pub fn create_request<U: IntoUri>(method: &str, uri: U) -> Result<Request, HttpError> {
        Request::new(method, uri)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ResponseFactory;

impl ResponseFactory {
    /// An empty reason phrase selects the standard one.
    pub fn create_response(code: u16, reason_phrase: &str) -> Result<Response, MessageError> {
        Response::builder().status(code).reason_phrase(reason_phrase).build()
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ServerRequestFactory;

impl ServerRequestFactory {
    pub fn create_server_request<U: IntoUri>(
        method: &str,
        uri: U,
        server_params: Params,
    ) -> Result<ServerRequest, HttpError> {
        ServerRequest::builder().method(method).uri(uri).server_params(server_params).build()
    }

    /// Convert a request received through the `http` crate. The body is decoded as
    /// described in [`ServerRequest`](crate::protocol::server_request), cookies are
    /// read from the `Cookie` header.
    pub fn create_from_http(request: http::Request<bytes::Bytes>) -> Result<ServerRequest, HttpError> {
        ServerRequest::try_from(request)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct UploadedFileFactory;

impl UploadedFileFactory {
    pub fn create_uploaded_file(
        stream: Body,
        size: Option<u64>,
        error: UploadErrorCode,
        client_filename: Option<&str>,
        client_media_type: Option<&str>,
    ) -> UploadedFile {
        let mut builder = UploadedFile::from_stream(stream).error(error);
        if let Some(size) = size {
            builder = builder.size(size);
        }
        if let Some(filename) = client_filename {
            builder = builder.client_filename(filename);
        }
        if let Some(media_type) = client_media_type {
            builder = builder.client_media_type(media_type);
        }
        builder.build()
    }

    /// One upload from a single upload description
    /// (`{"tmp_name": ..., "size": ..., "error": ..., "name": ..., "type": ...}`).
    pub fn create_from_spec(spec: &Value) -> Result<UploadedFile, UploadError> {
        let spec = spec.as_object().ok_or_else(|| UploadError::malformed_spec("expected a file specification"))?;
        crate::upload::file_from_spec(spec)
    }

    /// A whole upload tree, see [`normalize_specs`].
    pub fn create_from_specs(specs: &Value) -> Result<UploadedFiles, UploadError> {
        normalize_specs(specs)
    }
}
