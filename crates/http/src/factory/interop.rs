//! Conversions to and from the `http` crate.
//!
//! - `http::Request<Bytes>` into [`Request`] or [`ServerRequest`]
//! - [`Request`] into `http::Request<Body>` and [`Response`] into `http::Response<Body>`
//!
//! [`Body`] implements `http_body::Body`, so converted messages can be handed to
//! anything speaking the `http` / `http-body` interfaces. Header values that are
//! not valid UTF-8 are rejected. A custom reason phrase on a [`Response`] does not
//! survive the conversion since `http::Response` has no place for one.

use std::collections::BTreeMap;

use bytes::Bytes;
use http::header::{COOKIE, HeaderName, HeaderValue};
use http::{HeaderMap, StatusCode, Version};
use tracing::trace;

use crate::protocol::{
    Headers, HttpError, HttpMessage, HttpRequest, MessageError, ProtocolVersion, Request, RequestBody, Response,
    ServerRequest, Uri, UriError,
};
use crate::stream::Body;

fn headers_from_http(headers: &HeaderMap) -> Result<Headers, MessageError> {
    let mut converted = Headers::new();
    for (name, value) in headers {
        let value = value
            .to_str()
            .map_err(|e| MessageError::invalid_header(format!("header {name} is not valid utf-8: {e}")))?;
        converted.append(name.as_str(), value);
    }
    Ok(converted)
}

fn headers_into_http(headers: &Headers) -> Result<HeaderMap, MessageError> {
    let mut converted = HeaderMap::with_capacity(headers.len());
    for (name, values) in headers.iter() {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| MessageError::invalid_header(format!("invalid header name {name:?}: {e}")))?;
        for value in values {
            let header_value = HeaderValue::from_str(value)
                .map_err(|e| MessageError::invalid_header(format!("invalid value for header {name}: {e}")))?;
            converted.append(header_name.clone(), header_value);
        }
    }
    Ok(converted)
}

/// `name=value` pairs from every `Cookie` header. Later duplicates win.
fn cookies_from_http(headers: &HeaderMap) -> BTreeMap<String, String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .filter(|(name, _)| !name.is_empty())
        .map(|(name, value)| (name.to_string(), value.trim_matches('"').to_string()))
        .collect()
}

fn uri_from_http(uri: &http::Uri) -> Result<Uri, HttpError> {
    Ok(Uri::parse(&uri.to_string())?)
}

impl TryFrom<http::Request<Bytes>> for Request {
    type Error = HttpError;

    fn try_from(request: http::Request<Bytes>) -> Result<Self, Self::Error> {
        let (parts, body) = request.into_parts();
        let version = ProtocolVersion::try_from(parts.version)?;

        Request::builder()
            .method(parts.method.as_str())
            .uri(uri_from_http(&parts.uri)?)
            .headers(headers_from_http(&parts.headers)?.iter())
            .version(version.as_str())
            .body(body)
            .build()
    }
}

impl TryFrom<http::Request<Bytes>> for ServerRequest {
    type Error = HttpError;

    fn try_from(request: http::Request<Bytes>) -> Result<Self, Self::Error> {
        let (parts, body) = request.into_parts();
        let version = ProtocolVersion::try_from(parts.version)?;
        let cookies = cookies_from_http(&parts.headers);
        trace!(method = %parts.method, uri = %parts.uri, cookies = cookies.len(), "converting http request");

        ServerRequest::builder()
            .method(parts.method.as_str())
            .uri(uri_from_http(&parts.uri)?)
            .headers(headers_from_http(&parts.headers)?.iter())
            .version(version.as_str())
            .cookies(cookies)
            .body(RequestBody::Text(body))
            .build()
    }
}

impl TryFrom<&Request> for http::Request<Body> {
    type Error = HttpError;

    /// Requests whose URI has a host keep the absolute URI, others use the request target.
    fn try_from(request: &Request) -> Result<Self, Self::Error> {
        let uri = if request.uri().host().is_empty() {
            http::Uri::try_from(request.request_target())
                .map_err(|e| UriError::malformed(request.request_target(), e))?
        } else {
            http::Uri::try_from(request.uri())?
        };

        let mut converted = http::Request::new(request.body().clone());
        *converted.method_mut() = request.method().clone();
        *converted.uri_mut() = uri;
        *converted.version_mut() = Version::from(request.protocol_version());
        *converted.headers_mut() = headers_into_http(request.headers())?;
        Ok(converted)
    }
}

impl TryFrom<&Response> for http::Response<Body> {
    type Error = HttpError;

    fn try_from(response: &Response) -> Result<Self, Self::Error> {
        let mut converted = http::Response::new(response.body().clone());
        *converted.status_mut() = StatusCode::from(response.status());
        *converted.version_mut() = Version::from(response.protocol_version());
        *converted.headers_mut() = headers_into_http(response.headers())?;
        Ok(converted)
    }
}
