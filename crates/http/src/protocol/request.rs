//! Client-side HTTP requests.
//!
//! A [`Request`] is an immutable value. Its state lives behind a shared pointer that
//! is only copied when a `with_*` method actually changes something, so deriving a
//! request from another one is cheap and leaves the original intact.
//!
//! When the URI carries a host and no `Host` header was given, one is synthesized
//! from the URI and placed first among the headers:
//!
//! ```
//! use capsule_http::protocol::{HttpMessage, HttpRequest, Request};
//!
//! let request = Request::new("get", "http://example.org:8080/users?page=2").unwrap();
//! assert_eq!(request.method(), "GET");
//! assert_eq!(request.header_line("host"), "example.org:8080");
//! assert_eq!(request.request_target(), "/users?page=2");
//! ```

use http::Method;
use triomphe::Arc;

use super::{
    DEFAULT_VERSION, Headers, HttpError, HttpMessage, IntoHeaderValues, IntoUri, Message, MessageError, ProtocolVersion,
    Uri, UriError,
};
use crate::stream::Body;

pub(crate) fn parse_method(method: &str) -> Result<Method, MessageError> {
    Method::from_bytes(method.to_ascii_uppercase().as_bytes()).map_err(|_| MessageError::invalid_method(method))
}

/// Request line state shared by [`Request`] and [`ServerRequest`](super::ServerRequest).
#[derive(Debug, Clone)]
pub struct RequestHead {
    pub(crate) message: Message,
    method: Method,
    uri: Uri,
    request_target: Option<String>,
}

impl RequestHead {
    pub(crate) fn new(method: &str, uri: Uri, message: Message) -> Result<Self, MessageError> {
        let method = parse_method(method)?;
        let mut head = Self { message, method, uri, request_target: None };
        if !head.message.headers().contains("Host") {
            head.sync_host_header();
        }
        Ok(head)
    }

    fn sync_host_header(&mut self) {
        if !self.uri.host().is_empty() {
            self.message.set_host_header(self.uri.host(), self.uri.port());
        }
    }

    pub fn message(&self) -> &Message {
        &self.message
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// The explicit request target, or `path[?query]` with `/` standing in for an empty path.
    pub fn request_target(&self) -> String {
        if let Some(target) = self.request_target.as_ref().filter(|target| !target.is_empty()) {
            return target.clone();
        }

        let mut target = match self.uri.path() {
            "" => "/".to_string(),
            path => path.to_string(),
        };
        if !self.uri.query().is_empty() {
            target.push('?');
            target.push_str(self.uri.query());
        }
        target
    }
}

/// Request line accessors and copy-on-write updates.
pub trait HttpRequest: HttpMessage {
    fn head(&self) -> &RequestHead;

    fn head_mut(&mut self) -> &mut RequestHead;

    fn method(&self) -> &Method {
        &self.head().method
    }

    /// Replace the method. The name is upper-cased.
    fn with_method(&self, method: &str) -> Result<Self, MessageError> {
        let method = parse_method(method)?;
        let mut instance = self.clone();
        instance.head_mut().method = method;
        Ok(instance)
    }

    fn uri(&self) -> &Uri {
        &self.head().uri
    }

    /// Replace the URI.
    ///
    /// The `Host` header is rebuilt from the new URI when it has a host, unless
    /// `preserve_host` is set and a `Host` header is already present.
    fn with_uri(&self, uri: Uri, preserve_host: bool) -> Self {
        let mut instance = self.clone();
        let keep_host = preserve_host && self.has_header("Host");

        let head = instance.head_mut();
        head.uri = uri;
        if !keep_host {
            head.sync_host_header();
        }
        instance
    }

    fn request_target(&self) -> String {
        self.head().request_target()
    }

    fn with_request_target(&self, target: &str) -> Self {
        let mut instance = self.clone();
        instance.head_mut().request_target = Some(target.to_string());
        instance
    }
}

#[derive(Debug, Clone)]
pub struct Request {
    inner: Arc<RequestHead>,
}

impl Request {
    pub fn new<U: IntoUri>(method: &str, uri: U) -> Result<Self, HttpError> {
        Self::builder().method(method).uri(uri).build()
    }

    pub fn builder() -> RequestBuilder {
        RequestBuilder::default()
    }

    /// Whether both values share the same underlying state.
    pub fn ptr_eq(&self, other: &Request) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl HttpMessage for Request {
    fn message(&self) -> &Message {
        &self.inner.message
    }

    fn message_mut(&mut self) -> &mut Message {
        &mut Arc::make_mut(&mut self.inner).message
    }
}

impl HttpRequest for Request {
    fn head(&self) -> &RequestHead {
        &self.inner
    }

    fn head_mut(&mut self) -> &mut RequestHead {
        Arc::make_mut(&mut self.inner)
    }
}

#[derive(Debug)]
pub struct RequestBuilder {
    method: String,
    uri: Result<Uri, UriError>,
    headers: Headers,
    version: String,
    body: Body,
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self {
            method: Method::GET.to_string(),
            uri: Ok(Uri::default()),
            headers: Headers::new(),
            version: DEFAULT_VERSION.to_string(),
            body: Body::empty(),
        }
    }
}

impl RequestBuilder {
    pub fn method(mut self, method: &str) -> Self {
        self.method = method.to_string();
        self
    }

    pub fn uri<U: IntoUri>(mut self, uri: U) -> Self {
        self.uri = uri.into_uri();
        self
    }

    /// Add a header. Repeated names accumulate values.
    pub fn header<V: IntoHeaderValues>(mut self, name: &str, value: V) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: IntoHeaderValues,
    {
        for (name, value) in headers {
            self.headers.append(name.as_ref(), value);
        }
        self
    }

    pub fn version(mut self, version: &str) -> Self {
        self.version = version.to_string();
        self
    }

    pub fn body<B: Into<Body>>(mut self, body: B) -> Self {
        self.body = body.into();
        self
    }

    pub fn build(self) -> Result<Request, HttpError> {
        let head = self.build_head()?;
        Ok(Request { inner: Arc::new(head) })
    }

    pub(crate) fn build_head(self) -> Result<RequestHead, HttpError> {
        let uri = self.uri?;
        let version = ProtocolVersion::parse(&self.version)?;
        let message = Message::new(version, self.headers, self.body);
        Ok(RequestHead::new(&self.method, uri, message)?)
    }
}
