use triomphe::Arc;

use super::{DEFAULT_VERSION, Headers, HttpMessage, IntoHeaderValues, Message, MessageError, ProtocolVersion, ResponseStatus};
use crate::stream::Body;

#[derive(Debug, Clone)]
struct ResponseInner {
    message: Message,
    status: ResponseStatus,
    reason_phrase: String,
}

/// An immutable HTTP response.
///
/// The status code must be one of [`ResponseStatus`]. Without an explicit reason
/// phrase the standard phrase of the status is used.
#[derive(Debug, Clone)]
pub struct Response {
    inner: Arc<ResponseInner>,
}

fn reason_or_default(status: ResponseStatus, reason: Option<&str>) -> String {
    match reason {
        Some(reason) if !reason.is_empty() => reason.to_string(),
        _ => status.phrase().to_string(),
    }
}

impl Response {
    pub fn new(code: u16) -> Result<Self, MessageError> {
        Self::builder().status(code).build()
    }

    pub fn builder() -> ResponseBuilder {
        ResponseBuilder::default()
    }

    pub fn status(&self) -> ResponseStatus {
        self.inner.status
    }

    pub fn status_code(&self) -> u16 {
        self.inner.status.code()
    }

    pub fn reason_phrase(&self) -> &str {
        &self.inner.reason_phrase
    }

    /// Replace the status. An absent or empty reason phrase falls back to the standard one.
    pub fn with_status(&self, code: u16, reason: Option<&str>) -> Result<Self, MessageError> {
        let status = ResponseStatus::try_from(code)?;
        let mut instance = self.clone();
        let inner = Arc::make_mut(&mut instance.inner);
        inner.status = status;
        inner.reason_phrase = reason_or_default(status, reason);
        Ok(instance)
    }

    pub fn ptr_eq(&self, other: &Response) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl HttpMessage for Response {
    fn message(&self) -> &Message {
        &self.inner.message
    }

    fn message_mut(&mut self) -> &mut Message {
        &mut Arc::make_mut(&mut self.inner).message
    }
}

impl From<ResponseStatus> for Response {
    fn from(status: ResponseStatus) -> Self {
        Response {
            inner: Arc::new(ResponseInner {
                message: Message::default(),
                status,
                reason_phrase: status.phrase().to_string(),
            }),
        }
    }
}

#[derive(Debug)]
pub struct ResponseBuilder {
    status: u16,
    reason_phrase: Option<String>,
    headers: Headers,
    version: String,
    body: Body,
}

impl Default for ResponseBuilder {
    fn default() -> Self {
        Self {
            status: ResponseStatus::Ok.code(),
            reason_phrase: None,
            headers: Headers::new(),
            version: DEFAULT_VERSION.to_string(),
            body: Body::empty(),
        }
    }
}

impl ResponseBuilder {
    pub fn status<S: Into<u16>>(mut self, status: S) -> Self {
        self.status = status.into();
        self
    }

    pub fn reason_phrase(mut self, reason: &str) -> Self {
        self.reason_phrase = Some(reason.to_string());
        self
    }

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

    pub fn build(self) -> Result<Response, MessageError> {
        let status = ResponseStatus::try_from(self.status)?;
        let version = ProtocolVersion::parse(&self.version)?;

        Ok(Response {
            inner: Arc::new(ResponseInner {
                message: Message::new(version, self.headers, self.body),
                status,
                reason_phrase: reason_or_default(status, self.reason_phrase.as_deref()),
            }),
        })
    }
}
