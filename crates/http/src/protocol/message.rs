use tracing::trace;

use super::{Headers, IntoHeaderValues, MessageError, ProtocolVersion};
use crate::stream::Body;

/// State shared by every message kind: protocol version, headers and body.
#[derive(Debug, Clone, Default)]
pub struct Message {
    version: ProtocolVersion,
    headers: Headers,
    body: Body,
}

impl Message {
    pub fn new(version: ProtocolVersion, headers: Headers, body: Body) -> Self {
        Self { version, headers, body }
    }

    pub fn version(&self) -> ProtocolVersion {
        self.version
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    /// Replace any `Host` header with `host[:port]` at the front of the header list.
    pub(crate) fn set_host_header(&mut self, host: &str, port: Option<u16>) {
        let value = match port {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };
        trace!(host = %value, "synthesized host header");
        self.headers.set_first("Host", value);
    }
}

/// Read access and copy-on-write updates shared by requests, server requests and responses.
///
/// Every `with_*` method leaves `self` untouched and returns an updated copy. Copies
/// share whatever they did not change, including the body stream.
pub trait HttpMessage: Clone {
    fn message(&self) -> &Message;

    /// Mutable access to the message state, detaching it from other copies first.
    fn message_mut(&mut self) -> &mut Message;

    fn protocol_version(&self) -> ProtocolVersion {
        self.message().version
    }

    fn with_protocol_version(&self, version: &str) -> Result<Self, MessageError> {
        let version = ProtocolVersion::parse(version)?;
        let mut instance = self.clone();
        instance.message_mut().version = version;
        Ok(instance)
    }

    fn headers(&self) -> &Headers {
        &self.message().headers
    }

    fn has_header(&self, name: &str) -> bool {
        self.message().headers.contains(name)
    }

    fn header(&self, name: &str) -> &[String] {
        self.message().headers.get(name)
    }

    fn header_line(&self, name: &str) -> String {
        self.message().headers.get_line(name)
    }

    /// Replace a header. An existing header keeps the casing it was stored with.
    fn with_header<V: IntoHeaderValues>(&self, name: &str, value: V) -> Self {
        let mut instance = self.clone();
        instance.message_mut().headers.set(name, value);
        instance
    }

    fn with_added_header<V: IntoHeaderValues>(&self, name: &str, value: V) -> Self {
        let mut instance = self.clone();
        instance.message_mut().headers.append(name, value);
        instance
    }

    /// Remove a header. When it is absent the returned copy shares all state with `self`.
    fn without_header(&self, name: &str) -> Self {
        let mut instance = self.clone();
        if self.has_header(name) {
            instance.message_mut().headers.remove(name);
        }
        instance
    }

    fn body(&self) -> &Body {
        &self.message().body
    }

    fn with_body<B: Into<Body>>(&self, body: B) -> Self {
        let mut instance = self.clone();
        instance.message_mut().body = body.into();
        instance
    }
}
