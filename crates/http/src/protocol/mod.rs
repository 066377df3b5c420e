//! HTTP message value objects.
//!
//! This module provides the immutable message types and the traits shared between
//! them. Every `with_*` operation returns an updated copy and leaves the original
//! untouched; copies share all state they did not change.
//!
//! # Architecture
//!
//! - **Messages** ([`message`]): state common to all messages
//!   - [`Message`]: protocol version, [`Headers`] and body
//!   - [`HttpMessage`]: header, body and version accessors and updates
//!
//! - **Requests** ([`request`], [`server_request`]):
//!   - [`Request`]: method, [`Uri`], request target and `Host` synthesis
//!   - [`HttpRequest`]: request line accessors and updates
//!   - [`ServerRequest`]: a received request with query params, cookies, uploaded
//!     files, a decoded body and attributes
//!
//! - **Responses** ([`response`]):
//!   - [`Response`]: status code and reason phrase from [`ResponseStatus`]
//!
//! - **Error Handling**: one error type per area
//!   - [`HttpError`]: top-level error type
//!   - [`MessageError`], [`UriError`], [`StreamError`], [`UploadError`]

mod error;
pub use error::HttpError;
pub use error::MessageError;
pub use error::StreamError;
pub use error::UploadError;
pub use error::UriError;

mod headers;
pub use headers::Headers;
pub use headers::IntoHeaderValues;

mod version;
pub use version::ALLOWED_VERSIONS;
pub use version::DEFAULT_VERSION;
pub use version::ProtocolVersion;

pub mod message;
pub use message::HttpMessage;
pub use message::Message;

pub mod uri;
pub use uri::IntoUri;
pub use uri::STANDARD_PORTS;
pub use uri::Uri;

pub mod request;
pub use request::HttpRequest;
pub use request::Request;
pub use request::RequestBuilder;
pub use request::RequestHead;

mod status;
pub use status::ResponseStatus;

pub mod response;
pub use response::Response;
pub use response::ResponseBuilder;

pub mod server_request;
pub use server_request::RequestBody;
pub use server_request::ServerRequest;
pub use server_request::ServerRequestBuilder;

pub use crate::codec::Params;
