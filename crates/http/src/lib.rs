//! Immutable HTTP message value objects
//!
//! This crate models HTTP requests, responses, URIs, message bodies and uploaded files
//! as values. Every `with_*` / `without_*` operation returns a new value and leaves the
//! receiver untouched, so messages can be shared freely and modified without coordination.
//! Nothing here does network I/O; the types are meant to sit between a server or client
//! and the code that handles messages.
//!
//! # Example
//!
//! ```
//! use capsule_http::protocol::{HttpMessage, Response, ServerRequest};
//! use serde_json::json;
//!
//! let request = ServerRequest::builder()
//!     .method("POST")
//!     .uri("https://example.org/books?page=2")
//!     .header("Content-Type", "application/json")
//!     .body(r#"{"title":"Dune"}"#)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(request.header_line("Host"), "example.org");
//! assert_eq!(request.query_param("page"), Some(&json!("2")));
//! assert_eq!(request.body_param("title"), Some(&json!("Dune")));
//!
//! let tagged = request.with_attribute("user", 42);
//! assert_eq!(request.attribute("user"), None);
//! assert_eq!(tagged.attribute("user"), Some(&json!(42)));
//!
//! let response = Response::new(201).unwrap().with_header("Location", "/books/1").with_body("created");
//! assert_eq!(response.reason_phrase(), "Created");
//! assert_eq!(response.body().contents().unwrap(), "created");
//! ```
//!
//! # Architecture
//!
//! - [`protocol`]: messages, headers, URIs, status codes and the error types
//! - [`stream`]: message bodies, either in memory or backed by a file
//! - [`upload`]: uploaded files and the trees they arrive in
//! - [`codec`]: form and multipart encodings
//! - [`factory`]: stateless constructors and conversions to and from the `http` crate
//!
//! # Body Streaming
//!
//! A message body is a [`stream::Body`], a shared handle to a [`stream::Stream`]. Copies of
//! a message share the body, reading from one advances the position seen by all of them.
//! [`stream::Body`] implements `http_body::Body`, which lets it be collected or forwarded
//! with the usual `http-body` tooling.
//!
//! # Error Handling
//!
//! - [`protocol::HttpError`]: top-level error type, maps to a response status
//! - [`protocol::MessageError`]: invalid versions, methods, headers and bodies
//! - [`protocol::UriError`]: URIs that cannot be parsed
//! - [`protocol::StreamError`]: stream operations that are not possible in the current state
//! - [`protocol::UploadError`]: unusable uploads and malformed upload descriptions

pub mod codec;
pub mod factory;
pub mod protocol;
pub mod stream;
pub mod upload;

mod utils;
