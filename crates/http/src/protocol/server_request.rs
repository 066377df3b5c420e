//! Requests as received by a server.
//!
//! A [`ServerRequest`] is a [`Request`](super::Request) plus what a server learns
//! while receiving it: query parameters, cookies, uploaded files, server parameters,
//! the decoded body and free-form attributes added by the application.
//!
//! # Body decoding
//!
//! A textual body is decoded when the request is built, based on the first
//! `Content-Type` value:
//!
//! - `application/json`: decoded as JSON, invalid JSON leaves no parsed body. A scalar
//!   becomes a one element array and `null` an empty one, so the parsed body is always
//!   an object or an array
//! - `application/x-www-form-urlencoded` or `multipart/form-data`: decoded as a form
//! - anything else: no parsed body
//!
//! A structured body ([`RequestBody::Form`] or [`RequestBody::Json`]) becomes the
//! parsed body with the same shaping, and the raw body stream is produced by encoding it.
//!
//! ```
//! use capsule_http::protocol::{HttpMessage, RequestBody, ServerRequest};
//! use serde_json::json;
//!
//! let request = ServerRequest::builder()
//!     .method("POST")
//!     .uri("https://example.org/books?page=2")
//!     .header("Content-Type", "application/json")
//!     .body(RequestBody::from(r#"{"title": "Dune"}"#))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(request.body_param("title"), Some(&json!("Dune")));
//! assert_eq!(request.query_param("page"), Some(&json!("2")));
//! ```

use std::collections::BTreeMap;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};
use triomphe::Arc;

use super::request::RequestHead;
use super::{HttpError, HttpMessage, HttpRequest, IntoHeaderValues, IntoUri, Message, MessageError, RequestBuilder};
use crate::codec::{Params, build_form, parse_form};
use crate::stream::Body;
use crate::upload::{UploadedFile, UploadedFileNode, UploadedFiles};

/// Body given when building a [`ServerRequest`].
#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    /// Raw text, decoded according to `Content-Type`.
    Text(Bytes),
    /// A stream that is kept as is and not decoded.
    Stream(Body),
    /// Form fields, encoded as `application/x-www-form-urlencoded`.
    Form(Params),
    /// A JSON document.
    Json(Value),
}

impl From<&str> for RequestBody {
    fn from(value: &str) -> Self {
        RequestBody::Text(Bytes::copy_from_slice(value.as_bytes()))
    }
}

impl From<String> for RequestBody {
    fn from(value: String) -> Self {
        RequestBody::Text(Bytes::from(value))
    }
}

impl From<Bytes> for RequestBody {
    fn from(value: Bytes) -> Self {
        RequestBody::Text(value)
    }
}

impl From<Body> for RequestBody {
    fn from(value: Body) -> Self {
        RequestBody::Stream(value)
    }
}

impl From<Params> for RequestBody {
    fn from(value: Params) -> Self {
        RequestBody::Form(value)
    }
}

impl From<Value> for RequestBody {
    fn from(value: Value) -> Self {
        RequestBody::Json(value)
    }
}

#[derive(Debug, Clone)]
struct ServerRequestInner {
    head: RequestHead,
    server_params: Params,
    query_params: Params,
    cookies: BTreeMap<String, String>,
    uploaded_files: UploadedFiles,
    parsed_body: Option<Value>,
    attributes: Params,
}

#[derive(Debug, Clone)]
pub struct ServerRequest {
    inner: Arc<ServerRequestInner>,
}

impl ServerRequest {
    pub fn builder() -> ServerRequestBuilder {
        ServerRequestBuilder::default()
    }

    pub fn ptr_eq(&self, other: &ServerRequest) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn update<F: FnOnce(&mut ServerRequestInner)>(&self, f: F) -> Self {
        let mut instance = self.clone();
        f(Arc::make_mut(&mut instance.inner));
        instance
    }

    pub fn server_params(&self) -> &Params {
        &self.inner.server_params
    }

    pub fn server_param(&self, name: &str) -> Option<&Value> {
        self.inner.server_params.get(name)
    }

    pub fn query_params(&self) -> &Params {
        &self.inner.query_params
    }

    pub fn with_query_params(&self, query: Params) -> Self {
        self.update(|inner| inner.query_params = query)
    }

    pub fn query_param(&self, name: &str) -> Option<&Value> {
        self.inner.query_params.get(name)
    }

    pub fn has_query_param(&self, name: &str) -> bool {
        self.inner.query_params.contains_key(name)
    }

    /// Deserialize the query parameters into `T`.
    pub fn query_params_as<T: DeserializeOwned>(&self) -> Result<T, MessageError> {
        let query = serde_qs::to_string(&self.inner.query_params).map_err(MessageError::deserialize)?;
        serde_qs::from_str::<T>(&query).map_err(MessageError::deserialize)
    }

    pub fn cookie_params(&self) -> &BTreeMap<String, String> {
        &self.inner.cookies
    }

    pub fn with_cookie_params(&self, cookies: BTreeMap<String, String>) -> Self {
        self.update(|inner| inner.cookies = cookies)
    }

    pub fn uploaded_files(&self) -> &UploadedFiles {
        &self.inner.uploaded_files
    }

    pub fn with_uploaded_files(&self, files: UploadedFiles) -> Self {
        self.update(|inner| inner.uploaded_files = files)
    }

    pub fn has_uploaded_file(&self, name: &str) -> bool {
        self.uploaded_file(name).is_some()
    }

    /// The single file uploaded under a top level field name.
    pub fn uploaded_file(&self, name: &str) -> Option<&UploadedFile> {
        self.inner.uploaded_files.get(name).and_then(UploadedFileNode::as_file)
    }

    pub fn parsed_body(&self) -> Option<&Value> {
        self.inner.parsed_body.as_ref()
    }

    pub fn with_parsed_body(&self, body: Option<Value>) -> Self {
        self.update(|inner| inner.parsed_body = body)
    }

    /// Deserialize the parsed body into `T`. A missing body deserializes from `null`.
    pub fn parsed_body_as<T: DeserializeOwned>(&self) -> Result<T, MessageError> {
        let body = self.inner.parsed_body.clone().unwrap_or(Value::Null);
        serde_json::from_value(body).map_err(MessageError::deserialize)
    }

    fn body_params(&self) -> Option<&Params> {
        self.inner.parsed_body.as_ref().and_then(Value::as_object)
    }

    pub fn body_param(&self, name: &str) -> Option<&Value> {
        self.body_params()?.get(name)
    }

    pub fn has_body_param(&self, name: &str) -> bool {
        self.body_param(name).is_some()
    }

    /// The body parameters named in `names`, skipping absent ones.
    pub fn only_body_params(&self, names: &[&str]) -> Params {
        let Some(params) = self.body_params() else {
            return Params::new();
        };
        names.iter().filter_map(|name| params.get(*name).map(|value| ((*name).to_string(), value.clone()))).collect()
    }

    /// Every body parameter except those named in `names`.
    pub fn except_body_params(&self, names: &[&str]) -> Params {
        let Some(params) = self.body_params() else {
            return Params::new();
        };
        params.iter().filter(|(key, _)| !names.contains(&key.as_str())).map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    /// Query and body parameters together. Body parameters win on conflicts.
    pub fn all_params(&self) -> Params {
        let mut params = self.inner.query_params.clone();
        if let Some(body) = self.body_params() {
            params.extend(body.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        params
    }

    pub fn attributes(&self) -> &Params {
        &self.inner.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.inner.attributes.get(name)
    }

    pub fn attribute_or(&self, name: &str, default: Value) -> Value {
        self.attribute(name).cloned().unwrap_or(default)
    }

    pub fn with_attribute<V: Into<Value>>(&self, name: &str, value: V) -> Self {
        let value = value.into();
        self.update(|inner| {
            inner.attributes.insert(name.to_string(), value);
        })
    }

    pub fn without_attribute(&self, name: &str) -> Self {
        self.update(|inner| {
            inner.attributes.remove(name);
        })
    }
}

impl HttpMessage for ServerRequest {
    fn message(&self) -> &Message {
        &self.inner.head.message
    }

    fn message_mut(&mut self) -> &mut Message {
        &mut Arc::make_mut(&mut self.inner).head.message
    }
}

impl HttpRequest for ServerRequest {
    fn head(&self) -> &RequestHead {
        &self.inner.head
    }

    fn head_mut(&mut self) -> &mut RequestHead {
        &mut Arc::make_mut(&mut self.inner).head
    }
}

fn json_collection(value: Value) -> Value {
    match value {
        Value::Object(_) | Value::Array(_) => value,
        Value::Null => Value::Array(Vec::new()),
        scalar => Value::Array(vec![scalar]),
    }
}

fn decode_text_body(content_type: Option<&String>, raw: &[u8]) -> Option<Value> {
    let content_type = content_type?.to_ascii_lowercase();

    if content_type.contains(mime::APPLICATION_JSON.essence_str()) {
        return match serde_json::from_slice::<Value>(raw) {
            Ok(value) => {
                debug!("decoded json request body");
                Some(json_collection(value))
            }
            Err(e) => {
                warn!(cause = %e, "request body is not valid json, leaving it unparsed");
                None
            }
        };
    }

    if content_type.contains(mime::APPLICATION_WWW_FORM_URLENCODED.essence_str())
        || content_type.contains(mime::MULTIPART_FORM_DATA.essence_str())
    {
        return match parse_form(&String::from_utf8_lossy(raw)) {
            Ok(params) => {
                debug!(fields = params.len(), "decoded form request body");
                Some(Value::Object(params))
            }
            Err(e) => {
                warn!(cause = %e, "request body is not a valid form, leaving it unparsed");
                None
            }
        };
    }

    None
}

#[derive(Debug, Default)]
pub struct ServerRequestBuilder {
    request: RequestBuilder,
    body: RequestBody,
    query_params: Params,
    cookies: BTreeMap<String, String>,
    uploaded_files: UploadedFiles,
    server_params: Params,
    attributes: Params,
}

impl ServerRequestBuilder {
    pub fn method(mut self, method: &str) -> Self {
        self.request = self.request.method(method);
        self
    }

    pub fn uri<U: IntoUri>(mut self, uri: U) -> Self {
        self.request = self.request.uri(uri);
        self
    }

    pub fn header<V: IntoHeaderValues>(mut self, name: &str, value: V) -> Self {
        self.request = self.request.header(name, value);
        self
    }

    pub fn headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: IntoHeaderValues,
    {
        self.request = self.request.headers(headers);
        self
    }

    pub fn version(mut self, version: &str) -> Self {
        self.request = self.request.version(version);
        self
    }

    pub fn body<B: Into<RequestBody>>(mut self, body: B) -> Self {
        self.body = body.into();
        self
    }

    /// Query parameters on top of those decoded from the URI. These win on conflicts.
    pub fn query_params(mut self, query: Params) -> Self {
        self.query_params = query;
        self
    }

    pub fn cookies(mut self, cookies: BTreeMap<String, String>) -> Self {
        self.cookies = cookies;
        self
    }

    pub fn uploaded_files(mut self, files: UploadedFiles) -> Self {
        self.uploaded_files = files;
        self
    }

    pub fn server_params(mut self, params: Params) -> Self {
        self.server_params = params;
        self
    }

    pub fn attribute<V: Into<Value>>(mut self, name: &str, value: V) -> Self {
        self.attributes.insert(name.to_string(), value.into());
        self
    }

    pub fn build(self) -> Result<ServerRequest, HttpError> {
        let mut parsed_body = None;
        let mut text = None;

        let body = match self.body {
            RequestBody::Empty => Body::empty(),
            RequestBody::Stream(body) => body,
            RequestBody::Text(raw) => {
                text = Some(raw.clone());
                Body::from(raw)
            }
            RequestBody::Form(params) => {
                let encoded = build_form(&params)?;
                parsed_body = Some(Value::Object(params));
                Body::from(encoded)
            }
            RequestBody::Json(value) => {
                let encoded = serde_json::to_vec(&value).map_err(MessageError::encode)?;
                parsed_body = Some(json_collection(value));
                Body::from(encoded)
            }
        };

        let head = self.request.body(body).build_head()?;
        if let Some(raw) = text {
            parsed_body = decode_text_body(head.message().headers().get("Content-Type").first(), &raw);
        }

        let mut query_params = parse_form(head.uri().query())?;
        query_params.extend(self.query_params);

        Ok(ServerRequest {
            inner: Arc::new(ServerRequestInner {
                head,
                server_params: self.server_params,
                query_params,
                cookies: self.cookies,
                uploaded_files: self.uploaded_files,
                parsed_body,
                attributes: self.attributes,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upload::UploadErrorCode;
    use serde::Deserialize;
    use serde_json::json;

    fn object(value: Value) -> Params {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn test_json_body_is_decoded() {
        let request = ServerRequest::builder()
            .method("post")
            .uri("https://example.org/books")
            .header("content-type", "Application/JSON; charset=utf-8")
            .body(r#"{"title": "Dune", "year": 1965}"#)
            .build()
            .unwrap();

        assert_eq!(request.parsed_body(), Some(&json!({"title": "Dune", "year": 1965})));
        assert_eq!(request.body_param("year"), Some(&json!(1965)));
        assert_eq!(request.body().contents().unwrap(), r#"{"title": "Dune", "year": 1965}"#);
    }

    #[test]
    fn test_json_scalar_body_is_wrapped() {
        let json_request = |body: &'static str| {
            ServerRequest::builder().header("Content-Type", "application/json").body(body).build().unwrap()
        };

        assert_eq!(json_request("42").parsed_body(), Some(&json!([42])));
        assert_eq!(json_request(r#""Dune""#).parsed_body(), Some(&json!(["Dune"])));
        assert_eq!(json_request("null").parsed_body(), Some(&json!([])));
        assert_eq!(json_request("[1, 2]").parsed_body(), Some(&json!([1, 2])));
        assert_eq!(json_request("42").body_param("0"), None);

        let request = ServerRequest::builder().body(json!(true)).build().unwrap();
        assert_eq!(request.parsed_body(), Some(&json!([true])));
        assert_eq!(request.body().contents().unwrap(), "true");
    }

    #[test]
    fn test_invalid_json_body_is_left_unparsed() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();

        let request = ServerRequest::builder()
            .header("Content-Type", "application/json")
            .body("{not json")
            .build()
            .unwrap();

        assert_eq!(request.parsed_body(), None);
        assert_eq!(request.body().contents().unwrap(), "{not json");
    }

    #[test]
    fn test_form_body_is_decoded() {
        for content_type in ["application/x-www-form-urlencoded", "multipart/form-data; boundary=xyz"] {
            let request = ServerRequest::builder()
                .method("POST")
                .header("Content-Type", content_type)
                .body("name=Ada&langs[]=en&langs[]=fr")
                .build()
                .unwrap();

            assert_eq!(request.parsed_body(), Some(&json!({"name": "Ada", "langs": ["en", "fr"]})));
        }
    }

    #[test]
    fn test_unknown_content_type_is_not_decoded() {
        let request = ServerRequest::builder().header("Content-Type", "text/plain").body("name=Ada").build().unwrap();
        assert_eq!(request.parsed_body(), None);

        let request = ServerRequest::builder().body("name=Ada").build().unwrap();
        assert_eq!(request.parsed_body(), None);
    }

    #[test]
    fn test_structured_bodies() {
        let request = ServerRequest::builder().body(object(json!({"name": "Ada Lovelace", "admin": true}))).build().unwrap();
        assert_eq!(request.body_param("name"), Some(&json!("Ada Lovelace")));
        assert_eq!(request.body().contents().unwrap(), "name=Ada+Lovelace&admin=1");

        let request = ServerRequest::builder().body(json!({"ids": [1, 2]})).build().unwrap();
        assert_eq!(request.parsed_body(), Some(&json!({"ids": [1, 2]})));
        assert_eq!(request.body().contents().unwrap(), r#"{"ids":[1,2]}"#);
    }

    #[test]
    fn test_stream_body_is_kept() {
        let body = Body::from("raw");
        let request = ServerRequest::builder()
            .header("Content-Type", "application/json")
            .body(body.clone())
            .build()
            .unwrap();

        assert!(request.body().ptr_eq(&body));
        assert_eq!(request.parsed_body(), None);
    }

    #[test]
    fn test_query_params_merge() {
        let request = ServerRequest::builder()
            .uri("https://example.org/search?q=rust&page=1")
            .query_params(object(json!({"page": "3", "limit": "10"})))
            .build()
            .unwrap();

        assert_eq!(request.query_param("q"), Some(&json!("rust")));
        assert_eq!(request.query_param("page"), Some(&json!("3")));
        assert!(request.has_query_param("limit"));
        assert!(!request.has_query_param("sort"));
    }

    #[test]
    fn test_typed_views() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Search {
            q: String,
            page: u32,
        }

        #[derive(Debug, Deserialize, PartialEq)]
        struct Book {
            title: String,
        }

        let request = ServerRequest::builder()
            .uri("/search?q=rust&page=2")
            .body(json!({"title": "Dune"}))
            .build()
            .unwrap();

        assert_eq!(request.query_params_as::<Search>().unwrap(), Search { q: "rust".to_string(), page: 2 });
        assert_eq!(request.parsed_body_as::<Book>().unwrap(), Book { title: "Dune".to_string() });
        assert!(matches!(request.with_parsed_body(None).parsed_body_as::<Book>(), Err(MessageError::Deserialize { .. })));
    }

    #[test]
    fn test_body_param_views() {
        let request = ServerRequest::builder()
            .uri("/?name=query&page=1")
            .body(json!({"name": "Ada", "email": "ada@example.org", "role": "admin"}))
            .build()
            .unwrap();

        assert!(request.has_body_param("email"));
        assert!(!request.has_body_param("missing"));
        assert_eq!(request.only_body_params(&["name", "missing"]), object(json!({"name": "Ada"})));
        assert_eq!(request.except_body_params(&["role"]), object(json!({"name": "Ada", "email": "ada@example.org"})));
        assert_eq!(
            request.all_params(),
            object(json!({"name": "Ada", "page": "1", "email": "ada@example.org", "role": "admin"}))
        );

        let scalar = request.with_parsed_body(Some(json!("scalar")));
        assert_eq!(scalar.body_param("name"), None);
        assert!(scalar.only_body_params(&["name"]).is_empty());
    }

    #[test]
    fn test_attributes() {
        let request = ServerRequest::builder().attribute("route", "books.show").build().unwrap();

        let with_id = request.with_attribute("id", 42);
        assert_eq!(with_id.attribute("id"), Some(&json!(42)));
        assert_eq!(with_id.attribute("route"), Some(&json!("books.show")));
        assert_eq!(request.attribute("id"), None);
        assert_eq!(request.attribute_or("id", json!(0)), json!(0));
        assert_eq!(with_id.attributes().len(), 2);

        let without = with_id.without_attribute("route");
        assert_eq!(without.attribute("route"), None);
        assert!(with_id.attribute("route").is_some());
    }

    #[test]
    fn test_with_methods_are_copy_on_write() {
        let request = ServerRequest::builder().uri("https://example.org/").build().unwrap();

        let cookies = BTreeMap::from([("session".to_string(), "abc".to_string())]);
        let with_cookies = request.with_cookie_params(cookies);
        assert_eq!(with_cookies.cookie_params()["session"], "abc");
        assert!(request.cookie_params().is_empty());

        let with_query = request.with_query_params(object(json!({"a": "1"})));
        assert!(with_query.has_query_param("a"));
        assert!(!request.has_query_param("a"));

        assert!(request.without_header("X-Missing").ptr_eq(&request));
        assert_eq!(request.header_line("Host"), "example.org");
        assert!(with_query.body().ptr_eq(request.body()));
    }

    #[test]
    fn test_uploaded_files() {
        let avatar = UploadedFile::from_stream("png").client_filename("me.png").build();
        let broken = UploadedFile::from_stream("").error(UploadErrorCode::NoFile).build();
        let files = UploadedFiles::from([
            ("avatar".to_string(), UploadedFileNode::from(avatar)),
            ("photos".to_string(), UploadedFileNode::from(UploadedFiles::from([("0".to_string(), broken.into())]))),
        ]);

        let request = ServerRequest::builder().uploaded_files(files).build().unwrap();
        assert!(request.has_uploaded_file("avatar"));
        assert_eq!(request.uploaded_file("avatar").and_then(UploadedFile::client_filename), Some("me.png"));
        assert!(!request.has_uploaded_file("photos"));
        assert!(request.uploaded_files()["photos"].as_nested().is_some());

        let cleared = request.with_uploaded_files(UploadedFiles::new());
        assert!(!cleared.has_uploaded_file("avatar"));
        assert!(request.has_uploaded_file("avatar"));
    }

    #[test]
    fn test_server_params() {
        let request = ServerRequest::builder()
            .server_params(object(json!({"REMOTE_ADDR": "10.0.0.1", "SERVER_PORT": 443})))
            .build()
            .unwrap();

        assert_eq!(request.server_param("REMOTE_ADDR"), Some(&json!("10.0.0.1")));
        assert_eq!(request.server_params().len(), 2);
    }
}
