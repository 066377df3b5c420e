use std::fmt::Debug;

use bytes::{BufMut, Bytes, BytesMut};

use crate::protocol::StreamError;
use crate::stream::Body;

/// Boundary token separating the parts of an encoded form.
pub const MULTIPART_BOUNDARY: &str = "0425150128197707252015Z";

/// A form field that can render itself as one `multipart/form-data` section.
pub trait MultipartPart: Debug + Send {
    /// Append `--boundary`, the part headers, a blank line and the content to `dst`.
    fn encode_part(&self, boundary: &str, name: &str, dst: &mut BytesMut);
}

fn put_disposition(dst: &mut BytesMut, boundary: &str, name: &str, filename: Option<&str>) {
    dst.put_slice(b"--");
    dst.put_slice(boundary.as_bytes());
    dst.put_slice(b"\r\nContent-Disposition: form-data; name=\"");
    dst.put_slice(name.as_bytes());
    dst.put_slice(b"\"");
    if let Some(filename) = filename {
        dst.put_slice(b"; filename=\"");
        dst.put_slice(filename.as_bytes());
        dst.put_slice(b"\"");
    }
    dst.put_slice(b"\r\n");
}

/// A plain text field.
#[derive(Debug, Clone)]
pub struct TextPart {
    value: String,
}

impl TextPart {
    pub fn new<S: Into<String>>(value: S) -> Self {
        Self { value: value.into() }
    }
}

impl MultipartPart for TextPart {
    fn encode_part(&self, boundary: &str, name: &str, dst: &mut BytesMut) {
        put_disposition(dst, boundary, name, None);
        dst.put_slice(b"\r\n");
        dst.put_slice(self.value.as_bytes());
        dst.put_slice(b"\r\n");
    }
}

/// A file field.
#[derive(Debug, Clone)]
pub struct FilePart {
    filename: String,
    content_type: Option<String>,
    contents: Bytes,
}

impl FilePart {
    pub fn new<S: Into<String>, B: Into<Bytes>>(filename: S, contents: B) -> Self {
        Self { filename: filename.into(), content_type: None, contents: contents.into() }
    }

    /// A file part holding everything left to read in `stream`.
    pub fn from_stream<S: Into<String>>(filename: S, stream: &Body) -> Result<Self, StreamError> {
        Ok(Self::new(filename, stream.contents()?))
    }

    pub fn content_type<S: Into<String>>(mut self, content_type: S) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

impl MultipartPart for FilePart {
    fn encode_part(&self, boundary: &str, name: &str, dst: &mut BytesMut) {
        put_disposition(dst, boundary, name, Some(&self.filename));
        if let Some(content_type) = &self.content_type {
            dst.put_slice(b"Content-Type: ");
            dst.put_slice(content_type.as_bytes());
            dst.put_slice(b"\r\n");
        }
        dst.put_slice(b"\r\n");
        dst.put_slice(&self.contents);
        dst.put_slice(b"\r\n");
    }
}

/// A `multipart/form-data` body built from named parts.
///
/// ```
/// use capsule_http::codec::{FilePart, MultipartForm};
///
/// let form = MultipartForm::new()
///     .text("title", "Dune")
///     .part("cover", FilePart::new("cover.png", "png bytes").content_type("image/png"));
///
/// assert_eq!(form.content_type(), "multipart/form-data; boundary=0425150128197707252015Z");
/// assert!(form.encode().ends_with(b"--0425150128197707252015Z--\r\n"));
/// ```
#[derive(Debug, Default)]
pub struct MultipartForm {
    parts: Vec<(String, Box<dyn MultipartPart>)>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn part<S: Into<String>, P: MultipartPart + 'static>(mut self, name: S, part: P) -> Self {
        self.parts.push((name.into(), Box::new(part)));
        self
    }

    pub fn text<S: Into<String>, V: Into<String>>(self, name: S, value: V) -> Self {
        self.part(name, TextPart::new(value))
    }

    /// The `Content-Type` header value matching [`encode`](Self::encode).
    pub fn content_type(&self) -> String {
        format!("{}; boundary={MULTIPART_BOUNDARY}", mime::MULTIPART_FORM_DATA)
    }

    pub fn encode(&self) -> Bytes {
        let mut dst = BytesMut::new();
        for (name, part) in &self.parts {
            part.encode_part(MULTIPART_BOUNDARY, name, &mut dst);
        }
        dst.put_slice(b"--");
        dst.put_slice(MULTIPART_BOUNDARY.as_bytes());
        dst.put_slice(b"--\r\n");
        dst.freeze()
    }

    pub fn into_body(self) -> Body {
        Body::from(self.encode())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    fn crlf(text: &str) -> String {
        text.replace('\n', "\r\n")
    }

    #[test]
    fn test_encode_form() {
        let form = MultipartForm::new()
            .text("title", "Dune")
            .part("cover", FilePart::new("cover.txt", "cover art").content_type("text/plain"))
            .part("notes", FilePart::new("notes.bin", Bytes::from_static(b"\x00\x01")));

        let expected = crlf(indoc! {r#"
            --0425150128197707252015Z
            Content-Disposition: form-data; name="title"

            Dune
            --0425150128197707252015Z
            Content-Disposition: form-data; name="cover"; filename="cover.txt"
            Content-Type: text/plain

            cover art
            --0425150128197707252015Z
            Content-Disposition: form-data; name="notes"; filename="notes.bin""#});

        let mut expected = expected.into_bytes();
        expected.extend_from_slice(b"\r\n\r\n\x00\x01\r\n--0425150128197707252015Z--\r\n");
        assert_eq!(form.encode(), expected);
    }

    #[test]
    fn test_empty_form() {
        assert_eq!(MultipartForm::new().encode(), "--0425150128197707252015Z--\r\n");
    }

    #[test]
    fn test_file_part_from_stream() {
        let body = Body::from("streamed");
        let form = MultipartForm::new().part("upload", FilePart::from_stream("a.txt", &body).unwrap());

        let encoded = form.into_body().contents().unwrap();
        assert!(encoded.windows(8).any(|window| window == b"streamed"));
        assert!(body.eof());
    }
}
