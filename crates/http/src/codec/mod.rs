//! Body encodings.
//!
//! - [`form`]: `application/x-www-form-urlencoded` with nested bracketed keys,
//!   used to decode form bodies and query strings and to encode structured bodies
//! - [`multipart`]: `multipart/form-data` encoding of text and file parts
//!   ([`MultipartForm`], [`TextPart`], [`FilePart`])

pub mod form;
pub use form::Params;
pub use form::build_form;
pub use form::parse_form;

pub mod multipart;
pub use multipart::FilePart;
pub use multipart::MULTIPART_BOUNDARY;
pub use multipart::MultipartForm;
pub use multipart::MultipartPart;
pub use multipart::TextPart;
