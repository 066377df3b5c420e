//! Files received as part of a request.
//!
//! An [`UploadedFile`] is either backed by a stream already in memory or by a path
//! on disk that is opened the first time its stream is asked for. It can be moved
//! to its final location once; after that, or when the upload failed on the client
//! side ([`UploadErrorCode`] other than `Ok`), it is unusable.
//!
//! Uploads arrive as a tree keyed by form field name, see [`UploadedFileNode`] and
//! [`normalize_specs`] for building that tree from upload descriptions.

use std::fmt;

use crate::protocol::UploadError;

mod uploaded_file;
pub use uploaded_file::UploadedFile;
pub use uploaded_file::UploadedFileBuilder;

mod file_tree;
pub use file_tree::UploadedFileNode;
pub use file_tree::UploadedFiles;
pub use file_tree::normalize_specs;
pub(crate) use file_tree::file_from_spec;

/// Upload outcome as reported by the receiving server.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum UploadErrorCode {
    #[default]
    Ok,
    /// Larger than the server wide limit.
    IniSize,
    /// Larger than the limit declared by the form.
    FormSize,
    Partial,
    NoFile,
    NoTmpDir,
    CantWrite,
    /// Stopped by a server extension.
    Extension,
}

impl UploadErrorCode {
    pub fn code(&self) -> u8 {
        match self {
            UploadErrorCode::Ok => 0,
            UploadErrorCode::IniSize => 1,
            UploadErrorCode::FormSize => 2,
            UploadErrorCode::Partial => 3,
            UploadErrorCode::NoFile => 4,
            UploadErrorCode::NoTmpDir => 6,
            UploadErrorCode::CantWrite => 7,
            UploadErrorCode::Extension => 8,
        }
    }

    pub fn is_ok(&self) -> bool {
        *self == UploadErrorCode::Ok
    }
}

impl TryFrom<u8> for UploadErrorCode {
    type Error = UploadError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(UploadErrorCode::Ok),
            1 => Ok(UploadErrorCode::IniSize),
            2 => Ok(UploadErrorCode::FormSize),
            3 => Ok(UploadErrorCode::Partial),
            4 => Ok(UploadErrorCode::NoFile),
            6 => Ok(UploadErrorCode::NoTmpDir),
            7 => Ok(UploadErrorCode::CantWrite),
            8 => Ok(UploadErrorCode::Extension),
            other => Err(UploadError::malformed_spec(format!("unknown upload error code {other}"))),
        }
    }
}

impl fmt::Display for UploadErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let description = match self {
            UploadErrorCode::Ok => "the file uploaded successfully",
            UploadErrorCode::IniSize => "the file exceeds the maximum upload size",
            UploadErrorCode::FormSize => "the file exceeds the maximum size declared by the form",
            UploadErrorCode::Partial => "the file was only partially uploaded",
            UploadErrorCode::NoFile => "no file was uploaded",
            UploadErrorCode::NoTmpDir => "missing a temporary folder",
            UploadErrorCode::CantWrite => "failed to write the file to disk",
            UploadErrorCode::Extension => "an extension stopped the upload",
        };
        f.write_str(description)
    }
}
