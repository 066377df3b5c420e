use std::fmt;
use std::str::FromStr;

use http::Version;

use crate::protocol::MessageError;

/// Protocol versions a message may carry.
pub const ALLOWED_VERSIONS: [&str; 5] = ["1", "1.0", "1.1", "2", "2.0"];

pub const DEFAULT_VERSION: &str = "1.1";

/// An HTTP protocol version, kept exactly as it was given (`"2"` and `"2.0"` stay distinct).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ProtocolVersion(&'static str);

impl ProtocolVersion {
    pub const HTTP_10: ProtocolVersion = ProtocolVersion("1.0");
    pub const HTTP_11: ProtocolVersion = ProtocolVersion("1.1");
    pub const HTTP_2: ProtocolVersion = ProtocolVersion("2");

    pub fn parse(version: &str) -> Result<Self, MessageError> {
        ALLOWED_VERSIONS
            .into_iter()
            .find(|allowed| *allowed == version)
            .map(ProtocolVersion)
            .ok_or_else(|| MessageError::invalid_version(version))
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl Default for ProtocolVersion {
    fn default() -> Self {
        Self::HTTP_11
    }
}

impl FromStr for ProtocolVersion {
    type Err = MessageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl From<ProtocolVersion> for Version {
    fn from(version: ProtocolVersion) -> Self {
        match version.0 {
            "1" | "1.0" => Version::HTTP_10,
            "2" | "2.0" => Version::HTTP_2,
            _ => Version::HTTP_11,
        }
    }
}

impl TryFrom<Version> for ProtocolVersion {
    type Error = MessageError;

    fn try_from(version: Version) -> Result<Self, Self::Error> {
        match version {
            Version::HTTP_10 => Ok(Self::HTTP_10),
            Version::HTTP_11 => Ok(Self::HTTP_11),
            Version::HTTP_2 => Ok(Self::HTTP_2),
            other => Err(MessageError::invalid_version(format!("{other:?}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_versions() {
        for version in ALLOWED_VERSIONS {
            assert_eq!(ProtocolVersion::parse(version).unwrap().as_str(), version);
        }
        assert_eq!(ProtocolVersion::default().as_str(), DEFAULT_VERSION);
    }

    #[test]
    fn test_rejected_versions() {
        for version in ["", "1.2", "3", "HTTP/1.1", "2.0 "] {
            assert!(matches!(ProtocolVersion::parse(version), Err(MessageError::InvalidVersion { .. })));
        }
    }

    #[test]
    fn test_http_version_conversion() {
        assert_eq!(Version::from(ProtocolVersion::parse("1").unwrap()), Version::HTTP_10);
        assert_eq!(Version::from(ProtocolVersion::parse("2.0").unwrap()), Version::HTTP_2);
        assert_eq!(ProtocolVersion::try_from(Version::HTTP_11).unwrap(), ProtocolVersion::HTTP_11);
        assert!(ProtocolVersion::try_from(Version::HTTP_3).is_err());
    }
}
