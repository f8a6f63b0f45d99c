//! Billing platforms an invoice can come from

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// E-billing platform the uploaded invoice was exported from.
///
/// The value travels as the `platform` multipart field using the exact
/// strings below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    #[serde(rename = "T360")]
    T360,
    #[serde(rename = "CounselLink")]
    CounselLink,
}

impl Platform {
    pub const ALL: [Platform; 2] = [Platform::T360, Platform::CounselLink];

    /// Wire representation used in form fields and local storage
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::T360 => "T360",
            Platform::CounselLink => "CounselLink",
        }
    }

    /// Whether uploads for this platform may be submitted.
    ///
    /// CounselLink can be selected but its highlighter is not live yet.
    pub fn is_supported(&self) -> bool {
        matches!(self, Platform::T360)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown platform: {0}")]
pub struct UnknownPlatform(pub String);

impl FromStr for Platform {
    type Err = UnknownPlatform;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "T360" => Ok(Platform::T360),
            "CounselLink" => Ok(Platform::CounselLink),
            other => Err(UnknownPlatform(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_strings_round_trip() {
        for platform in Platform::ALL {
            assert_eq!(platform.as_str().parse::<Platform>(), Ok(platform));
        }
    }

    #[test]
    fn test_parse_is_case_sensitive() {
        assert!("t360".parse::<Platform>().is_err());
        assert!("counsellink".parse::<Platform>().is_err());
        assert!("".parse::<Platform>().is_err());
    }

    #[test]
    fn test_only_t360_is_supported() {
        assert!(Platform::T360.is_supported());
        assert!(!Platform::CounselLink.is_supported());
    }

    #[test]
    fn test_serde_uses_wire_strings() {
        let json = serde_json::to_string(&Platform::CounselLink).unwrap();
        assert_eq!(json, "\"CounselLink\"");
        let back: Platform = serde_json::from_str("\"T360\"").unwrap();
        assert_eq!(back, Platform::T360);
    }
}
