//! RTML dialect identifiers

use clap::ValueEnum;
use serde::Serialize;

/// Namespace declared by 3.1a documents.
pub const RTML_31A_NAMESPACE: &str = "http://www.rtml.org/v3.1a";

/// RTML schema generation
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, ValueEnum, Serialize,
)]
pub enum RtmlVersion {
    /// RTML 2.2 (DTD based)
    #[value(name = "2.2")]
    #[serde(rename = "2.2")]
    V2_2,
    /// RTML 3.1a (XML Schema based)
    #[value(name = "3.1a")]
    #[serde(rename = "3.1a")]
    #[default]
    V3_1a,
}

impl RtmlVersion {
    /// Get the version string (e.g., "3.1a")
    pub fn as_str(&self) -> &'static str {
        match self {
            RtmlVersion::V2_2 => "2.2",
            RtmlVersion::V3_1a => "3.1a",
        }
    }

    /// Parse from the root `version` attribute
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim() {
            "2.2" => Some(RtmlVersion::V2_2),
            "3.1a" => Some(RtmlVersion::V3_1a),
            _ => None,
        }
    }
}

impl std::fmt::Display for RtmlVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
