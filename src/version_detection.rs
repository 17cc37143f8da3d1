//! Dialect detection for RTML documents
//!
//! Looks at the root element only: the `version` attribute first, then the
//! 3.1a namespace, then the 2.2 DOCTYPE.

use crate::rtml_version::{RTML_31A_NAMESPACE, RtmlVersion};
use crate::xml::XmlDocument;

/// What the root element says about the document's dialect
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectedDialect {
    Known(RtmlVersion),
    /// A version attribute we have no codec for
    Unsupported(String),
    Unknown,
}

impl DetectedDialect {
    /// Get the detected version, if supported
    pub fn version(&self) -> Option<RtmlVersion> {
        match self {
            DetectedDialect::Known(v) => Some(*v),
            _ => None,
        }
    }
}

/// Detect the RTML dialect of a parsed document
pub fn detect_dialect(doc: &XmlDocument) -> DetectedDialect {
    let root = &doc.root;
    if root.name() != "RTML" {
        return DetectedDialect::Unknown;
    }

    if let Some(version) = root.attribute("version") {
        return match RtmlVersion::from_str(version) {
            Some(v) => DetectedDialect::Known(v),
            None => DetectedDialect::Unsupported(version.to_string()),
        };
    }

    if root.attribute("xmlns") == Some(RTML_31A_NAMESPACE) {
        return DetectedDialect::Known(RtmlVersion::V3_1a);
    }

    if doc
        .doctype_system_id()
        .is_some_and(|id| id.ends_with("rtml2.2.dtd"))
    {
        return DetectedDialect::Known(RtmlVersion::V2_2);
    }

    DetectedDialect::Unknown
}

/// Get a description of the detected dialect
pub fn dialect_description(dialect: &DetectedDialect) -> String {
    match dialect {
        DetectedDialect::Known(v) => format!("RTML {}", v),
        DetectedDialect::Unsupported(v) => format!("RTML {} (unsupported)", v),
        DetectedDialect::Unknown => "Unknown document".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::parse_str;

    #[test]
    fn test_detect_from_version_attribute() {
        let doc = parse_str(r#"<RTML version="2.2" type="request"/>"#).unwrap();
        let dialect = detect_dialect(&doc);
        assert_eq!(dialect, DetectedDialect::Known(RtmlVersion::V2_2));
        assert_eq!(dialect.version(), Some(RtmlVersion::V2_2));
    }

    #[test]
    fn test_detect_from_namespace() {
        let doc = parse_str(r#"<RTML xmlns="http://www.rtml.org/v3.1a" mode="request"/>"#).unwrap();
        assert_eq!(detect_dialect(&doc), DetectedDialect::Known(RtmlVersion::V3_1a));
    }

    #[test]
    fn test_detect_from_doctype() {
        let doc = parse_str(
            "<!DOCTYPE RTML SYSTEM \"http://www.estar.org.uk/documents/rtml2.2.dtd\"><RTML type=\"score\"/>",
        )
        .unwrap();
        assert_eq!(detect_dialect(&doc).version(), Some(RtmlVersion::V2_2));
    }

    #[test]
    fn test_detect_unsupported_and_unknown() {
        let doc = parse_str(r#"<RTML version="2.1"/>"#).unwrap();
        let dialect = detect_dialect(&doc);
        assert_eq!(dialect, DetectedDialect::Unsupported("2.1".to_string()));
        assert_eq!(dialect_description(&dialect), "RTML 2.1 (unsupported)");

        let doc = parse_str("<bom/>").unwrap();
        assert_eq!(detect_dialect(&doc), DetectedDialect::Unknown);
        assert_eq!(dialect_description(&DetectedDialect::Unknown), "Unknown document");
    }
}
