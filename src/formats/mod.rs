//! RTML dialect codecs.
//!
//! Each dialect has a decoder (XML tree to [`Document`]) and an encoder
//! ([`Document`] to XML tree). The shared walk skeleton, numeric patterns and
//! constraint codecs live alongside them.

/// Declares handlers that copy a leaf element's text into an optional
/// `String` field. Elements without text leave the field untouched.
macro_rules! string_leaves {
    ($decoder:ty, $context:expr; $( $name:ident => $target:ty, $field:ident; )+) => {
        $(
            fn $name(
                _d: &$decoder,
                e: &crate::xml::XmlElement,
                target: &mut $target,
                s: &mut crate::formats::walk::Session,
            ) -> Result<(), crate::errors::RtmlError> {
                if let Some(text) = crate::formats::walk::leaf_text($context, e, s) {
                    target.$field = Some(text.to_string());
                }
                Ok(())
            }
        )+
    };
}

pub mod numeric;
pub mod shared;
pub mod v22;
pub mod v31;
pub mod walk;

use crate::diagnostics::Diagnostic;
use crate::errors::RtmlError;
use crate::model::Document;
use crate::rtml_version::RtmlVersion;
use crate::xml::{self, XmlDocument};
use log::info;

/// A decoded document plus the non-fatal findings made while decoding it.
#[derive(Debug, Clone)]
pub struct Decoded {
    pub document: Document,
    pub diagnostics: Vec<Diagnostic>,
}

/// Encoder settings.
#[derive(Debug, Clone, PartialEq)]
pub struct EncoderOptions {
    /// Schema location written on 3.1a roots.
    pub schema_url: String,
    /// DOCTYPE system identifier written on 2.2 documents.
    pub doctype_system_id: String,
    /// Indent width used when rendering to text; 0 writes a single line.
    pub indent: usize,
}

impl Default for EncoderOptions {
    fn default() -> Self {
        Self {
            schema_url: v31::default_schema_url().to_string(),
            doctype_system_id: v22::DTD_SYSTEM_ID.to_string(),
            indent: 2,
        }
    }
}

/// Decode a parsed tree with the given dialect's decoder.
pub fn decode(version: RtmlVersion, doc: &XmlDocument) -> Result<Decoded, RtmlError> {
    info!("Decoding RTML {} document", version);
    match version {
        RtmlVersion::V2_2 => v22::Decoder::new()?.decode(doc),
        RtmlVersion::V3_1a => v31::Decoder::new()?.decode(doc),
    }
}

/// Build the dialect's tree for a document.
pub fn encode(version: RtmlVersion, document: &Document, options: &EncoderOptions) -> XmlDocument {
    info!("Encoding RTML {} document", version);
    match version {
        RtmlVersion::V2_2 => v22::Encoder::new(options.clone()).encode(document),
        RtmlVersion::V3_1a => v31::Encoder::new(options.clone()).encode(document),
    }
}

/// Encode and render to text in one step.
pub fn encode_to_string(
    version: RtmlVersion,
    document: &Document,
    options: &EncoderOptions,
) -> Result<String, RtmlError> {
    let tree = encode(version, document, options);
    xml::to_string(&tree, options.indent)
}
