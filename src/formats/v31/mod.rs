//! RTML 3.1a (XML Schema based) codec.
//!
//! 3.1a groups an observation's device, exposure, constraints and target
//! under a `Schedule`, with one nested `Observation` per image. Coordinates
//! are split into numeric components.

pub mod decoder;
pub mod encoder;

pub use decoder::Decoder;
pub use encoder::Encoder;

use crate::errors::RtmlError;
use crate::model::RtmlUrl;
use std::sync::OnceLock;

pub use crate::rtml_version::RTML_31A_NAMESPACE as NAMESPACE;

pub const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Schema location used when nothing else is configured.
pub const DEFAULT_SCHEMA_URL: &str = "http://telescope.livjm.ac.uk/rtml/RTML-nightly.xsd";

pub const VERSION: &str = "3.1a";

static SCHEMA_URL: OnceLock<String> = OnceLock::new();

/// Sets the process-wide schema URL used by [`EncoderOptions::default`].
/// Can only be done once; the URL must be absolute.
///
/// [`EncoderOptions::default`]: crate::formats::EncoderOptions
pub fn set_default_schema_url(url: &str) -> Result<(), RtmlError> {
    url.parse::<RtmlUrl>().map_err(|e| {
        RtmlError::Configuration(format!("invalid schema URL '{}': {}", url, e))
    })?;
    SCHEMA_URL.set(url.to_string()).map_err(|rejected| {
        RtmlError::Configuration(format!(
            "default schema URL already set, refusing '{}'",
            rejected
        ))
    })
}

pub fn default_schema_url() -> &'static str {
    SCHEMA_URL
        .get()
        .map(String::as_str)
        .unwrap_or(DEFAULT_SCHEMA_URL)
}
