//! RTML 2.2 (DTD based) codec.
//!
//! In 2.2 an `Observation` holds its `Target`, `Device`, `Schedule` and any
//! number of `ImageData` children. Coordinates are single sexagesimal strings.

pub mod decoder;
pub mod encoder;

pub use decoder::Decoder;
pub use encoder::Encoder;

/// Default DOCTYPE system identifier.
pub const DTD_SYSTEM_ID: &str = "http://www.estar.org.uk/documents/rtml2.2.dtd";

pub const VERSION: &str = "2.2";
