//! Typed RTML document model.
//!
//! The model is shared by both dialects. Fields with a closed vocabulary are
//! enums, range bounded numbers sit behind validating setters, and everything
//! else is a plain optional field. Ownership is strictly tree shaped: a
//! [`Document`] owns its observations, an [`Observation`] owns its image data.

use crate::errors::RtmlError;
use http::Uri;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Declares a closed vocabulary enum with `as_str`, `FromStr`, `Display` and
/// string serialization.
macro_rules! rtml_vocabulary {
    (
        $(#[$meta:meta])*
        $name:ident ($field:literal) {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $( $name::$variant => $text ),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = crate::errors::RtmlError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $text => Ok($name::$variant), )+
                    _ => Err(crate::errors::RtmlError::value(
                        concat!("model::", stringify!($name)),
                        $field,
                        s,
                    )),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }
    };
}

pub mod agent;
pub mod contact;
pub mod device;
pub mod document;
pub mod history;
pub mod image_data;
pub mod observation;
pub mod period;
pub mod schedule;
pub mod score;
pub mod target;
pub mod telescope;

pub use agent::IntelligentAgent;
pub use contact::{Contact, Project};
pub use device::{Detector, Device, DeviceType, Grating, SpectralRegion};
pub use document::{Document, DocumentType};
pub use history::{History, HistoryAgent, HistoryEntry};
pub use image_data::{ImageData, ImageDataType, ObjectListType};
pub use observation::Observation;
pub use period::{PeriodError, PeriodFormat};
pub use schedule::{
    CloudCover, ExposureType, ExtinctionConstraint, MoonConstraint, Schedule, SeeingConstraint,
    SeriesConstraint, SkyBrightness, SkyConstraint,
};
pub use score::Score;
pub use target::{Target, TargetType};
pub use telescope::{Telescope, TelescopeLocation};

pub use crate::date::TimeBound;

/// The 3.1a `id`/`ref`/`uref` cross reference triple.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct RtmlAttributes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uref: Option<String>,
}

impl RtmlAttributes {
    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.reference.is_none() && self.uref.is_none()
    }
}

/// A URL carried by a document (agent endpoint, image location, VOTable).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RtmlUrl(Uri);

impl RtmlUrl {
    pub fn as_uri(&self) -> &Uri {
        &self.0
    }

    pub fn host(&self) -> Option<&str> {
        self.0.host()
    }

    pub fn port(&self) -> Option<u16> {
        self.0.port_u16()
    }

    pub fn scheme(&self) -> Option<&str> {
        self.0.scheme_str()
    }
}

impl FromStr for RtmlUrl {
    type Err = RtmlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let uri = trimmed
            .parse::<Uri>()
            .map_err(|e| RtmlError::value_caused_by("model::RtmlUrl", "url", trimmed, e))?;
        if uri.scheme().is_none() || uri.host().is_none() {
            return Err(RtmlError::value("model::RtmlUrl", "url", trimmed));
        }
        Ok(RtmlUrl(uri))
    }
}

impl From<Uri> for RtmlUrl {
    fn from(uri: Uri) -> Self {
        RtmlUrl(uri)
    }
}

impl fmt::Display for RtmlUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for RtmlUrl {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
