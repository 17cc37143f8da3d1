use super::RtmlAttributes;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Telescope {
    #[serde(flatten)]
    pub attributes: RtmlAttributes,
    pub name: Option<String>,
    pub aperture: Option<f64>,
    pub aperture_units: Option<String>,
    pub aperture_type: Option<String>,
    pub focal_length: Option<f64>,
    pub focal_length_units: Option<String>,
    pub focal_ratio: Option<String>,
    pub location: Option<TelescopeLocation>,
}

impl Telescope {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Site of a telescope. Longitude and latitude are in degrees, altitude in metres.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct TelescopeLocation {
    #[serde(flatten)]
    pub attributes: RtmlAttributes,
    pub name: Option<String>,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    pub altitude: Option<f64>,
}

impl TelescopeLocation {
    pub fn new() -> Self {
        Self::default()
    }
}
