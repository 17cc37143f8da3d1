use crate::errors::RtmlError;
use serde::Serialize;

rtml_vocabulary! {
    /// Kind of instrument.
    DeviceType("device type") {
        Camera => "camera",
        Spectrograph => "spectrograph",
        Photometer => "photometer",
        Polarimeter => "polarimeter",
        Spectropolarimeter => "spectropolarimeter",
        WeatherStation => "weatherStation",
        Autoguider => "autoguider",
        WebCamera => "webCamera",
        SkyMonitor => "skyMonitor",
        Other => "other",
    }
}

rtml_vocabulary! {
    /// Part of the spectrum a device observes in.
    SpectralRegion("spectral region") {
        Radio => "radio",
        Millimeter => "millimeter",
        Infrared => "infrared",
        Optical => "optical",
        Ultraviolet => "ultraviolet",
        XRay => "x-ray",
        GammaRay => "gamma-ray",
        Other => "other",
    }
}

/// An instrument. A device on an observation overrides the document device.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Device {
    pub device_type: Option<DeviceType>,
    pub spectral_region: Option<SpectralRegion>,
    pub name: Option<String>,
    pub filter_type: Option<String>,
    pub detector: Option<Detector>,
    pub grating: Option<Grating>,
}

impl Device {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_device_type_str(&mut self, value: &str) -> Result<(), RtmlError> {
        self.device_type = Some(value.parse()?);
        Ok(())
    }

    pub fn set_spectral_region_str(&mut self, value: &str) -> Result<(), RtmlError> {
        self.spectral_region = Some(value.parse()?);
        Ok(())
    }
}

/// Detector binning. Both axes default to 2.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Detector {
    row_binning: u32,
    column_binning: u32,
}

impl Default for Detector {
    fn default() -> Self {
        Self {
            row_binning: 2,
            column_binning: 2,
        }
    }
}

impl Detector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_binning(rows: u32, columns: u32) -> Result<Self, RtmlError> {
        let mut detector = Self::default();
        detector.set_row_binning(rows)?;
        detector.set_column_binning(columns)?;
        Ok(detector)
    }

    pub fn row_binning(&self) -> u32 {
        self.row_binning
    }

    pub fn column_binning(&self) -> u32 {
        self.column_binning
    }

    pub fn set_row_binning(&mut self, rows: u32) -> Result<(), RtmlError> {
        self.row_binning = check_binning("row binning", rows)?;
        Ok(())
    }

    pub fn set_column_binning(&mut self, columns: u32) -> Result<(), RtmlError> {
        self.column_binning = check_binning("column binning", columns)?;
        Ok(())
    }
}

fn check_binning(field: &str, value: u32) -> Result<u32, RtmlError> {
    if value == 0 {
        return Err(RtmlError::value("model::Detector", field, "0"));
    }
    Ok(value)
}

/// Spectrograph grating (3.1a).
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Grating {
    pub name: Option<String>,
    pub wavelength: Option<f64>,
    pub wavelength_units: Option<String>,
    pub resolution: Option<f64>,
    pub angle: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_type_vocabulary() {
        for ty in DeviceType::ALL {
            let mut device = Device::new();
            device.set_device_type_str(ty.as_str()).unwrap();
            assert_eq!(device.device_type.map(|t| t.as_str()), Some(ty.as_str()));
        }
    }

    #[test]
    fn test_device_type_rejects_unknown() {
        let mut device = Device::new();
        for bad in ["Camera", "telescope", "", "camera "] {
            let err = device.set_device_type_str(bad).unwrap_err();
            assert!(err.is_value(), "{}", bad);
        }
        assert_eq!(device.device_type, None);
    }

    #[test]
    fn test_spectral_region() {
        let mut device = Device::new();
        device.set_spectral_region_str("x-ray").unwrap();
        assert_eq!(device.spectral_region, Some(SpectralRegion::XRay));
        assert!(device.set_spectral_region_str("xray").is_err());
    }

    #[test]
    fn test_detector_binning() {
        let detector = Detector::new();
        assert_eq!((detector.row_binning(), detector.column_binning()), (2, 2));
        assert!(Detector::with_binning(0, 1).is_err());
        let detector = Detector::with_binning(1, 3).unwrap();
        assert_eq!((detector.row_binning(), detector.column_binning()), (1, 3));
    }
}
