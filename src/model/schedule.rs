//! When and how an observation should be taken.

use super::PeriodFormat;
use crate::date::TimeBound;
use crate::errors::RtmlError;
use serde::Serialize;

rtml_vocabulary! {
    /// How the exposure length is interpreted.
    #[derive(Default)]
    ExposureType("exposure type") {
        #[default]
        Time => "time",
        Snr => "snr",
    }
}

rtml_vocabulary! {
    SkyBrightness("sky brightness") {
        Dark => "dark",
        Grey => "grey",
        Gray => "gray",
        Bright => "bright",
    }
}

rtml_vocabulary! {
    CloudCover("cloud cover") {
        Clear => "clear",
        Light => "light",
        Scattered => "scattered",
        Heavy => "heavy",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Schedule {
    /// 0 is the highest priority (target of opportunity); default is 1.
    pub priority: i32,
    pub exposure_type: ExposureType,
    pub exposure_units: Option<String>,
    pub exposure_length: Option<f64>,
    exposure_count: u32,
    pub start_date: Option<TimeBound>,
    pub end_date: Option<TimeBound>,
    pub series_constraint: Option<SeriesConstraint>,
    pub seeing_constraint: Option<SeeingConstraint>,
    pub moon_constraint: Option<MoonConstraint>,
    pub sky_constraint: Option<SkyConstraint>,
    pub extinction_constraint: Option<ExtinctionConstraint>,
}

impl Default for Schedule {
    fn default() -> Self {
        Self {
            priority: 1,
            exposure_type: ExposureType::default(),
            exposure_units: None,
            exposure_length: None,
            exposure_count: 1,
            start_date: None,
            end_date: None,
            series_constraint: None,
            seeing_constraint: None,
            moon_constraint: None,
            sky_constraint: None,
            extinction_constraint: None,
        }
    }
}

impl AsMut<Schedule> for Schedule {
    fn as_mut(&mut self) -> &mut Schedule {
        self
    }
}

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exposure_count(&self) -> u32 {
        self.exposure_count
    }

    pub fn set_exposure_count(&mut self, count: u32) -> Result<(), RtmlError> {
        if count < 1 {
            return Err(RtmlError::value(
                "model::Schedule",
                "exposure count",
                count.to_string(),
            ));
        }
        self.exposure_count = count;
        Ok(())
    }

    pub fn set_exposure_type_str(&mut self, value: &str) -> Result<(), RtmlError> {
        self.exposure_type = value.parse()?;
        Ok(())
    }

    /// A monitor group repeats the observation more than once.
    pub fn is_monitor_group(&self) -> bool {
        self.series_constraint
            .as_ref()
            .and_then(|s| s.count)
            .is_some_and(|count| count > 1)
    }

    /// Exposure length in milliseconds, for `time` exposures with known units.
    pub fn exposure_length_milliseconds(&self) -> Option<f64> {
        if self.exposure_type != ExposureType::Time {
            return None;
        }
        let length = self.exposure_length?;
        let factor = match self.exposure_units.as_deref()? {
            "ms" | "milliseconds" => 1.0,
            "s" | "sec" | "secs" | "second" | "seconds" => 1_000.0,
            "min" | "mins" | "minute" | "minutes" => 60_000.0,
            "hr" | "hrs" | "hour" | "hours" => 3_600_000.0,
            _ => return None,
        };
        Some(length * factor)
    }
}

/// Repeat the observation `count` times, `interval` ± `tolerance` apart.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SeriesConstraint {
    pub count: Option<u32>,
    pub interval: Option<PeriodFormat>,
    pub tolerance: Option<PeriodFormat>,
}

/// Acceptable seeing range in arcseconds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeeingConstraint {
    pub minimum: f64,
    pub maximum: f64,
}

impl Default for SeeingConstraint {
    fn default() -> Self {
        Self {
            minimum: 0.0,
            maximum: 10.0,
        }
    }
}

impl SeeingConstraint {
    pub fn new(minimum: f64, maximum: f64) -> Self {
        Self { minimum, maximum }
    }

    pub fn accepts(&self, seeing: f64) -> bool {
        self.minimum <= seeing && seeing <= self.maximum
    }
}

const DEGREE_UNITS: [&str; 4] = ["deg", "degs", "degree", "degrees"];
const RADIAN_UNITS: [&str; 4] = ["rad", "rads", "radian", "radians"];

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct MoonConstraint {
    pub max_phase: Option<f64>,
    pub distance: Option<f64>,
    distance_units: Option<String>,
    /// Lorentzian weighting width; carried but not interpreted.
    pub width: Option<f64>,
}

impl MoonConstraint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn distance_units(&self) -> Option<&str> {
        self.distance_units.as_deref()
    }

    /// Accepts any spelling from the degree or radian families.
    pub fn set_distance_units(&mut self, units: &str) -> Result<(), RtmlError> {
        if !DEGREE_UNITS.contains(&units) && !RADIAN_UNITS.contains(&units) {
            return Err(RtmlError::value("model::MoonConstraint", "distance units", units));
        }
        self.distance_units = Some(units.to_string());
        Ok(())
    }

    fn in_radians(&self) -> bool {
        self.distance_units
            .as_deref()
            .is_some_and(|u| RADIAN_UNITS.contains(&u))
    }

    /// Distance in degrees. Missing units are taken as degrees.
    pub fn distance_degrees(&self) -> Option<f64> {
        let distance = self.distance?;
        Some(if self.in_radians() {
            distance.to_degrees()
        } else {
            distance
        })
    }

    pub fn distance_radians(&self) -> Option<f64> {
        let distance = self.distance?;
        Some(if self.in_radians() {
            distance
        } else {
            distance.to_radians()
        })
    }
}

/// Sky brightness requirement. Equality looks at the descriptor only.
#[derive(Debug, Clone, Serialize)]
pub struct SkyConstraint {
    pub sky: SkyBrightness,
    pub value: Option<f64>,
    pub units: Option<String>,
}

impl SkyConstraint {
    pub fn new(sky: SkyBrightness) -> Self {
        Self {
            sky,
            value: None,
            units: None,
        }
    }
}

impl PartialEq for SkyConstraint {
    fn eq(&self, other: &Self) -> bool {
        self.sky == other.sky
    }
}

/// Cloud cover requirement. Equality looks at the descriptor only.
#[derive(Debug, Clone, Serialize)]
pub struct ExtinctionConstraint {
    pub clouds: CloudCover,
    pub value: Option<f64>,
    pub units: Option<String>,
}

impl ExtinctionConstraint {
    pub fn new(clouds: CloudCover) -> Self {
        Self {
            clouds,
            value: None,
            units: None,
        }
    }
}

impl PartialEq for ExtinctionConstraint {
    fn eq(&self, other: &Self) -> bool {
        self.clouds == other.clouds
    }
}
