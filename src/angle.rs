//! Sexagesimal angle parsing and formatting.
//!
//! Right ascension is written in hours/minutes/seconds, declination in
//! signed degrees/arcminutes/arcseconds. Internally every angle is stored in
//! radians.

use serde::Serialize;
use std::f64::consts::PI;
use std::num::ParseFloatError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AngleError {
    #[error("empty sexagesimal string")]
    Empty,

    #[error("too many sexagesimal fields in '{0}'")]
    TooManyFields(String),

    #[error("invalid number '{value}' in sexagesimal string")]
    InvalidNumber {
        value: String,
        #[source]
        source: ParseFloatError,
    },

    #[error("{field} value {value} is out of range")]
    OutOfRange { field: &'static str, value: f64 },

    #[error("only the last sexagesimal field may have a fraction: '{0}'")]
    FractionalField(String),

    #[error("unexpected sign in '{0}'")]
    UnexpectedSign(String),
}

/// An angle in radians.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize)]
pub struct Angle(f64);

impl Angle {
    pub fn from_radians(radians: f64) -> Self {
        Angle(radians)
    }

    pub fn from_degrees(degrees: f64) -> Self {
        Angle(degrees.to_radians())
    }

    pub fn from_hours(hours: f64) -> Self {
        Angle(hours * PI / 12.0)
    }

    pub fn radians(&self) -> f64 {
        self.0
    }

    pub fn degrees(&self) -> f64 {
        self.0.to_degrees()
    }

    pub fn hours(&self) -> f64 {
        self.0 * 12.0 / PI
    }

    /// Decomposes into hours/minutes/seconds, rounding seconds to `decimals`
    /// places and wrapping into `[0h, 24h)`.
    pub fn to_hms(&self, decimals: u32) -> HmsParts {
        let scale = 10f64.powi(decimals as i32);
        let units_per_day = (24.0 * 3600.0 * scale) as i64;
        let mut total = (self.hours() * 3600.0 * scale).round() as i64;
        total = total.rem_euclid(units_per_day);
        let per_hour = (3600.0 * scale) as i64;
        let per_minute = (60.0 * scale) as i64;
        HmsParts {
            hours: (total / per_hour) as u32,
            minutes: ((total % per_hour) / per_minute) as u32,
            seconds: (total % per_minute) as f64 / scale,
        }
    }

    /// Decomposes into a sign flag plus unsigned degrees/arcminutes/arcseconds,
    /// rounding arcseconds to `decimals` places. A value that rounds to zero
    /// is never negative.
    pub fn to_dms(&self, decimals: u32) -> DmsParts {
        let scale = 10f64.powi(decimals as i32);
        let total = (self.degrees().abs() * 3600.0 * scale).round() as i64;
        let negative = self.0.is_sign_negative() && total != 0;
        let per_degree = (3600.0 * scale) as i64;
        let per_minute = (60.0 * scale) as i64;
        DmsParts {
            negative,
            degrees: (total / per_degree) as u32,
            arcminutes: ((total % per_degree) / per_minute) as u32,
            arcseconds: (total % per_minute) as f64 / scale,
        }
    }
}

/// Right ascension style decomposition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HmsParts {
    pub hours: u32,
    pub minutes: u32,
    pub seconds: f64,
}

impl HmsParts {
    pub fn new(hours: u32, minutes: u32, seconds: f64) -> Result<Self, AngleError> {
        if hours >= 24 {
            return Err(AngleError::OutOfRange {
                field: "hours",
                value: hours as f64,
            });
        }
        check_minutes_seconds(minutes as f64, seconds)?;
        Ok(Self {
            hours,
            minutes,
            seconds,
        })
    }

    pub fn to_angle(&self) -> Angle {
        Angle::from_hours(self.hours as f64 + self.minutes as f64 / 60.0 + self.seconds / 3600.0)
    }
}

/// Declination style decomposition; the sign is kept apart from the magnitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DmsParts {
    pub negative: bool,
    pub degrees: u32,
    pub arcminutes: u32,
    pub arcseconds: f64,
}

impl DmsParts {
    pub fn new(
        negative: bool,
        degrees: u32,
        arcminutes: u32,
        arcseconds: f64,
    ) -> Result<Self, AngleError> {
        check_minutes_seconds(arcminutes as f64, arcseconds)?;
        check_declination(degrees as f64 + arcminutes as f64 / 60.0 + arcseconds / 3600.0)?;
        Ok(Self {
            negative,
            degrees,
            arcminutes,
            arcseconds,
        })
    }

    pub fn sign_char(&self) -> char {
        if self.negative { '-' } else { '+' }
    }

    pub fn to_angle(&self) -> Angle {
        let magnitude =
            self.degrees as f64 + self.arcminutes as f64 / 60.0 + self.arcseconds / 3600.0;
        let degrees = if self.negative { -magnitude } else { magnitude };
        Angle::from_degrees(degrees)
    }
}

fn check_minutes_seconds(minutes: f64, seconds: f64) -> Result<(), AngleError> {
    if !(0.0..60.0).contains(&minutes) {
        return Err(AngleError::OutOfRange {
            field: "minutes",
            value: minutes,
        });
    }
    if !(0.0..60.0).contains(&seconds) {
        return Err(AngleError::OutOfRange {
            field: "seconds",
            value: seconds,
        });
    }
    Ok(())
}

fn check_declination(magnitude: f64) -> Result<(), AngleError> {
    if magnitude > 90.0 {
        return Err(AngleError::OutOfRange {
            field: "degrees",
            value: magnitude,
        });
    }
    Ok(())
}

/// Splits on whitespace or ':' and returns (negative, [major, minutes, seconds]).
fn split_fields(text: &str, allow_sign: bool) -> Result<(bool, [f64; 3]), AngleError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(AngleError::Empty);
    }

    let (negative, body) = match trimmed.chars().next() {
        Some('-') if allow_sign => (true, &trimmed[1..]),
        Some('+') if allow_sign => (false, &trimmed[1..]),
        Some('-') | Some('+') => return Err(AngleError::UnexpectedSign(trimmed.to_string())),
        _ => (false, trimmed),
    };

    let fields: Vec<&str> = body
        .split(|c: char| c.is_whitespace() || c == ':')
        .filter(|f| !f.is_empty())
        .collect();
    if fields.is_empty() {
        return Err(AngleError::Empty);
    }
    if fields.len() > 3 {
        return Err(AngleError::TooManyFields(trimmed.to_string()));
    }

    let mut values = [0.0; 3];
    for (i, field) in fields.iter().enumerate() {
        if field.starts_with('-') || field.starts_with('+') {
            return Err(AngleError::UnexpectedSign(trimmed.to_string()));
        }
        if i + 1 < fields.len() && field.contains('.') {
            return Err(AngleError::FractionalField(trimmed.to_string()));
        }
        values[i] = field
            .parse::<f64>()
            .map_err(|source| AngleError::InvalidNumber {
                value: field.to_string(),
                source,
            })?;
    }
    Ok((negative, values))
}

/// Parse an hours/minutes/seconds string such as `"01 02 03.00"` or `"1:2:3"`.
pub fn parse_hms(text: &str) -> Result<Angle, AngleError> {
    let (_, [hours, minutes, seconds]) = split_fields(text, false)?;
    if !(0.0..24.0).contains(&hours) {
        return Err(AngleError::OutOfRange {
            field: "hours",
            value: hours,
        });
    }
    check_minutes_seconds(minutes, seconds)?;
    Ok(Angle::from_hours(hours + minutes / 60.0 + seconds / 3600.0))
}

/// Parse a signed degrees/arcminutes/arcseconds string such as `"+45 56 01.00"`.
pub fn parse_dms(text: &str) -> Result<Angle, AngleError> {
    let (negative, [degrees, minutes, seconds]) = split_fields(text, true)?;
    check_minutes_seconds(minutes, seconds)?;
    let magnitude = degrees + minutes / 60.0 + seconds / 3600.0;
    check_declination(magnitude)?;
    Ok(Angle::from_degrees(if negative { -magnitude } else { magnitude }))
}

/// Format as `hh mm ss.ss` using the given delimiter.
pub fn format_hms(angle: Angle, delimiter: char) -> String {
    let parts = angle.to_hms(2);
    format!(
        "{:02}{d}{:02}{d}{:05.2}",
        parts.hours,
        parts.minutes,
        parts.seconds,
        d = delimiter
    )
}

/// Format as `sdd mm ss.ss` using the given delimiter; the sign is always written.
pub fn format_dms(angle: Angle, delimiter: char) -> String {
    let parts = angle.to_dms(2);
    format!(
        "{}{:02}{d}{:02}{d}{:05.2}",
        parts.sign_char(),
        parts.degrees,
        parts.arcminutes,
        parts.arcseconds,
        d = delimiter
    )
}
