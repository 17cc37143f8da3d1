//! Fixed decimal patterns used by the encoders.
//!
//! A pattern such as `0.0##` is read as: at least one integer digit, at least
//! one and at most three fraction digits, trailing zeros beyond the minimum
//! dropped.

/// Immutable decimal formatter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberPattern {
    min_integer_digits: usize,
    min_fraction_digits: usize,
    max_fraction_digits: usize,
}

impl NumberPattern {
    pub const fn new(min_integer: usize, min_fraction: usize, max_fraction: usize) -> Self {
        Self {
            min_integer_digits: min_integer,
            min_fraction_digits: min_fraction,
            max_fraction_digits: max_fraction,
        }
    }

    pub fn format(&self, value: f64) -> String {
        if !value.is_finite() {
            return value.to_string();
        }

        let rounded = format!("{:.*}", self.max_fraction_digits, value.abs());
        let (integer, fraction) = match rounded.split_once('.') {
            Some((i, f)) => (i, f.trim_end_matches('0')),
            None => (rounded.as_str(), ""),
        };

        let mut fraction = fraction.to_string();
        while fraction.len() < self.min_fraction_digits {
            fraction.push('0');
        }

        let mut out = String::new();
        let is_zero = integer.chars().all(|c| c == '0') && fraction.chars().all(|c| c == '0');
        if value.is_sign_negative() && !is_zero {
            out.push('-');
        }
        for _ in integer.len()..self.min_integer_digits {
            out.push('0');
        }
        out.push_str(integer);
        if !fraction.is_empty() {
            out.push('.');
            out.push_str(&fraction);
        }
        out
    }
}

/// `00`: sexagesimal hours, minutes, degrees, arcminutes.
pub const TWO_DIGITS: NumberPattern = NumberPattern::new(2, 0, 0);
/// `00.00`: sexagesimal seconds and arcseconds.
pub const SEXAGESIMAL_SECONDS: NumberPattern = NumberPattern::new(2, 2, 2);
/// `0.##`: aperture and focal length.
pub const OPTICS: NumberPattern = NumberPattern::new(1, 0, 2);
/// `0.0#####`: site longitude and latitude.
pub const GEODETIC: NumberPattern = NumberPattern::new(1, 1, 6);
/// `0.0#`: altitude.
pub const ALTITUDE: NumberPattern = NumberPattern::new(1, 1, 2);
/// `0.0##`: exposure length.
pub const EXPOSURE: NumberPattern = NumberPattern::new(1, 1, 3);
/// `0.0#`: seeing bounds and moon constraint values.
pub const CONSTRAINT: NumberPattern = NumberPattern::new(1, 1, 2);
/// `0.0##`: grating wavelength, resolution and angle.
pub const GRATING: NumberPattern = NumberPattern::new(1, 1, 3);

/// Shortest text that parses back to the same value; NaN is written `NaN`.
pub fn format_shortest(value: f64) -> String {
    value.to_string()
}
