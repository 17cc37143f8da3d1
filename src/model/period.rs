//! ISO-8601 style durations (`P1Y2M3DT4H5M6.5S`).
//!
//! Conversion to milliseconds is deliberately calendar free: a month is 30
//! days and a year is 365 days.

use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const MILLISECONDS_PER_SECOND: u64 = 1_000;
pub const MILLISECONDS_PER_MINUTE: u64 = 60 * MILLISECONDS_PER_SECOND;
pub const MILLISECONDS_PER_HOUR: u64 = 60 * MILLISECONDS_PER_MINUTE;
pub const MILLISECONDS_PER_DAY: u64 = 24 * MILLISECONDS_PER_HOUR;
pub const DAYS_PER_MONTH: u64 = 30;
pub const DAYS_PER_YEAR: u64 = 365;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PeriodError {
    #[error("period '{0}' does not start with 'P'")]
    MissingDesignator(String),

    #[error("period '{0}' has no components")]
    Empty(String),

    #[error("period '{0}' has nothing after 'T'")]
    EmptyTime(String),

    #[error("period '{period}' has a number with no unit: '{number}'")]
    DanglingNumber { period: String, number: String },

    #[error("period '{period}' has unit '{unit}' with no number")]
    MissingNumber { period: String, unit: char },

    #[error("period '{period}' has '{unit}' in the wrong place")]
    Misplaced { period: String, unit: char },

    #[error("period '{period}' repeats the time designator 'T'")]
    RepeatedTime { period: String },

    #[error("period '{period}' has unexpected character '{found}'")]
    UnexpectedCharacter { period: String, found: char },

    #[error("period '{period}' has invalid number '{number}' for '{unit}'")]
    InvalidNumber {
        period: String,
        number: String,
        unit: char,
    },

    #[error("seconds must be a finite value >= 0, got {0}")]
    NegativeSeconds(f64),
}

/// A duration split into calendar style components.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PeriodFormat {
    years: u32,
    months: u32,
    days: u32,
    hours: u32,
    minutes: u32,
    seconds: f64,
}

impl PeriodFormat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn years(&self) -> u32 {
        self.years
    }

    pub fn months(&self) -> u32 {
        self.months
    }

    pub fn days(&self) -> u32 {
        self.days
    }

    pub fn hours(&self) -> u32 {
        self.hours
    }

    pub fn minutes(&self) -> u32 {
        self.minutes
    }

    pub fn seconds(&self) -> f64 {
        self.seconds
    }

    pub fn set_years(&mut self, years: u32) {
        self.years = years;
    }

    pub fn set_months(&mut self, months: u32) {
        self.months = months;
    }

    pub fn set_days(&mut self, days: u32) {
        self.days = days;
    }

    pub fn set_hours(&mut self, hours: u32) {
        self.hours = hours;
    }

    pub fn set_minutes(&mut self, minutes: u32) {
        self.minutes = minutes;
    }

    pub fn set_seconds(&mut self, seconds: f64) -> Result<(), PeriodError> {
        if !seconds.is_finite() || seconds < 0.0 {
            return Err(PeriodError::NegativeSeconds(seconds));
        }
        self.seconds = seconds;
        Ok(())
    }

    pub fn is_zero(&self) -> bool {
        self.years == 0
            && self.months == 0
            && self.days == 0
            && self.hours == 0
            && self.minutes == 0
            && self.seconds == 0.0
    }

    /// Total length in milliseconds, with 30 day months and 365 day years.
    /// `None` when the total does not fit in a `u64`.
    pub fn milliseconds(&self) -> Option<u64> {
        let days = (self.years as u64)
            .checked_mul(DAYS_PER_YEAR)?
            .checked_add((self.months as u64).checked_mul(DAYS_PER_MONTH)?)?
            .checked_add(self.days as u64)?;
        let fraction = (self.seconds * MILLISECONDS_PER_SECOND as f64).round();
        if !fraction.is_finite() || fraction >= u64::MAX as f64 {
            return None;
        }
        days.checked_mul(MILLISECONDS_PER_DAY)?
            .checked_add((self.hours as u64).checked_mul(MILLISECONDS_PER_HOUR)?)?
            .checked_add((self.minutes as u64).checked_mul(MILLISECONDS_PER_MINUTE)?)?
            .checked_add(fraction as u64)
    }

    /// Splits a millisecond count into days, hours, minutes and seconds.
    /// Years and months are never produced. `None` when the day count does
    /// not fit in a `u32`.
    pub fn from_milliseconds(milliseconds: u64) -> Option<Self> {
        let days = u32::try_from(milliseconds / MILLISECONDS_PER_DAY).ok()?;
        let rest = milliseconds % MILLISECONDS_PER_DAY;
        let hours = rest / MILLISECONDS_PER_HOUR;
        let rest = rest % MILLISECONDS_PER_HOUR;
        let minutes = rest / MILLISECONDS_PER_MINUTE;
        let rest = rest % MILLISECONDS_PER_MINUTE;
        Some(Self {
            years: 0,
            months: 0,
            days,
            hours: hours as u32,
            minutes: minutes as u32,
            seconds: rest as f64 / MILLISECONDS_PER_SECOND as f64,
        })
    }
}

/// Position of each unit in the ordering; the scan requires strictly
/// increasing ranks.
fn rank(unit: char, after_time: bool) -> Option<u8> {
    match (unit, after_time) {
        ('Y', false) => Some(1),
        ('M', false) => Some(2),
        ('D', false) => Some(3),
        ('H', true) => Some(4),
        ('M', true) => Some(5),
        ('S', true) => Some(6),
        _ => None,
    }
}

impl FromStr for PeriodFormat {
    type Err = PeriodError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let period = text.trim();
        let body = period
            .strip_prefix('P')
            .ok_or_else(|| PeriodError::MissingDesignator(period.to_string()))?;

        let mut result = PeriodFormat::default();
        let mut pending = String::new();
        let mut after_time = false;
        let mut last_rank = 0u8;
        let mut components = 0usize;
        let mut time_components = 0usize;

        for c in body.chars() {
            match c {
                '0'..='9' | '.' => pending.push(c),
                'T' => {
                    if !pending.is_empty() {
                        return Err(PeriodError::DanglingNumber {
                            period: period.to_string(),
                            number: pending,
                        });
                    }
                    if after_time {
                        return Err(PeriodError::RepeatedTime {
                            period: period.to_string(),
                        });
                    }
                    after_time = true;
                }
                'Y' | 'M' | 'D' | 'H' | 'S' => {
                    if pending.is_empty() {
                        return Err(PeriodError::MissingNumber {
                            period: period.to_string(),
                            unit: c,
                        });
                    }
                    let r = rank(c, after_time)
                        .filter(|r| *r > last_rank)
                        .ok_or_else(|| PeriodError::Misplaced {
                            period: period.to_string(),
                            unit: c,
                        })?;
                    last_rank = r;

                    let number = std::mem::take(&mut pending);
                    let invalid = || PeriodError::InvalidNumber {
                        period: period.to_string(),
                        number: number.clone(),
                        unit: c,
                    };
                    if r == 6 {
                        let seconds = number.parse::<f64>().map_err(|_| invalid())?;
                        result.set_seconds(seconds)?;
                    } else {
                        let value = number.parse::<u32>().map_err(|_| invalid())?;
                        match r {
                            1 => result.years = value,
                            2 => result.months = value,
                            3 => result.days = value,
                            4 => result.hours = value,
                            _ => result.minutes = value,
                        }
                    }
                    components += 1;
                    if after_time {
                        time_components += 1;
                    }
                }
                other => {
                    return Err(PeriodError::UnexpectedCharacter {
                        period: period.to_string(),
                        found: other,
                    });
                }
            }
        }

        if !pending.is_empty() {
            return Err(PeriodError::DanglingNumber {
                period: period.to_string(),
                number: pending,
            });
        }
        if after_time && time_components == 0 {
            return Err(PeriodError::EmptyTime(period.to_string()));
        }
        if components == 0 {
            return Err(PeriodError::Empty(period.to_string()));
        }
        Ok(result)
    }
}

impl fmt::Display for PeriodFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return f.write_str("PT0S");
        }
        f.write_str("P")?;
        if self.years > 0 {
            write!(f, "{}Y", self.years)?;
        }
        if self.months > 0 {
            write!(f, "{}M", self.months)?;
        }
        if self.days > 0 {
            write!(f, "{}D", self.days)?;
        }
        if self.hours > 0 || self.minutes > 0 || self.seconds > 0.0 {
            f.write_str("T")?;
            if self.hours > 0 {
                write!(f, "{}H", self.hours)?;
            }
            if self.minutes > 0 {
                write!(f, "{}M", self.minutes)?;
            }
            if self.seconds > 0.0 {
                write!(f, "{}S", self.seconds)?;
            }
        }
        Ok(())
    }
}

impl Serialize for PeriodFormat {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}
