//! ISO-8601 date handling.
//!
//! RTML writes instants as `2005-03-01T12:00:00+00:00`. Readers accept a
//! trailing `Z`, a `+hh:mm` or `+hhmm` offset, or no offset at all (taken as
//! UTC), each with optional fractional seconds.

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use serde::{Serialize, Serializer};
use std::fmt;
use thiserror::Error;

/// Literal that RTML uses for an unbounded time.
pub const NEVER: &str = "never";

const OUTPUT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DateError {
    #[error("empty date string")]
    Empty,

    #[error("'{value}' is not an ISO-8601 date")]
    Invalid {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

/// Parse an ISO-8601 date with an optional timezone.
pub fn parse_date(text: &str) -> Result<DateTime<FixedOffset>, DateError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(DateError::Empty);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt);
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f%:z", "%Y-%m-%dT%H:%M:%S%.f%z"] {
        if let Ok(dt) = DateTime::parse_from_str(trimmed, format) {
            return Ok(dt);
        }
    }

    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc().fixed_offset())
        .map_err(|source| DateError::Invalid {
            value: trimmed.to_string(),
            source,
        })
}

/// Format with whole seconds and a colon separated offset.
pub fn format_date(date: &DateTime<FixedOffset>) -> String {
    date.format(OUTPUT_FORMAT).to_string()
}

/// A point in time that may also be open ended.
///
/// Wrapped in `Option` on the model, this gives three states: element absent
/// (`None`), explicitly unbounded (`Some(Never)`), or a concrete instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeBound {
    Never,
    At(DateTime<FixedOffset>),
}

impl TimeBound {
    /// Parses either the literal `never` or a date.
    pub fn parse(text: &str) -> Result<Self, DateError> {
        if text.trim() == NEVER {
            Ok(TimeBound::Never)
        } else {
            parse_date(text).map(TimeBound::At)
        }
    }

    pub fn instant(&self) -> Option<&DateTime<FixedOffset>> {
        match self {
            TimeBound::Never => None,
            TimeBound::At(dt) => Some(dt),
        }
    }

    pub fn is_never(&self) -> bool {
        matches!(self, TimeBound::Never)
    }
}

impl From<DateTime<FixedOffset>> for TimeBound {
    fn from(dt: DateTime<FixedOffset>) -> Self {
        TimeBound::At(dt)
    }
}

impl fmt::Display for TimeBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeBound::Never => f.write_str(NEVER),
            TimeBound::At(dt) => f.write_str(&format_date(dt)),
        }
    }
}

impl Serialize for TimeBound {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}
