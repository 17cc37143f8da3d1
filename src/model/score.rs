use super::PeriodFormat;
use serde::Serialize;

/// One point of a 3.1a scoring curve: the chance of completing within `delay`.
///
/// Probability and cumulative may be NaN.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Score {
    pub delay: Option<PeriodFormat>,
    pub probability: Option<f64>,
    pub cumulative: Option<f64>,
}

impl Score {
    pub fn new(delay: PeriodFormat, probability: f64, cumulative: f64) -> Self {
        Self {
            delay: Some(delay),
            probability: Some(probability),
            cumulative: Some(cumulative),
        }
    }
}
