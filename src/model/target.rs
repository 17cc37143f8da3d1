use crate::angle::Angle;
use crate::errors::RtmlError;
use serde::Serialize;

rtml_vocabulary! {
    #[derive(Default)]
    TargetType("target type") {
        #[default]
        Normal => "normal",
        /// Target of opportunity: interrupts the normal queue.
        Toop => "toop",
    }
}

/// What to point at. RA and Dec are independently optional, so a target may
/// be named only and resolved later.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Target {
    pub target_type: TargetType,
    pub ident: Option<String>,
    pub name: Option<String>,
    pub ra: Option<Angle>,
    pub dec: Option<Angle>,
    pub equinox: Option<String>,
}

impl Target {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_target_type_str(&mut self, value: &str) -> Result<(), RtmlError> {
        self.target_type = value.parse()?;
        Ok(())
    }

    pub fn is_target_of_opportunity(&self) -> bool {
        self.target_type == TargetType::Toop
    }
}
