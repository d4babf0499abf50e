// SPDX-License-Identifier: Apache-2.0

use crate::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub const PLANNING_HORIZON_MIN_YEARS: u32 = 1;
pub const PLANNING_HORIZON_MAX_YEARS: u32 = 50;

/// Number of years the injection need is planned over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct PlanningHorizon(u32);

impl PlanningHorizon {
    pub fn new(years: u32) -> Result<Self, ValidationError> {
        if !(PLANNING_HORIZON_MIN_YEARS..=PLANNING_HORIZON_MAX_YEARS).contains(&years) {
            return Err(ValidationError(format!(
                "planning horizon must be between {PLANNING_HORIZON_MIN_YEARS} and {PLANNING_HORIZON_MAX_YEARS} years, got {years}"
            )));
        }
        Ok(Self(years))
    }

    /// Parses the text a user typed into the horizon field.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let s = input.trim();
        if s.is_empty() {
            return Err(ValidationError(
                "planning horizon must not be empty".to_string(),
            ));
        }
        let years = s.parse::<u32>().map_err(|_| {
            ValidationError(format!("planning horizon must be a whole number, got `{s}`"))
        })?;
        Self::new(years)
    }

    #[must_use]
    pub const fn years(self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for PlanningHorizon {
    type Error = ValidationError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PlanningHorizon> for u32 {
    fn from(value: PlanningHorizon) -> Self {
        value.0
    }
}

impl Display for PlanningHorizon {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
