// SPDX-License-Identifier: Apache-2.0

use crate::ValidationError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WellRecord {
    pub well_id: String,
    pub village_code: String,
    #[serde(default)]
    pub pre_monsoon_level_m: Option<f64>,
    #[serde(default)]
    pub post_monsoon_level_m: Option<f64>,
    #[serde(default)]
    pub specific_yield: Option<f64>,
}

/// Observation wells the recharge computation is based on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WellsDataset {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub wells: Vec<WellRecord>,
}

impl WellsDataset {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.wells.is_empty()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.wells.is_empty() {
            return Err(ValidationError::new("wells dataset has no wells"));
        }
        for w in &self.wells {
            if w.well_id.trim().is_empty() || w.village_code.trim().is_empty() {
                return Err(ValidationError::new(
                    "every well needs a well_id and a village_code",
                ));
            }
            if let Some(sy) = w.specific_yield {
                if !(0.0..=1.0).contains(&sy) {
                    return Err(ValidationError(format!(
                        "well {} has specific yield {sy} outside [0, 1]",
                        w.well_id
                    )));
                }
            }
        }
        Ok(())
    }
}
