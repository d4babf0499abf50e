// SPDX-License-Identifier: Apache-2.0

use crate::ValidationError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DemandCategory {
    Domestic,
    Agricultural,
    Industrial,
}

impl DemandCategory {
    pub const ALL: [Self; 3] = [Self::Domestic, Self::Agricultural, Self::Industrial];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Domestic => "domestic",
            Self::Agricultural => "agricultural",
            Self::Industrial => "industrial",
        }
    }
}

impl Display for DemandCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Season {
    Kharif,
    Rabi,
    Zaid,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DomesticDemand {
    #[serde(default)]
    pub enabled: bool,
    /// Litres per capita per day.
    #[serde(default)]
    pub per_capita_lpcd: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgriculturalDemand {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub crops: BTreeMap<Season, Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndustrialDemand {
    #[serde(default)]
    pub enabled: bool,
    /// Share of industrial water drawn from groundwater, in (0, 1].
    #[serde(default)]
    pub extraction_factor: f64,
}

/// Which demand categories run and with what parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DemandSelection {
    #[serde(default)]
    pub domestic: DomesticDemand,
    #[serde(default)]
    pub agricultural: AgriculturalDemand,
    #[serde(default)]
    pub industrial: IndustrialDemand,
}

impl DemandSelection {
    #[must_use]
    pub fn is_enabled(&self, category: DemandCategory) -> bool {
        match category {
            DemandCategory::Domestic => self.domestic.enabled,
            DemandCategory::Agricultural => self.agricultural.enabled,
            DemandCategory::Industrial => self.industrial.enabled,
        }
    }

    pub fn set_enabled(&mut self, category: DemandCategory, enabled: bool) {
        match category {
            DemandCategory::Domestic => self.domestic.enabled = enabled,
            DemandCategory::Agricultural => self.agricultural.enabled = enabled,
            DemandCategory::Industrial => self.industrial.enabled = enabled,
        }
    }

    #[must_use]
    pub fn enabled_categories(&self) -> Vec<DemandCategory> {
        DemandCategory::ALL
            .into_iter()
            .filter(|c| self.is_enabled(*c))
            .collect()
    }

    /// Checks the category-specific parameters regardless of the enabled flag.
    pub fn validate_params(&self, category: DemandCategory) -> Result<(), ValidationError> {
        match category {
            DemandCategory::Domestic => {
                let lpcd = self.domestic.per_capita_lpcd;
                if !lpcd.is_finite() || lpcd <= 0.0 {
                    return Err(ValidationError(format!(
                        "per-capita consumption must be greater than 0, got {lpcd}"
                    )));
                }
            }
            DemandCategory::Agricultural => {
                let selected = self
                    .agricultural
                    .crops
                    .values()
                    .flatten()
                    .filter(|c| !c.trim().is_empty())
                    .count();
                if selected == 0 {
                    return Err(ValidationError::new(
                        "select at least one crop in any season",
                    ));
                }
            }
            DemandCategory::Industrial => {
                let factor = self.industrial.extraction_factor;
                if !factor.is_finite() || factor <= 0.0 || factor > 1.0 {
                    return Err(ValidationError(format!(
                        "groundwater extraction factor must be in (0, 1], got {factor}"
                    )));
                }
            }
        }
        Ok(())
    }
}
