// SPDX-License-Identifier: Apache-2.0

//! One row type per pipeline stage.
//!
//! Fields that a stage computes are optional on the wire; the invariants
//! between stages (a ratio needs both recharge and demand, a stress value
//! needs a prior ratio) are enforced with `enforce_invariants` when a
//! response is applied.

use crate::DemandCategory;
use serde::{Deserialize, Serialize};

pub trait VillageKeyed {
    fn village_name(&self) -> &str;
    fn village_code(&self) -> Option<&str>;

    /// Join key between stage tables: the code when present, else the name.
    fn village_key(&self) -> &str {
        match self.village_code() {
            Some(code) if !code.trim().is_empty() => code,
            _ => self.village_name(),
        }
    }
}

macro_rules! impl_village_keyed {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl VillageKeyed for $ty {
                fn village_name(&self) -> &str {
                    &self.village_name
                }

                fn village_code(&self) -> Option<&str> {
                    self.village_code.as_deref()
                }
            }
        )+
    };
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RechargeRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub village_code: Option<String>,
    #[serde(alias = "village")]
    pub village_name: String,
    #[serde(default)]
    pub recharge: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub village_code: Option<String>,
    #[serde(alias = "village")]
    pub village_name: String,
    #[serde(default, alias = "total_demand")]
    pub demand: Option<f64>,
}

/// Per-village sum of the enabled demand categories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TotalDemandRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub village_code: Option<String>,
    pub village_name: String,
    #[serde(default)]
    pub domestic: Option<f64>,
    #[serde(default)]
    pub agricultural: Option<f64>,
    #[serde(default)]
    pub industrial: Option<f64>,
    #[serde(default)]
    pub total_demand: Option<f64>,
}

impl TotalDemandRow {
    #[must_use]
    pub fn new(village_code: Option<String>, village_name: String) -> Self {
        Self {
            village_code,
            village_name,
            domestic: None,
            agricultural: None,
            industrial: None,
            total_demand: None,
        }
    }

    #[must_use]
    pub fn category(&self, category: DemandCategory) -> Option<f64> {
        match category {
            DemandCategory::Domestic => self.domestic,
            DemandCategory::Agricultural => self.agricultural,
            DemandCategory::Industrial => self.industrial,
        }
    }

    /// Adds a category volume; the total stays `None` until some category has a value.
    pub fn add(&mut self, category: DemandCategory, value: Option<f64>) {
        let Some(v) = value else {
            return;
        };
        let slot = match category {
            DemandCategory::Domestic => &mut self.domestic,
            DemandCategory::Agricultural => &mut self.agricultural,
            DemandCategory::Industrial => &mut self.industrial,
        };
        *slot = Some(slot.unwrap_or(0.0) + v);
        self.total_demand = Some(self.total_demand.unwrap_or(0.0) + v);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrendStatus {
    #[serde(alias = "increasing", alias = "Rising", alias = "rising")]
    Increasing,
    #[serde(alias = "decreasing", alias = "Falling", alias = "falling")]
    Decreasing,
    #[serde(
        rename = "No Significant Trend",
        alias = "no_significant_trend",
        alias = "No Trend",
        alias = "no_trend"
    )]
    NoSignificantTrend,
    #[serde(other)]
    Unknown,
}

impl TrendStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Increasing => "Increasing",
            Self::Decreasing => "Decreasing",
            Self::NoSignificantTrend => "No Significant Trend",
            Self::Unknown => "Unknown",
        }
    }
}

/// Classification band parsed from the label the GSR service returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GsrBand {
    Safe,
    SemiCritical,
    Critical,
    OverExploited,
    Unknown,
}

impl GsrBand {
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        let squashed: String = label
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match squashed.as_str() {
            "safe" => Self::Safe,
            "semicritical" => Self::SemiCritical,
            "critical" => Self::Critical,
            "overexploited" => Self::OverExploited,
            _ => Self::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GsrRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub village_code: Option<String>,
    #[serde(alias = "village")]
    pub village_name: String,
    #[serde(default)]
    pub recharge: Option<f64>,
    #[serde(default, alias = "demand")]
    pub total_demand: Option<f64>,
    #[serde(default, alias = "gsr_ratio")]
    pub gsr: Option<f64>,
    #[serde(default, alias = "classification")]
    pub gsr_classification: Option<String>,
    #[serde(default, alias = "color")]
    pub classification_color: Option<String>,
    #[serde(default)]
    pub trend_status: Option<TrendStatus>,
}

impl GsrRow {
    #[must_use]
    pub fn band(&self) -> Option<GsrBand> {
        self.gsr_classification.as_deref().map(GsrBand::from_label)
    }

    /// Drops a ratio the upstream tables cannot back, then a classification
    /// without a ratio. Returns true when the row was changed.
    pub fn enforce_invariants(&mut self, has_recharge: bool, has_demand: bool) -> bool {
        let mut changed = false;
        if self.gsr.is_some() && !(has_recharge && has_demand) {
            self.gsr = None;
            changed = true;
        }
        if self.gsr.is_none()
            && (self.gsr_classification.is_some() || self.classification_color.is_some())
        {
            self.gsr_classification = None;
            self.classification_color = None;
            changed = true;
        }
        changed
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub village_code: Option<String>,
    #[serde(alias = "village")]
    pub village_name: String,
    #[serde(default, alias = "gsr_ratio")]
    pub gsr: Option<f64>,
    #[serde(default)]
    pub trend_status: Option<TrendStatus>,
    #[serde(default, alias = "injection", alias = "injection_need")]
    pub stress_value: Option<f64>,
}

impl StressRow {
    /// A stress value is only meaningful for villages that had a ratio.
    pub fn enforce_invariants(&mut self, had_gsr: bool) -> bool {
        if had_gsr {
            return false;
        }
        let changed = self.stress_value.is_some() || self.gsr.is_some();
        self.stress_value = None;
        self.gsr = None;
        changed
    }
}

impl_village_keyed!(RechargeRow, DemandRow, TotalDemandRow, GsrRow, StressRow);
