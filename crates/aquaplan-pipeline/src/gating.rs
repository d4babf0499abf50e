// SPDX-License-Identifier: Apache-2.0

//! Pure precondition predicates over `PipelineState`.
//!
//! A false predicate is not an error: callers render the unmet
//! requirements next to the disabled action.

use crate::PipelineState;
use aquaplan_model::{DemandCategory, PlanningHorizon};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Requirement {
    NoVillagesSelected,
    SelectionNotConfirmed,
    WellsDatasetMissing,
    CategoryDisabled(DemandCategory),
    InvalidParameters {
        category: DemandCategory,
        reason: String,
    },
    RechargeMissing,
    TotalDemandMissing,
    GsrMissing,
    InvalidHorizon(String),
}

impl Display for Requirement {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoVillagesSelected => f.write_str("select at least one village"),
            Self::SelectionNotConfirmed => f.write_str("confirm the village selection"),
            Self::WellsDatasetMissing => f.write_str("save a wells dataset"),
            Self::CategoryDisabled(c) => write!(f, "enable {c} demand"),
            Self::InvalidParameters { category, reason } => {
                write!(f, "fix {category} demand parameters ({reason})")
            }
            Self::RechargeMissing => f.write_str("compute recharge first"),
            Self::TotalDemandMissing => f.write_str("compute at least one demand category first"),
            Self::GsrMissing => f.write_str("compute the groundwater sustainability ratio first"),
            Self::InvalidHorizon(reason) => write!(f, "enter a planning horizon ({reason})"),
        }
    }
}

#[must_use]
pub fn requirements_message(requirements: &[Requirement]) -> String {
    let parts: Vec<String> = requirements.iter().map(ToString::to_string).collect();
    format!("requirements not met: {}", parts.join("; "))
}

impl PipelineState {
    /// Villages chosen and the scope confirmed.
    #[must_use]
    pub fn selection_requirements(&self) -> Vec<Requirement> {
        if !self.scope.has_villages() {
            vec![Requirement::NoVillagesSelected]
        } else if !self.locked {
            vec![Requirement::SelectionNotConfirmed]
        } else {
            Vec::new()
        }
    }

    #[must_use]
    pub fn recharge_requirements(&self) -> Vec<Requirement> {
        let mut out = self.selection_requirements();
        if self.wells.as_ref().is_none_or(|w| w.is_empty()) {
            out.push(Requirement::WellsDatasetMissing);
        }
        out
    }

    #[must_use]
    pub fn can_compute_recharge(&self) -> bool {
        self.recharge_requirements().is_empty()
    }

    #[must_use]
    pub fn demand_requirements(&self, category: DemandCategory) -> Vec<Requirement> {
        let mut out = Vec::new();
        if !self.demand.is_enabled(category) {
            out.push(Requirement::CategoryDisabled(category));
        }
        if let Err(e) = self.demand.validate_params(category) {
            out.push(Requirement::InvalidParameters {
                category,
                reason: e.0,
            });
        }
        out.extend(self.selection_requirements());
        out
    }

    #[must_use]
    pub fn can_compute_demand(&self, category: DemandCategory) -> bool {
        self.demand_requirements(category).is_empty()
    }

    #[must_use]
    pub fn gsr_requirements(&self) -> Vec<Requirement> {
        let mut out = Vec::new();
        if self.recharge.is_empty() {
            out.push(Requirement::RechargeMissing);
        }
        if self.total_demand.is_empty() {
            out.push(Requirement::TotalDemandMissing);
        }
        out
    }

    #[must_use]
    pub fn can_compute_gsr(&self) -> bool {
        self.gsr_requirements().is_empty()
    }

    #[must_use]
    pub fn stress_requirements(&self, horizon_text: &str) -> Vec<Requirement> {
        let mut out = Vec::new();
        if self.gsr.is_empty() {
            out.push(Requirement::GsrMissing);
        }
        if let Err(e) = PlanningHorizon::parse(horizon_text) {
            out.push(Requirement::InvalidHorizon(e.0));
        }
        out
    }

    #[must_use]
    pub fn can_compute_stress(&self, horizon_text: &str) -> bool {
        self.stress_requirements(horizon_text).is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aquaplan_model::{
        GsrRow, RechargeRow, SelectionScope, Season, TotalDemandRow, VillageRef, WellRecord,
        WellsDataset,
    };

    fn scope(villages: bool) -> SelectionScope {
        SelectionScope {
            villages: if villages {
                vec![VillageRef {
                    village_code: "101".to_string(),
                    village_name: "Alpha".to_string(),
                    state_code: "09".to_string(),
                    district_code: "162".to_string(),
                    subdistrict_code: "00817".to_string(),
                }]
            } else {
                Vec::new()
            },
            ..SelectionScope::default()
        }
    }

    fn wells() -> WellsDataset {
        WellsDataset {
            name: "survey".to_string(),
            wells: vec![WellRecord {
                well_id: "W1".to_string(),
                village_code: "101".to_string(),
                pre_monsoon_level_m: Some(8.0),
                post_monsoon_level_m: Some(5.5),
                specific_yield: Some(0.12),
            }],
        }
    }

    fn bools3() -> impl Iterator<Item = (bool, bool, bool)> {
        (0..8u8).map(|m| (m & 1 != 0, m & 2 != 0, m & 4 != 0))
    }

    #[test]
    fn recharge_truth_table() {
        for (villages, locked, saved) in bools3() {
            let mut state = PipelineState {
                scope: scope(villages),
                locked,
                ..PipelineState::default()
            };
            if saved {
                state.wells = Some(wells());
            }
            assert_eq!(
                state.can_compute_recharge(),
                villages && locked && saved,
                "villages={villages} locked={locked} saved={saved}"
            );
        }
    }

    #[test]
    fn empty_wells_dataset_is_not_saved() {
        let state = PipelineState {
            scope: scope(true),
            locked: true,
            wells: Some(WellsDataset::default()),
            ..PipelineState::default()
        };
        assert_eq!(
            state.recharge_requirements(),
            vec![Requirement::WellsDatasetMissing]
        );
    }

    #[test]
    fn demand_truth_table_for_every_category() {
        for category in DemandCategory::ALL {
            for mask in 0..16u8 {
                let enabled = mask & 1 != 0;
                let valid = mask & 2 != 0;
                let villages = mask & 4 != 0;
                let locked = mask & 8 != 0;
                let mut state = PipelineState {
                    scope: scope(villages),
                    locked,
                    ..PipelineState::default()
                };
                state.demand.set_enabled(category, enabled);
                if valid {
                    state.demand.domestic.per_capita_lpcd = 60.0;
                    state
                        .demand
                        .agricultural
                        .crops
                        .insert(Season::Kharif, vec!["rice".to_string()]);
                    state.demand.industrial.extraction_factor = 0.8;
                }
                assert_eq!(
                    state.can_compute_demand(category),
                    enabled && valid && villages && locked,
                    "{category} mask={mask:04b}"
                );
            }
        }
    }

    #[test]
    fn gsr_truth_table() {
        for mask in 0..4u8 {
            let recharge = mask & 1 != 0;
            let demand = mask & 2 != 0;
            let mut state = PipelineState::default();
            if recharge {
                state.recharge.push(RechargeRow {
                    village_code: None,
                    village_name: "Alpha".to_string(),
                    recharge: Some(1.0),
                });
            }
            if demand {
                state
                    .total_demand
                    .push(TotalDemandRow::new(None, "Alpha".to_string()));
            }
            assert_eq!(state.can_compute_gsr(), recharge && demand, "mask={mask:02b}");
        }
    }

    #[test]
    fn stress_truth_table_over_horizon_texts() {
        let cases = [
            ("5", true),
            ("1", true),
            ("50", true),
            (" 12 ", true),
            ("0", false),
            ("51", false),
            ("", false),
            ("abc", false),
            ("-3", false),
            ("2.5", false),
        ];
        for has_gsr in [false, true] {
            let mut state = PipelineState::default();
            if has_gsr {
                state.gsr.push(GsrRow {
                    village_code: None,
                    village_name: "Alpha".to_string(),
                    recharge: None,
                    total_demand: None,
                    gsr: None,
                    gsr_classification: None,
                    classification_color: None,
                    trend_status: None,
                });
            }
            for (text, horizon_ok) in cases {
                assert_eq!(
                    state.can_compute_stress(text),
                    has_gsr && horizon_ok,
                    "gsr={has_gsr} horizon={text:?}"
                );
            }
        }
    }

    #[test]
    fn message_lists_every_unmet_requirement() {
        let state = PipelineState::default();
        let msg = requirements_message(&state.recharge_requirements());
        assert_eq!(
            msg,
            "requirements not met: select at least one village; save a wells dataset"
        );
    }
}
