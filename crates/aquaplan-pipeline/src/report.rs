// SPDX-License-Identifier: Apache-2.0

use crate::{PipelineState, Stage};
use aquaplan_model::{
    AdminCodes, DemandRow, DemandSelection, GsrRow, RechargeRow, SelectionScope, StressRow,
    TotalDemandRow,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const REPORT_SCHEMA_VERSION: u32 = 1;

/// Read-only snapshot of every stage for exporters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineReport {
    pub schema_version: u32,
    pub selection_locked: bool,
    pub scope: SelectionScope,
    pub admin_codes: AdminCodes,
    pub wells_dataset: Option<String>,
    pub demand_selection: DemandSelection,
    pub recharge: Vec<RechargeRow>,
    /// Keyed by category name.
    pub demand: BTreeMap<String, Vec<DemandRow>>,
    pub total_demand: Vec<TotalDemandRow>,
    pub gsr: Vec<GsrRow>,
    pub stress: Vec<StressRow>,
    pub planning_horizon_years: Option<u32>,
    /// Stored error per stage, keyed by stage name.
    #[serde(default)]
    pub errors: BTreeMap<String, String>,
}

impl PipelineReport {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.stress.is_empty()
    }
}

impl PipelineState {
    #[must_use]
    pub fn snapshot(&self) -> PipelineReport {
        let errors = Stage::ALL
            .into_iter()
            .filter_map(|stage| {
                self.stage_error(stage)
                    .map(|e| (stage.as_str().to_string(), e.to_string()))
            })
            .collect();
        PipelineReport {
            schema_version: REPORT_SCHEMA_VERSION,
            selection_locked: self.locked,
            scope: self.scope.clone(),
            admin_codes: self.scope.admin_codes(),
            wells_dataset: self.wells.as_ref().map(|w| w.name.clone()),
            demand_selection: self.demand.clone(),
            recharge: self.recharge.clone(),
            demand: self
                .demand_tables
                .iter()
                .map(|(c, rows)| (c.as_str().to_string(), rows.clone()))
                .collect(),
            total_demand: self.total_demand.clone(),
            gsr: self.gsr.clone(),
            stress: self.stress.clone(),
            planning_horizon_years: self.horizon.map(|h| h.years()),
            errors,
        }
    }
}
