// SPDX-License-Identifier: Apache-2.0

//! The wizard's single state container.
//!
//! Inputs (scope, wells, demand selection) are written by the user; each
//! result table is written only by its own stage. Confirming a different
//! scope or unlocking bumps `generation` and clears every table.

use aquaplan_model::{
    DemandCategory, DemandRow, DemandSelection, GsrRow, PlanningHorizon, RechargeRow,
    SelectionScope, StressRow, TotalDemandRow, ValidationError, VillageKeyed, VillageRef,
    WellsDataset,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    Recharge,
    Demand(DemandCategory),
    Gsr,
    Stress,
}

impl Stage {
    pub const ALL: [Self; 6] = [
        Self::Recharge,
        Self::Demand(DemandCategory::Domestic),
        Self::Demand(DemandCategory::Agricultural),
        Self::Demand(DemandCategory::Industrial),
        Self::Gsr,
        Self::Stress,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Recharge => "recharge",
            Self::Demand(DemandCategory::Domestic) => "demand_domestic",
            Self::Demand(DemandCategory::Agricultural) => "demand_agricultural",
            Self::Demand(DemandCategory::Industrial) => "demand_industrial",
            Self::Gsr => "gsr",
            Self::Stress => "stress",
        }
    }
}

impl Display for Stage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageStatus {
    pub loading: bool,
    pub error: Option<String>,
    /// Ticket of the call holding `loading`.
    #[serde(skip)]
    pub(crate) call: Option<u64>,
}

#[derive(Debug, Clone, Default)]
pub struct PipelineState {
    pub(crate) scope: SelectionScope,
    pub(crate) locked: bool,
    pub(crate) generation: u64,
    pub(crate) wells: Option<WellsDataset>,
    pub(crate) demand: DemandSelection,
    pub(crate) recharge: Vec<RechargeRow>,
    pub(crate) demand_tables: BTreeMap<DemandCategory, Vec<DemandRow>>,
    pub(crate) total_demand: Vec<TotalDemandRow>,
    pub(crate) gsr: Vec<GsrRow>,
    pub(crate) stress: Vec<StressRow>,
    pub(crate) horizon: Option<PlanningHorizon>,
    pub(crate) status: BTreeMap<Stage, StageStatus>,
    pub(crate) auto_recharge_generation: Option<u64>,
    pub(crate) next_call: u64,
}

impl PipelineState {
    #[must_use]
    pub fn scope(&self) -> &SelectionScope {
        &self.scope
    }

    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Villages of the confirmed scope; empty while the scope is unlocked.
    #[must_use]
    pub fn selected_villages(&self) -> &[VillageRef] {
        if self.locked {
            &self.scope.villages
        } else {
            &[]
        }
    }

    #[must_use]
    pub fn wells(&self) -> Option<&WellsDataset> {
        self.wells.as_ref()
    }

    #[must_use]
    pub fn demand_selection(&self) -> &DemandSelection {
        &self.demand
    }

    #[must_use]
    pub fn recharge_table(&self) -> &[RechargeRow] {
        &self.recharge
    }

    #[must_use]
    pub fn demand_table(&self, category: DemandCategory) -> &[DemandRow] {
        self.demand_tables
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    #[must_use]
    pub fn total_demand_table(&self) -> &[TotalDemandRow] {
        &self.total_demand
    }

    #[must_use]
    pub fn gsr_table(&self) -> &[GsrRow] {
        &self.gsr
    }

    #[must_use]
    pub fn stress_table(&self) -> &[StressRow] {
        &self.stress
    }

    /// Horizon of the last applied stress computation.
    #[must_use]
    pub fn planning_horizon(&self) -> Option<PlanningHorizon> {
        self.horizon
    }

    #[must_use]
    pub fn status(&self, stage: Stage) -> StageStatus {
        self.status.get(&stage).cloned().unwrap_or_default()
    }

    #[must_use]
    pub fn is_loading(&self, stage: Stage) -> bool {
        self.status.get(&stage).is_some_and(|s| s.loading)
    }

    #[must_use]
    pub fn stage_error(&self, stage: Stage) -> Option<&str> {
        self.status.get(&stage).and_then(|s| s.error.as_deref())
    }

    /// Locks `scope` as the pipeline's spatial extent.
    ///
    /// Returns `Ok(true)` when the confirmed scope changed. Re-confirming the
    /// locked scope is a no-op; a different scope requires `unlock_selection`.
    pub fn confirm_selection(&mut self, scope: SelectionScope) -> Result<bool, ValidationError> {
        scope.validate()?;
        if self.locked {
            if self.scope == scope {
                return Ok(false);
            }
            return Err(ValidationError::new(
                "selection is locked; unlock it before choosing a different scope",
            ));
        }
        self.scope = scope;
        self.locked = true;
        self.invalidate();
        Ok(true)
    }

    pub fn unlock_selection(&mut self) {
        if !self.locked {
            return;
        }
        self.locked = false;
        self.invalidate();
    }

    pub fn save_wells_dataset(&mut self, wells: WellsDataset) -> Result<(), ValidationError> {
        wells.validate()?;
        self.wells = Some(wells);
        Ok(())
    }

    /// Replaces the demand selection; disabled categories leave the total.
    pub fn set_demand_selection(&mut self, selection: DemandSelection) {
        self.demand = selection;
        self.recompute_total_demand();
    }

    /// Back to an empty wizard. In-flight calls keep their loading flag and
    /// their responses are discarded on arrival.
    pub fn reset(&mut self) {
        self.scope = SelectionScope::default();
        self.locked = false;
        self.wells = None;
        self.demand = DemandSelection::default();
        self.invalidate();
    }

    fn invalidate(&mut self) {
        self.generation += 1;
        self.recharge.clear();
        self.demand_tables.clear();
        self.total_demand.clear();
        self.gsr.clear();
        self.stress.clear();
        self.horizon = None;
        self.auto_recharge_generation = None;
        for status in self.status.values_mut() {
            status.error = None;
        }
    }

    pub(crate) fn status_mut(&mut self, stage: Stage) -> &mut StageStatus {
        self.status.entry(stage).or_default()
    }

    /// Marks `stage` loading and returns the ticket that may clear it.
    pub(crate) fn start_call(&mut self, stage: Stage) -> u64 {
        self.next_call += 1;
        let ticket = self.next_call;
        let status = self.status_mut(stage);
        status.loading = true;
        status.call = Some(ticket);
        ticket
    }

    /// Clears `loading` if `ticket` still owns it. Returns whether it did.
    pub(crate) fn end_call(&mut self, stage: Stage, ticket: u64) -> bool {
        let status = self.status_mut(stage);
        if status.call != Some(ticket) {
            return false;
        }
        status.loading = false;
        status.call = None;
        true
    }

    pub(crate) fn replace_recharge(&mut self, rows: Vec<RechargeRow>) {
        self.recharge = rows;
    }

    pub(crate) fn replace_demand(&mut self, category: DemandCategory, rows: Vec<DemandRow>) {
        self.demand_tables.insert(category, rows);
        self.recompute_total_demand();
    }

    /// Applies GSR rows, dropping ratios the upstream tables cannot back.
    /// Returns how many rows were normalised.
    pub(crate) fn replace_gsr(&mut self, mut rows: Vec<GsrRow>) -> usize {
        let mut normalised = 0;
        for row in &mut rows {
            let has_recharge = self
                .recharge
                .iter()
                .any(|u| same_village(u, &*row) && u.recharge.is_some());
            let has_demand = self
                .total_demand
                .iter()
                .any(|u| same_village(u, &*row) && u.total_demand.is_some());
            if row.enforce_invariants(has_recharge, has_demand) {
                normalised += 1;
            }
        }
        self.gsr = rows;
        normalised
    }

    pub(crate) fn replace_stress(
        &mut self,
        horizon: PlanningHorizon,
        mut rows: Vec<StressRow>,
    ) -> usize {
        let mut normalised = 0;
        for row in &mut rows {
            let had_gsr = self
                .gsr
                .iter()
                .any(|u| same_village(u, &*row) && u.gsr.is_some());
            if row.enforce_invariants(had_gsr) {
                normalised += 1;
            }
        }
        self.stress = rows;
        self.horizon = Some(horizon);
        normalised
    }

    /// Per-village sum over the enabled categories that have data, in order
    /// of first appearance.
    fn recompute_total_demand(&mut self) {
        let mut totals: Vec<TotalDemandRow> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        for category in self.demand.enabled_categories() {
            let Some(rows) = self.demand_tables.get(&category) else {
                continue;
            };
            for row in rows {
                let key = row.village_key().to_string();
                let slot = *index.entry(key).or_insert_with(|| {
                    totals.push(TotalDemandRow::new(
                        row.village_code.clone(),
                        row.village_name.clone(),
                    ));
                    totals.len() - 1
                });
                totals[slot].add(category, row.demand);
            }
        }
        self.total_demand = totals;
    }
}

/// Codes decide when both rows carry one; otherwise names must match.
fn same_village(a: &impl VillageKeyed, b: &impl VillageKeyed) -> bool {
    fn code(raw: Option<&str>) -> Option<&str> {
        raw.map(str::trim).filter(|c| !c.is_empty())
    }
    match (code(a.village_code()), code(b.village_code())) {
        (Some(x), Some(y)) => x == y,
        _ => a.village_name().trim() == b.village_name().trim(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn village(code: &str, name: &str) -> VillageRef {
        VillageRef {
            village_code: code.to_string(),
            village_name: name.to_string(),
            state_code: "09".to_string(),
            district_code: "162".to_string(),
            subdistrict_code: "00817".to_string(),
        }
    }

    fn demand_row(code: &str, name: &str, v: Option<f64>) -> DemandRow {
        DemandRow {
            village_code: Some(code.to_string()),
            village_name: name.to_string(),
            demand: v,
        }
    }

    #[test]
    fn total_demand_sums_enabled_categories_only() {
        let mut state = PipelineState::default();
        let mut sel = DemandSelection::default();
        sel.domestic.enabled = true;
        sel.industrial.enabled = true;
        state.set_demand_selection(sel.clone());
        state.replace_demand(
            DemandCategory::Domestic,
            vec![demand_row("1", "A", Some(10.0)), demand_row("2", "B", Some(1.5))],
        );
        state.replace_demand(
            DemandCategory::Industrial,
            vec![demand_row("2", "B", Some(0.25)), demand_row("3", "C", None)],
        );
        state.replace_demand(DemandCategory::Agricultural, vec![demand_row("1", "A", Some(99.0))]);

        let total = state.total_demand_table();
        assert_eq!(total.len(), 3);
        assert_eq!(total[0].total_demand, Some(10.0));
        assert_eq!(total[1].total_demand, Some(1.75));
        assert_eq!(total[1].industrial, Some(0.25));
        assert_eq!(total[2].total_demand, None);

        sel.industrial.enabled = false;
        state.set_demand_selection(sel);
        let total = state.total_demand_table();
        assert_eq!(total.len(), 2);
        assert_eq!(total[1].total_demand, Some(1.5));
        assert_eq!(state.demand_table(DemandCategory::Industrial).len(), 2);
    }

    #[test]
    fn locked_scope_is_immutable_until_unlocked() {
        let mut state = PipelineState::default();
        let scope = SelectionScope {
            villages: vec![village("1", "A")],
            ..SelectionScope::default()
        };
        assert_eq!(state.confirm_selection(scope.clone()), Ok(true));
        let generation = state.generation();
        assert_eq!(state.confirm_selection(scope.clone()), Ok(false));
        assert_eq!(state.generation(), generation);

        let other = SelectionScope {
            villages: vec![village("2", "B")],
            ..SelectionScope::default()
        };
        assert!(state.confirm_selection(other.clone()).is_err());
        state.replace_recharge(vec![RechargeRow {
            village_code: Some("1".to_string()),
            village_name: "A".to_string(),
            recharge: Some(1.0),
        }]);
        state.unlock_selection();
        assert!(state.recharge_table().is_empty());
        assert!(state.selected_villages().is_empty());
        assert_eq!(state.confirm_selection(other), Ok(true));
        assert_eq!(state.generation(), generation + 2);
    }

    #[test]
    fn gsr_rows_without_upstream_data_are_normalised() {
        let mut state = PipelineState::default();
        state.replace_recharge(vec![RechargeRow {
            village_code: Some("1".to_string()),
            village_name: "A".to_string(),
            recharge: Some(5.0),
        }]);
        state.total_demand = vec![{
            let mut row = TotalDemandRow::new(Some("1".to_string()), "A".to_string());
            row.add(DemandCategory::Domestic, Some(2.0));
            row
        }];
        let row = |code: &str, name: &str| GsrRow {
            village_code: Some(code.to_string()),
            village_name: name.to_string(),
            recharge: None,
            total_demand: None,
            gsr: Some(2.5),
            gsr_classification: Some("Safe".to_string()),
            classification_color: None,
            trend_status: None,
        };
        let normalised = state.replace_gsr(vec![row("1", "A"), row("2", "B")]);
        assert_eq!(normalised, 1);
        assert_eq!(state.gsr_table()[0].gsr, Some(2.5));
        assert_eq!(state.gsr_table()[1].gsr, None);
        assert_eq!(state.gsr_table()[1].gsr_classification, None);
    }

    #[test]
    fn name_matches_when_a_side_has_no_code() {
        let a = RechargeRow {
            village_code: None,
            village_name: "Rampur".to_string(),
            recharge: None,
        };
        let b = demand_row("7", "Rampur", None);
        assert!(same_village(&a, &b));
        let c = demand_row("8", "Rampur", None);
        assert!(!same_village(&b, &c));
    }

    #[test]
    fn only_the_owning_call_clears_loading() {
        let mut state = PipelineState::default();
        let first = state.start_call(Stage::Gsr);
        assert!(state.end_call(Stage::Gsr, first));
        let second = state.start_call(Stage::Gsr);
        assert!(!state.end_call(Stage::Gsr, first));
        assert!(state.is_loading(Stage::Gsr));
        assert!(state.end_call(Stage::Gsr, second));
        assert!(!state.is_loading(Stage::Gsr));
    }
}
