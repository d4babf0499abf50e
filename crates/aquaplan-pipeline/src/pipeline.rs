// SPDX-License-Identifier: Apache-2.0

use crate::backend::{
    ComputeBackend, DemandParams, DemandRequest, GsrRequest, RechargeRequest, StressRequest,
};
use crate::error::{BackendError, StageError};
use crate::gating::Requirement;
use crate::handoff::{HandoffOutcome, HandoffPackager};
use crate::{PipelineConfig, PipelineReport, PipelineState, Stage};
use aquaplan_model::{
    DemandCategory, DemandSelection, PlanningHorizon, SelectionScope, ValidationError,
    WellsDataset,
};
use aquaplan_store::BlobStore;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    /// The stage table was replaced with this many rows.
    Applied { rows: usize },
    /// The selection changed while the call was in flight; nothing was written.
    Discarded,
}

/// Owns the wizard state and runs stage computations against a backend.
///
/// The state lock is held only to check preconditions, snapshot the request
/// and apply the response, never across the remote call.
pub struct Pipeline {
    state: Arc<Mutex<PipelineState>>,
    backend: Arc<dyn ComputeBackend>,
    config: PipelineConfig,
}

impl Pipeline {
    #[must_use]
    pub fn new(config: PipelineConfig, backend: Arc<dyn ComputeBackend>) -> Self {
        Self {
            state: Arc::new(Mutex::new(PipelineState::default())),
            backend,
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    #[must_use]
    pub fn backend_tag(&self) -> &'static str {
        self.backend.backend_tag()
    }

    pub async fn read<T>(&self, f: impl FnOnce(&PipelineState) -> T) -> T {
        let state = self.state.lock().await;
        f(&state)
    }

    pub async fn snapshot(&self) -> PipelineReport {
        self.state.lock().await.snapshot()
    }

    pub async fn confirm_selection(&self, scope: SelectionScope) -> Result<bool, ValidationError> {
        let (changed, villages) = {
            let mut state = self.state.lock().await;
            let changed = state.confirm_selection(scope)?;
            (changed, state.selected_villages().len())
        };
        if changed {
            info!(villages, "selection confirmed");
            self.auto_recharge().await;
        }
        Ok(changed)
    }

    pub async fn unlock_selection(&self) {
        self.state.lock().await.unlock_selection();
        info!("selection unlocked; stage tables cleared");
    }

    pub async fn save_wells_dataset(&self, wells: WellsDataset) -> Result<(), ValidationError> {
        let count = wells.wells.len();
        self.state.lock().await.save_wells_dataset(wells)?;
        info!(wells = count, "wells dataset saved");
        self.auto_recharge().await;
        Ok(())
    }

    pub async fn set_demand_selection(&self, selection: DemandSelection) {
        self.state.lock().await.set_demand_selection(selection);
    }

    pub async fn reset(&self) {
        self.state.lock().await.reset();
        info!("pipeline reset");
    }

    async fn auto_recharge(&self) {
        if let Some(Err(err)) = self.maybe_auto_compute_recharge().await {
            debug!(error = %err, "automatic recharge did not apply");
        }
    }

    /// Runs recharge once per confirmed selection, the first time its
    /// predicate holds while no recharge data exists.
    pub async fn maybe_auto_compute_recharge(&self) -> Option<Result<StageOutcome, StageError>> {
        if !self.config.auto_compute_recharge {
            return None;
        }
        {
            let mut state = self.state.lock().await;
            let due = state.can_compute_recharge()
                && state.recharge.is_empty()
                && !state.is_loading(Stage::Recharge)
                && state.auto_recharge_generation != Some(state.generation);
            if !due {
                return None;
            }
            state.auto_recharge_generation = Some(state.generation);
        }
        debug!("recharge preconditions met; computing automatically");
        Some(self.compute_recharge().await)
    }

    pub async fn compute_recharge(&self) -> Result<StageOutcome, StageError> {
        let stage = Stage::Recharge;
        let (req, call) = self
            .begin(stage, |s| {
                let reqs = s.recharge_requirements();
                if !reqs.is_empty() {
                    return Err(refuse(reqs));
                }
                Ok(RechargeRequest {
                    scope: s.scope.clone(),
                    wells: s.wells.clone().unwrap_or_default(),
                })
            })
            .await?;
        let result = self.backend.recharge(&req).await;
        self.finish(call, result, |s, rows| {
            s.replace_recharge(rows);
            0
        })
        .await
    }

    pub async fn compute_demand(
        &self,
        category: DemandCategory,
    ) -> Result<StageOutcome, StageError> {
        let stage = Stage::Demand(category);
        let (req, call) = self
            .begin(stage, |s| {
                let reqs = s.demand_requirements(category);
                if !reqs.is_empty() {
                    return Err(refuse(reqs));
                }
                Ok(DemandRequest {
                    scope: s.scope.clone(),
                    category,
                    params: demand_params(&s.demand, category),
                })
            })
            .await?;
        let result = self.backend.demand(&req).await;
        self.finish(call, result, |s, rows| {
            s.replace_demand(category, rows);
            0
        })
        .await
    }

    /// Runs every enabled category in turn; one failing category does not
    /// stop the others.
    pub async fn compute_enabled_demand(
        &self,
    ) -> Vec<(DemandCategory, Result<StageOutcome, StageError>)> {
        let categories = self.read(|s| s.demand.enabled_categories()).await;
        let mut results = Vec::with_capacity(categories.len());
        for category in categories {
            results.push((category, self.compute_demand(category).await));
        }
        results
    }

    pub async fn compute_gsr(&self) -> Result<StageOutcome, StageError> {
        let stage = Stage::Gsr;
        let (req, call) = self
            .begin(stage, |s| {
                let reqs = s.gsr_requirements();
                if !reqs.is_empty() {
                    return Err(refuse(reqs));
                }
                Ok(GsrRequest {
                    scope: s.scope.clone(),
                    recharge: s.recharge.clone(),
                    demand: s.total_demand.clone(),
                })
            })
            .await?;
        let result = self.backend.gsr(&req).await;
        self.finish(call, result, PipelineState::replace_gsr)
            .await
    }

    pub async fn compute_stress(&self, horizon_text: &str) -> Result<StageOutcome, StageError> {
        let stage = Stage::Stress;
        let (req, call) = self
            .begin(stage, |s| {
                let reqs = s.stress_requirements(horizon_text);
                if !reqs.is_empty() {
                    return Err(refuse(reqs));
                }
                let horizon_years =
                    PlanningHorizon::parse(horizon_text).map_err(StageError::InvalidInput)?;
                Ok(StressRequest {
                    scope: s.scope.clone(),
                    horizon_years,
                    gsr: s.gsr.clone(),
                })
            })
            .await?;
        let horizon = req.horizon_years;
        let result = self.backend.stress(&req).await;
        self.finish(call, result, |s, rows| {
            s.replace_stress(horizon, rows)
        })
        .await
    }

    /// Packages the confirmed selection and the stress table for the
    /// downstream module. Storage problems come back as a warning.
    pub async fn handoff(
        &self,
        packager: &HandoffPackager,
        store: &dyn BlobStore,
    ) -> Result<HandoffOutcome, StageError> {
        let (scope, stress) = {
            let state = self.state.lock().await;
            let reqs = state.selection_requirements();
            if !reqs.is_empty() {
                return Err(StageError::PreconditionNotMet(reqs));
            }
            (state.scope.clone(), state.stress.clone())
        };
        let outcome = packager.package(&scope, &stress, store);
        if let Some(warning) = &outcome.warning {
            warn!(code = warning.code.as_str(), "{}", warning.message);
        }
        Ok(outcome)
    }

    async fn begin<R>(
        &self,
        stage: Stage,
        prepare: impl FnOnce(&PipelineState) -> Result<R, StageError>,
    ) -> Result<(R, InFlight), StageError> {
        let mut state = self.state.lock().await;
        if state.is_loading(stage) {
            return Err(StageError::AlreadyRunning(stage));
        }
        let req = prepare(&state)?;
        let ticket = state.start_call(stage);
        debug!(stage = stage.as_str(), generation = state.generation, "stage request sent");
        let call = InFlight {
            state: Arc::clone(&self.state),
            stage,
            generation: state.generation,
            ticket,
            armed: true,
        };
        Ok((req, call))
    }

    async fn finish<Row>(
        &self,
        mut call: InFlight,
        result: Result<Vec<Row>, BackendError>,
        apply: impl FnOnce(&mut PipelineState, Vec<Row>) -> usize,
    ) -> Result<StageOutcome, StageError> {
        let (stage, generation) = (call.stage, call.generation);
        let mut state = self.state.lock().await;
        state.end_call(stage, call.ticket);
        call.armed = false;
        if state.generation != generation {
            warn!(
                stage = stage.as_str(),
                requested = generation,
                current = state.generation,
                "selection changed while in flight; response discarded"
            );
            return Ok(StageOutcome::Discarded);
        }
        match result {
            Ok(rows) => {
                let count = rows.len();
                let normalised = apply(&mut state, rows);
                if normalised > 0 {
                    warn!(
                        stage = stage.as_str(),
                        normalised, "response rows violated upstream invariants; fields dropped"
                    );
                }
                state.status_mut(stage).error = None;
                info!(stage = stage.as_str(), rows = count, "stage computed");
                Ok(StageOutcome::Applied { rows: count })
            }
            Err(err) => {
                warn!(stage = stage.as_str(), code = err.code.as_str(), "stage computation failed");
                state.status_mut(stage).error =
                    Some(format!("{stage} computation failed: {}", err.message));
                Err(StageError::Remote(err))
            }
        }
    }
}

/// Loading marker for one stage call. Dropping it before `finish` (a
/// timeout, a lost `select!` branch, an aborted task) releases the stage.
struct InFlight {
    state: Arc<Mutex<PipelineState>>,
    stage: Stage,
    generation: u64,
    ticket: u64,
    armed: bool,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let (stage, ticket) = (self.stage, self.ticket);
        if let Ok(mut state) = self.state.try_lock() {
            if state.end_call(stage, ticket) {
                warn!(stage = stage.as_str(), "stage call abandoned before completion");
            }
            return;
        }
        let state = Arc::clone(&self.state);
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                if state.lock().await.end_call(stage, ticket) {
                    warn!(stage = stage.as_str(), "stage call abandoned before completion");
                }
            });
        }
    }
}

/// Input-only problems surface as validation errors; anything else is an
/// unmet precondition.
fn refuse(reqs: Vec<Requirement>) -> StageError {
    let input_reasons: Vec<&str> = reqs
        .iter()
        .filter_map(|r| match r {
            Requirement::InvalidParameters { reason, .. } | Requirement::InvalidHorizon(reason) => {
                Some(reason.as_str())
            }
            _ => None,
        })
        .collect();
    if input_reasons.len() == reqs.len() {
        return StageError::InvalidInput(ValidationError::new(input_reasons.join("; ")));
    }
    StageError::PreconditionNotMet(reqs)
}

fn demand_params(selection: &DemandSelection, category: DemandCategory) -> DemandParams {
    match category {
        DemandCategory::Domestic => DemandParams::Domestic {
            per_capita_lpcd: selection.domestic.per_capita_lpcd,
        },
        DemandCategory::Agricultural => DemandParams::Agricultural {
            crops: selection
                .agricultural
                .crops
                .iter()
                .map(|(season, crops)| {
                    let kept = crops
                        .iter()
                        .map(|c| c.trim().to_string())
                        .filter(|c| !c.is_empty())
                        .collect();
                    (*season, kept)
                })
                .collect(),
        },
        DemandCategory::Industrial => DemandParams::Industrial {
            extraction_factor: selection.industrial.extraction_factor,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refuse_splits_input_errors_from_preconditions() {
        let err = refuse(vec![Requirement::InvalidHorizon("bad".to_string())]);
        assert!(matches!(err, StageError::InvalidInput(_)));
        let err = refuse(vec![
            Requirement::GsrMissing,
            Requirement::InvalidHorizon("bad".to_string()),
        ]);
        assert!(matches!(err, StageError::PreconditionNotMet(ref r) if r.len() == 2));
    }
}
