// SPDX-License-Identifier: Apache-2.0

//! Scenario file: everything a user would enter in the wizard.
//!
//! `replay` holds canned response bodies keyed by stage name
//! (`recharge`, `demand_domestic`, ..., `stress`); when present the run
//! never touches the network.

use aquaplan_core::ResultExt;
use aquaplan_model::{DemandSelection, SelectionScope, WellsDataset};
use aquaplan_pipeline::{
    BackendError, ComputeBackend, FakeComputeBackend, HttpComputeBackend, PipelineConfig, Stage,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    pub scope: SelectionScope,
    #[serde(default)]
    pub wells: Option<WellsDataset>,
    #[serde(default)]
    pub demand: DemandSelection,
    /// Planning horizon exactly as typed, e.g. `"10"`.
    #[serde(default)]
    pub horizon: Option<String>,
    #[serde(default)]
    pub replay: Option<BTreeMap<String, serde_json::Value>>,
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self, String> {
        let raw = std::fs::read(path)
            .with_context("read scenario")
            .map_err(|e| e.at(path.display()))?;
        serde_json::from_slice::<Self>(&raw)
            .with_context("parse scenario")
            .map_err(|e| e.at(path.display()))
    }

    pub fn backend(&self, cfg: &PipelineConfig) -> Result<Arc<dyn ComputeBackend>, String> {
        match &self.replay {
            Some(bodies) => Ok(Arc::new(replay_backend(bodies)?)),
            None => HttpComputeBackend::new(&cfg.backend)
                .map(|b| Arc::new(b) as Arc<dyn ComputeBackend>)
                .map_err(|e: BackendError| e.to_string()),
        }
    }
}

fn replay_backend(
    bodies: &BTreeMap<String, serde_json::Value>,
) -> Result<FakeComputeBackend, String> {
    let mut backend = FakeComputeBackend::default();
    for (name, body) in bodies {
        let stage = Stage::ALL
            .into_iter()
            .find(|s| s.as_str() == name)
            .ok_or_else(|| format!("unknown replay stage `{name}`"))?;
        backend = backend.with_rows(stage, body.clone());
    }
    Ok(backend)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_replay_stage_is_rejected() {
        let mut bodies = BTreeMap::new();
        bodies.insert("ratio".to_string(), serde_json::json!([]));
        let err = replay_backend(&bodies).err().expect("error");
        assert!(err.contains("ratio"));
    }

    #[test]
    fn minimal_scenario_parses() {
        let s: Scenario = serde_json::from_str(r#"{"scope": {"villages": []}}"#).expect("parse");
        assert!(s.wells.is_none());
        assert!(s.replay.is_none());
        assert!(!s.demand.domestic.enabled);
    }

    #[test]
    fn load_errors_name_the_step_and_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("absent.json");
        let err = Scenario::load(&missing).err().expect("missing");
        assert!(err.starts_with(&format!("read scenario {}: ", missing.display())));

        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, b"{").expect("write");
        let err = Scenario::load(&broken).err().expect("broken");
        assert!(err.starts_with("parse scenario "));
    }
}
