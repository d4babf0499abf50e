#![allow(dead_code)]

use aquaplan_model::{DemandCategory, SelectionScope, VillageRef, WellRecord, WellsDataset};
use aquaplan_pipeline::{FakeComputeBackend, Pipeline, PipelineConfig, Stage};
use serde_json::{json, Value};

pub fn village(code: &str, name: &str, district: &str, subdistrict: &str) -> VillageRef {
    VillageRef {
        village_code: code.to_string(),
        village_name: name.to_string(),
        state_code: "09".to_string(),
        district_code: district.to_string(),
        subdistrict_code: subdistrict.to_string(),
    }
}

pub fn three_village_scope() -> SelectionScope {
    SelectionScope {
        river: Some("Varuna".to_string()),
        stretch: Some("S-2".to_string()),
        drain: None,
        catchments: vec!["C-14".to_string()],
        villages: vec![
            village("101", "Alpha", "162", "00817"),
            village("102", "Bravo", "162", "00818"),
            village("103", "Charlie", "163", "00818"),
        ],
    }
}

pub fn wells() -> WellsDataset {
    WellsDataset {
        name: "pre-post monsoon 2023".to_string(),
        wells: ["101", "102", "103"]
            .iter()
            .enumerate()
            .map(|(i, code)| WellRecord {
                well_id: format!("W{i}"),
                village_code: (*code).to_string(),
                pre_monsoon_level_m: Some(9.0),
                post_monsoon_level_m: Some(6.0 + i as f64),
                specific_yield: Some(0.12),
            })
            .collect(),
    }
}

pub fn recharge_body() -> Value {
    json!([
        {"village_code": "101", "village": "Alpha", "recharge": 120.5},
        {"village_code": "102", "village": "Bravo", "recharge": 80.25},
        {"village_code": "103", "village": "Charlie", "recharge": 64.0}
    ])
}

pub fn domestic_body() -> Value {
    json!({"data": [
        {"village_code": "101", "village_name": "Alpha", "demand": 40.0},
        {"village_code": "102", "village_name": "Bravo", "demand": 90.0},
        {"village_code": "103", "village_name": "Charlie", "demand": 32.0}
    ]})
}

/// Keyed by village name only, as the ratio service answers.
pub fn gsr_body() -> Value {
    json!([
        {"village": "Alpha", "recharge": 120.5, "total_demand": 40.0, "gsr": 3.0125,
         "classification": "Safe", "color": "#2e7d32", "trend_status": "No Significant Trend"},
        {"village": "Bravo", "recharge": 80.25, "total_demand": 90.0, "gsr": 0.8917,
         "classification": "Critical", "color": "#c62828", "trend_status": "Decreasing"},
        {"village": "Charlie", "recharge": 64.0, "total_demand": 32.0, "gsr": 2.0,
         "classification": "Safe", "color": "#2e7d32", "trend_status": "Increasing"}
    ])
}

pub fn stress_body() -> Value {
    json!([
        {"village": "Alpha", "gsr": 3.0125, "trend_status": "No Significant Trend", "injection": 0.0},
        {"village": "Bravo", "gsr": 0.8917, "trend_status": "Decreasing", "injection": 12.4},
        {"village": "Charlie", "gsr": 2.0, "trend_status": "Increasing", "injection": 0.0}
    ])
}

pub fn fake_backend() -> FakeComputeBackend {
    FakeComputeBackend::default()
        .with_rows(Stage::Recharge, recharge_body())
        .with_rows(Stage::Demand(DemandCategory::Domestic), domestic_body())
        .with_rows(Stage::Gsr, gsr_body())
        .with_rows(Stage::Stress, stress_body())
}

pub fn config(auto_compute_recharge: bool) -> PipelineConfig {
    PipelineConfig {
        auto_compute_recharge,
        ..PipelineConfig::default()
    }
}

pub async fn wait_until_loading(pipeline: &Pipeline, stage: Stage) {
    for _ in 0..10_000 {
        if pipeline.read(|s| s.is_loading(stage)).await {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("{stage} never started");
}
