// SPDX-License-Identifier: Apache-2.0

//! Remote stage computations.
//!
//! Every stage is a POST of `{ scope, ...stage parameters }` answered by a
//! JSON array of rows, optionally wrapped as `{ "data": [...] }`.

mod fake;
mod http;

pub use fake::FakeComputeBackend;
pub use http::HttpComputeBackend;

use crate::error::{BackendError, BackendErrorCode};
use async_trait::async_trait;
use aquaplan_model::{
    DemandCategory, DemandRow, GsrRow, PlanningHorizon, RechargeRow, SelectionScope, Season,
    StressRow, TotalDemandRow, WellsDataset,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RechargeRequest {
    pub scope: SelectionScope,
    pub wells: WellsDataset,
}

/// Category-specific body fields; serialized inline next to `scope`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DemandParams {
    Domestic { per_capita_lpcd: f64 },
    Agricultural { crops: BTreeMap<Season, Vec<String>> },
    Industrial { extraction_factor: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DemandRequest {
    pub scope: SelectionScope,
    pub category: DemandCategory,
    #[serde(flatten)]
    pub params: DemandParams,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GsrRequest {
    pub scope: SelectionScope,
    pub recharge: Vec<RechargeRow>,
    pub demand: Vec<TotalDemandRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StressRequest {
    pub scope: SelectionScope,
    pub horizon_years: PlanningHorizon,
    pub gsr: Vec<GsrRow>,
}

#[async_trait]
pub trait ComputeBackend: Send + Sync + 'static {
    fn backend_tag(&self) -> &'static str {
        "unknown"
    }

    async fn recharge(&self, req: &RechargeRequest) -> Result<Vec<RechargeRow>, BackendError>;

    async fn demand(&self, req: &DemandRequest) -> Result<Vec<DemandRow>, BackendError>;

    async fn gsr(&self, req: &GsrRequest) -> Result<Vec<GsrRow>, BackendError>;

    async fn stress(&self, req: &StressRequest) -> Result<Vec<StressRow>, BackendError>;
}

/// Pulls the row array out of a response body and decodes each row.
pub fn extract_rows<T: DeserializeOwned>(body: serde_json::Value) -> Result<Vec<T>, BackendError> {
    let items = match body {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Object(mut map) => match map.remove("data") {
            Some(serde_json::Value::Array(items)) => items,
            _ => {
                return Err(BackendError::new(
                    BackendErrorCode::Malformed,
                    "response object has no `data` array",
                ))
            }
        },
        other => {
            return Err(BackendError::new(
                BackendErrorCode::Malformed,
                format!("expected a JSON array of rows, got {}", json_kind(&other)),
            ))
        }
    };
    items
        .into_iter()
        .enumerate()
        .map(|(idx, item)| {
            serde_json::from_value(item).map_err(|e| {
                BackendError::new(BackendErrorCode::Malformed, format!("row {idx}: {e}"))
            })
        })
        .collect()
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_bare_array_and_data_wrapper() {
        let rows: Vec<RechargeRow> =
            extract_rows(json!([{"village": "Alpha", "recharge": 1.5}])).expect("array");
        assert_eq!(rows[0].village_name, "Alpha");
        let rows: Vec<RechargeRow> =
            extract_rows(json!({"data": [{"village_name": "Beta", "recharge": null}]}))
                .expect("wrapped");
        assert_eq!(rows[0].recharge, None);
    }

    #[test]
    fn rejects_non_array_bodies() {
        for body in [json!({"rows": []}), json!("oops"), json!(null), json!({"data": 3})] {
            let err = extract_rows::<RechargeRow>(body).expect_err("malformed");
            assert_eq!(err.code, BackendErrorCode::Malformed);
        }
    }

    #[test]
    fn reports_index_of_bad_row() {
        let err = extract_rows::<RechargeRow>(json!([{"village": "A"}, {"recharge": 2.0}]))
            .expect_err("missing village name");
        assert!(err.message.starts_with("row 1:"), "{}", err.message);
    }

    #[test]
    fn demand_params_flatten_into_body() {
        let req = DemandRequest {
            scope: SelectionScope::default(),
            category: DemandCategory::Domestic,
            params: DemandParams::Domestic {
                per_capita_lpcd: 60.0,
            },
        };
        let body = serde_json::to_value(&req).expect("serialize");
        assert_eq!(body["category"], "domestic");
        assert_eq!(body["per_capita_lpcd"], 60.0);
        assert!(body.get("params").is_none());
    }
}
