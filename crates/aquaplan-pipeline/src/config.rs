// SPDX-License-Identifier: Apache-2.0

use crate::handoff::DEFAULT_HANDOFF_BLOB_KEY;
use crate::retry::RetryPolicy;
use crate::Stage;
use aquaplan_model::DemandCategory;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const CONFIG_SCHEMA_VERSION: &str = "1";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Run recharge once as soon as its predicate first holds.
    pub auto_compute_recharge: bool,
    pub backend: BackendConfig,
    pub handoff: HandoffConfig,
    pub storage: StorageConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            auto_compute_recharge: true,
            backend: BackendConfig::default(),
            handoff: HandoffConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub base_url: String,
    pub bearer: Option<String>,
    pub timeout_ms: u64,
    pub retry: RetryPolicy,
    pub endpoints: EndpointPaths,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000/api".to_string(),
            bearer: None,
            timeout_ms: 30_000,
            retry: RetryPolicy::default(),
            endpoints: EndpointPaths::default(),
        }
    }
}

impl BackendConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Endpoint paths relative to `BackendConfig::base_url`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointPaths {
    pub recharge: String,
    pub demand_domestic: String,
    pub demand_agricultural: String,
    pub demand_industrial: String,
    pub gsr: String,
    pub stress: String,
}

impl Default for EndpointPaths {
    fn default() -> Self {
        Self {
            recharge: "recharge".to_string(),
            demand_domestic: "demand/domestic".to_string(),
            demand_agricultural: "demand/agricultural".to_string(),
            demand_industrial: "demand/industrial".to_string(),
            gsr: "gsr".to_string(),
            stress: "stress".to_string(),
        }
    }
}

impl EndpointPaths {
    #[must_use]
    pub fn for_stage(&self, stage: Stage) -> &str {
        match stage {
            Stage::Recharge => &self.recharge,
            Stage::Demand(DemandCategory::Domestic) => &self.demand_domestic,
            Stage::Demand(DemandCategory::Agricultural) => &self.demand_agricultural,
            Stage::Demand(DemandCategory::Industrial) => &self.demand_industrial,
            Stage::Gsr => &self.gsr,
            Stage::Stress => &self.stress,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandoffConfig {
    pub downstream_url: String,
    pub blob_key: String,
}

impl Default for HandoffConfig {
    fn default() -> Self {
        Self {
            downstream_url: "http://127.0.0.1:3000/site-suitability".to_string(),
            blob_key: DEFAULT_HANDOFF_BLOB_KEY.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// `None` resolves to the aquaplan cache directory.
    pub dir: Option<PathBuf>,
    pub quota_bytes: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: None,
            quota_bytes: aquaplan_store::DEFAULT_BLOB_QUOTA_BYTES,
        }
    }
}

fn check_http_url(field: &str, raw: &str) -> Result<(), String> {
    let url = reqwest::Url::parse(raw).map_err(|e| format!("{field} is not a valid url: {e}"))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("{field} must use http or https, got {}", url.scheme()));
    }
    if url.host_str().is_none() {
        return Err(format!("{field} is missing a host"));
    }
    Ok(())
}

pub fn validate_config_contract(cfg: &PipelineConfig) -> Result<(), String> {
    check_http_url("backend.base_url", &cfg.backend.base_url)?;
    check_http_url("handoff.downstream_url", &cfg.handoff.downstream_url)?;
    if cfg.backend.timeout_ms == 0 {
        return Err("backend.timeout_ms must be > 0".to_string());
    }
    if cfg.backend.retry.max_attempts == 0 {
        return Err("backend.retry.max_attempts must be > 0".to_string());
    }
    if cfg.backend.retry.max_attempts > 10 {
        return Err("backend.retry.max_attempts must be <= 10".to_string());
    }
    if let Some(token) = &cfg.backend.bearer {
        if token.trim().is_empty() {
            return Err("backend.bearer must not be blank when set".to_string());
        }
    }
    let endpoints = &cfg.backend.endpoints;
    for (name, path) in [
        ("recharge", &endpoints.recharge),
        ("demand_domestic", &endpoints.demand_domestic),
        ("demand_agricultural", &endpoints.demand_agricultural),
        ("demand_industrial", &endpoints.demand_industrial),
        ("gsr", &endpoints.gsr),
        ("stress", &endpoints.stress),
    ] {
        if path.trim_matches('/').is_empty() {
            return Err(format!("backend.endpoints.{name} must not be empty"));
        }
    }
    aquaplan_store::validate_blob_key(&cfg.handoff.blob_key)
        .map_err(|e| format!("handoff.blob_key: {e}"))?;
    if cfg.storage.quota_bytes == 0 {
        return Err("storage.quota_bytes must be > 0".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_passes_contract() {
        assert_eq!(validate_config_contract(&PipelineConfig::default()), Ok(()));
    }

    #[test]
    fn contract_rejects_bad_values() {
        let mut cfg = PipelineConfig::default();
        cfg.backend.base_url = "ftp://example.org".to_string();
        assert!(validate_config_contract(&cfg).is_err());

        let mut cfg = PipelineConfig::default();
        cfg.backend.retry.max_attempts = 0;
        assert!(validate_config_contract(&cfg).is_err());

        let mut cfg = PipelineConfig::default();
        cfg.handoff.blob_key = "Not A Key".to_string();
        assert!(validate_config_contract(&cfg).is_err());

        let mut cfg = PipelineConfig::default();
        cfg.backend.endpoints.gsr = "/".to_string();
        assert!(validate_config_contract(&cfg).is_err());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg: PipelineConfig = serde_json::from_str(
            r#"{"auto_compute_recharge": false, "backend": {"base_url": "https://gw.example/api"}}"#,
        )
        .expect("parse config");
        assert!(!cfg.auto_compute_recharge);
        assert_eq!(cfg.backend.base_url, "https://gw.example/api");
        assert_eq!(cfg.backend.endpoints.stress, "stress");
        assert_eq!(cfg.handoff.blob_key, DEFAULT_HANDOFF_BLOB_KEY);
    }
}
