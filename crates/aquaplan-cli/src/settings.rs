// SPDX-License-Identifier: Apache-2.0

//! Config file plus `AQUAPLAN_*` environment overrides.

use aquaplan_core::{
    resolve_aquaplan_cache_dir, resolve_aquaplan_config_path, ConfigPathScope, ResultExt,
};
use aquaplan_pipeline::{validate_config_contract, PipelineConfig};
use std::env;
use std::path::{Path, PathBuf};

pub const ENV_API_BASE_URL: &str = "AQUAPLAN_API_BASE_URL";
pub const ENV_API_BEARER: &str = "AQUAPLAN_API_BEARER";
pub const ENV_API_TIMEOUT_MS: &str = "AQUAPLAN_API_TIMEOUT_MS";
pub const ENV_RETRY_ATTEMPTS: &str = "AQUAPLAN_RETRY_ATTEMPTS";
pub const ENV_RETRY_BASE_MS: &str = "AQUAPLAN_RETRY_BASE_MS";
pub const ENV_DOWNSTREAM_URL: &str = "AQUAPLAN_DOWNSTREAM_URL";
pub const ENV_STORAGE_DIR: &str = "AQUAPLAN_STORAGE_DIR";
pub const ENV_STORAGE_QUOTA_BYTES: &str = "AQUAPLAN_STORAGE_QUOTA_BYTES";
pub const ENV_AUTO_RECHARGE: &str = "AQUAPLAN_AUTO_RECHARGE";
pub const ENV_LOG_JSON: &str = "AQUAPLAN_LOG_JSON";

pub fn env_bool(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .and_then(|v| match v.as_str() {
            "1" | "true" | "TRUE" | "yes" | "YES" => Some(true),
            "0" | "false" | "FALSE" | "no" | "NO" => Some(false),
            _ => None,
        })
        .unwrap_or(default)
}

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_usize(name: &str, default: usize) -> usize {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(default)
}

fn env_string(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Where the config came from, for `check`.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: PipelineConfig,
    pub source: Option<PathBuf>,
}

/// Explicit path first, then the workspace config, then the user config.
pub fn load_config(explicit: Option<&Path>) -> Result<LoadedConfig, String> {
    let source = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => [ConfigPathScope::Workspace, ConfigPathScope::User]
            .into_iter()
            .map(resolve_aquaplan_config_path)
            .find(|p| p.is_file()),
    };
    let mut config = match &source {
        Some(path) => {
            let raw = std::fs::read(path)
                .with_context("read config")
                .map_err(|e| e.at(path.display()))?;
            serde_json::from_slice::<PipelineConfig>(&raw)
                .with_context("parse config")
                .map_err(|e| e.at(path.display()))?
        }
        None => PipelineConfig::default(),
    };
    apply_env_overrides(&mut config);
    validate_config_contract(&config)?;
    Ok(LoadedConfig { config, source })
}

pub fn apply_env_overrides(cfg: &mut PipelineConfig) {
    if let Some(url) = env_string(ENV_API_BASE_URL) {
        cfg.backend.base_url = url;
    }
    if let Some(token) = env_string(ENV_API_BEARER) {
        cfg.backend.bearer = Some(token);
    }
    cfg.backend.timeout_ms = env_u64(ENV_API_TIMEOUT_MS, cfg.backend.timeout_ms);
    cfg.backend.retry.max_attempts = env_usize(ENV_RETRY_ATTEMPTS, cfg.backend.retry.max_attempts);
    cfg.backend.retry.base_backoff_ms =
        env_u64(ENV_RETRY_BASE_MS, cfg.backend.retry.base_backoff_ms);
    if let Some(url) = env_string(ENV_DOWNSTREAM_URL) {
        cfg.handoff.downstream_url = url;
    }
    if let Some(dir) = env_string(ENV_STORAGE_DIR) {
        cfg.storage.dir = Some(PathBuf::from(dir));
    }
    cfg.storage.quota_bytes = env_u64(ENV_STORAGE_QUOTA_BYTES, cfg.storage.quota_bytes);
    cfg.auto_compute_recharge = env_bool(ENV_AUTO_RECHARGE, cfg.auto_compute_recharge);
}

#[must_use]
pub fn storage_dir(cfg: &PipelineConfig) -> PathBuf {
    cfg.storage
        .dir
        .clone()
        .unwrap_or_else(|| resolve_aquaplan_cache_dir().join("handoff"))
}
