// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

mod error;
mod result_ext;

use sha2::{Digest, Sha256};
use std::path::PathBuf;

pub use crate::error::{ConfigPathScope, ErrorCode, ExitCode, MachineError};
pub use crate::result_ext::{ErrorContext, ResultExt};

pub const CRATE_NAME: &str = "aquaplan-core";

pub const ENV_AQUAPLAN_LOG_LEVEL: &str = "AQUAPLAN_LOG_LEVEL";
pub const ENV_AQUAPLAN_CACHE_DIR: &str = "AQUAPLAN_CACHE_DIR";

#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Directory for client-local state such as the hand-off blob.
#[must_use]
pub fn resolve_aquaplan_cache_dir() -> PathBuf {
    if let Some(explicit) = non_empty_env(ENV_AQUAPLAN_CACHE_DIR) {
        return PathBuf::from(explicit);
    }
    if let Some(xdg_cache_home) = non_empty_env("XDG_CACHE_HOME") {
        return PathBuf::from(xdg_cache_home).join("aquaplan");
    }
    if let Some(home) = non_empty_env("HOME") {
        return PathBuf::from(home).join(".cache").join("aquaplan");
    }
    PathBuf::from(".aquaplan").join("cache")
}

#[must_use]
pub fn resolve_aquaplan_config_path(scope: ConfigPathScope) -> PathBuf {
    match scope {
        ConfigPathScope::User => {
            if let Some(xdg_config_home) = non_empty_env("XDG_CONFIG_HOME") {
                return PathBuf::from(xdg_config_home)
                    .join("aquaplan")
                    .join("config.json");
            }
            if let Some(home) = non_empty_env("HOME") {
                return PathBuf::from(home)
                    .join(".config")
                    .join("aquaplan")
                    .join("config.json");
            }
            PathBuf::from(".aquaplan").join("config.json")
        }
        ConfigPathScope::Workspace => PathBuf::from(".aquaplan").join("config.json"),
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub mod canonical {
    use serde::Serialize;
    use serde_json::{Map, Value};

    /// JSON bytes with object keys sorted at every depth.
    pub fn stable_json_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, serde_json::Error> {
        let raw = serde_json::to_value(value)?;
        serde_json::to_vec(&normalize_json_value(raw))
    }

    fn normalize_json_value(value: Value) -> Value {
        match value {
            Value::Object(map) => {
                let mut entries: Vec<(String, Value)> = map
                    .into_iter()
                    .map(|(k, v)| (k, normalize_json_value(v)))
                    .collect();
                entries.sort_by(|a, b| a.0.cmp(&b.0));
                let mut sorted = Map::new();
                for (k, v) in entries {
                    sorted.insert(k, v);
                }
                Value::Object(sorted)
            }
            Value::Array(items) => {
                Value::Array(items.into_iter().map(normalize_json_value).collect())
            }
            other => other,
        }
    }
}
