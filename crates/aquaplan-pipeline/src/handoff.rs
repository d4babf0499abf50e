// SPDX-License-Identifier: Apache-2.0

use crate::config::HandoffConfig;
use aquaplan_core::ErrorCode;
use aquaplan_model::{AdminCodes, SelectionScope, StressRow, ValidationError};
use aquaplan_store::{BlobStore, StoreError};
use serde::Serialize;
use tracing::{info, warn};

pub const DEFAULT_HANDOFF_BLOB_KEY: &str = "stress_handoff";

/// What happened to the client-local stress blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum HandoffPayload {
    Written { rows: usize, bytes: usize },
    Cleared,
    NotWritten,
}

/// Storage problems do not block navigation; they ride along with the URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HandoffWarning {
    #[serde(serialize_with = "serialize_code")]
    pub code: ErrorCode,
    pub message: String,
}

fn serialize_code<S: serde::Serializer>(code: &ErrorCode, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(code.as_str())
}

impl From<StoreError> for HandoffWarning {
    fn from(err: StoreError) -> Self {
        Self {
            code: err.code.as_error_code(),
            message: format!("stress table not stored for hand-off: {err}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HandoffOutcome {
    pub url: String,
    pub payload: HandoffPayload,
    pub warning: Option<HandoffWarning>,
}

pub struct HandoffPackager {
    downstream_url: reqwest::Url,
    blob_key: String,
}

impl HandoffPackager {
    pub fn new(cfg: &HandoffConfig) -> Result<Self, ValidationError> {
        let downstream_url = reqwest::Url::parse(cfg.downstream_url.trim()).map_err(|e| {
            ValidationError(format!("invalid downstream url {:?}: {e}", cfg.downstream_url))
        })?;
        aquaplan_store::validate_blob_key(&cfg.blob_key)
            .map_err(|e| ValidationError(e.to_string()))?;
        Ok(Self {
            downstream_url,
            blob_key: cfg.blob_key.clone(),
        })
    }

    #[must_use]
    pub fn blob_key(&self) -> &str {
        &self.blob_key
    }

    /// `<downstream>?state=..&districts=..&subdistricts=..`, comma-joined
    /// in order of first appearance. Existing query pairs are kept.
    #[must_use]
    pub fn build_url(&self, codes: &AdminCodes) -> String {
        let mut url = self.downstream_url.clone();
        url.query_pairs_mut()
            .append_pair("state", &codes.states.join(","))
            .append_pair("districts", &codes.districts.join(","))
            .append_pair("subdistricts", &codes.subdistricts.join(","));
        url.to_string()
    }

    pub fn package(
        &self,
        scope: &SelectionScope,
        stress: &[StressRow],
        store: &dyn BlobStore,
    ) -> HandoffOutcome {
        let url = self.build_url(&scope.admin_codes());
        let (payload, warning) = match self.write_blob(stress, store) {
            Ok(payload) => (payload, None),
            Err(warning) => {
                self.drop_previous_blob(store);
                (HandoffPayload::NotWritten, Some(warning))
            }
        };
        info!(key = %self.blob_key, rows = stress.len(), "hand-off packaged");
        HandoffOutcome {
            url,
            payload,
            warning,
        }
    }

    /// A failed write must not leave an earlier stress table behind for the
    /// downstream module to pick up.
    fn drop_previous_blob(&self, store: &dyn BlobStore) {
        match store.remove(&self.blob_key) {
            Ok(true) => info!(key = %self.blob_key, "previous hand-off blob removed"),
            Ok(false) => {}
            Err(err) => warn!(
                key = %self.blob_key,
                code = err.code.as_error_code().as_str(),
                "previous hand-off blob could not be removed: {err}"
            ),
        }
    }

    fn write_blob(
        &self,
        stress: &[StressRow],
        store: &dyn BlobStore,
    ) -> Result<HandoffPayload, HandoffWarning> {
        if stress.is_empty() {
            store.remove(&self.blob_key)?;
            return Ok(HandoffPayload::Cleared);
        }
        let bytes = serde_json::to_vec(stress).map_err(|e| HandoffWarning {
            code: ErrorCode::Internal,
            message: format!("stress table could not be serialized: {e}"),
        })?;
        store.put(&self.blob_key, &bytes)?;
        Ok(HandoffPayload::Written {
            rows: stress.len(),
            bytes: bytes.len(),
        })
    }
}
