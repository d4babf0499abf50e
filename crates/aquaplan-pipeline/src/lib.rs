// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

pub mod backend;
mod config;
mod error;
mod gating;
mod handoff;
mod pipeline;
mod report;
mod retry;
mod state;

pub use backend::{
    extract_rows, ComputeBackend, DemandParams, DemandRequest, FakeComputeBackend,
    GsrRequest, HttpComputeBackend, RechargeRequest, StressRequest,
};
pub use config::{
    validate_config_contract, BackendConfig, EndpointPaths, HandoffConfig, PipelineConfig,
    StorageConfig, CONFIG_SCHEMA_VERSION,
};
pub use error::{BackendError, BackendErrorCode, StageError};
pub use gating::{requirements_message, Requirement};
pub use handoff::{
    HandoffOutcome, HandoffPackager, HandoffPayload, HandoffWarning, DEFAULT_HANDOFF_BLOB_KEY,
};
pub use pipeline::{Pipeline, StageOutcome};
pub use report::{PipelineReport, REPORT_SCHEMA_VERSION};
pub use retry::{BackoffPolicy, RetryPolicy};
pub use state::{PipelineState, Stage, StageStatus};

pub const CRATE_NAME: &str = "aquaplan-pipeline";
