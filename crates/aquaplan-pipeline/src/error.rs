// SPDX-License-Identifier: Apache-2.0

use crate::gating::{requirements_message, Requirement};
use crate::Stage;
use aquaplan_core::{ErrorCode, MachineError};
use aquaplan_model::ValidationError;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum BackendErrorCode {
    /// Connection, timeout or body read failure.
    Network,
    /// Non-2xx response.
    Status,
    /// Body is not a JSON array of the expected rows.
    Malformed,
    Config,
}

impl BackendErrorCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Network => "network_error",
            Self::Status => "http_status",
            Self::Malformed => "malformed_payload",
            Self::Config => "config_error",
        }
    }

    #[must_use]
    pub const fn as_error_code(self) -> ErrorCode {
        match self {
            Self::Network => ErrorCode::RemoteUnavailable,
            Self::Status => ErrorCode::RemoteStatus,
            Self::Malformed => ErrorCode::MalformedPayload,
            Self::Config => ErrorCode::InvalidConfig,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendError {
    pub code: BackendErrorCode,
    pub message: String,
}

impl BackendError {
    #[must_use]
    pub fn new(code: BackendErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl Display for BackendError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for BackendError {}

/// Why a `compute_*` call did not apply new rows.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum StageError {
    /// The stage's predicate is false; nothing was sent.
    PreconditionNotMet(Vec<Requirement>),
    /// A user-entered value is out of range; nothing was sent.
    InvalidInput(ValidationError),
    /// A call for this stage is still outstanding.
    AlreadyRunning(Stage),
    /// The remote call failed; the previous table is kept.
    Remote(BackendError),
}

impl StageError {
    #[must_use]
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::PreconditionNotMet(_) => ErrorCode::PreconditionNotMet,
            Self::InvalidInput(_) => ErrorCode::InvalidInput,
            Self::AlreadyRunning(_) => ErrorCode::StageBusy,
            Self::Remote(e) => e.code.as_error_code(),
        }
    }

    #[must_use]
    pub fn to_machine_error(&self, stage: Stage) -> MachineError {
        MachineError::new(self.error_code(), &self.to_string()).with_detail("stage", stage.as_str())
    }
}

impl Display for StageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PreconditionNotMet(reqs) => f.write_str(&requirements_message(reqs)),
            Self::InvalidInput(e) => write!(f, "invalid input: {e}"),
            Self::AlreadyRunning(stage) => write!(f, "{} computation already in progress", stage.as_str()),
            Self::Remote(e) => write!(f, "remote computation failed: {e}"),
        }
    }
}

impl std::error::Error for StageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidInput(e) => Some(e),
            Self::Remote(e) => Some(e),
            Self::PreconditionNotMet(_) | Self::AlreadyRunning(_) => None,
        }
    }
}

impl From<BackendError> for StageError {
    fn from(value: BackendError) -> Self {
        Self::Remote(value)
    }
}
