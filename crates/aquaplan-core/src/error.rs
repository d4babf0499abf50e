// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;
use std::fmt;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ExitCode {
    Success = 0,
    Usage = 2,
    Validation = 3,
    DependencyFailure = 4,
    Internal = 10,
}

impl ExitCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Usage => "usage",
            Self::Validation => "validation",
            Self::DependencyFailure => "dependency_failure",
            Self::Internal => "internal",
        }
    }
}

/// Machine-readable codes shared by every layer of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorCode {
    PreconditionNotMet,
    InvalidInput,
    StageBusy,
    RemoteUnavailable,
    RemoteStatus,
    MalformedPayload,
    StorageQuotaExceeded,
    StorageIo,
    InvalidConfig,
    Usage,
    Internal,
}

pub const ERROR_CODES: &[ErrorCode] = &[
    ErrorCode::PreconditionNotMet,
    ErrorCode::InvalidInput,
    ErrorCode::StageBusy,
    ErrorCode::RemoteUnavailable,
    ErrorCode::RemoteStatus,
    ErrorCode::MalformedPayload,
    ErrorCode::StorageQuotaExceeded,
    ErrorCode::StorageIo,
    ErrorCode::InvalidConfig,
    ErrorCode::Usage,
    ErrorCode::Internal,
];

impl ErrorCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PreconditionNotMet => "precondition_not_met",
            Self::InvalidInput => "invalid_input",
            Self::StageBusy => "stage_busy",
            Self::RemoteUnavailable => "remote_unavailable",
            Self::RemoteStatus => "remote_status",
            Self::MalformedPayload => "malformed_payload",
            Self::StorageQuotaExceeded => "storage_quota_exceeded",
            Self::StorageIo => "storage_io",
            Self::InvalidConfig => "invalid_config",
            Self::Usage => "usage",
            Self::Internal => "internal",
        }
    }

    #[must_use]
    pub const fn exit_code(self) -> ExitCode {
        match self {
            Self::PreconditionNotMet | Self::InvalidInput | Self::InvalidConfig => {
                ExitCode::Validation
            }
            Self::RemoteUnavailable | Self::RemoteStatus | Self::MalformedPayload => {
                ExitCode::DependencyFailure
            }
            Self::Usage => ExitCode::Usage,
            Self::StageBusy | Self::StorageQuotaExceeded | Self::StorageIo | Self::Internal => {
                ExitCode::Internal
            }
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigPathScope {
    User,
    Workspace,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MachineError {
    pub code: String,
    pub message: String,
    #[serde(default)]
    pub details: BTreeMap<String, String>,
}

impl MachineError {
    #[must_use]
    pub fn new(code: ErrorCode, message: &str) -> Self {
        Self {
            code: code.as_str().to_string(),
            message: message.to_string(),
            details: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_detail(mut self, key: &str, value: &str) -> Self {
        self.details.insert(key.to_string(), value.to_string());
        self
    }
}

impl fmt::Display for MachineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for MachineError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_are_unique_snake_case() {
        let mut seen = std::collections::BTreeSet::new();
        for code in ERROR_CODES {
            let s = code.as_str();
            assert!(s.chars().all(|c| c.is_ascii_lowercase() || c == '_'), "{s}");
            assert!(seen.insert(s), "duplicate code {s}");
        }
    }

    #[test]
    fn remote_failures_map_to_dependency_exit() {
        assert_eq!(
            ErrorCode::RemoteStatus.exit_code(),
            ExitCode::DependencyFailure
        );
        assert_eq!(ErrorCode::InvalidInput.exit_code(), ExitCode::Validation);
    }
}
