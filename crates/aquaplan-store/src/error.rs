// SPDX-License-Identifier: Apache-2.0

use aquaplan_core::ErrorCode;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum StoreErrorCode {
    Validation,
    QuotaExceeded,
    Corrupt,
    Io,
}

impl StoreErrorCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation_error",
            Self::QuotaExceeded => "quota_exceeded",
            Self::Corrupt => "corrupt_blob",
            Self::Io => "io_error",
        }
    }

    #[must_use]
    pub const fn as_error_code(self) -> ErrorCode {
        match self {
            Self::Validation => ErrorCode::InvalidInput,
            Self::QuotaExceeded => ErrorCode::StorageQuotaExceeded,
            Self::Corrupt | Self::Io => ErrorCode::StorageIo,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreError {
    pub code: StoreErrorCode,
    pub message: String,
}

impl StoreError {
    #[must_use]
    pub fn new(code: StoreErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub(crate) fn io(e: std::io::Error) -> Self {
        Self::new(StoreErrorCode::Io, e.to_string())
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for StoreError {}
