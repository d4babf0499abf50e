// SPDX-License-Identifier: Apache-2.0

use crate::{StoreError, StoreErrorCode};
use std::path::{Path, PathBuf};

pub const BLOB_EXTENSION: &str = "blob";
pub const CHECKSUM_EXTENSION: &str = "sha256";
pub const BLOB_KEY_MAX_LEN: usize = 64;

pub fn validate_blob_key(key: &str) -> Result<(), StoreError> {
    if key.is_empty() || key.len() > BLOB_KEY_MAX_LEN {
        return Err(StoreError::new(
            StoreErrorCode::Validation,
            format!("blob key must be 1..={BLOB_KEY_MAX_LEN} characters"),
        ));
    }
    if !key
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
    {
        return Err(StoreError::new(
            StoreErrorCode::Validation,
            format!("blob key `{key}` must match [a-z0-9_-]+"),
        ));
    }
    Ok(())
}

#[must_use]
pub fn blob_path(root: &Path, key: &str) -> PathBuf {
    root.join(format!("{key}.{BLOB_EXTENSION}"))
}

#[must_use]
pub fn blob_checksum_path(root: &Path, key: &str) -> PathBuf {
    root.join(format!("{key}.{CHECKSUM_EXTENSION}"))
}
