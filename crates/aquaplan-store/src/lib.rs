// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

mod error;
mod instrumentation;
mod local;
mod memory;
mod paths;

pub use error::{StoreError, StoreErrorCode};
pub use instrumentation::{
    NoopInstrumentation, StoreInstrumentation, StoreMetrics, StoreMetricsCollector,
};
pub use local::LocalFsBlobStore;
pub use memory::MemoryBlobStore;
pub use paths::{blob_checksum_path, blob_path, validate_blob_key, BLOB_EXTENSION, BLOB_KEY_MAX_LEN};

pub const CRATE_NAME: &str = "aquaplan-store";

/// Browser-localStorage-like default: 5 MiB per blob.
pub const DEFAULT_BLOB_QUOTA_BYTES: u64 = 5 * 1024 * 1024;

/// Named blobs that survive the process, overwritten wholesale on each put.
pub trait BlobStore: Send + Sync {
    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError>;
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;
    /// Returns whether a blob was present.
    fn remove(&self, key: &str) -> Result<bool, StoreError>;

    fn exists(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.get(key)?.is_some())
    }
}

pub(crate) fn enforce_quota(quota_bytes: Option<u64>, len: usize) -> Result<(), StoreError> {
    if let Some(quota) = quota_bytes {
        if len as u64 > quota {
            return Err(StoreError::new(
                StoreErrorCode::QuotaExceeded,
                format!("blob of {len} bytes exceeds storage quota of {quota} bytes"),
            ));
        }
    }
    Ok(())
}
