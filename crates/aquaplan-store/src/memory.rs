// SPDX-License-Identifier: Apache-2.0

use crate::paths::validate_blob_key;
use crate::{enforce_quota, BlobStore, StoreError, StoreErrorCode};
use std::collections::BTreeMap;
use std::sync::Mutex;

/// In-process blob store, for tests and for runs that should leave nothing on disk.
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<BTreeMap<String, Vec<u8>>>,
    quota_bytes: Option<u64>,
}

impl MemoryBlobStore {
    #[must_use]
    pub fn with_quota(quota_bytes: u64) -> Self {
        Self {
            blobs: Mutex::new(BTreeMap::new()),
            quota_bytes: Some(quota_bytes),
        }
    }

    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.blobs
            .lock()
            .map(|b| b.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, Vec<u8>>>, StoreError> {
        self.blobs
            .lock()
            .map_err(|_| StoreError::new(StoreErrorCode::Io, "memory store lock poisoned"))
    }
}

impl BlobStore for MemoryBlobStore {
    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError> {
        validate_blob_key(key)?;
        enforce_quota(self.quota_bytes, bytes.len())?;
        self.lock()?.insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        validate_blob_key(key)?;
        Ok(self.lock()?.get(key).cloned())
    }

    fn remove(&self, key: &str) -> Result<bool, StoreError> {
        validate_blob_key(key)?;
        Ok(self.lock()?.remove(key).is_some())
    }
}
