// SPDX-License-Identifier: Apache-2.0

use crate::paths::{blob_checksum_path, blob_path, validate_blob_key};
use crate::{
    enforce_quota, BlobStore, NoopInstrumentation, StoreError, StoreErrorCode,
    StoreInstrumentation, DEFAULT_BLOB_QUOTA_BYTES,
};
use aquaplan_core::sha256_hex;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// One file per key under `root`, with a sha256 sidecar checked on read.
pub struct LocalFsBlobStore {
    pub root: PathBuf,
    quota_bytes: Option<u64>,
    instrumentation: Arc<dyn StoreInstrumentation>,
}

impl LocalFsBlobStore {
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            quota_bytes: Some(DEFAULT_BLOB_QUOTA_BYTES),
            instrumentation: Arc::new(NoopInstrumentation),
        }
    }

    /// `None` disables the quota.
    #[must_use]
    pub fn with_quota(mut self, quota_bytes: Option<u64>) -> Self {
        self.quota_bytes = quota_bytes;
        self
    }

    #[must_use]
    pub fn with_instrumentation(mut self, instrumentation: Arc<dyn StoreInstrumentation>) -> Self {
        self.instrumentation = instrumentation;
        self
    }

    fn observe<T>(&self, result: Result<T, StoreError>) -> Result<T, StoreError> {
        if let Err(e) = &result {
            self.instrumentation.observe_error(e.code);
        }
        result
    }

    fn put_inner(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError> {
        validate_blob_key(key)?;
        enforce_quota(self.quota_bytes, bytes.len())?;
        let started = Instant::now();
        fs::create_dir_all(&self.root).map_err(StoreError::io)?;

        let final_blob = blob_path(&self.root, key);
        let final_sum = blob_checksum_path(&self.root, key);
        let tmp_blob = final_blob.with_extension("blob.tmp");
        let tmp_sum = final_sum.with_extension("sha256.tmp");

        write_and_sync(&tmp_blob, bytes)?;
        write_and_sync(&tmp_sum, sha256_hex(bytes).as_bytes())?;
        fs::rename(&tmp_blob, &final_blob).map_err(StoreError::io)?;
        fs::rename(&tmp_sum, &final_sum).map_err(StoreError::io)?;
        sync_dir(&self.root)?;

        self.instrumentation
            .observe_write(bytes.len(), started.elapsed());
        Ok(())
    }

    fn get_inner(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        validate_blob_key(key)?;
        let path = blob_path(&self.root, key);
        if !path.exists() {
            return Ok(None);
        }
        let started = Instant::now();
        let bytes = fs::read(&path).map_err(StoreError::io)?;
        let sum_path = blob_checksum_path(&self.root, key);
        if sum_path.exists() {
            let expected = fs::read_to_string(&sum_path).map_err(StoreError::io)?;
            let actual = sha256_hex(&bytes);
            if expected.trim() != actual {
                return Err(StoreError::new(
                    StoreErrorCode::Corrupt,
                    format!("blob `{key}` checksum mismatch: expected {}, got {actual}", expected.trim()),
                ));
            }
        }
        self.instrumentation
            .observe_read(bytes.len(), started.elapsed());
        Ok(Some(bytes))
    }

    fn remove_inner(&self, key: &str) -> Result<bool, StoreError> {
        validate_blob_key(key)?;
        let path = blob_path(&self.root, key);
        let existed = path.exists();
        if existed {
            fs::remove_file(&path).map_err(StoreError::io)?;
        }
        let sum_path = blob_checksum_path(&self.root, key);
        if sum_path.exists() {
            fs::remove_file(&sum_path).map_err(StoreError::io)?;
        }
        Ok(existed)
    }
}

impl BlobStore for LocalFsBlobStore {
    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError> {
        self.observe(self.put_inner(key, bytes))
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.observe(self.get_inner(key))
    }

    fn remove(&self, key: &str) -> Result<bool, StoreError> {
        self.observe(self.remove_inner(key))
    }
}

fn write_and_sync(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let mut f = fs::File::create(path).map_err(StoreError::io)?;
    f.write_all(bytes).map_err(StoreError::io)?;
    f.sync_all().map_err(StoreError::io)?;
    Ok(())
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> Result<(), StoreError> {
    let f = OpenOptions::new()
        .read(true)
        .open(dir)
        .map_err(StoreError::io)?;
    f.sync_all().map_err(StoreError::io)?;
    Ok(())
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> Result<(), StoreError> {
    Ok(())
}
