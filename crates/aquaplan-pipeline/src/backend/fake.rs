// SPDX-License-Identifier: Apache-2.0

use super::{
    extract_rows, ComputeBackend, DemandRequest, GsrRequest, RechargeRequest, StressRequest,
};
use crate::error::{BackendError, BackendErrorCode};
use crate::Stage;
use async_trait::async_trait;
use aquaplan_model::{DemandRow, GsrRow, RechargeRow, StressRow};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Notify};

/// In-process backend serving canned JSON bodies per stage.
///
/// Bodies go through the same row extraction as the HTTP backend, so a
/// malformed canned body fails the way a malformed response would.
pub struct FakeComputeBackend {
    pub responses: Mutex<BTreeMap<Stage, Result<serde_json::Value, BackendError>>>,
    pub requests: Mutex<Vec<(Stage, serde_json::Value)>>,
    pub calls: AtomicU64,
    pub delay: Duration,
    gate: Mutex<Option<Arc<Notify>>>,
}

impl Default for FakeComputeBackend {
    fn default() -> Self {
        Self {
            responses: Mutex::new(BTreeMap::new()),
            requests: Mutex::new(Vec::new()),
            calls: AtomicU64::new(0),
            delay: Duration::from_millis(0),
            gate: Mutex::new(None),
        }
    }
}

impl FakeComputeBackend {
    #[must_use]
    pub fn with_rows(mut self, stage: Stage, body: serde_json::Value) -> Self {
        self.responses.get_mut().insert(stage, Ok(body));
        self
    }

    #[must_use]
    pub fn with_failure(mut self, stage: Stage, err: BackendError) -> Self {
        self.responses.get_mut().insert(stage, Err(err));
        self
    }

    pub async fn set_rows(&self, stage: Stage, body: serde_json::Value) {
        self.responses.lock().await.insert(stage, Ok(body));
    }

    pub async fn set_failure(&self, stage: Stage, err: BackendError) {
        self.responses.lock().await.insert(stage, Err(err));
    }

    /// Makes subsequent calls wait until the returned handle is notified.
    pub async fn hold(&self) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        *self.gate.lock().await = Some(Arc::clone(&notify));
        notify
    }

    pub async fn release(&self) {
        if let Some(notify) = self.gate.lock().await.take() {
            notify.notify_waiters();
            notify.notify_one();
        }
    }

    #[must_use]
    pub fn call_count(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }

    pub async fn calls_for(&self, stage: Stage) -> usize {
        self.requests
            .lock()
            .await
            .iter()
            .filter(|(s, _)| *s == stage)
            .count()
    }

    pub async fn last_request(&self, stage: Stage) -> Option<serde_json::Value> {
        self.requests
            .lock()
            .await
            .iter()
            .rev()
            .find(|(s, _)| *s == stage)
            .map(|(_, body)| body.clone())
    }

    async fn serve<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        stage: Stage,
        req: &B,
    ) -> Result<Vec<T>, BackendError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        let body = serde_json::to_value(req).map_err(|e| {
            BackendError::new(BackendErrorCode::Malformed, format!("encode request: {e}"))
        })?;
        self.requests.lock().await.push((stage, body));
        let gate = self.gate.lock().await.clone();
        if let Some(notify) = gate {
            notify.notified().await;
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let canned = self.responses.lock().await.get(&stage).cloned();
        match canned {
            Some(Ok(body)) => extract_rows(body),
            Some(Err(err)) => Err(err),
            None => Err(BackendError::new(
                BackendErrorCode::Status,
                format!("no canned response for {}", stage.as_str()),
            )),
        }
    }
}

#[async_trait]
impl ComputeBackend for FakeComputeBackend {
    fn backend_tag(&self) -> &'static str {
        "fake"
    }

    async fn recharge(&self, req: &RechargeRequest) -> Result<Vec<RechargeRow>, BackendError> {
        self.serve(Stage::Recharge, req).await
    }

    async fn demand(&self, req: &DemandRequest) -> Result<Vec<DemandRow>, BackendError> {
        self.serve(Stage::Demand(req.category), req).await
    }

    async fn gsr(&self, req: &GsrRequest) -> Result<Vec<GsrRow>, BackendError> {
        self.serve(Stage::Gsr, req).await
    }

    async fn stress(&self, req: &StressRequest) -> Result<Vec<StressRow>, BackendError> {
        self.serve(Stage::Stress, req).await
    }
}
