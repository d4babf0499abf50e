// SPDX-License-Identifier: Apache-2.0

use super::{
    extract_rows, ComputeBackend, DemandRequest, GsrRequest, RechargeRequest, StressRequest,
};
use crate::config::{BackendConfig, EndpointPaths};
use crate::error::{BackendError, BackendErrorCode};
use crate::retry::{BackoffPolicy, RetryPolicy};
use crate::Stage;
use async_trait::async_trait;
use aquaplan_model::{DemandRow, GsrRow, RechargeRow, StressRow};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, instrument};

pub struct HttpComputeBackend {
    base_url: reqwest::Url,
    endpoints: EndpointPaths,
    auth_bearer: Option<String>,
    retry: RetryPolicy,
    client: reqwest::Client,
}

impl HttpComputeBackend {
    pub fn new(cfg: &BackendConfig) -> Result<Self, BackendError> {
        let mut raw = cfg.base_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        let base_url = reqwest::Url::parse(&raw).map_err(|e| {
            BackendError::new(BackendErrorCode::Config, format!("invalid base url: {e}"))
        })?;
        let client = reqwest::Client::builder()
            .timeout(cfg.timeout())
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| {
                BackendError::new(BackendErrorCode::Config, format!("http client: {e}"))
            })?;
        Ok(Self {
            base_url,
            endpoints: cfg.endpoints.clone(),
            auth_bearer: cfg.bearer.clone(),
            retry: cfg.retry.clone(),
            client,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &reqwest::Url {
        &self.base_url
    }

    fn endpoint_url(&self, stage: Stage) -> Result<reqwest::Url, BackendError> {
        let path = self.endpoints.for_stage(stage).trim_start_matches('/');
        self.base_url.join(path).map_err(|e| {
            BackendError::new(
                BackendErrorCode::Config,
                format!("invalid endpoint path {path:?}: {e}"),
            )
        })
    }

    fn auth_headers(&self) -> Result<HeaderMap, BackendError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = &self.auth_bearer {
            let value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|e| {
                BackendError::new(BackendErrorCode::Config, format!("invalid auth header: {e}"))
            })?;
            headers.insert(AUTHORIZATION, value);
        }
        Ok(headers)
    }

    #[instrument(name = "compute_post_with_retry", skip(self, body))]
    async fn post_rows<B, T>(&self, stage: Stage, body: &B) -> Result<Vec<T>, BackendError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let url = self.endpoint_url(stage)?;
        let headers = self.auth_headers()?;
        let mut attempt = 0;
        loop {
            attempt += 1;
            let req = self
                .client
                .post(url.clone())
                .headers(headers.clone())
                .json(body);
            match req.send().await {
                Ok(resp) if resp.status().is_success() => {
                    let bytes = resp.bytes().await.map_err(|e| {
                        BackendError::new(
                            BackendErrorCode::Network,
                            format!("read body failed: {e}"),
                        )
                    })?;
                    let value: serde_json::Value =
                        serde_json::from_slice(&bytes).map_err(|e| {
                            BackendError::new(
                                BackendErrorCode::Malformed,
                                format!("response is not JSON: {e}"),
                            )
                        })?;
                    let rows = extract_rows(value)?;
                    debug!(attempt, rows = rows.len(), "compute response decoded");
                    return Ok(rows);
                }
                Ok(resp) => {
                    let status = resp.status();
                    let retryable = status.is_server_error() || status.as_u16() == 429;
                    if !retryable || attempt >= self.retry.max_attempts {
                        return Err(BackendError::new(
                            BackendErrorCode::Status,
                            format!("{url} answered {status}"),
                        ));
                    }
                }
                Err(e) => {
                    if attempt >= self.retry.max_attempts {
                        return Err(BackendError::new(
                            BackendErrorCode::Network,
                            format!("request to {url} failed: {e}"),
                        ));
                    }
                }
            }
            debug!(attempt, "retrying compute request");
            tokio::time::sleep(self.retry.delay_for_attempt(attempt)).await;
        }
    }
}

#[async_trait]
impl ComputeBackend for HttpComputeBackend {
    fn backend_tag(&self) -> &'static str {
        "http"
    }

    async fn recharge(&self, req: &RechargeRequest) -> Result<Vec<RechargeRow>, BackendError> {
        self.post_rows(Stage::Recharge, req).await
    }

    async fn demand(&self, req: &DemandRequest) -> Result<Vec<DemandRow>, BackendError> {
        self.post_rows(Stage::Demand(req.category), req).await
    }

    async fn gsr(&self, req: &GsrRequest) -> Result<Vec<GsrRow>, BackendError> {
        self.post_rows(Stage::Gsr, req).await
    }

    async fn stress(&self, req: &StressRequest) -> Result<Vec<StressRow>, BackendError> {
        self.post_rows(Stage::Stress, req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_join_under_base_path() {
        let cfg = BackendConfig {
            base_url: "http://gw.example/api/v1".to_string(),
            ..BackendConfig::default()
        };
        let backend = HttpComputeBackend::new(&cfg).expect("backend");
        let url = backend
            .endpoint_url(Stage::Demand(aquaplan_model::DemandCategory::Agricultural))
            .expect("url");
        assert_eq!(url.as_str(), "http://gw.example/api/v1/demand/agricultural");
    }

    #[test]
    fn invalid_base_url_is_config_error() {
        let cfg = BackendConfig {
            base_url: "not a url".to_string(),
            ..BackendConfig::default()
        };
        let err = HttpComputeBackend::new(&cfg).err().expect("config error");
        assert_eq!(err.code, BackendErrorCode::Config);
    }
}
