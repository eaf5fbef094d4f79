//! HTTP clients for the device-risk and recall-risk services.

use super::{
    ApiError, DevicePredictRequest, MetadataResponse, PredictionResult, PredictionService,
    RecallPredictionResult,
};
use crate::form::{DeviceRecord, RecallRecord};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// JSON-over-HTTP client bound to one service base URL.
#[derive(Debug, Clone)]
pub struct ServiceClient {
    base_url: String,
    timeout: Duration,
    http: reqwest::Client,
}

impl ServiceClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            http,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn map_send_error(&self, e: reqwest::Error) -> ApiError {
        if e.is_timeout() {
            ApiError::Timeout(self.timeout)
        } else {
            ApiError::Network(e.to_string())
        }
    }

    /// Issue a GET and decode the JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.url(path);
        tracing::debug!("GET {}", url);

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        self.read_json(response).await
    }

    /// Issue a POST with a JSON body and decode the JSON reply.
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        tracing::debug!("POST {}", url);

        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        self.read_json(response).await
    }

    async fn read_json<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T, ApiError> {
        let status = response.status();
        let text = response.text().await.map_err(|e| self.map_send_error(e))?;

        if !status.is_success() {
            return Err(ApiError::Http {
                status: status.as_u16(),
                body: text,
            });
        }

        serde_json::from_str(&text).map_err(|e| ApiError::Parse(e.to_string()))
    }
}

/// Client for the device-risk service (`/metadata`, `/predict`).
#[derive(Debug, Clone)]
pub struct DeviceRiskClient {
    inner: ServiceClient,
}

impl DeviceRiskClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        Ok(Self {
            inner: ServiceClient::new(base_url, timeout)?,
        })
    }
}

#[async_trait]
impl PredictionService<DeviceRecord> for DeviceRiskClient {
    async fn metadata(&self) -> Result<MetadataResponse, ApiError> {
        self.inner.get_json("/metadata").await
    }

    async fn predict(&self, record: &DeviceRecord) -> Result<PredictionResult, ApiError> {
        let body = DevicePredictRequest { device: record };
        let result: PredictionResult = self.inner.post_json("/predict", &body).await?;

        // A 2xx reply can still carry an error message.
        if let Some(message) = result.error.as_ref().filter(|m| !m.trim().is_empty()) {
            return Err(ApiError::Service(message.clone()));
        }

        Ok(result)
    }
}

/// Client for the recall-risk service (`/metadata`, `/predict-risk`).
#[derive(Debug, Clone)]
pub struct RecallRiskClient {
    inner: ServiceClient,
}

impl RecallRiskClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        Ok(Self {
            inner: ServiceClient::new(base_url, timeout)?,
        })
    }
}

#[async_trait]
impl PredictionService<RecallRecord> for RecallRiskClient {
    async fn metadata(&self) -> Result<MetadataResponse, ApiError> {
        self.inner.get_json("/metadata").await
    }

    async fn predict(&self, record: &RecallRecord) -> Result<RecallPredictionResult, ApiError> {
        self.inner.post_json("/predict-risk", record).await
    }
}
