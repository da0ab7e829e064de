//! API client for the price server

use anyhow::{Context, Result};
use predictor_lib::{ErrorResponse, ModelInfo, PredictionResponse};
use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use url::Url;

/// The eight fields the prediction endpoint accepts
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictRequest {
    #[serde(rename = "LSTAT")]
    pub lstat: f64,
    #[serde(rename = "RM")]
    pub rm: f64,
    #[serde(rename = "CRIM")]
    pub crim: f64,
    #[serde(rename = "PTRATIO")]
    pub ptratio: f64,
    #[serde(rename = "INDUS")]
    pub indus: f64,
    #[serde(rename = "TAX")]
    pub tax: f64,
    #[serde(rename = "NOX")]
    pub nox: f64,
    #[serde(rename = "B")]
    pub b: f64,
}

pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = Url::parse(base_url).context("Invalid API URL")?;

        Ok(Self { client, base_url })
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send request")?;

        Self::decode(response).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .context("Failed to send request")?;

        Self::decode(response).await
    }

    pub async fn predict(&self, request: &PredictRequest) -> Result<PredictionResponse> {
        self.post("predict", request).await
    }

    pub async fn model_info(&self) -> Result<ModelInfo> {
        self.get("model").await
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            match serde_json::from_str::<ErrorResponse>(&body) {
                Ok(err) => anyhow::bail!("API error ({}, {}): {}", status, err.code, err.error),
                Err(_) => anyhow::bail!("API error ({}): {}", status, body),
            }
        }

        response.json().await.context("Failed to parse response")
    }
}
