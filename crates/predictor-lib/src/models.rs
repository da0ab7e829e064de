//! Wire types shared by the prediction endpoint and its clients

use crate::pipeline::HyperParams;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of a successful `POST /predict`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub prediction: f64,
}

/// Body of any failed request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl ErrorResponse {
    pub const INVALID_REQUEST: &'static str = "invalid_request";
    pub const INFERENCE_FAILED: &'static str = "inference_failed";

    pub fn new(code: &str, error: impl ToString) -> Self {
        Self {
            error: error.to_string(),
            code: code.to_string(),
        }
    }
}

/// Metadata about the served model, returned by `GET /model`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub version: String,
    pub checksum: String,
    pub format_version: u32,
    /// Column order the model consumes
    pub features: Vec<String>,
    pub best_params: HyperParams,
    /// Mean cross-validated negative MSE in log space
    pub cv_score: f64,
    pub created_at: DateTime<Utc>,
}
