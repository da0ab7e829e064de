//! Prediction serving: request validation and loaded-model inference

mod inference;
mod schema;

pub use inference::{inverse_log, PredictionResult, PredictionService};
pub use schema::{FeatureRecord, FieldRule, FieldSpec, ServingSchema};

use crate::error::InferenceError;
use crate::models::ModelInfo;

/// Anything that can answer prediction requests
pub trait Predictor: Send + Sync {
    /// Price estimate for a validated record
    fn predict(&self, record: &FeatureRecord) -> Result<PredictionResult, InferenceError>;

    /// Fields a request must carry
    fn schema(&self) -> &ServingSchema;

    fn model_info(&self) -> ModelInfo;
}
