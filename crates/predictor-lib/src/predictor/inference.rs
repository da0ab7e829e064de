//! Loaded-model inference
//!
//! [`PredictionService`] is constructed once from a persisted artifact and
//! then shared read-only across requests.

use super::schema::{FeatureRecord, ServingSchema};
use super::Predictor;
use crate::error::{ArtifactError, InferenceError};
use crate::models::ModelInfo;
use crate::observability::ServiceMetrics;
use crate::store::{ModelArtifact, ModelStore, StoredModel};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, warn};

/// Inference above this latency is logged
const SLOW_INFERENCE_MS: u128 = 5;

/// One prediction in both spaces
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Price in original target units
    pub prediction: f64,
    /// Regressor output in log space
    pub raw: f64,
}

/// Undo the training-time `ln` applied to the target
pub fn inverse_log(raw: f64) -> f64 {
    raw.exp()
}

pub struct PredictionService {
    artifact: ModelArtifact,
    checksum: String,
    version: String,
    schema: ServingSchema,
    metrics: ServiceMetrics,
}

impl PredictionService {
    /// Read the artifact at `path` and check it against `schema`
    pub fn load(path: &Path, schema: ServingSchema) -> Result<Self, ArtifactError> {
        let stored = ModelStore::load(path)?;
        Self::from_stored(stored, schema)
    }

    pub fn from_stored(stored: StoredModel, schema: ServingSchema) -> Result<Self, ArtifactError> {
        let version = stored.version().to_string();
        let StoredModel {
            artifact, checksum, ..
        } = stored;

        let model: BTreeSet<&String> = artifact.selected_features.names().iter().collect();
        let declared = schema.field_names();
        let declared_set: BTreeSet<&String> = declared.iter().collect();
        let pipeline_set: BTreeSet<&String> = artifact.pipeline.feature_names().iter().collect();
        if model != declared_set || pipeline_set != model {
            return Err(ArtifactError::FeatureContract {
                model: artifact.pipeline.feature_names().to_vec(),
                schema: declared,
            });
        }

        let metrics = ServiceMetrics::new();
        metrics.set_model_info(&version, artifact.pipeline.feature_names());

        Ok(Self {
            artifact,
            checksum,
            version,
            schema,
            metrics,
        })
    }

    pub fn schema(&self) -> &ServingSchema {
        &self.schema
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn artifact(&self) -> &ModelArtifact {
        &self.artifact
    }

    pub fn predict(&self, record: &FeatureRecord) -> Result<PredictionResult, InferenceError> {
        let start = Instant::now();
        let result = self.run(record);
        let elapsed = start.elapsed();

        match &result {
            Ok(_) => {
                self.metrics.observe_prediction(elapsed.as_secs_f64());
                if elapsed.as_millis() > SLOW_INFERENCE_MS {
                    warn!(elapsed_ms = elapsed.as_millis(), "Inference exceeded {}ms", SLOW_INFERENCE_MS);
                } else {
                    debug!(elapsed_us = elapsed.as_micros(), "Inference completed");
                }
            }
            Err(e) => {
                self.metrics.inc_inference_errors();
                warn!(error = %e, "Inference failed");
            }
        }
        result
    }

    fn run(&self, record: &FeatureRecord) -> Result<PredictionResult, InferenceError> {
        let order = self.artifact.pipeline.feature_names();
        let row = record.row(order).ok_or_else(|| {
            InferenceError::Failed(format!("record does not cover model features {:?}", order))
        })?;

        let raw = self.artifact.pipeline.predict_row(&row)?;
        if !raw.is_finite() {
            return Err(InferenceError::NonFiniteOutput(raw));
        }
        let prediction = inverse_log(raw);
        if !prediction.is_finite() {
            return Err(InferenceError::NonFiniteOutput(prediction));
        }
        Ok(PredictionResult { prediction, raw })
    }

    pub fn model_info(&self) -> ModelInfo {
        ModelInfo {
            version: self.version.clone(),
            checksum: self.checksum.clone(),
            format_version: self.artifact.format_version,
            features: self.artifact.pipeline.feature_names().to_vec(),
            best_params: self.artifact.best_params,
            cv_score: self.artifact.cv_score,
            created_at: self.artifact.created_at,
        }
    }
}

impl Predictor for PredictionService {
    fn predict(&self, record: &FeatureRecord) -> Result<PredictionResult, InferenceError> {
        PredictionService::predict(self, record)
    }

    fn schema(&self) -> &ServingSchema {
        &self.schema
    }

    fn model_info(&self) -> ModelInfo {
        PredictionService::model_info(self)
    }
}
