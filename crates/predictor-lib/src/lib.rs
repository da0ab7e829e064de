//! House price prediction library
//!
//! This crate provides the core functionality for:
//! - Loading and splitting the training dataset
//! - Relevance/redundancy feature selection
//! - The scaler + gradient boosting pipeline and its hyperparameter search
//! - Model artifact persistence
//! - Serving predictions from a loaded artifact
//! - Health checks and observability

pub mod data;
pub mod error;
pub mod health;
pub mod models;
pub mod observability;
pub mod pipeline;
pub mod predictor;
pub mod selection;
pub mod store;
pub mod training;

pub use error::{
    ArtifactError, DataError, InferenceError, PipelineError, RequestError, SelectionError,
    TrainingError,
};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{ServiceMetrics, StructuredLogger};
pub use predictor::{FeatureRecord, PredictionResult, PredictionService, Predictor, ServingSchema};
pub use training::{run_training, Trainer, TrainingConfig, TrainingReport};
