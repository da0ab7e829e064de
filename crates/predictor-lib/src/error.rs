//! Error taxonomy for training and serving
//!
//! Training-time classes ([`DataError`], [`SelectionError`], [`TrainingError`])
//! abort the whole run. [`ArtifactError`] is fatal to service startup.
//! [`RequestError`] and [`InferenceError`] are scoped to a single request.

use std::path::PathBuf;
use thiserror::Error;

/// Malformed or missing dataset
#[derive(Debug, Error)]
pub enum DataError {
    #[error("failed to read dataset {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed dataset {path:?}: {message}")]
    Malformed { path: PathBuf, message: String },
    #[error("dataset has no rows")]
    Empty,
    #[error("column '{0}' not found in dataset")]
    MissingColumn(String),
    #[error("non-numeric value {value:?} in column '{column}' at row {row}")]
    NonNumeric {
        column: String,
        row: usize,
        value: String,
    },
    #[error("target value {value} at row {row} is not positive, log transform undefined")]
    NonPositiveTarget { row: usize, value: f64 },
    #[error("invalid split: {0}")]
    InvalidSplit(String),
}

/// Invalid feature selection request
#[derive(Debug, Error)]
pub enum SelectionError {
    #[error("cannot select {requested} features from {available} candidates")]
    InvalidCount { requested: usize, available: usize },
    #[error("feature matrix has {rows} rows but target has {targets} values")]
    ShapeMismatch { rows: usize, targets: usize },
    #[error("need at least 3 rows to rank features, got {0}")]
    TooFewRows(usize),
    #[error("column '{0}' contains non-finite values and cannot be ranked")]
    NonFinite(String),
    #[error("candidate name '{0}' is not unique")]
    DuplicateName(String),
}

/// Fitting or hyperparameter search failure
#[derive(Debug, Error)]
pub enum TrainingError {
    #[error("training set is empty")]
    EmptyTrainingSet,
    #[error("shape mismatch: expected {expected}, got {actual}")]
    Shape { expected: String, actual: String },
    #[error("invalid hyperparameters: {0}")]
    InvalidParams(String),
    #[error("search space is empty: {0}")]
    EmptySearchSpace(String),
    #[error("cross-validation needs at least {folds} rows, got {rows}")]
    TooFewRows { rows: usize, folds: usize },
    #[error("model is not fitted")]
    NotFitted,
    #[error("fit produced non-finite values: {0}")]
    NonFinite(String),
    #[error("failed to persist trained model: {0}")]
    Persist(#[from] ArtifactError),
}

/// Missing or corrupt model artifact
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("model artifact {path:?} could not be accessed: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("model artifact {path:?} is corrupt: {reason}")]
    Corrupt { path: PathBuf, reason: String },
    #[error("model artifact {path:?} has unsupported format version {found} (expected {expected})")]
    UnsupportedVersion {
        path: PathBuf,
        found: u32,
        expected: u32,
    },
    #[error("failed to encode model artifact: {0}")]
    Encode(String),
    #[error("feature contract mismatch: model uses {model:?}, serving schema declares {schema:?}")]
    FeatureContract {
        model: Vec<String>,
        schema: Vec<String>,
    },
}

/// Prediction input rejected before reaching the model
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RequestError {
    #[error("request body must be a JSON object")]
    NotAnObject,
    #[error("missing required field '{0}'")]
    MissingField(String),
    #[error("unknown field '{0}'")]
    UnknownField(String),
    #[error("field '{field}' must be a number")]
    NotNumeric { field: String },
    #[error("field '{field}' must be finite")]
    NonFinite { field: String },
    #[error("field '{field}' = {value} is outside its domain ({rule})")]
    OutOfDomain {
        field: String,
        value: f64,
        rule: &'static str,
    },
}

impl RequestError {
    /// Stable label for metrics and logs
    pub fn kind(&self) -> &'static str {
        match self {
            RequestError::NotAnObject => "not_an_object",
            RequestError::MissingField(_) => "missing_field",
            RequestError::UnknownField(_) => "unknown_field",
            RequestError::NotNumeric { .. } => "not_numeric",
            RequestError::NonFinite { .. } => "non_finite",
            RequestError::OutOfDomain { .. } => "out_of_domain",
        }
    }
}

/// Unexpected failure while predicting on a well-formed record
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("input shape mismatch: expected {expected} features, got {actual}")]
    InvalidInputShape { expected: usize, actual: usize },
    #[error("model produced a non-finite output {0}")]
    NonFiniteOutput(f64),
    #[error("prediction failed: {0}")]
    Failed(String),
}

/// Any failure of an end-to-end training run
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Data(#[from] DataError),
    #[error(transparent)]
    Selection(#[from] SelectionError),
    #[error(transparent)]
    Training(#[from] TrainingError),
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
}
