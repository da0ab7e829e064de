//! Standardize-then-boost regression pipeline

pub mod boosting;
pub mod scaler;
pub mod tree;

pub use boosting::{BoostingParams, GradientBoostingRegressor};
pub use scaler::StandardScaler;

use crate::error::{InferenceError, TrainingError};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The tunable knobs explored by hyperparameter search
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HyperParams {
    pub max_depth: usize,
    pub learning_rate: f64,
    pub n_estimators: usize,
}

impl Default for HyperParams {
    fn default() -> Self {
        Self {
            max_depth: 3,
            learning_rate: 0.1,
            n_estimators: 100,
        }
    }
}

impl fmt::Display for HyperParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "max_depth={} learning_rate={} n_estimators={}",
            self.max_depth, self.learning_rate, self.n_estimators
        )
    }
}

/// Scaler + regressor, fit as a unit and applied as a unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelPipeline {
    booster: BoostingParams,
    feature_names: Vec<String>,
    scaler: Option<StandardScaler>,
    regressor: Option<GradientBoostingRegressor>,
}

impl ModelPipeline {
    pub fn new(feature_names: Vec<String>, booster: BoostingParams) -> Self {
        Self {
            booster,
            feature_names,
            scaler: None,
            regressor: None,
        }
    }

    /// Unfitted copy with the searched hyperparameters swapped in
    pub fn with_hyper_params(&self, params: HyperParams) -> Self {
        Self::new(
            self.feature_names.clone(),
            BoostingParams {
                max_depth: params.max_depth,
                learning_rate: params.learning_rate,
                n_estimators: params.n_estimators,
                ..self.booster.clone()
            },
        )
    }

    pub fn hyper_params(&self) -> HyperParams {
        HyperParams {
            max_depth: self.booster.max_depth,
            learning_rate: self.booster.learning_rate,
            n_estimators: self.booster.n_estimators,
        }
    }

    pub fn booster(&self) -> &BoostingParams {
        &self.booster
    }

    /// Column order the pipeline expects
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn is_fitted(&self) -> bool {
        self.scaler.is_some() && self.regressor.is_some()
    }

    /// Learn scaling statistics, then the regressor on the scaled matrix
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<(), TrainingError> {
        if x.ncols() != self.feature_names.len() {
            return Err(TrainingError::Shape {
                expected: format!("{} columns ({:?})", self.feature_names.len(), self.feature_names),
                actual: format!("{} columns", x.ncols()),
            });
        }
        let scaler = StandardScaler::fit(x)?;
        let scaled = scaler.transform(x)?;
        let regressor = GradientBoostingRegressor::fit(&self.booster, &scaled, y)?;
        self.scaler = Some(scaler);
        self.regressor = Some(regressor);
        Ok(())
    }

    /// Raw (log-space) predictions for every row of `x`
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>, TrainingError> {
        let (scaler, regressor) = self.fitted().ok_or(TrainingError::NotFitted)?;
        regressor.predict(&scaler.transform(x)?)
    }

    /// Raw (log-space) prediction for one row laid out in `feature_names` order
    pub fn predict_row(&self, row: &[f64]) -> Result<f64, InferenceError> {
        let (scaler, regressor) = self
            .fitted()
            .ok_or_else(|| InferenceError::Failed("pipeline is not fitted".to_string()))?;
        if row.len() != scaler.n_features() {
            return Err(InferenceError::InvalidInputShape {
                expected: scaler.n_features(),
                actual: row.len(),
            });
        }
        let mut scaled = row.to_vec();
        scaler.transform_row(&mut scaled);
        Ok(regressor.predict_row(&scaled))
    }

    fn fitted(&self) -> Option<(&StandardScaler, &GradientBoostingRegressor)> {
        Some((self.scaler.as_ref()?, self.regressor.as_ref()?))
    }
}
