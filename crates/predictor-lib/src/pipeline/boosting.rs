//! Gradient boosted regression trees with squared-error loss

use super::tree::{RegressionTree, TreeParams};
use crate::error::TrainingError;
use ndarray::{Array1, Array2};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Gradient boosting configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoostingParams {
    /// Number of boosting rounds (trees)
    pub n_estimators: usize,
    /// Learning rate (shrinkage)
    pub learning_rate: f64,
    /// Maximum tree depth
    pub max_depth: usize,
    /// Minimum samples per leaf
    pub min_samples_leaf: usize,
    /// Row subsample ratio for each tree
    pub subsample: f64,
    /// L2 regularization on leaf values
    pub reg_lambda: f64,
    /// Random seed for row subsampling
    pub seed: u64,
}

impl Default for BoostingParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: 6,
            min_samples_leaf: 1,
            subsample: 1.0,
            reg_lambda: 1.0,
            seed: 42,
        }
    }
}

impl BoostingParams {
    pub fn validate(&self) -> Result<(), TrainingError> {
        let fail = |msg: String| Err(TrainingError::InvalidParams(msg));
        if self.n_estimators == 0 {
            return fail("n_estimators must be at least 1".to_string());
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return fail(format!("learning_rate must be positive, got {}", self.learning_rate));
        }
        if self.max_depth == 0 {
            return fail("max_depth must be at least 1".to_string());
        }
        if !(self.subsample > 0.0 && self.subsample <= 1.0) {
            return fail(format!("subsample must be in (0, 1], got {}", self.subsample));
        }
        if !(self.reg_lambda.is_finite() && self.reg_lambda >= 0.0) {
            return fail(format!("reg_lambda must be non-negative, got {}", self.reg_lambda));
        }
        Ok(())
    }
}

/// Gradient boosting regressor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostingRegressor {
    params: BoostingParams,
    base_score: f64,
    trees: Vec<RegressionTree>,
    n_features: usize,
}

impl GradientBoostingRegressor {
    pub fn fit(
        params: &BoostingParams,
        x: &Array2<f64>,
        y: &Array1<f64>,
    ) -> Result<Self, TrainingError> {
        params.validate()?;

        let n_samples = x.nrows();
        if n_samples == 0 {
            return Err(TrainingError::EmptyTrainingSet);
        }
        if y.len() != n_samples {
            return Err(TrainingError::Shape {
                expected: format!("{} target values", n_samples),
                actual: format!("{} target values", y.len()),
            });
        }

        let base_score = y.sum() / n_samples as f64;
        let mut predictions = vec![base_score; n_samples];
        let mut residuals = vec![0.0; n_samples];
        let mut rng = ChaCha8Rng::seed_from_u64(params.seed);
        let tree_params = TreeParams {
            max_depth: params.max_depth,
            min_samples_leaf: params.min_samples_leaf,
            reg_lambda: params.reg_lambda,
        };
        let sample_size = ((n_samples as f64) * params.subsample).ceil().max(1.0) as usize;
        let mut trees = Vec::with_capacity(params.n_estimators);

        for _ in 0..params.n_estimators {
            for i in 0..n_samples {
                residuals[i] = y[i] - predictions[i];
            }

            let mut rows: Vec<usize> = (0..n_samples).collect();
            if sample_size < n_samples {
                rows.shuffle(&mut rng);
                rows.truncate(sample_size);
                rows.sort_unstable();
            }

            let tree = RegressionTree::fit(x, &residuals, rows, tree_params);
            for (i, row) in x.rows().into_iter().enumerate() {
                let row = row.to_vec();
                predictions[i] += params.learning_rate * tree.predict_row(&row);
            }
            trees.push(tree);
        }

        if let Some(bad) = predictions.iter().find(|p| !p.is_finite()) {
            return Err(TrainingError::NonFinite(format!("training prediction {}", bad)));
        }

        Ok(Self {
            params: params.clone(),
            base_score,
            trees,
            n_features: x.ncols(),
        })
    }

    pub fn params(&self) -> &BoostingParams {
        &self.params
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn predict_row(&self, row: &[f64]) -> f64 {
        let lr = self.params.learning_rate;
        self.base_score + self.trees.iter().map(|t| lr * t.predict_row(row)).sum::<f64>()
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>, TrainingError> {
        if x.ncols() != self.n_features {
            return Err(TrainingError::Shape {
                expected: format!("{} columns", self.n_features),
                actual: format!("{} columns", x.ncols()),
            });
        }
        Ok(x.rows()
            .into_iter()
            .map(|row| self.predict_row(&row.to_vec()))
            .collect())
    }
}
