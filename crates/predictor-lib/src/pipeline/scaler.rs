//! Z-score standardization

use crate::error::TrainingError;
use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

/// Per-column mean and population standard deviation, learned once
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    means: Vec<f64>,
    scales: Vec<f64>,
}

impl StandardScaler {
    /// Learn statistics from the training matrix
    pub fn fit(x: &Array2<f64>) -> Result<Self, TrainingError> {
        if x.nrows() == 0 {
            return Err(TrainingError::EmptyTrainingSet);
        }

        let n = x.nrows() as f64;
        let mut means = Vec::with_capacity(x.ncols());
        let mut scales = Vec::with_capacity(x.ncols());

        for col in x.axis_iter(Axis(1)) {
            let mean = col.sum() / n;
            let var = col.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
            let std = var.sqrt();
            if !mean.is_finite() || !std.is_finite() {
                return Err(TrainingError::NonFinite(format!(
                    "column {} statistics (mean {}, std {})",
                    means.len(),
                    mean,
                    std
                )));
            }
            means.push(mean);
            scales.push(if std == 0.0 { 1.0 } else { std });
        }

        Ok(Self { means, scales })
    }

    pub fn n_features(&self) -> usize {
        self.means.len()
    }

    pub fn means(&self) -> &[f64] {
        &self.means
    }

    pub fn scales(&self) -> &[f64] {
        &self.scales
    }

    /// Apply the stored statistics; never re-estimates them
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>, TrainingError> {
        if x.ncols() != self.n_features() {
            return Err(TrainingError::Shape {
                expected: format!("{} columns", self.n_features()),
                actual: format!("{} columns", x.ncols()),
            });
        }
        let mut out = x.clone();
        for (j, mut col) in out.axis_iter_mut(Axis(1)).enumerate() {
            let (mean, scale) = (self.means[j], self.scales[j]);
            col.mapv_inplace(|v| (v - mean) / scale);
        }
        Ok(out)
    }

    /// Standardize a single row in place
    pub fn transform_row(&self, row: &mut [f64]) {
        for ((v, mean), scale) in row.iter_mut().zip(&self.means).zip(&self.scales) {
            *v = (*v - mean) / scale;
        }
    }
}
