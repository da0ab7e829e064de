//! Hold-out evaluation of a fitted pipeline

use crate::data::Dataset;
use crate::error::PipelineError;
use crate::pipeline::ModelPipeline;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use tracing::info;

/// R² is computed in log space, RMSE in price units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub train_r2: f64,
    pub test_r2: f64,
    pub train_rmse: f64,
    pub test_rmse: f64,
}

pub fn evaluate(
    pipeline: &ModelPipeline,
    train: &Dataset,
    test: &Dataset,
) -> Result<EvaluationReport, PipelineError> {
    let (train_r2, train_rmse) = score_split(pipeline, train)?;
    let (test_r2, test_rmse) = score_split(pipeline, test)?;

    let report = EvaluationReport {
        train_r2,
        test_r2,
        train_rmse,
        test_rmse,
    };
    info!(
        train_r2 = report.train_r2,
        test_r2 = report.test_r2,
        train_rmse = report.train_rmse,
        test_rmse = report.test_rmse,
        "Model evaluation"
    );
    Ok(report)
}

fn score_split(pipeline: &ModelPipeline, data: &Dataset) -> Result<(f64, f64), PipelineError> {
    let x = data.select_columns(pipeline.feature_names())?;
    let y_log = data.log_target()?;
    let pred_log = pipeline.predict(&x)?;
    let r2 = r2_score(&y_log, &pred_log);
    let price_rmse = rmse(&y_log.mapv(f64::exp), &pred_log.mapv(f64::exp));
    Ok((r2, price_rmse))
}

/// Coefficient of determination; 0 when the target is constant
pub fn r2_score(actual: &Array1<f64>, predicted: &Array1<f64>) -> f64 {
    let n = actual.len() as f64;
    if n == 0.0 {
        return 0.0;
    }
    let mean = actual.sum() / n;
    let ss_tot: f64 = actual.iter().map(|a| (a - mean).powi(2)).sum();
    let ss_res: f64 = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    if ss_tot == 0.0 {
        return 0.0;
    }
    1.0 - ss_res / ss_tot
}

pub fn rmse(actual: &Array1<f64>, predicted: &Array1<f64>) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    super::search::mean_squared_error(actual, predicted).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_perfect_fit() {
        let y = array![1.0, 2.0, 3.0];
        assert_abs_diff_eq!(r2_score(&y, &y), 1.0);
        assert_abs_diff_eq!(rmse(&y, &y), 0.0);
    }

    #[test]
    fn test_mean_predictor_has_zero_r2() {
        let y = array![1.0, 2.0, 3.0];
        let p = array![2.0, 2.0, 2.0];
        assert_abs_diff_eq!(r2_score(&y, &p), 0.0);
    }

    #[test]
    fn test_rmse_value() {
        let y = array![0.0, 0.0];
        let p = array![3.0, 4.0];
        assert_abs_diff_eq!(rmse(&y, &p), 12.5f64.sqrt(), epsilon = 1e-12);
    }
}
