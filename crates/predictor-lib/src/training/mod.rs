//! End-to-end training run: load, split, select, search, persist, evaluate

pub mod cv;
pub mod evaluation;
pub mod search;

pub use cv::{Fold, KFold};
pub use evaluation::{evaluate, r2_score, rmse, EvaluationReport};
pub use search::{CandidateScore, ParamGrid, RandomizedSearch, SearchOutcome, SearchSpace};

use crate::data::{train_test_split, DataSource};
use crate::error::PipelineError;
use crate::observability::StructuredLogger;
use crate::pipeline::{BoostingParams, HyperParams, ModelPipeline};
use crate::selection::{FeatureSelector, SelectedFeatureSet, SelectionScheme};
use crate::store::{ModelArtifact, ModelStore, FORMAT_VERSION};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

/// Static configuration of one training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub dataset_path: PathBuf,
    pub artifact_path: PathBuf,
    pub target_column: String,
    pub seed: u64,
    pub test_fraction: f64,
    pub n_features: usize,
    pub selection_scheme: SelectionScheme,
    pub search_space: SearchSpace,
    pub n_iter: usize,
    pub cv_folds: usize,
    pub min_samples_leaf: usize,
    pub subsample: f64,
    pub reg_lambda: f64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            dataset_path: PathBuf::from("artifacts/boston.csv"),
            artifact_path: PathBuf::from("artifacts/best_model.bin"),
            target_column: "MEDV".to_string(),
            seed: 42,
            test_fraction: 0.3,
            n_features: 8,
            selection_scheme: SelectionScheme::Quotient,
            search_space: SearchSpace::default(),
            n_iter: 10,
            cv_folds: 5,
            min_samples_leaf: 1,
            subsample: 1.0,
            reg_lambda: 1.0,
        }
    }
}

impl TrainingConfig {
    fn booster(&self) -> BoostingParams {
        BoostingParams {
            min_samples_leaf: self.min_samples_leaf,
            subsample: self.subsample,
            reg_lambda: self.reg_lambda,
            seed: self.seed,
            ..Default::default()
        }
    }
}

/// Summary of a completed run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingReport {
    pub artifact_path: PathBuf,
    pub checksum: String,
    pub selected_features: SelectedFeatureSet,
    pub best_params: HyperParams,
    pub cv_score: f64,
    pub leaderboard: Vec<CandidateScore>,
    pub evaluation: EvaluationReport,
    pub train_rows: usize,
    pub test_rows: usize,
}

pub struct Trainer {
    config: TrainingConfig,
    logger: StructuredLogger,
}

impl Trainer {
    pub fn new(config: TrainingConfig) -> Self {
        Self {
            config,
            logger: StructuredLogger::new("trainer"),
        }
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Run every stage in order; the artifact is written only after search succeeds
    pub fn run(&self) -> Result<TrainingReport, PipelineError> {
        let started = Instant::now();
        let cfg = &self.config;

        let dataset = DataSource::new(&cfg.dataset_path, &cfg.target_column).load()?;
        // Reject non-positive prices before any work is done
        dataset.log_target()?;

        let split = train_test_split(&dataset, cfg.test_fraction, cfg.seed)?;
        let y_train = split.train.log_target()?;

        let selected = FeatureSelector::new(cfg.n_features)
            .with_scheme(cfg.selection_scheme)
            .select(split.train.features(), &y_train, split.train.feature_names())?;

        let x_train = split.train.select_columns(selected.names())?;
        let base = ModelPipeline::new(selected.names().to_vec(), cfg.booster());
        let outcome = RandomizedSearch::new(cfg.search_space.clone(), cfg.n_iter, cfg.cv_folds, cfg.seed)
            .run(&base, &x_train, &y_train)?;

        let artifact = ModelArtifact {
            format_version: FORMAT_VERSION,
            pipeline: outcome.best_pipeline,
            selected_features: selected.clone(),
            best_params: outcome.best_params,
            cv_score: outcome.best_score,
            leaderboard: outcome.leaderboard.clone(),
            created_at: Utc::now(),
        };
        let checksum = ModelStore::save(&artifact, &cfg.artifact_path)?;

        let evaluation = evaluate(&artifact.pipeline, &split.train, &split.test)?;

        self.logger.training_completed(
            selected.names(),
            &outcome.best_params.to_string(),
            outcome.best_score,
            evaluation.test_r2,
            started.elapsed().as_secs_f64(),
        );
        info!(
            artifact = %cfg.artifact_path.display(),
            checksum = %checksum,
            "Training run finished"
        );

        Ok(TrainingReport {
            artifact_path: cfg.artifact_path.clone(),
            checksum,
            selected_features: selected,
            best_params: outcome.best_params,
            cv_score: outcome.best_score,
            leaderboard: outcome.leaderboard,
            evaluation,
            train_rows: split.train.n_rows(),
            test_rows: split.test.n_rows(),
        })
    }
}

/// Convenience wrapper around [`Trainer::run`]
pub fn run_training(config: &TrainingConfig) -> Result<TrainingReport, PipelineError> {
    Trainer::new(config.clone()).run()
}
