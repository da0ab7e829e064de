//! Randomized hyperparameter search scored by k-fold cross-validation

use super::cv::KFold;
use crate::error::TrainingError;
use crate::pipeline::{HyperParams, ModelPipeline};
use ndarray::{Array1, Array2, Axis};
use rand::seq::index;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Candidate values for each tunable hyperparameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSpace {
    #[serde(default = "default_max_depth")]
    pub max_depth: Vec<usize>,
    #[serde(default = "default_learning_rate")]
    pub learning_rate: Vec<f64>,
    #[serde(default = "default_n_estimators")]
    pub n_estimators: Vec<usize>,
}

fn default_max_depth() -> Vec<usize> {
    (3..=10).collect()
}

fn default_learning_rate() -> Vec<f64> {
    vec![0.001, 0.01, 0.1]
}

fn default_n_estimators() -> Vec<usize> {
    vec![100]
}

impl Default for SearchSpace {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            learning_rate: default_learning_rate(),
            n_estimators: default_n_estimators(),
        }
    }
}

/// Cartesian product of a [`SearchSpace`]
#[derive(Debug, Clone)]
pub struct ParamGrid {
    combinations: Vec<HyperParams>,
}

impl ParamGrid {
    pub fn new(space: &SearchSpace) -> Result<Self, TrainingError> {
        for (name, len) in [
            ("max_depth", space.max_depth.len()),
            ("learning_rate", space.learning_rate.len()),
            ("n_estimators", space.n_estimators.len()),
        ] {
            if len == 0 {
                return Err(TrainingError::EmptySearchSpace(format!("no candidates for {}", name)));
            }
        }

        let mut combinations =
            Vec::with_capacity(space.max_depth.len() * space.learning_rate.len() * space.n_estimators.len());
        for &max_depth in &space.max_depth {
            for &learning_rate in &space.learning_rate {
                for &n_estimators in &space.n_estimators {
                    combinations.push(HyperParams {
                        max_depth,
                        learning_rate,
                        n_estimators,
                    });
                }
            }
        }
        Ok(Self { combinations })
    }

    pub fn len(&self) -> usize {
        self.combinations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.combinations.is_empty()
    }

    pub fn combinations(&self) -> &[HyperParams] {
        &self.combinations
    }

    /// `min(n, len)` distinct combinations, in sampled order
    pub fn sample(&self, n: usize, rng: &mut ChaCha8Rng) -> Vec<HyperParams> {
        let amount = n.min(self.len());
        index::sample(rng, self.len(), amount)
            .into_iter()
            .map(|i| self.combinations[i])
            .collect()
    }
}

/// Cross-validated score of one sampled candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateScore {
    pub params: HyperParams,
    /// Mean negative MSE over folds; higher is better
    pub mean_score: f64,
    pub fold_scores: Vec<f64>,
}

/// Outcome of a search: the refit winner and every candidate's score
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub best_pipeline: ModelPipeline,
    pub best_params: HyperParams,
    pub best_score: f64,
    /// Candidates in sampling order
    pub leaderboard: Vec<CandidateScore>,
}

#[derive(Debug, Clone)]
pub struct RandomizedSearch {
    space: SearchSpace,
    n_iter: usize,
    cv: KFold,
    seed: u64,
}

impl RandomizedSearch {
    pub fn new(space: SearchSpace, n_iter: usize, n_folds: usize, seed: u64) -> Self {
        Self {
            space,
            n_iter,
            cv: KFold::new(n_folds, seed),
            seed,
        }
    }

    /// Score sampled candidates and refit the best one on all of `x`.
    ///
    /// Any candidate that fails to fit aborts the search.
    pub fn run(
        &self,
        base: &ModelPipeline,
        x: &Array2<f64>,
        y: &Array1<f64>,
    ) -> Result<SearchOutcome, TrainingError> {
        if x.nrows() == 0 {
            return Err(TrainingError::EmptyTrainingSet);
        }
        if x.nrows() != y.len() {
            return Err(TrainingError::Shape {
                expected: format!("{} target values", x.nrows()),
                actual: format!("{} target values", y.len()),
            });
        }
        if self.n_iter == 0 {
            return Err(TrainingError::EmptySearchSpace("n_iter is 0".to_string()));
        }

        let grid = ParamGrid::new(&self.space)?;
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let candidates = grid.sample(self.n_iter, &mut rng);
        let folds = self.cv.split(x.nrows())?;

        info!(
            grid_size = grid.len(),
            candidates = candidates.len(),
            folds = folds.len(),
            rows = x.nrows(),
            "Starting randomized search"
        );

        let mut leaderboard = Vec::with_capacity(candidates.len());
        for params in candidates {
            let mut fold_scores = Vec::with_capacity(folds.len());
            for fold in &folds {
                let x_train = x.select(Axis(0), &fold.train);
                let y_train = y.select(Axis(0), &fold.train);
                let x_val = x.select(Axis(0), &fold.validation);
                let y_val = y.select(Axis(0), &fold.validation);

                let mut pipeline = base.with_hyper_params(params);
                pipeline.fit(&x_train, &y_train)?;
                let pred = pipeline.predict(&x_val)?;
                fold_scores.push(-mean_squared_error(&y_val, &pred));
            }
            let mean_score = fold_scores.iter().sum::<f64>() / fold_scores.len() as f64;
            if !mean_score.is_finite() {
                return Err(TrainingError::NonFinite(format!("cv score for {}", params)));
            }
            debug!(%params, mean_score, "Scored candidate");
            leaderboard.push(CandidateScore {
                params,
                mean_score,
                fold_scores,
            });
        }

        let best = best_candidate(&leaderboard)
            .ok_or_else(|| TrainingError::EmptySearchSpace("no candidates sampled".to_string()))?
            .clone();

        let mut best_pipeline = base.with_hyper_params(best.params);
        best_pipeline.fit(x, y)?;

        info!(best = %best.params, score = best.mean_score, "Randomized search completed");

        Ok(SearchOutcome {
            best_pipeline,
            best_params: best.params,
            best_score: best.mean_score,
            leaderboard,
        })
    }
}

/// Highest mean score; the earliest candidate wins ties
fn best_candidate(leaderboard: &[CandidateScore]) -> Option<&CandidateScore> {
    leaderboard.iter().fold(None, |best: Option<&CandidateScore>, c| match best {
        Some(b) if b.mean_score >= c.mean_score => Some(b),
        _ => Some(c),
    })
}

pub fn mean_squared_error(actual: &Array1<f64>, predicted: &Array1<f64>) -> f64 {
    let n = actual.len() as f64;
    actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).powi(2))
        .sum::<f64>()
        / n
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::BoostingParams;

    fn data() -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_fn((40, 2), |(i, j)| (i * (j + 1)) as f64 % 13.0 + i as f64 * 0.1);
        let y = x.column(0).mapv(|v| v * 0.3 + 1.0);
        (x, y)
    }

    fn base() -> ModelPipeline {
        ModelPipeline::new(vec!["a".to_string(), "b".to_string()], BoostingParams::default())
    }

    fn small_space() -> SearchSpace {
        SearchSpace {
            max_depth: vec![1, 2, 3],
            learning_rate: vec![0.01, 0.3],
            n_estimators: vec![5],
        }
    }

    #[test]
    fn test_default_space_matches_documented_grid() {
        let grid = ParamGrid::new(&SearchSpace::default()).unwrap();
        assert_eq!(grid.len(), 8 * 3);
    }

    #[test]
    fn test_grid_is_cartesian_product() {
        let grid = ParamGrid::new(&small_space()).unwrap();
        assert_eq!(grid.len(), 6);
        assert_eq!(grid.combinations()[0].max_depth, 1);
        assert_eq!(grid.combinations()[1].learning_rate, 0.3);
    }

    #[test]
    fn test_empty_dimension_rejected() {
        let space = SearchSpace {
            learning_rate: vec![],
            ..small_space()
        };
        assert!(matches!(ParamGrid::new(&space), Err(TrainingError::EmptySearchSpace(_))));
    }

    #[test]
    fn test_sampling_without_replacement_caps_at_grid_size() {
        let grid = ParamGrid::new(&small_space()).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let picked = grid.sample(50, &mut rng);
        assert_eq!(picked.len(), 6);
        for (i, a) in picked.iter().enumerate() {
            assert!(picked[i + 1..].iter().all(|b| b != a));
        }
    }

    #[test]
    fn test_search_is_reproducible() {
        let (x, y) = data();
        let search = RandomizedSearch::new(small_space(), 4, 3, 42);
        let a = search.run(&base(), &x, &y).unwrap();
        let b = search.run(&base(), &x, &y).unwrap();
        assert_eq!(a.leaderboard, b.leaderboard);
        assert_eq!(a.best_params, b.best_params);
        assert_eq!(a.leaderboard.len(), 4);
        assert!(a.best_pipeline.is_fitted());
    }

    #[test]
    fn test_best_has_highest_score() {
        let (x, y) = data();
        let outcome = RandomizedSearch::new(small_space(), 6, 4, 7).run(&base(), &x, &y).unwrap();
        assert!(outcome.leaderboard.iter().all(|c| c.mean_score <= outcome.best_score));
        assert!(outcome.best_score <= 0.0);
        assert_eq!(outcome.best_pipeline.hyper_params(), outcome.best_params);
    }

    #[test]
    fn test_ties_go_to_earliest_candidate() {
        let mk = |depth, score| CandidateScore {
            params: HyperParams {
                max_depth: depth,
                ..Default::default()
            },
            mean_score: score,
            fold_scores: vec![score],
        };
        let board = vec![mk(1, -2.0), mk(2, -1.0), mk(3, -1.0)];
        assert_eq!(best_candidate(&board).unwrap().params.max_depth, 2);
    }

    #[test]
    fn test_too_few_rows_for_folds() {
        let x = Array2::zeros((3, 2));
        let y = Array1::zeros(3);
        let err = RandomizedSearch::new(small_space(), 2, 5, 0).run(&base(), &x, &y).unwrap_err();
        assert!(matches!(err, TrainingError::TooFewRows { rows: 3, folds: 5 }));
    }

    #[test]
    fn test_empty_training_set() {
        let err = RandomizedSearch::new(small_space(), 2, 2, 0)
            .run(&base(), &Array2::zeros((0, 2)), &Array1::zeros(0))
            .unwrap_err();
        assert!(matches!(err, TrainingError::EmptyTrainingSet));
    }
}
