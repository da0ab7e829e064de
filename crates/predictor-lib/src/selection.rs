//! Minimum-redundancy maximum-relevance feature selection
//!
//! Relevance of a candidate is its univariate F-statistic against the target.
//! Redundancy is its mean absolute Pearson correlation with the features
//! already picked. Features are chosen greedily, one per round.

use crate::error::SelectionError;
use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Floor applied to redundancy before dividing by it
const REDUNDANCY_FLOOR: f64 = 1e-6;

/// How relevance and redundancy combine into one score
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionScheme {
    /// relevance / redundancy
    #[default]
    Quotient,
    /// relevance - redundancy
    Difference,
}

/// Ordered feature names chosen for one training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedFeatureSet {
    names: Vec<String>,
    scores: Vec<f64>,
}

impl SelectedFeatureSet {
    pub fn new(names: Vec<String>, scores: Vec<f64>) -> Self {
        Self { names, scores }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Score each feature had in the round it was picked
    pub fn scores(&self) -> &[f64] {
        &self.scores
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }
}

/// Greedy relevance/redundancy ranker
#[derive(Debug, Clone)]
pub struct FeatureSelector {
    k: usize,
    scheme: SelectionScheme,
}

impl FeatureSelector {
    pub fn new(k: usize) -> Self {
        Self {
            k,
            scheme: SelectionScheme::default(),
        }
    }

    pub fn with_scheme(mut self, scheme: SelectionScheme) -> Self {
        self.scheme = scheme;
        self
    }

    /// Pick `k` of the columns of `x`. Run this on the training split only.
    pub fn select(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        names: &[String],
    ) -> Result<SelectedFeatureSet, SelectionError> {
        let n_features = x.ncols();
        if self.k == 0 || self.k > n_features || names.len() != n_features {
            return Err(SelectionError::InvalidCount {
                requested: self.k,
                available: n_features.min(names.len()),
            });
        }
        for (i, name) in names.iter().enumerate() {
            if names[..i].contains(name) {
                return Err(SelectionError::DuplicateName(name.clone()));
            }
        }
        if x.nrows() != y.len() {
            return Err(SelectionError::ShapeMismatch {
                rows: x.nrows(),
                targets: y.len(),
            });
        }
        if x.nrows() < 3 {
            return Err(SelectionError::TooFewRows(x.nrows()));
        }
        for (j, name) in names.iter().enumerate() {
            if x.column(j).iter().any(|v| !v.is_finite()) {
                return Err(SelectionError::NonFinite(name.clone()));
            }
        }
        if y.iter().any(|v| !v.is_finite()) {
            return Err(SelectionError::NonFinite("<target>".to_string()));
        }

        let relevance: Vec<f64> = (0..n_features)
            .map(|j| f_statistic(x.column(j), y.view()))
            .collect();

        // |corr| between candidates and picked features, filled lazily per pick
        let mut redundancy_sum = vec![0.0; n_features];
        let mut selected: Vec<usize> = Vec::with_capacity(self.k);
        let mut scores: Vec<f64> = Vec::with_capacity(self.k);

        while selected.len() < self.k {
            let mut best: Option<(usize, f64)> = None;
            for j in (0..n_features).filter(|j| !selected.contains(j)) {
                let score = if selected.is_empty() {
                    relevance[j]
                } else {
                    let redundancy = redundancy_sum[j] / selected.len() as f64;
                    match self.scheme {
                        SelectionScheme::Quotient => relevance[j] / redundancy.max(REDUNDANCY_FLOOR),
                        SelectionScheme::Difference => relevance[j] - redundancy,
                    }
                };
                // Strict comparison keeps the lower index on ties
                if best.map_or(true, |(_, s)| score > s) {
                    best = Some((j, score));
                }
            }

            let (pick, score) = match best {
                Some(b) => b,
                None => break,
            };
            debug!(feature = %names[pick], score, round = selected.len(), "Selected feature");

            for j in (0..n_features).filter(|j| !selected.contains(j) && *j != pick) {
                redundancy_sum[j] += pearson(x.column(j), x.column(pick)).abs();
            }
            selected.push(pick);
            scores.push(score);
        }

        let names: Vec<String> = selected.iter().map(|&j| names[j].clone()).collect();
        info!(k = self.k, scheme = ?self.scheme, features = ?names, "Feature selection completed");

        Ok(SelectedFeatureSet { names, scores })
    }
}

/// Pearson correlation; zero when either side is constant
pub fn pearson(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    let n = a.len() as f64;
    if n < 2.0 {
        return 0.0;
    }
    let mean_a = a.sum() / n;
    let mean_b = b.sum() / n;

    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (x, y) in a.iter().zip(b.iter()) {
        let da = x - mean_a;
        let db = y - mean_b;
        cov += da * db;
        var_a += da * da;
        var_b += db * db;
    }

    let denom = (var_a * var_b).sqrt();
    if denom < f64::EPSILON {
        return 0.0;
    }
    (cov / denom).clamp(-1.0, 1.0)
}

/// Univariate regression F-statistic with `n - 2` degrees of freedom
pub fn f_statistic(x: ArrayView1<f64>, y: ArrayView1<f64>) -> f64 {
    let n = x.len() as f64;
    let r2 = pearson(x, y).powi(2);
    if r2 >= 1.0 {
        return f64::MAX;
    }
    r2 / (1.0 - r2) * (n - 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("f{}", i)).collect()
    }

    /// f0 drives y, f1 is a near-copy of f0, f2 is a weaker independent signal, f3 is noise
    fn redundant_data() -> (Array2<f64>, Array1<f64>) {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let n = 200;
        let mut x = Array2::zeros((n, 4));
        let mut y = Array1::zeros(n);
        for i in 0..n {
            let a: f64 = rng.gen_range(-1.0..1.0);
            let b: f64 = rng.gen_range(-1.0..1.0);
            x[[i, 0]] = a;
            x[[i, 1]] = a + rng.gen_range(-0.01..0.01);
            x[[i, 2]] = b;
            x[[i, 3]] = rng.gen_range(-1.0..1.0);
            y[i] = 2.0 * a + 1.5 * b + rng.gen_range(-0.1..0.1);
        }
        (x, y)
    }

    #[test]
    fn test_pearson_perfect_and_constant() {
        let a = Array1::from_vec(vec![1.0, 2.0, 3.0, 4.0]);
        let b = Array1::from_vec(vec![2.0, 4.0, 6.0, 8.0]);
        let c = Array1::from_vec(vec![5.0, 5.0, 5.0, 5.0]);
        assert!((pearson(a.view(), b.view()) - 1.0).abs() < 1e-12);
        assert!((pearson(a.view(), b.mapv(|v| -v).view()) + 1.0).abs() < 1e-12);
        assert_eq!(pearson(a.view(), c.view()), 0.0);
    }

    #[test]
    fn test_repeated_candidate_name_rejected() {
        let (x, y) = redundant_data();
        let mut candidates = names(4);
        candidates[1] = "f0".to_string();
        for scheme in [SelectionScheme::Quotient, SelectionScheme::Difference] {
            let result = FeatureSelector::new(2).with_scheme(scheme).select(&x, &y, &candidates);
            assert!(matches!(result, Err(SelectionError::DuplicateName(ref n)) if n == "f0"));
        }
    }

    #[test]
    fn test_most_relevant_feature_first() {
        let (x, y) = redundant_data();
        let picked = FeatureSelector::new(1).select(&x, &y, &names(4)).unwrap();
        assert!(picked.names()[0] == "f0" || picked.names()[0] == "f1");
    }

    #[test]
    fn test_redundant_copy_is_penalized() {
        let (x, y) = redundant_data();
        let picked = FeatureSelector::new(2).select(&x, &y, &names(4)).unwrap();
        // The near-copy is highly relevant but fully redundant; the independent signal wins
        assert_eq!(picked.names()[1], "f2");
    }

    #[test]
    fn test_difference_scheme_returns_k_distinct() {
        let (x, y) = redundant_data();
        let picked = FeatureSelector::new(3)
            .with_scheme(SelectionScheme::Difference)
            .select(&x, &y, &names(4))
            .unwrap();
        assert_eq!(picked.len(), 3);
    }

    #[test]
    fn test_results_are_distinct_known_names() {
        let (x, y) = redundant_data();
        let candidates = names(4);
        for k in 1..=4 {
            let picked = FeatureSelector::new(k).select(&x, &y, &candidates).unwrap();
            assert_eq!(picked.len(), k);
            let mut seen = picked.names().to_vec();
            seen.sort();
            seen.dedup();
            assert_eq!(seen.len(), k, "duplicate names in {:?}", picked.names());
            assert!(picked.names().iter().all(|n| candidates.contains(n)));
        }
    }

    #[test]
    fn test_invalid_counts() {
        let (x, y) = redundant_data();
        assert!(matches!(
            FeatureSelector::new(0).select(&x, &y, &names(4)),
            Err(SelectionError::InvalidCount { .. })
        ));
        assert!(matches!(
            FeatureSelector::new(5).select(&x, &y, &names(4)),
            Err(SelectionError::InvalidCount { requested: 5, available: 4 })
        ));
    }

    #[test]
    fn test_non_finite_column_rejected() {
        let (mut x, y) = redundant_data();
        x[[3, 2]] = f64::NAN;
        assert!(matches!(
            FeatureSelector::new(2).select(&x, &y, &names(4)),
            Err(SelectionError::NonFinite(name)) if name == "f2"
        ));
    }

    #[test]
    fn test_constant_column_ranked_last() {
        let (mut x, y) = redundant_data();
        x.column_mut(3).fill(1.0);
        let picked = FeatureSelector::new(4).select(&x, &y, &names(4)).unwrap();
        assert_eq!(picked.names()[3], "f3");
    }
}
