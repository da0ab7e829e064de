//! K-fold cross-validation splitter

use crate::error::TrainingError;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// One train/validation partition of row indices
#[derive(Debug, Clone)]
pub struct Fold {
    pub train: Vec<usize>,
    pub validation: Vec<usize>,
}

/// K-fold splitter; fold sizes differ by at most one
#[derive(Debug, Clone)]
pub struct KFold {
    pub n_splits: usize,
    pub shuffle: bool,
    pub seed: u64,
}

impl KFold {
    pub fn new(n_splits: usize, seed: u64) -> Self {
        Self {
            n_splits,
            shuffle: true,
            seed,
        }
    }

    pub fn split(&self, n_samples: usize) -> Result<Vec<Fold>, TrainingError> {
        if self.n_splits < 2 {
            return Err(TrainingError::InvalidParams(format!(
                "cross-validation needs at least 2 folds, got {}",
                self.n_splits
            )));
        }
        if n_samples < self.n_splits {
            return Err(TrainingError::TooFewRows {
                rows: n_samples,
                folds: self.n_splits,
            });
        }

        let mut indices: Vec<usize> = (0..n_samples).collect();
        if self.shuffle {
            let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
            indices.shuffle(&mut rng);
        }

        let base = n_samples / self.n_splits;
        let remainder = n_samples % self.n_splits;

        let mut folds = Vec::with_capacity(self.n_splits);
        let mut start = 0;
        for k in 0..self.n_splits {
            let size = base + usize::from(k < remainder);
            let end = start + size;
            let validation = indices[start..end].to_vec();
            let train = indices[..start]
                .iter()
                .chain(&indices[end..])
                .copied()
                .collect();
            folds.push(Fold { train, validation });
            start = end;
        }
        Ok(folds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folds_partition_all_rows() {
        let folds = KFold::new(5, 42).split(23).unwrap();
        assert_eq!(folds.len(), 5);

        let mut seen: Vec<usize> = folds.iter().flat_map(|f| f.validation.clone()).collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..23).collect::<Vec<_>>());

        for fold in &folds {
            assert_eq!(fold.train.len() + fold.validation.len(), 23);
            assert!(fold.train.iter().all(|i| !fold.validation.contains(i)));
        }
    }

    #[test]
    fn test_fold_sizes_balanced() {
        let folds = KFold::new(4, 1).split(10).unwrap();
        let sizes: Vec<usize> = folds.iter().map(|f| f.validation.len()).collect();
        assert_eq!(sizes, vec![3, 3, 2, 2]);
    }

    #[test]
    fn test_seeded_shuffle_reproducible() {
        let a = KFold::new(3, 9).split(12).unwrap();
        let b = KFold::new(3, 9).split(12).unwrap();
        for (fa, fb) in a.iter().zip(&b) {
            assert_eq!(fa.validation, fb.validation);
        }
    }

    #[test]
    fn test_unshuffled_folds_are_contiguous() {
        let kf = KFold {
            n_splits: 2,
            shuffle: false,
            seed: 0,
        };
        let folds = kf.split(4).unwrap();
        assert_eq!(folds[0].validation, vec![0, 1]);
        assert_eq!(folds[1].train, vec![0, 1]);
    }

    #[test]
    fn test_too_few_rows() {
        assert!(matches!(
            KFold::new(5, 0).split(3),
            Err(TrainingError::TooFewRows { rows: 3, folds: 5 })
        ));
        assert!(KFold::new(1, 0).split(10).is_err());
    }
}
