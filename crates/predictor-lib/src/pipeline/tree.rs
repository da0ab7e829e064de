//! Least-squares regression tree used as the boosting base learner
//!
//! Nodes live in a flat vector; index 0 is the root. Splits maximize the
//! L2-regularized reduction in squared error over the residuals.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Smallest gain that justifies a split
const MIN_SPLIT_GAIN: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// Growth limits for a single tree
#[derive(Debug, Clone, Copy)]
pub struct TreeParams {
    pub max_depth: usize,
    pub min_samples_leaf: usize,
    pub reg_lambda: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    gain: f64,
}

struct GrowContext<'a> {
    x: &'a Array2<f64>,
    residuals: &'a [f64],
    params: TreeParams,
}

impl RegressionTree {
    /// Fit on the rows listed in `rows`, targeting `residuals` (indexed like `x`)
    pub fn fit(x: &Array2<f64>, residuals: &[f64], rows: Vec<usize>, params: TreeParams) -> Self {
        let ctx = GrowContext {
            x,
            residuals,
            params: TreeParams {
                min_samples_leaf: params.min_samples_leaf.max(1),
                ..params
            },
        };
        let mut tree = Self { nodes: Vec::new() };
        tree.grow(&ctx, rows, 0);
        tree
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }

    pub fn predict_row(&self, row: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    fn grow(&mut self, ctx: &GrowContext<'_>, rows: Vec<usize>, depth: usize) -> usize {
        let sum: f64 = rows.iter().map(|&i| ctx.residuals[i]).sum();
        let idx = self.nodes.len();
        self.nodes.push(Node::Leaf {
            value: sum / (rows.len() as f64 + ctx.params.reg_lambda),
        });

        if depth >= ctx.params.max_depth || rows.len() < 2 * ctx.params.min_samples_leaf {
            return idx;
        }

        let Some(split) = best_split(ctx, &rows, sum) else {
            return idx;
        };

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
            .iter()
            .partition(|&&i| ctx.x[[i, split.feature]] <= split.threshold);

        let left = self.grow(ctx, left_rows, depth + 1);
        let right = self.grow(ctx, right_rows, depth + 1);
        self.nodes[idx] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        idx
    }
}

fn best_split(ctx: &GrowContext<'_>, rows: &[usize], total: f64) -> Option<SplitCandidate> {
    let n = rows.len();
    let lambda = ctx.params.reg_lambda;
    let min_leaf = ctx.params.min_samples_leaf;
    let parent_score = total * total / (n as f64 + lambda);

    let mut best: Option<SplitCandidate> = None;
    let mut sorted = rows.to_vec();

    for feature in 0..ctx.x.ncols() {
        sorted.sort_by(|&a, &b| {
            ctx.x[[a, feature]]
                .partial_cmp(&ctx.x[[b, feature]])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut left_sum = 0.0;
        for i in 0..n - 1 {
            left_sum += ctx.residuals[sorted[i]];
            let n_left = i + 1;
            let n_right = n - n_left;
            if n_left < min_leaf || n_right < min_leaf {
                continue;
            }

            let here = ctx.x[[sorted[i], feature]];
            let next = ctx.x[[sorted[i + 1], feature]];
            if here >= next {
                continue;
            }

            let right_sum = total - left_sum;
            let gain = left_sum * left_sum / (n_left as f64 + lambda)
                + right_sum * right_sum / (n_right as f64 + lambda)
                - parent_score;

            if gain > MIN_SPLIT_GAIN && best.as_ref().map_or(true, |b| gain > b.gain) {
                // Adjacent floats can round the midpoint up to `next`
                let mid = here + (next - here) / 2.0;
                let threshold = if mid >= next { here } else { mid };
                best = Some(SplitCandidate {
                    feature,
                    threshold,
                    gain,
                });
            }
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn params(max_depth: usize) -> TreeParams {
        TreeParams {
            max_depth,
            min_samples_leaf: 1,
            reg_lambda: 0.0,
        }
    }

    #[test]
    fn test_step_function_is_learned() {
        let x = array![[1.0], [2.0], [3.0], [10.0], [11.0], [12.0]];
        let r = [0.0, 0.0, 0.0, 5.0, 5.0, 5.0];
        let tree = RegressionTree::fit(&x, &r, (0..6).collect(), params(1));
        assert_eq!(tree.n_leaves(), 2);
        assert_eq!(tree.predict_row(&[2.5]), 0.0);
        assert_eq!(tree.predict_row(&[11.5]), 5.0);
        match &tree.nodes()[0] {
            Node::Split { threshold, .. } => assert_eq!(*threshold, 6.5),
            other => panic!("expected split, got {other:?}"),
        }
    }

    #[test]
    fn test_split_between_adjacent_floats() {
        let low = 1.0_f64;
        let high = f64::from_bits(low.to_bits() + 1);
        let x = array![[low], [high]];
        let tree = RegressionTree::fit(&x, &[-1.0, 1.0], vec![0, 1], params(1));

        assert_eq!(tree.n_leaves(), 2);
        assert_eq!(tree.predict_row(&[low]), -1.0);
        assert_eq!(tree.predict_row(&[high]), 1.0);
    }

    #[test]
    fn test_depth_zero_is_single_leaf() {
        let x = array![[1.0], [2.0]];
        let tree = RegressionTree::fit(&x, &[1.0, 3.0], vec![0, 1], params(0));
        assert_eq!(tree.nodes().len(), 1);
        assert_eq!(tree.predict_row(&[100.0]), 2.0);
    }

    #[test]
    fn test_reg_lambda_shrinks_leaves() {
        let x = array![[1.0], [2.0]];
        let tree = RegressionTree::fit(
            &x,
            &[4.0, 4.0],
            vec![0, 1],
            TreeParams {
                max_depth: 0,
                min_samples_leaf: 1,
                reg_lambda: 2.0,
            },
        );
        assert_eq!(tree.predict_row(&[1.0]), 2.0);
    }

    #[test]
    fn test_identical_values_are_never_split() {
        let x = array![[1.0], [1.0], [1.0]];
        let tree = RegressionTree::fit(&x, &[1.0, 2.0, 3.0], vec![0, 1, 2], params(3));
        assert_eq!(tree.n_leaves(), 1);
    }

    #[test]
    fn test_min_samples_leaf_respected() {
        let x = array![[1.0], [2.0], [3.0], [4.0]];
        let r = [10.0, 0.0, 0.0, 0.0];
        let tree = RegressionTree::fit(
            &x,
            &r,
            vec![0, 1, 2, 3],
            TreeParams {
                max_depth: 2,
                min_samples_leaf: 2,
                reg_lambda: 0.0,
            },
        );
        // The outlier cannot be isolated on its own
        assert_eq!(tree.predict_row(&[1.0]), 5.0);
    }

    #[test]
    fn test_only_listed_rows_are_used() {
        let x = array![[1.0], [2.0], [3.0]];
        let tree = RegressionTree::fit(&x, &[100.0, 2.0, 4.0], vec![1, 2], params(0));
        assert_eq!(tree.predict_row(&[1.0]), 3.0);
    }
}
