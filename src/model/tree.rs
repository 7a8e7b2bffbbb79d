//! CART regression tree.
//!
//! Splits minimize the sum of squared errors of the two children. Samples with
//! `x[feature] <= threshold` go left. Thresholds are midpoints between
//! consecutive distinct training values.

use crate::error::{HousingError, Result};
use crate::model::{check_fit_inputs, check_predict_input, FittedRegressor, Regressor};
use ndarray::{Array1, Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Number of features examined at each split.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum MaxFeatures {
    /// Every feature.
    #[default]
    All,
    /// `floor(sqrt(n_features))`, at least 1.
    Sqrt,
    /// `floor(log2(n_features))`, at least 1.
    Log2,
    /// `ceil(f * n_features)` for `f` in `(0, 1]`.
    Fraction(f64),
    /// An absolute count in `1..=n_features`.
    Count(usize),
}

impl MaxFeatures {
    /// Resolve to a feature count for a matrix with `n_features` columns.
    pub fn resolve(&self, n_features: usize) -> Result<usize> {
        let n = n_features as f64;
        let k = match *self {
            MaxFeatures::All => n_features,
            MaxFeatures::Sqrt => n.sqrt().floor() as usize,
            MaxFeatures::Log2 => n.log2().floor() as usize,
            MaxFeatures::Fraction(f) if f > 0.0 && f <= 1.0 => (f * n).ceil() as usize,
            MaxFeatures::Fraction(f) => {
                return Err(HousingError::InvalidParameter(format!(
                    "max_features fraction must be in (0, 1], got {}",
                    f
                )))
            }
            MaxFeatures::Count(c) if c >= 1 && c <= n_features => c,
            MaxFeatures::Count(c) => {
                return Err(HousingError::InvalidParameter(format!(
                    "max_features count must be in 1..={}, got {}",
                    n_features, c
                )))
            }
        };
        Ok(k.clamp(1, n_features.max(1)))
    }
}

/// Growth limits of a single tree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TreeConfig {
    /// Maximum depth; `None` grows until leaves are pure or too small.
    pub max_depth: Option<usize>,
    /// Minimum number of samples a node needs to be split.
    pub min_samples_split: usize,
    /// Minimum number of samples in each child.
    pub min_samples_leaf: usize,
    pub max_features: MaxFeatures,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::All,
        }
    }
}

impl TreeConfig {
    pub fn validate(&self) -> Result<()> {
        if self.min_samples_split < 2 {
            return Err(HousingError::InvalidParameter(format!(
                "min_samples_split must be at least 2, got {}",
                self.min_samples_split
            )));
        }
        if self.min_samples_leaf < 1 {
            return Err(HousingError::InvalidParameter(
                "min_samples_leaf must be at least 1".to_string(),
            ));
        }
        if self.max_depth == Some(0) {
            return Err(HousingError::InvalidParameter(
                "max_depth must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// A node of a fitted tree, stored in a flat arena.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Node {
    Leaf {
        value: f64,
        n_samples: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
        /// Reduction of the squared-error sum achieved by this split.
        impurity_decrease: f64,
    },
}

/// Decision tree regressor (unfitted).
#[derive(Clone, Debug, Default)]
pub struct DecisionTreeRegressor {
    config: TreeConfig,
    seed: u64,
}

impl DecisionTreeRegressor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: TreeConfig) -> Self {
        Self { config, seed: 0 }
    }

    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.config.max_depth = max_depth;
        self
    }

    pub fn with_min_samples_split(mut self, n: usize) -> Self {
        self.config.min_samples_split = n;
        self
    }

    pub fn with_min_samples_leaf(mut self, n: usize) -> Self {
        self.config.min_samples_leaf = n;
        self
    }

    pub fn with_max_features(mut self, max_features: MaxFeatures) -> Self {
        self.config.max_features = max_features;
        self
    }

    /// Seed for feature subsampling; irrelevant with `MaxFeatures::All`.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }
}

impl Regressor for DecisionTreeRegressor {
    type Fitted = FittedDecisionTree;

    fn fit(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<Self::Fitted> {
        self.config.validate()?;
        check_fit_inputs(x, y)?;
        let mut rng = StdRng::seed_from_u64(self.seed);
        grow(&self.config, x, y, (0..x.nrows()).collect(), &mut rng)
    }
}

/// Grow a tree on the rows named by `indices` (repeats allowed).
///
/// Inputs must already be validated.
pub(crate) fn grow(
    config: &TreeConfig,
    x: &Array2<f64>,
    y: &Array1<f64>,
    mut indices: Vec<usize>,
    rng: &mut StdRng,
) -> Result<FittedDecisionTree> {
    let n_features = x.ncols();
    let mut builder = Builder {
        config,
        x,
        y,
        max_features: config.max_features.resolve(n_features)?,
        features: (0..n_features).collect(),
        nodes: Vec::new(),
    };
    builder.build(&mut indices, 0, rng);
    Ok(FittedDecisionTree {
        nodes: builder.nodes,
        n_features,
    })
}

struct Builder<'a> {
    config: &'a TreeConfig,
    x: &'a Array2<f64>,
    y: &'a Array1<f64>,
    max_features: usize,
    features: Vec<usize>,
    nodes: Vec<Node>,
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    n_left: usize,
    impurity_decrease: f64,
}

impl Builder<'_> {
    fn build(&mut self, indices: &mut [usize], depth: usize, rng: &mut StdRng) -> usize {
        let n = indices.len();
        let sum: f64 = indices.iter().map(|&i| self.y[i]).sum();
        let first = self.y[indices[0]];
        let pure = indices.iter().all(|&i| self.y[i] == first);

        let can_split = !pure
            && n >= self.config.min_samples_split
            && n >= 2 * self.config.min_samples_leaf
            && self.config.max_depth.map_or(true, |d| depth < d);

        let best = if can_split {
            self.best_split(indices, sum, rng)
        } else {
            None
        };

        let Some(best) = best else {
            self.nodes.push(Node::Leaf {
                value: sum / n as f64,
                n_samples: n,
            });
            return self.nodes.len() - 1;
        };

        self.partition(indices, best.feature, best.threshold);
        let id = self.nodes.len();
        // placeholder, patched once both children exist
        self.nodes.push(Node::Leaf {
            value: 0.0,
            n_samples: n,
        });

        let (left_rows, right_rows) = indices.split_at_mut(best.n_left);
        let left = self.build(left_rows, depth + 1, rng);
        let right = self.build(right_rows, depth + 1, rng);
        self.nodes[id] = Node::Split {
            feature: best.feature,
            threshold: best.threshold,
            left,
            right,
            impurity_decrease: best.impurity_decrease,
        };
        id
    }

    fn best_split(&mut self, indices: &[usize], sum: f64, rng: &mut StdRng) -> Option<BestSplit> {
        let n = indices.len();
        let min_leaf = self.config.min_samples_leaf;
        let parent_score = sum * sum / n as f64;

        let candidates: Vec<usize> = if self.max_features < self.features.len() {
            let (chosen, _) = self.features.partial_shuffle(rng, self.max_features);
            chosen.to_vec()
        } else {
            self.features.clone()
        };

        let mut best: Option<BestSplit> = None;
        let mut best_score = f64::NEG_INFINITY;
        let mut pairs: Vec<(f64, f64)> = Vec::with_capacity(n);

        for &feature in &candidates {
            pairs.clear();
            pairs.extend(indices.iter().map(|&i| (self.x[[i, feature]], self.y[i])));
            pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

            if pairs[0].0 == pairs[n - 1].0 {
                continue;
            }

            let mut left_sum = 0.0;
            for n_left in 1..n {
                left_sum += pairs[n_left - 1].1;
                if n_left < min_leaf || n - n_left < min_leaf {
                    continue;
                }
                let (lo, hi) = (pairs[n_left - 1].0, pairs[n_left].0);
                if lo == hi {
                    continue;
                }
                let right_sum = sum - left_sum;
                let score = left_sum * left_sum / n_left as f64
                    + right_sum * right_sum / (n - n_left) as f64;
                if score > best_score {
                    let mid = lo + (hi - lo) / 2.0;
                    best_score = score;
                    best = Some(BestSplit {
                        feature,
                        threshold: if mid < hi { mid } else { lo },
                        n_left,
                        impurity_decrease: (score - parent_score).max(0.0),
                    });
                }
            }
        }
        best
    }

    /// Reorder `indices` so rows going left come first.
    fn partition(&self, indices: &mut [usize], feature: usize, threshold: f64) {
        let (left, right): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| self.x[[i, feature]] <= threshold);
        indices[..left.len()].copy_from_slice(&left);
        indices[left.len()..].copy_from_slice(&right);
    }
}

/// Fitted decision tree ready for inference.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FittedDecisionTree {
    nodes: Vec<Node>,
    n_features: usize,
}

impl FittedDecisionTree {
    /// Predict one row. The row must have `n_features_in()` values.
    pub fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        let mut id = 0;
        loop {
            match &self.nodes[id] {
                Node::Leaf { value, .. } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    id = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
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

    /// Length of the longest root-to-leaf path, in edges.
    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], id: usize) -> usize {
            match &nodes[id] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        walk(&self.nodes, 0)
    }

    /// Impurity-decrease importances, normalized to sum to 1 (all zeros for a stump).
    pub fn feature_importances(&self) -> Array1<f64> {
        let mut importances = Array1::<f64>::zeros(self.n_features);
        for node in &self.nodes {
            if let Node::Split {
                feature,
                impurity_decrease,
                ..
            } = node
            {
                importances[*feature] += impurity_decrease;
            }
        }
        let total = importances.sum();
        if total > 0.0 {
            importances /= total;
        }
        importances
    }

    /// Check arena links after decoding untrusted bytes.
    ///
    /// Children must point forward, which also rules out cycles.
    pub(crate) fn check_structure(&self) -> Result<()> {
        if self.nodes.is_empty() {
            return Err(HousingError::CorruptArtifact("tree has no nodes".to_string()));
        }
        for (id, node) in self.nodes.iter().enumerate() {
            let ok = match node {
                Node::Leaf { value, .. } => value.is_finite(),
                Node::Split {
                    feature,
                    left,
                    right,
                    threshold,
                    ..
                } => {
                    *left > id
                        && *right > id
                        && *left < self.nodes.len()
                        && *right < self.nodes.len()
                        && *feature < self.n_features
                        && threshold.is_finite()
                }
            };
            if !ok {
                return Err(HousingError::CorruptArtifact(format!(
                    "tree node {} is malformed",
                    id
                )));
            }
        }
        Ok(())
    }
}

impl FittedRegressor for FittedDecisionTree {
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        check_predict_input(self.n_features, x)?;
        Ok(x.outer_iter().map(|row| self.predict_row(row)).collect())
    }

    fn n_features_in(&self) -> usize {
        self.n_features
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_tree_fits_step_function() {
        let x = array![[1.0], [2.0], [3.0], [10.0], [11.0], [12.0]];
        let y = array![5.0, 5.0, 5.0, 20.0, 20.0, 20.0];
        let tree = DecisionTreeRegressor::new().fit(&x, &y).unwrap();

        assert_eq!(tree.n_leaves(), 2);
        assert_eq!(tree.depth(), 1);
        match &tree.nodes()[0] {
            Node::Split {
                feature, threshold, ..
            } => {
                assert_eq!(*feature, 0);
                assert_eq!(*threshold, 6.5);
            }
            other => panic!("expected a split at the root, got {:?}", other),
        }
        let pred = tree.predict(&array![[0.0], [6.4], [6.6], [100.0]]).unwrap();
        assert_eq!(pred.to_vec(), vec![5.0, 5.0, 20.0, 20.0]);
    }

    #[test]
    fn test_tree_memorizes_training_data() {
        let x = array![[1.0, 0.0], [2.0, 1.0], [3.0, 0.0], [4.0, 1.0], [5.0, 0.0]];
        let y = array![1.0, 4.0, 9.0, 16.0, 25.0];
        let tree = DecisionTreeRegressor::new().fit(&x, &y).unwrap();
        assert_eq!(tree.predict(&x).unwrap(), y);
    }

    #[test]
    fn test_tree_max_depth() {
        let x = array![[1.0], [2.0], [3.0], [4.0], [5.0], [6.0], [7.0], [8.0]];
        let y = array![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
        let tree = DecisionTreeRegressor::new()
            .with_max_depth(Some(2))
            .fit(&x, &y)
            .unwrap();
        assert_eq!(tree.depth(), 2);
        assert_eq!(tree.n_leaves(), 4);
    }

    #[test]
    fn test_tree_min_samples_leaf() {
        let x = array![[1.0], [2.0], [3.0], [4.0]];
        let y = array![0.0, 0.0, 0.0, 100.0];
        let tree = DecisionTreeRegressor::new()
            .with_min_samples_leaf(2)
            .fit(&x, &y)
            .unwrap();
        for node in tree.nodes() {
            if let Node::Leaf { n_samples, .. } = node {
                assert!(*n_samples >= 2);
            }
        }
    }

    #[test]
    fn test_tree_constant_target_is_single_leaf() {
        let x = array![[1.0], [2.0], [3.0]];
        let y = array![4.0, 4.0, 4.0];
        let tree = DecisionTreeRegressor::new().fit(&x, &y).unwrap();
        assert_eq!(tree.n_leaves(), 1);
        assert_eq!(tree.feature_importances().to_vec(), vec![0.0]);
    }

    #[test]
    fn test_tree_feature_importances_pick_signal() {
        // column 1 carries the signal, column 0 is constant
        let x = array![[7.0, 0.0], [7.0, 1.0], [7.0, 0.0], [7.0, 1.0]];
        let y = array![1.0, 3.0, 1.0, 3.0];
        let tree = DecisionTreeRegressor::new().fit(&x, &y).unwrap();
        let imp = tree.feature_importances();
        assert_eq!(imp.to_vec(), vec![0.0, 1.0]);
    }

    #[test]
    fn test_tree_shape_errors() {
        let x = array![[1.0], [2.0]];
        assert!(matches!(
            DecisionTreeRegressor::new().fit(&x, &array![1.0]),
            Err(HousingError::ShapeMismatch { .. })
        ));
        assert!(matches!(
            DecisionTreeRegressor::new().fit(&Array2::zeros((0, 1)), &Array1::zeros(0)),
            Err(HousingError::EmptyData(_))
        ));

        let tree = DecisionTreeRegressor::new()
            .fit(&x, &array![1.0, 2.0])
            .unwrap();
        assert!(matches!(
            tree.predict(&array![[1.0, 2.0]]),
            Err(HousingError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_max_features_resolve() {
        assert_eq!(MaxFeatures::All.resolve(13).unwrap(), 13);
        assert_eq!(MaxFeatures::Sqrt.resolve(13).unwrap(), 3);
        assert_eq!(MaxFeatures::Log2.resolve(13).unwrap(), 3);
        assert_eq!(MaxFeatures::Fraction(0.5).resolve(13).unwrap(), 7);
        assert_eq!(MaxFeatures::Count(4).resolve(13).unwrap(), 4);
        assert_eq!(MaxFeatures::Log2.resolve(1).unwrap(), 1);
        assert!(MaxFeatures::Count(14).resolve(13).is_err());
        assert!(MaxFeatures::Fraction(0.0).resolve(13).is_err());
    }

    #[test]
    fn test_invalid_config() {
        let x = array![[1.0], [2.0]];
        let y = array![1.0, 2.0];
        assert!(matches!(
            DecisionTreeRegressor::new()
                .with_min_samples_split(1)
                .fit(&x, &y),
            Err(HousingError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_check_structure_rejects_backward_link() {
        let tree = FittedDecisionTree {
            nodes: vec![Node::Split {
                feature: 0,
                threshold: 0.5,
                left: 0,
                right: 0,
                impurity_decrease: 1.0,
            }],
            n_features: 1,
        };
        assert!(matches!(
            tree.check_structure(),
            Err(HousingError::CorruptArtifact(_))
        ));
    }

    #[test]
    fn test_check_structure_rejects_non_finite_values() {
        let leaf = |value| Node::Leaf {
            value,
            n_samples: 1,
        };
        let bad_leaf = FittedDecisionTree {
            nodes: vec![leaf(f64::NAN)],
            n_features: 1,
        };
        let bad_threshold = FittedDecisionTree {
            nodes: vec![
                Node::Split {
                    feature: 0,
                    threshold: f64::INFINITY,
                    left: 1,
                    right: 2,
                    impurity_decrease: 1.0,
                },
                leaf(1.0),
                leaf(2.0),
            ],
            n_features: 1,
        };
        for tree in [bad_leaf, bad_threshold] {
            assert!(matches!(
                tree.check_structure(),
                Err(HousingError::CorruptArtifact(_))
            ));
        }
    }
}
