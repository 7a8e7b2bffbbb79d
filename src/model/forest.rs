//! Random-forest regressor.
//!
//! An ensemble of CART trees, each grown on a bootstrap sample of the rows
//! with a random subset of features considered at every split. The forest
//! predicts the mean of its trees' predictions.
//!
//! Fitting is deterministic for a fixed seed: one seed per tree is drawn up
//! front from a `StdRng`, and trees are then grown in parallel with `rayon`.
//!
//! # Example
//! ```rust
//! use housing_pipeline::model::{FittedRegressor, RandomForestRegressor, Regressor};
//! use ndarray::array;
//!
//! let x = array![[1.0], [2.0], [3.0], [10.0], [11.0], [12.0]];
//! let y = array![5.0, 5.0, 5.0, 20.0, 20.0, 20.0];
//!
//! let forest = RandomForestRegressor::new()
//!     .with_n_estimators(10)
//!     .with_seed(7)
//!     .fit(&x, &y)
//!     .unwrap();
//! let pred = forest.predict(&array![[2.5], [11.5]]).unwrap();
//! assert!(pred[0] < pred[1]);
//! ```

use crate::error::{HousingError, Result};
use crate::model::tree::{grow, FittedDecisionTree, MaxFeatures, TreeConfig};
use crate::model::{check_fit_inputs, check_predict_input, FittedRegressor, Regressor};
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info};

/// Hyperparameters of a random forest.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    /// Number of trees.
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub max_features: MaxFeatures,
    /// Grow each tree on a bootstrap sample instead of the full training set.
    pub bootstrap: bool,
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::All,
            bootstrap: true,
            seed: 42,
        }
    }
}

impl ForestConfig {
    /// Per-tree growth limits.
    pub fn tree_config(&self) -> TreeConfig {
        TreeConfig {
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
            min_samples_leaf: self.min_samples_leaf,
            max_features: self.max_features,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.n_estimators == 0 {
            return Err(HousingError::InvalidParameter(
                "n_estimators must be at least 1".to_string(),
            ));
        }
        self.tree_config().validate()
    }
}

/// Random forest regressor (unfitted).
#[derive(Clone, Debug, Default)]
pub struct RandomForestRegressor {
    config: ForestConfig,
}

impl RandomForestRegressor {
    /// Create a forest with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: ForestConfig) -> Self {
        Self { config }
    }

    pub fn with_n_estimators(mut self, n_estimators: usize) -> Self {
        self.config.n_estimators = n_estimators;
        self
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

    pub fn with_bootstrap(mut self, bootstrap: bool) -> Self {
        self.config.bootstrap = bootstrap;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    pub fn config(&self) -> &ForestConfig {
        &self.config
    }
}

impl Regressor for RandomForestRegressor {
    type Fitted = FittedRandomForest;

    fn fit(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<Self::Fitted> {
        self.config.validate()?;
        check_fit_inputs(x, y)?;

        let start = Instant::now();
        let n_rows = x.nrows();
        let tree_config = self.config.tree_config();
        let bootstrap = self.config.bootstrap;

        let mut seeder = StdRng::seed_from_u64(self.config.seed);
        let seeds: Vec<u64> = (0..self.config.n_estimators)
            .map(|_| seeder.gen())
            .collect();

        let trees = seeds
            .par_iter()
            .enumerate()
            .map(|(i, &seed)| {
                let mut rng = StdRng::seed_from_u64(seed);
                let indices: Vec<usize> = if bootstrap {
                    (0..n_rows).map(|_| rng.gen_range(0..n_rows)).collect()
                } else {
                    (0..n_rows).collect()
                };
                let tree = grow(&tree_config, x, y, indices, &mut rng)?;
                debug!(tree = i, leaves = tree.n_leaves(), depth = tree.depth(), "grew tree");
                Ok(tree)
            })
            .collect::<Result<Vec<_>>>()?;

        info!(
            trees = trees.len(),
            rows = n_rows,
            features = x.ncols(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "fitted random forest"
        );

        Ok(FittedRandomForest {
            trees,
            n_features: x.ncols(),
        })
    }
}

/// Fitted random forest ready for inference.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FittedRandomForest {
    trees: Vec<FittedDecisionTree>,
    n_features: usize,
}

impl FittedRandomForest {
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn trees(&self) -> &[FittedDecisionTree] {
        &self.trees
    }

    /// Mean of the per-tree normalized importances, renormalized to sum to 1.
    pub fn feature_importances(&self) -> Array1<f64> {
        let mut total = Array1::<f64>::zeros(self.n_features);
        for tree in &self.trees {
            total += &tree.feature_importances();
        }
        let sum = total.sum();
        if sum > 0.0 {
            total /= sum;
        }
        total
    }

    /// Check a decoded forest before use.
    pub(crate) fn check_structure(&self) -> Result<()> {
        if self.trees.is_empty() {
            return Err(HousingError::CorruptArtifact("forest has no trees".to_string()));
        }
        for tree in &self.trees {
            if tree.n_features_in() != self.n_features {
                return Err(HousingError::CorruptArtifact(format!(
                    "tree expects {} features, forest {}",
                    tree.n_features_in(),
                    self.n_features
                )));
            }
            tree.check_structure()?;
        }
        Ok(())
    }
}

/// A lone tree as a one-member ensemble.
impl From<FittedDecisionTree> for FittedRandomForest {
    fn from(tree: FittedDecisionTree) -> Self {
        Self {
            n_features: tree.n_features_in(),
            trees: vec![tree],
        }
    }
}

impl FittedRegressor for FittedRandomForest {
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        check_predict_input(self.n_features, x)?;
        let n_trees = self.trees.len() as f64;
        Ok(x.outer_iter()
            .map(|row| self.trees.iter().map(|t| t.predict_row(row)).sum::<f64>() / n_trees)
            .collect())
    }

    fn n_features_in(&self) -> usize {
        self.n_features
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::synthetic::boston_like;
    use ndarray::array;

    fn housing_xy(n: usize) -> (Array2<f64>, Array1<f64>) {
        let (features, labels) = boston_like(n, 3)
            .unwrap()
            .features_and_labels("MEDV")
            .unwrap();
        (features.into_parts().1, labels)
    }

    #[test]
    fn test_forest_is_deterministic() {
        let (x, y) = housing_xy(120);
        let forest = RandomForestRegressor::new().with_n_estimators(8).with_seed(5);
        let a = forest.fit(&x, &y).unwrap();
        let b = forest.fit(&x, &y).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.predict(&x).unwrap(), b.predict(&x).unwrap());
    }

    #[test]
    fn test_forest_seed_matters_with_bootstrap() {
        let (x, y) = housing_xy(80);
        let a = RandomForestRegressor::new()
            .with_n_estimators(4)
            .with_seed(1)
            .fit(&x, &y)
            .unwrap();
        let b = RandomForestRegressor::new()
            .with_n_estimators(4)
            .with_seed(2)
            .fit(&x, &y)
            .unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_forest_without_bootstrap_matches_single_tree() {
        let (x, y) = housing_xy(60);
        let forest = RandomForestRegressor::new()
            .with_n_estimators(3)
            .with_bootstrap(false)
            .fit(&x, &y)
            .unwrap();
        // identical trees when every tree sees all rows and all features
        assert_eq!(forest.trees()[0], forest.trees()[1]);
        assert_eq!(forest.predict(&x).unwrap(), forest.trees()[0].predict(&x).unwrap());
    }

    #[test]
    fn test_forest_fits_training_data_reasonably() {
        let (x, y) = housing_xy(200);
        let forest = RandomForestRegressor::new()
            .with_n_estimators(20)
            .fit(&x, &y)
            .unwrap();
        let pred = forest.predict(&x).unwrap();
        let mse = (&pred - &y).mapv(|d| d * d).mean().unwrap();
        assert!(mse < 5.0, "training mse too high: {}", mse);
    }

    #[test]
    fn test_forest_predictions_within_label_range() {
        let (x, y) = housing_xy(100);
        let forest = RandomForestRegressor::new()
            .with_n_estimators(10)
            .with_max_features(MaxFeatures::Sqrt)
            .fit(&x, &y)
            .unwrap();
        let lo = y.iter().cloned().fold(f64::INFINITY, f64::min);
        let hi = y.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        for &p in forest.predict(&x).unwrap().iter() {
            assert!(p >= lo && p <= hi);
        }
    }

    #[test]
    fn test_forest_feature_importances() {
        let (x, y) = housing_xy(150);
        let forest = RandomForestRegressor::new()
            .with_n_estimators(10)
            .fit(&x, &y)
            .unwrap();
        let imp = forest.feature_importances();
        assert_eq!(imp.len(), 13);
        assert!((imp.sum() - 1.0).abs() < 1e-9);
        assert!(imp.iter().all(|&v| v >= 0.0));
        // RM (index 5) drives the synthetic price
        let top = imp
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap();
        assert!(top == 5 || top == 12, "unexpected top feature {}", top);
    }

    #[test]
    fn test_single_tree_ensemble_matches_tree() {
        let (x, y) = housing_xy(80);
        let tree = crate::model::DecisionTreeRegressor::new()
            .with_max_depth(Some(4))
            .fit(&x, &y)
            .unwrap();
        let forest = FittedRandomForest::from(tree.clone());

        assert_eq!(forest.n_trees(), 1);
        assert_eq!(forest.n_features_in(), x.ncols());
        assert_eq!(forest.predict(&x).unwrap(), tree.predict(&x).unwrap());
        assert!(forest.check_structure().is_ok());
    }

    #[test]
    fn test_forest_shape_errors() {
        let x = array![[1.0, 2.0], [3.0, 4.0]];
        let forest = RandomForestRegressor::new().with_n_estimators(2);
        assert!(matches!(
            forest.fit(&x, &array![1.0, 2.0, 3.0]),
            Err(HousingError::ShapeMismatch { .. })
        ));
        assert!(matches!(
            forest.fit(&Array2::zeros((0, 2)), &Array1::zeros(0)),
            Err(HousingError::EmptyData(_))
        ));
        assert!(matches!(
            forest.fit(&Array2::zeros((0, 2)), &array![1.0, 2.0]),
            Err(HousingError::ShapeMismatch { .. })
        ));

        let fitted = forest.fit(&x, &array![1.0, 2.0]).unwrap();
        assert!(matches!(
            fitted.predict(&array![[1.0, 2.0, 3.0]]),
            Err(HousingError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_forest_invalid_config() {
        let x = array![[1.0], [2.0]];
        let y = array![1.0, 2.0];
        assert!(matches!(
            RandomForestRegressor::new().with_n_estimators(0).fit(&x, &y),
            Err(HousingError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_forest_config_defaults() {
        let config = ForestConfig::default();
        assert_eq!(config.n_estimators, 100);
        assert_eq!(config.max_depth, None);
        assert_eq!(config.max_features, MaxFeatures::All);
        assert!(config.bootstrap);
    }
}
