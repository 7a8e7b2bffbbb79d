//! Regression models.
//!
//! Models follow the same unfitted/fitted split as preprocessing stages: a
//! [`Regressor`] holds hyperparameters and `fit` returns a separate
//! [`FittedRegressor`] that contains only what inference needs.

pub mod forest;
pub mod tree;

pub use forest::{FittedRandomForest, ForestConfig, RandomForestRegressor};
pub use tree::{DecisionTreeRegressor, FittedDecisionTree, MaxFeatures, Node, TreeConfig};

use crate::error::{HousingError, Result};
use ndarray::{Array1, Array2};

/// An unfitted regression model.
pub trait Regressor: Clone + Send + Sync {
    /// The fitted model type ready for inference.
    type Fitted: FittedRegressor;

    /// Fit on a feature matrix and one label per row.
    ///
    /// # Errors
    /// - `ShapeMismatch` if `x` and `y` disagree on the row count (checked first)
    /// - `EmptyData` if `x` has no rows or no columns
    /// - `InvalidInput` if any value is not finite
    fn fit(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<Self::Fitted>;
}

/// A fitted regression model. Prediction is pure and deterministic.
pub trait FittedRegressor: Send + Sync {
    /// One prediction per row of `x`.
    ///
    /// # Errors
    /// `ShapeMismatch` if the column count differs from the one seen during fit.
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>>;

    /// Returns the number of features seen during fit.
    fn n_features_in(&self) -> usize;
}

pub(crate) fn check_fit_inputs(x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
    if x.nrows() != y.len() {
        return Err(HousingError::shape(
            format!("{} labels", x.nrows()),
            format!("{} labels", y.len()),
        ));
    }
    if x.nrows() == 0 || x.ncols() == 0 {
        return Err(HousingError::EmptyData(format!(
            "cannot fit a regressor on a {}x{} matrix",
            x.nrows(),
            x.ncols()
        )));
    }
    if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
        return Err(HousingError::InvalidInput(
            "regressor inputs must be finite".to_string(),
        ));
    }
    Ok(())
}

pub(crate) fn check_predict_input(n_features: usize, x: &Array2<f64>) -> Result<()> {
    if x.ncols() != n_features {
        return Err(HousingError::shape(
            format!("{} features", n_features),
            format!("{} features", x.ncols()),
        ));
    }
    if x.iter().any(|v| !v.is_finite()) {
        return Err(HousingError::InvalidInput(
            "prediction inputs must be finite".to_string(),
        ));
    }
    Ok(())
}
