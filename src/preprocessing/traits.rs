//! Core traits for preprocessing transformers.
//!
//! This module defines the two central traits:
//! - [`Transformer`]: Used during fitting; has hyperparameters and can learn from data.
//! - [`FittedTransformer`]: After fitting; ready for inference and serialization.

use crate::error::{HousingError, Result};
use crate::serialization::SerializableParams;
use ndarray::Array2;

/// Trait for unfitted transformers with hyperparameters.
///
/// A transformer learns parameters from training data and can then transform
/// new data using those learned parameters. This trait represents the
/// configurable, unfitted state; a transform is only reachable through the
/// fitted type returned by [`Transformer::fit`].
///
/// # Example
/// ```rust
/// use housing_pipeline::preprocessing::{FittedTransformer, StandardScaler, Transformer};
/// use ndarray::array;
///
/// let data = array![[1.0, 10.0], [3.0, 30.0]];
/// let fitted = StandardScaler::new().fit(&data).unwrap();
/// let scaled = fitted.transform(&data).unwrap();
/// assert_eq!(scaled[[0, 0]], -1.0);
/// ```
pub trait Transformer: Clone {
    /// Serializable representation of learned parameters.
    type Params: SerializableParams;
    /// The fitted transformer type ready for inference.
    type Fitted: FittedTransformer<Params = Self::Params>;

    /// Fit the transformer to the training data.
    ///
    /// # Errors
    /// - `EmptyData` if the data has no rows
    /// - stage-specific errors (e.g. `EmptyColumn` for the imputer)
    fn fit(&self, data: &Array2<f64>) -> Result<Self::Fitted>;

    /// Fit the transformer and transform the data in one step.
    fn fit_transform(&self, data: &Array2<f64>) -> Result<Array2<f64>> {
        let fitted = self.fit(data)?;
        fitted.transform(data)
    }
}

/// Trait for fitted transformers ready for inference.
///
/// Parameters are frozen: every method takes `&self`, so a fitted transformer
/// can be shared across threads and reused for any number of inputs.
///
/// # Guarantees
/// - `extract_params()` + `from_params()` is a round-trip.
/// - Fitted stages are persisted only as part of a whole-pipeline artifact
///   (see [`crate::store`]).
pub trait FittedTransformer: Clone {
    /// Serializable representation of learned parameters.
    type Params: SerializableParams;

    /// Transform data using learned parameters.
    ///
    /// # Errors
    /// `SchemaMismatch` if the column count differs from the one seen during fit.
    fn transform(&self, data: &Array2<f64>) -> Result<Array2<f64>>;

    /// Reverse the transformation (if supported).
    ///
    /// # Errors
    /// `InvalidParameter` if the stage is not invertible.
    fn inverse_transform(&self, data: &Array2<f64>) -> Result<Array2<f64>>;

    /// Extract learned parameters as a serializable representation.
    fn extract_params(&self) -> Self::Params;

    /// Reconstruct a fitted transformer from parameters.
    fn from_params(params: Self::Params) -> Result<Self>
    where
        Self: Sized;

    /// Returns the number of features seen during fit.
    fn n_features_in(&self) -> usize;
}

/// Reject input whose column count differs from the fitted width.
pub(crate) fn check_n_features(expected: usize, data: &Array2<f64>) -> Result<()> {
    if data.ncols() == expected {
        Ok(())
    } else {
        Err(HousingError::schema(
            format!("{} features", expected),
            format!("{} features", data.ncols()),
        ))
    }
}
