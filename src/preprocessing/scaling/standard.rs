//! Standard Scaler (Z-score normalization).
//!
//! Transforms features by removing the mean and scaling to unit variance.
//!
//! The standard score of a sample `x` is calculated as:
//! ```text
//! z = (x - u) / s
//! ```
//! where `u` is the mean of the training samples, and `s` is the population
//! standard deviation (ddof = 0).
//!
//! A column whose training values are all equal has `s = 0`. Such a column is
//! recorded as degenerate and always transforms to `0.0`.
//!
//! # Example
//! ```rust
//! use housing_pipeline::preprocessing::{FittedTransformer, StandardScaler, Transformer};
//! use ndarray::array;
//!
//! let data = array![[2.0], [4.0], [4.0], [4.0], [5.0], [5.0], [7.0], [9.0]];
//! let fitted = StandardScaler::new().fit(&data).unwrap();
//! assert!((fitted.mean()[0] - 5.0).abs() < 1e-12);
//! assert!((fitted.std()[0] - 2.0).abs() < 1e-12);
//! ```

use crate::error::{HousingError, Result};
use crate::preprocessing::traits::{check_n_features, FittedTransformer, Transformer};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Serializable parameters for a fitted StandardScaler.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StandardScalerParams {
    /// Mean of each feature.
    pub mean: Vec<f64>,
    /// Population standard deviation of each feature (0 for degenerate columns).
    pub std: Vec<f64>,
}

/// StandardScaler transformer (unfitted). Always centers and scales.
#[derive(Clone, Debug, Default)]
pub struct StandardScaler;

impl StandardScaler {
    pub fn new() -> Self {
        Self
    }
}

impl Transformer for StandardScaler {
    type Params = StandardScalerParams;
    type Fitted = FittedStandardScaler;

    fn fit(&self, data: &Array2<f64>) -> Result<Self::Fitted> {
        if data.nrows() == 0 {
            return Err(HousingError::EmptyData(
                "Cannot fit StandardScaler on empty data".to_string(),
            ));
        }
        if data.iter().any(|v| !v.is_finite()) {
            return Err(HousingError::InvalidInput(
                "StandardScaler requires finite values; impute missing cells first".to_string(),
            ));
        }

        let mean = data
            .mean_axis(Axis(0))
            .ok_or_else(|| HousingError::EmptyData("no rows".to_string()))?;
        let std = data.std_axis(Axis(0), 0.0);

        let fitted = FittedStandardScaler { mean, std };
        let degenerate = fitted.degenerate_columns();
        if !degenerate.is_empty() {
            warn!(
                columns = ?degenerate,
                "zero-variance columns will be scaled to 0"
            );
        }
        Ok(fitted)
    }
}

/// Fitted StandardScaler ready for inference.
#[derive(Clone, Debug)]
pub struct FittedStandardScaler {
    mean: Array1<f64>,
    std: Array1<f64>,
}

impl FittedStandardScaler {
    /// Get the mean values for each feature.
    pub fn mean(&self) -> &Array1<f64> {
        &self.mean
    }

    /// Get the standard deviation values for each feature.
    pub fn std(&self) -> &Array1<f64> {
        &self.std
    }

    /// Indices of columns with zero variance at fit time.
    pub fn degenerate_columns(&self) -> Vec<usize> {
        self.std
            .iter()
            .enumerate()
            .filter(|(_, &s)| s == 0.0)
            .map(|(i, _)| i)
            .collect()
    }
}

impl FittedTransformer for FittedStandardScaler {
    type Params = StandardScalerParams;

    fn transform(&self, data: &Array2<f64>) -> Result<Array2<f64>> {
        check_n_features(self.mean.len(), data)?;

        let mut result = data.clone();
        for ((mut column, &mean), &std) in result
            .axis_iter_mut(Axis(1))
            .zip(self.mean.iter())
            .zip(self.std.iter())
        {
            if std == 0.0 {
                column.fill(0.0);
            } else {
                column.mapv_inplace(|v| (v - mean) / std);
            }
        }
        Ok(result)
    }

    /// Map standard scores back to the original units.
    ///
    /// Degenerate columns map back to their training mean.
    fn inverse_transform(&self, data: &Array2<f64>) -> Result<Array2<f64>> {
        check_n_features(self.mean.len(), data)?;

        let mut result = data.clone();
        for ((mut column, &mean), &std) in result
            .axis_iter_mut(Axis(1))
            .zip(self.mean.iter())
            .zip(self.std.iter())
        {
            if std == 0.0 {
                column.fill(mean);
            } else {
                column.mapv_inplace(|z| z * std + mean);
            }
        }
        Ok(result)
    }

    fn extract_params(&self) -> Self::Params {
        StandardScalerParams {
            mean: self.mean.to_vec(),
            std: self.std.to_vec(),
        }
    }

    fn from_params(params: Self::Params) -> Result<Self> {
        if params.mean.len() != params.std.len() {
            return Err(HousingError::CorruptArtifact(format!(
                "scaler has {} means but {} deviations",
                params.mean.len(),
                params.std.len()
            )));
        }
        if params.mean.iter().any(|m| !m.is_finite()) {
            return Err(HousingError::CorruptArtifact(
                "scaler means must be finite".to_string(),
            ));
        }
        if params.std.iter().any(|&s| s < 0.0 || !s.is_finite()) {
            return Err(HousingError::CorruptArtifact(
                "scaler deviations must be finite and non-negative".to_string(),
            ));
        }
        Ok(Self {
            mean: Array1::from(params.mean),
            std: Array1::from(params.std),
        })
    }

    fn n_features_in(&self) -> usize {
        self.mean.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn create_test_data() -> Array2<f64> {
        array![
            [2.0, 7.0],
            [4.0, 7.0],
            [4.0, 7.0],
            [4.0, 7.0],
            [5.0, 7.0],
            [5.0, 7.0],
            [7.0, 7.0],
            [9.0, 7.0]
        ]
    }

    #[test]
    fn test_standard_scaler_fit() {
        let fitted = StandardScaler::new().fit(&create_test_data()).unwrap();
        assert!((fitted.mean()[0] - 5.0).abs() < 1e-12);
        assert!((fitted.std()[0] - 2.0).abs() < 1e-12);
        assert_eq!(fitted.degenerate_columns(), vec![1]);
    }

    #[test]
    fn test_standard_scaler_transform() {
        let data = create_test_data();
        let transformed = StandardScaler::new().fit_transform(&data).unwrap();

        let expected = [-1.5, -0.5, -0.5, -0.5, 0.0, 0.0, 1.0, 2.0];
        for (got, want) in transformed.column(0).iter().zip(expected) {
            assert!((got - want).abs() < 1e-12);
        }
        // constant column scales to zero, never NaN
        assert!(transformed.column(1).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_standard_scaler_degenerate_on_new_data() {
        let fitted = StandardScaler::new().fit(&create_test_data()).unwrap();
        let out = fitted.transform(&array![[5.0, 100.0]]).unwrap();
        assert_eq!(out[[0, 1]], 0.0);
    }

    #[test]
    fn test_standard_scaler_inverse_transform() {
        let data = array![[1.0, 10.0], [3.0, 30.0], [5.0, 20.0]];
        let fitted = StandardScaler::new().fit(&data).unwrap();
        let scaled = fitted.transform(&data).unwrap();
        let restored = fitted.inverse_transform(&scaled).unwrap();
        for (a, b) in data.iter().zip(restored.iter()) {
            assert!((a - b).abs() < 1e-10);
        }
    }

    #[test]
    fn test_standard_scaler_two_rows() {
        let data = array![[1.0], [3.0]];
        let fitted = StandardScaler::new().fit(&data).unwrap();
        let out = fitted.transform(&data).unwrap();
        assert_eq!(out.column(0).to_vec(), vec![-1.0, 1.0]);
    }

    #[test]
    fn test_standard_scaler_rejects_nan() {
        let data = array![[1.0], [f64::NAN]];
        assert!(matches!(
            StandardScaler::new().fit(&data),
            Err(HousingError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_standard_scaler_empty_data() {
        let data = Array2::<f64>::zeros((0, 3));
        assert!(matches!(
            StandardScaler::new().fit(&data),
            Err(HousingError::EmptyData(_))
        ));
    }

    #[test]
    fn test_standard_scaler_feature_mismatch() {
        let fitted = StandardScaler::new().fit(&create_test_data()).unwrap();
        assert!(matches!(
            fitted.transform(&array![[1.0, 2.0, 3.0]]),
            Err(HousingError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn test_standard_scaler_params_round_trip() {
        let data = create_test_data();
        let fitted = StandardScaler::new().fit(&data).unwrap();
        let restored = FittedStandardScaler::from_params(fitted.extract_params()).unwrap();
        assert_eq!(
            fitted.transform(&data).unwrap(),
            restored.transform(&data).unwrap()
        );
    }

    #[test]
    fn test_standard_scaler_from_params_rejects_inconsistent() {
        let params = StandardScalerParams {
            mean: vec![0.0, 1.0],
            std: vec![1.0],
        };
        assert!(matches!(
            FittedStandardScaler::from_params(params),
            Err(HousingError::CorruptArtifact(_))
        ));
    }

    #[test]
    fn test_standard_scaler_from_params_rejects_non_finite_mean() {
        for bad in [f64::NAN, f64::INFINITY] {
            let params = StandardScalerParams {
                mean: vec![bad, 1.0],
                std: vec![1.0, 1.0],
            };
            assert!(matches!(
                FittedStandardScaler::from_params(params),
                Err(HousingError::CorruptArtifact(_))
            ));
        }
    }
}
