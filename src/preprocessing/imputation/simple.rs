//! Simple Imputer.
//!
//! Imputation transformer for completing missing values.
//! Supports median, mean, most_frequent, and constant strategies.
//!
//! Note: This implementation treats NaN as missing values.
//!
//! # Example
//! ```rust
//! use housing_pipeline::preprocessing::{FittedTransformer, ImputeStrategy, SimpleImputer, Transformer};
//! use ndarray::array;
//!
//! let data = array![[1.0], [f64::NAN], [5.0]];
//! let fitted = SimpleImputer::new(ImputeStrategy::Median).fit(&data).unwrap();
//! let imputed = fitted.transform(&data).unwrap();
//! assert_eq!(imputed[[1, 0]], 3.0);
//! ```

use crate::error::{HousingError, Result};
use crate::preprocessing::traits::{check_n_features, FittedTransformer, Transformer};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Strategy for imputing missing values.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum ImputeStrategy {
    /// Replace missing values with the median of each column.
    #[default]
    Median,
    /// Replace missing values with the mean of each column.
    Mean,
    /// Replace missing values with the most frequent value of each column.
    /// Ties go to the smallest value.
    MostFrequent,
    /// Replace missing values with a constant value.
    Constant(f64),
}

/// Serializable parameters for a fitted SimpleImputer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimpleImputerParams {
    /// Strategy used for imputation.
    pub strategy: ImputeStrategy,
    /// Statistics (fill values) for each feature.
    pub statistics: Vec<f64>,
}

/// SimpleImputer transformer (unfitted).
#[derive(Clone, Debug, Default)]
pub struct SimpleImputer {
    strategy: ImputeStrategy,
}

impl SimpleImputer {
    /// Create a new SimpleImputer with the specified strategy.
    pub fn new(strategy: ImputeStrategy) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> ImputeStrategy {
        self.strategy
    }
}

fn median(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    }
}

/// Most frequent value of a sorted slice; the smallest value wins ties.
fn mode(sorted: &[f64]) -> f64 {
    let mut best = sorted[0];
    let mut best_count = 0;
    let mut start = 0;
    while start < sorted.len() {
        let value = sorted[start];
        let end = start + sorted[start..].iter().take_while(|&&v| v == value).count();
        if end - start > best_count {
            best = value;
            best_count = end - start;
        }
        start = end;
    }
    best
}

/// Fill statistic of one column, ignoring NaN. `None` if nothing is observed.
fn column_statistic(column: impl Iterator<Item = f64>, strategy: ImputeStrategy) -> Option<f64> {
    if let ImputeStrategy::Constant(value) = strategy {
        return Some(value);
    }

    let mut observed: Vec<f64> = column.filter(|v| !v.is_nan()).collect();
    if observed.is_empty() {
        return None;
    }

    Some(match strategy {
        ImputeStrategy::Mean => observed.iter().sum::<f64>() / observed.len() as f64,
        ImputeStrategy::Median => {
            observed.sort_by(f64::total_cmp);
            median(&observed)
        }
        ImputeStrategy::MostFrequent => {
            observed.sort_by(f64::total_cmp);
            mode(&observed)
        }
        ImputeStrategy::Constant(value) => value,
    })
}

impl Transformer for SimpleImputer {
    type Params = SimpleImputerParams;
    type Fitted = FittedSimpleImputer;

    fn fit(&self, data: &Array2<f64>) -> Result<Self::Fitted> {
        if data.nrows() == 0 {
            return Err(HousingError::EmptyData(
                "Cannot fit SimpleImputer on empty data".to_string(),
            ));
        }

        let mut statistics = Vec::with_capacity(data.ncols());
        for (index, column) in data.axis_iter(Axis(1)).enumerate() {
            let stat = column_statistic(column.iter().copied(), self.strategy).ok_or_else(|| {
                HousingError::EmptyColumn {
                    index,
                    name: format!("#{}", index),
                }
            })?;
            statistics.push(stat);
        }

        Ok(FittedSimpleImputer {
            strategy: self.strategy,
            statistics: Array1::from(statistics),
        })
    }
}

/// Fitted SimpleImputer ready for inference.
#[derive(Clone, Debug)]
pub struct FittedSimpleImputer {
    strategy: ImputeStrategy,
    statistics: Array1<f64>,
}

impl FittedSimpleImputer {
    /// Get the imputation statistics (fill values) for each feature.
    pub fn statistics(&self) -> &Array1<f64> {
        &self.statistics
    }

    pub fn strategy(&self) -> ImputeStrategy {
        self.strategy
    }
}

impl FittedTransformer for FittedSimpleImputer {
    type Params = SimpleImputerParams;

    fn transform(&self, data: &Array2<f64>) -> Result<Array2<f64>> {
        check_n_features(self.statistics.len(), data)?;

        let mut result = data.clone();
        for (mut column, &fill) in result.axis_iter_mut(Axis(1)).zip(self.statistics.iter()) {
            column.mapv_inplace(|v| if v.is_nan() { fill } else { v });
        }
        Ok(result)
    }

    fn inverse_transform(&self, _data: &Array2<f64>) -> Result<Array2<f64>> {
        Err(HousingError::InvalidParameter(
            "SimpleImputer does not support inverse_transform (missing value information is lost)"
                .to_string(),
        ))
    }

    fn extract_params(&self) -> Self::Params {
        SimpleImputerParams {
            strategy: self.strategy,
            statistics: self.statistics.to_vec(),
        }
    }

    fn from_params(params: Self::Params) -> Result<Self> {
        if params.statistics.iter().any(|v| !v.is_finite()) {
            return Err(HousingError::CorruptArtifact(
                "imputer statistics must be finite".to_string(),
            ));
        }
        Ok(Self {
            strategy: params.strategy,
            statistics: Array1::from(params.statistics),
        })
    }

    fn n_features_in(&self) -> usize {
        self.statistics.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn create_test_data_with_missing() -> Array2<f64> {
        array![[1.0, f64::NAN], [3.0, 4.0], [5.0, 6.0]]
    }

    #[test]
    fn test_simple_imputer_median() {
        let data = array![[1.0], [2.0], [3.0], [f64::NAN], [5.0]];
        let fitted = SimpleImputer::new(ImputeStrategy::Median).fit(&data).unwrap();

        assert_eq!(fitted.statistics()[0], 3.0);

        let imputed = fitted.transform(&data).unwrap();
        assert_eq!(imputed.column(0).to_vec(), vec![1.0, 2.0, 3.0, 3.0, 5.0]);
    }

    #[test]
    fn test_simple_imputer_default_is_median() {
        let data = create_test_data_with_missing();
        let fitted = SimpleImputer::default().fit(&data).unwrap();
        assert_eq!(fitted.strategy(), ImputeStrategy::Median);
        // Column 1: median of [4, 6] = 5
        assert!((fitted.statistics()[1] - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_simple_imputer_mean() {
        let data = create_test_data_with_missing();
        let fitted = SimpleImputer::new(ImputeStrategy::Mean).fit(&data).unwrap();

        let stats = fitted.statistics();
        assert!((stats[0] - 3.0).abs() < 1e-12);
        assert!((stats[1] - 5.0).abs() < 1e-12);

        let imputed = fitted.transform(&data).unwrap();
        assert_eq!(imputed, array![[1.0, 5.0], [3.0, 4.0], [5.0, 6.0]]);
    }

    #[test]
    fn test_simple_imputer_most_frequent_ties_to_smallest() {
        let data = array![[2.0, 9.0], [1.0, 7.0], [2.0, 9.0], [1.0, f64::NAN]];
        let fitted = SimpleImputer::new(ImputeStrategy::MostFrequent)
            .fit(&data)
            .unwrap();
        assert_eq!(fitted.statistics()[0], 1.0);
        assert_eq!(fitted.statistics()[1], 9.0);
    }

    #[test]
    fn test_simple_imputer_constant() {
        let data = create_test_data_with_missing();
        let fitted = SimpleImputer::new(ImputeStrategy::Constant(-1.0))
            .fit(&data)
            .unwrap();
        let imputed = fitted.transform(&data).unwrap();
        assert_eq!(imputed[[0, 1]], -1.0);
    }

    #[test]
    fn test_simple_imputer_all_missing_column() {
        let data = array![[1.0, f64::NAN], [2.0, f64::NAN]];
        let result = SimpleImputer::new(ImputeStrategy::Median).fit(&data);
        assert!(matches!(
            result,
            Err(HousingError::EmptyColumn { index: 1, .. })
        ));

        // Constant needs no observations
        assert!(SimpleImputer::new(ImputeStrategy::Constant(0.0))
            .fit(&data)
            .is_ok());
    }

    #[test]
    fn test_simple_imputer_empty_data() {
        let data = Array2::<f64>::zeros((0, 2));
        let result = SimpleImputer::default().fit(&data);
        assert!(matches!(result, Err(HousingError::EmptyData(_))));
    }

    #[test]
    fn test_simple_imputer_feature_mismatch() {
        let fitted = SimpleImputer::default()
            .fit(&create_test_data_with_missing())
            .unwrap();
        let result = fitted.transform(&array![[1.0, 2.0, 3.0]]);
        assert!(matches!(result, Err(HousingError::SchemaMismatch { .. })));
    }

    #[test]
    fn test_simple_imputer_inverse_not_supported() {
        let data = create_test_data_with_missing();
        let fitted = SimpleImputer::default().fit(&data).unwrap();
        let imputed = fitted.transform(&data).unwrap();
        assert!(matches!(
            fitted.inverse_transform(&imputed),
            Err(HousingError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_simple_imputer_serialization() {
        let data = create_test_data_with_missing();
        let fitted = SimpleImputer::new(ImputeStrategy::Mean).fit(&data).unwrap();

        let restored = FittedSimpleImputer::from_params(fitted.extract_params()).unwrap();
        assert_eq!(
            fitted.transform(&data).unwrap(),
            restored.transform(&data).unwrap()
        );
    }

    #[test]
    fn test_simple_imputer_rejects_non_finite_statistics() {
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let params = SimpleImputerParams {
                strategy: ImputeStrategy::Mean,
                statistics: vec![1.0, bad],
            };
            assert!(matches!(
                FittedSimpleImputer::from_params(params),
                Err(HousingError::CorruptArtifact(_))
            ));
        }
    }
}
