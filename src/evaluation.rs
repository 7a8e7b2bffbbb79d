//! Regression metrics and k-fold cross-validation.

use crate::error::{HousingError, Result};
use crate::model::{FittedRegressor, Regressor};
use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

fn check_pair(predictions: &Array1<f64>, labels: &Array1<f64>) -> Result<()> {
    if predictions.len() != labels.len() {
        return Err(HousingError::shape(
            format!("{} predictions", labels.len()),
            format!("{} predictions", predictions.len()),
        ));
    }
    if labels.is_empty() {
        return Err(HousingError::EmptyData(
            "cannot score an empty prediction set".to_string(),
        ));
    }
    Ok(())
}

/// Mean squared error.
pub fn mse(predictions: &Array1<f64>, labels: &Array1<f64>) -> Result<f64> {
    check_pair(predictions, labels)?;
    let sum: f64 = predictions
        .iter()
        .zip(labels.iter())
        .map(|(p, l)| (p - l) * (p - l))
        .sum();
    Ok(sum / labels.len() as f64)
}

/// Root mean squared error: `sqrt(mean((p - l)^2))`.
///
/// # Errors
/// - `ShapeMismatch` if the lengths differ
/// - `EmptyData` if both are empty
pub fn rmse(predictions: &Array1<f64>, labels: &Array1<f64>) -> Result<f64> {
    mse(predictions, labels).map(f64::sqrt)
}

/// Mean absolute error.
pub fn mae(predictions: &Array1<f64>, labels: &Array1<f64>) -> Result<f64> {
    check_pair(predictions, labels)?;
    let sum: f64 = predictions
        .iter()
        .zip(labels.iter())
        .map(|(p, l)| (p - l).abs())
        .sum();
    Ok(sum / labels.len() as f64)
}

/// Coefficient of determination.
///
/// Constant labels give `1.0` for a perfect fit and `0.0` otherwise.
pub fn r2_score(predictions: &Array1<f64>, labels: &Array1<f64>) -> Result<f64> {
    check_pair(predictions, labels)?;
    let mean = labels.sum() / labels.len() as f64;
    let ss_res: f64 = predictions
        .iter()
        .zip(labels.iter())
        .map(|(p, l)| (l - p) * (l - p))
        .sum();
    let ss_tot: f64 = labels.iter().map(|l| (l - mean) * (l - mean)).sum();
    if ss_tot == 0.0 {
        return Ok(if ss_res == 0.0 { 1.0 } else { 0.0 });
    }
    Ok(1.0 - ss_res / ss_tot)
}

/// How rows are assigned to folds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CvStrategy {
    /// Folds are consecutive runs of rows in their current order.
    #[default]
    Contiguous,
    /// Rows are shuffled with a seeded `StdRng` before being cut into folds.
    Shuffled { seed: u64 },
}

/// Per-fold RMSE scores.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CvScores {
    pub scores: Vec<f64>,
}

impl CvScores {
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn mean(&self) -> f64 {
        if self.scores.is_empty() {
            return f64::NAN;
        }
        self.scores.iter().sum::<f64>() / self.scores.len() as f64
    }

    /// Population standard deviation of the scores.
    pub fn std(&self) -> f64 {
        if self.scores.is_empty() {
            return f64::NAN;
        }
        let mean = self.mean();
        let var = self.scores.iter().map(|s| (s - mean) * (s - mean)).sum::<f64>()
            / self.scores.len() as f64;
        var.sqrt()
    }
}

/// Validation row indices of each fold.
///
/// The first `n % k` folds hold one extra row.
pub fn k_fold_indices(n_samples: usize, k: usize, strategy: CvStrategy) -> Result<Vec<Vec<usize>>> {
    if k < 2 || k > n_samples {
        return Err(HousingError::InvalidFoldCount { k, n_samples });
    }

    let mut order: Vec<usize> = (0..n_samples).collect();
    if let CvStrategy::Shuffled { seed } = strategy {
        order.shuffle(&mut StdRng::seed_from_u64(seed));
    }

    let base = n_samples / k;
    let extra = n_samples % k;
    let mut folds = Vec::with_capacity(k);
    let mut start = 0;
    for fold in 0..k {
        let size = base + usize::from(fold < extra);
        folds.push(order[start..start + size].to_vec());
        start += size;
    }
    Ok(folds)
}

/// Estimate generalization error with k-fold cross-validation.
///
/// Each fold trains a fresh regressor from `factory` on the other `k - 1`
/// folds and scores RMSE on the held-out fold. Folds run in parallel; the
/// returned scores are in fold order.
///
/// # Errors
/// - `InvalidFoldCount` unless `2 <= k <= n`, checked before any fitting
/// - `ShapeMismatch` if `x` and `y` disagree on the row count
/// - any error from fitting or predicting
pub fn cross_validate<R, F>(
    factory: F,
    x: &Array2<f64>,
    y: &Array1<f64>,
    k: usize,
    strategy: CvStrategy,
) -> Result<CvScores>
where
    R: Regressor,
    F: Fn() -> R + Sync,
{
    if x.nrows() != y.len() {
        return Err(HousingError::shape(
            format!("{} labels", x.nrows()),
            format!("{} labels", y.len()),
        ));
    }
    let folds = k_fold_indices(x.nrows(), k, strategy)?;

    let scores = folds
        .par_iter()
        .enumerate()
        .map(|(fold, validation)| {
            let mut held_out = vec![false; x.nrows()];
            for &i in validation {
                held_out[i] = true;
            }
            let train: Vec<usize> = (0..x.nrows()).filter(|&i| !held_out[i]).collect();

            let model = factory().fit(&x.select(Axis(0), &train), &y.select(Axis(0), &train))?;
            let predictions = model.predict(&x.select(Axis(0), validation))?;
            let score = rmse(&predictions, &y.select(Axis(0), validation))?;
            debug!(fold, train = train.len(), validation = validation.len(), rmse = score, "fold scored");
            Ok(score)
        })
        .collect::<Result<Vec<f64>>>()?;

    let scores = CvScores { scores };
    info!(k, mean = scores.mean(), std = scores.std(), "cross-validation finished");
    Ok(scores)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::synthetic::boston_like;
    use crate::model::{DecisionTreeRegressor, RandomForestRegressor};
    use ndarray::array;

    #[test]
    fn test_rmse_examples() {
        assert_eq!(rmse(&array![3.0, 3.0, 3.0], &array![3.0, 3.0, 3.0]).unwrap(), 0.0);
        assert_eq!(rmse(&array![0.0, 0.0], &array![1.0, 1.0]).unwrap(), 1.0);
        assert!((rmse(&array![1.0, 2.0], &array![3.0, 2.0]).unwrap() - 2.0f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_metric_errors() {
        assert!(matches!(
            rmse(&array![1.0], &array![1.0, 2.0]),
            Err(HousingError::ShapeMismatch { .. })
        ));
        assert!(matches!(
            rmse(&Array1::zeros(0), &Array1::zeros(0)),
            Err(HousingError::EmptyData(_))
        ));
    }

    #[test]
    fn test_mae_and_r2() {
        let labels = array![1.0, 2.0, 3.0, 4.0];
        assert_eq!(mae(&array![2.0, 2.0, 2.0, 6.0], &labels).unwrap(), 1.0);
        assert_eq!(r2_score(&labels, &labels).unwrap(), 1.0);
        // predicting the mean scores zero
        assert_eq!(r2_score(&array![2.5, 2.5, 2.5, 2.5], &labels).unwrap(), 0.0);
        assert_eq!(r2_score(&array![1.0, 1.0], &array![1.0, 1.0]).unwrap(), 1.0);
    }

    #[test]
    fn test_k_fold_sizes() {
        let folds = k_fold_indices(10, 3, CvStrategy::Contiguous).unwrap();
        let sizes: Vec<usize> = folds.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![4, 3, 3]);
        assert_eq!(folds[0], vec![0, 1, 2, 3]);

        let mut all: Vec<usize> = k_fold_indices(10, 3, CvStrategy::Shuffled { seed: 1 })
            .unwrap()
            .concat();
        all.sort_unstable();
        assert_eq!(all, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_k_fold_invalid_k() {
        assert!(matches!(
            k_fold_indices(10, 1, CvStrategy::Contiguous),
            Err(HousingError::InvalidFoldCount { k: 1, n_samples: 10 })
        ));
        assert!(matches!(
            k_fold_indices(10, 11, CvStrategy::Contiguous),
            Err(HousingError::InvalidFoldCount { k: 11, .. })
        ));
    }

    #[test]
    fn test_cross_validate_five_folds() {
        let (features, labels) = boston_like(100, 2)
            .unwrap()
            .features_and_labels("MEDV")
            .unwrap();
        let x = features.into_parts().1;
        let scores = cross_validate(
            || RandomForestRegressor::new().with_n_estimators(5),
            &x,
            &labels,
            5,
            CvStrategy::Contiguous,
        )
        .unwrap();
        assert_eq!(scores.len(), 5);
        assert!(scores.scores.iter().all(|&s| s >= 0.0 && s.is_finite()));
        assert!(scores.std() >= 0.0);
    }

    #[test]
    fn test_cross_validate_is_deterministic() {
        let (features, labels) = boston_like(60, 8)
            .unwrap()
            .features_and_labels("MEDV")
            .unwrap();
        let x = features.into_parts().1;
        let run = || {
            cross_validate(
                DecisionTreeRegressor::new,
                &x,
                &labels,
                4,
                CvStrategy::Shuffled { seed: 3 },
            )
            .unwrap()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_cross_validate_rejects_bad_k_before_fitting() {
        let x = array![[1.0], [2.0], [3.0]];
        let y = array![1.0, 2.0, 3.0];
        let result = cross_validate(
            || RandomForestRegressor::new().with_n_estimators(0),
            &x,
            &y,
            4,
            CvStrategy::Contiguous,
        );
        // fold count is rejected before the invalid forest is ever fitted
        assert!(matches!(result, Err(HousingError::InvalidFoldCount { .. })));
    }

    #[test]
    fn test_cv_scores_summary() {
        let scores = CvScores {
            scores: vec![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0],
        };
        assert_eq!(scores.mean(), 5.0);
        assert_eq!(scores.std(), 2.0);
    }
}
