//! Read-only exploratory statistics over a [`Dataset`].
//!
//! Missing cells are skipped: each statistic uses the observed values of its
//! column, and each correlation uses the rows where both columns are observed.

use crate::dataset::Dataset;
use crate::error::{HousingError, Result};
use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Pairwise Pearson correlations between all columns of a dataset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    /// Symmetric; `NaN` where a pair has fewer than two shared observations
    /// or a zero-variance column.
    pub values: Array2<f64>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: &str, b: &str) -> Result<f64> {
        let i = self.index(a)?;
        let j = self.index(b)?;
        Ok(self.values[[i, j]])
    }

    fn index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| HousingError::UnknownColumn(name.to_string()))
    }

    /// Correlations of every column with `name`, strongest positive first.
    ///
    /// Undefined (`NaN`) correlations sort last.
    pub fn column_ranking(&self, name: &str) -> Result<Vec<(String, f64)>> {
        let idx = self.index(name)?;
        let mut ranking: Vec<(String, f64)> = self
            .columns
            .iter()
            .cloned()
            .zip(self.values.row(idx).iter().copied())
            .collect();
        ranking.sort_by(|a, b| match (a.1.is_nan(), b.1.is_nan()) {
            (false, false) => b.1.total_cmp(&a.1),
            (x, y) => x.cmp(&y),
        });
        Ok(ranking)
    }
}

fn pearson(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
    let pairs: Vec<(f64, f64)> = a
        .iter()
        .zip(b.iter())
        .filter(|(x, y)| !x.is_nan() && !y.is_nan())
        .map(|(&x, &y)| (x, y))
        .collect();
    let n = pairs.len() as f64;
    if pairs.len() < 2 {
        return f64::NAN;
    }
    let mean_a = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_b = pairs.iter().map(|p| p.1).sum::<f64>() / n;
    let (mut cov, mut var_a, mut var_b) = (0.0, 0.0, 0.0);
    for (x, y) in &pairs {
        let (dx, dy) = (x - mean_a, y - mean_b);
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }
    if var_a == 0.0 || var_b == 0.0 {
        return f64::NAN;
    }
    (cov / (var_a.sqrt() * var_b.sqrt())).clamp(-1.0, 1.0)
}

/// Pairwise-complete Pearson correlation matrix.
pub fn correlation_matrix(dataset: &Dataset) -> CorrelationMatrix {
    let data = dataset.data();
    let n = dataset.n_columns();
    let mut values = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        for j in i..n {
            let r = if i == j {
                // a column correlates perfectly with itself whenever it varies
                pearson(data.column(i), data.column(i)).signum()
            } else {
                pearson(data.column(i), data.column(j))
            };
            values[[i, j]] = r;
            values[[j, i]] = r;
        }
    }
    CorrelationMatrix {
        columns: dataset.schema().columns().to_vec(),
        values,
    }
}

/// Summary statistics of one column.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColumnSummary {
    pub name: String,
    /// Number of observed (non-missing) values.
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (ddof = 1).
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

/// Linear-interpolation quantile of sorted values.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

/// Count, mean, std, min, quartiles and max of every column.
///
/// Columns without observations report a count of 0 and `NaN` statistics.
pub fn describe(dataset: &Dataset) -> Vec<ColumnSummary> {
    dataset
        .schema()
        .columns()
        .iter()
        .zip(dataset.data().columns())
        .map(|(name, column)| {
            let mut observed: Vec<f64> = column.iter().copied().filter(|v| !v.is_nan()).collect();
            observed.sort_by(f64::total_cmp);
            let count = observed.len();
            if count == 0 {
                return ColumnSummary {
                    name: name.clone(),
                    count,
                    mean: f64::NAN,
                    std: f64::NAN,
                    min: f64::NAN,
                    q25: f64::NAN,
                    median: f64::NAN,
                    q75: f64::NAN,
                    max: f64::NAN,
                };
            }
            let mean = observed.iter().sum::<f64>() / count as f64;
            let std = if count > 1 {
                let ss: f64 = observed.iter().map(|v| (v - mean) * (v - mean)).sum();
                (ss / (count - 1) as f64).sqrt()
            } else {
                f64::NAN
            };
            ColumnSummary {
                name: name.clone(),
                count,
                mean,
                std,
                min: observed[0],
                q25: quantile(&observed, 0.25),
                median: quantile(&observed, 0.5),
                q75: quantile(&observed, 0.75),
                max: observed[count - 1],
            }
        })
        .collect()
}

/// Occurrences of each observed value of `column`, ascending by value.
pub fn value_counts(dataset: &Dataset, column: &str) -> Result<Vec<(f64, usize)>> {
    let mut counts: BTreeMap<OrderedValue, usize> = BTreeMap::new();
    for &v in dataset.column(column)?.iter().filter(|v| !v.is_nan()) {
        *counts.entry(OrderedValue(v)).or_insert(0) += 1;
    }
    Ok(counts.into_iter().map(|(k, n)| (k.0, n)).collect())
}

/// Total ordering over non-NaN values for map keys.
#[derive(Clone, Copy, Debug)]
struct OrderedValue(f64);

impl PartialEq for OrderedValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other).is_eq()
    }
}

impl Eq for OrderedValue {}

impl PartialOrd for OrderedValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrderedValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // -0.0 and 0.0 count as one value
        (self.0 + 0.0).total_cmp(&(other.0 + 0.0))
    }
}
