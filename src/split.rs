//! Train/test splitting.
//!
//! [`stratified_split`] preserves the distribution of one categorical column
//! across both partitions; [`random_split`] is a plain seeded shuffle.
//! Both are deterministic for a fixed seed.

use crate::dataset::Dataset;
use crate::error::{HousingError, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::HashMap;
use tracing::{debug, info};

/// Two disjoint datasets whose union is the source dataset.
#[derive(Clone, Debug)]
pub struct Split {
    pub train: Dataset,
    pub test: Dataset,
    /// Source row indices of `train`, ascending.
    pub train_indices: Vec<usize>,
    /// Source row indices of `test`, ascending.
    pub test_indices: Vec<usize>,
}

impl Split {
    fn from_indices(
        dataset: &Dataset,
        mut train_indices: Vec<usize>,
        mut test_indices: Vec<usize>,
    ) -> Result<Self> {
        train_indices.sort_unstable();
        test_indices.sort_unstable();
        Ok(Self {
            train: dataset.take(&train_indices)?,
            test: dataset.take(&test_indices)?,
            train_indices,
            test_indices,
        })
    }
}

fn check_ratio(test_ratio: f64) -> Result<()> {
    if test_ratio > 0.0 && test_ratio < 1.0 {
        Ok(())
    } else {
        Err(HousingError::InvalidParameter(format!(
            "test ratio must be in (0, 1), got {}",
            test_ratio
        )))
    }
}

/// Rows grouped by the value of one column, ordered by value.
///
/// Missing values form their own stratum, ordered last.
fn strata(dataset: &Dataset, field: &str) -> Result<Vec<(f64, Vec<usize>)>> {
    let column = dataset.column(field)?;
    let mut by_key: HashMap<u64, usize> = HashMap::new();
    let mut groups: Vec<(f64, Vec<usize>)> = Vec::new();

    for (row, &value) in column.iter().enumerate() {
        // NaN payloads and signed zeros collapse to a single key.
        let key = if value.is_nan() {
            f64::NAN.to_bits()
        } else if value == 0.0 {
            0.0f64.to_bits()
        } else {
            value.to_bits()
        };
        let slot = *by_key.entry(key).or_insert_with(|| {
            groups.push((value, Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(row);
    }

    groups.sort_by(|a, b| match (a.0.is_nan(), b.0.is_nan()) {
        (false, false) => a.0.total_cmp(&b.0),
        (x, y) => x.cmp(&y),
    });
    Ok(groups)
}

/// Proportional allocation of `n_test` rows over strata of the given sizes.
///
/// Each stratum receives `floor(size * n_test / n)` rows; leftover rows go to
/// the strata with the largest fractional remainders (earlier strata win ties).
/// A stratum never gives away its last row.
fn allocate(sizes: &[usize], n_test: usize) -> Vec<usize> {
    let n: usize = sizes.iter().sum();
    let mut alloc = Vec::with_capacity(sizes.len());
    let mut remainders = Vec::with_capacity(sizes.len());

    for (i, &size) in sizes.iter().enumerate() {
        let exact = size as f64 * n_test as f64 / n as f64;
        let base = (exact.floor() as usize).min(size.saturating_sub(1));
        alloc.push(base);
        remainders.push((i, exact - base as f64));
    }

    remainders.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

    let mut left = n_test.saturating_sub(alloc.iter().sum());
    while left > 0 {
        let mut progressed = false;
        for &(i, _) in &remainders {
            if left == 0 {
                break;
            }
            if alloc[i] + 1 < sizes[i] {
                alloc[i] += 1;
                left -= 1;
                progressed = true;
            }
        }
        if !progressed {
            break;
        }
    }
    alloc
}

/// Split `dataset` into train/test, preserving the distribution of `field`.
///
/// The test partition holds `ceil(test_ratio * n)` rows (clamped to `[1, n-1]`),
/// allocated to strata proportionally. Rows are shuffled within each stratum
/// using a `StdRng` seeded with `seed`, so identical inputs and seed always
/// produce identical partitions.
///
/// # Errors
/// - `InvalidParameter` if `test_ratio` is not in `(0, 1)`
/// - `UnknownColumn` if `field` is not in the schema
/// - `InsufficientStrata` if any stratum has fewer than 2 rows
pub fn stratified_split(
    dataset: &Dataset,
    field: &str,
    test_ratio: f64,
    seed: u64,
) -> Result<Split> {
    check_ratio(test_ratio)?;
    let groups = strata(dataset, field)?;

    if let Some((value, rows)) = groups.iter().find(|(_, rows)| rows.len() < 2) {
        return Err(HousingError::InsufficientStrata {
            column: field.to_string(),
            value: value.to_string(),
            count: rows.len(),
        });
    }
    if groups.is_empty() {
        return Err(HousingError::EmptyData(
            "cannot split an empty dataset".to_string(),
        ));
    }

    let n = dataset.len();
    let n_test = ((n as f64 * test_ratio).ceil() as usize).clamp(1, n - 1);
    let sizes: Vec<usize> = groups.iter().map(|(_, rows)| rows.len()).collect();
    let alloc = allocate(&sizes, n_test);

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::with_capacity(n - n_test);
    let mut test = Vec::with_capacity(n_test);

    for ((value, rows), &k) in groups.iter().zip(&alloc) {
        let mut rows = rows.clone();
        rows.shuffle(&mut rng);
        test.extend_from_slice(&rows[..k]);
        train.extend_from_slice(&rows[k..]);
        debug!(field, value, total = rows.len(), test = k, "stratum allocated");
    }

    info!(
        field,
        train = train.len(),
        test = test.len(),
        strata = groups.len(),
        seed,
        "stratified split"
    );
    Split::from_indices(dataset, train, test)
}

/// Shuffle rows with a seeded `StdRng` and hold out the first `floor(test_ratio * n)`.
///
/// # Errors
/// `InvalidParameter` if the ratio is outside `(0, 1)` or leaves either side empty.
pub fn random_split(dataset: &Dataset, test_ratio: f64, seed: u64) -> Result<Split> {
    check_ratio(test_ratio)?;
    let n = dataset.len();
    let n_test = (n as f64 * test_ratio) as usize;
    if n_test == 0 || n_test == n {
        return Err(HousingError::InvalidParameter(format!(
            "test ratio {} leaves an empty partition for {} rows",
            test_ratio, n
        )));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(&mut rng);
    let train = order.split_off(n_test);

    info!(train = train.len(), test = order.len(), seed, "random split");
    Split::from_indices(dataset, train, order)
}
