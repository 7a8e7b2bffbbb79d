//! Deterministic Boston-like sample data for demos, tests and benchmarks.
//!
//! Columns follow [`Schema::boston`] and roughly reproduce the ranges and the
//! main relationships of the real dataset (price rises with `RM`, falls with
//! `LSTAT`, `CRIM` and `PTRATIO`). `CHAS` is 1 for every 14th row (about 7%).

use crate::dataset::schema::Schema;
use crate::dataset::table::Dataset;
use crate::error::Result;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

const RAD_LEVELS: [f64; 9] = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 24.0];

/// Generate `n_rows` labeled rows from `seed`.
pub fn boston_like(n_rows: usize, seed: u64) -> Result<Dataset> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut rows = Vec::with_capacity(n_rows);

    for i in 0..n_rows {
        let crim = rng.gen_range(-5.0f64..4.0).exp();
        let zn = if rng.gen_bool(0.25) {
            (rng.gen_range(1.0f64..8.0)).round() * 12.5
        } else {
            0.0
        };
        let indus = rng.gen_range(0.5..27.7);
        let chas = if i % 14 == 3 { 1.0 } else { 0.0 };
        let nox = 0.38 + indus / 27.7 * 0.35 + rng.gen_range(-0.05..0.05);
        let rm = rng.gen_range(4.5..8.5);
        let age = rng.gen_range(3.0..100.0);
        let dis = 1.1 + (100.0 - age) / 100.0 * 8.0 + rng.gen_range(0.0..2.0);
        let rad = *RAD_LEVELS.choose(&mut rng).unwrap_or(&1.0);
        let tax = if rad == 24.0 {
            666.0
        } else {
            rng.gen_range(187.0..470.0)
        };
        let ptratio = rng.gen_range(12.6..22.0);
        let b = 396.9 - rng.gen_range(0.0f64..1.0).powi(4) * 390.0;
        let lstat = (38.0 - 4.0 * rm + 0.1 * crim + rng.gen_range(-3.0..3.0)).clamp(1.7, 38.0);
        let medv = (-34.0 + 9.1 * rm - 0.6 * lstat - 0.1 * crim + 3.0 * chas
            - 0.9 * (ptratio - 18.0)
            + rng.gen_range(-2.5..2.5))
        .clamp(5.0, 50.0);

        rows.push(vec![
            crim, zn, indus, chas, nox, rm, age, dis, rad, tax, ptratio, b, lstat, medv,
        ]);
    }

    Dataset::from_rows(Schema::boston(), rows)
}

/// Blank out a fraction of one column's cells (set them to `NaN`).
pub fn with_missing(dataset: &Dataset, column: &str, fraction: f64, seed: u64) -> Result<Dataset> {
    let idx = dataset.schema().require(column)?;
    let (schema, mut data) = dataset.clone().into_parts();
    let mut rng = StdRng::seed_from_u64(seed);
    let mut rows: Vec<usize> = (0..data.nrows()).collect();
    rows.shuffle(&mut rng);
    let n_missing = ((data.nrows() as f64) * fraction.clamp(0.0, 1.0)).round() as usize;
    for &r in rows.iter().take(n_missing) {
        data[[r, idx]] = f64::NAN;
    }
    Dataset::new(schema, data)
}
