//! In-memory table with a fixed column schema.

use crate::dataset::schema::Schema;
use crate::error::{HousingError, Result};
use ndarray::{concatenate, Array1, Array2, ArrayView1, Axis};

/// An ordered collection of rows sharing a fixed column schema.
///
/// Cells are stored row-major as `f64`; a missing cell is `NaN`. Every row has
/// exactly `schema.len()` cells.
#[derive(Clone, Debug, PartialEq)]
pub struct Dataset {
    schema: Schema,
    data: Array2<f64>,
}

impl Dataset {
    /// Create a dataset, checking that the matrix width matches the schema.
    pub fn new(schema: Schema, data: Array2<f64>) -> Result<Self> {
        if data.ncols() != schema.len() {
            return Err(HousingError::schema(
                format!("{} columns {}", schema.len(), schema),
                format!("{} columns", data.ncols()),
            ));
        }
        Ok(Self { schema, data })
    }

    /// Create a dataset from row vectors.
    pub fn from_rows(schema: Schema, rows: Vec<Vec<f64>>) -> Result<Self> {
        let n_cols = schema.len();
        let n_rows = rows.len();
        let mut flat = Vec::with_capacity(n_rows * n_cols);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != n_cols {
                return Err(HousingError::schema(
                    format!("{} columns", n_cols),
                    format!("{} columns in row {}", row.len(), i),
                ));
            }
            flat.extend(row);
        }
        let data = Array2::from_shape_vec((n_rows, n_cols), flat)
            .map_err(|e| HousingError::shape(format!("({n_rows}, {n_cols})"), e))?;
        Self::new(schema, data)
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Read-only view of the cell matrix.
    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.data.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.data.nrows() == 0
    }

    pub fn n_columns(&self) -> usize {
        self.data.ncols()
    }

    pub fn column(&self, name: &str) -> Result<ArrayView1<'_, f64>> {
        let idx = self.schema.require(name)?;
        Ok(self.data.column(idx))
    }

    pub fn row(&self, index: usize) -> Option<ArrayView1<'_, f64>> {
        (index < self.len()).then(|| self.data.row(index))
    }

    /// Number of missing (`NaN`) cells.
    pub fn missing_count(&self) -> usize {
        self.data.iter().filter(|v| v.is_nan()).count()
    }

    /// Select rows by index, in the given order.
    pub fn take(&self, indices: &[usize]) -> Result<Self> {
        if let Some(&bad) = indices.iter().find(|&&i| i >= self.len()) {
            return Err(HousingError::InvalidParameter(format!(
                "row index {} out of bounds for {} rows",
                bad,
                self.len()
            )));
        }
        Ok(Self {
            schema: self.schema.clone(),
            data: self.data.select(Axis(0), indices),
        })
    }

    /// A copy without the named column.
    pub fn drop_column(&self, name: &str) -> Result<Self> {
        let drop_idx = self.schema.require(name)?;
        let keep: Vec<usize> = (0..self.n_columns()).filter(|&i| i != drop_idx).collect();
        Ok(Self {
            schema: self.schema.without(name)?,
            data: self.data.select(Axis(1), &keep),
        })
    }

    /// Split off the target column: `(features, labels)`.
    ///
    /// Labels must be fully observed; a missing target cell is rejected.
    pub fn features_and_labels(&self, target: &str) -> Result<(Self, Array1<f64>)> {
        let labels = self.column(target)?.to_owned();
        if let Some(row) = labels.iter().position(|v| v.is_nan()) {
            return Err(HousingError::InvalidInput(format!(
                "target '{}' is missing in row {}",
                target, row
            )));
        }
        Ok((self.drop_column(target)?, labels))
    }

    /// Append `numerator / denominator` as a new column named `name`.
    pub fn with_ratio_column(&self, name: &str, numerator: &str, denominator: &str) -> Result<Self> {
        let ratio = &self.column(numerator)? / &self.column(denominator)?;
        let schema = self.schema.with_column(name)?;
        let extra = ratio.insert_axis(Axis(1));
        let data = concatenate(Axis(1), &[self.data.view(), extra.view()])
            .map_err(|e| HousingError::shape(format!("{} rows", self.len()), e))?;
        Self::new(schema, data)
    }

    pub fn into_parts(self) -> (Schema, Array2<f64>) {
        (self.schema, self.data)
    }
}
