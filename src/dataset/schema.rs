//! Ordered column schemas.

use crate::error::{HousingError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// The 13 Boston housing predictors, in the order the regressor consumes them.
pub const BOSTON_FEATURES: [&str; 13] = [
    "CRIM", "ZN", "INDUS", "CHAS", "NOX", "RM", "AGE", "DIS", "RAD", "TAX", "PTRATIO", "B",
    "LSTAT",
];

/// Median home value in $1000s.
pub const BOSTON_TARGET: &str = "MEDV";

/// Charles River dummy variable, the stratification field.
pub const CHAS: &str = "CHAS";

/// An ordered list of unique column names.
///
/// Order is significant: two schemas with the same names in a different order
/// do not match.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    columns: Vec<String>,
}

impl Schema {
    /// Build a schema, rejecting empty or duplicate names.
    pub fn new<I, S>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        let mut seen = HashSet::with_capacity(columns.len());
        for name in &columns {
            if name.trim().is_empty() {
                return Err(HousingError::InvalidParameter(
                    "column names must not be empty".to_string(),
                ));
            }
            if !seen.insert(name.as_str()) {
                return Err(HousingError::InvalidParameter(format!(
                    "duplicate column name '{}'",
                    name
                )));
            }
        }
        Ok(Self { columns })
    }

    /// The full 14-column labeled schema (13 predictors followed by `MEDV`).
    pub fn boston() -> Self {
        let mut columns: Vec<String> = BOSTON_FEATURES.iter().map(|s| s.to_string()).collect();
        columns.push(BOSTON_TARGET.to_string());
        Self { columns }
    }

    /// The 13-column predictor schema.
    pub fn boston_features() -> Self {
        Self {
            columns: BOSTON_FEATURES.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Like [`Schema::index_of`], but unknown names are an error.
    pub fn require(&self, name: &str) -> Result<usize> {
        self.index_of(name)
            .ok_or_else(|| HousingError::UnknownColumn(name.to_string()))
    }

    /// A copy of this schema without `name`.
    pub fn without(&self, name: &str) -> Result<Self> {
        let idx = self.require(name)?;
        let mut columns = self.columns.clone();
        columns.remove(idx);
        Ok(Self { columns })
    }

    /// A copy of this schema with `name` appended.
    pub fn with_column(&self, name: &str) -> Result<Self> {
        let mut columns = self.columns.clone();
        columns.push(name.to_string());
        Self::new(columns)
    }

    /// Fails with `SchemaMismatch` unless `other` has the same names in the same order.
    pub fn ensure_matches(&self, other: &Schema) -> Result<()> {
        if self == other {
            Ok(())
        } else {
            Err(HousingError::schema(self, other))
        }
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.columns.join(", "))
    }
}
