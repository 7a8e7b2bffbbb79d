//! Training configuration.
//!
//! Every field has a default, so a JSON file only needs the values it changes:
//!
//! ```json
//! {
//!   "data_path": "housing.csv",
//!   "artifact_path": "model.bin",
//!   "model": "RandomForest",
//!   "forest": { "n_estimators": 200 }
//! }
//! ```

use crate::dataset::{Delimiter, HeaderMode, LoaderOptions, BOSTON_TARGET, CHAS};
use crate::error::{HousingError, Result};
use crate::model::ForestConfig;
use crate::preprocessing::ImputeStrategy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Which regressor a training run fits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelKind {
    #[default]
    RandomForest,
    /// One tree grown on all training rows with the forest's growth limits
    /// and seed; `n_estimators` and `bootstrap` are ignored.
    DecisionTree,
}

/// Settings for one end-to-end training run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Input file; required by [`crate::training::train`].
    pub data_path: Option<PathBuf>,
    pub delimiter: Delimiter,
    pub header: HeaderMode,
    /// Label column.
    pub target: String,
    /// Column whose distribution the train/test split preserves.
    pub stratify_by: String,
    pub test_ratio: f64,
    /// Seed of the split and of shuffled cross-validation.
    pub seed: u64,
    pub impute_strategy: ImputeStrategy,
    pub model: ModelKind,
    pub forest: ForestConfig,
    /// Number of cross-validation folds on the training set.
    pub cv_folds: usize,
    /// Where to save the fitted model; nothing is written when `None`.
    pub artifact_path: Option<PathBuf>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            data_path: None,
            delimiter: Delimiter::Auto,
            header: HeaderMode::Auto,
            target: BOSTON_TARGET.to_string(),
            stratify_by: CHAS.to_string(),
            test_ratio: 0.2,
            seed: 42,
            impute_strategy: ImputeStrategy::Median,
            model: ModelKind::RandomForest,
            forest: ForestConfig::default(),
            cv_folds: 10,
            artifact_path: None,
        }
    }
}

impl TrainingConfig {
    pub fn with_data_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.data_path = Some(path.into());
        self
    }

    pub fn with_artifact_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.artifact_path = Some(path.into());
        self
    }

    pub fn with_test_ratio(mut self, test_ratio: f64) -> Self {
        self.test_ratio = test_ratio;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_cv_folds(mut self, cv_folds: usize) -> Self {
        self.cv_folds = cv_folds;
        self
    }

    pub fn with_impute_strategy(mut self, strategy: ImputeStrategy) -> Self {
        self.impute_strategy = strategy;
        self
    }

    pub fn with_model(mut self, model: ModelKind) -> Self {
        self.model = model;
        self
    }

    pub fn with_forest(mut self, forest: ForestConfig) -> Self {
        self.forest = forest;
        self
    }

    pub fn loader_options(&self) -> LoaderOptions {
        LoaderOptions::default()
            .with_delimiter(self.delimiter)
            .with_header(self.header)
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Check value ranges that do not depend on the data.
    ///
    /// # Errors
    /// `Config` describing the first offending field.
    pub fn validate(&self) -> Result<()> {
        if !(self.test_ratio > 0.0 && self.test_ratio < 1.0) {
            return Err(HousingError::Config(format!(
                "test_ratio must be in (0, 1), got {}",
                self.test_ratio
            )));
        }
        if self.cv_folds == 1 {
            return Err(HousingError::Config(
                "cv_folds must be 0 (disabled) or at least 2".to_string(),
            ));
        }
        if self.target.is_empty() {
            return Err(HousingError::Config("target must not be empty".to_string()));
        }
        if self.target == self.stratify_by {
            return Err(HousingError::Config(format!(
                "cannot stratify by the target column '{}'",
                self.target
            )));
        }
        self.forest
            .validate()
            .map_err(|e| HousingError::Config(format!("forest: {}", e)))
    }
}
