//! # housing-pipeline
//!
//! Boston housing price regression with strict separation between fitting and
//! inference.
//!
//! ## Core Design Principles
//!
//! - **Stateful Type Safety**: every stage comes in an unfitted and a fitted
//!   type (`Pipeline` / `FittedPipeline`, `RandomForestRegressor` /
//!   `FittedRandomForest`). Predicting with an unfitted stage does not compile.
//! - **Fit on training rows only**: imputation statistics and scaling
//!   parameters are learned from the training split and frozen before the
//!   test split or any inference input is transformed.
//! - **Reproducibility**: every random choice is driven by an explicit seed.
//!
//! ## Quick Start
//!
//! ```rust
//! use housing_pipeline::config::TrainingConfig;
//! use housing_pipeline::dataset::synthetic::boston_like;
//! use housing_pipeline::model::ForestConfig;
//! use housing_pipeline::training::train_on_dataset;
//!
//! let dataset = boston_like(120, 7).unwrap();
//! let config = TrainingConfig::default()
//!     .with_cv_folds(3)
//!     .with_forest(ForestConfig { n_estimators: 10, ..ForestConfig::default() });
//!
//! let model = train_on_dataset(&dataset, &config).unwrap();
//! assert_eq!(model.report.n_test, 24);
//! assert!(model.report.test_rmse.is_finite());
//! ```
//!
//! ## Module Structure
//!
//! - `dataset` - Schema, in-memory table and delimited-file loader
//! - `split` - Stratified and random train/test splits
//! - `preprocessing` - Imputer, scaler and the pipeline chaining them
//! - `model` - Decision tree and random-forest regressors
//! - `evaluation` - Regression metrics and k-fold cross-validation
//! - `store` - Versioned single-file model artifacts
//! - `inference` - Typed feature records and a load-once predictor
//! - `diagnostics` - Correlations and column summaries
//! - `training` - The end-to-end training flow driven by `config`

/// Training run settings loaded from JSON.
pub mod config;

/// Data loading utilities and dataset abstractions.
pub mod dataset;

/// Exploratory statistics over a dataset.
pub mod diagnostics;

pub mod error;

/// Regression metrics and cross-validation.
pub mod evaluation;

pub mod inference;

/// Regression models with an unfitted/fitted type split.
pub mod model;

/// Data preprocessing transformers for ML pipelines.
pub mod preprocessing;

/// Parameter serialization shared by fitted stages.
pub mod serialization;

/// Train/test splitting.
pub mod split;

pub mod store;

pub mod training;

pub use error::{HousingError, Result};

pub use config::{ModelKind, TrainingConfig};
pub use dataset::{Dataset, Schema};
pub use evaluation::{cross_validate, rmse, CvScores, CvStrategy};
pub use inference::{HousingFeatures, PredictorHandle, PricePredictor};
pub use model::{FittedRandomForest, FittedRegressor, RandomForestRegressor, Regressor};
pub use preprocessing::{FittedPipeline, Pipeline};
pub use split::{stratified_split, Split};
pub use store::ModelArtifact;
pub use training::{train, train_on_dataset, TrainedModel, TrainingReport};
