//! End-to-end training run.
//!
//! Load → stratified split → fit pipeline on the training rows → fit the
//! configured model (forest or single tree) → score (train RMSE, cross-validation, held-out RMSE) → optionally save.

use crate::config::{ModelKind, TrainingConfig};
use crate::dataset::{load_dataset, Dataset, Schema};
use crate::error::{HousingError, Result};
use crate::evaluation::{cross_validate, r2_score, rmse, CvScores, CvStrategy};
use crate::inference::PricePredictor;
use crate::model::{
    DecisionTreeRegressor, FittedRandomForest, FittedRegressor, RandomForestRegressor, Regressor,
};
use crate::preprocessing::{FittedPipeline, Pipeline};
use crate::split::stratified_split;
use crate::store::ModelArtifact;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

/// Scores and bookkeeping of a training run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub model: ModelKind,
    pub n_train: usize,
    pub n_test: usize,
    /// RMSE of the fitted model on the rows it was fitted on.
    pub train_rmse: f64,
    /// Per-fold RMSE on the training rows; `None` when disabled.
    pub cross_validation: Option<CvScores>,
    /// RMSE on the held-out test rows.
    pub test_rmse: f64,
    pub test_r2: f64,
    /// Columns with zero variance in the training rows.
    pub degenerate_columns: Vec<String>,
    /// `(column, importance)` sorted by decreasing importance.
    pub feature_importances: Vec<(String, f64)>,
    pub artifact_path: Option<PathBuf>,
}

/// A fitted pipeline and forest with the report of the run that produced them.
///
/// A single decision tree is held as a one-tree forest.
#[derive(Clone, Debug)]
pub struct TrainedModel {
    pub pipeline: FittedPipeline,
    pub forest: FittedRandomForest,
    pub report: TrainingReport,
}

impl TrainedModel {
    /// Wrap the model for typed inference.
    ///
    /// # Errors
    /// `SchemaMismatch` unless the model was trained on the thirteen Boston predictors.
    pub fn into_predictor(self) -> Result<PricePredictor> {
        PricePredictor::new(self.pipeline, self.forest)
    }
}

/// Run the full training flow on the file named by `config.data_path`.
///
/// The file must hold the fourteen Boston columns.
pub fn train(config: &TrainingConfig) -> Result<TrainedModel> {
    config.validate()?;
    let path = config
        .data_path
        .as_ref()
        .ok_or_else(|| HousingError::Config("data_path is required for training".to_string()))?;
    let dataset = load_dataset(path, &Schema::boston(), &config.loader_options())?;
    train_on_dataset(&dataset, config)
}

/// Run the training flow on an in-memory dataset.
pub fn train_on_dataset(dataset: &Dataset, config: &TrainingConfig) -> Result<TrainedModel> {
    config.validate()?;
    let start = Instant::now();
    dataset.schema().require(&config.target)?;

    let split = stratified_split(dataset, &config.stratify_by, config.test_ratio, config.seed)?;
    let (train_features, train_labels) = split.train.features_and_labels(&config.target)?;
    let (test_features, test_labels) = split.test.features_and_labels(&config.target)?;

    if config.cv_folds > train_features.len() {
        return Err(HousingError::InvalidFoldCount {
            k: config.cv_folds,
            n_samples: train_features.len(),
        });
    }

    let (pipeline, train_x) =
        Pipeline::housing_default(config.impute_strategy).fit_transform(&train_features)?;
    info!(steps = ?pipeline.step_names(), rows = train_x.nrows(), "fitted preprocessing pipeline");

    let (forest, cross_validation) = match config.model {
        ModelKind::RandomForest => fit_and_validate(
            RandomForestRegressor::from_config(config.forest.clone()),
            &train_x,
            &train_labels,
            config.cv_folds,
        )?,
        ModelKind::DecisionTree => {
            let tree = DecisionTreeRegressor::from_config(config.forest.tree_config())
                .with_seed(config.forest.seed);
            let (fitted, scores) =
                fit_and_validate(tree, &train_x, &train_labels, config.cv_folds)?;
            (FittedRandomForest::from(fitted), scores)
        }
    };
    let train_rmse = rmse(&forest.predict(&train_x)?, &train_labels)?;
    info!(model = ?config.model, train_rmse, "scored training rows");

    let test_predictions = forest.predict(&pipeline.transform(&test_features)?)?;
    let test_rmse = rmse(&test_predictions, &test_labels)?;
    let test_r2 = r2_score(&test_predictions, &test_labels)?;
    info!(test_rmse, test_r2, "scored held-out rows");

    let mut feature_importances: Vec<(String, f64)> = pipeline
        .schema()
        .columns()
        .iter()
        .cloned()
        .zip(forest.feature_importances().to_vec())
        .collect();
    feature_importances.sort_by(|a, b| b.1.total_cmp(&a.1));

    if let Some(path) = &config.artifact_path {
        ModelArtifact::new(pipeline.clone(), forest.clone())?.save(path)?;
    }

    let report = TrainingReport {
        model: config.model,
        n_train: train_features.len(),
        n_test: test_features.len(),
        train_rmse,
        cross_validation,
        test_rmse,
        test_r2,
        degenerate_columns: pipeline.degenerate_columns(),
        feature_importances,
        artifact_path: config.artifact_path.clone(),
    };
    info!(
        elapsed_ms = start.elapsed().as_millis() as u64,
        "training run finished"
    );

    Ok(TrainedModel {
        pipeline,
        forest,
        report,
    })
}

/// Fit on all rows, then score `regressor` by k-fold CV when `cv_folds >= 2`.
fn fit_and_validate<R: Regressor>(
    regressor: R,
    x: &Array2<f64>,
    y: &Array1<f64>,
    cv_folds: usize,
) -> Result<(R::Fitted, Option<CvScores>)> {
    let fitted = regressor.fit(x, y)?;
    let scores = if cv_folds >= 2 {
        Some(cross_validate(
            || regressor.clone(),
            x,
            y,
            cv_folds,
            CvStrategy::Contiguous,
        )?)
    } else {
        None
    };
    Ok((fitted, scores))
}
