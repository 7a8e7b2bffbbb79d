//! Pipeline for chaining transformers.
//!
//! A Pipeline chains stages together, where the output of one stage becomes
//! the input to the next. Fitting captures the feature [`Schema`] of the
//! training data; the fitted pipeline only accepts data with that exact
//! schema (same names, same order).
//!
//! # Example
//! ```rust
//! use housing_pipeline::dataset::{Dataset, Schema};
//! use housing_pipeline::preprocessing::{ImputeStrategy, Pipeline};
//! use ndarray::array;
//!
//! let schema = Schema::new(["RM", "LSTAT"]).unwrap();
//! let train = Dataset::new(schema, array![[6.0, 4.0], [f64::NAN, 8.0], [7.0, 12.0]]).unwrap();
//!
//! let fitted = Pipeline::housing_default(ImputeStrategy::Median).fit(&train).unwrap();
//! let transformed = fitted.transform(&train).unwrap();
//! assert_eq!(transformed.shape(), &[3, 2]);
//! assert!(transformed.iter().all(|v| v.is_finite()));
//! ```

use crate::dataset::{Dataset, Schema};
use crate::error::{HousingError, Result};
use crate::preprocessing::imputation::{FittedSimpleImputer, ImputeStrategy, SimpleImputer, SimpleImputerParams};
use crate::preprocessing::scaling::{FittedStandardScaler, StandardScaler, StandardScalerParams};
use crate::preprocessing::traits::{check_n_features, FittedTransformer, Transformer};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A step in the unfitted pipeline.
#[derive(Clone, Debug)]
pub enum PipelineStep {
    SimpleImputer(SimpleImputer),
    StandardScaler(StandardScaler),
}

impl PipelineStep {
    fn fit(&self, data: &Array2<f64>) -> Result<FittedStep> {
        match self {
            PipelineStep::SimpleImputer(t) => t.fit(data).map(FittedStep::SimpleImputer),
            PipelineStep::StandardScaler(t) => t.fit(data).map(FittedStep::StandardScaler),
        }
    }
}

/// A fitted step of the pipeline.
#[derive(Clone, Debug)]
pub enum FittedStep {
    SimpleImputer(FittedSimpleImputer),
    StandardScaler(FittedStandardScaler),
}

impl FittedStep {
    /// Transform the data.
    pub fn transform_step(&self, data: &Array2<f64>) -> Result<Array2<f64>> {
        match self {
            FittedStep::SimpleImputer(t) => t.transform(data),
            FittedStep::StandardScaler(t) => t.transform(data),
        }
    }

    /// Inverse transform the data (if supported).
    pub fn inverse_transform_step(&self, data: &Array2<f64>) -> Result<Array2<f64>> {
        match self {
            FittedStep::SimpleImputer(t) => t.inverse_transform(data),
            FittedStep::StandardScaler(t) => t.inverse_transform(data),
        }
    }

    /// Get the step name for debugging.
    pub fn step_name(&self) -> &'static str {
        match self {
            FittedStep::SimpleImputer(_) => "SimpleImputer",
            FittedStep::StandardScaler(_) => "StandardScaler",
        }
    }

    fn n_features_in(&self) -> usize {
        match self {
            FittedStep::SimpleImputer(t) => t.n_features_in(),
            FittedStep::StandardScaler(t) => t.n_features_in(),
        }
    }

    fn params(&self) -> StepParams {
        match self {
            FittedStep::SimpleImputer(t) => StepParams::SimpleImputer(t.extract_params()),
            FittedStep::StandardScaler(t) => StepParams::StandardScaler(t.extract_params()),
        }
    }
}

/// Serializable parameters of one fitted step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum StepParams {
    SimpleImputer(SimpleImputerParams),
    StandardScaler(StandardScalerParams),
}

impl StepParams {
    fn restore(self) -> Result<FittedStep> {
        match self {
            StepParams::SimpleImputer(p) => {
                FittedSimpleImputer::from_params(p).map(FittedStep::SimpleImputer)
            }
            StepParams::StandardScaler(p) => {
                FittedStandardScaler::from_params(p).map(FittedStep::StandardScaler)
            }
        }
    }
}

/// Serializable representation of a fitted pipeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PipelineParams {
    /// Feature schema captured at fit time.
    pub schema: Schema,
    /// Step parameters in application order.
    pub steps: Vec<StepParams>,
}

/// Pipeline (unfitted).
#[derive(Clone, Debug, Default)]
pub struct Pipeline {
    steps: Vec<PipelineStep>,
}

impl Pipeline {
    /// Create a new empty pipeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Imputation followed by standard scaling.
    pub fn housing_default(strategy: ImputeStrategy) -> Self {
        Self::new()
            .add_simple_imputer(SimpleImputer::new(strategy))
            .add_standard_scaler(StandardScaler::new())
    }

    /// Add a SimpleImputer to the pipeline.
    pub fn add_simple_imputer(mut self, imputer: SimpleImputer) -> Self {
        self.steps.push(PipelineStep::SimpleImputer(imputer));
        self
    }

    /// Add a StandardScaler to the pipeline.
    pub fn add_standard_scaler(mut self, scaler: StandardScaler) -> Self {
        self.steps.push(PipelineStep::StandardScaler(scaler));
        self
    }

    /// Get the number of steps in the pipeline.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Check if the pipeline is empty.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Fit every step in order on the feature columns of `data`.
    ///
    /// # Errors
    /// - `InvalidParameter` if the pipeline has no steps
    /// - `EmptyData` if `data` has no rows
    /// - `EmptyColumn` (with the column's name) if the imputer finds an all-missing column
    pub fn fit(&self, data: &Dataset) -> Result<FittedPipeline> {
        Ok(self.fit_transform(data)?.0)
    }

    /// Fit the pipeline and return it together with the transformed training matrix.
    pub fn fit_transform(&self, data: &Dataset) -> Result<(FittedPipeline, Array2<f64>)> {
        if self.steps.is_empty() {
            return Err(HousingError::InvalidParameter(
                "Cannot fit an empty pipeline".to_string(),
            ));
        }
        if data.is_empty() {
            return Err(HousingError::EmptyData(
                "Cannot fit pipeline on empty data".to_string(),
            ));
        }

        let schema = data.schema().clone();
        let mut fitted_steps = Vec::with_capacity(self.steps.len());
        let mut current = data.data().clone();

        for step in &self.steps {
            let fitted = step.fit(&current).map_err(|e| name_column(e, &schema))?;
            current = fitted.transform_step(&current)?;
            debug!(step = fitted.step_name(), "fitted pipeline step");
            fitted_steps.push(fitted);
        }

        Ok((
            FittedPipeline {
                schema,
                steps: fitted_steps,
            },
            current,
        ))
    }
}

fn name_column(err: HousingError, schema: &Schema) -> HousingError {
    match err {
        HousingError::EmptyColumn { index, .. } => HousingError::EmptyColumn {
            index,
            name: schema
                .columns()
                .get(index)
                .cloned()
                .unwrap_or_else(|| format!("#{}", index)),
        },
        other => other,
    }
}

/// Fitted Pipeline ready for inference.
#[derive(Clone, Debug)]
pub struct FittedPipeline {
    schema: Schema,
    steps: Vec<FittedStep>,
}

impl FittedPipeline {
    /// Feature schema captured at fit time.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn steps(&self) -> &[FittedStep] {
        &self.steps
    }

    /// Get the number of steps in the pipeline.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Check if the pipeline is empty.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Get the names of all steps in the pipeline.
    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.step_name()).collect()
    }

    /// Transform a dataset whose schema equals the one captured at fit time.
    ///
    /// # Errors
    /// `SchemaMismatch` if column names or order differ.
    pub fn transform(&self, data: &Dataset) -> Result<Array2<f64>> {
        self.schema.ensure_matches(data.schema())?;
        self.transform_matrix(data.data())
    }

    /// Transform a bare matrix whose columns follow the fitted schema's order.
    ///
    /// # Errors
    /// - `NotFitted` if the pipeline has no fitted steps
    /// - `SchemaMismatch` if the column count differs
    pub fn transform_matrix(&self, data: &Array2<f64>) -> Result<Array2<f64>> {
        if self.steps.is_empty() {
            return Err(HousingError::NotFitted(
                "pipeline has no fitted steps".to_string(),
            ));
        }
        check_n_features(self.schema.len(), data)?;

        let mut result = data.clone();
        for step in &self.steps {
            result = step.transform_step(&result)?;
        }
        Ok(result)
    }

    /// Apply inverse transforms in reverse order.
    pub fn inverse_transform_matrix(&self, data: &Array2<f64>) -> Result<Array2<f64>> {
        check_n_features(self.schema.len(), data)?;

        let mut result = data.clone();
        for step in self.steps.iter().rev() {
            result = step.inverse_transform_step(&result)?;
        }
        Ok(result)
    }

    /// Names of the columns that a scaling step maps to a constant 0.
    pub fn degenerate_columns(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .steps
            .iter()
            .filter_map(|s| match s {
                FittedStep::StandardScaler(t) => Some(t.degenerate_columns()),
                FittedStep::SimpleImputer(_) => None,
            })
            .flatten()
            .filter_map(|i| self.schema.columns().get(i).cloned())
            .collect();
        names.dedup();
        names
    }
}

impl FittedTransformer for FittedPipeline {
    type Params = PipelineParams;

    fn transform(&self, data: &Array2<f64>) -> Result<Array2<f64>> {
        self.transform_matrix(data)
    }

    fn inverse_transform(&self, data: &Array2<f64>) -> Result<Array2<f64>> {
        self.inverse_transform_matrix(data)
    }

    fn extract_params(&self) -> Self::Params {
        PipelineParams {
            schema: self.schema.clone(),
            steps: self.steps.iter().map(FittedStep::params).collect(),
        }
    }

    /// Rebuild a pipeline, checking every step against the captured schema width.
    ///
    /// A parameter set with no steps restores to a pipeline whose transforms
    /// fail with `NotFitted`.
    fn from_params(params: Self::Params) -> Result<Self> {
        let width = params.schema.len();
        let mut steps = Vec::with_capacity(params.steps.len());
        for step in params.steps {
            let step = step.restore()?;
            if step.n_features_in() != width {
                return Err(HousingError::CorruptArtifact(format!(
                    "{} expects {} features but the schema has {}",
                    step.step_name(),
                    step.n_features_in(),
                    width
                )));
            }
            steps.push(step);
        }
        Ok(Self {
            schema: params.schema,
            steps,
        })
    }

    fn n_features_in(&self) -> usize {
        self.schema.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn train_set() -> Dataset {
        let schema = Schema::new(["A", "B", "C"]).unwrap();
        Dataset::new(
            schema,
            array![
                [1.0, 10.0, 5.0],
                [2.0, f64::NAN, 5.0],
                [3.0, 30.0, 5.0],
                [f64::NAN, 20.0, 5.0],
                [5.0, 40.0, 5.0]
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_pipeline_fit_transform() {
        let ds = train_set();
        let pipeline = Pipeline::housing_default(ImputeStrategy::Median);
        let (fitted, transformed) = pipeline.fit_transform(&ds).unwrap();

        assert_eq!(fitted.step_names(), vec!["SimpleImputer", "StandardScaler"]);
        assert_eq!(transformed, fitted.transform(&ds).unwrap());
        assert!(transformed.iter().all(|v| v.is_finite()));

        // each non-degenerate column is centered
        for col in 0..2 {
            let mean = transformed.column(col).sum() / transformed.nrows() as f64;
            assert!(mean.abs() < 1e-12);
        }
        assert!(transformed.column(2).iter().all(|&v| v == 0.0));
        assert_eq!(fitted.degenerate_columns(), vec!["C".to_string()]);
    }

    #[test]
    fn test_pipeline_imputes_with_training_median() {
        let ds = train_set();
        let fitted = Pipeline::new()
            .add_simple_imputer(SimpleImputer::default())
            .fit(&ds)
            .unwrap();
        let out = fitted.transform_matrix(&array![[f64::NAN, f64::NAN, 1.0]]).unwrap();
        // median of [1,2,3,5] and of [10,30,20,40]
        assert_eq!(out.row(0).to_vec(), vec![2.5, 25.0, 1.0]);
    }

    #[test]
    fn test_pipeline_schema_mismatch() {
        let fitted = Pipeline::housing_default(ImputeStrategy::Median)
            .fit(&train_set())
            .unwrap();

        let reordered = Dataset::new(
            Schema::new(["B", "A", "C"]).unwrap(),
            array![[1.0, 2.0, 3.0]],
        )
        .unwrap();
        assert!(matches!(
            fitted.transform(&reordered),
            Err(HousingError::SchemaMismatch { .. })
        ));
        assert!(matches!(
            fitted.transform_matrix(&array![[1.0, 2.0]]),
            Err(HousingError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn test_pipeline_empty_column_is_named() {
        let schema = Schema::new(["A", "GAP"]).unwrap();
        let ds = Dataset::new(schema, array![[1.0, f64::NAN], [2.0, f64::NAN]]).unwrap();
        match Pipeline::housing_default(ImputeStrategy::Median).fit(&ds) {
            Err(HousingError::EmptyColumn { index, name }) => {
                assert_eq!(index, 1);
                assert_eq!(name, "GAP");
            }
            other => panic!("expected EmptyColumn, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_pipeline_cannot_fit() {
        assert!(matches!(
            Pipeline::new().fit(&train_set()),
            Err(HousingError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_pipeline_params_round_trip() {
        let ds = train_set();
        let fitted = Pipeline::housing_default(ImputeStrategy::Median)
            .fit(&ds)
            .unwrap();
        let restored = FittedPipeline::from_params(fitted.extract_params()).unwrap();

        assert_eq!(restored.schema(), fitted.schema());
        assert_eq!(
            restored.transform(&ds).unwrap(),
            fitted.transform(&ds).unwrap()
        );
    }

    #[test]
    fn test_restored_empty_pipeline_is_not_fitted() {
        let params = PipelineParams {
            schema: Schema::new(["A"]).unwrap(),
            steps: Vec::new(),
        };
        let restored = FittedPipeline::from_params(params).unwrap();
        assert!(matches!(
            restored.transform_matrix(&array![[1.0]]),
            Err(HousingError::NotFitted(_))
        ));
    }

    #[test]
    fn test_from_params_rejects_width_disagreement() {
        let fitted = Pipeline::housing_default(ImputeStrategy::Median)
            .fit(&train_set())
            .unwrap();
        let mut params = fitted.extract_params();
        params.schema = Schema::new(["A", "B"]).unwrap();
        assert!(matches!(
            FittedPipeline::from_params(params),
            Err(HousingError::CorruptArtifact(_))
        ));
    }

    #[test]
    fn test_pipeline_inverse_stops_at_imputer() {
        let ds = train_set();
        let fitted = Pipeline::housing_default(ImputeStrategy::Median)
            .fit(&ds)
            .unwrap();
        let z = fitted.transform(&ds).unwrap();
        // scaler inverts, imputer does not
        assert!(matches!(
            fitted.inverse_transform_matrix(&z),
            Err(HousingError::InvalidParameter(_))
        ));
    }
}
