//! Inference surface.
//!
//! [`HousingFeatures`] is the strictly typed input record: thirteen named
//! predictors in the fixed Boston order. [`PricePredictor`] owns a fitted
//! pipeline and forest; [`PredictorHandle`] gives a process an explicit
//! load-once lifecycle around a predictor.
//!
//! # Example
//! ```no_run
//! use housing_pipeline::inference::{HousingFeatures, PredictorHandle};
//!
//! static PREDICTOR: PredictorHandle = PredictorHandle::new();
//!
//! PREDICTOR.load_from("model.bin")?;
//! let features = HousingFeatures::try_from(
//!     &[0.02731, 0.0, 7.07, 0.0, 0.469, 6.421, 78.9, 4.9671, 2.0, 242.0, 17.8, 396.9, 9.14][..],
//! )?;
//! let price = PREDICTOR.predict(&features)?;
//! println!("predicted MEDV: {:.2}", price);
//! # Ok::<(), housing_pipeline::HousingError>(())
//! ```

use crate::dataset::{Schema, BOSTON_FEATURES};
use crate::error::{HousingError, Result};
use crate::model::{FittedRandomForest, FittedRegressor};
use crate::preprocessing::FittedPipeline;
use crate::store::ModelArtifact;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;

/// One house described by the thirteen Boston predictors.
/// Serialized field names are the upper-case column names.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HousingFeatures {
    /// Per-capita crime rate by town.
    #[serde(rename = "CRIM")]
    pub crim: f64,
    /// Proportion of residential land zoned for lots over 25,000 sq. ft.
    #[serde(rename = "ZN")]
    pub zn: f64,
    /// Proportion of non-retail business acres per town.
    #[serde(rename = "INDUS")]
    pub indus: f64,
    /// Charles River dummy: 1 if the tract bounds the river, 0 otherwise.
    #[serde(rename = "CHAS")]
    pub chas: f64,
    /// Nitric oxides concentration (parts per 10 million).
    #[serde(rename = "NOX")]
    pub nox: f64,
    /// Average number of rooms per dwelling.
    #[serde(rename = "RM")]
    pub rm: f64,
    /// Proportion of owner-occupied units built prior to 1940.
    #[serde(rename = "AGE")]
    pub age: f64,
    /// Weighted distances to five Boston employment centres.
    #[serde(rename = "DIS")]
    pub dis: f64,
    /// Index of accessibility to radial highways.
    #[serde(rename = "RAD")]
    pub rad: f64,
    /// Full-value property-tax rate per $10,000.
    #[serde(rename = "TAX")]
    pub tax: f64,
    /// Pupil-teacher ratio by town.
    #[serde(rename = "PTRATIO")]
    pub ptratio: f64,
    /// `1000(Bk - 0.63)^2` where Bk is the proportion of Black residents by town.
    #[serde(rename = "B")]
    pub b: f64,
    /// Percentage of lower-status population.
    #[serde(rename = "LSTAT")]
    pub lstat: f64,
}

impl HousingFeatures {
    pub const LEN: usize = BOSTON_FEATURES.len();

    /// Values in [`BOSTON_FEATURES`] order.
    pub fn to_array(&self) -> [f64; 13] {
        [
            self.crim,
            self.zn,
            self.indus,
            self.chas,
            self.nox,
            self.rm,
            self.age,
            self.dis,
            self.rad,
            self.tax,
            self.ptratio,
            self.b,
            self.lstat,
        ]
    }

    /// Build from values in [`BOSTON_FEATURES`] order, validating them.
    pub fn from_array(values: [f64; 13]) -> Result<Self> {
        let [crim, zn, indus, chas, nox, rm, age, dis, rad, tax, ptratio, b, lstat] = values;
        let features = Self {
            crim,
            zn,
            indus,
            chas,
            nox,
            rm,
            age,
            dis,
            rad,
            tax,
            ptratio,
            b,
            lstat,
        };
        features.validate()?;
        Ok(features)
    }

    /// Every value finite and `CHAS` in `{0, 1}`.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in BOSTON_FEATURES.iter().zip(self.to_array()) {
            if !value.is_finite() {
                return Err(HousingError::InvalidInput(format!(
                    "{} must be a finite number, got {}",
                    name, value
                )));
            }
        }
        if self.chas != 0.0 && self.chas != 1.0 {
            return Err(HousingError::InvalidInput(format!(
                "CHAS must be 0 or 1, got {}",
                self.chas
            )));
        }
        Ok(())
    }
}

impl TryFrom<&[f64]> for HousingFeatures {
    type Error = HousingError;

    fn try_from(values: &[f64]) -> Result<Self> {
        let values: [f64; 13] = values.try_into().map_err(|_| {
            HousingError::schema(
                format!("{} values", Self::LEN),
                format!("{} values", values.len()),
            )
        })?;
        Self::from_array(values)
    }
}

fn to_matrix(records: &[HousingFeatures]) -> Result<Array2<f64>> {
    let flat: Vec<f64> = records.iter().flat_map(|r| r.to_array()).collect();
    Array2::from_shape_vec((records.len(), HousingFeatures::LEN), flat)
        .map_err(|e| HousingError::shape(format!("{} records", records.len()), e))
}

/// A loaded model answering price queries for [`HousingFeatures`].
#[derive(Clone, Debug)]
pub struct PricePredictor {
    pipeline: FittedPipeline,
    forest: FittedRandomForest,
}

impl PricePredictor {
    /// Wrap a pipeline fitted on the thirteen Boston predictors.
    ///
    /// # Errors
    /// `SchemaMismatch` if the pipeline was fitted on other columns.
    pub fn new(pipeline: FittedPipeline, forest: FittedRandomForest) -> Result<Self> {
        pipeline.schema().ensure_matches(&Schema::boston_features())?;
        let artifact = ModelArtifact::new(pipeline, forest)?;
        Ok(Self {
            pipeline: artifact.pipeline,
            forest: artifact.forest,
        })
    }

    /// Load a predictor from an artifact file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let artifact = ModelArtifact::load(path)?;
        Self::new(artifact.pipeline, artifact.forest)
    }

    /// Predicted median value (in $1000s) for one house.
    pub fn predict(&self, features: &HousingFeatures) -> Result<f64> {
        let predictions = self.predict_batch(std::slice::from_ref(features))?;
        predictions
            .first()
            .copied()
            .ok_or_else(|| HousingError::EmptyData("no prediction produced".to_string()))
    }

    /// One prediction per record, in input order.
    pub fn predict_batch(&self, records: &[HousingFeatures]) -> Result<Array1<f64>> {
        for record in records {
            record.validate()?;
        }
        if records.is_empty() {
            return Ok(Array1::zeros(0));
        }
        let x = self.pipeline.transform_matrix(&to_matrix(records)?)?;
        self.forest.predict(&x)
    }

    pub fn pipeline(&self) -> &FittedPipeline {
        &self.pipeline
    }

    pub fn forest(&self) -> &FittedRandomForest {
        &self.forest
    }
}

/// Holds at most one predictor for the lifetime of the handle.
///
/// Predicting before a predictor is installed fails with `NotFitted`;
/// installing a second predictor fails with `InvalidParameter`.
#[derive(Debug, Default)]
pub struct PredictorHandle {
    cell: OnceLock<PricePredictor>,
}

impl PredictorHandle {
    pub const fn new() -> Self {
        Self {
            cell: OnceLock::new(),
        }
    }

    /// Install a predictor.
    pub fn install(&self, predictor: PricePredictor) -> Result<&PricePredictor> {
        self.cell.set(predictor).map_err(|_| {
            HousingError::InvalidParameter("a predictor is already installed".to_string())
        })?;
        self.get()
    }

    /// Load an artifact and install it.
    pub fn load_from<P: AsRef<Path>>(&self, path: P) -> Result<&PricePredictor> {
        if self.is_ready() {
            return Err(HousingError::InvalidParameter(
                "a predictor is already installed".to_string(),
            ));
        }
        self.install(PricePredictor::load(path)?)
    }

    /// The installed predictor.
    pub fn get(&self) -> Result<&PricePredictor> {
        self.cell.get().ok_or_else(|| {
            HousingError::NotFitted("no predictor has been installed".to_string())
        })
    }

    pub fn is_ready(&self) -> bool {
        self.cell.get().is_some()
    }

    pub fn predict(&self, features: &HousingFeatures) -> Result<f64> {
        self.get()?.predict(features)
    }
}
