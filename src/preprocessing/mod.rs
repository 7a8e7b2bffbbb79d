//! Data preprocessing for the housing pipeline.
//!
//! Stages follow a type-state pattern: an unfitted transformer holds only
//! hyperparameters, and [`Transformer::fit`] returns a distinct fitted type
//! that holds frozen parameters. Transforming before fitting is therefore not
//! expressible.
//!
//! # Core Traits
//!
//! - [`Transformer`]: Unfitted transformer with hyperparameters
//! - [`FittedTransformer`]: Fitted transformer ready for inference
//!
//! # Stages
//!
//! - [`SimpleImputer`]: Fill missing values (median by default)
//! - [`StandardScaler`]: Z-score normalization with population std
//! - [`Pipeline`]: Imputer and scaler chained, bound to a feature [`Schema`](crate::dataset::Schema)
//!
//! # Example
//!
//! ```rust
//! use housing_pipeline::dataset::synthetic::boston_like;
//! use housing_pipeline::preprocessing::{FittedPipeline, FittedTransformer, ImputeStrategy, Pipeline};
//!
//! let (features, _labels) = boston_like(40, 1).unwrap().features_and_labels("MEDV").unwrap();
//! let fitted = Pipeline::housing_default(ImputeStrategy::Median).fit(&features).unwrap();
//!
//! // Parameters round-trip exactly.
//! let restored = FittedPipeline::from_params(fitted.extract_params()).unwrap();
//! assert_eq!(restored.transform(&features).unwrap(), fitted.transform(&features).unwrap());
//! ```

pub mod imputation;
pub mod pipeline;
pub mod scaling;
pub mod traits;

pub use imputation::{FittedSimpleImputer, ImputeStrategy, SimpleImputer, SimpleImputerParams};
pub use pipeline::{FittedPipeline, FittedStep, Pipeline, PipelineParams, PipelineStep, StepParams};
pub use scaling::{FittedStandardScaler, StandardScaler, StandardScalerParams};
pub use traits::{FittedTransformer, Transformer};
