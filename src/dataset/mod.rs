//! Dataset abstractions for the housing pipeline.
//!
//! # Core Concepts
//!
//! - **Schema**: An ordered list of column names. Order is significant: the
//!   regressor consumes a flat ordered vector, not a mapping.
//! - **Dataset**: A dense row-major table of `f64` cells sharing one schema.
//!   Missing cells are `NaN`; the target column is present only in labeled data.
//! - **Loader**: Reads comma- or whitespace-delimited files into a `Dataset`.
//!
//! # Example
//!
//! ```rust
//! use housing_pipeline::dataset::{read_dataset, LoaderOptions, Schema};
//!
//! let schema = Schema::new(["RM", "MEDV"]).unwrap();
//! let text = "RM,MEDV\n6.5,24.0\n5.9,\n";
//! let dataset = read_dataset(text.as_bytes(), &schema, &LoaderOptions::default()).unwrap();
//!
//! assert_eq!(dataset.len(), 2);
//! assert_eq!(dataset.missing_count(), 1);
//! ```

pub mod loader;
pub mod schema;
pub mod synthetic;
pub mod table;

pub use self::loader::{load_dataset, read_dataset, Delimiter, HeaderMode, LoaderOptions};
pub use self::schema::{Schema, BOSTON_FEATURES, BOSTON_TARGET, CHAS};
pub use self::table::Dataset;
