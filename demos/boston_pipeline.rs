//! End-to-end pipeline example: Boston housing prices
//!
//! This example walks through every stage by hand:
//! - Boston-like synthetic data with missing values
//! - Stratified train/test split on the river dummy (CHAS)
//! - Median imputation and standard scaling fitted on the training rows
//! - Random-forest training and 5-fold cross-validation
//! - Saving the model to one artifact file and loading it back
//! - Typed inference on a new house
//!
//! Run with: cargo run --example boston_pipeline

use housing_pipeline::{
    dataset::synthetic::{boston_like, with_missing},
    diagnostics::correlation_matrix,
    evaluation::{cross_validate, r2_score, rmse, CvStrategy},
    inference::{HousingFeatures, PricePredictor},
    model::{FittedRegressor, MaxFeatures, RandomForestRegressor, Regressor},
    preprocessing::{ImputeStrategy, Pipeline},
    split::stratified_split,
    store,
};
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    println!("=== Boston Housing Pipeline ===\n");

    // 1. Data: 506 rows like the original survey, with some rooms counts missing
    let dataset = with_missing(&boston_like(506, 42)?, "RM", 0.05, 7)?;
    println!(
        "Dataset: {} rows, {} columns, {} missing cells",
        dataset.len(),
        dataset.n_columns(),
        dataset.missing_count()
    );

    let ranking = correlation_matrix(&dataset).column_ranking("MEDV")?;
    println!("Strongest positive correlate of MEDV: {}", ranking[1].0);

    // 2. Split, preserving the CHAS proportions
    let split = stratified_split(&dataset, "CHAS", 0.2, 42)?;
    println!(
        "\nSplit: {} train / {} test rows",
        split.train.len(),
        split.test.len()
    );
    let (train_features, train_labels) = split.train.features_and_labels("MEDV")?;
    let (test_features, test_labels) = split.test.features_and_labels("MEDV")?;

    // 3. Preprocessing, fitted on training rows only
    println!("\nFitting preprocessing pipeline...");
    let (pipeline, x_train) =
        Pipeline::housing_default(ImputeStrategy::Median).fit_transform(&train_features)?;
    println!("  Steps: {:?}", pipeline.step_names());

    // 4. Forest
    println!("\nTraining random forest...");
    let regressor = RandomForestRegressor::new()
        .with_n_estimators(100)
        .with_max_features(MaxFeatures::Sqrt)
        .with_seed(42);
    let forest = regressor.fit(&x_train, &train_labels)?;
    println!("  Trees: {}", forest.n_trees());
    println!(
        "  Train RMSE: {:.3}",
        rmse(&forest.predict(&x_train)?, &train_labels)?
    );

    // 5. Cross-validation on the training rows
    let scores = cross_validate(
        || regressor.clone(),
        &x_train,
        &train_labels,
        5,
        CvStrategy::Contiguous,
    )?;
    println!(
        "  CV RMSE: {:.3} +/- {:.3} over {} folds",
        scores.mean(),
        scores.std(),
        scores.len()
    );

    // 6. Held-out evaluation
    let test_predictions = forest.predict(&pipeline.transform(&test_features)?)?;
    println!("\nTest RMSE: {:.3}", rmse(&test_predictions, &test_labels)?);
    println!("Test R2:   {:.3}", r2_score(&test_predictions, &test_labels)?);

    // 7. Persist and reload
    let path = std::env::temp_dir().join("boston_pipeline_example.bin");
    store::save(&pipeline, &forest, &path)?;
    println!("\nSaved model to {}", path.display());

    let predictor = PricePredictor::load(&path)?;

    // 8. Inference on a new house
    let house = HousingFeatures {
        crim: 0.02731,
        zn: 0.0,
        indus: 7.07,
        chas: 0.0,
        nox: 0.469,
        rm: 6.421,
        age: 78.9,
        dis: 4.9671,
        rad: 2.0,
        tax: 242.0,
        ptratio: 17.8,
        b: 396.9,
        lstat: 9.14,
    };
    println!("Predicted MEDV: {:.2} ($1000s)", predictor.predict(&house)?);

    std::fs::remove_file(&path)?;
    println!("\n=== Done ===");
    Ok(())
}
