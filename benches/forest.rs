use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use housing_pipeline::{
    dataset::synthetic::boston_like,
    model::{FittedRandomForest, FittedRegressor, RandomForestRegressor, Regressor},
    preprocessing::{FittedPipeline, ImputeStrategy, Pipeline},
};
use ndarray::{Array1, Array2};

/// Preprocessed Boston-like training matrix and labels
fn training_data(n_rows: usize) -> (FittedPipeline, Array2<f64>, Array1<f64>) {
    let (features, labels) = boston_like(n_rows, 42)
        .expect("Failed to generate dataset")
        .features_and_labels("MEDV")
        .expect("Failed to split labels");
    let (pipeline, x) = Pipeline::housing_default(ImputeStrategy::Median)
        .fit_transform(&features)
        .expect("Failed to fit pipeline");
    (pipeline, x, labels)
}

fn train_forest(x: &Array2<f64>, y: &Array1<f64>) -> FittedRandomForest {
    RandomForestRegressor::new()
        .with_n_estimators(100)
        .fit(x, y)
        .expect("Failed to fit forest")
}

fn bench_fit(c: &mut Criterion) {
    let (_, x, y) = training_data(404);

    let mut group = c.benchmark_group("forest_fit");
    group.sample_size(10);
    for n_estimators in [10, 100].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(n_estimators),
            n_estimators,
            |b, &n_estimators| {
                let regressor = RandomForestRegressor::new().with_n_estimators(n_estimators);
                b.iter(|| {
                    let forest = regressor.fit(black_box(&x), black_box(&y));
                    black_box(forest)
                });
            },
        );
    }
    group.finish();
}

fn bench_predict_single(c: &mut Criterion) {
    let (pipeline, x, y) = training_data(404);
    let forest = train_forest(&x, &y);
    let raw = boston_like(1, 7)
        .expect("Failed to generate dataset")
        .features_and_labels("MEDV")
        .expect("Failed to split labels")
        .0;

    c.bench_function("predict_single", |b| {
        b.iter(|| {
            let row = pipeline.transform(black_box(&raw)).expect("transform");
            black_box(forest.predict(&row))
        });
    });
}

fn bench_predict_batch(c: &mut Criterion) {
    let (_, x, y) = training_data(404);
    let forest = train_forest(&x, &y);

    for batch_size in [10, 100, 1000].iter() {
        let (_, batch, _) = training_data(*batch_size);
        c.bench_with_input(
            BenchmarkId::new("predict_batch", batch_size),
            &batch,
            |b, batch| {
                b.iter(|| black_box(forest.predict(black_box(batch))));
            },
        );
    }
}

criterion_group!(benches, bench_fit, bench_predict_single, bench_predict_batch);
criterion_main!(benches);
