//! # housing
//!
//! Command-line interface for the housing price pipeline.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use housing_pipeline::dataset::{load_dataset, LoaderOptions, Schema, BOSTON_TARGET};
use housing_pipeline::diagnostics::{correlation_matrix, describe};
use housing_pipeline::inference::{HousingFeatures, PricePredictor};
use housing_pipeline::training::train;
use housing_pipeline::TrainingConfig;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "housing")]
#[command(about = "Boston housing price regression", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fit the pipeline and forest, print the training report as JSON
    Train {
        /// JSON training configuration
        #[arg(short, long, conflicts_with = "data", required_unless_present = "data")]
        config: Option<PathBuf>,

        /// Data file with the fourteen Boston columns (default settings)
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// Where to save the fitted model (overrides the configuration)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Predict the median value of one house
    Predict {
        /// Model artifact written by `train`
        #[arg(short, long)]
        model: PathBuf,

        /// Thirteen comma-separated predictor values in Boston column order
        #[arg(short, long, allow_hyphen_values = true)]
        features: String,
    },

    /// Print summary statistics and correlations with the target
    Describe {
        /// Data file with the fourteen Boston columns
        #[arg(short, long)]
        data: PathBuf,
    },
}

fn parse_features(text: &str) -> Result<HousingFeatures> {
    let values = text
        .split(',')
        .map(|field| {
            let field = field.trim();
            field
                .parse::<f64>()
                .with_context(|| format!("'{}' is not a number", field))
        })
        .collect::<Result<Vec<f64>>>()?;
    Ok(HousingFeatures::try_from(values.as_slice())?)
}

fn run_train(config: Option<PathBuf>, data: Option<PathBuf>, out: Option<PathBuf>) -> Result<()> {
    let mut config = match (config, data) {
        (Some(path), _) => TrainingConfig::from_json_file(&path)
            .with_context(|| format!("reading configuration {}", path.display()))?,
        (None, Some(data)) => TrainingConfig::default().with_data_path(data),
        (None, None) => anyhow::bail!("either --config or --data is required"),
    };
    if let Some(out) = out {
        config = config.with_artifact_path(out);
    }

    let model = train(&config).context("training failed")?;
    println!("{}", serde_json::to_string_pretty(&model.report)?);
    Ok(())
}

fn run_predict(model: PathBuf, features: &str) -> Result<()> {
    let features = parse_features(features)?;
    let predictor = PricePredictor::load(&model)
        .with_context(|| format!("loading model {}", model.display()))?;
    let price = predictor.predict(&features)?;
    println!("{:.4}", price);
    Ok(())
}

fn run_describe(data: PathBuf) -> Result<()> {
    let dataset = load_dataset(&data, &Schema::boston(), &LoaderOptions::default())
        .with_context(|| format!("loading {}", data.display()))?;

    println!(
        "{:<8} {:>6} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10}",
        "column", "count", "mean", "std", "min", "25%", "50%", "75%", "max"
    );
    for s in describe(&dataset) {
        println!(
            "{:<8} {:>6} {:>10.4} {:>10.4} {:>10.4} {:>10.4} {:>10.4} {:>10.4} {:>10.4}",
            s.name, s.count, s.mean, s.std, s.min, s.q25, s.median, s.q75, s.max
        );
    }

    println!();
    println!("correlation with {}:", BOSTON_TARGET);
    for (column, r) in correlation_matrix(&dataset).column_ranking(BOSTON_TARGET)? {
        println!("{:<8} {:>8.4}", column, r);
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Train { config, data, out } => run_train(config, data, out),
        Commands::Predict { model, features } => run_predict(model, &features),
        Commands::Describe { data } => run_describe(data),
    }
}
