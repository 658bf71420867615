//! Offline training: CSV of listings in, model bundle out.

use anyhow::Context;
use clap::Parser;
use house_price_estimator::{logging, PipelineConfig, TrainingRun};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "train")]
#[command(about = "Train the house price model and write a model bundle")]
#[command(version)]
struct Cli {
    /// Training CSV (area_type, availability, location, size, society,
    /// total_sqft, bath, balcony, price)
    #[arg(short, long)]
    data: PathBuf,

    /// Output bundle file
    #[arg(short, long, default_value = "model.hpeb")]
    out: PathBuf,

    /// TOML configuration; missing keys keep their defaults
    #[arg(short, long, env = "HPE_CONFIG")]
    config: Option<PathBuf>,

    /// Also write the training report as JSON
    #[arg(long)]
    report: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let config = match &cli.config {
        Some(path) => PipelineConfig::from_toml_file(path)
            .with_context(|| format!("failed to read config {}", path.display()))?,
        None => PipelineConfig::default(),
    };

    let report = TrainingRun::new(config)?
        .run(&cli.data, &cli.out)
        .with_context(|| format!("training on {} failed", cli.data.display()))?;

    println!(
        "Kept {} of {} listings, {} features",
        report.cleaning.kept, report.cleaning.raw_rows, report.n_features
    );
    println!(
        "Best: lr={} epochs={} l2={} (cv R² {:.4})",
        report.best_params.learning_rate,
        report.best_params.epochs,
        report.best_params.l2,
        report.search.best_score
    );
    println!(
        "Train R² {:.4} | Test R² {:.4} | Test MAE {:.2}",
        report.train.r2, report.test.r2, report.test.mae
    );
    println!("Model saved to {}", cli.out.display());

    if let Some(path) = &cli.report {
        std::fs::write(path, report.to_json()?)
            .with_context(|| format!("failed to write report {}", path.display()))?;
    }
    Ok(())
}
