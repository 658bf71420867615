//! Price one property with a trained model bundle.

use anyhow::Context;
use clap::Parser;
use house_price_estimator::{logging, AreaType, PredictionService, PropertyInput};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "predict")]
#[command(about = "Estimate a house price from a trained model bundle")]
#[command(version)]
struct Cli {
    /// Trained model bundle
    #[arg(short, long, env = "HPE_MODEL", default_value = "model.hpeb")]
    model: PathBuf,

    /// List the recognised locations and area types, then exit
    #[arg(long)]
    list: bool,

    /// Total square footage
    #[arg(long, required_unless_present = "list")]
    sqft: Option<f64>,

    /// Bathrooms
    #[arg(long, default_value_t = 2)]
    bath: u32,

    /// Bedrooms (BHK)
    #[arg(long, default_value_t = 2)]
    bhk: u32,

    /// Balconies
    #[arg(long, default_value_t = 1)]
    balcony: u32,

    /// Location name
    #[arg(long, default_value = "other")]
    location: String,

    /// Area type, e.g. "Super built-up Area"
    #[arg(long, default_value = "Super built-up Area")]
    area_type: AreaType,

    /// Print the prediction as JSON
    #[arg(long)]
    json: bool,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let service: PredictionService = PredictionService::open(&cli.model)
        .with_context(|| format!("failed to load model bundle {}", cli.model.display()))?;

    if cli.list {
        println!("Locations:");
        for location in service.locations() {
            println!("  {}", location);
        }
        println!("Area types:");
        for area_type in service.area_types() {
            println!("  {}", area_type);
        }
        return Ok(());
    }

    let input = PropertyInput {
        total_sqft: cli.sqft.context("--sqft is required")?,
        bath: cli.bath,
        bhk: cli.bhk,
        balcony: cli.balcony,
        location: cli.location,
        area_type: cli.area_type,
    };
    let prediction = service.predict(&input)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&prediction)?);
    } else {
        println!("{}", prediction);
    }
    Ok(())
}
