//! Offline training run: CSV in, model bundle out.
//!
//! load → clean → schema → encode → split → grid search → refit → evaluate → save

use crate::bundle::ModelBundle;
use crate::cleaning::{CleaningReport, Cleaner};
use crate::config::PipelineConfig;
use crate::dataset::{load_raw_records, train_test_split, InMemoryDataset, RawRecord};
use crate::encoding::FeatureEncoder;
use crate::error::{PricingError, Result};
use crate::metrics::RegressionMetrics;
use crate::model::{Estimator, FittedLinearRegressor, LinearRegressor, Regressor};
use crate::schema::FeatureSchema;
use crate::search::{GridSearch, SearchOutcome};
use ndarray::Array1;
use serde::Serialize;
use std::path::Path;

/// Everything a training run measured, serializable to JSON.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TrainingReport {
    pub cleaning: CleaningReport,
    pub n_features: usize,
    pub n_locations: usize,
    pub train_rows: usize,
    pub test_rows: usize,
    pub search: SearchOutcome,
    pub best_params: LinearRegressor,
    pub train: RegressionMetrics,
    pub test: RegressionMetrics,
}

impl TrainingReport {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// One configured training run.
#[derive(Clone, Debug, Default)]
pub struct TrainingRun {
    config: PipelineConfig,
}

impl TrainingRun {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Train on the CSV at `data` and write the bundle to `out`.
    pub fn run<P: AsRef<Path>, Q: AsRef<Path>>(&self, data: P, out: Q) -> Result<TrainingReport> {
        let raw = load_raw_records(data)?;
        let (bundle, report) = self.fit(&raw)?;
        bundle.save(out)?;
        Ok(report)
    }

    /// Train on already-loaded listings without touching the filesystem.
    pub fn fit(&self, raw: &[RawRecord]) -> Result<(ModelBundle, TrainingReport)> {
        let corpus = Cleaner::from_config(&self.config).clean(raw);
        if corpus.records.is_empty() {
            return Err(PricingError::EmptyData(
                "no listings survived cleaning".to_string(),
            ));
        }
        tracing::info!(
            rows = corpus.records.len(),
            locations = corpus.locations.frequent().count(),
            "training corpus ready"
        );

        let schema = FeatureSchema::from_records(&corpus.records)?;
        let x = FeatureEncoder::new(&schema).encode_batch(&corpus.records)?;
        let y: Array1<f64> = corpus.records.iter().map(|r| r.price).collect();
        let dataset = InMemoryDataset::new(x, y)?;

        let (train_idx, test_idx) =
            train_test_split(corpus.records.len(), self.config.test_size, self.config.seed)?;
        let train = dataset.select(&train_idx)?;
        let test = dataset.select(&test_idx)?;
        tracing::info!(
            train = train_idx.len(),
            test = test_idx.len(),
            features = schema.len(),
            "split dataset"
        );

        let search = GridSearch::from_config(&self.config).run(&train)?;
        let model: FittedLinearRegressor = search.best.fit(train.features(), train.targets())?;

        let train_metrics =
            RegressionMetrics::calculate(train.targets(), &model.predict(train.features())?)?;
        let test_metrics =
            RegressionMetrics::calculate(test.targets(), &model.predict(test.features())?)?;
        tracing::info!(
            train_r2 = train_metrics.r2,
            test_r2 = test_metrics.r2,
            test_mae = test_metrics.mae,
            "evaluated best model"
        );

        let report = TrainingReport {
            cleaning: corpus.report,
            n_features: schema.len(),
            n_locations: schema.known_values(crate::schema::CategoricalField::Location).len(),
            train_rows: train_idx.len(),
            test_rows: test_idx.len(),
            best_params: search.best,
            search,
            train: train_metrics,
            test: test_metrics,
        };
        let bundle = ModelBundle::new(model, schema)?;
        Ok((bundle, report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SearchGrid;

    fn listing(location: &str, bhk: u32, sqft: f64, bath: f64) -> RawRecord {
        let premium = if location == "Whitefield" { 20.0 } else { 0.0 };
        RawRecord {
            area_type: Some("Super built-up  Area".into()),
            availability: Some("Ready To Move".into()),
            location: Some(location.into()),
            size: Some(format!("{} BHK", bhk)),
            society: None,
            total_sqft: Some(sqft.to_string()),
            bath: Some(bath),
            balcony: Some(1.0),
            price: Some(0.05 * sqft + 10.0 * bath + premium),
        }
    }

    fn corpus() -> Vec<RawRecord> {
        let mut rows = Vec::new();
        for i in 0..30 {
            let sqft = 800.0 + 25.0 * i as f64;
            rows.push(listing("Whitefield", 2, sqft, (i % 3 + 1) as f64));
            rows.push(listing("Hebbal", 2, sqft + 10.0, (i % 2 + 1) as f64));
        }
        rows.push(listing("Rareville", 2, 1000.0, 2.0));
        rows
    }

    fn quick_config() -> PipelineConfig {
        PipelineConfig {
            cv_folds: 3,
            grid: SearchGrid {
                learning_rates: vec![0.1],
                epochs: vec![20, 60],
                l2: vec![0.0],
            },
            ..PipelineConfig::default()
        }
    }

    #[test]
    fn test_fit_builds_consistent_bundle() {
        let run = TrainingRun::new(quick_config()).unwrap();
        let (bundle, report) = run.fit(&corpus()).unwrap();

        assert_eq!(bundle.model().n_features(), bundle.schema().len());
        assert_eq!(report.n_features, bundle.schema().len());
        assert_eq!(report.cleaning.kept, 61);
        assert_eq!(report.train_rows + report.test_rows, 61);
        assert_eq!(report.test_rows, 13);
        assert_eq!(report.search.scores.len(), 2);
        assert!(bundle.schema().position("location_Whitefield").is_some());
        assert!(bundle.schema().position("location_other").is_some());
        assert!(bundle.schema().position("location_Rareville").is_none());
    }

    #[test]
    fn test_fit_is_deterministic() {
        let run = TrainingRun::new(quick_config()).unwrap();
        let (a, _) = run.fit(&corpus()).unwrap();
        let (b, _) = run.fit(&corpus()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_report_serializes_to_json() {
        let run = TrainingRun::new(quick_config()).unwrap();
        let (_, report) = run.fit(&corpus()).unwrap();
        let json = report.to_json().unwrap();
        assert!(json.contains("\"best_params\""));
        assert!(json.contains("\"cleaning\""));
    }

    #[test]
    fn test_everything_filtered_is_empty_data() {
        let mut rows = corpus();
        for row in &mut rows {
            row.price = None;
        }
        let run = TrainingRun::new(quick_config()).unwrap();
        assert!(matches!(run.fit(&rows), Err(PricingError::EmptyData(_))));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = PipelineConfig {
            test_size: 1.5,
            ..PipelineConfig::default()
        };
        assert!(TrainingRun::new(config).is_err());
    }
}
