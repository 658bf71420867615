//! Training configuration.
//!
//! Every field has a default equal to the constant the cleaning and search
//! stages have always used, so an empty TOML file (or no file at all) gives
//! the reference behaviour.
//!
//! ```toml
//! min_location_support = 10
//! min_sqft_per_bhk = 300.0
//! test_size = 0.2
//!
//! [grid]
//! learning_rates = [0.05, 0.1]
//! ```

use crate::error::{PricingError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Hyperparameter grid explored by [`crate::search::GridSearch`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchGrid {
    /// Gradient descent step sizes.
    pub learning_rates: Vec<f64>,
    /// Passes over the training split.
    pub epochs: Vec<usize>,
    /// L2 penalty strengths (0.0 disables the penalty).
    pub l2: Vec<f64>,
}

impl Default for SearchGrid {
    fn default() -> Self {
        Self {
            learning_rates: vec![0.05, 0.1],
            epochs: vec![100, 200],
            l2: vec![0.0, 0.001],
        }
    }
}

impl SearchGrid {
    /// Number of candidate configurations in the grid.
    pub fn len(&self) -> usize {
        self.learning_rates.len() * self.epochs.len() * self.l2.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Configuration of one training run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Locations seen fewer times than this are collapsed into `"other"`.
    pub min_location_support: usize,
    /// Listings with less area per bedroom than this are dropped as outliers.
    pub min_sqft_per_bhk: f64,
    /// Fraction of cleaned rows held out for the final evaluation.
    pub test_size: f64,
    /// Seed of the train/test shuffle.
    pub seed: u64,
    /// Folds used to score each grid candidate.
    pub cv_folds: usize,
    /// Mini-batch size of the gradient descent trainer.
    pub batch_size: usize,
    pub grid: SearchGrid,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_location_support: 10,
            min_sqft_per_bhk: 300.0,
            test_size: 0.2,
            seed: 42,
            cv_folds: 5,
            batch_size: 32,
            grid: SearchGrid::default(),
        }
    }
}

impl PipelineConfig {
    /// Parse a configuration from TOML text. Missing keys keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML configuration file.
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(PricingError::InvalidParameter(format!(
                "test_size must be in (0, 1), got {}",
                self.test_size
            )));
        }
        if self.cv_folds < 2 {
            return Err(PricingError::InvalidParameter(format!(
                "cv_folds must be at least 2, got {}",
                self.cv_folds
            )));
        }
        if self.batch_size == 0 {
            return Err(PricingError::InvalidParameter(
                "batch_size must be positive".to_string(),
            ));
        }
        if !self.min_sqft_per_bhk.is_finite() || self.min_sqft_per_bhk < 0.0 {
            return Err(PricingError::InvalidParameter(format!(
                "min_sqft_per_bhk must be a non-negative number, got {}",
                self.min_sqft_per_bhk
            )));
        }
        if self.grid.is_empty() {
            return Err(PricingError::InvalidParameter(
                "search grid has no candidates".to_string(),
            ));
        }
        if let Some(lr) = self
            .grid
            .learning_rates
            .iter()
            .find(|lr| !(lr.is_finite() && **lr > 0.0))
        {
            return Err(PricingError::InvalidParameter(format!(
                "learning rate must be positive, got {}",
                lr
            )));
        }
        if let Some(l2) = self.grid.l2.iter().find(|l2| !(l2.is_finite() && **l2 >= 0.0)) {
            return Err(PricingError::InvalidParameter(format!(
                "l2 strength must be non-negative, got {}",
                l2
            )));
        }
        Ok(())
    }
}
