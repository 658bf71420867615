//! Cross-validated grid search over the regressor's hyperparameters.

use crate::config::{PipelineConfig, SearchGrid};
use crate::dataset::{k_fold, InMemoryDataset};
use crate::error::{PricingError, Result};
use crate::metrics;
use crate::model::{Estimator, LinearRegressor, Regressor};
use serde::{Deserialize, Serialize};

/// Cross-validation result of one grid candidate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CandidateScore {
    pub params: LinearRegressor,
    /// R² on each validation fold; empty if training diverged.
    pub fold_scores: Vec<f64>,
    /// Mean validation R²; `-inf` if training diverged.
    pub mean_r2: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchOutcome {
    pub best: LinearRegressor,
    pub best_score: f64,
    /// Every candidate, in grid order.
    pub scores: Vec<CandidateScore>,
}

/// R² of `estimator` on each of `folds` contiguous validation folds.
pub fn cross_validate<E: Estimator>(
    estimator: &E,
    dataset: &InMemoryDataset,
    folds: usize,
) -> Result<Vec<f64>> {
    let n = dataset.features().nrows();
    k_fold(n, folds)?
        .into_iter()
        .map(|(train_idx, valid_idx)| {
            let train = dataset.select(&train_idx)?;
            let valid = dataset.select(&valid_idx)?;
            let fitted = estimator.fit(train.features(), train.targets())?;
            let predictions = fitted.predict(valid.features())?;
            metrics::r2(valid.targets(), &predictions)
        })
        .collect()
}

/// Exhaustive search over a [`SearchGrid`], scored by mean K-fold R².
///
/// The first candidate in grid order wins ties.
#[derive(Clone, Debug)]
pub struct GridSearch {
    grid: SearchGrid,
    cv_folds: usize,
    batch_size: usize,
}

impl GridSearch {
    pub fn new(grid: SearchGrid, cv_folds: usize) -> Self {
        Self {
            grid,
            cv_folds,
            batch_size: 32,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.grid.clone(), config.cv_folds).with_batch_size(config.batch_size)
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Every grid combination; learning rate varies slowest, L2 fastest.
    pub fn candidates(&self) -> Vec<LinearRegressor> {
        let mut candidates = Vec::with_capacity(self.grid.len());
        for &learning_rate in &self.grid.learning_rates {
            for &epochs in &self.grid.epochs {
                for &l2 in &self.grid.l2 {
                    candidates.push(
                        LinearRegressor::new(learning_rate, epochs, l2)
                            .with_batch_size(self.batch_size),
                    );
                }
            }
        }
        candidates
    }

    pub fn run(&self, dataset: &InMemoryDataset) -> Result<SearchOutcome> {
        let candidates = self.candidates();
        if candidates.is_empty() {
            return Err(PricingError::InvalidParameter(
                "search grid is empty".to_string(),
            ));
        }

        let mut scores = Vec::with_capacity(candidates.len());
        let mut best: Option<(LinearRegressor, f64)> = None;

        for params in candidates {
            let fold_scores = match cross_validate(&params, dataset, self.cv_folds) {
                Ok(fold_scores) => fold_scores,
                Err(PricingError::TrainingDiverged { epoch }) => {
                    tracing::warn!(?params, epoch, "candidate diverged, skipping");
                    Vec::new()
                }
                Err(e) => return Err(e),
            };
            let mean_r2 = if fold_scores.is_empty() {
                f64::NEG_INFINITY
            } else {
                fold_scores.iter().sum::<f64>() / fold_scores.len() as f64
            };
            tracing::debug!(
                learning_rate = params.learning_rate,
                epochs = params.epochs,
                l2 = params.l2,
                mean_r2,
                "scored candidate"
            );

            if mean_r2.is_finite() && best.map_or(true, |(_, score)| mean_r2 > score) {
                best = Some((params, mean_r2));
            }
            scores.push(CandidateScore {
                params,
                fold_scores,
                mean_r2,
            });
        }

        let (best, best_score) = best.ok_or_else(|| {
            PricingError::InvalidParameter(
                "every grid candidate diverged; lower the learning rates".to_string(),
            )
        })?;
        tracing::info!(
            learning_rate = best.learning_rate,
            epochs = best.epochs,
            l2 = best.l2,
            cv_r2 = best_score,
            "grid search finished"
        );

        Ok(SearchOutcome {
            best,
            best_score,
            scores,
        })
    }
}
