//! The opaque `fit(X, y) -> model` / `predict(X) -> y` seam.
//!
//! Training and serving only ever talk to [`Estimator`] and [`Regressor`];
//! the shipped implementation is a max-abs scaled linear model trained by
//! mini-batch gradient descent on MSE.

use crate::dataset::InMemoryDataset;
use crate::error::{PricingError, Result};
use crate::loss::MSELoss;
use crate::model::{Fitted, InferenceModel, LinearModel, LinearParams, LinearRegression};
use crate::optimizer::SGD;
use crate::regularizers::{NoRegularizer, Regularizer, L2};
use crate::scaling::{FittedMaxAbsScaler, MaxAbsScaler};
use crate::trainer::Trainer;
use ndarray::{Array1, Array2, ArrayView1};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A fitted model that maps feature vectors to prices.
pub trait Regressor: Serialize + DeserializeOwned + Send + Sync {
    /// Tag written into the bundle so a loader can refuse a foreign model.
    const KIND: &'static str;

    /// Width of the feature vectors the model was fitted on.
    fn n_features(&self) -> usize;

    /// Internal consistency check run after deserialization.
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    fn predict_one(&self, features: ArrayView1<'_, f64>) -> Result<f64>;

    fn predict(&self, features: &Array2<f64>) -> Result<Array1<f64>>;
}

/// An unfitted model configuration.
pub trait Estimator {
    type Fitted: Regressor;

    fn fit(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<Self::Fitted>;
}

/// Hyperparameters of the linear price model.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinearRegressor {
    pub learning_rate: f64,
    pub epochs: usize,
    /// L2 strength; `0.0` disables the penalty.
    pub l2: f64,
    pub batch_size: usize,
}

impl LinearRegressor {
    pub fn new(learning_rate: f64, epochs: usize, l2: f64) -> Self {
        Self {
            learning_rate,
            epochs,
            l2,
            batch_size: 32,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    fn check(&self) -> Result<()> {
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(PricingError::InvalidParameter(format!(
                "learning rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if !(self.l2.is_finite() && self.l2 >= 0.0) {
            return Err(PricingError::InvalidParameter(format!(
                "l2 must be non-negative, got {}",
                self.l2
            )));
        }
        if self.epochs == 0 || self.batch_size == 0 {
            return Err(PricingError::InvalidParameter(
                "epochs and batch_size must be positive".to_string(),
            ));
        }
        Ok(())
    }

    fn train<R>(&self, regularizer: R, dataset: &InMemoryDataset) -> Result<LinearModel<Fitted>>
    where
        R: Regularizer<LinearRegression>,
    {
        let trainer: Trainer<MSELoss, SGD, LinearRegression, LinearParams, R> =
            Trainer::builder(MSELoss, SGD::new(self.learning_rate), regularizer)
                .batch_size(self.batch_size)
                .max_epochs(self.epochs)
                .verbose(tracing::enabled!(tracing::Level::TRACE))
                .build();
        trainer.fit(LinearRegression::new(dataset.n_features()), dataset)
    }
}

impl Estimator for LinearRegressor {
    type Fitted = FittedLinearRegressor;

    fn fit(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<FittedLinearRegressor> {
        self.check()?;
        if y.iter().any(|v| !v.is_finite()) {
            return Err(PricingError::InvalidInput(
                "targets must be finite".to_string(),
            ));
        }

        let (scaler, x_scaled) = MaxAbsScaler::new().fit_transform(x)?;
        let dataset = InMemoryDataset::new(x_scaled, y.clone())?;

        let model = if self.l2 == 0.0 {
            self.train(NoRegularizer, &dataset)?
        } else {
            self.train(L2::new(self.l2), &dataset)?
        };

        Ok(FittedLinearRegressor { scaler, model })
    }
}

/// Scaler plus linear model, persisted together inside the bundle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FittedLinearRegressor {
    scaler: FittedMaxAbsScaler,
    model: LinearModel<Fitted>,
}

impl FittedLinearRegressor {
    pub fn from_parts(scaler: FittedMaxAbsScaler, model: LinearModel<Fitted>) -> Result<Self> {
        let regressor = Self { scaler, model };
        regressor.validate()?;
        Ok(regressor)
    }
}

impl Regressor for FittedLinearRegressor {
    const KIND: &'static str = "linear-sgd";

    fn n_features(&self) -> usize {
        self.scaler.n_features()
    }

    fn validate(&self) -> Result<()> {
        if self.model.n_features() != self.scaler.n_features() {
            return Err(PricingError::FeatureMismatch {
                expected: self.scaler.n_features(),
                got: self.model.n_features(),
            });
        }
        Ok(())
    }

    fn predict_one(&self, features: ArrayView1<'_, f64>) -> Result<f64> {
        let scaled = self.scaler.transform_row(features)?;
        Ok(self.model.predict(&scaled))
    }

    fn predict(&self, features: &Array2<f64>) -> Result<Array1<f64>> {
        let scaled = self.scaler.transform(features)?;
        Ok(self.model.predict_batch(&scaled))
    }
}
