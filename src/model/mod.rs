//! The price regressor.
//!
//! Models carry their training state in the type system: a
//! [`LinearModel<Unfitted>`](linear::LinearModel) implements
//! [`TrainableModel`] and is consumed by the trainer, which hands back a
//! [`LinearModel<Fitted>`](linear::LinearModel) implementing
//! [`InferenceModel`]. The rest of the crate only sees the [`Regressor`] and
//! [`Estimator`] traits.

pub mod linear;
pub mod regressor;
pub mod state;

pub use linear::{LinearModel, LinearParams, LinearRegression};
pub use regressor::{Estimator, FittedLinearRegressor, LinearRegressor, Regressor};
pub use state::{Fitted, Unfitted};

/// A model that can be trained by gradient descent.
pub trait TrainableModel {
    type Input;
    type Prediction;
    type Params;
    type Gradients;
    type Output;

    fn forward(&self, input: &Self::Input) -> Self::Prediction;
    fn backward(&self, input: &Self::Input, grad_output: &Self::Prediction) -> Self::Gradients;
    fn params(&self) -> &Self::Params;
    fn update_params(&mut self, new_params: &Self::Params);

    fn into_fitted(self) -> Self::Output;
}

/// Arithmetic the optimizer needs on a parameter set.
pub trait ParamOps: Clone {
    fn add(&self, other: &Self) -> Self;
    fn scale(&self, factor: f64) -> Self;
}

/// A trained model used for prediction only.
pub trait InferenceModel {
    type InputSingle;
    type OutputSingle;
    type InputBatch;
    type OutputBatch;

    fn predict(&self, input: &Self::InputSingle) -> Self::OutputSingle;
    fn predict_batch(&self, input: &Self::InputBatch) -> Self::OutputBatch;
}
