//! Linear regression with compile-time state tracking.
//!
//! - [`LinearRegression`] = `LinearModel<Unfitted>`, used during training.
//! - `LinearModel<Fitted>`, the inference-only, serializable predictor.
//!
//! A fitted model is free from training hyperparameters.

use crate::model::{Fitted, InferenceModel, ParamOps, TrainableModel, Unfitted};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;

/// Trainable parameters of a linear model: weights and bias.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinearParams {
    pub weights: Array1<f64>,
    pub bias: f64,
}

impl LinearParams {
    pub fn zeros(n_features: usize) -> Self {
        Self {
            weights: Array1::zeros(n_features),
            bias: 0.0,
        }
    }
}

impl ParamOps for LinearParams {
    fn add(&self, other: &Self) -> Self {
        Self {
            weights: &self.weights + &other.weights,
            bias: self.bias + other.bias,
        }
    }

    fn scale(&self, factor: f64) -> Self {
        Self {
            weights: &self.weights * factor,
            bias: self.bias * factor,
        }
    }
}

/// A linear model with state encoded at the type level.
///
/// This enforces, at compile time, that `predict()` cannot be called on an
/// untrained model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct LinearModel<S> {
    params: LinearParams,
    #[serde(skip)]
    _state: PhantomData<S>,
}

impl<S> LinearModel<S> {
    pub fn params(&self) -> &LinearParams {
        &self.params
    }

    pub fn n_features(&self) -> usize {
        self.params.weights.len()
    }
}

impl LinearModel<Fitted> {
    /// Creates a fitted model from trained parameters.
    pub fn new(params: LinearParams) -> Self {
        Self {
            params,
            _state: PhantomData,
        }
    }
}

/// `y = w^T x + b`
impl InferenceModel for LinearModel<Fitted> {
    type InputSingle = Array1<f64>;
    type OutputSingle = f64;
    type InputBatch = Array2<f64>;
    type OutputBatch = Array1<f64>;

    fn predict(&self, input: &Self::InputSingle) -> Self::OutputSingle {
        self.params.weights.dot(input) + self.params.bias
    }

    fn predict_batch(&self, input: &Self::InputBatch) -> Self::OutputBatch {
        input.dot(&self.params.weights) + self.params.bias
    }
}

/// Forward pass: `X @ w + b`.
/// Backward pass: `∇w = X^T · grad`, `∇b = sum(grad)`.
impl TrainableModel for LinearModel<Unfitted> {
    type Input = Array2<f64>;
    type Prediction = Array1<f64>;
    type Params = LinearParams;
    type Gradients = LinearParams;
    type Output = LinearModel<Fitted>;

    fn forward(&self, x: &Self::Input) -> Self::Prediction {
        x.dot(&self.params.weights) + self.params.bias
    }

    fn backward(&self, x: &Self::Input, grad_output: &Self::Prediction) -> Self::Gradients {
        LinearParams {
            weights: x.t().dot(grad_output),
            bias: grad_output.sum(),
        }
    }

    fn params(&self) -> &Self::Params {
        &self.params
    }

    fn update_params(&mut self, params: &Self::Params) {
        self.params = params.clone();
    }

    fn into_fitted(self) -> LinearModel<Fitted> {
        LinearModel::<Fitted>::new(self.params)
    }
}

/// Alias for an **unfitted** linear regression model.
pub type LinearRegression = LinearModel<Unfitted>;

impl LinearRegression {
    /// Creates a model with zero-initialized weights.
    pub fn new(n_features: usize) -> Self {
        Self::from_params(LinearParams::zeros(n_features))
    }

    /// Constructs a model from explicit parameters (e.g. a warm start).
    pub fn from_params(params: LinearParams) -> Self {
        Self {
            params,
            _state: PhantomData,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_param_ops_add() {
        let p1 = LinearParams {
            weights: array![1.0, 2.0],
            bias: 0.5,
        };
        let p2 = LinearParams {
            weights: array![0.5, 1.0],
            bias: 0.5,
        };

        let result = p1.add(&p2);

        assert_eq!(result.weights, array![1.5, 3.0]);
        assert_eq!(result.bias, 1.0);
    }

    #[test]
    fn test_param_ops_scale() {
        let p = LinearParams {
            weights: array![2.0, 4.0],
            bias: 1.0,
        };

        let result = p.scale(-0.5);

        assert_eq!(result.weights, array![-1.0, -2.0]);
        assert_eq!(result.bias, -0.5);
    }

    #[test]
    fn test_linear_regression_new_zero_initialized() {
        let model = LinearRegression::new(3);
        assert_eq!(model.params().weights, array![0.0, 0.0, 0.0]);
        assert_eq!(model.params().bias, 0.0);
        assert_eq!(model.n_features(), 3);
    }

    #[test]
    fn test_forward_correctness() {
        let model = LinearRegression::from_params(LinearParams {
            weights: array![2.0, 3.0],
            bias: 1.0,
        });

        // [[1, 0], [0, 1]] -> [2 + 1, 3 + 1]
        let x = array![[1.0, 0.0], [0.0, 1.0]];
        assert_eq!(model.forward(&x), array![3.0, 4.0]);
    }

    #[test]
    fn test_backward_gradients() {
        let model = LinearRegression::new(2);
        let x = array![[1.0, 2.0], [3.0, 4.0]];
        let grad = array![1.0, -1.0];

        let grads = model.backward(&x, &grad);

        // X^T · grad = [1 - 3, 2 - 4]
        assert_eq!(grads.weights, array![-2.0, -2.0]);
        assert_eq!(grads.bias, 0.0);
    }

    #[test]
    fn test_update_params() {
        let mut model = LinearRegression::new(2);
        let params = LinearParams {
            weights: array![1.0, 2.0],
            bias: 0.5,
        };
        model.update_params(&params);
        assert_eq!(model.params(), &params);
    }

    #[test]
    fn test_into_fitted_predicts() {
        let model = LinearRegression::from_params(LinearParams {
            weights: array![2.0, -1.0],
            bias: 0.5,
        });
        let fitted = model.into_fitted();

        assert_eq!(fitted.predict(&array![1.0, 1.0]), 1.5);
        assert_eq!(
            fitted.predict_batch(&array![[1.0, 1.0], [0.0, 2.0]]),
            array![1.5, -1.5]
        );
    }

    #[test]
    fn test_fitted_model_bincode_roundtrip() {
        let fitted = LinearModel::<Fitted>::new(LinearParams {
            weights: array![0.25, -3.5],
            bias: 12.0,
        });
        let bytes = bincode::serialize(&fitted).unwrap();
        let restored: LinearModel<Fitted> = bincode::deserialize(&bytes).unwrap();
        assert_eq!(restored, fitted);
    }
}
