use crate::model::{LinearParams, LinearRegression, TrainableModel};

/// A weight penalty added to the training loss.
///
/// Returns the penalty value and its gradient w.r.t. the model parameters.
pub trait Regularizer<M: TrainableModel> {
    fn regularizer_penalty_grad(&self, model: &M) -> (f64, M::Gradients);
}

/// Ridge penalty `λ · ‖w‖²`; the bias is not penalized.
#[derive(Clone, Copy, Debug)]
pub struct L2 {
    lambda: f64,
}

impl L2 {
    pub fn new(lambda: f64) -> Self {
        Self { lambda }
    }
}

impl Regularizer<LinearRegression> for L2 {
    fn regularizer_penalty_grad(&self, model: &LinearRegression) -> (f64, LinearParams) {
        let weights = &model.params().weights;
        let penalty = self.lambda * weights.dot(weights);
        let grad = LinearParams {
            weights: weights * (2.0 * self.lambda),
            bias: 0.0,
        };
        (penalty, grad)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoRegularizer;

impl Regularizer<LinearRegression> for NoRegularizer {
    fn regularizer_penalty_grad(&self, model: &LinearRegression) -> (f64, LinearParams) {
        (0.0, LinearParams::zeros(model.n_features()))
    }
}
