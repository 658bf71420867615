use ndarray::Array1;

/// A differentiable loss function used during model training.
///
/// Implementors define the scalar loss value (for logging) and the gradient
/// of the loss w.r.t. the model's predictions, which is passed on to the
/// model's `backward()`.
pub trait Loss {
    fn loss(&self, prediction: &Array1<f64>, target: &Array1<f64>) -> f64;

    /// ∂L/∂pred
    fn grad_wrt_prediction(&self, prediction: &Array1<f64>, target: &Array1<f64>) -> Array1<f64>;
}

/// Mean Squared Error (MSE) loss: `L = (1/n) * Σ(pred_i - target_i)^2`
///
/// Gradient w.r.t. prediction: `∂L/∂pred = (pred - target) / n`
///
/// The factor of 2 is omitted; the learning rate absorbs it.
#[derive(Clone, Copy, Debug, Default)]
pub struct MSELoss;

impl Loss for MSELoss {
    fn loss(&self, pred: &Array1<f64>, target: &Array1<f64>) -> f64 {
        if pred.is_empty() {
            return 0.0;
        }
        let diff = pred - target;
        diff.dot(&diff) / diff.len() as f64
    }

    fn grad_wrt_prediction(&self, pred: &Array1<f64>, target: &Array1<f64>) -> Array1<f64> {
        let n = pred.len().max(1) as f64;
        (pred - target) / n
    }
}
