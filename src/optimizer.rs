use crate::model::ParamOps;

/// Trait for gradient-based optimizers.
///
/// The trainer owns the loop; the optimizer only turns the current parameters
/// and their gradients into the next parameters.
pub trait Optimizer<P> {
    /// Returns the updated parameters without mutating the inputs.
    fn step(&self, params: &P, gradients: &P) -> P;
}

/// Stochastic Gradient Descent (SGD) optimizer.
///
/// ```text
/// θ ← θ - η · ∇L(θ)
/// ```
///
/// Stateless: no momentum, no adaptive learning rates.
#[derive(Clone, Copy, Debug)]
pub struct SGD {
    lr: f64,
}

impl SGD {
    pub fn new(lr: f64) -> Self {
        Self { lr }
    }

    pub fn learning_rate(&self) -> f64 {
        self.lr
    }
}

impl<P: ParamOps> Optimizer<P> for SGD {
    fn step(&self, params: &P, gradients: &P) -> P {
        // params + (-lr) * gradients
        params.add(&gradients.scale(-self.lr))
    }
}
