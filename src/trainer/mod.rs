use crate::{
    dataset::Dataset,
    error::{PricingError, Result},
    loss::Loss,
    model::{ParamOps, TrainableModel},
    optimizer::Optimizer,
    regularizers::Regularizer,
};
use ndarray::{Array1, Array2};
use std::marker::PhantomData;

/// Orchestrates the training loop for a [`TrainableModel`].
///
/// Combines a loss function, optimizer and regularizer to fit a model on a
/// dataset. Once built via [`TrainerBuilder`] it is immutable and can be
/// reused across models of the same type.
///
/// Batches are visited in dataset order, so fitting is deterministic.
pub struct Trainer<L, O, M, P, R> {
    pub(crate) batch_size: usize,
    pub(crate) max_epochs: usize,
    pub(crate) verbose: bool,
    pub(crate) loss_fn: L,
    pub(crate) optimizer: O,
    pub(crate) regularizer: R,
    _phantom_model: PhantomData<(M, P)>,
}

/// Fluent builder for a [`Trainer`].
///
/// Defaults:
/// - `batch_size`: 32
/// - `max_epochs`: 1000
/// - `verbose`: false
pub struct TrainerBuilder<L, O, M, P, R> {
    batch_size: usize,
    max_epochs: usize,
    verbose: bool,
    loss_fn: L,
    optimizer: O,
    regularizer: R,
    _phantom_model: PhantomData<(M, P)>,
}

impl<L, O, M, P, R> TrainerBuilder<L, O, M, P, R>
where
    L: Loss,
    M: TrainableModel<Params = P, Gradients = P>,
    O: Optimizer<P>,
    R: Regularizer<M>,
{
    pub fn new(loss_fn: L, optimizer: O, regularizer: R) -> Self {
        Self {
            batch_size: 32,
            max_epochs: 1000,
            verbose: false,
            loss_fn,
            optimizer,
            regularizer,
            _phantom_model: PhantomData,
        }
    }

    pub fn batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    pub fn max_epochs(mut self, epochs: usize) -> Self {
        self.max_epochs = epochs;
        self
    }

    /// Emits the per-epoch loss at `trace` level.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn build(self) -> Trainer<L, O, M, P, R> {
        Trainer {
            batch_size: self.batch_size,
            max_epochs: self.max_epochs,
            verbose: self.verbose,
            loss_fn: self.loss_fn,
            optimizer: self.optimizer,
            regularizer: self.regularizer,
            _phantom_model: PhantomData,
        }
    }
}

impl<L, O, M, P, R> Trainer<L, O, M, P, R>
where
    L: Loss,
    M: TrainableModel<Input = Array2<f64>, Prediction = Array1<f64>, Params = P, Gradients = P>,
    P: ParamOps,
    O: Optimizer<P>,
    R: Regularizer<M>,
{
    pub fn builder(loss_fn: L, optimizer: O, regularizer: R) -> TrainerBuilder<L, O, M, P, R> {
        TrainerBuilder::new(loss_fn, optimizer, regularizer)
    }

    /// Trains the model on `dataset` for `max_epochs` passes.
    ///
    /// Gradients are averaged per batch before the regularizer gradient is
    /// added. Fails with [`PricingError::TrainingDiverged`] as soon as an
    /// epoch's loss stops being finite.
    pub fn fit<D>(&self, mut model: M, dataset: &D) -> Result<M::Output>
    where
        D: Dataset,
        PricingError: From<D::Error>,
    {
        let n_total = dataset
            .len()
            .ok_or_else(|| PricingError::EmptyData("dataset length unknown".into()))?;
        if n_total == 0 {
            return Err(PricingError::EmptyData("dataset is empty".into()));
        }

        for epoch in 0..self.max_epochs {
            let mut total_loss = 0.0;
            for batch in dataset.batches(self.batch_size) {
                let (batch_x, batch_y) = batch?;
                let preds = model.forward(&batch_x);
                let (reg_penalty, reg_grad) = self.regularizer.regularizer_penalty_grad(&model);
                total_loss += (self.loss_fn.loss(&preds, &batch_y) + reg_penalty)
                    * batch_y.len() as f64;

                let grad_preds = self.loss_fn.grad_wrt_prediction(&preds, &batch_y);
                let grads = model.backward(&batch_x, &grad_preds).add(&reg_grad);
                let new_params = self.optimizer.step(model.params(), &grads);
                model.update_params(&new_params);
            }

            let avg_loss = total_loss / n_total as f64;
            if !avg_loss.is_finite() {
                return Err(PricingError::TrainingDiverged { epoch });
            }
            if self.verbose {
                tracing::trace!(epoch, loss = avg_loss, "epoch finished");
            }
        }

        Ok(model.into_fitted())
    }
}
