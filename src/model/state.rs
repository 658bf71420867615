/// A marker type indicating that a model is **not yet trained**.
///
/// Training methods (`Trainer::fit`) require an `Unfitted` model; `predict`
/// is not available until the model is converted to [`Fitted`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Unfitted;

/// A marker type indicating that a model has been **fully trained**.
///
/// A `Fitted` model carries only inference parameters: no optimizer state,
/// loss function or training hyperparameters.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Fitted;
