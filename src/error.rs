//! Error types for the estimation pipeline.
//!
//! Parse failures inside the cleaning stage never surface here: they degrade
//! to missing values. Everything in this enum is either an I/O problem, a
//! broken train/serve contract, or a caller violating the inference contract.

use thiserror::Error;

/// Error type for every fallible operation in the crate.
#[derive(Debug, Error)]
pub enum PricingError {
    /// I/O error while reading a dataset or a bundle.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The training CSV could not be read.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Model parameters could not be (de)serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// A report or prediction could not be rendered as JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The configuration file could not be parsed.
    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    /// Empty data provided where non-empty was required.
    #[error("Empty data: {0}")]
    EmptyData(String),

    /// Feature dimension mismatch between schema, vector and model.
    #[error("Feature mismatch: expected {expected} features, got {got}")]
    FeatureMismatch { expected: usize, got: usize },

    /// The feature schema is malformed or was violated during training.
    #[error("Schema violation: {0}")]
    SchemaViolation(String),

    /// A persisted bundle could not be decoded.
    #[error("Corrupt bundle: {0}")]
    CorruptBundle(String),

    /// The caller broke the inference input contract.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Invalid hyperparameter or configuration value.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The model produced an unusable (non-finite) price for a valid input.
    #[error("Model output error: {0}")]
    ModelOutput(String),

    /// Gradient descent produced a non-finite loss.
    #[error("Training diverged at epoch {epoch}")]
    TrainingDiverged { epoch: usize },
}

impl From<std::convert::Infallible> for PricingError {
    fn from(never: std::convert::Infallible) -> Self {
        match never {}
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, PricingError>;
