//! # house-price-estimator
//!
//! Price estimation for residential listings: an offline training run that
//! cleans raw listings, one-hot encodes them against a fixed column schema
//! and fits a regressor, plus an inference service that encodes a single
//! property against the *same* schema and prices it.
//!
//! ## Core Design Principles
//!
//! - **Train/serve consistency**: the [`FeatureSchema`] is built once from
//!   the training corpus and persisted with the model in one
//!   [`ModelBundle`]. Inference never rebuilds it.
//! - **Explicit fallbacks**: a category the schema has never seen is encoded
//!   as the reference category, and the encoder says so
//!   ([`EncodingOutcome`]).
//! - **Stateful type safety**: models carry their training state in the type
//!   system (`Unfitted` vs `Fitted`); a fitted model holds only prediction
//!   parameters.
//!
//! ## Quick Start
//!
//! ```no_run
//! use house_price_estimator::{AreaType, PredictionService, PropertyInput};
//!
//! let service: PredictionService = PredictionService::open("model.hpeb")?;
//! let prediction = service.predict(&PropertyInput {
//!     total_sqft: 1200.0,
//!     bath: 2,
//!     bhk: 2,
//!     balcony: 1,
//!     location: "Whitefield".to_string(),
//!     area_type: AreaType::SuperBuiltUp,
//! })?;
//! println!("{}", prediction);
//! # Ok::<(), house_price_estimator::PricingError>(())
//! ```

/// The persisted (model, schema) pair.
pub mod bundle;

/// Cleaning stage: raw listings to cleaned records.
pub mod cleaning;

pub mod config;

/// Raw CSV ingestion, in-memory datasets and index splitting.
pub mod dataset;

/// Encoding stage: records to fixed-width feature vectors.
pub mod encoding;

pub mod error;

/// `tracing` subscriber initialisation for the binaries.
pub mod logging;

/// Differentiable loss functions for model training.
pub mod loss;

/// Regression metrics.
pub mod metrics;

/// Models with compile-time state safety and the regressor seam.
pub mod model;

/// Optimization algorithms for parameter updates.
pub mod optimizer;

/// Weight regularization strategies.
pub mod regularizers;

/// Feature scaling applied inside the regressor.
pub mod scaling;

/// The ordered column schema shared by training and inference.
pub mod schema;

/// Cross-validated hyperparameter search.
pub mod search;

/// Inference-time prediction service.
pub mod service;

/// High-level training loop orchestration.
pub mod trainer;

/// The end-to-end offline training run.
pub mod training;

pub use bundle::ModelBundle;
pub use cleaning::{CleanedRecord, Cleaner, CleaningReport};
pub use config::PipelineConfig;
pub use dataset::RawRecord;
pub use encoding::{CategoryMatch, EncodedVector, EncodingOutcome, FeatureEncoder};
pub use error::{PricingError, Result};
pub use schema::FeatureSchema;
pub use service::{AreaType, Prediction, PredictionService, PriceTier, PropertyInput};
pub use training::{TrainingReport, TrainingRun};
