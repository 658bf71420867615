//! Prediction service: encode one property against the bundled schema and
//! price it.
//!
//! The service is built once at start-up from a bundle on disk and then only
//! read. Share it by reference or through [`PredictionService::shared`].

use crate::bundle::ModelBundle;
use crate::cleaning::{normalize_label, OTHER_LOCATION};
use crate::encoding::{EncodingOutcome, FeatureEncoder, FeatureRow};
use crate::error::{PricingError, Result};
use crate::model::{FittedLinearRegressor, Regressor};
use crate::schema::{CategoricalField, FeatureSchema, NumericColumn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

/// Area type categories offered to users.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AreaType {
    SuperBuiltUp,
    BuiltUp,
    Plot,
    Carpet,
}

impl AreaType {
    pub const ALL: [AreaType; 4] = [
        AreaType::SuperBuiltUp,
        AreaType::BuiltUp,
        AreaType::Plot,
        AreaType::Carpet,
    ];

    /// The label as it appears in the cleaned training data.
    pub fn label(self) -> &'static str {
        match self {
            AreaType::SuperBuiltUp => "Super built-up Area",
            AreaType::BuiltUp => "Built-up Area",
            AreaType::Plot => "Plot Area",
            AreaType::Carpet => "Carpet Area",
        }
    }
}

impl fmt::Display for AreaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Case-insensitive; runs of whitespace count as one space.
impl FromStr for AreaType {
    type Err = PricingError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = normalize_label(s);
        Self::ALL
            .into_iter()
            .find(|area| area.label().eq_ignore_ascii_case(&wanted))
            .ok_or_else(|| PricingError::InvalidInput(format!("unknown area type '{}'", s)))
    }
}

impl TryFrom<String> for AreaType {
    type Error = PricingError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<AreaType> for String {
    fn from(area: AreaType) -> Self {
        area.label().to_string()
    }
}

/// One property as entered by a user.
///
/// Typical ranges: `total_sqft` 300–10000, `bath` 1–10, `bhk` 1–10,
/// `balcony` 0–5. Ranges are not enforced.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PropertyInput {
    pub total_sqft: f64,
    pub bath: u32,
    pub bhk: u32,
    pub balcony: u32,
    pub location: String,
    pub area_type: AreaType,
}

impl PropertyInput {
    fn check(&self) -> Result<()> {
        if !self.total_sqft.is_finite() {
            return Err(PricingError::InvalidInput(format!(
                "total_sqft must be a finite number, got {}",
                self.total_sqft
            )));
        }
        Ok(())
    }
}

impl FeatureRow for PropertyInput {
    fn numeric(&self, column: NumericColumn) -> f64 {
        match column {
            NumericColumn::TotalSqft => self.total_sqft,
            NumericColumn::Bath => f64::from(self.bath),
            NumericColumn::Balcony => f64::from(self.balcony),
            NumericColumn::Bhk => f64::from(self.bhk),
        }
    }

    fn category(&self, field: CategoricalField) -> &str {
        match field {
            CategoricalField::AreaType => self.area_type.label(),
            CategoricalField::Location => match self.location.trim() {
                "" => OTHER_LOCATION,
                location => location,
            },
        }
    }
}

/// Coarse price band shown next to the estimate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum PriceTier {
    #[serde(rename = "Budget")]
    Budget,
    #[serde(rename = "Mid-Range")]
    MidRange,
    #[serde(rename = "Premium")]
    Premium,
}

impl PriceTier {
    /// `< 80` Budget, `[80, 200)` Mid-Range, otherwise Premium (Lakhs).
    pub fn from_price(price: f64) -> Self {
        if price < 80.0 {
            PriceTier::Budget
        } else if price < 200.0 {
            PriceTier::MidRange
        } else {
            PriceTier::Premium
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PriceTier::Budget => "Budget",
            PriceTier::MidRange => "Mid-Range",
            PriceTier::Premium => "Premium",
        }
    }
}

impl fmt::Display for PriceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A priced property.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Prediction {
    /// Estimated price in Lakhs.
    pub price: f64,
    pub tier: PriceTier,
    pub encoding: EncodingOutcome,
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "₹ {:.2} Lakhs ({})", self.price, self.tier)
    }
}

/// Immutable, thread-safe price estimator over one loaded bundle.
#[derive(Debug)]
pub struct PredictionService<M = FittedLinearRegressor> {
    bundle: ModelBundle<M>,
}

impl<M: Regressor> PredictionService<M> {
    /// Load and validate the bundle at `path`. Fails fast on a missing or
    /// corrupt file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        ModelBundle::load(path).map(Self::from_bundle)
    }

    /// [`open`](Self::open), wrapped for sharing across request handlers.
    pub fn shared<P: AsRef<Path>>(path: P) -> Result<Arc<Self>> {
        Self::open(path).map(Arc::new)
    }

    pub fn from_bundle(bundle: ModelBundle<M>) -> Self {
        Self { bundle }
    }

    pub fn schema(&self) -> &FeatureSchema {
        self.bundle.schema()
    }

    pub fn predict(&self, input: &PropertyInput) -> Result<Prediction> {
        input.check()?;

        let encoded = FeatureEncoder::new(self.schema()).encode(input);
        let encoding = encoded.outcome();
        if let EncodingOutcome::FellBackToReference { fields } = &encoding {
            for field in fields {
                tracing::warn!(
                    %field,
                    value = input.category(*field),
                    "value unknown to the model, priced as the reference category"
                );
            }
        }

        let price = self.bundle.model().predict_one(encoded.vector.view())?;
        if !price.is_finite() {
            return Err(PricingError::ModelOutput(format!(
                "model produced a non-finite price for {:?}",
                input
            )));
        }

        Ok(Prediction {
            price,
            tier: PriceTier::from_price(price),
            encoding,
        })
    }

    /// Locations a user can pick: `"other"` first, then every location the
    /// model knows, in schema order.
    pub fn locations(&self) -> Vec<&str> {
        std::iter::once(OTHER_LOCATION)
            .chain(
                self.schema()
                    .known_values(CategoricalField::Location)
                    .into_iter()
                    .filter(|location| *location != OTHER_LOCATION),
            )
            .collect()
    }

    pub fn area_types(&self) -> &'static [AreaType] {
        &AreaType::ALL
    }
}
