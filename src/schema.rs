//! The feature schema: the ordered column list the regressor consumes.
//!
//! Layout, fixed once at training time:
//!
//! ```text
//! total_sqft, bath, balcony, bhk,
//! area_type_<value>...   (sorted, reference category omitted)
//! location_<value>...    (sorted, reference category omitted)
//! ```
//!
//! The reference category of each categorical field is its lexicographically
//! first observed value. Its effect is represented by every indicator of the
//! field being zero.

use crate::cleaning::CleanedRecord;
use crate::error::{PricingError, Result};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// Current schema format version.
pub const SCHEMA_VERSION: u16 = 1;

/// A numeric feature column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NumericColumn {
    TotalSqft,
    Bath,
    Balcony,
    Bhk,
}

impl NumericColumn {
    /// Numeric columns in schema order.
    pub const ALL: [NumericColumn; 4] = [
        NumericColumn::TotalSqft,
        NumericColumn::Bath,
        NumericColumn::Balcony,
        NumericColumn::Bhk,
    ];

    pub fn name(self) -> &'static str {
        match self {
            NumericColumn::TotalSqft => "total_sqft",
            NumericColumn::Bath => "bath",
            NumericColumn::Balcony => "balcony",
            NumericColumn::Bhk => "bhk",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|column| column.name() == name)
    }
}

/// A one-hot encoded categorical field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoricalField {
    AreaType,
    Location,
}

impl CategoricalField {
    /// Categorical fields in schema order.
    pub const ALL: [CategoricalField; 2] = [CategoricalField::AreaType, CategoricalField::Location];

    pub fn name(self) -> &'static str {
        match self {
            CategoricalField::AreaType => "area_type",
            CategoricalField::Location => "location",
        }
    }

    /// Indicator column name for `value`, e.g. `location_Whitefield`.
    pub fn column_name(self, value: &str) -> String {
        format!("{}_{}", self.name(), value)
    }

    /// The category value encoded by `column`, if it belongs to this field.
    pub fn value_of<'a>(self, column: &'a str) -> Option<&'a str> {
        column
            .strip_prefix(self.name())
            .and_then(|rest| rest.strip_prefix('_'))
    }

    fn of_column(column: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|field| field.value_of(column).is_some())
    }
}

impl fmt::Display for CategoricalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Ordered, named list of feature columns plus the dropped reference
/// category of each categorical field.
///
/// Immutable once built: training derives it from the cleaned corpus, the
/// bundle persists it, inference only reads it.
#[derive(Clone, Debug)]
pub struct FeatureSchema {
    version: u16,
    columns: Vec<String>,
    area_type_reference: Option<String>,
    location_reference: Option<String>,
    index: HashMap<String, usize>,
}

impl PartialEq for FeatureSchema {
    fn eq(&self, other: &Self) -> bool {
        self.version == other.version
            && self.columns == other.columns
            && self.area_type_reference == other.area_type_reference
            && self.location_reference == other.location_reference
    }
}

impl FeatureSchema {
    /// Derive the schema from every categorical value observed in `records`.
    pub fn from_records(records: &[CleanedRecord]) -> Result<Self> {
        if records.is_empty() {
            return Err(PricingError::EmptyData(
                "cannot build a feature schema from zero records".to_string(),
            ));
        }

        let area_types: BTreeSet<&str> = records.iter().map(|r| r.area_type.as_str()).collect();
        let locations: BTreeSet<&str> = records.iter().map(|r| r.location.as_str()).collect();

        let mut columns: Vec<String> = NumericColumn::ALL
            .iter()
            .map(|c| c.name().to_string())
            .collect();

        let mut references = [None, None];
        for (slot, (field, values)) in [
            (CategoricalField::AreaType, &area_types),
            (CategoricalField::Location, &locations),
        ]
        .into_iter()
        .enumerate()
        {
            let mut values = values.iter();
            references[slot] = values.next().map(|v| v.to_string());
            columns.extend(values.map(|v| field.column_name(v)));
        }

        let [area_type_reference, location_reference] = references;
        let schema = Self::from_parts(
            SCHEMA_VERSION,
            columns,
            area_type_reference,
            location_reference,
        )?;

        tracing::info!(
            columns = schema.len(),
            area_types = area_types.len(),
            locations = locations.len(),
            "built feature schema"
        );
        Ok(schema)
    }

    /// Rebuild a schema from persisted parts, validating it.
    ///
    /// Column names must be unique; every column is either a numeric column
    /// or an indicator of a known categorical field; a reference category
    /// must not also have an indicator column.
    pub fn from_parts(
        version: u16,
        columns: Vec<String>,
        area_type_reference: Option<String>,
        location_reference: Option<String>,
    ) -> Result<Self> {
        if version == 0 || version > SCHEMA_VERSION {
            return Err(PricingError::SchemaViolation(format!(
                "unsupported schema version {}",
                version
            )));
        }

        let mut index = HashMap::with_capacity(columns.len());
        for (position, column) in columns.iter().enumerate() {
            if NumericColumn::from_name(column).is_none()
                && CategoricalField::of_column(column).is_none()
            {
                return Err(PricingError::SchemaViolation(format!(
                    "unrecognised column '{}'",
                    column
                )));
            }
            if index.insert(column.clone(), position).is_some() {
                return Err(PricingError::SchemaViolation(format!(
                    "duplicate column '{}'",
                    column
                )));
            }
        }

        for (field, reference) in [
            (CategoricalField::AreaType, &area_type_reference),
            (CategoricalField::Location, &location_reference),
        ] {
            if let Some(reference) = reference {
                if index.contains_key(&field.column_name(reference)) {
                    return Err(PricingError::SchemaViolation(format!(
                        "reference category '{}' of {} also has an indicator column",
                        reference, field
                    )));
                }
            }
        }

        Ok(Self {
            version,
            columns,
            area_type_reference,
            location_reference,
            index,
        })
    }

    pub fn version(&self) -> u16 {
        self.version
    }

    /// Number of columns; every encoded vector has exactly this length.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn position(&self, column: &str) -> Option<usize> {
        self.index.get(column).copied()
    }

    pub fn numeric_position(&self, column: NumericColumn) -> Option<usize> {
        self.position(column.name())
    }

    /// The dropped reference category of `field`, when known.
    pub fn reference(&self, field: CategoricalField) -> Option<&str> {
        match field {
            CategoricalField::AreaType => self.area_type_reference.as_deref(),
            CategoricalField::Location => self.location_reference.as_deref(),
        }
    }

    /// Category values that own an indicator column, in schema order.
    pub fn levels(&self, field: CategoricalField) -> impl Iterator<Item = &str> + '_ {
        self.columns
            .iter()
            .filter_map(move |column| field.value_of(column))
    }

    /// Every category value the schema knows for `field`: the reference
    /// category (if known) followed by the indicator levels.
    pub fn known_values(&self, field: CategoricalField) -> Vec<&str> {
        self.reference(field)
            .into_iter()
            .chain(self.levels(field))
            .collect()
    }
}
