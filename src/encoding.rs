//! Encoding stage: a record plus a [`FeatureSchema`] → an [`EncodedVector`].
//!
//! Algorithm:
//!
//! 1. start from a zero vector of `schema.len()`;
//! 2. write each numeric field at its column, when the schema has one;
//! 3. for each categorical field set `<field>_<value>` to 1 if that column
//!    exists; otherwise leave the field's indicators at 0.
//!
//! Step 3 never fails. A value without a column is either the field's
//! reference category ([`CategoryMatch::Reference`]) or a value the schema
//! has never seen ([`CategoryMatch::Unseen`]). Both encode identically; the
//! second is a silent degradation, reported through [`EncodingOutcome`].

use crate::cleaning::CleanedRecord;
use crate::error::{PricingError, Result};
use crate::schema::{CategoricalField, FeatureSchema, NumericColumn};
use ndarray::{Array1, Array2, ArrayView1};
use serde::Serialize;

/// Read access to the fields the encoder consumes.
pub trait FeatureRow {
    fn numeric(&self, column: NumericColumn) -> f64;
    fn category(&self, field: CategoricalField) -> &str;
}

impl FeatureRow for CleanedRecord {
    fn numeric(&self, column: NumericColumn) -> f64 {
        match column {
            NumericColumn::TotalSqft => self.total_sqft,
            NumericColumn::Bath => self.bath,
            NumericColumn::Balcony => self.balcony,
            NumericColumn::Bhk => f64::from(self.bhk),
        }
    }

    fn category(&self, field: CategoricalField) -> &str {
        match field {
            CategoricalField::AreaType => &self.area_type,
            CategoricalField::Location => &self.location,
        }
    }
}

/// How one categorical value was encoded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CategoryMatch {
    /// The value owns the indicator column at this position.
    Indicator { column: usize },
    /// The value is the field's dropped reference category.
    Reference,
    /// The schema does not know the value; encoded as the reference category.
    Unseen,
}

/// Summary of the categorical lookups of one encoding.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EncodingOutcome {
    /// Every categorical value was known to the schema.
    Matched,
    /// These fields held unseen values and fell back to the reference category.
    FellBackToReference { fields: Vec<CategoricalField> },
}

/// Numeric vector laid out exactly like its schema.
#[derive(Clone, Debug, PartialEq)]
pub struct EncodedVector {
    values: Vec<f64>,
}

impl EncodedVector {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn view(&self) -> ArrayView1<'_, f64> {
        ArrayView1::from(self.values.as_slice())
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn into_inner(self) -> Array1<f64> {
        Array1::from(self.values)
    }

    /// Value of a schema column, read by name.
    pub fn value(&self, schema: &FeatureSchema, column: &str) -> Option<f64> {
        schema
            .position(column)
            .and_then(|i| self.values.get(i).copied())
    }
}

/// The fields of an encoded vector read back through its schema.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedFeatures {
    pub total_sqft: Option<f64>,
    pub bath: Option<f64>,
    pub balcony: Option<f64>,
    pub bhk: Option<f64>,
    /// Active area type indicator, or the reference category when none is set.
    pub area_type: Option<String>,
    /// Active location indicator, or the reference category when none is set.
    pub location: Option<String>,
}

impl FeatureSchema {
    /// Read back every schema-listed field of `vector`.
    pub fn decode(&self, vector: &EncodedVector) -> Result<DecodedFeatures> {
        if vector.len() != self.len() {
            return Err(PricingError::FeatureMismatch {
                expected: self.len(),
                got: vector.len(),
            });
        }

        let numeric = |column: NumericColumn| {
            self.numeric_position(column)
                .map(|i| vector.as_slice()[i])
        };
        let category = |field: CategoricalField| {
            self.columns()
                .iter()
                .zip(vector.as_slice())
                .find_map(|(column, value)| {
                    field.value_of(column).filter(|_| *value > 0.5)
                })
                .or_else(|| self.reference(field))
                .map(str::to_string)
        };

        Ok(DecodedFeatures {
            total_sqft: numeric(NumericColumn::TotalSqft),
            bath: numeric(NumericColumn::Bath),
            balcony: numeric(NumericColumn::Balcony),
            bhk: numeric(NumericColumn::Bhk),
            area_type: category(CategoricalField::AreaType),
            location: category(CategoricalField::Location),
        })
    }
}

/// An encoded vector together with the categorical lookup results.
#[derive(Clone, Debug, PartialEq)]
pub struct Encoded {
    pub vector: EncodedVector,
    pub area_type: CategoryMatch,
    pub location: CategoryMatch,
}

impl Encoded {
    pub fn category_match(&self, field: CategoricalField) -> CategoryMatch {
        match field {
            CategoricalField::AreaType => self.area_type,
            CategoricalField::Location => self.location,
        }
    }

    pub fn outcome(&self) -> EncodingOutcome {
        let fields: Vec<CategoricalField> = CategoricalField::ALL
            .into_iter()
            .filter(|field| self.category_match(*field) == CategoryMatch::Unseen)
            .collect();

        if fields.is_empty() {
            EncodingOutcome::Matched
        } else {
            EncodingOutcome::FellBackToReference { fields }
        }
    }
}

/// Encodes records against one schema.
#[derive(Clone, Copy, Debug)]
pub struct FeatureEncoder<'a> {
    schema: &'a FeatureSchema,
}

impl<'a> FeatureEncoder<'a> {
    pub fn new(schema: &'a FeatureSchema) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &'a FeatureSchema {
        self.schema
    }

    fn lookup(&self, field: CategoricalField, value: &str) -> CategoryMatch {
        match self.schema.position(&field.column_name(value)) {
            Some(column) => CategoryMatch::Indicator { column },
            None if self.schema.reference(field) == Some(value) => CategoryMatch::Reference,
            None => CategoryMatch::Unseen,
        }
    }

    /// Encode one record. Never fails; see [`CategoryMatch`].
    pub fn encode<R: FeatureRow + ?Sized>(&self, row: &R) -> Encoded {
        let mut values = vec![0.0; self.schema.len()];

        for column in NumericColumn::ALL {
            if let Some(i) = self.schema.numeric_position(column) {
                values[i] = row.numeric(column);
            }
        }

        let mut matches = [CategoryMatch::Unseen; 2];
        for (slot, field) in CategoricalField::ALL.into_iter().enumerate() {
            let found = self.lookup(field, row.category(field));
            if let CategoryMatch::Indicator { column } = found {
                values[column] = 1.0;
            }
            matches[slot] = found;
        }

        let [area_type, location] = matches;
        Encoded {
            vector: EncodedVector { values },
            area_type,
            location,
        }
    }

    /// Encode a training corpus into a feature matrix.
    ///
    /// The schema is derived from the same corpus, so an unseen category here
    /// means the two have drifted apart: that is a [`PricingError::SchemaViolation`].
    pub fn encode_batch<R: FeatureRow>(&self, rows: &[R]) -> Result<Array2<f64>> {
        let mut matrix = Array2::<f64>::zeros((rows.len(), self.schema.len()));

        for (i, row) in rows.iter().enumerate() {
            let encoded = self.encode(row);
            if let EncodingOutcome::FellBackToReference { fields } = encoded.outcome() {
                let field = fields[0];
                return Err(PricingError::SchemaViolation(format!(
                    "row {} has {} '{}' unknown to the schema",
                    i,
                    field,
                    row.category(field)
                )));
            }
            matrix.row_mut(i).assign(&encoded.vector.view());
        }

        Ok(matrix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn record(location: &str, area_type: &str) -> CleanedRecord {
        CleanedRecord {
            total_sqft: 1200.0,
            bath: 2.0,
            bhk: 2,
            balcony: 1.0,
            location: location.to_string(),
            area_type: area_type.to_string(),
            price: 80.0,
        }
    }

    fn toy_schema() -> FeatureSchema {
        FeatureSchema::from_records(&[
            record("Whitefield", "Super built-up Area"),
            record("Hebbal", "Plot Area"),
            record("other", "Built-up Area"),
            record("Sarjapur", "Carpet Area"),
        ])
        .unwrap()
    }

    #[test]
    fn test_encode_numeric_and_indicators() {
        let schema = toy_schema();
        let encoder = FeatureEncoder::new(&schema);

        let encoded = encoder.encode(&record("Whitefield", "Plot Area"));
        let v = &encoded.vector;

        assert_eq!(v.len(), schema.len());
        assert_eq!(v.value(&schema, "total_sqft"), Some(1200.0));
        assert_eq!(v.value(&schema, "bath"), Some(2.0));
        assert_eq!(v.value(&schema, "balcony"), Some(1.0));
        assert_eq!(v.value(&schema, "bhk"), Some(2.0));
        assert_eq!(v.value(&schema, "location_Whitefield"), Some(1.0));
        assert_eq!(v.value(&schema, "location_Sarjapur"), Some(0.0));
        assert_eq!(v.value(&schema, "area_type_Plot Area"), Some(1.0));
        assert_eq!(encoded.outcome(), EncodingOutcome::Matched);
    }

    #[test]
    fn test_reference_category_is_all_zero_and_matched() {
        let schema = toy_schema();
        let encoder = FeatureEncoder::new(&schema);

        let encoded = encoder.encode(&record("Hebbal", "Built-up Area"));

        assert_eq!(encoded.location, CategoryMatch::Reference);
        assert_eq!(encoded.area_type, CategoryMatch::Reference);
        assert!(encoded.vector.as_slice()[4..].iter().all(|v| *v == 0.0));
        assert_eq!(encoded.outcome(), EncodingOutcome::Matched);
    }

    #[test]
    fn test_unseen_location_equals_reference_encoding() {
        let schema = toy_schema();
        let encoder = FeatureEncoder::new(&schema);

        let unseen = encoder.encode(&record("Atlantis", "Plot Area"));
        let reference = encoder.encode(&record("Hebbal", "Plot Area"));

        assert_eq!(unseen.location, CategoryMatch::Unseen);
        assert_eq!(unseen.vector, reference.vector);
        assert_eq!(
            unseen.outcome(),
            EncodingOutcome::FellBackToReference {
                fields: vec![CategoricalField::Location]
            }
        );
    }

    #[test]
    fn test_encode_batch_rejects_unseen() {
        let schema = toy_schema();
        let encoder = FeatureEncoder::new(&schema);
        let rows = vec![record("Whitefield", "Plot Area"), record("Atlantis", "Plot Area")];

        let result = encoder.encode_batch(&rows);
        assert!(matches!(result, Err(PricingError::SchemaViolation(_))));
    }

    #[test]
    fn test_encode_batch_shape() {
        let schema = toy_schema();
        let encoder = FeatureEncoder::new(&schema);
        let rows = vec![record("Whitefield", "Plot Area"), record("other", "Carpet Area")];

        let matrix = encoder.encode_batch(&rows).unwrap();
        assert_eq!(matrix.dim(), (2, schema.len()));
        assert_eq!(matrix.row(1).to_vec(), encoder.encode(&rows[1]).vector.as_slice());
    }

    #[test]
    fn test_schema_without_numeric_column_skips_it() {
        let schema = FeatureSchema::from_parts(
            crate::schema::SCHEMA_VERSION,
            vec!["bath".to_string(), "location_Whitefield".to_string()],
            None,
            None,
        )
        .unwrap();
        let encoded = FeatureEncoder::new(&schema).encode(&record("Whitefield", "Plot Area"));
        assert_eq!(encoded.vector.as_slice(), &[2.0, 1.0]);
        // No reference stored for area_type: any value counts as unseen.
        assert_eq!(encoded.area_type, CategoryMatch::Unseen);
    }

    #[test]
    fn test_decode_round_trip() {
        let schema = toy_schema();
        let original = CleanedRecord {
            total_sqft: 1537.5,
            bath: 3.0,
            bhk: 3,
            balcony: 2.0,
            location: "Sarjapur".to_string(),
            area_type: "Super built-up Area".to_string(),
            price: 0.0,
        };

        let encoded = FeatureEncoder::new(&schema).encode(&original);
        let decoded = schema.decode(&encoded.vector).unwrap();

        assert_eq!(decoded.total_sqft, Some(1537.5));
        assert_eq!(decoded.bath, Some(3.0));
        assert_eq!(decoded.bhk, Some(3.0));
        assert_eq!(decoded.balcony, Some(2.0));
        assert_eq!(decoded.location.as_deref(), Some("Sarjapur"));
        assert_eq!(decoded.area_type.as_deref(), Some("Super built-up Area"));
    }

    #[test]
    fn test_decode_rejects_wrong_length() {
        let schema = toy_schema();
        let other = FeatureSchema::from_records(&[record("Hebbal", "Plot Area")]).unwrap();
        let encoded = FeatureEncoder::new(&other).encode(&record("Hebbal", "Plot Area"));

        assert!(matches!(
            schema.decode(&encoded.vector),
            Err(PricingError::FeatureMismatch { .. })
        ));
    }

    fn location_strategy() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("Whitefield".to_string()),
            Just("Hebbal".to_string()),
            Just("Sarjapur".to_string()),
            Just("other".to_string()),
            "[A-Za-z ]{1,12}",
        ]
    }

    fn area_type_strategy() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("Super built-up Area".to_string()),
            Just("Built-up Area".to_string()),
            Just("Plot Area".to_string()),
            Just("Carpet Area".to_string()),
            "[A-Za-z ]{1,12}",
        ]
    }

    proptest! {
        #[test]
        fn prop_length_always_matches_schema(
            location in location_strategy(),
            area_type in area_type_strategy(),
            sqft in 300.0f64..10_000.0,
            bhk in 1u32..10,
        ) {
            let schema = toy_schema();
            let row = CleanedRecord { total_sqft: sqft, bhk, ..record(&location, &area_type) };
            let encoded = FeatureEncoder::new(&schema).encode(&row);
            prop_assert_eq!(encoded.vector.len(), schema.len());
        }

        #[test]
        fn prop_round_trip_reproduces_known_values(
            location in prop_oneof![Just("Whitefield"), Just("Hebbal"), Just("Sarjapur"), Just("other")],
            area_type in prop_oneof![
                Just("Super built-up Area"), Just("Built-up Area"), Just("Plot Area"), Just("Carpet Area")
            ],
            sqft in 300.0f64..10_000.0,
            bath in 1u32..10,
            bhk in 1u32..10,
            balcony in 0u32..5,
        ) {
            let schema = toy_schema();
            let row = CleanedRecord {
                total_sqft: sqft,
                bath: f64::from(bath),
                bhk,
                balcony: f64::from(balcony),
                location: location.to_string(),
                area_type: area_type.to_string(),
                price: 0.0,
            };
            let encoded = FeatureEncoder::new(&schema).encode(&row);
            let decoded = schema.decode(&encoded.vector).unwrap();

            prop_assert_eq!(decoded.total_sqft, Some(sqft));
            prop_assert_eq!(decoded.bath, Some(f64::from(bath)));
            prop_assert_eq!(decoded.bhk, Some(f64::from(bhk)));
            prop_assert_eq!(decoded.balcony, Some(f64::from(balcony)));
            prop_assert_eq!(decoded.location.as_deref(), Some(location));
            prop_assert_eq!(decoded.area_type.as_deref(), Some(area_type));
        }
    }
}
