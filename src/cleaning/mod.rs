//! Cleaning stage: raw listings → cleaned records.
//!
//! The full training-time sequence, in order:
//!
//! 1. drop exact duplicate rows;
//! 2. [`filter_valid`]: drop rows lacking price, bathrooms, a readable
//!    bedroom count or a readable square footage;
//! 3. drop outliers with less than `min_sqft_per_bhk` square feet per bedroom;
//! 4. fill missing locations with `"other"` and collapse rare locations
//!    ([`LocationMap`]), counting over the rows that survived step 3;
//! 5. drop rows whose balcony count or area type is missing.
//!
//! Parse failures never raise; they make a record fail step 2.

mod location;
mod parse;

pub use location::{collapse_rare_locations, LocationMap, OTHER_LOCATION};
pub use parse::{extract_bedroom_count, normalize_label, normalize_square_footage};

use crate::config::PipelineConfig;
use crate::dataset::RawRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A listing whose required fields have all been read.
///
/// Intermediate form between [`filter_valid`] and the location collapse.
#[derive(Clone, Debug, PartialEq)]
pub struct ParsedRecord {
    pub total_sqft: f64,
    pub bath: f64,
    pub bhk: u32,
    pub balcony: Option<f64>,
    /// Trimmed location, `"other"` when missing.
    pub location: String,
    /// Whitespace-normalized area type.
    pub area_type: Option<String>,
    pub price: f64,
}

impl ParsedRecord {
    /// Square feet per bedroom. Infinite for a zero bedroom count, NaN when
    /// both are zero.
    pub fn sqft_per_bhk(&self) -> f64 {
        self.total_sqft / f64::from(self.bhk)
    }
}

/// A fully cleaned listing, ready for encoding.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CleanedRecord {
    pub total_sqft: f64,
    pub bath: f64,
    pub bhk: u32,
    pub balcony: f64,
    /// A frequent training location or `"other"`.
    pub location: String,
    pub area_type: String,
    pub price: f64,
}

/// Why rows were dropped during cleaning.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleaningReport {
    pub raw_rows: usize,
    pub duplicates: usize,
    pub missing_price: usize,
    pub missing_sqft: usize,
    pub missing_bath: usize,
    pub missing_bhk: usize,
    pub outliers: usize,
    pub missing_balcony: usize,
    pub missing_area_type: usize,
    /// Distinct locations folded into `"other"`.
    pub collapsed_locations: usize,
    pub kept: usize,
}

/// Output of [`Cleaner::clean`].
#[derive(Clone, Debug)]
pub struct CleanedCorpus {
    pub records: Vec<CleanedRecord>,
    pub locations: LocationMap,
    pub report: CleaningReport,
}

fn clean_location(location: Option<&str>) -> String {
    match location.map(str::trim) {
        Some(loc) if !loc.is_empty() => loc.to_string(),
        _ => OTHER_LOCATION.to_string(),
    }
}

fn parse_record(raw: &RawRecord, report: &mut CleaningReport) -> Option<ParsedRecord> {
    let Some(price) = raw.price.filter(|p| p.is_finite()) else {
        report.missing_price += 1;
        return None;
    };
    let Some(total_sqft) = raw.total_sqft.as_deref().and_then(normalize_square_footage) else {
        report.missing_sqft += 1;
        return None;
    };
    let Some(bath) = raw.bath.filter(|b| b.is_finite()) else {
        report.missing_bath += 1;
        return None;
    };
    let Some(bhk) = raw.size.as_deref().and_then(extract_bedroom_count) else {
        report.missing_bhk += 1;
        return None;
    };

    Some(ParsedRecord {
        total_sqft,
        bath,
        bhk,
        balcony: raw.balcony.filter(|b| b.is_finite()),
        location: clean_location(raw.location.as_deref()),
        area_type: raw
            .area_type
            .as_deref()
            .map(normalize_label)
            .filter(|a| !a.is_empty()),
        price,
    })
}

/// Drop every record lacking price, bathrooms, bedroom count or square footage.
///
/// Each dropped record is tallied once, under the first missing field in the
/// order price, square footage, bathrooms, bedrooms.
pub fn filter_valid(records: &[RawRecord], report: &mut CleaningReport) -> Vec<ParsedRecord> {
    records
        .iter()
        .filter_map(|raw| parse_record(raw, report))
        .collect()
}

/// `true` when a listing has less than `min_sqft_per_bhk` square feet per
/// bedroom. Exactly the threshold is kept, and so is a zero bedroom count
/// with positive area (infinite ratio); an undefined ratio (0 / 0) is not.
pub fn is_outlier(record: &ParsedRecord, min_sqft_per_bhk: f64) -> bool {
    let ratio = record.sqft_per_bhk();
    ratio.is_nan() || ratio < min_sqft_per_bhk
}

/// Runs the training-time cleaning sequence.
#[derive(Clone, Debug)]
pub struct Cleaner {
    min_location_support: usize,
    min_sqft_per_bhk: f64,
}

impl Default for Cleaner {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}

impl Cleaner {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            min_location_support: config.min_location_support,
            min_sqft_per_bhk: config.min_sqft_per_bhk,
        }
    }

    pub fn with_min_location_support(mut self, min_support: usize) -> Self {
        self.min_location_support = min_support;
        self
    }

    pub fn with_min_sqft_per_bhk(mut self, threshold: f64) -> Self {
        self.min_sqft_per_bhk = threshold;
        self
    }

    pub fn clean(&self, raw: &[RawRecord]) -> CleanedCorpus {
        let mut report = CleaningReport {
            raw_rows: raw.len(),
            ..Default::default()
        };

        let mut seen = HashSet::with_capacity(raw.len());
        let mut unique: Vec<RawRecord> = Vec::with_capacity(raw.len());
        for record in raw {
            if seen.insert(record.dedup_key()) {
                unique.push(record.clone());
            }
        }
        report.duplicates = raw.len() - unique.len();

        let valid = filter_valid(&unique, &mut report);

        let before_outliers = valid.len();
        let plausible: Vec<ParsedRecord> = valid
            .into_iter()
            .filter(|record| !is_outlier(record, self.min_sqft_per_bhk))
            .collect();
        report.outliers = before_outliers - plausible.len();

        let locations = collapse_rare_locations(
            plausible.iter().map(|record| record.location.as_str()),
            self.min_location_support,
        );
        report.collapsed_locations = locations.n_collapsed();

        let mut records = Vec::with_capacity(plausible.len());
        for record in plausible {
            let Some(balcony) = record.balcony else {
                report.missing_balcony += 1;
                continue;
            };
            let Some(area_type) = record.area_type else {
                report.missing_area_type += 1;
                continue;
            };
            records.push(CleanedRecord {
                total_sqft: record.total_sqft,
                bath: record.bath,
                bhk: record.bhk,
                balcony,
                location: locations.resolve(&record.location).to_string(),
                area_type,
                price: record.price,
            });
        }
        report.kept = records.len();

        tracing::info!(
            raw = report.raw_rows,
            duplicates = report.duplicates,
            missing = report.missing_price
                + report.missing_sqft
                + report.missing_bath
                + report.missing_bhk,
            outliers = report.outliers,
            collapsed_locations = report.collapsed_locations,
            min_location_support = locations.min_support(),
            kept = report.kept,
            "cleaned listings"
        );

        CleanedCorpus {
            records,
            locations,
            report,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(location: &str, size: &str, sqft: &str, price: f64) -> RawRecord {
        RawRecord {
            area_type: Some("Super built-up  Area".into()),
            availability: Some("Ready To Move".into()),
            location: Some(location.into()),
            size: Some(size.into()),
            society: None,
            total_sqft: Some(sqft.into()),
            bath: Some(2.0),
            balcony: Some(1.0),
            price: Some(price),
        }
    }

    fn listings(location: &str, n: usize) -> Vec<RawRecord> {
        // distinct prices keep the rows from being duplicates
        (0..n)
            .map(|i| raw(location, "2 BHK", "1200", 50.0 + i as f64))
            .collect()
    }

    #[test]
    fn test_filter_valid_drops_missing_fields() {
        let mut report = CleaningReport::default();
        let records = vec![
            raw("Hebbal", "2 BHK", "1200", 80.0),
            RawRecord {
                price: None,
                ..raw("Hebbal", "2 BHK", "1200", 0.0)
            },
            raw("Hebbal", "2 BHK", "34.46Sq. Meter", 80.0),
            RawRecord {
                bath: None,
                ..raw("Hebbal", "2 BHK", "1200", 80.0)
            },
            raw("Hebbal", "Studio", "1200", 80.0),
        ];

        let valid = filter_valid(&records, &mut report);

        assert_eq!(valid.len(), 1);
        assert_eq!(report.missing_price, 1);
        assert_eq!(report.missing_sqft, 1);
        assert_eq!(report.missing_bath, 1);
        assert_eq!(report.missing_bhk, 1);
    }

    #[test]
    fn test_filter_valid_parses_fields() {
        let mut report = CleaningReport::default();
        let valid = filter_valid(&[raw("  Whitefield ", "3 BHK", "1000-1200", 90.0)], &mut report);

        let record = &valid[0];
        assert_eq!(record.bhk, 3);
        assert_eq!(record.total_sqft, 1100.0);
        assert_eq!(record.location, "Whitefield");
        assert_eq!(record.area_type.as_deref(), Some("Super built-up Area"));
    }

    #[test]
    fn test_missing_location_becomes_other() {
        let mut report = CleaningReport::default();
        let record = RawRecord {
            location: None,
            ..raw("", "2 BHK", "1200", 80.0)
        };
        let valid = filter_valid(&[record], &mut report);
        assert_eq!(valid[0].location, OTHER_LOCATION);
    }

    #[test]
    fn test_outlier_boundary_is_kept() {
        let mut report = CleaningReport::default();
        let valid = filter_valid(
            &[
                raw("Hebbal", "2 BHK", "600", 40.0),
                raw("Hebbal", "2 BHK", "599", 40.0),
                raw("Hebbal", "0 BHK", "600", 40.0),
                raw("Hebbal", "0 BHK", "0", 40.0),
            ],
            &mut report,
        );

        assert!(!is_outlier(&valid[0], 300.0));
        assert!(is_outlier(&valid[1], 300.0));
        assert!(!is_outlier(&valid[2], 300.0));
        assert!(is_outlier(&valid[3], 300.0));
    }

    #[test]
    fn test_missing_area_type_is_dropped_not_aliased() {
        let mut rows = listings("Hebbal", 11);
        rows.push(RawRecord {
            area_type: None,
            ..raw("Hebbal", "2 BHK", "1200", 99.0)
        });

        let corpus = Cleaner::default().clean(&rows);

        assert_eq!(corpus.report.missing_area_type, 1);
        assert_eq!(corpus.report.kept, 11);
        assert!(corpus.records.iter().all(|r| r.price != 99.0));
    }

    #[test]
    fn test_zero_bedroom_listing_survives_cleaning() {
        let mut rows = listings("Hebbal", 11);
        rows.push(raw("Hebbal", "0 BHK", "1200", 99.0));

        let corpus = Cleaner::default().clean(&rows);

        assert_eq!(corpus.report.outliers, 0);
        assert_eq!(corpus.report.kept, 12);
        assert!(corpus.records.iter().any(|r| r.bhk == 0));
    }

    #[test]
    fn test_clean_collapses_rare_locations() {
        let mut rows = listings("Whitefield", 50);
        rows.extend(listings("Rareville", 3));

        let corpus = Cleaner::default().clean(&rows);

        assert_eq!(corpus.records.len(), 53);
        let rare: Vec<_> = corpus.records[50..].iter().map(|r| r.location.as_str()).collect();
        assert_eq!(rare, vec![OTHER_LOCATION; 3]);
        assert!(corpus.records[..50]
            .iter()
            .all(|r| r.location == "Whitefield"));
        assert_eq!(corpus.report.collapsed_locations, 1);
    }

    #[test]
    fn test_clean_drops_duplicates_and_outliers() {
        let mut rows = listings("Whitefield", 12);
        rows.push(rows[0].clone());
        rows.push(raw("Whitefield", "4 BHK", "1000", 70.0));

        let corpus = Cleaner::default().clean(&rows);

        assert_eq!(corpus.report.raw_rows, 14);
        assert_eq!(corpus.report.duplicates, 1);
        assert_eq!(corpus.report.outliers, 1);
        assert_eq!(corpus.report.kept, 12);
    }

    #[test]
    fn test_location_counts_ignore_outliers() {
        // 10 Hebbal rows, but one is an outlier: Hebbal falls under the threshold.
        let mut rows = listings("Hebbal", 9);
        rows.push(raw("Hebbal", "5 BHK", "900", 60.0));

        let corpus = Cleaner::default().clean(&rows);

        assert_eq!(corpus.report.outliers, 1);
        assert!(corpus.records.iter().all(|r| r.location == OTHER_LOCATION));
    }

    #[test]
    fn test_missing_balcony_dropped_after_location_count() {
        let mut rows = listings("Hebbal", 10);
        rows[0].balcony = None;

        let corpus = Cleaner::default().clean(&rows);

        assert_eq!(corpus.report.missing_balcony, 1);
        assert_eq!(corpus.records.len(), 9);
        assert!(corpus.records.iter().all(|r| r.location == "Hebbal"));
    }

    #[test]
    fn test_thresholds_are_configurable() {
        let mut rows = listings("Hebbal", 3);
        rows.push(raw("Hebbal", "2 BHK", "500", 45.0));

        let corpus = Cleaner::default()
            .with_min_location_support(3)
            .with_min_sqft_per_bhk(250.0)
            .clean(&rows);

        assert_eq!(corpus.report.outliers, 0);
        assert!(corpus.records.iter().all(|r| r.location == "Hebbal"));
    }

    #[test]
    fn test_cleaned_numeric_fields_are_finite() {
        let rows = vec![
            raw("Hebbal", "2 BHK", "1e400", 45.0),
            RawRecord {
                bath: Some(f64::NAN),
                ..raw("Hebbal", "2 BHK", "1200", 45.0)
            },
            raw("Hebbal", "2 BHK", "1200", 45.0),
        ];
        let corpus = Cleaner::default().clean(&rows);

        assert_eq!(corpus.records.len(), 1);
        let r = &corpus.records[0];
        assert!(r.total_sqft.is_finite() && r.bath.is_finite() && r.balcony.is_finite());
    }
}
