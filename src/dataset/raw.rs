//! Raw listings as they appear in the training CSV.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// One listing exactly as ingested.
///
/// Text columns stay untouched; the cleaning stage owns every interpretation.
/// Numeric columns that are empty or not numbers read as `None`. Columns not
/// named here (e.g. a precomputed `price_per_sqft`) are ignored, so they can
/// never leak into the feature set.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(default)]
    pub area_type: Option<String>,
    #[serde(default)]
    pub availability: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    /// Bedroom count as free text, e.g. "2 BHK" or "4 Bedroom".
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub society: Option<String>,
    /// Square footage as free text, e.g. "1056" or "1000-1200".
    #[serde(default)]
    pub total_sqft: Option<String>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub bath: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub balcony: Option<f64>,
    /// Sale price in Lakhs (training label).
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub price: Option<f64>,
}

/// Hashable identity of a raw row, used to drop exact duplicates.
pub(crate) type DedupKey<'a> = ([Option<&'a str>; 6], [Option<u64>; 3]);

impl RawRecord {
    pub(crate) fn dedup_key(&self) -> DedupKey<'_> {
        (
            [
                self.area_type.as_deref(),
                self.availability.as_deref(),
                self.location.as_deref(),
                self.size.as_deref(),
                self.society.as_deref(),
                self.total_sqft.as_deref(),
            ],
            [
                self.bath.map(f64::to_bits),
                self.balcony.map(f64::to_bits),
                self.price.map(f64::to_bits),
            ],
        )
    }
}

/// Read raw records from any CSV source with a header row.
pub fn read_raw_records<R: Read>(reader: R) -> Result<Vec<RawRecord>> {
    let mut rdr = csv::ReaderBuilder::new().from_reader(reader);
    let n_columns = rdr.headers()?.len();

    let records = rdr
        .deserialize::<RawRecord>()
        .collect::<std::result::Result<Vec<_>, _>>()?;

    tracing::info!(
        rows = records.len(),
        columns = n_columns,
        "loaded raw listings"
    );
    Ok(records)
}

/// Read raw records from a CSV file on disk.
pub fn load_raw_records<P: AsRef<Path>>(path: P) -> Result<Vec<RawRecord>> {
    let file = File::open(path.as_ref())?;
    read_raw_records(BufReader::new(file))
}
