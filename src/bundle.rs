//! The persisted model bundle: a fitted regressor and the schema it was
//! trained against, written and read as one unit.
//!
//! Little-endian layout:
//!
//! ```text
//! magic            4 bytes  "HPEB"
//! format_version   u16
//! model_kind       u16 len + UTF-8
//! reference flags  u8       bit 0: area_type, bit 1: location
//! references       u32 len + UTF-8, for each flagged field in that order
//! column_count     u32
//! columns          column_count × (u32 len + UTF-8)
//! model_len        u64
//! model            bincode-encoded regressor
//! ```

use crate::error::{PricingError, Result};
use crate::model::{FittedLinearRegressor, Regressor};
use crate::schema::{CategoricalField, FeatureSchema};
use std::path::Path;

const MAGIC: &[u8; 4] = b"HPEB";

/// Current bundle format version (also the schema version it carries).
pub const BUNDLE_VERSION: u16 = crate::schema::SCHEMA_VERSION;

const AREA_TYPE_FLAG: u8 = 0b01;
const LOCATION_FLAG: u8 = 0b10;

/// A fitted regressor paired with its feature schema.
///
/// Immutable: created once by training, loaded read-only by serving.
#[derive(Clone, Debug, PartialEq)]
pub struct ModelBundle<M = FittedLinearRegressor> {
    model: M,
    schema: FeatureSchema,
}

impl<M: Regressor> ModelBundle<M> {
    /// Pair a model with its schema; their widths must agree.
    pub fn new(model: M, schema: FeatureSchema) -> Result<Self> {
        if model.n_features() != schema.len() {
            return Err(PricingError::FeatureMismatch {
                expected: schema.len(),
                got: model.n_features(),
            });
        }
        Ok(Self { model, schema })
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn into_parts(self) -> (M, FeatureSchema) {
        (self.model, self.schema)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let model = bincode::serialize(&self.model)?;

        let mut out = Vec::with_capacity(64 + model.len());
        out.extend_from_slice(MAGIC);
        out.extend_from_slice(&self.schema.version().to_le_bytes());
        write_str_u16(&mut out, M::KIND)?;

        let area_type = self.schema.reference(CategoricalField::AreaType);
        let location = self.schema.reference(CategoricalField::Location);
        let flags = area_type.map_or(0, |_| AREA_TYPE_FLAG) | location.map_or(0, |_| LOCATION_FLAG);
        out.push(flags);
        for reference in [area_type, location].into_iter().flatten() {
            write_str_u32(&mut out, reference)?;
        }

        write_len_u32(&mut out, self.schema.len())?;
        for column in self.schema.columns() {
            write_str_u32(&mut out, column)?;
        }

        out.extend_from_slice(&(model.len() as u64).to_le_bytes());
        out.extend_from_slice(&model);
        Ok(out)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut reader = Reader::new(bytes);

        if reader.take(MAGIC.len(), "magic")? != MAGIC {
            return Err(corrupt("not a model bundle (bad magic)"));
        }
        let version = reader.u16("format version")?;
        if version == 0 || version > BUNDLE_VERSION {
            return Err(corrupt(format!("unsupported format version {}", version)));
        }

        let kind = reader.str_u16("model kind")?;
        if kind != M::KIND {
            return Err(corrupt(format!(
                "bundle holds a '{}' model, expected '{}'",
                kind,
                M::KIND
            )));
        }

        let flags = reader.u8("reference flags")?;
        if flags & !(AREA_TYPE_FLAG | LOCATION_FLAG) != 0 {
            return Err(corrupt(format!("unknown reference flags {:#04x}", flags)));
        }
        let area_type = match flags & AREA_TYPE_FLAG {
            0 => None,
            _ => Some(reader.str_u32("area_type reference")?.to_string()),
        };
        let location = match flags & LOCATION_FLAG {
            0 => None,
            _ => Some(reader.str_u32("location reference")?.to_string()),
        };

        let n_columns = reader.u32("column count")? as usize;
        let mut columns = Vec::with_capacity(n_columns.min(bytes.len()));
        for _ in 0..n_columns {
            columns.push(reader.str_u32("column name")?.to_string());
        }
        let schema = FeatureSchema::from_parts(version, columns, area_type, location)
            .map_err(|e| corrupt(format!("invalid schema: {}", e)))?;

        let model_len = usize::try_from(reader.u64("model length")?)
            .map_err(|_| corrupt("model length overflows"))?;
        let model: M = bincode::deserialize(reader.take(model_len, "model")?)
            .map_err(|e| corrupt(format!("model: {}", e)))?;
        reader.finish()?;

        model
            .validate()
            .map_err(|e| corrupt(format!("inconsistent model: {}", e)))?;
        Self::new(model, schema)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = self.to_bytes()?;
        std::fs::write(path.as_ref(), &bytes)?;
        tracing::info!(
            path = %path.as_ref().display(),
            bytes = bytes.len(),
            columns = self.schema.len(),
            "saved model bundle"
        );
        Ok(())
    }

    /// Read and validate a bundle. A missing file is an I/O error; anything
    /// undecodable is [`PricingError::CorruptBundle`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        let bundle = Self::from_bytes(&bytes)?;
        tracing::info!(
            path = %path.as_ref().display(),
            columns = bundle.schema.len(),
            kind = M::KIND,
            "loaded model bundle"
        );
        Ok(bundle)
    }
}

fn corrupt(message: impl Into<String>) -> PricingError {
    PricingError::CorruptBundle(message.into())
}

fn write_len_u32(out: &mut Vec<u8>, len: usize) -> Result<()> {
    let len = u32::try_from(len)
        .map_err(|_| PricingError::InvalidParameter(format!("length {} overflows u32", len)))?;
    out.extend_from_slice(&len.to_le_bytes());
    Ok(())
}

fn write_str_u32(out: &mut Vec<u8>, s: &str) -> Result<()> {
    write_len_u32(out, s.len())?;
    out.extend_from_slice(s.as_bytes());
    Ok(())
}

fn write_str_u16(out: &mut Vec<u8>, s: &str) -> Result<()> {
    let len = u16::try_from(s.len())
        .map_err(|_| PricingError::InvalidParameter(format!("'{}' is too long", s)))?;
    out.extend_from_slice(&len.to_le_bytes());
    out.extend_from_slice(s.as_bytes());
    Ok(())
}

/// Bounds-checked cursor over the bundle bytes.
struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take(&mut self, n: usize, what: &str) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.bytes.len())
            .ok_or_else(|| corrupt(format!("truncated while reading {}", what)))?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self, what: &str) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        buf.copy_from_slice(self.take(N, what)?);
        Ok(buf)
    }

    fn u8(&mut self, what: &str) -> Result<u8> {
        Ok(self.array::<1>(what)?[0])
    }

    fn u16(&mut self, what: &str) -> Result<u16> {
        self.array(what).map(u16::from_le_bytes)
    }

    fn u32(&mut self, what: &str) -> Result<u32> {
        self.array(what).map(u32::from_le_bytes)
    }

    fn u64(&mut self, what: &str) -> Result<u64> {
        self.array(what).map(u64::from_le_bytes)
    }

    fn utf8(&mut self, len: usize, what: &str) -> Result<&'a str> {
        std::str::from_utf8(self.take(len, what)?)
            .map_err(|_| corrupt(format!("{} is not valid UTF-8", what)))
    }

    fn str_u16(&mut self, what: &str) -> Result<&'a str> {
        let len = self.u16(what)? as usize;
        self.utf8(len, what)
    }

    fn str_u32(&mut self, what: &str) -> Result<&'a str> {
        let len = self.u32(what)? as usize;
        self.utf8(len, what)
    }

    fn finish(&self) -> Result<()> {
        if self.pos != self.bytes.len() {
            return Err(corrupt(format!(
                "{} trailing bytes",
                self.bytes.len() - self.pos
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Fitted, LinearModel, LinearParams};
    use crate::scaling::MaxAbsScaler;
    use ndarray::array;

    fn schema() -> FeatureSchema {
        FeatureSchema::from_parts(
            BUNDLE_VERSION,
            vec![
                "total_sqft".to_string(),
                "bath".to_string(),
                "balcony".to_string(),
                "bhk".to_string(),
                "area_type_Super built-up Area".to_string(),
                "location_other".to_string(),
            ],
            Some("Plot Area".to_string()),
            Some("Hebbal".to_string()),
        )
        .unwrap()
    }

    fn model(width: usize) -> FittedLinearRegressor {
        let x = ndarray::Array2::from_elem((1, width), 2.0);
        let scaler = MaxAbsScaler::new().fit(&x).unwrap();
        let params = LinearParams {
            weights: ndarray::Array1::linspace(1.0, width as f64, width),
            bias: 3.5,
        };
        FittedLinearRegressor::from_parts(scaler, LinearModel::<Fitted>::new(params)).unwrap()
    }

    fn bundle() -> ModelBundle {
        ModelBundle::new(model(6), schema()).unwrap()
    }

    #[test]
    fn test_bytes_roundtrip() {
        let original = bundle();
        let restored = ModelBundle::<FittedLinearRegressor>::from_bytes(&original.to_bytes().unwrap())
            .unwrap();
        assert_eq!(restored, original);
        assert_eq!(
            restored.schema().reference(CategoricalField::Location),
            Some("Hebbal")
        );
    }

    #[test]
    fn test_header_layout() {
        let bytes = bundle().to_bytes().unwrap();
        assert_eq!(&bytes[..4], b"HPEB");
        assert_eq!(u16::from_le_bytes([bytes[4], bytes[5]]), BUNDLE_VERSION);
        assert_eq!(&bytes[8..18], b"linear-sgd");
        assert_eq!(bytes[18], AREA_TYPE_FLAG | LOCATION_FLAG);
    }

    #[test]
    fn test_new_rejects_width_mismatch() {
        let result = ModelBundle::new(model(5), schema());
        assert!(matches!(
            result,
            Err(PricingError::FeatureMismatch {
                expected: 6,
                got: 5
            })
        ));
    }

    #[test]
    fn test_bad_magic() {
        let mut bytes = bundle().to_bytes().unwrap();
        bytes[0] = b'X';
        assert!(matches!(
            ModelBundle::<FittedLinearRegressor>::from_bytes(&bytes),
            Err(PricingError::CorruptBundle(_))
        ));
    }

    #[test]
    fn test_future_version() {
        let mut bytes = bundle().to_bytes().unwrap();
        bytes[4..6].copy_from_slice(&(BUNDLE_VERSION + 1).to_le_bytes());
        assert!(matches!(
            ModelBundle::<FittedLinearRegressor>::from_bytes(&bytes),
            Err(PricingError::CorruptBundle(_))
        ));
    }

    #[test]
    fn test_every_truncation_is_rejected() {
        let bytes = bundle().to_bytes().unwrap();
        for len in 0..bytes.len() {
            assert!(
                matches!(
                    ModelBundle::<FittedLinearRegressor>::from_bytes(&bytes[..len]),
                    Err(PricingError::CorruptBundle(_))
                ),
                "prefix of {} bytes accepted",
                len
            );
        }
    }

    #[test]
    fn test_trailing_bytes() {
        let mut bytes = bundle().to_bytes().unwrap();
        bytes.push(0);
        assert!(matches!(
            ModelBundle::<FittedLinearRegressor>::from_bytes(&bytes),
            Err(PricingError::CorruptBundle(_))
        ));
    }

    #[test]
    fn test_wrong_model_kind() {
        let mut bytes = bundle().to_bytes().unwrap();
        bytes[8] = b'L';
        assert!(matches!(
            ModelBundle::<FittedLinearRegressor>::from_bytes(&bytes),
            Err(PricingError::CorruptBundle(_))
        ));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.hpeb");

        let original = bundle();
        original.save(&path).unwrap();
        let loaded = ModelBundle::<FittedLinearRegressor>::load(&path).unwrap();

        let row = array![1200.0, 2.0, 1.0, 2.0, 1.0, 0.0];
        assert_eq!(
            loaded.model().predict_one(row.view()).unwrap(),
            original.model().predict_one(row.view()).unwrap()
        );
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = ModelBundle::<FittedLinearRegressor>::load(dir.path().join("absent.hpeb"));
        assert!(matches!(result, Err(PricingError::Io(_))));
    }
}
