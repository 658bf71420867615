//! Max-Abs Scaler.
//!
//! Scales each feature by its maximum absolute value so that every training
//! value lies in `[-1, 1]`. It does not center the data, so one-hot indicator
//! columns stay exactly 0 or 1, and gradient descent on the scaled matrix is
//! stable for any step size below `1 / max_row_norm²`.

use crate::error::{PricingError, Result};
use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

/// MaxAbsScaler transformer (unfitted).
#[derive(Clone, Copy, Debug, Default)]
pub struct MaxAbsScaler;

impl MaxAbsScaler {
    pub fn new() -> Self {
        Self
    }

    pub fn fit(&self, data: &Array2<f64>) -> Result<FittedMaxAbsScaler> {
        if data.nrows() == 0 {
            return Err(PricingError::EmptyData(
                "Cannot fit MaxAbsScaler on empty data".to_string(),
            ));
        }
        if data.iter().any(|v| !v.is_finite()) {
            return Err(PricingError::InvalidInput(
                "MaxAbsScaler expects finite values".to_string(),
            ));
        }

        let max_abs: Vec<f64> = data
            .axis_iter(Axis(1))
            .map(|col| col.iter().fold(0.0f64, |acc, v| acc.max(v.abs())))
            .collect();

        // A constant-zero column is divided by 1.0.
        let divisor: Vec<f64> = max_abs
            .iter()
            .map(|&m| if m == 0.0 { 1.0 } else { m })
            .collect();

        Ok(FittedMaxAbsScaler { max_abs, divisor })
    }

    pub fn fit_transform(&self, data: &Array2<f64>) -> Result<(FittedMaxAbsScaler, Array2<f64>)> {
        let fitted = self.fit(data)?;
        let transformed = fitted.transform(data)?;
        Ok((fitted, transformed))
    }
}

/// Fitted MaxAbsScaler; serializable with the model it feeds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FittedMaxAbsScaler {
    max_abs: Vec<f64>,
    divisor: Vec<f64>,
}

impl FittedMaxAbsScaler {
    pub fn n_features(&self) -> usize {
        self.divisor.len()
    }

    /// Maximum absolute training value of each feature.
    pub fn max_abs(&self) -> &[f64] {
        &self.max_abs
    }

    fn check_width(&self, got: usize) -> Result<()> {
        if got != self.n_features() {
            return Err(PricingError::FeatureMismatch {
                expected: self.n_features(),
                got,
            });
        }
        Ok(())
    }

    pub fn transform(&self, data: &Array2<f64>) -> Result<Array2<f64>> {
        self.check_width(data.ncols())?;
        let divisor = ArrayView1::from(self.divisor.as_slice());
        Ok(data / &divisor)
    }

    pub fn transform_row(&self, row: ArrayView1<'_, f64>) -> Result<Array1<f64>> {
        self.check_width(row.len())?;
        let divisor = ArrayView1::from(self.divisor.as_slice());
        Ok(&row / &divisor)
    }
}
