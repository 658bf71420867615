//! Regression metrics used to score and report models.

use crate::error::{PricingError, Result};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

fn check(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<()> {
    if y_true.len() != y_pred.len() {
        return Err(PricingError::FeatureMismatch {
            expected: y_true.len(),
            got: y_pred.len(),
        });
    }
    if y_true.is_empty() {
        return Err(PricingError::EmptyData(
            "cannot score an empty prediction set".to_string(),
        ));
    }
    Ok(())
}

/// MSE = mean((y_true - y_pred)^2)
pub fn mse(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<f64> {
    check(y_true, y_pred)?;
    let diff = y_true - y_pred;
    Ok(diff.dot(&diff) / diff.len() as f64)
}

/// RMSE = sqrt(MSE), in the units of the target.
pub fn rmse(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<f64> {
    mse(y_true, y_pred).map(f64::sqrt)
}

/// MAE = mean(|y_true - y_pred|)
pub fn mae(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<f64> {
    check(y_true, y_pred)?;
    Ok((y_true - y_pred).mapv(f64::abs).sum() / y_true.len() as f64)
}

/// Coefficient of determination.
///
/// R² = 1 - SS_res / SS_tot. Negative when the model is worse than
/// predicting the mean. A constant target scores 1.0 on an exact fit and
/// 0.0 otherwise.
pub fn r2(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<f64> {
    check(y_true, y_pred)?;
    let mean = y_true.sum() / y_true.len() as f64;

    let residual = y_true - y_pred;
    let ss_res = residual.dot(&residual);
    let ss_tot = y_true.mapv(|t| (t - mean).powi(2)).sum();

    if ss_tot == 0.0 {
        return Ok(if ss_res == 0.0 { 1.0 } else { 0.0 });
    }
    Ok(1.0 - ss_res / ss_tot)
}

/// All regression metrics at once.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    pub mse: f64,
    pub rmse: f64,
    pub mae: f64,
    pub r2: f64,
}

impl RegressionMetrics {
    pub fn calculate(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<Self> {
        let mse = mse(y_true, y_pred)?;
        Ok(Self {
            mse,
            rmse: mse.sqrt(),
            mae: mae(y_true, y_pred)?,
            r2: r2(y_true, y_pred)?,
        })
    }
}
