use crate::dataset::Dataset;
use crate::error::{PricingError, Result};
use ndarray::{s, Array1, Array2, Axis};
use std::ops::Range;

/// Encoded feature matrix and price targets held in memory.
#[derive(Clone, Debug)]
pub struct InMemoryDataset {
    x: Array2<f64>,
    y: Array1<f64>,
}

impl InMemoryDataset {
    pub fn new(x: Array2<f64>, y: Array1<f64>) -> Result<Self> {
        if x.nrows() != y.len() {
            return Err(PricingError::FeatureMismatch {
                expected: x.nrows(),
                got: y.len(),
            });
        }
        if x.nrows() == 0 {
            return Err(PricingError::EmptyData("dataset has no rows".into()));
        }
        Ok(Self { x, y })
    }

    pub fn features(&self) -> &Array2<f64> {
        &self.x
    }

    pub fn targets(&self) -> &Array1<f64> {
        &self.y
    }

    pub fn n_features(&self) -> usize {
        self.x.ncols()
    }

    /// Copy out the rows at `indices`, in that order.
    pub fn select(&self, indices: &[usize]) -> Result<Self> {
        Self::new(
            self.x.select(Axis(0), indices),
            self.y.select(Axis(0), indices),
        )
    }
}

impl Dataset for InMemoryDataset {
    type Error = std::convert::Infallible;

    fn len(&self) -> Option<usize> {
        Some(self.x.nrows())
    }

    fn get_batch(
        &self,
        range: Range<usize>,
    ) -> std::result::Result<(Array2<f64>, Array1<f64>), Self::Error> {
        let batch_x = self.x.slice(s![range.clone(), ..]).to_owned();
        let batch_y = self.y.slice(s![range]).to_owned();
        Ok((batch_x, batch_y))
    }
}
