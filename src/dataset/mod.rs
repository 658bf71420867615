//! Dataset abstractions: raw CSV ingestion, in-memory feature matrices and
//! index splitting.
//!
//! # Core Concepts
//!
//! - **RawRecord**: one listing exactly as it appears in the training CSV.
//! - **Dataset**: a source of `(X, y)` pairs where `X` is a feature matrix of
//!   shape `(n_samples, n_features)` and `y` is a target vector of shape
//!   `(n_samples,)`.
//! - **Batch**: a contiguous subset of samples for mini-batch gradient descent.
//!
//! # Example
//!
//! ```rust
//! use house_price_estimator::dataset::{Dataset, InMemoryDataset};
//! use ndarray::{array, Array1};
//!
//! let x = array![[1.0], [2.0]];
//! let y = Array1::from(vec![0.0, 1.0]);
//! let dataset = InMemoryDataset::new(x, y).unwrap();
//!
//! for batch in dataset.batches(1) {
//!     let (x_batch, y_batch) = batch.unwrap();
//!     assert_eq!(x_batch.nrows(), y_batch.len());
//! }
//! ```

use crate::error::{PricingError, Result};
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::{fmt::Debug, ops::Range};

pub mod memory;
pub mod raw;

pub use self::memory::InMemoryDataset;
pub use self::raw::{load_raw_records, read_raw_records, RawRecord};

/// Abstract interface for a training dataset.
///
/// Defines a contract for loading data in `(X, y)` format where:
/// - `X`: Feature matrix with shape `(n_samples, n_features)`
/// - `y`: Target vector with shape `(n_samples,)`
pub trait Dataset {
    /// Error type returned when accessing data.
    type Error: Debug + 'static;

    /// Returns the total number of samples in the dataset, if known.
    fn len(&self) -> Option<usize>;

    /// Checks whether the dataset is empty.
    fn is_empty(&self) -> bool {
        self.len() == Some(0)
    }

    /// Creates an iterator over fixed-size batches (the last one may be smaller).
    fn batches(&self, batch_size: usize) -> DatasetBatchIter<'_, Self>
    where
        Self: Sized,
    {
        DatasetBatchIter {
            dataset: self,
            batch_size: batch_size.max(1),
            current: 0,
        }
    }

    /// Loads the samples in `range` as an owned feature matrix and target vector.
    fn get_batch(
        &self,
        range: Range<usize>,
    ) -> std::result::Result<(Array2<f64>, Array1<f64>), Self::Error>;
}

/// Iterator over dataset batches, created by [`Dataset::batches`].
///
/// Data is fetched lazily; errors from `get_batch` are yielded as `Some(Err(_))`.
pub struct DatasetBatchIter<'a, D: ?Sized> {
    dataset: &'a D,
    batch_size: usize,
    current: usize,
}

impl<'a, D: Dataset> Iterator for DatasetBatchIter<'a, D> {
    type Item = std::result::Result<(Array2<f64>, Array1<f64>), D::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let total = self.dataset.len()?;
        if self.current >= total {
            return None;
        }

        let end = (self.current + self.batch_size).min(total);
        let range = self.current..end;
        self.current = end;

        Some(self.dataset.get_batch(range))
    }
}

/// Shuffled train/test split of `n` row indices.
///
/// The test side receives `ceil(n * test_size)` rows. The shuffle is driven
/// by `StdRng::seed_from_u64(seed)`, so the split is reproducible.
pub fn train_test_split(
    n: usize,
    test_size: f64,
    seed: u64,
) -> Result<(Vec<usize>, Vec<usize>)> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(PricingError::InvalidParameter(format!(
            "test_size must be in (0, 1), got {}",
            test_size
        )));
    }

    let n_test = (n as f64 * test_size).ceil() as usize;
    if n < 2 || n_test >= n {
        return Err(PricingError::EmptyData(format!(
            "cannot split {} rows with test_size {}",
            n, test_size
        )));
    }

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let test = indices[..n_test].to_vec();
    let train = indices[n_test..].to_vec();
    Ok((train, test))
}

/// Contiguous K-fold partition of `n` row indices, as `(train, validation)` pairs.
///
/// The first `n % k` folds hold one extra row.
pub fn k_fold(n: usize, k: usize) -> Result<Vec<(Vec<usize>, Vec<usize>)>> {
    if k < 2 {
        return Err(PricingError::InvalidParameter(format!(
            "k-fold needs at least 2 folds, got {}",
            k
        )));
    }
    if n < k {
        return Err(PricingError::EmptyData(format!(
            "cannot make {} folds from {} rows",
            k, n
        )));
    }

    let base = n / k;
    let extra = n % k;
    let mut folds = Vec::with_capacity(k);
    let mut start = 0;

    for fold in 0..k {
        let size = base + usize::from(fold < extra);
        let end = start + size;
        let validation: Vec<usize> = (start..end).collect();
        let train: Vec<usize> = (0..start).chain(end..n).collect();
        folds.push((train, validation));
        start = end;
    }

    Ok(folds)
}
