use ndarray::{Array1, Array2, ArrayView2, Axis};

use crate::error::{LshError, Result};

/// Row order produced by sorting rows by bucket label.
///
/// `indices()[k]` is the original row index that ends up at position `k`.
/// Kept so callers can invert the reordering themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Permutation {
    indices: Vec<usize>,
}

impl Permutation {
    /// Stable ascending order of `labels`.
    pub fn from_labels(labels: &Array1<usize>) -> Self {
        Self {
            indices: stable_argsort(labels),
        }
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Gather the rows of `x` in permutation order.
    pub fn apply(&self, x: &ArrayView2<f32>) -> Result<Array2<f32>> {
        if self.indices.len() != x.nrows() {
            return Err(LshError::ShapeMismatch {
                what: "permutation length vs input rows",
                expected: x.nrows(),
                got: self.indices.len(),
            });
        }
        Ok(x.select(Axis(0), &self.indices))
    }

    pub fn into_vec(self) -> Vec<usize> {
        self.indices
    }
}

/// Row indices ordered by ascending label; equal labels keep input order.
pub fn stable_argsort(labels: &Array1<usize>) -> Vec<usize> {
    let mut order: Vec<usize> = (0..labels.len()).collect();
    // `sort_by_key` is a stable merge sort.
    order.sort_by_key(|&i| labels[i]);
    order
}

/// Reorder the rows of `x` so that rows sharing a label are contiguous.
///
/// Fails with [`LshError::ShapeMismatch`] when `labels.len() != x.nrows()`.
pub fn sort_by_labels(x: &ArrayView2<f32>, labels: &Array1<usize>) -> Result<Array2<f32>> {
    check_labels(x, labels)?;
    Permutation::from_labels(labels).apply(x)
}

pub(crate) fn check_labels(x: &ArrayView2<f32>, labels: &Array1<usize>) -> Result<()> {
    if labels.len() != x.nrows() {
        return Err(LshError::ShapeMismatch {
            what: "label count vs input rows",
            expected: x.nrows(),
            got: labels.len(),
        });
    }
    Ok(())
}
