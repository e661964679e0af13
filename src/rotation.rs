use ndarray::{Array2, ArrayView2};
use rand::Rng;
use rand_distr::StandardNormal;

use crate::error::{LshError, Result};

/// The fixed random projection behind the cross-polytope hash.
///
/// Holds a `d_model x (num_buckets / 2)` matrix of i.i.d. standard-normal
/// entries. Each column is one random direction; together with its negation
/// it yields two of the `num_buckets` candidate buckets. The matrix is not
/// orthogonalised, so "rotation" is used loosely.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "persistence",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct RandomRotation {
    matrix: Array2<f32>,
}

impl RandomRotation {
    /// Sample a new rotation for vectors of width `d_model` hashed into
    /// `num_buckets` buckets.
    ///
    /// Fails with [`LshError::InvalidConfig`] when `d_model` is zero or
    /// `num_buckets` is zero or odd.
    pub fn new(d_model: usize, num_buckets: usize, rng: &mut impl Rng) -> Result<Self> {
        validate_params(d_model, num_buckets)?;

        let directions = num_buckets / 2;
        let matrix = Array2::from_shape_simple_fn((d_model, directions), || {
            rng.sample::<f32, _>(StandardNormal)
        });

        Ok(Self { matrix })
    }

    /// Wrap a caller-supplied projection matrix (`d_model x directions`).
    ///
    /// The resulting hash has `2 * directions` buckets.
    pub fn from_matrix(matrix: Array2<f32>) -> Result<Self> {
        let (rows, cols) = matrix.dim();
        if rows == 0 {
            return Err(LshError::InvalidConfig(
                "rotation matrix must have at least one row".into(),
            ));
        }
        if cols == 0 {
            return Err(LshError::InvalidConfig(
                "rotation matrix must have at least one column".into(),
            ));
        }
        Ok(Self { matrix })
    }

    /// Input feature width this rotation accepts.
    pub fn d_model(&self) -> usize {
        self.matrix.nrows()
    }

    /// Number of random directions (columns), i.e. `num_buckets / 2`.
    pub fn num_directions(&self) -> usize {
        self.matrix.ncols()
    }

    pub fn num_buckets(&self) -> usize {
        self.matrix.ncols() * 2
    }

    pub fn matrix(&self) -> ArrayView2<'_, f32> {
        self.matrix.view()
    }
}

/// Check construction parameters shared by every entry point.
pub(crate) fn validate_params(d_model: usize, num_buckets: usize) -> Result<()> {
    if d_model == 0 {
        return Err(LshError::InvalidConfig("d_model must be > 0".into()));
    }
    if num_buckets == 0 {
        return Err(LshError::InvalidConfig("num_buckets must be > 0".into()));
    }
    if num_buckets % 2 != 0 {
        return Err(LshError::InvalidConfig(format!(
            "num_buckets must be even, got {num_buckets}"
        )));
    }
    Ok(())
}
