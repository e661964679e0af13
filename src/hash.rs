use ndarray::{Array1, ArrayView1, ArrayView2, Axis};

use crate::error::{LshError, Result};
use crate::rotation::RandomRotation;

/// Cross-polytope hash over a fixed [`RandomRotation`].
///
/// A vector `x` is projected to `p = x · R` and hashed to the index of the
/// largest entry of `[p, -p]`, i.e. the random direction (or negated
/// direction) it is most aligned with.
#[derive(Debug, Clone)]
pub struct CrossPolytopeHasher {
    rotation: RandomRotation,
}

impl CrossPolytopeHasher {
    pub fn new(rotation: RandomRotation) -> Self {
        Self { rotation }
    }

    /// Bucket label of a single vector.
    pub fn hash_vector(&self, vector: &ArrayView1<f32>) -> Result<usize> {
        let row = vector.view().insert_axis(Axis(0));
        let labels = assign_buckets(&row, &self.rotation.matrix())?;
        Ok(labels[0])
    }

    /// Bucket labels for every row of `x`.
    pub fn hash_matrix(&self, x: &ArrayView2<f32>) -> Result<Array1<usize>> {
        assign_buckets(x, &self.rotation.matrix())
    }

    pub fn rotation(&self) -> &RandomRotation {
        &self.rotation
    }

    pub fn num_buckets(&self) -> usize {
        self.rotation.num_buckets()
    }
}

/// Assign a bucket label in `[0, 2 * r.ncols())` to every row of `x`.
///
/// Ties resolve to the lowest column of `concat(P, -P)`. Fails with
/// [`LshError::ShapeMismatch`] when `x.ncols() != r.nrows()` and with
/// [`LshError::InvalidConfig`] when `r` has no columns.
pub fn assign_buckets(x: &ArrayView2<f32>, r: &ArrayView2<f32>) -> Result<Array1<usize>> {
    let (labels, _) = assign_buckets_with_scores(x, r)?;
    Ok(labels)
}

/// Like [`assign_buckets`], but also returns the winning projected value of
/// each row (NaN for rows where no entry compares).
pub fn assign_buckets_with_scores(
    x: &ArrayView2<f32>,
    r: &ArrayView2<f32>,
) -> Result<(Array1<usize>, Array1<f32>)> {
    check_columns(x, r)?;

    let projection = x.dot(r);
    let n = projection.nrows();
    let mut labels = Array1::zeros(n);
    let mut scores = Array1::zeros(n);

    for (i, row) in projection.axis_iter(Axis(0)).enumerate() {
        let (label, score) = cross_polytope_argmax(&row);
        labels[i] = label;
        scores[i] = score;
    }

    Ok((labels, scores))
}

/// Row-parallel [`assign_buckets`]. Produces identical labels.
#[cfg(feature = "parallel")]
pub fn par_assign_buckets(x: &ArrayView2<f32>, r: &ArrayView2<f32>) -> Result<Array1<usize>> {
    use rayon::prelude::*;

    check_columns(x, r)?;

    // The product stays sequential so labels match `assign_buckets` bit for bit.
    let projection = x.dot(r);
    let labels: Vec<usize> = (0..projection.nrows())
        .into_par_iter()
        .map(|i| cross_polytope_argmax(&projection.row(i)).0)
        .collect();

    Ok(Array1::from_vec(labels))
}

/// Index of the first maximum of `values` under IEEE `>`.
///
/// NaN entries never win. A slice with no comparable entry returns 0.
pub fn argmax_first(values: &ArrayView1<f32>) -> usize {
    argmax_with_value(values.iter().copied()).0
}

/// Argmax over the virtual row `[p, -p]` without allocating the negated half.
fn cross_polytope_argmax(projection: &ArrayView1<f32>) -> (usize, f32) {
    let positive = projection.iter().copied();
    let negative = projection.iter().map(|&v| -v);
    argmax_with_value(positive.chain(negative))
}

fn argmax_with_value(values: impl Iterator<Item = f32>) -> (usize, f32) {
    let mut best: Option<(usize, f32)> = None;
    for (i, v) in values.enumerate() {
        match best {
            None if !v.is_nan() => best = Some((i, v)),
            Some((_, b)) if v > b => best = Some((i, v)),
            _ => {}
        }
    }
    best.unwrap_or((0, f32::NAN))
}

fn check_columns(x: &ArrayView2<f32>, r: &ArrayView2<f32>) -> Result<()> {
    if r.ncols() == 0 {
        return Err(LshError::InvalidConfig(
            "rotation matrix must have at least one column".into(),
        ));
    }
    if x.ncols() != r.nrows() {
        return Err(LshError::ShapeMismatch {
            what: "input columns vs rotation rows",
            expected: r.nrows(),
            got: x.ncols(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn identity_rotation() -> Array2<f32> {
        array![[1.0, 0.0], [0.0, 1.0]]
    }

    #[test]
    fn test_identity_rotation_labels() {
        let x = array![[1.0, 0.0], [0.0, 1.0], [-1.0, 0.0], [0.0, -1.0]];
        let labels = assign_buckets(&x.view(), &identity_rotation().view()).unwrap();
        assert_eq!(labels, array![0, 1, 2, 3]);
    }

    #[test]
    fn test_tie_takes_lowest_column() {
        // [1, 1, -1, -1]: columns 0 and 1 tie.
        let x = array![[1.0, 1.0]];
        let labels = assign_buckets(&x.view(), &identity_rotation().view()).unwrap();
        assert_eq!(labels[0], 0);

        // [-1, -1, 1, 1]: columns 2 and 3 tie.
        let x = array![[-1.0, -1.0]];
        let labels = assign_buckets(&x.view(), &identity_rotation().view()).unwrap();
        assert_eq!(labels[0], 2);
    }

    #[test]
    fn test_zero_vector_maps_to_bucket_zero() {
        // All of [0, 0, -0, -0] compare equal; first wins.
        let x = array![[0.0, 0.0]];
        let labels = assign_buckets(&x.view(), &identity_rotation().view()).unwrap();
        assert_eq!(labels[0], 0);
    }

    #[test]
    fn test_scores_are_max_projection() {
        let x = array![[3.0, -5.0]];
        let (labels, scores) =
            assign_buckets_with_scores(&x.view(), &identity_rotation().view()).unwrap();
        assert_eq!(labels[0], 3);
        assert_eq!(scores[0], 5.0);
    }

    #[test]
    fn test_shape_mismatch() {
        let x = Array2::<f32>::zeros((3, 5));
        let err = assign_buckets(&x.view(), &identity_rotation().view()).unwrap_err();
        assert!(matches!(
            err,
            LshError::ShapeMismatch { expected: 2, got: 5, .. }
        ));
    }

    #[test]
    fn test_rotation_without_columns_rejected() {
        let x = array![[1.0, 2.0]];
        let r = Array2::<f32>::zeros((2, 0));
        assert!(matches!(
            assign_buckets(&x.view(), &r.view()),
            Err(LshError::InvalidConfig(_))
        ));
        assert!(matches!(
            assign_buckets_with_scores(&x.view(), &r.view()),
            Err(LshError::InvalidConfig(_))
        ));
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_rotation_without_columns_rejected() {
        let x = array![[1.0, 2.0]];
        let r = Array2::<f32>::zeros((2, 0));
        assert!(matches!(
            par_assign_buckets(&x.view(), &r.view()),
            Err(LshError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_argmax_first_skips_nan() {
        let v = array![f32::NAN, 1.0, 3.0, f32::NAN, 3.0];
        assert_eq!(argmax_first(&v.view()), 2);

        let all_nan = array![f32::NAN, f32::NAN];
        assert_eq!(argmax_first(&all_nan.view()), 0);

        let neg_inf = array![f32::NEG_INFINITY, f32::NEG_INFINITY];
        assert_eq!(argmax_first(&neg_inf.view()), 0);
    }

    #[test]
    fn test_hasher_vector_matches_matrix() {
        let mut rng = StdRng::seed_from_u64(42);
        let rot = RandomRotation::new(8, 6, &mut rng).unwrap();
        let hasher = CrossPolytopeHasher::new(rot);
        let x = Array2::from_shape_fn((10, 8), |(i, j)| ((i * 7 + j * 3) % 11) as f32 - 5.0);

        let labels = hasher.hash_matrix(&x.view()).unwrap();
        for (i, row) in x.axis_iter(Axis(0)).enumerate() {
            assert_eq!(hasher.hash_vector(&row).unwrap(), labels[i]);
            assert!(labels[i] < hasher.num_buckets());
        }
    }

    #[test]
    fn test_hash_vector_length_mismatch() {
        let mut rng = StdRng::seed_from_u64(0);
        let hasher = CrossPolytopeHasher::new(RandomRotation::new(4, 4, &mut rng).unwrap());
        let v = array![1.0, 2.0];
        assert!(matches!(
            hasher.hash_vector(&v.view()),
            Err(LshError::ShapeMismatch { expected: 4, got: 2, .. })
        ));
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_matches_sequential() {
        let mut rng = StdRng::seed_from_u64(9);
        let rot = RandomRotation::new(16, 8, &mut rng).unwrap();
        let x = Array2::from_shape_fn((257, 16), |(i, j)| ((i * 31 + j * 17) % 13) as f32 - 6.0);
        let seq = assign_buckets(&x.view(), &rot.matrix()).unwrap();
        let par = par_assign_buckets(&x.view(), &rot.matrix()).unwrap();
        assert_eq!(seq, par);
    }
}
