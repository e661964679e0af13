//! Property-based tests for the bucketing pipeline.
//!
//! These hold for any input matrix and any valid rotation:
//! - The output is a row permutation of the input
//! - Labels are in `[0, num_buckets)`
//! - Sorted labels are non-decreasing and equal labels keep input order
//! - Repeated calls are bit-identical

use lsh_bucket::{stable_argsort, LshBucketer, RandomRotation};
use ndarray::{Array2, Axis};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

prop_compose! {
    fn arb_matrix(max_rows: usize, d_model: usize)
        (rows in 0..=max_rows)
        (data in prop::collection::vec(-10.0f32..10.0, rows * d_model), rows in Just(rows))
        -> Array2<f32>
    {
        Array2::from_shape_vec((rows, d_model), data).unwrap()
    }
}

fn bucketer(d_model: usize, num_buckets: usize, seed: u64) -> LshBucketer {
    let mut rng = StdRng::seed_from_u64(seed);
    let rotation = RandomRotation::new(d_model, num_buckets, &mut rng).unwrap();
    LshBucketer::from_rotation(rotation, 0)
}

fn row_bits(m: &Array2<f32>) -> Vec<Vec<u32>> {
    let mut rows: Vec<Vec<u32>> = m
        .axis_iter(Axis(0))
        .map(|r| r.iter().map(|v| v.to_bits()).collect())
        .collect();
    rows.sort();
    rows
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn output_is_row_permutation(
        x in arb_matrix(64, 8),
        half in 1usize..8,
        seed in any::<u64>(),
    ) {
        let b = bucketer(8, half * 2, seed);
        let out = b.bucket(&x).unwrap();
        prop_assert_eq!(out.sorted.dim(), x.dim());
        prop_assert_eq!(row_bits(&out.sorted), row_bits(&x));

        let mut indices = out.permutation.indices().to_vec();
        indices.sort_unstable();
        prop_assert_eq!(indices, (0..x.nrows()).collect::<Vec<_>>());
    }

    #[test]
    fn labels_in_range(
        x in arb_matrix(64, 6),
        half in 1usize..10,
        seed in any::<u64>(),
    ) {
        let num_buckets = half * 2;
        let b = bucketer(6, num_buckets, seed);
        let out = b.bucket(&x).unwrap();
        prop_assert_eq!(out.labels.len(), x.nrows());
        for &l in out.labels.iter() {
            prop_assert!(l < num_buckets, "label {} out of range {}", l, num_buckets);
        }
    }

    #[test]
    fn sorted_labels_monotone_and_stable(
        x in arb_matrix(64, 4),
        seed in any::<u64>(),
    ) {
        let b = bucketer(4, 6, seed);
        let out = b.bucket(&x).unwrap();
        let order = out.permutation.indices();
        for w in order.windows(2) {
            let (i, j) = (w[0], w[1]);
            prop_assert!(out.labels[i] <= out.labels[j]);
            if out.labels[i] == out.labels[j] {
                prop_assert!(i < j, "rows {} and {} share a label but swapped", i, j);
            }
        }
        // The sorted matrix row k is the input row order[k].
        for (k, &i) in order.iter().enumerate() {
            prop_assert_eq!(out.sorted.row(k), x.row(i));
        }
    }

    #[test]
    fn forward_is_bit_identical(
        x in arb_matrix(32, 5),
        seed in any::<u64>(),
    ) {
        let b = bucketer(5, 4, seed);
        let first = b.forward(&x).unwrap();
        let first_labels = b.labels();
        let second = b.forward(&x).unwrap();
        prop_assert_eq!(first_labels, b.labels());
        let same = first.iter().zip(second.iter()).all(|(p, q)| p.to_bits() == q.to_bits());
        prop_assert!(same);
    }

    #[test]
    fn stable_argsort_matches_std_stable_sort(
        labels in prop::collection::vec(0usize..5, 0..100),
    ) {
        let arr = ndarray::Array1::from_vec(labels.clone());
        let order = stable_argsort(&arr);
        let mut expected: Vec<usize> = (0..labels.len()).collect();
        expected.sort_by(|&a, &b| labels[a].cmp(&labels[b]));
        prop_assert_eq!(order, expected);
    }
}
