//! Basic usage of `lsh_bucket`.
//!
//! Demonstrates the builder pattern, bucketing a random sequence, inspecting
//! labels and bucket statistics, metrics, tuning helpers and the fixed
//! identity-rotation example.
//!
//! Run with:
//!   cargo run --example basic_usage

use lsh_bucket::*;
use ndarray::{array, Array2};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

const D_MODEL: usize = 64;
const SEQ_LEN: usize = 1_024;

fn main() {
    // ---------------------------------------------------------------
    // 1. Pick a bucket count and build the bucketer.
    // ---------------------------------------------------------------
    println!("=== Step 1: Build the bucketer ===");
    let num_buckets = suggest_num_buckets(SEQ_LEN, 64);
    let bucketer = LshBucketer::builder()
        .d_model(D_MODEL)
        .num_length(SEQ_LEN)
        .num_buckets(num_buckets)
        .seed(42)
        .enable_metrics()
        .build()
        .expect("failed to build bucketer");

    println!(
        "Created bucketer: d_model={}, num_buckets={}, expected bucket size={:.1}\n",
        D_MODEL,
        num_buckets,
        expected_bucket_size(SEQ_LEN, num_buckets)
    );

    // ---------------------------------------------------------------
    // 2. Bucket a random sequence.
    // ---------------------------------------------------------------
    println!("=== Step 2: Forward {} random vectors ===", SEQ_LEN);

    let mut rng = StdRng::seed_from_u64(123);
    let normal = Normal::new(0.0_f32, 1.0).unwrap();
    let x = Array2::from_shape_simple_fn((SEQ_LEN, D_MODEL), || normal.sample(&mut rng));

    let sorted = bucketer.forward(&x).expect("forward failed");
    let labels = bucketer.labels();
    println!("  Output shape: {:?}", sorted.dim());
    println!(
        "  First 16 labels: {:?}\n",
        labels.iter().take(16).collect::<Vec<_>>()
    );

    // ---------------------------------------------------------------
    // 3. Pure bucketing with the permutation and statistics.
    // ---------------------------------------------------------------
    println!("=== Step 3: Bucket statistics ===");
    let out = bucketer.bucket(&x).expect("bucket failed");
    let stats = out.stats();
    println!("  {}", stats);
    for (b, (&offset, &count)) in stats
        .bucket_offsets()
        .iter()
        .zip(stats.counts.iter())
        .enumerate()
    {
        println!("  bucket {:>2}: rows {:>4}..{:<4} ({})", b, offset, offset + count, count);
    }
    println!();

    // ---------------------------------------------------------------
    // 4. Metrics snapshot.
    // ---------------------------------------------------------------
    println!("=== Step 4: Metrics snapshot ===");
    if let Some(m) = bucketer.metrics() {
        println!("  {}", m);
    } else {
        println!("  Metrics not enabled.");
    }
    println!();

    // ---------------------------------------------------------------
    // 5. Fixed identity rotation.
    // ---------------------------------------------------------------
    println!("=== Step 5: Identity rotation ===");
    let rotation = RandomRotation::from_matrix(array![[1.0, 0.0], [0.0, 1.0]])
        .expect("invalid rotation");
    let identity = LshBucketer::from_rotation(rotation, 0);
    let x = array![[0.0_f32, -1.0], [-1.0, 0.0], [1.0, 0.0], [0.0, 1.0]];
    let out = identity.bucket(&x).expect("bucket failed");
    println!("  labels:      {}", out.labels);
    println!("  permutation: {:?}", out.permutation.indices());
    println!("  sorted:\n{}", out.sorted);

    println!("\nDone.");
}
