//! # lsh_bucket
//!
//! Cross-polytope locality-sensitive hashing for LSH attention: project each
//! row of a feature matrix through a fixed random rotation, assign it to one
//! of `num_buckets` buckets, and stably reorder the rows so that same-bucket
//! rows are contiguous. Sparse attention can then score pairs within a bucket
//! only.
//!
//! ## Quick start
//!
//! ```rust
//! use lsh_bucket::LshBucketer;
//! use ndarray::Array2;
//!
//! let bucketer = LshBucketer::builder()
//!     .d_model(16)
//!     .num_buckets(8)
//!     .seed(42)
//!     .build()
//!     .unwrap();
//!
//! let x = Array2::from_shape_fn((32, 16), |(i, j)| ((i * 16 + j) as f32).sin());
//! let out = bucketer.bucket(&x).unwrap();
//!
//! assert_eq!(out.sorted.dim(), (32, 16));
//! assert!(out.labels.iter().all(|&l| l < 8));
//! println!("{}", out.stats());
//! ```
//!
//! ## Concurrency
//!
//! [`LshBucketer::bucket`] is a pure function of its input and the fixed
//! rotation; share one bucketer freely across threads. [`LshBucketer::forward`]
//! also records the latest labels for inspection. That record is lock
//! protected, but with concurrent callers it reflects whichever call finished
//! last: callers that need their own labels should use `bucket`.
//!
//! ## Feature flags
//!
//! | Flag          | Effect                                          |
//! |---------------|-------------------------------------------------|
//! | `parallel`    | Row-parallel bucket assignment via rayon         |
//! | `persistence` | Save/load rotations to disk (serde + bincode)    |
//! | `full`        | Enables `parallel` + `persistence`               |

pub mod bucketer;
pub mod error;
pub mod hash;
pub mod rotation;
pub mod sort;
pub mod stats;
pub mod tuning;

#[cfg(feature = "persistence")]
pub mod persistence;

// Re-exports for convenience.
pub use bucketer::{BucketedOutput, BucketerConfig, LshBucketer, LshBucketerBuilder};
pub use error::{LshError, Result};
pub use hash::{argmax_first, assign_buckets, assign_buckets_with_scores, CrossPolytopeHasher};
pub use rotation::RandomRotation;
pub use sort::{sort_by_labels, stable_argsort, Permutation};
pub use stats::{BucketStats, MetricsCollector, MetricsSnapshot};
pub use tuning::{expected_bucket_size, suggest_num_buckets};

#[cfg(feature = "parallel")]
pub use hash::par_assign_buckets;
