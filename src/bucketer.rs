use ndarray::{Array1, Array2, ArrayBase, ArrayView2, Data, Ix2};
use parking_lot::RwLock;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, trace};

use crate::error::Result;
use crate::hash::CrossPolytopeHasher;
use crate::rotation::RandomRotation;
use crate::sort::Permutation;
use crate::stats::{BucketStats, CallTimer, MetricsCollector, MetricsSnapshot};

/// Construction parameters for [`LshBucketer`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "persistence",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct BucketerConfig {
    /// Width of each feature vector.
    pub d_model: usize,
    /// Length of the placeholder label state before the first `forward`.
    pub num_length: usize,
    /// Number of buckets (positive and even).
    pub num_buckets: usize,
    /// Optional RNG seed for a reproducible rotation.
    pub seed: Option<u64>,
}

impl Default for BucketerConfig {
    fn default() -> Self {
        Self {
            d_model: 64,
            num_length: 0,
            num_buckets: 8,
            seed: None,
        }
    }
}

/// Result of one bucketing pass.
#[derive(Debug, Clone)]
pub struct BucketedOutput {
    /// Input rows reordered by ascending bucket label.
    pub sorted: Array2<f32>,
    /// Bucket label of each input row, in input order.
    pub labels: Array1<usize>,
    /// Row order that maps the input onto `sorted`.
    pub permutation: Permutation,
    pub num_buckets: usize,
}

impl BucketedOutput {
    pub fn stats(&self) -> BucketStats {
        BucketStats::from_labels(&self.labels, self.num_buckets)
    }

    /// Labels in sorted order (non-decreasing).
    pub fn sorted_labels(&self) -> Array1<usize> {
        self.permutation
            .indices()
            .iter()
            .map(|&i| self.labels[i])
            .collect()
    }
}

/// Cross-polytope LSH bucketer: hashes rows and sorts them by bucket.
///
/// The rotation is fixed at construction. [`LshBucketer::bucket`] is a pure
/// transform. [`LshBucketer::forward`] additionally records the labels of the
/// latest call, readable through [`LshBucketer::labels`]; the record sits
/// behind a `parking_lot::RwLock`, so concurrent callers never observe a torn
/// vector, but which call's labels are visible is last-writer-wins.
pub struct LshBucketer {
    hasher: CrossPolytopeHasher,
    labels: RwLock<Array1<usize>>,
    num_length: usize,
    seed: Option<u64>,
    metrics: Option<MetricsCollector>,
}

impl std::fmt::Debug for LshBucketer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LshBucketer")
            .field("d_model", &self.d_model())
            .field("num_buckets", &self.num_buckets())
            .field("num_labels", &self.labels.read().len())
            .field("has_metrics", &self.metrics.is_some())
            .finish()
    }
}

impl LshBucketer {
    /// Start building a bucketer with the builder pattern.
    pub fn builder() -> LshBucketerBuilder {
        LshBucketerBuilder::new()
    }

    /// Create a bucketer from a [`BucketerConfig`], seeding from
    /// `config.seed` or OS entropy.
    pub fn new(config: BucketerConfig) -> Result<Self> {
        Self::new_with_metrics(config, false)
    }

    /// Create a bucketer drawing the rotation and placeholder labels from
    /// a caller-owned generator. `config.seed` is ignored and the resulting
    /// [`LshBucketer::config`] reports no seed.
    pub fn with_rng(config: BucketerConfig, rng: &mut impl Rng) -> Result<Self> {
        let config = BucketerConfig {
            seed: None,
            ..config
        };
        Self::build_inner(config, rng, false)
    }

    /// Wrap a fixed rotation. The placeholder labels are all zero.
    pub fn from_rotation(rotation: RandomRotation, num_length: usize) -> Self {
        debug!(
            d_model = rotation.d_model(),
            num_buckets = rotation.num_buckets(),
            "bucketer created from fixed rotation"
        );
        Self {
            hasher: CrossPolytopeHasher::new(rotation),
            labels: RwLock::new(Array1::zeros(num_length)),
            num_length,
            seed: None,
            metrics: None,
        }
    }

    /// Rebuild a bucketer from a stored config and rotation.
    #[cfg(feature = "persistence")]
    pub(crate) fn from_parts(config: BucketerConfig, rotation: RandomRotation) -> Result<Self> {
        if config.d_model != rotation.d_model() || config.num_buckets != rotation.num_buckets() {
            return Err(crate::error::LshError::InvalidConfig(format!(
                "config (d_model={}, num_buckets={}) does not match rotation ({}x{})",
                config.d_model,
                config.num_buckets,
                rotation.d_model(),
                rotation.num_directions(),
            )));
        }
        let mut bucketer = Self::from_rotation(rotation, config.num_length);
        bucketer.seed = config.seed;
        Ok(bucketer)
    }

    fn new_with_metrics(config: BucketerConfig, enable_metrics: bool) -> Result<Self> {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::build_inner(config, &mut rng, enable_metrics)
    }

    fn build_inner(
        config: BucketerConfig,
        rng: &mut impl Rng,
        enable_metrics: bool,
    ) -> Result<Self> {
        let rotation = RandomRotation::new(config.d_model, config.num_buckets, rng)?;
        let placeholder: Array1<usize> = (0..config.num_length)
            .map(|_| rng.gen_range(0..config.num_buckets))
            .collect();

        debug!(
            d_model = config.d_model,
            num_buckets = config.num_buckets,
            num_length = config.num_length,
            seeded = config.seed.is_some(),
            "bucketer created"
        );

        Ok(Self {
            hasher: CrossPolytopeHasher::new(rotation),
            labels: RwLock::new(placeholder),
            num_length: config.num_length,
            seed: config.seed,
            metrics: enable_metrics.then(MetricsCollector::new),
        })
    }

    // ------------------------------------------------------------------
    // Bucketing
    // ------------------------------------------------------------------

    /// Hash every row of `x` and return the rows grouped by bucket, together
    /// with the labels and the row permutation. Does not touch `labels()`.
    pub fn bucket<S>(&self, x: &ArrayBase<S, Ix2>) -> Result<BucketedOutput>
    where
        S: Data<Elem = f32>,
    {
        let timer = self.metrics.as_ref().map(|_| CallTimer::new());
        let x = x.view();

        let labels = self.hasher.hash_matrix(&x)?;
        self.finish_call(&x, labels, timer)
    }

    /// Row-parallel variant of [`LshBucketer::bucket`]; identical output.
    #[cfg(feature = "parallel")]
    pub fn par_bucket<S>(&self, x: &ArrayBase<S, Ix2>) -> Result<BucketedOutput>
    where
        S: Data<Elem = f32>,
    {
        let timer = self.metrics.as_ref().map(|_| CallTimer::new());
        let x = x.view();

        let labels = crate::hash::par_assign_buckets(&x, &self.hasher.rotation().matrix())?;
        self.finish_call(&x, labels, timer)
    }

    /// Sort by `labels`, log and record metrics for one bucketing call.
    fn finish_call(
        &self,
        x: &ArrayView2<f32>,
        labels: Array1<usize>,
        timer: Option<CallTimer>,
    ) -> Result<BucketedOutput> {
        let permutation = Permutation::from_labels(&labels);
        let sorted = permutation.apply(x)?;
        let num_buckets = self.num_buckets();

        debug!(rows = x.nrows(), num_buckets, "bucketed rows");
        trace!(stats = %BucketStats::from_labels(&labels, num_buckets), "bucket occupancy");

        if let (Some(m), Some(t)) = (self.metrics.as_ref(), timer) {
            m.record_call(x.nrows() as u64, t.elapsed_ns());
        }

        Ok(BucketedOutput {
            sorted,
            labels,
            permutation,
            num_buckets,
        })
    }

    /// Hash and sort `x`, store the labels as the current label state and
    /// return the reordered rows.
    pub fn forward<S>(&self, x: &ArrayBase<S, Ix2>) -> Result<Array2<f32>>
    where
        S: Data<Elem = f32>,
    {
        let out = self.bucket(x)?;
        debug!(rows = out.labels.len(), "forward");
        *self.labels.write() = out.labels;
        Ok(out.sorted)
    }

    /// Labels recorded by the most recent [`LshBucketer::forward`], or the
    /// placeholder of length `num_length` before the first call.
    pub fn labels(&self) -> Array1<usize> {
        self.labels.read().clone()
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn rotation(&self) -> &RandomRotation {
        self.hasher.rotation()
    }

    pub fn hasher(&self) -> &CrossPolytopeHasher {
        &self.hasher
    }

    pub fn d_model(&self) -> usize {
        self.hasher.rotation().d_model()
    }

    pub fn num_buckets(&self) -> usize {
        self.hasher.num_buckets()
    }

    /// Return the configuration this bucketer was built with.
    pub fn config(&self) -> BucketerConfig {
        BucketerConfig {
            d_model: self.d_model(),
            num_length: self.num_length,
            num_buckets: self.num_buckets(),
            seed: self.seed,
        }
    }

    /// Snapshot of runtime metrics (`None` if metrics were not enabled).
    pub fn metrics(&self) -> Option<MetricsSnapshot> {
        self.metrics.as_ref().map(|m| m.snapshot())
    }

    pub fn reset_metrics(&self) {
        if let Some(ref m) = self.metrics {
            m.reset();
        }
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Fluent builder for [`LshBucketer`].
#[derive(Default)]
pub struct LshBucketerBuilder {
    config: BucketerConfig,
    enable_metrics: bool,
}

impl LshBucketerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn d_model(mut self, d_model: usize) -> Self {
        self.config.d_model = d_model;
        self
    }

    pub fn num_length(mut self, n: usize) -> Self {
        self.config.num_length = n;
        self
    }

    pub fn num_buckets(mut self, n: usize) -> Self {
        self.config.num_buckets = n;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    pub fn enable_metrics(mut self) -> Self {
        self.enable_metrics = true;
        self
    }

    /// Build the bucketer, returning an error on invalid configuration.
    pub fn build(self) -> Result<LshBucketer> {
        LshBucketer::new_with_metrics(self.config, self.enable_metrics)
    }
}
