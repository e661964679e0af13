use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use ndarray::Array1;

/// Occupancy of each bucket after one bucketing pass.
#[derive(Debug, Clone, PartialEq)]
pub struct BucketStats {
    /// `counts[b]` is the number of rows assigned to bucket `b`.
    pub counts: Vec<usize>,
    pub num_rows: usize,
    pub occupied_buckets: usize,
    pub max_bucket_size: usize,
    /// Mean size over occupied buckets only.
    pub avg_bucket_size: f64,
}

impl BucketStats {
    /// Histogram `labels` into `num_buckets` bins. Labels outside the range
    /// are ignored.
    pub fn from_labels(labels: &Array1<usize>, num_buckets: usize) -> Self {
        let mut counts = vec![0usize; num_buckets];
        for &label in labels.iter() {
            if let Some(c) = counts.get_mut(label) {
                *c += 1;
            }
        }

        let num_rows = counts.iter().sum();
        let occupied_buckets = counts.iter().filter(|&&c| c > 0).count();
        let max_bucket_size = counts.iter().copied().max().unwrap_or(0);
        let avg_bucket_size = if occupied_buckets > 0 {
            num_rows as f64 / occupied_buckets as f64
        } else {
            0.0
        };

        Self {
            counts,
            num_rows,
            occupied_buckets,
            max_bucket_size,
            avg_bucket_size,
        }
    }

    /// Start offset of each bucket's contiguous run in the sorted output.
    pub fn bucket_offsets(&self) -> Vec<usize> {
        let mut offsets = Vec::with_capacity(self.counts.len());
        let mut acc = 0;
        for &c in &self.counts {
            offsets.push(acc);
            acc += c;
        }
        offsets
    }
}

impl std::fmt::Display for BucketStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "BucketStats {{ rows: {}, buckets: {}/{}, avg_bucket: {:.1}, max_bucket: {} }}",
            self.num_rows,
            self.occupied_buckets,
            self.counts.len(),
            self.avg_bucket_size,
            self.max_bucket_size,
        )
    }
}

/// Runtime counters for bucketing calls, using lock-free atomics.
#[derive(Debug, Default)]
pub struct MetricsCollector {
    call_count: AtomicU64,
    rows_bucketed: AtomicU64,
    total_time_ns: AtomicU64,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one `bucket` or `par_bucket` call. `forward` goes through `bucket`.
    pub fn record_call(&self, rows: u64, duration_ns: u64) {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        self.rows_bucketed.fetch_add(rows, Ordering::Relaxed);
        self.total_time_ns.fetch_add(duration_ns, Ordering::Relaxed);
    }

    /// Take a point-in-time snapshot of all metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let call_count = self.call_count.load(Ordering::Relaxed);
        let rows_bucketed = self.rows_bucketed.load(Ordering::Relaxed);
        let total_time_ns = self.total_time_ns.load(Ordering::Relaxed);

        MetricsSnapshot {
            call_count,
            rows_bucketed,
            avg_call_time_us: if call_count > 0 {
                total_time_ns as f64 / call_count as f64 / 1000.0
            } else {
                0.0
            },
            avg_rows_per_call: if call_count > 0 {
                rows_bucketed as f64 / call_count as f64
            } else {
                0.0
            },
        }
    }

    /// Reset all counters to zero.
    pub fn reset(&self) {
        self.call_count.store(0, Ordering::Relaxed);
        self.rows_bucketed.store(0, Ordering::Relaxed);
        self.total_time_ns.store(0, Ordering::Relaxed);
    }
}

/// A point-in-time snapshot of bucketing metrics.
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub call_count: u64,
    pub rows_bucketed: u64,
    pub avg_call_time_us: f64,
    pub avg_rows_per_call: f64,
}

impl std::fmt::Display for MetricsSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Calls: {}, Rows: {}, Avg call: {:.2}us, Avg rows: {:.1}",
            self.call_count, self.rows_bucketed, self.avg_call_time_us, self.avg_rows_per_call,
        )
    }
}

pub(crate) struct CallTimer {
    start: Instant,
}

impl CallTimer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed_ns(&self) -> u64 {
        self.start.elapsed().as_nanos() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_histogram() {
        let labels = array![0, 3, 3, 1, 3];
        let stats = BucketStats::from_labels(&labels, 4);
        assert_eq!(stats.counts, vec![1, 1, 0, 3]);
        assert_eq!(stats.num_rows, 5);
        assert_eq!(stats.occupied_buckets, 3);
        assert_eq!(stats.max_bucket_size, 3);
        assert!((stats.avg_bucket_size - 5.0 / 3.0).abs() < 1e-9);
        assert_eq!(stats.bucket_offsets(), vec![0, 1, 2, 2]);
    }

    #[test]
    fn test_empty_labels() {
        let labels = Array1::<usize>::zeros(0);
        let stats = BucketStats::from_labels(&labels, 4);
        assert_eq!(stats.num_rows, 0);
        assert_eq!(stats.occupied_buckets, 0);
        assert_eq!(stats.avg_bucket_size, 0.0);
    }

    #[test]
    fn test_metrics_snapshot_and_reset() {
        let m = MetricsCollector::new();
        m.record_call(10, 2_000);
        m.record_call(30, 4_000);
        let snap = m.snapshot();
        assert_eq!(snap.call_count, 2);
        assert_eq!(snap.rows_bucketed, 40);
        assert!((snap.avg_call_time_us - 3.0).abs() < 1e-9);
        assert!((snap.avg_rows_per_call - 20.0).abs() < 1e-9);

        m.reset();
        assert_eq!(m.snapshot().call_count, 0);
    }
}
