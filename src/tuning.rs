/// Suggest a bucket count for sequences of `seq_len` rows so that buckets
/// hold roughly `target_bucket_size` rows each.
///
/// The result is always even and at least 2, as the cross-polytope hash
/// requires. A `target_bucket_size` of zero is treated as one.
pub fn suggest_num_buckets(seq_len: usize, target_bucket_size: usize) -> usize {
    let target = target_bucket_size.max(1);
    let raw = (seq_len + target / 2) / target;
    let even = raw + raw % 2;
    even.max(2)
}

/// Expected rows per bucket if labels were spread uniformly.
pub fn expected_bucket_size(seq_len: usize, num_buckets: usize) -> f64 {
    if num_buckets == 0 {
        return 0.0;
    }
    seq_len as f64 / num_buckets as f64
}
