//! Mean-absolute downsampling of a sample buffer into histogram blocks.

/// Reduce `samples` to exactly `block_count` averaged amplitudes.
///
/// The buffer is split into `block_count` contiguous windows of
/// `samples.len() / block_count` samples; trailing samples that do not fill a
/// window are dropped. Each block is the mean of `|sample|` over its window.
/// Missing or non-finite samples contribute zero, so a buffer shorter than
/// `block_count` yields all-zero blocks instead of NaN.
pub fn aggregate(samples: &[f32], block_count: usize) -> Vec<f32> {
    if block_count == 0 {
        return Vec::new();
    }

    let block_size = samples.len() / block_count;
    if block_size == 0 {
        return vec![0.0; block_count];
    }

    (0..block_count)
        .map(|i| {
            let start = i * block_size;
            let sum: f64 = samples
                .iter()
                .skip(start)
                .take(block_size)
                .filter(|s| s.is_finite())
                .map(|s| s.abs() as f64)
                .sum();
            (sum / block_size as f64) as f32
        })
        .collect()
}
