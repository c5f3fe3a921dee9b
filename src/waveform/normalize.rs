use tracing::debug;

/// Rescale `blocks` so the loudest one becomes exactly 1.0.
///
/// Empty input returns empty. When there is no positive peak (silent audio)
/// the result is all zeros of the same length; nothing is ever divided by
/// zero. Non-finite values are treated as silence.
pub fn normalize(blocks: &[f32]) -> Vec<f32> {
    let peak = blocks
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(0.0f32, f32::max);

    if peak <= 0.0 {
        if !blocks.is_empty() {
            debug!("No audio content in {} blocks, leaving waveform flat", blocks.len());
        }
        return vec![0.0; blocks.len()];
    }

    blocks
        .iter()
        .map(|&v| {
            if v.is_finite() {
                (v / peak).clamp(0.0, 1.0)
            } else {
                0.0
            }
        })
        .collect()
}
