//! Waveform extraction: decoded samples to a normalized block histogram.

mod aggregate;
mod normalize;

pub use aggregate::aggregate;
pub use normalize::normalize;

/// Default width of one histogram column in logical pixels.
pub const DEFAULT_BLOCK_WIDTH: u32 = 3;

/// Number of whole blocks of `block_width` that fit in `width` logical pixels.
pub fn block_count(width: f64, block_width: u32) -> usize {
    if block_width == 0 || !width.is_finite() || width <= 0.0 {
        return 0;
    }
    (width / block_width as f64).floor() as usize
}

/// Normalized amplitudes, one per histogram column.
///
/// Values are in `[0, 1]`. Unless the source was silent, at least one block
/// is exactly 1.0.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlockSequence {
    blocks: Vec<f32>,
}

impl BlockSequence {
    /// Aggregate then normalize one channel of samples.
    pub fn from_samples(samples: &[f32], block_count: usize) -> Self {
        Self {
            blocks: normalize(&aggregate(samples, block_count)),
        }
    }

    /// Wrap values that are already normalized.
    pub fn from_normalized(blocks: Vec<f32>) -> Self {
        Self { blocks }
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.blocks
    }

    /// The first `count` blocks, clamped to the sequence length.
    pub fn prefix(&self, count: usize) -> &[f32] {
        &self.blocks[..count.min(self.blocks.len())]
    }

    /// True when every block is zero, i.e. the source had no audible content.
    pub fn is_silent(&self) -> bool {
        self.blocks.iter().all(|&v| v == 0.0)
    }
}
