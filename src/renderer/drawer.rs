//! Block histogram renderer with a playhead overlay.

use tracing::trace;

use super::DrawingSurface;
use crate::audio::PlaybackState;
use crate::color::{RgbColor, WaveformPalette};
use crate::geometry::{played_block_count, time_to_x, SurfaceGeometry};
use crate::waveform::BlockSequence;

/// Long-lived waveform renderer.
///
/// Holds the block sequence for the current asset and redraws the whole
/// frame from it on every call. Nothing is accumulated between frames: the
/// same blocks, palette and playback state always produce the same pixels.
pub struct CanvasDrawer {
    blocks: BlockSequence,
    block_width: u32,
    palette: WaveformPalette,
}

impl CanvasDrawer {
    pub fn new(block_width: u32, palette: WaveformPalette) -> Self {
        Self {
            blocks: BlockSequence::default(),
            block_width: block_width.max(1),
            palette,
        }
    }

    pub fn set_blocks(&mut self, blocks: BlockSequence) {
        self.blocks = blocks;
    }

    pub fn clear_blocks(&mut self) {
        self.blocks = BlockSequence::default();
    }

    pub fn blocks(&self) -> &BlockSequence {
        &self.blocks
    }

    pub fn has_data(&self) -> bool {
        !self.blocks.is_empty()
    }

    pub fn block_width(&self) -> u32 {
        self.block_width
    }

    pub fn palette(&self) -> WaveformPalette {
        self.palette
    }

    pub fn set_palette(&mut self, palette: WaveformPalette) {
        self.palette = palette;
    }

    /// Erase the whole logical area.
    pub fn clear<S: DrawingSurface + ?Sized>(&self, surface: &mut S) {
        if let Some(g) = ready(surface) {
            surface.clear_rect(0.0, 0.0, g.width, g.height);
        }
    }

    /// Draw one bottom-anchored bar per block, `block_width` wide.
    pub fn draw_histogram<S: DrawingSurface + ?Sized>(
        &self,
        surface: &mut S,
        blocks: &[f32],
        fill: RgbColor,
    ) {
        let Some(g) = ready(surface) else {
            return;
        };
        let bw = self.block_width as f64;
        for (i, &value) in blocks.iter().enumerate() {
            let bar_height = g.height * value.clamp(0.0, 1.0) as f64;
            if bar_height <= 0.0 {
                continue;
            }
            surface.fill_rect(i as f64 * bw, g.height - bar_height, bw, bar_height, fill);
        }
    }

    /// Recolor the played prefix and stroke the playhead at the current time.
    pub fn draw_progress<S: DrawingSurface + ?Sized>(&self, surface: &mut S, state: PlaybackState) {
        let Some(g) = ready(surface) else {
            return;
        };
        let x = time_to_x(state.current_time, state.duration, g.width);
        let played = played_block_count(x, self.block_width);

        self.draw_histogram(surface, self.blocks.prefix(played), self.palette.played);
        surface.stroke_line(
            (x, g.height),
            (x, 0.0),
            self.block_width as f64 * 2.0,
            self.palette.marker,
        );
    }

    /// Full frame: clear, base histogram, played overlay and playhead.
    ///
    /// Returns false without touching the surface when there is nothing to
    /// draw yet (no blocks or an unsized surface).
    pub fn draw_frame<S: DrawingSurface + ?Sized>(&self, surface: &mut S, state: PlaybackState) -> bool {
        if !self.has_data() {
            return false;
        }
        if ready(surface).is_none() {
            trace!("Surface not ready, skipping frame");
            return false;
        }
        self.clear(surface);
        self.draw_histogram(surface, self.blocks.as_slice(), self.palette.base);
        self.draw_progress(surface, state);
        true
    }
}

fn ready<S: DrawingSurface + ?Sized>(surface: &S) -> Option<SurfaceGeometry> {
    surface.geometry().filter(SurfaceGeometry::is_drawable)
}
