//! Player orchestration: decode, aggregate, normalize and hand the blocks to
//! the drawer; route clicks and transport commands to the playback engine.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::audio::{DecodedAudio, Decoder, Playback};
use crate::color::WaveformPalette;
use crate::error::{PlayerError, Result};
use crate::geometry::{time_to_x, x_to_time, SurfaceGeometry};
use crate::renderer::{CanvasDrawer, DrawingSurface};
use crate::waveform::{block_count, BlockSequence};

pub struct PlayerController<D, P> {
    decoder: D,
    playback: P,
    drawer: CanvasDrawer,
    geometry: SurfaceGeometry,
    /// Encoded bytes of the current asset, kept to recompute blocks on resize
    asset: Option<Arc<[u8]>>,
    is_playing: bool,
    load_error: Option<String>,
}

impl<D: Decoder, P: Playback> PlayerController<D, P> {
    pub fn new(
        decoder: D,
        playback: P,
        geometry: SurfaceGeometry,
        block_width: u32,
        palette: WaveformPalette,
    ) -> Self {
        Self {
            decoder,
            playback,
            drawer: CanvasDrawer::new(block_width, palette),
            geometry,
            asset: None,
            is_playing: false,
            load_error: None,
        }
    }

    /// Decode `bytes` and install the result.
    pub fn load(&mut self, bytes: impl Into<Arc<[u8]>>) -> Result<()> {
        let asset = bytes.into();
        let decoded = self.decoder.decode(&asset);
        self.install(asset, decoded)
    }

    /// Install the outcome of a decode that ran elsewhere.
    ///
    /// A decode failure is recorded in [`load_error`](Self::load_error),
    /// stops the previous source, clears the waveform and is returned to the
    /// caller; it is not retried. When only the playback sink fails the
    /// waveform is still installed and the error is recorded the same way.
    pub fn install(&mut self, asset: Arc<[u8]>, decoded: Result<DecodedAudio>) -> Result<()> {
        let audio = match decoded {
            Ok(audio) => audio,
            Err(e) => {
                warn!("Load failed: {}", e);
                self.unload(&e);
                return Err(e);
            }
        };

        info!(
            "Loaded {:.2}s of audio ({} channels, {} Hz)",
            audio.duration,
            audio.channel_count(),
            audio.sample_rate
        );
        let sink = self.playback.set_source(&audio);
        self.asset = Some(asset);
        self.apply_samples(&audio);

        match sink {
            Ok(()) => {
                self.load_error = None;
                Ok(())
            }
            Err(e) => {
                warn!("Waveform ready but playback is unavailable: {}", e);
                self.playback.pause();
                self.is_playing = false;
                self.load_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Drop the current asset after a failure.
    fn unload(&mut self, error: &PlayerError) {
        self.playback.pause();
        self.is_playing = false;
        self.asset = None;
        self.drawer.clear_blocks();
        self.load_error = Some(error.to_string());
    }

    /// Aggregate the first channel into blocks for the current width. The
    /// caller drops the decoded samples once the blocks exist.
    fn apply_samples(&mut self, audio: &DecodedAudio) {
        let count = self.block_count_for(self.geometry);
        let samples = audio.first_channel();
        if samples.is_empty() {
            debug!("Empty audio buffer, drawing {} silent blocks", count);
        }
        let blocks = BlockSequence::from_samples(samples, count);
        if blocks.is_silent() && !blocks.is_empty() {
            debug!("Audio has no peak above zero");
        }
        self.drawer.set_blocks(blocks);
    }

    /// Blocks that fit `geometry`; none past the backing-store limit.
    fn block_count_for(&self, geometry: SurfaceGeometry) -> usize {
        if !geometry.within_limits() {
            warn!("Surface width {} is past the backing-store limit", geometry.width);
            return 0;
        }
        block_count(geometry.width, self.drawer.block_width())
    }

    /// Seek to the time under logical pixel `pixel_x`. Returns the new time.
    pub fn handle_click(&mut self, pixel_x: f64) -> f64 {
        let time = x_to_time(pixel_x, self.playback.duration(), self.geometry.width);
        debug!("Click at x={:.1} -> seek to {:.3}s", pixel_x, time);
        self.playback.seek(time);
        time
    }

    /// Seek relative to the current position, clamped to the track.
    pub fn seek_by(&mut self, delta: f64) -> f64 {
        let duration = self.playback.duration();
        let time = (self.playback.current_time() + delta).clamp(0.0, duration.max(0.0));
        self.playback.seek(time);
        time
    }

    pub fn play(&mut self) -> Result<()> {
        self.playback.play()?;
        self.is_playing = true;
        Ok(())
    }

    pub fn pause(&mut self) {
        self.playback.pause();
        self.is_playing = false;
    }

    /// Flip between playing and paused. Returns the new playing state.
    pub fn toggle(&mut self) -> Result<bool> {
        if self.is_playing {
            self.pause();
        } else {
            self.play()?;
        }
        Ok(self.is_playing)
    }

    /// Pick up a playback that stopped on its own. Returns true when the
    /// playing state changed.
    pub fn sync(&mut self) -> bool {
        if self.is_playing && self.playback.has_ended() {
            debug!("Playback reached the end");
            self.is_playing = false;
            return true;
        }
        false
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn is_loaded(&self) -> bool {
        self.asset.is_some()
    }

    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    pub fn blocks(&self) -> &BlockSequence {
        self.drawer.blocks()
    }

    pub fn geometry(&self) -> SurfaceGeometry {
        self.geometry
    }

    /// Logical x of the playhead right now.
    pub fn playhead_x(&self) -> f64 {
        let state = self.playback.state();
        time_to_x(state.current_time, state.duration, self.geometry.width)
    }

    pub fn set_palette(&mut self, palette: WaveformPalette) {
        self.drawer.set_palette(palette);
    }

    /// Draw one frame. A no-op (returning false) until blocks exist or while
    /// the surface is unsized.
    pub fn render<S: DrawingSurface + ?Sized>(&self, surface: &mut S) -> bool {
        self.drawer.draw_frame(surface, self.playback.state())
    }

    /// Apply new geometry to the surface and, if the block count changed,
    /// recompute the blocks from the current asset.
    ///
    /// The asset is decoded again before anything changes. If that fails
    /// the new geometry still applies, but the asset is dropped the same way
    /// a failed load drops it.
    pub fn resize<S: DrawingSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        geometry: SurfaceGeometry,
    ) -> Result<()> {
        let before = self.block_count_for(self.geometry);
        let after = self.block_count_for(geometry);

        let decoded = match &self.asset {
            Some(asset) if before != after => {
                debug!("Block count {} -> {}, recomputing waveform", before, after);
                Some(self.decoder.decode(asset))
            }
            _ => None,
        };

        self.geometry = geometry;
        surface.resize(geometry);

        match decoded {
            Some(Ok(audio)) => self.apply_samples(&audio),
            Some(Err(e)) => {
                warn!("Could not recompute waveform: {}", e);
                self.unload(&e);
                return Err(e);
            }
            None => {}
        }
        Ok(())
    }

    /// One-line summary for the host: state, position and any load error.
    pub fn status_line(&self) -> String {
        if let Some(err) = &self.load_error {
            return format!("error: {}", err);
        }
        if !self.is_loaded() {
            return "loading...".to_string();
        }
        let state = self.playback.state();
        let icon = if self.is_playing { "▶" } else { "⏸" };
        format!(
            "{} {} / {}",
            icon,
            format_time(state.current_time),
            format_time(state.duration)
        )
    }
}

/// `mm:ss`, or `h:mm:ss` past an hour.
pub fn format_time(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    let (h, m, s) = (total / 3600, (total / 60) % 60, total % 60);
    if h > 0 {
        format!("{}:{:02}:{:02}", h, m, s)
    } else {
        format!("{:02}:{:02}", m, s)
    }
}
