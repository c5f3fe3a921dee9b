//! Block-histogram waveform player.
//!
//! Decoded audio is reduced to a fixed number of mean-absolute amplitude
//! blocks, peak-normalized, and drawn as a bottom-anchored histogram with a
//! playhead that follows live playback time. Clicks on the histogram map
//! back to seek times through the same pixel/time mapping the renderer uses.

pub mod animation;
pub mod audio;
pub mod cli;
pub mod color;
pub mod config;
pub mod error;
pub mod geometry;
pub mod player;
pub mod renderer;
pub mod waveform;

pub use error::PlayerError;
pub use player::PlayerController;
