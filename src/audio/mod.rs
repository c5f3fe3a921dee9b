//! Audio capabilities consumed by the player: decoding an encoded buffer
//! into samples, and a playback engine exposing time, duration and
//! play/pause/seek.

mod decode;
mod playback;

pub use decode::SymphoniaDecoder;
pub use playback::PulsePlayback;

use crate::error::Result;

/// Decoded audio, de-interleaved per channel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedAudio {
    pub channels: Vec<Vec<f32>>,
    pub sample_rate: u32,
    /// Seconds
    pub duration: f64,
}

impl DecodedAudio {
    pub fn new(channels: Vec<Vec<f32>>, sample_rate: u32) -> Self {
        let frames = channels.first().map_or(0, Vec::len);
        let duration = if sample_rate > 0 {
            frames as f64 / sample_rate as f64
        } else {
            0.0
        };
        Self {
            channels,
            sample_rate,
            duration,
        }
    }

    /// Samples of the first channel, empty when there are none.
    pub fn first_channel(&self) -> &[f32] {
        self.channels.first().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn frames(&self) -> usize {
        self.channels.iter().map(Vec::len).min().unwrap_or(0)
    }

    /// Frame-interleaved copy of all channels.
    pub fn interleaved(&self) -> Vec<f32> {
        let frames = self.frames();
        let mut out = Vec::with_capacity(frames * self.channels.len());
        for i in 0..frames {
            for channel in &self.channels {
                out.push(channel[i]);
            }
        }
        out
    }
}

/// Live playback position, polled every frame and never cached.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlaybackState {
    /// Seconds
    pub current_time: f64,
    /// Seconds
    pub duration: f64,
}

impl PlaybackState {
    pub fn new(current_time: f64, duration: f64) -> Self {
        Self {
            current_time,
            duration,
        }
    }
}

/// Turns an encoded byte buffer into samples.
pub trait Decoder {
    fn decode(&self, bytes: &[u8]) -> Result<DecodedAudio>;
}

/// Playback engine the player drives.
pub trait Playback {
    /// Replace the current source, the way assigning an audio element's `src`
    /// does. Playback position resets to 0.
    fn set_source(&mut self, audio: &DecodedAudio) -> Result<()>;

    /// Seconds
    fn current_time(&self) -> f64;

    /// Seconds, 0 when nothing is loaded.
    fn duration(&self) -> f64;

    fn play(&mut self) -> Result<()>;

    fn pause(&mut self);

    /// Move the playback position to `time` seconds.
    fn seek(&mut self, time: f64);

    /// Reached the end without looping.
    fn has_ended(&self) -> bool {
        false
    }

    fn state(&self) -> PlaybackState {
        PlaybackState::new(self.current_time(), self.duration())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_from_frames() {
        let audio = DecodedAudio::new(vec![vec![0.0; 22050], vec![0.0; 22050]], 44100);
        assert_eq!(audio.duration, 0.5);
        assert_eq!(audio.frames(), 22050);
        assert_eq!(audio.channel_count(), 2);
    }

    #[test]
    fn empty_audio() {
        let audio = DecodedAudio::new(Vec::new(), 44100);
        assert!(audio.first_channel().is_empty());
        assert_eq!(audio.duration, 0.0);
        assert!(audio.interleaved().is_empty());
    }

    #[test]
    fn interleaves_frames() {
        let audio = DecodedAudio::new(vec![vec![1.0, 2.0], vec![-1.0, -2.0]], 2);
        assert_eq!(audio.interleaved(), vec![1.0, -1.0, 2.0, -2.0]);
    }
}
