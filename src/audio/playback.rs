use libpulse_binding as pulse;
use libpulse_simple_binding as psimple;
use pulse::sample::{Format, Spec};
use pulse::stream::Direction;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{DecodedAudio, Playback};
use crate::error::{PlayerError, Result};

/// Frames written to PulseAudio per iteration (~23ms at 44.1kHz)
const CHUNK_FRAMES: usize = 1024;

/// State shared with the output thread
struct Transport {
    /// Next frame to write
    position: AtomicU64,
    total_frames: AtomicU64,
    playing: AtomicBool,
    looping: AtomicBool,
    ended: AtomicBool,
    stop: AtomicBool,
}

impl Transport {
    fn new(looping: bool) -> Self {
        Self {
            position: AtomicU64::new(0),
            total_frames: AtomicU64::new(0),
            playing: AtomicBool::new(false),
            looping: AtomicBool::new(looping),
            ended: AtomicBool::new(false),
            stop: AtomicBool::new(false),
        }
    }
}

/// PulseAudio playback of a fully decoded source.
pub struct PulsePlayback {
    device: Option<String>,
    looping: bool,
    sample_rate: u32,
    transport: Arc<Transport>,
    output_thread: Option<thread::JoinHandle<()>>,
}

impl Drop for PulsePlayback {
    fn drop(&mut self) {
        self.stop_output();
    }
}

impl PulsePlayback {
    /// `device` is a PulseAudio sink name, `None` for the default sink.
    pub fn new(device: Option<String>, looping: bool) -> Self {
        Self {
            device,
            looping,
            sample_rate: 0,
            transport: Arc::new(Transport::new(looping)),
            output_thread: None,
        }
    }

    fn stop_output(&mut self) {
        self.transport.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.output_thread.take() {
            if handle.join().is_err() {
                warn!("Playback thread panicked");
            }
        }
    }

    fn output_loop(pulse: psimple::Simple, samples: Arc<Vec<f32>>, channels: usize, transport: Arc<Transport>) {
        let total = transport.total_frames.load(Ordering::Relaxed);

        loop {
            if transport.stop.load(Ordering::Relaxed) {
                debug!("Stop flag set, ending playback loop");
                break;
            }
            if !transport.playing.load(Ordering::Relaxed) {
                thread::sleep(Duration::from_millis(10));
                continue;
            }

            let start = transport.position.load(Ordering::Relaxed);
            if start >= total {
                if transport.looping.load(Ordering::Relaxed) && total > 0 {
                    transport.position.store(0, Ordering::Relaxed);
                } else {
                    transport.playing.store(false, Ordering::Relaxed);
                    transport.ended.store(true, Ordering::Relaxed);
                    if let Err(e) = pulse.drain() {
                        warn!("PulseAudio drain error: {:?}", e);
                    }
                }
                continue;
            }

            let end = (start + CHUNK_FRAMES as u64).min(total);
            let chunk = &samples[start as usize * channels..end as usize * channels];
            let bytes: Vec<u8> = chunk.iter().flat_map(|s| s.to_le_bytes()).collect();

            if let Err(e) = pulse.write(&bytes) {
                warn!("PulseAudio write error: {:?}", e);
                thread::sleep(Duration::from_millis(10));
                continue;
            }

            // A seek landed while we were writing; keep the seek target
            let _ = transport
                .position
                .compare_exchange(start, end, Ordering::Relaxed, Ordering::Relaxed);
        }
    }
}

impl Playback for PulsePlayback {
    fn set_source(&mut self, audio: &DecodedAudio) -> Result<()> {
        // The old source is gone even if the new one fails to open
        self.stop_output();
        self.transport = Arc::new(Transport::new(self.looping));
        self.sample_rate = 0;

        let channels = audio.channel_count();
        let spec = Spec {
            format: Format::F32le,
            channels: u8::try_from(channels)
                .map_err(|_| PlayerError::Playback(format!("{} channels is too many", channels)))?,
            rate: audio.sample_rate,
        };
        if !spec.is_valid() {
            return Err(PlayerError::Playback(format!(
                "invalid sample spec: {} channels at {} Hz",
                channels, audio.sample_rate
            )));
        }

        let pulse = psimple::Simple::new(
            None,                      // Use default server
            "wavestrip",               // Application name
            Direction::Playback,       // Playback stream
            self.device.as_deref(),    // Sink name (None = default)
            "waveform-player",         // Stream description
            &spec,                     // Sample format
            None,                      // Default channel map
            None,                      // Default buffering attributes
        )
        .map_err(|e| PlayerError::Playback(format!("failed to connect to PulseAudio: {:?}", e)))?;

        info!(
            "Playback ready on {}: {} channels at {} Hz",
            self.device.as_deref().unwrap_or("default sink"),
            channels,
            audio.sample_rate
        );

        let transport = Arc::new(Transport::new(self.looping));
        transport
            .total_frames
            .store(audio.frames() as u64, Ordering::Relaxed);
        self.transport = transport.clone();
        self.sample_rate = audio.sample_rate;

        let samples = Arc::new(audio.interleaved());
        let handle = thread::Builder::new()
            .name("wavestrip-playback".into())
            .spawn(move || Self::output_loop(pulse, samples, channels, transport))
            .map_err(|e| PlayerError::Playback(format!("failed to spawn playback thread: {}", e)))?;
        self.output_thread = Some(handle);

        Ok(())
    }

    fn current_time(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        let position = self.transport.position.load(Ordering::Relaxed);
        let total = self.transport.total_frames.load(Ordering::Relaxed);
        position.min(total) as f64 / self.sample_rate as f64
    }

    fn duration(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.transport.total_frames.load(Ordering::Relaxed) as f64 / self.sample_rate as f64
    }

    fn play(&mut self) -> Result<()> {
        if self.output_thread.is_none() {
            debug!("Play requested before a source was loaded");
        }
        let total = self.transport.total_frames.load(Ordering::Relaxed);
        if self.transport.ended.swap(false, Ordering::Relaxed) {
            // Restart from the top, like an ended media element
            self.transport.position.store(0, Ordering::Relaxed);
        } else if self.transport.position.load(Ordering::Relaxed) >= total {
            self.transport.position.store(0, Ordering::Relaxed);
        }
        self.transport.playing.store(true, Ordering::Relaxed);
        Ok(())
    }

    fn pause(&mut self) {
        self.transport.playing.store(false, Ordering::Relaxed);
    }

    fn seek(&mut self, time: f64) {
        if self.sample_rate == 0 || !time.is_finite() {
            return;
        }
        let total = self.transport.total_frames.load(Ordering::Relaxed);
        let frame = ((time.max(0.0) * self.sample_rate as f64) as u64).min(total);
        self.transport.position.store(frame, Ordering::Relaxed);
        self.transport.ended.store(false, Ordering::Relaxed);
    }

    fn has_ended(&self) -> bool {
        self.transport.ended.load(Ordering::Relaxed)
    }
}
