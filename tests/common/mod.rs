#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::f32::consts::PI;
use std::rc::Rc;

use wavestrip::audio::{DecodedAudio, Decoder, Playback};
use wavestrip::color::{ColorScheme, RgbColor, WaveformPalette};
use wavestrip::geometry::SurfaceGeometry;
use wavestrip::renderer::DrawingSurface;
use wavestrip::{PlayerController, PlayerError};

pub fn gen_sine(freq_hz: f32, sr: u32, n: usize, amp: f32) -> Vec<f32> {
    (0..n)
        .map(|i| amp * (2.0 * PI * freq_hz * i as f32 / sr as f32).sin())
        .collect()
}

/// Loud first half, silent second half.
pub fn gen_burst(n: usize) -> Vec<f32> {
    (0..n).map(|i| if i < n / 2 { 0.8 } else { 0.0 }).collect()
}

pub fn palette() -> WaveformPalette {
    ColorScheme::Classic.palette()
}

/// Decoder returning a fixed result and counting calls.
#[derive(Clone)]
pub struct FakeDecoder {
    result: Result<DecodedAudio, String>,
    /// Calls that succeed before every later call fails
    succeed_times: Option<usize>,
    pub calls: Rc<Cell<usize>>,
}

impl FakeDecoder {
    pub fn with_samples(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            result: Ok(DecodedAudio::new(vec![samples], sample_rate)),
            succeed_times: None,
            calls: Rc::new(Cell::new(0)),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            result: Err(message.to_string()),
            succeed_times: None,
            calls: Rc::new(Cell::new(0)),
        }
    }

    /// Decode normally `times` times, then fail.
    pub fn failing_after(mut self, times: usize) -> Self {
        self.succeed_times = Some(times);
        self
    }
}

impl Decoder for FakeDecoder {
    fn decode(&self, _bytes: &[u8]) -> Result<DecodedAudio, PlayerError> {
        let call = self.calls.get();
        self.calls.set(call + 1);
        if self.succeed_times.is_some_and(|n| call >= n) {
            return Err(PlayerError::Decode("stream went away".to_string()));
        }
        self.result.clone().map_err(PlayerError::Decode)
    }
}

#[derive(Debug, Default)]
pub struct TransportState {
    pub current_time: f64,
    pub duration: f64,
    pub playing: bool,
    pub ended: bool,
    pub fail_play: bool,
    pub fail_source: bool,
    pub seeks: Vec<f64>,
    pub sources: usize,
}

/// Playback engine whose state the test can read and move.
#[derive(Clone, Default)]
pub struct FakePlayback {
    pub state: Rc<RefCell<TransportState>>,
}

impl Playback for FakePlayback {
    fn set_source(&mut self, audio: &DecodedAudio) -> Result<(), PlayerError> {
        let mut s = self.state.borrow_mut();
        if s.fail_source {
            s.duration = 0.0;
            s.current_time = 0.0;
            return Err(PlayerError::Playback("connection refused".to_string()));
        }
        s.duration = audio.duration;
        s.current_time = 0.0;
        s.ended = false;
        s.sources += 1;
        Ok(())
    }

    fn current_time(&self) -> f64 {
        self.state.borrow().current_time
    }

    fn duration(&self) -> f64 {
        self.state.borrow().duration
    }

    fn play(&mut self) -> Result<(), PlayerError> {
        let mut s = self.state.borrow_mut();
        if s.fail_play {
            return Err(PlayerError::Playback("no sink".to_string()));
        }
        s.playing = true;
        Ok(())
    }

    fn pause(&mut self) {
        self.state.borrow_mut().playing = false;
    }

    fn seek(&mut self, time: f64) {
        let mut s = self.state.borrow_mut();
        s.current_time = time;
        s.seeks.push(time);
    }

    fn has_ended(&self) -> bool {
        self.state.borrow().ended
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Resize(SurfaceGeometry),
    Clear {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    Fill {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        color: RgbColor,
    },
    Stroke {
        from: (f64, f64),
        to: (f64, f64),
        line_width: f64,
        color: RgbColor,
    },
}

/// Surface that records every command it receives.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub geometry: Option<SurfaceGeometry>,
    pub commands: Vec<DrawCommand>,
}

impl RecordingSurface {
    pub fn sized(width: f64, height: f64) -> Self {
        Self {
            geometry: Some(SurfaceGeometry::new(width, height, 1.0)),
            commands: Vec::new(),
        }
    }

    pub fn fills(&self, color: RgbColor) -> Vec<&DrawCommand> {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Fill { color: fill, .. } if *fill == color))
            .collect()
    }

    pub fn strokes(&self) -> Vec<&DrawCommand> {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Stroke { .. }))
            .collect()
    }

    pub fn take(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }
}

impl DrawingSurface for RecordingSurface {
    fn geometry(&self) -> Option<SurfaceGeometry> {
        self.geometry
    }

    fn resize(&mut self, geometry: SurfaceGeometry) {
        self.geometry = Some(geometry);
        self.commands.push(DrawCommand::Resize(geometry));
    }

    fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.commands.push(DrawCommand::Clear {
            x,
            y,
            width,
            height,
        });
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, color: RgbColor) {
        self.commands.push(DrawCommand::Fill {
            x,
            y,
            width,
            height,
            color,
        });
    }

    fn stroke_line(&mut self, from: (f64, f64), to: (f64, f64), line_width: f64, color: RgbColor) {
        self.commands.push(DrawCommand::Stroke {
            from,
            to,
            line_width,
            color,
        });
    }
}

pub type TestPlayer = PlayerController<FakeDecoder, FakePlayback>;

/// Controller on an 800x400 surface with 3px blocks.
pub fn player_with(decoder: FakeDecoder) -> (TestPlayer, Rc<RefCell<TransportState>>) {
    let playback = FakePlayback::default();
    let state = playback.state.clone();
    let player = PlayerController::new(
        decoder,
        playback,
        SurfaceGeometry::new(800.0, 400.0, 1.0),
        3,
        palette(),
    );
    (player, state)
}
