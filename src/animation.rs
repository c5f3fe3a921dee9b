//! Frame scheduling for the waveform view.
//!
//! The driver owns at most one scheduled frame. Each run re-arms the next
//! frame before executing the body, so a body that fails leaves the loop
//! alive and a cancel requested from inside the body drops the frame that
//! was just armed.
//!
//! Whether a due frame actually redraws depends on [`RenderPhase`]: while
//! playing every frame redraws, otherwise only frames after something
//! changed (load, seek, pause, resize, palette) do. The pixels produced are
//! the same as redrawing unconditionally.

use std::time::{Duration, Instant};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderPhase {
    /// No block sequence yet
    Unloaded,
    /// Loaded, playhead static
    Idle,
    /// Loaded, playhead moving
    Playing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseEvent {
    Loaded,
    Unloaded,
    Play,
    Pause,
}

/// Identity of one scheduled frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// No frame scheduled
    Stopped,
    /// Scheduled frame is not due yet
    NotDue,
    /// Due, but nothing changed since the last draw
    Skipped,
    Drawn,
    /// Body returned an error; the next frame is still armed
    Failed,
}

/// Handed to the frame body so it can stop the loop mid-frame.
#[derive(Debug, Default)]
pub struct FrameControl {
    cancel_requested: bool,
}

impl FrameControl {
    pub fn cancel(&mut self) {
        self.cancel_requested = true;
    }
}

pub struct AnimationDriver {
    interval: Duration,
    scheduled: Option<(FrameHandle, Instant)>,
    next_id: u64,
    phase: RenderPhase,
    dirty: bool,
    frames_drawn: u64,
    frames_failed: u64,
}

impl AnimationDriver {
    pub fn new(fps: u32) -> Self {
        Self {
            interval: Duration::from_secs_f64(1.0 / fps.max(1) as f64),
            scheduled: None,
            next_id: 0,
            phase: RenderPhase::Unloaded,
            dirty: true,
            frames_drawn: 0,
            frames_failed: 0,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Schedule the first frame immediately. Starting a running loop keeps
    /// the frame already scheduled.
    pub fn start(&mut self, now: Instant) -> FrameHandle {
        if let Some((handle, _)) = self.scheduled {
            return handle;
        }
        self.dirty = true;
        self.schedule(now)
    }

    /// Drop the scheduled frame. Safe to call repeatedly; returns whether a
    /// frame was actually pending.
    pub fn cancel(&mut self) -> bool {
        match self.scheduled.take() {
            Some((handle, _)) => {
                debug!("Cancelled frame {:?}", handle);
                true
            }
            None => false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.scheduled.is_some()
    }

    pub fn scheduled(&self) -> Option<FrameHandle> {
        self.scheduled.map(|(handle, _)| handle)
    }

    /// Time left until the scheduled frame is due, `None` when stopped.
    pub fn time_until_frame(&self, now: Instant) -> Option<Duration> {
        self.scheduled
            .map(|(_, due)| due.saturating_duration_since(now))
    }

    pub fn phase(&self) -> RenderPhase {
        self.phase
    }

    pub fn transition(&mut self, event: PhaseEvent) {
        let next = match (self.phase, event) {
            (_, PhaseEvent::Unloaded) => RenderPhase::Unloaded,
            (RenderPhase::Unloaded, PhaseEvent::Loaded) => RenderPhase::Idle,
            (RenderPhase::Unloaded, _) => RenderPhase::Unloaded,
            (phase, PhaseEvent::Loaded) => phase,
            (_, PhaseEvent::Play) => RenderPhase::Playing,
            (_, PhaseEvent::Pause) => RenderPhase::Idle,
        };
        if next != self.phase {
            debug!("Render phase {:?} -> {:?}", self.phase, next);
            self.phase = next;
        }
        self.dirty = true;
    }

    /// Force the next due frame to redraw.
    pub fn invalidate(&mut self) {
        self.dirty = true;
    }

    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }

    pub fn frames_failed(&self) -> u64 {
        self.frames_failed
    }

    /// Run the scheduled frame if it is due.
    ///
    /// The next frame is armed before `body` runs. Errors from `body` are
    /// logged and never stop the loop.
    pub fn run_frame<F>(&mut self, now: Instant, body: F) -> FrameOutcome
    where
        F: FnOnce(&mut FrameControl) -> anyhow::Result<()>,
    {
        let Some((_, due)) = self.scheduled else {
            return FrameOutcome::Stopped;
        };
        if now < due {
            return FrameOutcome::NotDue;
        }

        // Re-arm first; fall back to `now` when more than a frame behind
        let next_due = if now.duration_since(due) > self.interval {
            now + self.interval
        } else {
            due + self.interval
        };
        self.schedule(next_due);

        if !(self.dirty || self.phase == RenderPhase::Playing) {
            return FrameOutcome::Skipped;
        }

        let mut control = FrameControl::default();
        let outcome = match body(&mut control) {
            Ok(()) => {
                self.dirty = false;
                self.frames_drawn += 1;
                FrameOutcome::Drawn
            }
            Err(e) => {
                self.frames_failed += 1;
                warn!("Frame failed: {:#}", e);
                FrameOutcome::Failed
            }
        };

        if control.cancel_requested {
            self.cancel();
        }
        outcome
    }

    fn schedule(&mut self, due: Instant) -> FrameHandle {
        let handle = FrameHandle(self.next_id);
        self.next_id += 1;
        self.scheduled = Some((handle, due));
        handle
    }
}
