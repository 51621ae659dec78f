//! # Playback Synchronizer
//!
//! Owned state that picks the mouth shape for the current render tick.
//!
//! ## State Machine
//!
//! ```text
//!            install_timeline + start_playback(now)
//!   ┌──────┐ ─────────────────────────────────────> ┌──────────┐
//!   │ Idle │                                        │ Speaking │
//!   └──────┘ <───────────────────────────────────── └──────────┘
//!            stop_playback / device reports done
//! ```
//!
//! While speaking, `resolve(now)` looks up the active event at
//! `now - playback_start`. Leaving `Speaking` resets the shape to closed and
//! drops the timeline.
//!
//! `resolve` runs once per render tick: it takes no locks, performs no I/O
//! and never allocates. Timelines are swapped as whole `Arc`s, so anyone
//! still holding the previous one keeps a consistent view.

use crate::shape::MouthShape;
use crate::timeline::Timeline;
use bridge_traits::AudioDevice;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Synchronizer phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncPhase {
    #[default]
    Idle,
    Speaking,
}

/// Timeline, clock origin and displayed shape for the current utterance.
#[derive(Debug, Clone, Default)]
pub struct PlaybackState {
    timeline: Option<Arc<Timeline>>,
    playback_start: Option<Duration>,
    phase: SyncPhase,
    current_shape: MouthShape,
}

impl PlaybackState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `timeline` the active one, replacing any previous timeline.
    ///
    /// The clock origin is untouched; call
    /// [`start_playback`](Self::start_playback) when the audio starts.
    pub fn install_timeline(&mut self, timeline: impl Into<Arc<Timeline>>) {
        let timeline = timeline.into();
        debug!(events = timeline.len(), "Timeline installed");
        self.timeline = Some(timeline);
    }

    /// Enter `Speaking` with `now` as the playback start.
    ///
    /// Restarting while already speaking moves the origin (superseding
    /// utterance). Without an installed timeline the mouth stays closed.
    pub fn start_playback(&mut self, now: Duration) {
        self.playback_start = Some(now);
        self.phase = SyncPhase::Speaking;
        self.current_shape = MouthShape::Closed;
    }

    /// Return to `Idle`: shape closed, timeline discarded.
    pub fn stop_playback(&mut self) {
        if self.phase == SyncPhase::Speaking {
            debug!("Playback stopped, mouth reset");
        }
        self.phase = SyncPhase::Idle;
        self.playback_start = None;
        self.timeline = None;
        self.current_shape = MouthShape::Closed;
    }

    /// Mouth shape for `now`, recorded as the displayed shape.
    ///
    /// Idle always resolves to [`MouthShape::Closed`]. A `now` earlier than
    /// the playback start counts as zero elapsed time.
    pub fn resolve(&mut self, now: Duration) -> MouthShape {
        self.current_shape = self.shape_at(now);
        self.current_shape
    }

    /// Like [`resolve`](Self::resolve) without updating the displayed shape.
    pub fn shape_at(&self, now: Duration) -> MouthShape {
        match (&self.timeline, self.elapsed(now)) {
            (Some(timeline), Some(elapsed)) => timeline.resolve(duration_ms(elapsed)),
            _ => MouthShape::Closed,
        }
    }

    /// One render tick against the audio device.
    ///
    /// Stops when the device no longer reports playing; otherwise resolves
    /// at the device clock.
    pub fn tick(&mut self, device: &dyn AudioDevice) -> MouthShape {
        if self.phase == SyncPhase::Speaking && !device.is_playing() {
            self.stop_playback();
            return self.current_shape;
        }

        self.resolve(device.now())
    }

    /// Time since playback start, while speaking.
    pub fn elapsed(&self, now: Duration) -> Option<Duration> {
        match (self.phase, self.playback_start) {
            (SyncPhase::Speaking, Some(start)) => Some(now.saturating_sub(start)),
            _ => None,
        }
    }

    pub fn phase(&self) -> SyncPhase {
        self.phase
    }

    pub fn is_speaking(&self) -> bool {
        self.phase == SyncPhase::Speaking
    }

    pub fn current_shape(&self) -> MouthShape {
        self.current_shape
    }

    /// The active timeline, shared.
    pub fn timeline(&self) -> Option<Arc<Timeline>> {
        self.timeline.clone()
    }

    pub fn playback_start(&self) -> Option<Duration> {
        self.playback_start
    }
}

fn duration_ms(duration: Duration) -> f64 {
    duration.as_nanos() as f64 / 1_000_000.0
}
