//! # Volume Envelope Analyzer
//!
//! Fallback timeline producer for clips without alignment data.
//!
//! ## Algorithm
//!
//! 1. Split the samples into consecutive windows of `window_ms`; the last
//!    window may be shorter and is still analyzed.
//! 2. Compute each window's RMS over the raw signed sample values.
//! 3. Normalize by the loudest window of the clip (silence stays at zero).
//! 4. Classify: `> open_threshold` is open, `> mid_threshold` is mid, the
//!    rest is closed.
//! 5. Emit one event per window at `index * window_ms`.
//!
//! Volume is a coarse proxy for articulation. It is only used when the
//! speech service did not provide character timings.

use crate::config::LipSyncConfig;
use crate::error::{LipSyncError, Result};
use crate::shape::MouthShape;
use crate::timeline::{Timeline, TimelineEvent};
use bridge_traits::AudioSource;
use core_playback::{DecodedClip, SampleDecoder};
use tracing::{debug, instrument, warn};

/// Per-window loudness of one clip.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioEnvelope {
    window_ms: u32,
    rms: Vec<f64>,
}

impl AudioEnvelope {
    /// Compute the RMS of every `window_len`-sample window.
    ///
    /// A `window_len` of zero yields an empty envelope.
    pub fn compute(samples: &[i16], window_len: usize, window_ms: u32) -> Self {
        if window_len == 0 {
            return Self {
                window_ms,
                rms: Vec::new(),
            };
        }

        let rms = samples
            .chunks(window_len)
            .map(|window| {
                let sum_sq: u64 = window
                    .iter()
                    .map(|&s| {
                        let s = s as i64;
                        (s * s) as u64
                    })
                    .sum();
                (sum_sq as f64 / window.len() as f64).sqrt()
            })
            .collect();

        Self { window_ms, rms }
    }

    pub fn window_ms(&self) -> u32 {
        self.window_ms
    }

    pub fn rms(&self) -> &[f64] {
        &self.rms
    }

    pub fn len(&self) -> usize {
        self.rms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rms.is_empty()
    }

    /// Loudest window, or `0.0` for an empty envelope.
    pub fn max_rms(&self) -> f64 {
        self.rms.iter().copied().fold(0.0, f64::max)
    }

    /// Volumes in `[0, 1]`, relative to the loudest window.
    ///
    /// All zeros when the clip is silent.
    pub fn normalized(&self) -> impl Iterator<Item = f64> + '_ {
        let max = self.max_rms();
        self.rms
            .iter()
            .map(move |&rms| if max > 0.0 { rms / max } else { 0.0 })
    }
}

/// Turns decoded samples into a volume-derived [`Timeline`].
#[derive(Debug, Clone, Default)]
pub struct EnvelopeAnalyzer {
    config: LipSyncConfig,
}

impl EnvelopeAnalyzer {
    pub fn new(config: LipSyncConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LipSyncConfig {
        &self.config
    }

    /// Map a normalized volume to a mouth shape.
    pub fn classify(&self, volume: f64) -> MouthShape {
        if volume > self.config.open_threshold {
            MouthShape::Open
        } else if volume > self.config.mid_threshold {
            MouthShape::Mid
        } else {
            MouthShape::Closed
        }
    }

    /// Analyze mono samples. Never fails: no input means an empty timeline.
    pub fn analyze(&self, samples: &[i16], sample_rate: u32) -> Timeline {
        match self.try_analyze(samples, sample_rate) {
            Ok(timeline) => timeline,
            Err(err) => {
                debug!("Envelope analysis produced no events: {}", err);
                Timeline::empty()
            }
        }
    }

    /// Like [`analyze`](Self::analyze), but reports
    /// [`LipSyncError::EmptyInput`] when there is nothing to analyze (no
    /// samples, or a window length of zero samples).
    #[instrument(skip(self, samples), fields(samples = samples.len()))]
    pub fn try_analyze(&self, samples: &[i16], sample_rate: u32) -> Result<Timeline> {
        let window_len = self.config.window_len(sample_rate);
        let envelope = AudioEnvelope::compute(samples, window_len, self.config.window_ms);
        if envelope.is_empty() {
            return Err(LipSyncError::EmptyInput);
        }

        let window_ms = self.config.window_ms as f64;
        let events = envelope
            .normalized()
            .enumerate()
            .map(|(index, volume)| {
                TimelineEvent::new(index as f64 * window_ms, self.classify(volume))
            })
            .collect::<Vec<_>>();

        debug!(
            windows = events.len(),
            window_len,
            max_rms = envelope.max_rms(),
            "Envelope analyzed"
        );

        Ok(Timeline::from_ordered(events))
    }

    pub fn analyze_clip(&self, clip: &DecodedClip) -> Timeline {
        self.analyze(&clip.samples, clip.sample_rate)
    }

    /// Decode `source` and analyze it.
    ///
    /// # Errors
    ///
    /// [`LipSyncError::Decode`] if the clip cannot be decoded and
    /// [`LipSyncError::EmptyInput`] if it decodes to nothing.
    pub fn try_analyze_source(
        &self,
        decoder: &dyn SampleDecoder,
        source: &AudioSource,
    ) -> Result<Timeline> {
        let clip = decoder.decode(source)?;
        self.try_analyze(&clip.samples, clip.sample_rate)
    }

    /// Decode `source` and analyze it, degrading to an empty timeline on
    /// any failure.
    pub fn analyze_source(&self, decoder: &dyn SampleDecoder, source: &AudioSource) -> Timeline {
        match self.try_analyze_source(decoder, source) {
            Ok(timeline) => timeline,
            Err(err) => {
                warn!(source = %source.describe(), "Volume analysis unavailable: {}", err);
                Timeline::empty()
            }
        }
    }
}
