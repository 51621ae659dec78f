//! # Timeline Sources
//!
//! Both producers are reduced through one interface so the synchronizer is
//! written once against [`Timeline`].
//!
//! ```text
//!  AlignmentData ──> AlignmentAdapter ──┐
//!                                       ├──> Timeline ──> PlaybackState
//!  DecodedClip ────> EnvelopeAnalyzer ──┘
//! ```
//!
//! [`TimelineBuilder`] applies the selection policy: alignment when present
//! and valid, otherwise volume analysis of the decoded clip, otherwise an
//! empty timeline.

use crate::alignment::{AlignmentAdapter, AlignmentData};
use crate::config::LipSyncConfig;
use crate::envelope::EnvelopeAnalyzer;
use crate::error::Result;
use crate::timeline::Timeline;
use bridge_traits::AudioSource;
use core_playback::{DecodedClip, SampleDecoder, SymphoniaDecoder};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Raw input for one of the two timeline producers.
#[derive(Debug, Clone)]
pub enum TimelineSource {
    /// Character timings from the speech service.
    Alignment(AlignmentData),
    /// Decoded samples for volume analysis.
    Envelope(DecodedClip),
}

impl TimelineSource {
    pub fn kind(&self) -> TimelineSourceKind {
        match self {
            TimelineSource::Alignment(_) => TimelineSourceKind::Alignment,
            TimelineSource::Envelope(_) => TimelineSourceKind::Envelope,
        }
    }

    /// Reduce this input to a timeline with the matching producer.
    ///
    /// # Errors
    ///
    /// Alignment inputs fail as described on [`AlignmentAdapter::adapt`];
    /// envelope inputs fail only with `EmptyInput`.
    pub fn build(&self, adapter: &AlignmentAdapter, analyzer: &EnvelopeAnalyzer) -> Result<Timeline> {
        match self {
            TimelineSource::Alignment(alignment) => adapter.adapt_data(alignment),
            TimelineSource::Envelope(clip) => analyzer.try_analyze(&clip.samples, clip.sample_rate),
        }
    }
}

/// Which producer built a timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimelineSourceKind {
    Alignment,
    Envelope,
}

impl TimelineSourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimelineSourceKind::Alignment => "alignment",
            TimelineSourceKind::Envelope => "envelope",
        }
    }
}

impl fmt::Display for TimelineSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of [`TimelineBuilder::build`].
#[derive(Debug, Clone)]
pub struct BuiltTimeline {
    /// The finished timeline, ready to install.
    pub timeline: Arc<Timeline>,
    /// Producer that was finally used.
    pub source: TimelineSourceKind,
    /// Why alignment data was present but not used.
    pub alignment_rejected: Option<String>,
    /// Why volume analysis produced nothing.
    pub degraded: Option<String>,
}

/// Builds the timeline for one utterance.
pub struct TimelineBuilder {
    adapter: AlignmentAdapter,
    analyzer: EnvelopeAnalyzer,
    decoder: Arc<dyn SampleDecoder>,
}

impl TimelineBuilder {
    pub fn new(config: LipSyncConfig, decoder: Arc<dyn SampleDecoder>) -> Self {
        Self {
            adapter: AlignmentAdapter::new(),
            analyzer: EnvelopeAnalyzer::new(config),
            decoder,
        }
    }

    /// Builder using [`SymphoniaDecoder`] with default limits.
    pub fn with_default_decoder(config: LipSyncConfig) -> Self {
        Self::new(config, Arc::new(SymphoniaDecoder::default()))
    }

    pub fn analyzer(&self) -> &EnvelopeAnalyzer {
        &self.analyzer
    }

    /// Build a timeline for `audio`, preferring `alignment`.
    ///
    /// Never fails. Unusable alignment falls back to volume analysis; a clip
    /// that cannot be decoded yields an empty timeline, which keeps the mouth
    /// closed while the audio still plays.
    #[instrument(skip_all, fields(source = %audio.describe(), has_alignment = alignment.is_some()))]
    pub fn build(&self, audio: &AudioSource, alignment: Option<&AlignmentData>) -> BuiltTimeline {
        let mut alignment_rejected = None;

        if let Some(alignment) = alignment {
            match self.adapter.adapt_data(alignment) {
                Ok(timeline) => {
                    info!(events = timeline.len(), "Timeline built from alignment");
                    return BuiltTimeline {
                        timeline: Arc::new(timeline),
                        source: TimelineSourceKind::Alignment,
                        alignment_rejected: None,
                        degraded: None,
                    };
                }
                Err(err) => {
                    warn!("Alignment rejected, falling back to volume analysis: {}", err);
                    alignment_rejected = Some(err.to_string());
                }
            }
        }

        let (timeline, degraded) = match self
            .analyzer
            .try_analyze_source(self.decoder.as_ref(), audio)
        {
            Ok(timeline) => (timeline, None),
            Err(err) => {
                warn!("Volume analysis unavailable, mouth stays closed: {}", err);
                (Timeline::empty(), Some(err.to_string()))
            }
        };

        info!(events = timeline.len(), "Timeline built from volume envelope");
        BuiltTimeline {
            timeline: Arc::new(timeline),
            source: TimelineSourceKind::Envelope,
            alignment_rejected,
            degraded,
        }
    }

    /// Reduce an explicit source, skipping the fallback policy.
    pub fn build_source(&self, source: &TimelineSource) -> Result<Timeline> {
        source.build(&self.adapter, &self.analyzer)
    }
}

impl fmt::Debug for TimelineBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimelineBuilder")
            .field("analyzer", &self.analyzer)
            .finish_non_exhaustive()
    }
}
