//! # Lip Sync Core
//!
//! Produces and replays mouth-shape timelines for a talking avatar.
//!
//! ## Overview
//!
//! - [`AlignmentAdapter`]: character timings from the speech service to a
//!   [`Timeline`] (preferred)
//! - [`EnvelopeAnalyzer`]: windowed RMS of the decoded clip to a
//!   [`Timeline`] (fallback)
//! - [`TimelineBuilder`]: picks the producer, degrading to an empty timeline
//! - [`PlaybackState`]: resolves the shape to draw on each render tick
//! - [`AnalysisWorker`]: runs builds off the render thread
//!
//! ```
//! use core_lipsync::{EnvelopeAnalyzer, MouthShape, PlaybackState};
//! use std::time::Duration;
//!
//! // 500 ms of silence at 8 kHz
//! let timeline = EnvelopeAnalyzer::default().analyze(&[0; 4000], 8000);
//! assert_eq!(timeline.len(), 10);
//!
//! let mut state = PlaybackState::new();
//! state.install_timeline(timeline);
//! state.start_playback(Duration::ZERO);
//! assert_eq!(state.resolve(Duration::from_millis(320)), MouthShape::Closed);
//! ```

pub mod alignment;
pub mod config;
pub mod envelope;
pub mod error;
pub mod shape;
pub mod source;
pub mod sync;
pub mod timeline;
pub mod worker;

pub use alignment::{AlignmentAdapter, AlignmentData};
pub use config::LipSyncConfig;
pub use envelope::{AudioEnvelope, EnvelopeAnalyzer};
pub use error::{LipSyncError, Result};
pub use shape::MouthShape;
pub use source::{BuiltTimeline, TimelineBuilder, TimelineSource, TimelineSourceKind};
pub use sync::{PlaybackState, SyncPhase};
pub use timeline::{Timeline, TimelineEvent};
pub use worker::{AnalysisHandle, AnalysisWorker};
