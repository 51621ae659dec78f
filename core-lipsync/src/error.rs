//! # Lip Sync Error Types

use core_playback::DecodeError;
use thiserror::Error;

/// Errors produced while building a mouth-shape timeline.
///
/// None of these are fatal to playback. The timeline builder turns every one
/// of them into "no sync data" (an empty timeline) or into a fallback to
/// volume analysis.
#[derive(Error, Debug)]
pub enum LipSyncError {
    /// Zero samples, zero analysis windows, or an alignment with no
    /// characters to animate.
    #[error("No input to analyze")]
    EmptyInput,

    /// Character and start-time sequences have different lengths.
    #[error(
        "Malformed alignment: {characters} characters but {start_times} start times"
    )]
    MalformedAlignment {
        characters: usize,
        start_times: usize,
    },

    /// A start time is earlier than the one before it.
    #[error("Alignment start times decrease at index {index}")]
    UnorderedAlignment { index: usize },

    /// A start time is negative, NaN or infinite.
    #[error("Invalid alignment start time at index {index}")]
    InvalidStartTime { index: usize },

    /// A timeline event's offset is earlier than the one before it.
    #[error("Timeline offsets decrease at index {index}")]
    UnorderedEvents { index: usize },

    /// A timeline event's offset is negative, NaN or infinite.
    #[error("Invalid timeline offset at index {index}")]
    InvalidOffset { index: usize },

    /// The clip could not be decoded for volume analysis.
    #[error("Decode failed: {0}")]
    Decode(#[from] DecodeError),

    /// The background analysis task ended without producing a result.
    #[error("Analysis worker was cancelled")]
    WorkerCancelled,
}

impl LipSyncError {
    /// Returns `true` if the alignment itself was unusable, meaning the
    /// caller should fall back to volume analysis.
    pub fn is_alignment_error(&self) -> bool {
        matches!(
            self,
            LipSyncError::MalformedAlignment { .. }
                | LipSyncError::UnorderedAlignment { .. }
                | LipSyncError::InvalidStartTime { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, LipSyncError>;
