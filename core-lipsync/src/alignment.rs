//! # Alignment Adapter
//!
//! Preferred timeline producer: converts character-level timing from the
//! speech service into mouth-shape events.

use crate::error::{LipSyncError, Result};
use crate::shape::MouthShape;
use crate::timeline::{Timeline, TimelineEvent};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Character-level alignment as delivered by the speech synthesizer.
///
/// `characters[i]` starts at `character_start_times_seconds[i]`. Each entry
/// is normally a single character; longer entries are classified by their
/// first non-whitespace character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignmentData {
    pub characters: Vec<String>,
    pub character_start_times_seconds: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character_end_times_seconds: Option<Vec<f64>>,
}

impl AlignmentData {
    pub fn new(characters: Vec<String>, character_start_times_seconds: Vec<f64>) -> Self {
        Self {
            characters,
            character_start_times_seconds,
            character_end_times_seconds: None,
        }
    }

    /// Build from a string, one entry per `char`.
    pub fn from_text(text: &str, character_start_times_seconds: Vec<f64>) -> Self {
        Self::new(
            text.chars().map(String::from).collect(),
            character_start_times_seconds,
        )
    }

    pub fn len(&self) -> usize {
        self.characters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }
}

/// Maps alignment data onto the shared [`Timeline`] model.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlignmentAdapter;

impl AlignmentAdapter {
    pub fn new() -> Self {
        Self
    }

    /// Convert parallel character and start-time sequences to a timeline.
    ///
    /// Whitespace produces no event. Start times are converted from seconds
    /// to milliseconds. Input is validated, never re-sorted.
    ///
    /// # Errors
    ///
    /// - [`LipSyncError::MalformedAlignment`] if the lengths differ
    /// - [`LipSyncError::InvalidStartTime`] for a negative or non-finite time
    /// - [`LipSyncError::UnorderedAlignment`] if a start time decreases
    /// - [`LipSyncError::EmptyInput`] if no character produces an event
    ///
    /// ```
    /// use core_lipsync::{AlignmentAdapter, MouthShape};
    ///
    /// let timeline = AlignmentAdapter::new()
    ///     .adapt(&["a", " ", "p"], &[0.0, 0.1, 0.2])
    ///     .unwrap();
    /// assert_eq!(timeline.len(), 2);
    /// assert_eq!(timeline.resolve(150.0), MouthShape::Open);
    /// assert_eq!(timeline.resolve(200.0), MouthShape::Closed);
    /// ```
    #[instrument(skip_all, fields(characters = characters.len()))]
    pub fn adapt<S: AsRef<str>>(
        &self,
        characters: &[S],
        start_times_seconds: &[f64],
    ) -> Result<Timeline> {
        if characters.len() != start_times_seconds.len() {
            return Err(LipSyncError::MalformedAlignment {
                characters: characters.len(),
                start_times: start_times_seconds.len(),
            });
        }

        let mut events = Vec::with_capacity(characters.len());
        let mut previous = 0.0f64;

        for (index, (entry, &start)) in characters.iter().zip(start_times_seconds).enumerate() {
            if !start.is_finite() || start < 0.0 {
                return Err(LipSyncError::InvalidStartTime { index });
            }
            if start < previous {
                return Err(LipSyncError::UnorderedAlignment { index });
            }
            previous = start;

            let Some(c) = entry.as_ref().chars().find(|c| !c.is_whitespace()) else {
                continue;
            };

            events.push(TimelineEvent::new(start * 1000.0, MouthShape::for_char(c)));
        }

        if events.is_empty() {
            return Err(LipSyncError::EmptyInput);
        }

        debug!(events = events.len(), "Alignment adapted");
        Ok(Timeline::from_ordered(events))
    }

    /// [`adapt`](Self::adapt) over an [`AlignmentData`] value.
    pub fn adapt_data(&self, alignment: &AlignmentData) -> Result<Timeline> {
        self.adapt(&alignment.characters, &alignment.character_start_times_seconds)
    }
}
