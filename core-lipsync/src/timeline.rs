//! # Timeline
//!
//! The unified data model both producers reduce to: a time-ordered sequence
//! of `(time_offset_ms, mouth_shape)` events.
//!
//! An event's shape is active from its own offset up to (excluding) the next
//! event's offset; the last shape stays active until playback ends. A
//! timeline is immutable once built, so readers never need a lock.

use crate::error::{LipSyncError, Result};
use crate::shape::MouthShape;
use serde::{Deserialize, Serialize};

/// One mouth-shape change at an offset from playback start.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub time_offset_ms: f64,
    pub mouth_shape: MouthShape,
}

impl TimelineEvent {
    pub fn new(time_offset_ms: f64, mouth_shape: MouthShape) -> Self {
        Self {
            time_offset_ms,
            mouth_shape,
        }
    }
}

/// Ordered, immutable sequence of [`TimelineEvent`]s.
///
/// Offsets are finite, non-negative and non-decreasing. Every constructor
/// enforces this, including deserialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<TimelineEvent>", into = "Vec<TimelineEvent>")]
pub struct Timeline {
    events: Vec<TimelineEvent>,
}

impl Timeline {
    /// A timeline with no events. Resolves to [`MouthShape::Closed`] forever.
    pub fn empty() -> Self {
        Self { events: Vec::new() }
    }

    /// Build a timeline from events, rejecting unordered or invalid offsets.
    ///
    /// Equal consecutive offsets are allowed; the later event wins lookups.
    pub fn from_events(events: Vec<TimelineEvent>) -> Result<Self> {
        let mut previous = 0.0f64;
        for (index, event) in events.iter().enumerate() {
            let offset = event.time_offset_ms;
            if !offset.is_finite() || offset < 0.0 {
                return Err(LipSyncError::InvalidOffset { index });
            }
            if offset < previous {
                return Err(LipSyncError::UnorderedEvents { index });
            }
            previous = offset;
        }

        Ok(Self { events })
    }

    /// Producers that emit offsets in ascending order by construction.
    pub(crate) fn from_ordered(events: Vec<TimelineEvent>) -> Self {
        debug_assert!(events
            .windows(2)
            .all(|pair| pair[0].time_offset_ms <= pair[1].time_offset_ms));
        Self { events }
    }

    pub fn events(&self) -> &[TimelineEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TimelineEvent> {
        self.events.iter()
    }

    /// Offset of the last event, if any.
    pub fn last_offset_ms(&self) -> Option<f64> {
        self.events.last().map(|event| event.time_offset_ms)
    }

    /// Index of the event active at `elapsed_ms`: the last event whose
    /// offset is not after it.
    ///
    /// Binary search over the sorted offsets; no allocation.
    pub fn active_index(&self, elapsed_ms: f64) -> Option<usize> {
        let after = self
            .events
            .partition_point(|event| event.time_offset_ms <= elapsed_ms);
        after.checked_sub(1)
    }

    /// Mouth shape at `elapsed_ms` since playback start.
    ///
    /// Before the first event, on an empty timeline, or for a NaN query the
    /// answer is [`MouthShape::Closed`].
    pub fn resolve(&self, elapsed_ms: f64) -> MouthShape {
        self.active_index(elapsed_ms)
            .map(|index| self.events[index].mouth_shape)
            .unwrap_or(MouthShape::Closed)
    }
}

impl TryFrom<Vec<TimelineEvent>> for Timeline {
    type Error = LipSyncError;

    fn try_from(events: Vec<TimelineEvent>) -> Result<Self> {
        Timeline::from_events(events)
    }
}

impl From<Timeline> for Vec<TimelineEvent> {
    fn from(timeline: Timeline) -> Self {
        timeline.events
    }
}

impl<'a> IntoIterator for &'a Timeline {
    type Item = &'a TimelineEvent;
    type IntoIter = std::slice::Iter<'a, TimelineEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}
