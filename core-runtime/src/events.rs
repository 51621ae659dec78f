//! # Event Bus System
//!
//! Broadcasts what the avatar is doing to any number of diagnostic consumers
//! using `tokio::sync::broadcast`.
//!
//! ## Overview
//!
//! The event bus system consists of:
//! - **Event Types**: Strongly-typed enums per domain (conversation, lip sync, playback)
//! - **EventBus**: Central broadcast channel for publishing events
//! - **EventStream**: Wrapper for consuming events with filtering
//!
//! ```text
//! ┌──────────────┐     emit      ┌───────────┐
//! │ Conversation ├──────────────>│           │     subscribe    ┌────────────┐
//! └──────────────┘               │ EventBus  ├─────────────────>│ Subscriber │
//! ┌──────────────┐     emit      │ (broadcast│                  └────────────┘
//! │ Lip sync     ├──────────────>│  channel) │     subscribe    ┌────────────┐
//! └──────────────┘               │           ├─────────────────>│ Subscriber │
//! ┌──────────────┐     emit      │           │                  └────────────┘
//! │ Playback     ├──────────────>│           │
//! └──────────────┘               └───────────┘
//! ```
//!
//! Publishing never blocks and never fails the caller in a way that matters:
//! with no subscribers `emit` returns an error that producers ignore.
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{AvatarEvent, EventBus, LipSyncEvent};
//!
//! let event_bus = EventBus::new(100);
//! let mut subscriber = event_bus.subscribe();
//!
//! event_bus
//!     .emit(AvatarEvent::LipSync(LipSyncEvent::AnalysisDegraded {
//!         reason: "decode failed".to_string(),
//!     }))
//!     .ok();
//!
//! assert!(subscriber.try_recv().is_ok());
//! ```
//!
//! ## Error Handling
//!
//! - **`RecvError::Lagged(n)`**: Subscriber was too slow and missed `n` events.
//!   This is non-fatal; the subscriber can continue receiving new events.
//! - **`RecvError::Closed`**: All senders have been dropped. This indicates shutdown.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Avatar Event Types
// ============================================================================

/// Top-level event published on the bus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum AvatarEvent {
    /// Conversation status changes
    Conversation(ConversationEvent),
    /// Timeline construction and analysis
    LipSync(LipSyncEvent),
    /// Audio output lifecycle
    Playback(PlaybackEvent),
}

impl AvatarEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            AvatarEvent::Conversation(e) => e.description(),
            AvatarEvent::LipSync(e) => e.description(),
            AvatarEvent::Playback(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            AvatarEvent::Conversation(ConversationEvent::StatusChanged { status, .. })
                if status == "error" =>
            {
                EventSeverity::Error
            }
            AvatarEvent::Playback(PlaybackEvent::Failed { .. }) => EventSeverity::Error,
            AvatarEvent::LipSync(LipSyncEvent::AnalysisDegraded { .. }) => {
                EventSeverity::Warning
            }
            AvatarEvent::LipSync(LipSyncEvent::AlignmentRejected { .. }) => {
                EventSeverity::Warning
            }
            AvatarEvent::Conversation(_) => EventSeverity::Info,
            AvatarEvent::Playback(PlaybackEvent::Started { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

// ============================================================================
// Conversation Events
// ============================================================================

/// Events describing the conversation state machine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum ConversationEvent {
    /// The avatar entered a new status.
    StatusChanged {
        /// Lowercase status name (e.g. "listening", "speaking", "error").
        status: String,
        /// User-facing message shown with the status.
        message: String,
    },
    /// The recognizer returned a transcript.
    Heard {
        /// Number of characters in the transcript.
        characters: usize,
    },
    /// The dialogue model produced a reply.
    Replied {
        /// Number of characters in the reply.
        characters: usize,
    },
}

impl ConversationEvent {
    fn description(&self) -> &str {
        match self {
            ConversationEvent::StatusChanged { .. } => "Avatar status changed",
            ConversationEvent::Heard { .. } => "User speech recognized",
            ConversationEvent::Replied { .. } => "Reply generated",
        }
    }
}

// ============================================================================
// Lip Sync Events
// ============================================================================

/// Events describing mouth-shape timeline construction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum LipSyncEvent {
    /// A new timeline became the active one.
    TimelineInstalled {
        /// Identifier of the utterance the timeline belongs to.
        utterance_id: String,
        /// Where the timeline came from ("alignment" or "envelope").
        source: String,
        /// Number of events in the timeline.
        events: usize,
    },
    /// Alignment data was present but unusable; the envelope analyzer was used.
    AlignmentRejected {
        /// Why the alignment was rejected.
        reason: String,
    },
    /// Volume analysis failed and an empty timeline was produced.
    AnalysisDegraded {
        /// Why analysis failed.
        reason: String,
    },
}

impl LipSyncEvent {
    fn description(&self) -> &str {
        match self {
            LipSyncEvent::TimelineInstalled { .. } => "Mouth timeline installed",
            LipSyncEvent::AlignmentRejected { .. } => "Alignment rejected, using volume analysis",
            LipSyncEvent::AnalysisDegraded { .. } => "Volume analysis failed",
        }
    }
}

// ============================================================================
// Playback Events
// ============================================================================

/// Events describing the audio output of an utterance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum PlaybackEvent {
    /// Audio started; the synchronizer clock origin was captured.
    Started {
        utterance_id: String,
    },
    /// The device stopped producing audio; mouth reset to closed.
    Finished {
        utterance_id: String,
    },
    /// The device could not load or play the audio.
    Failed {
        utterance_id: String,
        message: String,
    },
}

impl PlaybackEvent {
    fn description(&self) -> &str {
        match self {
            PlaybackEvent::Started { .. } => "Playback started",
            PlaybackEvent::Finished { .. } => "Playback finished",
            PlaybackEvent::Failed { .. } => "Playback failed",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central broadcast channel for avatar events.
///
/// Cloning the bus is cheap; all clones publish to the same subscribers.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<AvatarEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    ///
    /// A subscriber that falls behind by more than `capacity` events receives
    /// `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an error
    /// if there are none.
    pub fn emit(&self, event: AvatarEvent) -> Result<usize, SendError<AvatarEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<AvatarEvent> {
        self.sender.subscribe()
    }

    /// Convenience for `EventStream::new(self.subscribe())`.
    pub fn stream(&self) -> EventStream {
        EventStream::new(self.subscribe())
    }

    /// Returns the number of active subscribers.
    ///
    /// ```rust
    /// use core_runtime::events::EventBus;
    ///
    /// let event_bus = EventBus::new(16);
    /// assert_eq!(event_bus.subscriber_count(), 0);
    ///
    /// let _subscriber = event_bus.subscribe();
    /// assert_eq!(event_bus.subscriber_count(), 1);
    /// ```
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

type EventFilter = Box<dyn Fn(&AvatarEvent) -> bool + Send + Sync>;

/// A wrapper around `broadcast::Receiver` with optional filtering.
///
/// ```rust
/// use core_runtime::events::{AvatarEvent, EventBus, EventSeverity};
///
/// let event_bus = EventBus::new(100);
/// let warnings = event_bus
///     .stream()
///     .filter(|event| event.severity() >= EventSeverity::Warning);
/// ```
pub struct EventStream {
    receiver: Receiver<AvatarEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<AvatarEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Only events matching `predicate` will be returned.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&AvatarEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    fn accepts(&self, event: &AvatarEvent) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
    }

    /// Receives the next event that passes the filter.
    ///
    /// # Errors
    ///
    /// Returns `RecvError::Lagged(n)` if the subscriber fell behind by `n` events.
    /// Returns `RecvError::Closed` if all senders have been dropped.
    pub async fn recv(&mut self) -> Result<AvatarEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.accepts(&event) {
                return Ok(event);
            }
        }
    }

    /// Attempts to receive an event without waiting.
    ///
    /// Returns `None` if no matching event is currently available.
    pub fn try_recv(&mut self) -> Option<Result<AvatarEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.accepts(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}
