//! # Host Bridge Traits
//!
//! Contracts for everything the avatar core needs but does not own.
//!
//! ## Overview
//!
//! The lip-sync core is pure computation. Audio devices, microphones, and the
//! speech/dialogue services all live with the host and are reached through
//! the traits below. Each host ships its own implementations; tests use
//! mocks.
//!
//! ## Traits
//!
//! ### Audio
//! - [`AudioDevice`](playback::AudioDevice) - Load, play and poll a clip; monotonic clock
//!
//! ### Conversation services
//! - [`SpeechRecognizer`](speech::SpeechRecognizer) - Microphone capture and transcription
//! - [`DialogueModel`](speech::DialogueModel) - Reply generation
//! - [`SpeechSynthesizer`](speech::SpeechSynthesizer) - Text-to-speech, optionally with
//!   character alignment
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Monotonic time source for deterministic testing
//! - [`LoggerSink`](log::LoggerSink) - Forward structured logs to host logging
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations
//! should convert platform errors into it and keep messages actionable.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync`: conversation steps run on
//! background tasks while the render loop polls the device.

pub mod error;
pub mod log;
pub mod playback;
pub mod speech;
pub mod time;

pub use error::{BridgeError, Result};

pub use log::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};
pub use playback::{AudioDevice, AudioSource};
pub use speech::{
    DialogueModel, ListenOptions, SpeechRecognizer, SpeechSynthesizer, SynthesisResponse,
};
pub use time::{Clock, ManualClock, MonotonicClock};
