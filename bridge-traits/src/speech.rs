//! Speech service bridges.
//!
//! The three network collaborators of a conversation turn: speech-to-text,
//! the dialogue model, and text-to-speech. The core never talks to these
//! services directly; hosts inject implementations.

use bytes::Bytes;
use std::time::Duration;

use crate::error::Result;

/// Options for a single listening pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenOptions {
    /// BCP-47 language tag passed to the recognizer (e.g. `pt-BR`).
    pub language: String,
    /// Maximum wait for the user to start talking.
    pub timeout: Duration,
    /// Maximum length of a single phrase.
    pub phrase_time_limit: Duration,
}

impl Default for ListenOptions {
    fn default() -> Self {
        Self {
            language: "pt-BR".to_string(),
            timeout: Duration::from_secs(5),
            phrase_time_limit: Duration::from_secs(10),
        }
    }
}

/// Captures microphone audio and transcribes it.
///
/// Implementations return [`BridgeError::NotUnderstood`](crate::BridgeError::NotUnderstood)
/// or [`BridgeError::Timeout`](crate::BridgeError::Timeout) when the user said
/// nothing usable, and any other error for device or service faults.
#[async_trait::async_trait]
pub trait SpeechRecognizer: Send + Sync {
    async fn listen(&self, options: &ListenOptions) -> Result<String>;
}

/// Generates the avatar's reply for a user utterance.
///
/// Implementations keep their own chat history.
#[async_trait::async_trait]
pub trait DialogueModel: Send + Sync {
    async fn reply(&self, user_text: &str) -> Result<String>;
}

/// Raw response of a speech synthesis request.
///
/// The body is interpreted according to `content_type`; see
/// `core_service::speech` for the accepted shapes.
#[derive(Debug, Clone)]
pub struct SynthesisResponse {
    pub content_type: String,
    pub body: Bytes,
}

impl SynthesisResponse {
    pub fn new(content_type: impl Into<String>, body: impl Into<Bytes>) -> Self {
        Self {
            content_type: content_type.into(),
            body: body.into(),
        }
    }
}

/// Turns reply text into speech audio.
#[async_trait::async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str) -> Result<SynthesisResponse>;
}
