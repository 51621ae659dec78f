//! # Conversation Status
//!
//! What the avatar is doing, and the message shown to the user for it.
//!
//! ```text
//!   Idle ─> Listening ─> Thinking ─> Processing ─> Speaking ─> Idle
//!              │            │            │            │
//!              └────────────┴────────────┴────────────┴──> Error
//! ```
//!
//! A conversation can only be started from `Idle` or `Error`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Conversation phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AvatarStatus {
    #[default]
    Idle,
    Listening,
    Thinking,
    Processing,
    Speaking,
    Error,
}

impl AvatarStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AvatarStatus::Idle => "idle",
            AvatarStatus::Listening => "listening",
            AvatarStatus::Thinking => "thinking",
            AvatarStatus::Processing => "processing",
            AvatarStatus::Speaking => "speaking",
            AvatarStatus::Error => "error",
        }
    }

    /// Message shown while in this status.
    ///
    /// `Error` has no single message; see [`Failure::message`].
    pub fn default_message(&self) -> &'static str {
        match self {
            AvatarStatus::Idle => "Pressione 'Espaço' para falar",
            AvatarStatus::Listening => "Ouvindo...",
            AvatarStatus::Thinking => "Pensando...",
            AvatarStatus::Processing => "Processando...",
            AvatarStatus::Speaking => "Falando...",
            AvatarStatus::Error => "Erro.",
        }
    }

    pub fn can_start_conversation(&self) -> bool {
        matches!(self, AvatarStatus::Idle | AvatarStatus::Error)
    }
}

impl fmt::Display for AvatarStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a conversation turn ended in [`AvatarStatus::Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Failure {
    /// Nothing usable was heard before the timeout.
    NotUnderstood,
    Microphone,
    Dialogue,
    /// The synthesis service rejected the request.
    SynthesisApi,
    /// The synthesis response could not be turned into a clip.
    Synthesis,
    /// The device could not load or play the clip.
    Audio,
}

impl Failure {
    pub fn message(&self) -> &'static str {
        match self {
            Failure::NotUnderstood => "Não entendi. Tente novamente.",
            Failure::Microphone => "Erro no microfone.",
            Failure::Dialogue => "Erro ao conectar com a IA.",
            Failure::SynthesisApi => "Erro de API.",
            Failure::Synthesis => "Erro ao gerar a voz.",
            Failure::Audio => "Erro no áudio.",
        }
    }
}

/// A status together with its user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub status: AvatarStatus,
    pub message: String,
}

impl StatusUpdate {
    /// `status` with its default message.
    pub fn new(status: AvatarStatus) -> Self {
        Self {
            status,
            message: status.default_message().to_string(),
        }
    }

    pub fn idle() -> Self {
        Self::new(AvatarStatus::Idle)
    }

    pub fn error(failure: Failure) -> Self {
        Self {
            status: AvatarStatus::Error,
            message: failure.message().to_string(),
        }
    }
}

impl Default for StatusUpdate {
    fn default() -> Self {
        Self::idle()
    }
}
