use thiserror::Error;

use crate::status::AvatarStatus;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Unexpected content type from speech synthesis: {0}")]
    UnexpectedContentType(String),

    #[error("Speech synthesis response contained no audio")]
    MissingAudio,

    #[error("Invalid speech synthesis payload: {0}")]
    InvalidPayload(String),

    #[error("Audio device error: {0}")]
    Device(String),

    #[error("Conversation already in progress (status: {0})")]
    ConversationInProgress(AvatarStatus),

    #[error("Configuration error: {0}")]
    Config(#[from] core_runtime::Error),
}

pub type Result<T> = std::result::Result<T, ServiceError>;
