//! # Decode Error Types
//!
//! Error types for turning encoded audio into PCM samples.

use thiserror::Error;

/// Errors that can occur while decoding a clip.
#[derive(Error, Debug)]
pub enum DecodeError {
    // ========================================================================
    // Source Errors
    // ========================================================================
    /// Failed to open or read audio source.
    #[error("Failed to open audio source: {0}")]
    SourceError(String),

    /// The source contained no bytes at all.
    #[error("Audio source is empty")]
    EmptyInput,

    // ========================================================================
    // Format/Codec Errors
    // ========================================================================
    /// Audio format is not recognized or cannot be parsed.
    #[error("Unsupported or invalid audio format: {0}")]
    InvalidFormat(String),

    /// Codec is not supported by the decoder.
    #[error("Unsupported codec: {0}")]
    UnsupportedCodec(String),

    /// Audio format was detected but cannot be decoded.
    #[error("Cannot decode audio format: {0}")]
    FormatNotDecodable(String),

    // ========================================================================
    // Decoding Errors
    // ========================================================================
    /// Decoder encountered an internal error.
    #[error("Decoder internal error: {0}")]
    DecoderError(String),

    /// Audio stream is corrupted or contains invalid data.
    #[error("Corrupted audio stream: {0}")]
    CorruptedStream(String),

    /// I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DecodeError {
    /// Returns `true` if this error is related to audio format/codec issues.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            DecodeError::InvalidFormat(_)
                | DecodeError::UnsupportedCodec(_)
                | DecodeError::FormatNotDecodable(_)
        )
    }
}

/// Result type for decode operations.
pub type Result<T> = std::result::Result<T, DecodeError>;
