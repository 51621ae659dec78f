//! # Format Detection Module
//!
//! Builds probe hints and classifies codecs for Symphonia.

use crate::error::{DecodeError, Result};
use crate::traits::AudioCodec;
use std::path::Path;
use symphonia::core::codecs::CodecType;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

/// Format detector for audio clips.
pub struct FormatDetector;

impl FormatDetector {
    /// Create a probe hint from file path.
    ///
    /// ```rust
    /// use core_playback::FormatDetector;
    /// use std::path::Path;
    ///
    /// let _hint = FormatDetector::hint_from_path(Path::new("/tmp/reply.mp3"));
    /// ```
    pub fn hint_from_path(path: &Path) -> Hint {
        let mut hint = Hint::new();

        if let Some(extension) = path.extension().and_then(|ext| ext.to_str()) {
            debug!("Setting probe hint extension: {}", extension);
            hint.with_extension(extension);
        } else {
            debug!("No file extension found, probe will auto-detect");
        }

        hint
    }

    /// Create a probe hint from a MIME type such as `audio/mpeg`.
    ///
    /// Parameters after `;` are ignored. Known audio types also set the file
    /// extension, which Symphonia's probe weighs more heavily than the MIME
    /// type.
    pub fn hint_from_mime_type(mime_type: &str) -> Hint {
        let mut hint = Hint::new();
        let essence = Self::mime_essence(mime_type);

        debug!("Creating probe hint from MIME type: {}", essence);
        hint.mime_type(&essence);

        if let Some(extension) = Self::extension_for_mime(&essence) {
            hint.with_extension(extension);
        }

        hint
    }

    /// Lowercased MIME type without parameters.
    pub fn mime_essence(mime_type: &str) -> String {
        mime_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase()
    }

    /// File extension conventionally used for a MIME type.
    pub fn extension_for_mime(mime_type: &str) -> Option<&'static str> {
        match Self::mime_essence(mime_type).as_str() {
            "audio/mpeg" | "audio/mp3" | "audio/mpeg3" => Some("mp3"),
            "audio/wav" | "audio/wave" | "audio/x-wav" | "audio/vnd.wave" => Some("wav"),
            "audio/flac" | "audio/x-flac" => Some("flac"),
            "audio/ogg" | "audio/vorbis" | "application/ogg" => Some("ogg"),
            "audio/opus" => Some("opus"),
            "audio/mp4" | "audio/aac" | "audio/x-m4a" => Some("m4a"),
            "audio/aiff" | "audio/x-aiff" => Some("aiff"),
            _ => None,
        }
    }

    /// Detect audio codec from Symphonia codec type.
    pub fn detect_codec(codec_type: CodecType) -> AudioCodec {
        use symphonia::core::codecs::*;

        if codec_type == CODEC_TYPE_MP3 {
            AudioCodec::Mp3
        } else if codec_type == CODEC_TYPE_AAC {
            AudioCodec::Aac
        } else if codec_type == CODEC_TYPE_FLAC {
            AudioCodec::Flac
        } else if codec_type == CODEC_TYPE_VORBIS {
            AudioCodec::Vorbis
        } else if codec_type == CODEC_TYPE_OPUS {
            AudioCodec::Opus
        } else if codec_type == CODEC_TYPE_ALAC {
            AudioCodec::Alac
        } else if codec_type == CODEC_TYPE_PCM_S16LE
            || codec_type == CODEC_TYPE_PCM_S16BE
            || codec_type == CODEC_TYPE_PCM_S24LE
            || codec_type == CODEC_TYPE_PCM_S24BE
            || codec_type == CODEC_TYPE_PCM_S32LE
            || codec_type == CODEC_TYPE_PCM_S32BE
            || codec_type == CODEC_TYPE_PCM_U8
            || codec_type == CODEC_TYPE_PCM_F32LE
            || codec_type == CODEC_TYPE_PCM_F32BE
            || codec_type == CODEC_TYPE_PCM_F64LE
            || codec_type == CODEC_TYPE_PCM_F64BE
        {
            AudioCodec::Wav
        } else {
            warn!("Unknown codec type: {:?}", codec_type);
            AudioCodec::Unknown
        }
    }

    /// Reject codecs the decoder cannot handle.
    ///
    /// Opus is recognized in Ogg containers but Symphonia has no Opus
    /// decoder, so it is rejected up front with a clear message.
    pub fn validate_codec_support(codec: &AudioCodec) -> Result<()> {
        match codec {
            AudioCodec::Mp3
            | AudioCodec::Aac
            | AudioCodec::Flac
            | AudioCodec::Vorbis
            | AudioCodec::Wav
            | AudioCodec::Alac => Ok(()),
            AudioCodec::Opus => Err(DecodeError::UnsupportedCodec(
                "Opus decoding is not available".to_string(),
            )),
            AudioCodec::Unknown => Err(DecodeError::UnsupportedCodec(
                "Unknown audio codec".to_string(),
            )),
            AudioCodec::Other(name) => Err(DecodeError::UnsupportedCodec(format!(
                "Unsupported codec: {}",
                name
            ))),
        }
    }
}
