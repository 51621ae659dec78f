//! # Speech Synthesis Responses
//!
//! The synthesizer answers in one of two shapes:
//!
//! - `application/json`: `{ "audio_base64": "...", "alignment": {...} | null }`,
//!   where `alignment` carries per-character start times
//! - `audio/*` (normally `audio/mpeg`): the encoded clip itself, no alignment
//!
//! Anything else is rejected.

use crate::error::{Result, ServiceError};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bridge_traits::{AudioSource, SynthesisResponse};
use bytes::Bytes;
use core_lipsync::AlignmentData;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

/// Clip the synthesizer produced for json responses.
const JSON_AUDIO_MIME: &str = "audio/mpeg";

/// A synthesized reply ready for timeline building and playback.
#[derive(Debug, Clone)]
pub struct SpeechClip {
    /// In-memory encoded audio.
    pub audio: AudioSource,
    /// Character timings, when the service provided them.
    pub alignment: Option<AlignmentData>,
}

impl SpeechClip {
    pub fn has_alignment(&self) -> bool {
        self.alignment.is_some()
    }
}

#[derive(Debug, Deserialize)]
struct SynthesisPayload {
    #[serde(default)]
    audio_base64: Option<String>,
    #[serde(default)]
    alignment: Option<serde_json::Value>,
}

/// Interpret a raw synthesis response.
///
/// # Errors
///
/// - [`ServiceError::UnexpectedContentType`] for anything but json or audio
/// - [`ServiceError::InvalidPayload`] for unparseable json or base64
/// - [`ServiceError::MissingAudio`] when no audio bytes come out
///
/// An alignment object of the wrong shape is dropped with a warning; the
/// clip is still usable through volume analysis.
#[instrument(skip_all, fields(content_type = %response.content_type, bytes = response.body.len()))]
pub fn parse_synthesis_response(response: SynthesisResponse) -> Result<SpeechClip> {
    let content_type = mime_essence(&response.content_type);

    if content_type == "application/json" {
        info!("Synthesis returned json with alignment data");
        parse_json(&response.body)
    } else if content_type.starts_with("audio/") {
        warn!("Synthesis returned raw audio without alignment data");
        if response.body.is_empty() {
            return Err(ServiceError::MissingAudio);
        }
        Ok(SpeechClip {
            audio: AudioSource::memory(response.body, Some(content_type)),
            alignment: None,
        })
    } else {
        Err(ServiceError::UnexpectedContentType(response.content_type))
    }
}

fn parse_json(body: &[u8]) -> Result<SpeechClip> {
    let payload: SynthesisPayload = serde_json::from_slice(body)
        .map_err(|e| ServiceError::InvalidPayload(e.to_string()))?;

    let encoded = payload
        .audio_base64
        .filter(|s| !s.is_empty())
        .ok_or(ServiceError::MissingAudio)?;
    let audio = STANDARD
        .decode(encoded.trim())
        .map_err(|e| ServiceError::InvalidPayload(format!("audio_base64: {}", e)))?;
    if audio.is_empty() {
        return Err(ServiceError::MissingAudio);
    }

    let alignment = match payload.alignment {
        None | Some(serde_json::Value::Null) => None,
        Some(value) => match serde_json::from_value::<AlignmentData>(value) {
            Ok(alignment) => {
                debug!(characters = alignment.len(), "Alignment received");
                Some(alignment)
            }
            Err(e) => {
                warn!("Ignoring malformed alignment object: {}", e);
                None
            }
        },
    };

    Ok(SpeechClip {
        audio: AudioSource::memory(Bytes::from(audio), Some(JSON_AUDIO_MIME.to_string())),
        alignment,
    })
}

/// Lowercased `type/subtype`, without parameters.
fn mime_essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn json_response(body: &str) -> SynthesisResponse {
        SynthesisResponse::new("application/json; charset=utf-8", body.as_bytes().to_vec())
    }

    fn memory_bytes(source: &AudioSource) -> &[u8] {
        match source {
            AudioSource::MemoryBuffer { data, .. } => data,
            AudioSource::LocalFile { .. } => panic!("expected a memory buffer"),
        }
    }

    #[test]
    fn test_json_with_alignment() {
        // "ID3!" in base64
        let clip = parse_synthesis_response(json_response(
            r#"{
                "audio_base64": "SUQzIQ==",
                "alignment": {
                    "characters": ["O", "i"],
                    "character_start_times_seconds": [0.0, 0.1],
                    "character_end_times_seconds": [0.1, 0.2]
                }
            }"#,
        ))
        .unwrap();

        assert_eq!(memory_bytes(&clip.audio), b"ID3!");
        let alignment = clip.alignment.unwrap();
        assert_eq!(alignment.characters, vec!["O", "i"]);
        assert_eq!(alignment.character_start_times_seconds, vec![0.0, 0.1]);
    }

    #[test]
    fn test_json_with_null_alignment() {
        let clip =
            parse_synthesis_response(json_response(r#"{"audio_base64": "SUQzIQ==", "alignment": null}"#))
                .unwrap();
        assert!(!clip.has_alignment());
    }

    #[test]
    fn test_json_with_malformed_alignment_keeps_audio() {
        let clip = parse_synthesis_response(json_response(
            r#"{"audio_base64": "SUQzIQ==", "alignment": {"characters": "Oi"}}"#,
        ))
        .unwrap();
        assert!(!clip.has_alignment());
        assert_eq!(memory_bytes(&clip.audio).len(), 4);
    }

    #[test]
    fn test_json_without_audio() {
        for body in [r#"{"alignment": null}"#, r#"{"audio_base64": ""}"#] {
            assert!(matches!(
                parse_synthesis_response(json_response(body)),
                Err(ServiceError::MissingAudio)
            ));
        }
    }

    #[test]
    fn test_json_invalid_payloads() {
        assert!(matches!(
            parse_synthesis_response(json_response("not json")),
            Err(ServiceError::InvalidPayload(_))
        ));
        assert!(matches!(
            parse_synthesis_response(json_response(r#"{"audio_base64": "***"}"#)),
            Err(ServiceError::InvalidPayload(_))
        ));
    }

    #[test]
    fn test_raw_audio() {
        let clip =
            parse_synthesis_response(SynthesisResponse::new("audio/mpeg", vec![0xFF, 0xFB, 0x90]))
                .unwrap();
        assert!(!clip.has_alignment());
        assert_eq!(memory_bytes(&clip.audio), &[0xFF, 0xFB, 0x90]);
        assert_eq!(clip.audio.describe(), "memory buffer (3 bytes, audio/mpeg)");
    }

    #[test]
    fn test_raw_audio_empty() {
        assert!(matches!(
            parse_synthesis_response(SynthesisResponse::new("audio/mpeg", Vec::new())),
            Err(ServiceError::MissingAudio)
        ));
    }

    #[test]
    fn test_unexpected_content_type() {
        let err = parse_synthesis_response(SynthesisResponse::new("text/html", b"<html>".to_vec()))
            .unwrap_err();
        assert!(matches!(err, ServiceError::UnexpectedContentType(ref t) if t == "text/html"));
    }
}
