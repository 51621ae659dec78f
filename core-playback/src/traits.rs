//! # Sample Decoder Traits
//!
//! The analysis side of the avatar never plays audio itself; it only needs
//! the clip as a mono sequence of signed 16-bit samples plus the sample
//! rate. [`SampleDecoder`] is that contract. Implementations are synchronous
//! and CPU bound, so async callers run them through `spawn_blocking`.
//!
//! ```rust,no_run
//! use bridge_traits::AudioSource;
//! use core_playback::{SampleDecoder, SymphoniaDecoder};
//!
//! let decoder = SymphoniaDecoder::default();
//! let clip = decoder
//!     .decode(&AudioSource::local("/tmp/reply.mp3"))
//!     .expect("decodable clip");
//! println!("{} samples at {} Hz", clip.samples.len(), clip.sample_rate);
//! ```

use crate::error::Result;
use bridge_traits::AudioSource;
use serde::{Deserialize, Serialize};
use std::time::Duration;

// ============================================================================
// Audio Format Types
// ============================================================================

/// Audio codecs recognized in synthesized or recorded clips.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioCodec {
    /// MPEG-1 Audio Layer 3
    Mp3,
    /// Advanced Audio Coding (AAC/M4A)
    Aac,
    /// Free Lossless Audio Codec
    Flac,
    /// Ogg Vorbis
    Vorbis,
    /// Opus
    Opus,
    /// Uncompressed PCM (WAV/AIFF)
    Wav,
    /// Apple Lossless Audio Codec
    Alac,
    /// Codec not recognized
    Unknown,
    /// Any other codec, by name
    Other(String),
}

/// Describes the encoded stream a clip was decoded from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioFormat {
    /// Source codec (before decoding)
    pub codec: AudioCodec,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Channel count of the source (the decoded output is always mono)
    pub channels: u16,
    /// Bits per sample in the source format, when known
    pub bits_per_sample: Option<u16>,
}

impl AudioFormat {
    pub fn new(
        codec: AudioCodec,
        sample_rate: u32,
        channels: u16,
        bits_per_sample: Option<u16>,
    ) -> Self {
        Self {
            codec,
            sample_rate,
            channels,
            bits_per_sample,
        }
    }
}

// ============================================================================
// Decoded Output
// ============================================================================

/// A fully decoded clip: mono signed 16-bit samples and their rate.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedClip {
    /// Mono samples; multi-channel sources are averaged down.
    pub samples: Vec<i16>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Format of the encoded source
    pub format: AudioFormat,
}

impl DecodedClip {
    /// Wraps raw mono PCM, e.g. audio captured directly from a device.
    pub fn from_pcm(samples: Vec<i16>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
            format: AudioFormat::new(AudioCodec::Wav, sample_rate, 1, Some(16)),
        }
    }

    /// Playback length implied by the sample count.
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.samples.len() as f64 / self.sample_rate as f64)
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

// ============================================================================
// Decoder Trait
// ============================================================================

/// Turns an encoded clip into mono 16-bit PCM.
///
/// # Errors
///
/// Implementations fail with a [`crate::DecodeError`] when the source cannot
/// be read or its format is unsupported. Callers on the lip-sync path treat
/// any such failure as "no sync data" rather than a fault.
pub trait SampleDecoder: Send + Sync {
    fn decode(&self, source: &AudioSource) -> Result<DecodedClip>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decoded_clip_duration() {
        let clip = DecodedClip::from_pcm(vec![0; 8000], 16000);
        assert_eq!(clip.duration(), Duration::from_millis(500));
        assert!(!clip.is_empty());
        assert_eq!(clip.format.channels, 1);
    }

    #[test]
    fn test_zero_rate_has_zero_duration() {
        let clip = DecodedClip::from_pcm(vec![1, 2, 3], 0);
        assert_eq!(clip.duration(), Duration::ZERO);
    }

    #[test]
    fn test_codec_serialization() {
        let json = serde_json::to_string(&AudioCodec::Mp3).unwrap();
        assert_eq!(json, "\"mp3\"");
    }
}
