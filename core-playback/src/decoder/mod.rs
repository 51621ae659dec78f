//! # Audio Decoder Module
//!
//! One-shot audio decoding using the Symphonia library.
//!
//! ## Architecture
//!
//! The decoder uses Symphonia's three-layer architecture:
//!
//! 1. **MediaSource**: file or in-memory buffer
//! 2. **FormatReader**: demultiplexes the container, reads packets
//! 3. **Decoder**: decodes packets to PCM, which is mixed down to mono `i16`
//!
//! ```text
//! AudioSource → MediaSourceStream → FormatReader → Decoder → DecodedClip
//! ```
//!
//! Every container and codec Symphonia ships with is enabled (MP3, AAC/M4A,
//! FLAC, Vorbis, WAV/AIFF, ALAC). Speech synthesis services usually answer
//! with MP3; WAV is what tests build in memory.

mod format_detector;
mod sample_converter;
mod symphonia;

pub use self::symphonia::SymphoniaDecoder;
pub use format_detector::FormatDetector;
pub use sample_converter::SampleConverter;
