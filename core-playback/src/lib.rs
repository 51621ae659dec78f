//! # Sample Decoding Module
//!
//! Turns encoded speech clips into the raw material the lip-sync analyzer
//! works on.
//!
//! ## Overview
//!
//! This crate handles:
//! - The [`SampleDecoder`] contract: encoded clip in, mono `i16` samples and
//!   sample rate out
//! - [`SymphoniaDecoder`], the implementation backed by symphonia
//! - Format hints from file extensions and MIME types
//! - The [`DecodeError`] taxonomy

pub mod config;
pub mod decoder;
pub mod error;
pub mod traits;

pub use config::DecoderConfig;
pub use decoder::{FormatDetector, SampleConverter, SymphoniaDecoder};
pub use error::{DecodeError, Result};
pub use traits::{AudioCodec, AudioFormat, DecodedClip, SampleDecoder};
