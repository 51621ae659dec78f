//! # Symphonia Decoder Implementation
//!
//! One-shot decoder that reads a whole clip into mono `i16` samples.

use crate::config::DecoderConfig;
use crate::decoder::format_detector::FormatDetector;
use crate::decoder::sample_converter::SampleConverter;
use crate::error::{DecodeError, Result};
use crate::traits::{AudioFormat, DecodedClip, SampleDecoder};
use bridge_traits::AudioSource;
use std::io::Cursor;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSource, MediaSourceStream};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, error, info, instrument, warn};

/// Symphonia-backed [`SampleDecoder`].
///
/// The decoder is stateless between calls; every `decode` opens the source,
/// probes the container, picks the first decodable audio track and reads it
/// to the end. Corrupted packets are skipped until
/// [`DecoderConfig::max_consecutive_errors`] failures happen in a row.
#[derive(Debug, Clone, Default)]
pub struct SymphoniaDecoder {
    config: DecoderConfig,
}

impl SymphoniaDecoder {
    pub fn new(config: DecoderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Open media source from an `AudioSource`.
    fn open_media_source(source: &AudioSource) -> Result<(MediaSourceStream, Hint)> {
        match source {
            AudioSource::LocalFile { path } => {
                let file = std::fs::File::open(path).map_err(|e| {
                    error!("Failed to open file {:?}: {}", path, e);
                    DecodeError::SourceError(format!("Failed to open file: {}", e))
                })?;

                let hint = FormatDetector::hint_from_path(path);
                let media_source = Box::new(file) as Box<dyn MediaSource>;
                Ok((MediaSourceStream::new(media_source, Default::default()), hint))
            }
            AudioSource::MemoryBuffer { data, mime_type } => {
                if data.is_empty() {
                    return Err(DecodeError::EmptyInput);
                }

                let hint = match mime_type {
                    Some(mime) => FormatDetector::hint_from_mime_type(mime),
                    None => Hint::new(),
                };

                let cursor = Cursor::new(data.clone());
                let media_source = Box::new(cursor) as Box<dyn MediaSource>;
                Ok((MediaSourceStream::new(media_source, Default::default()), hint))
            }
        }
    }
}

impl SampleDecoder for SymphoniaDecoder {
    #[instrument(skip(self, source), fields(source = %source.describe()))]
    fn decode(&self, source: &AudioSource) -> Result<DecodedClip> {
        let (media_source, hint) = Self::open_media_source(source)?;

        let probe_result = symphonia::default::get_probe()
            .format(
                &hint,
                media_source,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| {
                warn!("Format probe failed: {}", e);
                DecodeError::InvalidFormat(format!("Failed to probe format: {}", e))
            })?;

        let mut format_reader = probe_result.format;

        let track = format_reader
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| {
                DecodeError::FormatNotDecodable("No supported audio tracks".to_string())
            })?;

        let track_id = track.id;
        let codec = FormatDetector::detect_codec(track.codec_params.codec);
        FormatDetector::validate_codec_support(&codec)?;

        let mut sample_rate = track.codec_params.sample_rate;
        let mut channels = track
            .codec_params
            .channels
            .map(|ch| ch.count() as u16)
            .unwrap_or(0);
        let bits_per_sample = track.codec_params.bits_per_sample.map(|b| b as u16);

        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| {
                DecodeError::DecoderError(format!("Failed to create codec decoder: {}", e))
            })?;

        debug!(?codec, ?sample_rate, channels, "Decoder initialized");

        let mut samples: Vec<i16> = match track.codec_params.n_frames {
            Some(frames) => Vec::with_capacity(frames.min(1 << 24) as usize),
            None => Vec::new(),
        };
        let mut consecutive_errors = 0usize;
        let max_errors = self.config.max_consecutive_errors.max(1);

        loop {
            let packet = match format_reader.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break;
                }
                Err(SymphoniaError::ResetRequired) => {
                    // Chained streams; the first one is the clip
                    debug!("Track list changed, stopping at first stream");
                    break;
                }
                Err(SymphoniaError::IoError(e)) => {
                    consecutive_errors += 1;
                    warn!(
                        "I/O error reading packet (attempt {}/{}): {}",
                        consecutive_errors, max_errors, e
                    );
                    if consecutive_errors >= max_errors {
                        return Err(DecodeError::SourceError(format!(
                            "Stream I/O failure after {} attempts: {}",
                            max_errors, e
                        )));
                    }
                    continue;
                }
                Err(e) => {
                    return Err(DecodeError::DecoderError(format!(
                        "Failed to read packet: {}",
                        e
                    )));
                }
            };

            while !format_reader.metadata().is_latest() {
                format_reader.metadata().pop();
            }

            if packet.track_id() != track_id {
                continue;
            }

            match decoder.decode(&packet) {
                Ok(decoded) => {
                    consecutive_errors = 0;

                    let spec = decoded.spec();
                    if sample_rate.is_none() {
                        sample_rate = Some(spec.rate);
                    }
                    channels = spec.channels.count() as u16;

                    SampleConverter::append_mono_i16(&decoded, &mut samples);

                    if let Some(rate) = sample_rate {
                        let limit = self.config.max_samples(rate);
                        if samples.len() >= limit {
                            warn!(
                                "Clip exceeds {:?}, truncating analysis input",
                                self.config.max_duration
                            );
                            samples.truncate(limit);
                            break;
                        }
                    }
                }
                Err(SymphoniaError::IoError(err)) => {
                    consecutive_errors += 1;
                    warn!(
                        "Skipping corrupted packet (attempt {}/{}): {}",
                        consecutive_errors, max_errors, err
                    );
                    if consecutive_errors >= max_errors {
                        return Err(DecodeError::CorruptedStream(format!(
                            "Stream corruption after {} failed packets",
                            max_errors
                        )));
                    }
                }
                Err(SymphoniaError::DecodeError(err)) => {
                    consecutive_errors += 1;
                    warn!(
                        "Skipping packet with decode error (attempt {}/{}): {}",
                        consecutive_errors, max_errors, err
                    );
                    if consecutive_errors >= max_errors {
                        return Err(DecodeError::DecoderError(format!(
                            "Decoder failure after {} failed packets: {}",
                            max_errors, err
                        )));
                    }
                }
                Err(e) => {
                    return Err(DecodeError::DecoderError(format!(
                        "Failed to decode packet: {}",
                        e
                    )));
                }
            }
        }

        let sample_rate = sample_rate
            .ok_or_else(|| DecodeError::InvalidFormat("Missing sample rate".to_string()))?;

        info!(
            samples = samples.len(),
            sample_rate,
            channels,
            "Clip decoded"
        );

        Ok(DecodedClip {
            samples,
            sample_rate,
            format: AudioFormat::new(codec, sample_rate, channels, bits_per_sample),
        })
    }
}
