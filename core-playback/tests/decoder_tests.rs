//! End-to-end decoding tests over in-memory WAV clips.

use bridge_traits::AudioSource;
use core_playback::{
    AudioCodec, DecodeError, DecoderConfig, SampleDecoder, SymphoniaDecoder,
};
use std::time::Duration;

/// Canonical 44-byte RIFF/WAVE header followed by interleaved PCM16 data.
fn wav_bytes(samples: &[i16], sample_rate: u32, channels: u16) -> Vec<u8> {
    let data_len = (samples.len() * 2) as u32;
    let block_align = channels * 2;
    let byte_rate = sample_rate * block_align as u32;

    let mut out = Vec::with_capacity(44 + data_len as usize);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&channels.to_le_bytes());
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&16u16.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    for sample in samples {
        out.extend_from_slice(&sample.to_le_bytes());
    }
    out
}

fn ramp(len: usize) -> Vec<i16> {
    (0..len).map(|i| ((i % 200) as i16 - 100) * 150).collect()
}

#[test]
fn test_mono_wav_decodes_exactly() {
    let samples = ramp(1600);
    let source = AudioSource::memory(wav_bytes(&samples, 16000, 1), Some("audio/wav".into()));

    let clip = SymphoniaDecoder::default().decode(&source).unwrap();

    assert_eq!(clip.sample_rate, 16000);
    assert_eq!(clip.samples, samples);
    assert_eq!(clip.format.codec, AudioCodec::Wav);
    assert_eq!(clip.format.channels, 1);
    assert_eq!(clip.duration(), Duration::from_millis(100));
}

#[test]
fn test_stereo_wav_is_mixed_to_mono() {
    let mut interleaved = Vec::new();
    for _ in 0..400 {
        interleaved.push(1000);
        interleaved.push(3000);
    }
    let source = AudioSource::memory(wav_bytes(&interleaved, 8000, 2), None);

    let clip = SymphoniaDecoder::default().decode(&source).unwrap();

    assert_eq!(clip.samples.len(), 400);
    assert!(clip.samples.iter().all(|&s| s == 2000));
    assert_eq!(clip.format.channels, 2);
}

#[test]
fn test_local_file_source() {
    let samples = ramp(800);
    let path = std::env::temp_dir().join(format!("core-playback-{}.wav", std::process::id()));
    std::fs::write(&path, wav_bytes(&samples, 8000, 1)).unwrap();

    let result = SymphoniaDecoder::default().decode(&AudioSource::local(&path));
    std::fs::remove_file(&path).ok();

    let clip = result.unwrap();
    assert_eq!(clip.samples, samples);
    assert_eq!(clip.sample_rate, 8000);
}

#[test]
fn test_max_duration_truncates() {
    let samples = ramp(8000);
    let source = AudioSource::memory(wav_bytes(&samples, 8000, 1), Some("audio/wav".into()));
    let decoder = SymphoniaDecoder::new(DecoderConfig {
        max_duration: Duration::from_millis(100),
        ..Default::default()
    });

    let clip = decoder.decode(&source).unwrap();

    assert_eq!(clip.samples.len(), 800);
    assert_eq!(clip.samples[..], samples[..800]);
}

#[test]
fn test_header_only_wav_has_no_samples() {
    let source = AudioSource::memory(wav_bytes(&[], 22050, 1), Some("audio/wav".into()));
    match SymphoniaDecoder::default().decode(&source) {
        Ok(clip) => assert!(clip.is_empty()),
        Err(err) => assert!(!matches!(err, DecodeError::EmptyInput)),
    }
}

#[test]
fn test_json_body_is_not_audio() {
    let source = AudioSource::memory(
        br#"{"detail":"quota exceeded"}"#.to_vec(),
        Some("application/json".into()),
    );
    let err = SymphoniaDecoder::default().decode(&source).unwrap_err();
    assert!(err.is_format_error());
}
