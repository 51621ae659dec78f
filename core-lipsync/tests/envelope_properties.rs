//! Property checks for the volume envelope analyzer.

use core_lipsync::{EnvelopeAnalyzer, LipSyncConfig, MouthShape};

/// Small deterministic generator so the checks cover varied signals.
struct Lcg(u64);

impl Lcg {
    fn next_sample(&mut self) -> i16 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        (self.0 >> 48) as u16 as i16
    }

    fn samples(&mut self, len: usize) -> Vec<i16> {
        (0..len).map(|_| self.next_sample()).collect()
    }
}

#[test]
fn test_event_count_and_offsets() {
    let analyzer = EnvelopeAnalyzer::default();
    let mut rng = Lcg(7);

    for (sample_rate, len) in [
        (8000u32, 1usize),
        (8000, 399),
        (8000, 400),
        (8000, 401),
        (16000, 12_345),
        (22050, 22050),
        (44100, 100_000),
    ] {
        let samples = rng.samples(len);
        let window_len = LipSyncConfig::default().window_len(sample_rate);
        let timeline = analyzer.analyze(&samples, sample_rate);

        assert_eq!(timeline.len(), len.div_ceil(window_len), "rate {sample_rate}, len {len}");
        for (index, event) in timeline.iter().enumerate() {
            assert_eq!(event.time_offset_ms, index as f64 * 50.0);
        }
    }
}

#[test]
fn test_short_final_window_is_kept() {
    // 8 kHz, 50 ms windows of 400 samples; the last window has 1 loud sample
    let mut samples = vec![0i16; 400];
    samples.push(20000);

    let timeline = EnvelopeAnalyzer::default().analyze(&samples, 8000);

    assert_eq!(timeline.len(), 2);
    assert_eq!(timeline.events()[0].mouth_shape, MouthShape::Closed);
    assert_eq!(timeline.events()[1].mouth_shape, MouthShape::Open);
}

#[test]
fn test_silence_is_all_closed() {
    let analyzer = EnvelopeAnalyzer::default();
    for len in [1usize, 7, 800, 4321] {
        let timeline = analyzer.analyze(&vec![0i16; len], 16000);
        assert!(!timeline.is_empty());
        assert!(timeline.iter().all(|e| e.mouth_shape == MouthShape::Closed));
    }
}

#[test]
fn test_single_full_scale_window() {
    let window_len = 800;
    let mut samples = vec![0i16; window_len * 6];
    for (i, sample) in samples[window_len * 3..window_len * 4].iter_mut().enumerate() {
        *sample = if i % 2 == 0 { i16::MAX } else { i16::MIN };
    }

    let timeline = EnvelopeAnalyzer::default().analyze(&samples, 16000);
    let shapes: Vec<_> = timeline.iter().map(|e| e.mouth_shape).collect();

    assert_eq!(
        shapes,
        vec![
            MouthShape::Closed,
            MouthShape::Closed,
            MouthShape::Closed,
            MouthShape::Open,
            MouthShape::Closed,
            MouthShape::Closed,
        ]
    );
}

#[test]
fn test_normalization_is_relative_to_clip() {
    // The same quiet signal reads as open when it is the loudest thing in
    // the clip
    let quiet = vec![300i16; 800];
    let timeline = EnvelopeAnalyzer::default().analyze(&quiet, 16000);
    assert_eq!(timeline.events()[0].mouth_shape, MouthShape::Open);
}

#[test]
fn test_silent_clip_round_trip() {
    // 500 ms at 8 kHz with 50 ms windows
    let timeline = EnvelopeAnalyzer::default().analyze(&vec![0i16; 4000], 8000);

    assert_eq!(timeline.len(), 10);
    assert!(timeline.iter().all(|e| e.mouth_shape == MouthShape::Closed));

    let mut t = 0.0;
    while t < 500.0 {
        assert_eq!(timeline.resolve(t), MouthShape::Closed);
        t += 7.5;
    }
}

#[test]
fn test_custom_window_and_thresholds() {
    let analyzer = EnvelopeAnalyzer::new(LipSyncConfig {
        window_ms: 100,
        open_threshold: 0.8,
        mid_threshold: 0.4,
    });

    let mut samples = vec![10000i16; 100];
    samples.extend(vec![5000i16; 100]);
    samples.extend(vec![3000i16; 100]);

    let timeline = analyzer.analyze(&samples, 1000);
    let offsets: Vec<_> = timeline.iter().map(|e| e.time_offset_ms).collect();
    let shapes: Vec<_> = timeline.iter().map(|e| e.mouth_shape).collect();

    assert_eq!(offsets, vec![0.0, 100.0, 200.0]);
    assert_eq!(shapes, vec![MouthShape::Open, MouthShape::Mid, MouthShape::Closed]);
}
