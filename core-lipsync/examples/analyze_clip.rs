//! # Clip Analysis Example
//!
//! Decodes an audio file and prints the volume-derived mouth timeline.
//!
//! Run with:
//! ```bash
//! cargo run --example analyze_clip --package core-lipsync -- reply.mp3
//!
//! # Longer windows, debug logs
//! cargo run --example analyze_clip --package core-lipsync -- reply.mp3 80 debug
//! ```

use bridge_traits::{AudioSource, LogLevel};
use core_lipsync::{EnvelopeAnalyzer, LipSyncConfig, MouthShape};
use core_playback::{SampleDecoder, SymphoniaDecoder};
use core_runtime::logging::{init_logging, strip_path, LogFormat, LoggingConfig};
use std::env;
use std::process::ExitCode;
use tracing::{error, info};

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();

    let Some(path) = args.get(1) else {
        eprintln!("usage: analyze_clip <audio file> [window ms] [trace|debug|info]");
        return ExitCode::FAILURE;
    };

    let level = match args.get(3).map(String::as_str) {
        Some("trace") => LogLevel::Trace,
        Some("debug") => LogLevel::Debug,
        _ => LogLevel::Info,
    };

    let logging = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(level);
    if let Err(err) = init_logging(logging) {
        eprintln!("Failed to initialize logging: {err}");
        return ExitCode::FAILURE;
    }

    let mut config = LipSyncConfig::default();
    if let Some(window_ms) = args.get(2).and_then(|arg| arg.parse().ok()) {
        config.window_ms = window_ms;
    }
    if let Err(err) = config.validate() {
        error!("Invalid configuration: {}", err);
        return ExitCode::FAILURE;
    }

    let clip = match SymphoniaDecoder::default().decode(&AudioSource::local(path)) {
        Ok(clip) => clip,
        Err(err) => {
            error!(file = strip_path(path), "Decode failed: {}", err);
            return ExitCode::FAILURE;
        }
    };

    info!(
        file = strip_path(path),
        codec = ?clip.format.codec,
        sample_rate = clip.sample_rate,
        duration_ms = clip.duration().as_millis() as u64,
        "Clip decoded"
    );

    let timeline = EnvelopeAnalyzer::new(config).analyze_clip(&clip);

    println!("{:>10}  shape", "offset ms");
    for event in timeline.iter() {
        let bar = match event.mouth_shape {
            MouthShape::Closed => "",
            MouthShape::Mid => "==",
            MouthShape::Open => "=====",
        };
        println!(
            "{:>10.1}  {:<6} {}",
            event.time_offset_ms,
            event.mouth_shape.as_str(),
            bar
        );
    }

    let open = timeline
        .iter()
        .filter(|e| e.mouth_shape == MouthShape::Open)
        .count();
    info!(events = timeline.len(), open, "Timeline ready");

    ExitCode::SUCCESS
}
