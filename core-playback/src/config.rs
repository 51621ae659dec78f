//! # Decoder Configuration
//!
//! Limits applied while decoding a clip in one shot.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Decoder configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecoderConfig {
    /// Number of consecutive bad packets tolerated before giving up.
    ///
    /// Default: 10.
    #[serde(default = "default_max_consecutive_errors")]
    pub max_consecutive_errors: usize,

    /// Decoding stops once this much audio has been produced; the rest of
    /// the clip is ignored.
    ///
    /// Default: 10 minutes.
    #[serde(default = "default_max_duration")]
    pub max_duration: Duration,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_consecutive_errors: default_max_consecutive_errors(),
            max_duration: default_max_duration(),
        }
    }
}

impl DecoderConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_consecutive_errors == 0 {
            return Err("max_consecutive_errors must be > 0".to_string());
        }

        if self.max_duration.is_zero() {
            return Err("max_duration must be > 0".to_string());
        }

        Ok(())
    }

    /// Maximum number of mono samples to keep at `sample_rate`.
    pub fn max_samples(&self, sample_rate: u32) -> usize {
        (self.max_duration.as_secs_f64() * sample_rate as f64).ceil() as usize
    }
}

fn default_max_consecutive_errors() -> usize {
    10
}

fn default_max_duration() -> Duration {
    Duration::from_secs(600)
}
