//! # Lip Sync Configuration
//!
//! Window length and classification thresholds for the volume envelope
//! analyzer. Thresholds are fixed per configuration, never adapted per clip.

use core_runtime::config::{
    AvatarConfig, DEFAULT_MID_THRESHOLD, DEFAULT_OPEN_THRESHOLD, DEFAULT_WINDOW_MS,
};
use serde::{Deserialize, Serialize};

/// Volume analysis configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LipSyncConfig {
    /// Analysis window duration in milliseconds.
    ///
    /// Default: 50 ms.
    #[serde(default = "default_window_ms")]
    pub window_ms: u32,

    /// Normalized volume strictly above this is [`crate::MouthShape::Open`].
    ///
    /// Default: 0.3.
    #[serde(default = "default_open_threshold")]
    pub open_threshold: f64,

    /// Normalized volume strictly above this (and not open) is
    /// [`crate::MouthShape::Mid`].
    ///
    /// Default: 0.1.
    #[serde(default = "default_mid_threshold")]
    pub mid_threshold: f64,
}

impl Default for LipSyncConfig {
    fn default() -> Self {
        Self {
            window_ms: default_window_ms(),
            open_threshold: default_open_threshold(),
            mid_threshold: default_mid_threshold(),
        }
    }
}

impl LipSyncConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.window_ms == 0 {
            return Err("window_ms must be > 0".to_string());
        }

        if !(0.0 <= self.mid_threshold
            && self.mid_threshold < self.open_threshold
            && self.open_threshold <= 1.0)
        {
            return Err(format!(
                "thresholds must satisfy 0 <= mid < open <= 1 (mid = {}, open = {})",
                self.mid_threshold, self.open_threshold
            ));
        }

        Ok(())
    }

    /// Window length in samples: `round(sample_rate * window_ms / 1000)`.
    pub fn window_len(&self, sample_rate: u32) -> usize {
        ((sample_rate as u64 * self.window_ms as u64 + 500) / 1000) as usize
    }
}

impl From<&AvatarConfig> for LipSyncConfig {
    fn from(config: &AvatarConfig) -> Self {
        Self {
            window_ms: config.window_ms,
            open_threshold: config.open_threshold,
            mid_threshold: config.mid_threshold,
        }
    }
}

fn default_window_ms() -> u32 {
    DEFAULT_WINDOW_MS
}

fn default_open_threshold() -> f64 {
    DEFAULT_OPEN_THRESHOLD
}

fn default_mid_threshold() -> f64 {
    DEFAULT_MID_THRESHOLD
}
