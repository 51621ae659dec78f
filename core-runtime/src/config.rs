//! # Core Configuration Module
//!
//! Provides configuration management for the avatar core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct an
//! `AvatarConfig`. Every value has a default matching the reference
//! behaviour of the avatar (50 ms analysis windows, 60 Hz render ticks,
//! Brazilian Portuguese recognition), and `build()` validates the result
//! fail-fast so misconfiguration surfaces at startup rather than mid-utterance.
//!
//! ## Usage
//!
//! ```
//! use core_runtime::config::AvatarConfig;
//! use std::time::Duration;
//!
//! let config = AvatarConfig::builder()
//!     .window_ms(40)
//!     .tick_rate_hz(30)
//!     .listen_timeout(Duration::from_secs(8))
//!     .build()
//!     .expect("valid config");
//!
//! assert_eq!(config.window_ms, 40);
//! ```
//!
//! ## Error Handling
//!
//! ```should_panic
//! use core_runtime::config::AvatarConfig;
//!
//! // Thresholds must satisfy 0 <= mid < open <= 1
//! let config = AvatarConfig::builder()
//!     .thresholds(0.2, 0.5)
//!     .build()
//!     .expect("Should fail - inverted thresholds");
//! ```

use crate::error::{Error, Result};
use std::time::Duration;

/// Default analysis window in milliseconds.
pub const DEFAULT_WINDOW_MS: u32 = 50;
/// Normalized volume strictly above this is an open mouth.
pub const DEFAULT_OPEN_THRESHOLD: f64 = 0.3;
/// Normalized volume strictly above this (and not open) is a half-open mouth.
pub const DEFAULT_MID_THRESHOLD: f64 = 0.1;
/// Default render tick rate.
pub const DEFAULT_TICK_RATE_HZ: u32 = 60;

/// Core configuration for the avatar.
///
/// Use [`AvatarConfigBuilder`] to construct instances.
#[derive(Debug, Clone, PartialEq)]
pub struct AvatarConfig {
    /// Volume analysis window duration in milliseconds
    pub window_ms: u32,

    /// Normalized-volume threshold above which the mouth is open
    pub open_threshold: f64,

    /// Normalized-volume threshold above which the mouth is half open
    pub mid_threshold: f64,

    /// Target render tick rate of the presentation loop
    pub tick_rate_hz: u32,

    /// Language tag handed to the speech recognizer
    pub recognition_language: String,

    /// How long to wait for the user to start talking
    pub listen_timeout: Duration,

    /// Upper bound on a single user phrase
    pub phrase_time_limit: Duration,

    /// Capacity of the diagnostic event bus
    pub event_buffer_size: usize,
}

impl Default for AvatarConfig {
    fn default() -> Self {
        Self {
            window_ms: DEFAULT_WINDOW_MS,
            open_threshold: DEFAULT_OPEN_THRESHOLD,
            mid_threshold: DEFAULT_MID_THRESHOLD,
            tick_rate_hz: DEFAULT_TICK_RATE_HZ,
            recognition_language: "pt-BR".to_string(),
            listen_timeout: Duration::from_secs(5),
            phrase_time_limit: Duration::from_secs(10),
            event_buffer_size: 100,
        }
    }
}

impl AvatarConfig {
    /// Creates a new builder seeded with defaults.
    pub fn builder() -> AvatarConfigBuilder {
        AvatarConfigBuilder::default()
    }

    /// Duration of one render tick.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.tick_rate_hz.max(1) as f64)
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - Window duration is in `1..=1000` ms
    /// - `0 <= mid_threshold < open_threshold <= 1`
    /// - Tick rate is in `1..=240` Hz
    /// - Recognition language is not empty
    /// - Timeouts and event buffer size are non-zero
    pub fn validate(&self) -> Result<()> {
        if self.window_ms == 0 {
            return Err(Error::Config(
                "Analysis window must be greater than 0 ms".to_string(),
            ));
        }

        if self.window_ms > 1000 {
            return Err(Error::Config(
                "Analysis window exceeds maximum of 1000 ms".to_string(),
            ));
        }

        if !self.mid_threshold.is_finite() || !self.open_threshold.is_finite() {
            return Err(Error::Config("Thresholds must be finite".to_string()));
        }

        if !(0.0 <= self.mid_threshold
            && self.mid_threshold < self.open_threshold
            && self.open_threshold <= 1.0)
        {
            return Err(Error::Config(format!(
                "Thresholds must satisfy 0 <= mid < open <= 1 (mid = {}, open = {})",
                self.mid_threshold, self.open_threshold
            )));
        }

        if self.tick_rate_hz == 0 || self.tick_rate_hz > 240 {
            return Err(Error::Config(format!(
                "Tick rate must be between 1 and 240 Hz (got {})",
                self.tick_rate_hz
            )));
        }

        if self.recognition_language.trim().is_empty() {
            return Err(Error::Config(
                "Recognition language cannot be empty".to_string(),
            ));
        }

        if self.listen_timeout.is_zero() || self.phrase_time_limit.is_zero() {
            return Err(Error::Config(
                "Listen timeout and phrase time limit must be greater than 0".to_string(),
            ));
        }

        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "Event buffer size must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for [`AvatarConfig`].
#[derive(Debug, Default)]
pub struct AvatarConfigBuilder {
    window_ms: Option<u32>,
    thresholds: Option<(f64, f64)>,
    tick_rate_hz: Option<u32>,
    recognition_language: Option<String>,
    listen_timeout: Option<Duration>,
    phrase_time_limit: Option<Duration>,
    event_buffer_size: Option<usize>,
}

impl AvatarConfigBuilder {
    /// Sets the analysis window duration.
    pub fn window_ms(mut self, window_ms: u32) -> Self {
        self.window_ms = Some(window_ms);
        self
    }

    /// Sets the open and mid thresholds, in that order.
    pub fn thresholds(mut self, open: f64, mid: f64) -> Self {
        self.thresholds = Some((open, mid));
        self
    }

    /// Sets the render tick rate.
    pub fn tick_rate_hz(mut self, hz: u32) -> Self {
        self.tick_rate_hz = Some(hz);
        self
    }

    /// Sets the recognition language tag.
    pub fn recognition_language(mut self, language: impl Into<String>) -> Self {
        self.recognition_language = Some(language.into());
        self
    }

    /// Sets the listen timeout.
    pub fn listen_timeout(mut self, timeout: Duration) -> Self {
        self.listen_timeout = Some(timeout);
        self
    }

    /// Sets the phrase time limit.
    pub fn phrase_time_limit(mut self, limit: Duration) -> Self {
        self.phrase_time_limit = Some(limit);
        self
    }

    /// Sets the event bus capacity.
    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    /// Builds and validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] describing the first invalid value.
    pub fn build(self) -> Result<AvatarConfig> {
        let defaults = AvatarConfig::default();
        let (open_threshold, mid_threshold) = self
            .thresholds
            .unwrap_or((defaults.open_threshold, defaults.mid_threshold));

        let config = AvatarConfig {
            window_ms: self.window_ms.unwrap_or(defaults.window_ms),
            open_threshold,
            mid_threshold,
            tick_rate_hz: self.tick_rate_hz.unwrap_or(defaults.tick_rate_hz),
            recognition_language: self
                .recognition_language
                .unwrap_or(defaults.recognition_language),
            listen_timeout: self.listen_timeout.unwrap_or(defaults.listen_timeout),
            phrase_time_limit: self.phrase_time_limit.unwrap_or(defaults.phrase_time_limit),
            event_buffer_size: self.event_buffer_size.unwrap_or(defaults.event_buffer_size),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AvatarConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.window_ms, 50);
        assert_eq!(config.open_threshold, 0.3);
        assert_eq!(config.mid_threshold, 0.1);
        assert_eq!(config.tick_rate_hz, 60);
        assert_eq!(config.recognition_language, "pt-BR");
    }

    #[test]
    fn test_builder_overrides() {
        let config = AvatarConfig::builder()
            .window_ms(25)
            .thresholds(0.5, 0.2)
            .tick_rate_hz(30)
            .recognition_language("en-US")
            .listen_timeout(Duration::from_secs(3))
            .phrase_time_limit(Duration::from_secs(20))
            .event_buffer_size(16)
            .build()
            .unwrap();

        assert_eq!(config.window_ms, 25);
        assert_eq!(config.open_threshold, 0.5);
        assert_eq!(config.mid_threshold, 0.2);
        assert_eq!(config.tick_rate_hz, 30);
        assert_eq!(config.recognition_language, "en-US");
        assert_eq!(config.listen_timeout, Duration::from_secs(3));
        assert_eq!(config.phrase_time_limit, Duration::from_secs(20));
        assert_eq!(config.event_buffer_size, 16);
    }

    #[test]
    fn test_tick_interval() {
        let config = AvatarConfig::default();
        let interval = config.tick_interval();
        assert!((interval.as_secs_f64() - 1.0 / 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_validation_failures() {
        assert!(AvatarConfig::builder().window_ms(0).build().is_err());
        assert!(AvatarConfig::builder().window_ms(5000).build().is_err());
        assert!(AvatarConfig::builder().thresholds(0.1, 0.3).build().is_err());
        assert!(AvatarConfig::builder().thresholds(0.2, 0.5).build().is_err());
        assert!(AvatarConfig::builder().thresholds(0.3, 0.3).build().is_err());
        assert!(AvatarConfig::builder().thresholds(1.5, 0.1).build().is_err());
        assert!(AvatarConfig::builder().thresholds(0.3, -0.1).build().is_err());
        assert!(AvatarConfig::builder()
            .thresholds(f64::NAN, 0.1)
            .build()
            .is_err());
        assert!(AvatarConfig::builder().tick_rate_hz(0).build().is_err());
        assert!(AvatarConfig::builder()
            .recognition_language("  ")
            .build()
            .is_err());
        assert!(AvatarConfig::builder()
            .listen_timeout(Duration::ZERO)
            .build()
            .is_err());
        assert!(AvatarConfig::builder().event_buffer_size(0).build().is_err());
    }

    #[test]
    fn test_validation_error_message() {
        let err = AvatarConfig::builder()
            .thresholds(0.1, 0.3)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("0 <= mid < open <= 1"));
    }
}
