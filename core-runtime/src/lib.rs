//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the avatar core:
//! - Logging and tracing infrastructure
//! - Configuration management
//! - Event bus for diagnostic consumers
//!
//! ## Overview
//!
//! This crate contains the ambient utilities the other crates depend on. It
//! establishes the logging conventions, the validated configuration object,
//! and the broadcast channel that reports what the avatar is doing.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
