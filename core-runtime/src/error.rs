use thiserror::Error;

/// Errors raised while setting up the avatar runtime.
#[derive(Error, Debug)]
pub enum Error {
    /// A configuration value is out of range.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The tracing subscriber could not be installed.
    #[error("Logging error: {0}")]
    Logging(String),

    /// The host did not provide something the core needs.
    #[error("Capability missing: {capability} - {message}")]
    CapabilityMissing { capability: String, message: String },
}

pub type Result<T> = std::result::Result<T, Error>;
