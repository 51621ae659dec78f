use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Bridge capability not available: {0}")]
    NotAvailable(String),

    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),

    /// The recognizer heard audio but could not turn it into text.
    #[error("Speech not understood")]
    NotUnderstood,

    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    /// Returns `true` when the failure means "the user said nothing usable",
    /// as opposed to a broken device or service.
    pub fn is_no_speech(&self) -> bool {
        matches!(self, BridgeError::NotUnderstood | BridgeError::Timeout(_))
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
