// src/error.rs

//! Error taxonomy shared by the display core and its collaborators.
//!
//! Collaborators (hardware info, composition manager, color manager,
//! per-display objects) report failures with the same `DisplayError` type,
//! which lets the core hand them back to callers unchanged.

use thiserror::Error;

/// Errors reported by every public display-core operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DisplayError {
    /// Invalid or missing argument, unknown display variant or unknown display id.
    #[error("invalid parameters")]
    Parameters,
    /// An allocation could not be satisfied.
    #[error("out of memory")]
    Memory,
    /// Unexpected internal or collaborator failure.
    #[error("undefined error: {0}")]
    Undefined(String),
    /// The requested operation is not supported by the hardware or collaborator.
    #[error("operation not supported")]
    NotSupported,
    /// Hardware composition resources are exhausted.
    #[error("insufficient hardware resources")]
    Resources,
    /// The hardware layer reported a failure.
    #[error("hardware error: {0}")]
    Hardware(String),
    /// A factory or accessor operation was issued before bootstrap completed.
    #[error("display core is not initialized")]
    NotInitialized,
}

impl DisplayError {
    /// Maps a raw status code returned across the extension ABI.
    ///
    /// Zero is success and never reaches this function; the remaining codes
    /// follow the vendor interface numbering.
    pub fn from_status(code: i32) -> Self {
        match code {
            1 => DisplayError::Undefined("extension reported an undefined failure".to_string()),
            2 => DisplayError::NotSupported,
            3 => DisplayError::Undefined("extension rejected the interface version".to_string()),
            4 => DisplayError::Parameters,
            5 => DisplayError::Memory,
            6 => DisplayError::Resources,
            7 => DisplayError::Hardware("extension reported a hardware failure".to_string()),
            other => DisplayError::Undefined(format!("extension status {}", other)),
        }
    }
}

/// Result alias used throughout the crate.
pub type DisplayResult<T> = Result<T, DisplayError>;
