//! Error types for the dosewarden evaluation pipeline.
//!
//! Rule evaluation itself never fails a call: module faults are caught by the
//! engine and recorded. These variants exist for the edges of the system
//! (configuration loading, input decoding) and for a module to report an
//! internal fault that the engine then absorbs.

use thiserror::Error;

/// The unified error type for the dosewarden crates.
#[derive(Debug, Error)]
pub enum DoseError {
    /// A rule module hit an unexpected internal condition.
    ///
    /// The engine treats this as zero contribution from the module for the
    /// current cycle; it never aborts the evaluation.
    #[error("rule module '{module}' faulted: {reason}")]
    ModuleFault { module: String, reason: String },

    /// A required configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },

    /// A patient context or order supplied at the boundary could not be decoded.
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },
}

/// Convenience alias used throughout the dosewarden crates.
pub type DoseResult<T> = Result<T, DoseError>;
