//! Error types for control system operations.

use thiserror::Error;

/// Result type for control system operations.
pub type ControlResult<T> = Result<T, ControlError>;

/// Errors that can occur in control system operations.
///
/// Configuration errors are returned from the failing `configure` call and
/// leave the previous calibration in place. Sample paths only fail when a
/// downstream sink reports an error.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ControlError {
    /// Bound pair with `max <= min`, or otherwise unusable range.
    #[error("Invalid range: [{min}, {max}]")]
    InvalidRange { min: i64, max: i64 },

    /// Gain that cannot be applied (zero fraction or oversized shift).
    #[error("Invalid gain: fraction={fraction} shift={shift}")]
    InvalidGain { fraction: i32, shift: u8 },

    /// Invalid argument provided to a control function.
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    /// A control system or variable with this name is already registered.
    #[error("Duplicate name: {name}")]
    DuplicateName { name: String },

    /// Error reported by an actuation sink or driver.
    #[error("Sink error: {what}")]
    Sink { what: String },
}
