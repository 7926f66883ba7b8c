//! cs-core: fixed-point foundation for the control engine.
//!
//! Contains:
//! - fixed (Q31 values, scale factors, saturating arithmetic)
//! - units (engineering value <-> Q31 conversions)
//! - error (shared error types)

pub mod error;
pub mod fixed;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use error::{CoreError, CoreResult};
pub use self::fixed::{Q31, ScaleFactor};
