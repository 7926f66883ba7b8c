//! Closed-loop control primitives on Q31 fixed-point signals.
//!
//! This crate provides the blocks a control loop is assembled from. Every
//! signal between blocks is a normalized [`Q31`](cs_core::Q31) value; the
//! converters at the edges map to and from wide physical domains.
//!
//! # Architecture
//!
//! - [`Insignal`] converts raw measurements into the Q31 domain
//! - [`Transfer`] blocks (linear, integral, differential) filter signals
//! - [`Compensator`]s such as [`Pid`] turn setpoint and process variable into
//!   an actuation sample
//! - [`OutputSignal`]s and [`Osignal`] carry the sample back out
//! - [`ControlSystemRegistry`] and [`VariableRegistry`] expose named, lock-free
//!   published values to monitoring code
//!
//! Nothing here spawns threads or sleeps. Scheduling the control tick is the
//! caller's job.

pub mod controller;
pub mod error;
pub mod output;
pub mod signal;
pub mod system;
pub mod transfer;
pub mod variable;

pub use controller::{Compensator, Pid, PidGains};
pub use error::{ControlError, ControlResult};
pub use output::{MappedOutput, OutputSignal, PwmCalibration, PwmChannel, PwmOutput};
pub use signal::{Insignal, Osignal, RangeMap};
pub use system::{
    ControlSystem, ControlSystemRegistry, PublishedState, SystemHandle, SystemSnapshot,
};
pub use transfer::{
    Differential, INTEGRAL_MAX_SHIFT, Integral, Linear, Transfer, TransferBlock, TransferChain,
};
pub use variable::{Variable, VariableRegistry, VariableSnapshot};
