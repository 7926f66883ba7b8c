//! Single-input single-output transfer blocks in the Q31 domain.
//!
//! Provides:
//! - **Linear**: normalizes a `[min, max]` Q31 window onto the full Q31 span
//! - **Integral**: discrete-time accumulator with a sample-interval scale
//! - **Differential**: first difference against the previous input
//!
//! Blocks are driven through the [`Transfer`] trait and can be chained with
//! [`TransferChain`]. None of them allocate or fail while transferring; errors
//! only come out of `configure`.

use cs_core::{Q31, ScaleFactor};
use tracing::{debug, warn};

use crate::error::{ControlError, ControlResult};

/// Largest sample-interval shift accepted by [`Integral`].
pub const INTEGRAL_MAX_SHIFT: u8 = 30;

/// Transfer contract shared by every block.
pub trait Transfer {
    /// Feed one input sample and produce one output sample.
    fn transfer(&mut self, input: Q31) -> ControlResult<Q31>;
}

/// Linear normalization block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Linear {
    center: Q31,
    scale: ScaleFactor,
}

impl Linear {
    pub fn new(min: Q31, max: Q31) -> ControlResult<Self> {
        let mut linear = Self::default();
        linear.configure(min, max)?;
        Ok(linear)
    }

    /// Calibrate so that `min` maps to ~`Q31::MIN` and `max` to ~`Q31::MAX`.
    ///
    /// # Errors
    ///
    /// [`ControlError::InvalidRange`] if `max` is zero or `max <= min`.
    pub fn configure(&mut self, min: Q31, max: Q31) -> ControlResult<()> {
        if max == Q31::ZERO || max <= min {
            let err = ControlError::InvalidRange {
                min: i64::from(min.to_bits()),
                max: i64::from(max.to_bits()),
            };
            warn!(%err, "rejected linear calibration");
            return Err(err);
        }

        let range = (i64::from(max.to_bits()) - i64::from(min.to_bits()) + 1) >> 1;
        self.scale = ScaleFactor::reciprocal(range);
        self.center = Q31::from_bits((i64::from(max.to_bits()) - range) as i32);
        debug!(center = self.center.to_bits(), scale = ?self.scale, "linear calibrated");
        Ok(())
    }
}

impl Transfer for Linear {
    fn transfer(&mut self, input: Q31) -> ControlResult<Q31> {
        Ok(input.saturating_sub(self.center).scale(self.scale))
    }
}

/// Integrating block.
///
/// Each input is scaled by the sample interval before being added to the
/// accumulator; the accumulator is returned and persists until the next
/// `configure`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Integral {
    interval: ScaleFactor,
    accumulated: Q31,
}

impl Integral {
    pub fn new(fraction: Q31, shift: u8) -> ControlResult<Self> {
        let mut integral = Self::default();
        integral.configure(fraction, shift)?;
        Ok(integral)
    }

    /// Set the sample interval `fraction * 2^shift` and clear the accumulator.
    ///
    /// # Errors
    ///
    /// [`ControlError::InvalidGain`] if `fraction` is zero or `shift > 30`.
    pub fn configure(&mut self, fraction: Q31, shift: u8) -> ControlResult<()> {
        if fraction == Q31::ZERO || shift > INTEGRAL_MAX_SHIFT {
            let err = ControlError::InvalidGain {
                fraction: fraction.to_bits(),
                shift,
            };
            warn!(%err, "rejected integral configuration");
            return Err(err);
        }

        self.interval = ScaleFactor::new(fraction, shift as i8);
        self.accumulated = Q31::ZERO;
        debug!(fraction = fraction.to_bits(), shift, "integral configured");
        Ok(())
    }

    pub fn accumulated(&self) -> Q31 {
        self.accumulated
    }
}

impl Transfer for Integral {
    fn transfer(&mut self, input: Q31) -> ControlResult<Q31> {
        self.accumulated = self.accumulated.saturating_add(input.scale(self.interval));
        Ok(self.accumulated)
    }
}

/// Differencing block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Differential {
    last_input: Q31,
}

impl Differential {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the previous input.
    pub fn configure(&mut self) -> ControlResult<()> {
        self.last_input = Q31::ZERO;
        Ok(())
    }
}

impl Transfer for Differential {
    fn transfer(&mut self, input: Q31) -> ControlResult<Q31> {
        let output = input.saturating_sub(self.last_input);
        self.last_input = input;
        Ok(output)
    }
}

/// Closed set of transfer blocks, for configuration-driven construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferBlock {
    Linear(Linear),
    Integral(Integral),
    Differential(Differential),
}

impl Transfer for TransferBlock {
    fn transfer(&mut self, input: Q31) -> ControlResult<Q31> {
        match self {
            Self::Linear(block) => block.transfer(input),
            Self::Integral(block) => block.transfer(input),
            Self::Differential(block) => block.transfer(input),
        }
    }
}

impl From<Linear> for TransferBlock {
    fn from(block: Linear) -> Self {
        Self::Linear(block)
    }
}

impl From<Integral> for TransferBlock {
    fn from(block: Integral) -> Self {
        Self::Integral(block)
    }
}

impl From<Differential> for TransferBlock {
    fn from(block: Differential) -> Self {
        Self::Differential(block)
    }
}

/// Ordered series of transfer blocks; each output feeds the next input.
///
/// An empty chain passes its input through unchanged.
#[derive(Default)]
pub struct TransferChain {
    blocks: Vec<Box<dyn Transfer + Send>>,
}

impl TransferChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a block to the end of the chain.
    pub fn push(&mut self, block: impl Transfer + Send + 'static) {
        self.blocks.push(Box::new(block));
    }

    /// Builder-style [`push`](Self::push).
    pub fn then(mut self, block: impl Transfer + Send + 'static) -> Self {
        self.push(block);
        self
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

impl Transfer for TransferChain {
    fn transfer(&mut self, input: Q31) -> ControlResult<Q31> {
        self.blocks
            .iter_mut()
            .try_fold(input, |signal, block| block.transfer(signal))
    }
}

impl std::fmt::Debug for TransferChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransferChain")
            .field("blocks", &self.blocks.len())
            .finish()
    }
}
