// cs-core/src/units.rs

//! Conversions between engineering-unit integers and Q31 fractions.
//!
//! `1.0` in the chosen unit maps to `i32::MAX`. The `_shifted` variants divide
//! the input by `2^shift` first, so values beyond `±1.0` can be expressed
//! together with a compensating [`ScaleFactor`](crate::ScaleFactor) shift.

use crate::{CoreError, CoreResult, Q31};

pub const NANO_PER_UNIT: i64 = 1_000_000_000;
pub const MICRO_PER_UNIT: i64 = 1_000_000;
pub const MILLI_PER_UNIT: i64 = 1_000;

impl Q31 {
    #[inline]
    pub fn from_nano(nano: i64) -> CoreResult<Self> {
        Self::from_nano_shifted(nano, 0)
    }

    #[inline]
    pub fn from_micro(micro: i64) -> CoreResult<Self> {
        Self::from_micro_shifted(micro, 0)
    }

    #[inline]
    pub fn from_milli(milli: i64) -> CoreResult<Self> {
        Self::from_milli_shifted(milli, 0)
    }

    pub fn from_nano_shifted(nano: i64, shift: u8) -> CoreResult<Self> {
        let shifted = nano >> shift.min(63);
        if shifted.unsigned_abs() > NANO_PER_UNIT as u64 {
            return Err(CoreError::OutOfRange {
                what: "nano",
                value: nano,
            });
        }
        Ok(Self::from_bits(
            ((shifted * i64::from(i32::MAX)) / NANO_PER_UNIT) as i32,
        ))
    }

    pub fn from_micro_shifted(micro: i64, shift: u8) -> CoreResult<Self> {
        let nano = micro.checked_mul(1_000).ok_or(CoreError::OutOfRange {
            what: "micro",
            value: micro,
        })?;
        Self::from_nano_shifted(nano, shift)
    }

    pub fn from_milli_shifted(milli: i64, shift: u8) -> CoreResult<Self> {
        let micro = milli.checked_mul(1_000).ok_or(CoreError::OutOfRange {
            what: "milli",
            value: milli,
        })?;
        Self::from_micro_shifted(micro, shift)
    }

    /// Value in millionths of full scale, truncated toward zero.
    #[inline]
    pub fn to_micro(self) -> i64 {
        (i64::from(self.to_bits()) * MICRO_PER_UNIT) / (1_i64 << 31)
    }
}
