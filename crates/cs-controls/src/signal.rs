//! Range converters between wide physical domains and the Q31 domain.
//!
//! - [`Insignal`] maps a calibrated `[min, max]` window of `i64` samples onto
//!   `[i32::MIN, i32::MAX]`, saturating outside the window.
//! - [`Osignal`] maps the Q31 domain back onto a calibrated `[min, max]`
//!   window, with full `i64` precision on the output side.
//!
//! Both are calibrated once by `configure` and are read-only while sampling.

use cs_core::{Q31, ScaleFactor};
use tracing::{debug, warn};

use crate::error::{ControlError, ControlResult};

const Q31_SPAN: i64 = i32::MAX as i64;

/// Calibration derived from a `(min, max)` bound pair.
///
/// Samples are shifted right by `pre_shift`, offset by `center` and then
/// multiplied by `scale`. `pre_shift` is non-zero only when the half-range
/// does not fit in 31 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RangeMap {
    pub center: i64,
    pub scale: ScaleFactor,
    pub pre_shift: u8,
}

impl RangeMap {
    /// Derive the calibration for `[min, max]`.
    ///
    /// # Errors
    ///
    /// Returns [`ControlError::InvalidRange`] if `max <= min`.
    pub fn calibrate(min: i64, max: i64) -> ControlResult<Self> {
        if max <= min {
            return Err(ControlError::InvalidRange { min, max });
        }

        let mut range = max / 2 - min / 2;
        let mut center = min.saturating_add(1).saturating_add(range);
        let mut pre_shift = 0u8;
        while range > Q31_SPAN {
            range >>= 1;
            center >>= 1;
            pre_shift += 1;
        }

        Ok(Self {
            center,
            scale: ScaleFactor::reciprocal(range.max(1)),
            pre_shift,
        })
    }
}

/// Wide-domain input converter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Insignal {
    map: RangeMap,
}

impl Insignal {
    /// Create a converter calibrated for `[min, max]`.
    pub fn new(min: i64, max: i64) -> ControlResult<Self> {
        let mut insignal = Self::default();
        insignal.configure(min, max)?;
        Ok(insignal)
    }

    /// Recalibrate for `[min, max]`. On error the previous calibration is kept.
    pub fn configure(&mut self, min: i64, max: i64) -> ControlResult<()> {
        let map = RangeMap::calibrate(min, max).inspect_err(|err| {
            warn!(min, max, %err, "rejected insignal calibration");
        })?;
        debug!(min, max, ?map, "insignal calibrated");
        self.map = map;
        Ok(())
    }

    pub fn range_map(&self) -> &RangeMap {
        &self.map
    }

    /// Convert one raw sample.
    pub fn sample(&self, raw: i64) -> Q31 {
        let offset = i128::from(raw >> self.map.pre_shift) - i128::from(self.map.center);
        if offset > i128::from(i32::MAX) {
            return Q31::MAX;
        }
        if offset < i128::from(i32::MIN) {
            return Q31::MIN;
        }
        Q31::from_bits(offset as i32).scale(self.map.scale)
    }
}

/// Wide-domain output converter.
///
/// The half-range is stored as `fraction * 2^shift`; shifting happens after
/// the Q31 multiply so the output keeps all 64 bits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Osignal {
    fraction: Q31,
    center: i64,
    shift: u8,
}

impl Osignal {
    /// Create a converter calibrated for `[min, max]`.
    pub fn new(min: i64, max: i64) -> ControlResult<Self> {
        let mut osignal = Self::default();
        osignal.configure(min, max)?;
        Ok(osignal)
    }

    /// Recalibrate for `[min, max]`. On error the previous calibration is kept.
    pub fn configure(&mut self, min: i64, max: i64) -> ControlResult<()> {
        if max <= min {
            let err = ControlError::InvalidRange { min, max };
            warn!(min, max, %err, "rejected osignal calibration");
            return Err(err);
        }

        let mut range = max / 2 - min / 2;
        let center = min.saturating_add(1).saturating_add(range);
        let mut shift = 0u8;
        while range > Q31_SPAN {
            range >>= 1;
            shift += 1;
        }

        self.fraction = Q31::from_bits(range as i32);
        self.center = center;
        self.shift = shift;
        debug!(min, max, center, shift, "osignal calibrated");
        Ok(())
    }

    pub fn center(&self) -> i64 {
        self.center
    }

    /// Convert one normalized sample to the output domain.
    pub fn sample(&self, normalized: Q31) -> i64 {
        let scaled = i64::from(normalized.mul_fract(self.fraction).to_bits()) << self.shift;
        scaled.saturating_add(self.center)
    }
}
