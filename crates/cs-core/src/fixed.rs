//! Q31 fixed-point values and scale factors.
//!
//! A [`Q31`] wraps a [`fixed`] `I1F31`: a signed 32-bit fraction in `[-1, ~1)`.
//! Every operation that can leave that range saturates instead of wrapping.
//! [`Q31::scale`] works on the raw bits so gains can carry shifts beyond what
//! the fraction format can hold.

use core::fmt;

use fixed::types::I1F31;

/// Signed 32-bit fixed-point fraction.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Q31(I1F31);

impl Q31 {
    pub const MIN: Q31 = Q31(I1F31::MIN);
    pub const MAX: Q31 = Q31(I1F31::MAX);
    pub const ZERO: Q31 = Q31::from_bits(0);

    pub const fn from_bits(bits: i32) -> Self {
        Self(I1F31::from_bits(bits))
    }

    pub const fn to_bits(self) -> i32 {
        self.0.to_bits()
    }

    pub const fn from_fixed(value: I1F31) -> Self {
        Self(value)
    }

    pub const fn to_fixed(self) -> I1F31 {
        self.0
    }

    /// Clamp a wide raw value into Q31 range.
    pub fn saturate(bits: i64) -> Self {
        Self::from_bits(bits.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32)
    }

    fn saturate_wide(bits: i128) -> Self {
        Self::from_bits(bits.clamp(i128::from(i32::MIN), i128::from(i32::MAX)) as i32)
    }

    pub fn saturating_add(self, rhs: Q31) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }

    pub fn saturating_sub(self, rhs: Q31) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }

    /// Fractional product; `-1 * -1` saturates to [`Q31::MAX`].
    pub fn mul_fract(self, rhs: Q31) -> Self {
        Self(self.0.saturating_mul(rhs.0))
    }

    /// Multiply by `factor.fraction * 2^factor.shift`.
    ///
    /// The product is kept at 128 bits through the shift, so only the final
    /// narrowing saturates. For a fixed positive fraction the result is
    /// monotonic in `self`.
    pub fn scale(self, factor: ScaleFactor) -> Self {
        let product = i128::from(self.to_bits()) * i128::from(factor.fraction.to_bits());
        if product == 0 {
            return Self::ZERO;
        }

        let shift = i32::from(factor.shift) - 31;
        let shifted = if shift >= 0 {
            // |product| <= 2^62, anything past 2^64 saturates regardless
            if shift > 64 {
                return if product > 0 { Self::MAX } else { Self::MIN };
            }
            product << shift
        } else {
            product >> (-shift).min(127)
        };

        Self::saturate_wide(shifted)
    }
}

impl From<I1F31> for Q31 {
    fn from(value: I1F31) -> Self {
        Self(value)
    }
}

impl From<Q31> for I1F31 {
    fn from(value: Q31) -> Self {
        value.0
    }
}

impl fmt::Debug for Q31 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Q31({:#010x})", self.to_bits())
    }
}

impl fmt::Display for Q31 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let micro = self.to_micro();
        let sign = if micro < 0 { "-" } else { "" };
        let abs = micro.unsigned_abs();
        write!(f, "{sign}{}.{:06}", abs / 1_000_000, abs % 1_000_000)
    }
}

/// Multiplier `fraction * 2^shift`, for gains that need more dynamic range
/// than a bare Q31 fraction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScaleFactor {
    pub fraction: Q31,
    pub shift: i8,
}

impl ScaleFactor {
    pub const ZERO: ScaleFactor = ScaleFactor::new(Q31::ZERO, 0);
    /// Closest representable factor to 1.0.
    pub const UNITY: ScaleFactor = ScaleFactor::new(Q31::MAX, 0);

    pub const fn new(fraction: Q31, shift: i8) -> Self {
        Self { fraction, shift }
    }

    pub fn is_zero(&self) -> bool {
        self.fraction == Q31::ZERO
    }

    /// Factor approximating `i32::MAX / range`, which stretches a half-range
    /// of `range` counts onto the full Q31 span.
    ///
    /// `range` is clamped to `1..=i32::MAX`; callers pre-shift wider ranges.
    pub fn reciprocal(range: i64) -> Self {
        let range = range.clamp(1, i64::from(i32::MAX));
        let mut fraction = (i64::from(i32::MAX) << 32) / range;
        let mut shift: i8 = -1;
        while fraction > i64::from(i32::MAX) {
            fraction >>= 1;
            shift += 1;
        }
        Self {
            fraction: Q31::from_bits(fraction as i32),
            shift,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn unity_scale_is_near_identity() {
        for raw in [i32::MIN, -1_000_000, -1, 0, 1, 1_000_000, i32::MAX] {
            let out = Q31::from_bits(raw).scale(ScaleFactor::UNITY);
            assert!((i64::from(out.to_bits()) - i64::from(raw)).abs() <= 1, "{raw} -> {out:?}");
        }
    }

    #[test]
    fn scale_shift_amplifies_and_attenuates() {
        let half = ScaleFactor::new(Q31::from_bits(1 << 30), 0);
        assert_eq!(Q31::from_bits(1000).scale(half), Q31::from_bits(500));

        let double = ScaleFactor::new(Q31::from_bits(1 << 30), 2);
        assert_eq!(Q31::from_bits(1000).scale(double), Q31::from_bits(2000));

        let quarter = ScaleFactor::new(Q31::from_bits(1 << 30), -1);
        assert_eq!(Q31::from_bits(1000).scale(quarter), Q31::from_bits(250));
    }

    #[test]
    fn scale_saturates() {
        let big = ScaleFactor::new(Q31::MAX, 8);
        assert_eq!(Q31::from_bits(i32::MAX / 4).scale(big), Q31::MAX);
        assert_eq!(Q31::from_bits(i32::MIN / 4).scale(big), Q31::MIN);

        let huge = ScaleFactor::new(Q31::MAX, i8::MAX);
        assert_eq!(Q31::from_bits(1).scale(huge), Q31::MAX);
        assert_eq!(Q31::from_bits(-1).scale(huge), Q31::MIN);
        assert_eq!(Q31::ZERO.scale(huge), Q31::ZERO);

        let tiny = ScaleFactor::new(Q31::MAX, i8::MIN);
        assert_eq!(Q31::MAX.scale(tiny), Q31::ZERO);
        assert_eq!(Q31::MIN.scale(tiny), Q31::from_bits(-1));
    }

    #[test]
    fn saturating_add_sub() {
        assert_eq!(Q31::MAX.saturating_add(Q31::from_bits(1)), Q31::MAX);
        assert_eq!(Q31::MIN.saturating_sub(Q31::from_bits(1)), Q31::MIN);
        assert_eq!(Q31::from_bits(5).saturating_sub(Q31::from_bits(7)), Q31::from_bits(-2));
    }

    #[test]
    fn mul_matches_fraction_product() {
        let half = Q31::from_bits(1 << 30);
        assert_eq!(half.mul_fract(half), Q31::from_bits(1 << 29));
        assert_eq!(Q31::MIN.mul_fract(Q31::MIN), Q31::MAX);
        assert_eq!(Q31::MIN.mul_fract(Q31::from_bits(500)), Q31::from_bits(-500));
    }

    #[test]
    fn bits_and_fixed_views_agree() {
        let half = Q31::from_fixed(I1F31::from_num(0.5));
        assert_eq!(half.to_bits(), 1 << 30);
        assert_eq!(Q31::from_bits(-(1 << 30)).to_fixed(), I1F31::from_num(-0.5));
        assert_eq!(Q31::MIN.to_fixed(), I1F31::MIN);
        assert_eq!(I1F31::from(Q31::MAX), I1F31::MAX);
    }

    #[test]
    fn reciprocal_of_full_range_is_one() {
        let factor = ScaleFactor::reciprocal(i64::from(i32::MAX));
        assert_eq!(factor, ScaleFactor::new(Q31::from_bits(1 << 30), 1));
        assert_eq!(Q31::from_bits(12345).scale(factor), Q31::from_bits(12345));
    }

    #[test]
    fn reciprocal_of_small_range_amplifies() {
        let factor = ScaleFactor::reciprocal(5001);
        let out = Q31::from_bits(5001).scale(factor);
        assert!(i64::from(i32::MAX) - i64::from(out.to_bits()) < 1 << 20);
    }

    #[test]
    fn display_uses_six_decimals() {
        assert_eq!(Q31::from_bits(1 << 30).to_string(), "0.500000");
        assert_eq!(Q31::from_bits(-(1 << 30)).to_string(), "-0.500000");
        assert_eq!(Q31::MIN.to_string(), "-1.000000");
    }

    proptest! {
        #[test]
        fn scale_is_monotonic(a in any::<i32>(), b in any::<i32>(), fraction in 1..=i32::MAX, shift in -40i8..40) {
            let factor = ScaleFactor::new(Q31::from_bits(fraction), shift);
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(Q31::from_bits(lo).scale(factor) <= Q31::from_bits(hi).scale(factor));
        }

        #[test]
        fn reciprocal_fraction_stays_positive(range in 1..=i64::from(i32::MAX)) {
            let factor = ScaleFactor::reciprocal(range);
            prop_assert!(factor.fraction.to_bits() > 0);
            prop_assert!(factor.shift >= 0);
        }
    }
}
