//! Actuation sinks for normalized compensator output.
//!
//! - [`OutputSignal`]: anything that consumes one Q31 sample per tick.
//! - [`PwmOutput`]: maps a sample onto a PWM pulse width between a calibrated
//!   minimum and maximum, through a [`PwmChannel`] driver.
//! - [`MappedOutput`]: maps a sample through an [`Osignal`] and hands the
//!   wide value to a closure.

use std::time::Duration;

use cs_core::Q31;
use tracing::{debug, warn};

use crate::error::{ControlError, ControlResult};
use crate::signal::Osignal;

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Consumer of normalized compensator output.
pub trait OutputSignal {
    fn set_signal(&mut self, signal: Q31) -> ControlResult<()>;
}

impl<O: OutputSignal + ?Sized> OutputSignal for Box<O> {
    fn set_signal(&mut self, signal: Q31) -> ControlResult<()> {
        (**self).set_signal(signal)
    }
}

/// Hardware PWM channel.
///
/// Implementations report driver failures as [`ControlError::Sink`].
pub trait PwmChannel {
    /// Clock rate of the channel's counter.
    fn cycles_per_sec(&self) -> ControlResult<u64>;

    /// Program the period and pulse width, both in counter cycles.
    fn set_cycles(&mut self, period_cycles: u32, pulse_cycles: u32) -> ControlResult<()>;
}

/// Cycle counts derived by [`PwmOutput::configure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PwmCalibration {
    pub period_cycles: u32,
    pub pulse_center_cycles: i32,
    pub pulse_range_cycles: i32,
}

/// PWM output driven by a normalized signal.
///
/// `Q31::MIN` maps to the minimum pulse and `Q31::MAX` to the maximum pulse.
#[derive(Debug)]
pub struct PwmOutput<P> {
    channel: P,
    calibration: PwmCalibration,
}

impl<P: PwmChannel> PwmOutput<P> {
    /// Wrap `channel`. The output must be configured before use.
    pub fn new(channel: P) -> Self {
        Self {
            channel,
            calibration: PwmCalibration::default(),
        }
    }

    /// Calibrate for a period and a pulse window.
    ///
    /// # Errors
    ///
    /// - [`ControlError::InvalidRange`] if `max_pulse <= min_pulse` or
    ///   `period < max_pulse`.
    /// - [`ControlError::InvalidArg`] if the period is zero or too long in
    ///   cycles, or the maximum pulse does not fit in `i32` cycles.
    /// - Any error from [`PwmChannel::cycles_per_sec`].
    ///
    /// The previous calibration is kept on error.
    pub fn configure(
        &mut self,
        period: Duration,
        min_pulse: Duration,
        max_pulse: Duration,
    ) -> ControlResult<()> {
        let calibration = self
            .calibrate(period, min_pulse, max_pulse)
            .inspect_err(|err| {
                warn!(?period, ?min_pulse, ?max_pulse, %err, "rejected pwm calibration");
            })?;
        debug!(?calibration, "pwm calibrated");
        self.calibration = calibration;
        Ok(())
    }

    fn calibrate(
        &self,
        period: Duration,
        min_pulse: Duration,
        max_pulse: Duration,
    ) -> ControlResult<PwmCalibration> {
        if max_pulse <= min_pulse || period < max_pulse {
            return Err(ControlError::InvalidRange {
                min: nanos(min_pulse),
                max: nanos(max_pulse),
            });
        }

        let cycles_per_sec = self.channel.cycles_per_sec()?;

        let period_cycles = u32::try_from(cycles(cycles_per_sec, period))
            .ok()
            .filter(|&c| c > 0)
            .ok_or(ControlError::InvalidArg {
                what: "pwm period cycles",
            })?;

        let max_cycles = i32::try_from(cycles(cycles_per_sec, max_pulse)).map_err(|_| {
            ControlError::InvalidArg {
                what: "pwm max pulse cycles",
            }
        })?;

        // max - min < max, so the half window always fits
        let range = (cycles(cycles_per_sec, max_pulse - min_pulse) / 2) as i32;

        Ok(PwmCalibration {
            period_cycles,
            pulse_center_cycles: max_cycles - range,
            pulse_range_cycles: range,
        })
    }

    pub fn calibration(&self) -> PwmCalibration {
        self.calibration
    }

    pub fn channel(&self) -> &P {
        &self.channel
    }

    pub fn channel_mut(&mut self) -> &mut P {
        &mut self.channel
    }
}

impl<P: PwmChannel> OutputSignal for PwmOutput<P> {
    fn set_signal(&mut self, signal: Q31) -> ControlResult<()> {
        let PwmCalibration {
            period_cycles,
            pulse_center_cycles,
            pulse_range_cycles,
        } = self.calibration;
        if period_cycles == 0 {
            return Err(ControlError::InvalidArg {
                what: "pwm output not configured",
            });
        }

        let offset = signal.mul_fract(Q31::from_bits(pulse_range_cycles));
        let pulse = (i64::from(pulse_center_cycles) + i64::from(offset.to_bits())).max(0) as u32;
        self.channel.set_cycles(period_cycles, pulse)
    }
}

/// Output through an [`Osignal`] into a wide-domain sink.
pub struct MappedOutput<F> {
    osignal: Osignal,
    sink: F,
}

impl<F> MappedOutput<F>
where
    F: FnMut(i64) -> ControlResult<()>,
{
    pub fn new(osignal: Osignal, sink: F) -> Self {
        Self { osignal, sink }
    }

    pub fn osignal(&self) -> &Osignal {
        &self.osignal
    }
}

impl<F> OutputSignal for MappedOutput<F>
where
    F: FnMut(i64) -> ControlResult<()>,
{
    fn set_signal(&mut self, signal: Q31) -> ControlResult<()> {
        (self.sink)(self.osignal.sample(signal))
    }
}

fn cycles(cycles_per_sec: u64, duration: Duration) -> u128 {
    u128::from(cycles_per_sec) * duration.as_nanos() / NANOS_PER_SEC
}

fn nanos(duration: Duration) -> i64 {
    i64::try_from(duration.as_nanos()).unwrap_or(i64::MAX)
}
