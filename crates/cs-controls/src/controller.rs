//! Compensator contract and the PID compensator.
//!
//! A compensator owns its private loop state and is driven by exactly one
//! control loop. The [`ControlSystem`](crate::ControlSystem) wrapper adds the
//! published, concurrently readable view on top.

use cs_core::{Q31, ScaleFactor};
use tracing::debug;

use crate::error::ControlResult;

/// Control block mapping setpoint and process-variable history to an output.
pub trait Compensator {
    fn set_setpoint(&mut self, setpoint: Q31) -> ControlResult<()>;

    fn set_process_var(&mut self, process_var: Q31) -> ControlResult<()>;

    /// Produce the next output sample. Called once per control tick.
    fn sample(&mut self) -> ControlResult<Q31>;
}

impl<C: Compensator + ?Sized> Compensator for Box<C> {
    fn set_setpoint(&mut self, setpoint: Q31) -> ControlResult<()> {
        (**self).set_setpoint(setpoint)
    }

    fn set_process_var(&mut self, process_var: Q31) -> ControlResult<()> {
        (**self).set_process_var(process_var)
    }

    fn sample(&mut self) -> ControlResult<Q31> {
        (**self).sample()
    }
}

/// Proportional, integral and derivative gains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PidGains {
    pub p: ScaleFactor,
    pub i: ScaleFactor,
    pub d: ScaleFactor,
}

impl PidGains {
    pub fn new(p: ScaleFactor, i: ScaleFactor, d: ScaleFactor) -> Self {
        Self { p, i, d }
    }

    /// Proportional-only gains.
    pub fn proportional(p: ScaleFactor) -> Self {
        Self {
            p,
            ..Self::default()
        }
    }
}

/// Discrete PID compensator.
///
/// Each [`sample`](Compensator::sample) computes
/// `P(e) + sum(I(e)) + D(e - e_prev)` with `e = setpoint - process_var`.
/// All sums saturate. A zero gain disables its term.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Pid {
    gains: PidGains,
    setpoint: Q31,
    process_var: Q31,
    accumulated_error: Q31,
    last_error: Q31,
}

impl Pid {
    pub fn new(gains: PidGains) -> Self {
        Self {
            gains,
            ..Self::default()
        }
    }

    /// Store the three gains. Any fraction/shift pair is accepted.
    pub fn configure(
        &mut self,
        p_fraction: Q31,
        p_shift: i8,
        i_fraction: Q31,
        i_shift: i8,
        d_fraction: Q31,
        d_shift: i8,
    ) {
        self.set_gains(PidGains::new(
            ScaleFactor::new(p_fraction, p_shift),
            ScaleFactor::new(i_fraction, i_shift),
            ScaleFactor::new(d_fraction, d_shift),
        ));
    }

    pub fn set_gains(&mut self, gains: PidGains) {
        debug!(?gains, "pid gains updated");
        self.gains = gains;
    }

    pub fn gains(&self) -> PidGains {
        self.gains
    }

    pub fn accumulated_error(&self) -> Q31 {
        self.accumulated_error
    }

    pub fn last_error(&self) -> Q31 {
        self.last_error
    }
}

impl Compensator for Pid {
    fn set_setpoint(&mut self, setpoint: Q31) -> ControlResult<()> {
        self.setpoint = setpoint;
        Ok(())
    }

    fn set_process_var(&mut self, process_var: Q31) -> ControlResult<()> {
        self.process_var = process_var;
        Ok(())
    }

    fn sample(&mut self) -> ControlResult<Q31> {
        let error = self.setpoint.saturating_sub(self.process_var);

        let p_term = error.scale(self.gains.p);

        self.accumulated_error = self
            .accumulated_error
            .saturating_add(error.scale(self.gains.i));

        let d_term = error.saturating_sub(self.last_error).scale(self.gains.d);
        self.last_error = error;

        Ok(p_term
            .saturating_add(self.accumulated_error)
            .saturating_add(d_term))
    }
}
