//! Named control systems and their registry.
//!
//! A [`ControlSystem`] is owned by the control loop that drives it. Every
//! successful `set_*` or `sample` call stores the new value in a shared
//! [`PublishedState`], which monitoring code reads through a [`SystemHandle`]
//! from any thread without taking a lock.
//!
//! Values in the published state are written independently. A reader may see
//! a setpoint from one tick next to a sample from the previous tick.

use std::sync::Arc;
use std::sync::atomic::{AtomicI32, Ordering};

use cs_core::Q31;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::controller::Compensator;
use crate::error::{ControlError, ControlResult};

/// Last successfully applied setpoint, process variable and output sample.
#[derive(Debug, Default)]
pub struct PublishedState {
    setpoint: AtomicI32,
    process_var: AtomicI32,
    sample: AtomicI32,
}

impl PublishedState {
    pub fn setpoint(&self) -> Q31 {
        Q31::from_bits(self.setpoint.load(Ordering::Relaxed))
    }

    pub fn process_var(&self) -> Q31 {
        Q31::from_bits(self.process_var.load(Ordering::Relaxed))
    }

    pub fn sample(&self) -> Q31 {
        Q31::from_bits(self.sample.load(Ordering::Relaxed))
    }
}

/// Read-only, cloneable view of a registered control system.
#[derive(Debug, Clone)]
pub struct SystemHandle {
    name: Arc<str>,
    state: Arc<PublishedState>,
}

impl SystemHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get_setpoint(&self) -> Q31 {
        self.state.setpoint()
    }

    pub fn get_process_var(&self) -> Q31 {
        self.state.process_var()
    }

    pub fn get_sample(&self) -> Q31 {
        self.state.sample()
    }

    pub fn snapshot(&self) -> SystemSnapshot {
        SystemSnapshot {
            name: self.name.to_string(),
            setpoint: self.get_setpoint(),
            process_var: self.get_process_var(),
            sample: self.get_sample(),
        }
    }
}

/// A compensator bound to a name and a published state.
#[derive(Debug)]
pub struct ControlSystem<C> {
    handle: SystemHandle,
    compensator: C,
}

impl<C: Compensator> ControlSystem<C> {
    pub fn name(&self) -> &str {
        self.handle.name()
    }

    /// Forward a new setpoint and publish it on success.
    ///
    /// # Errors
    ///
    /// Propagates the compensator's error. The published setpoint is left
    /// unchanged in that case.
    pub fn set_setpoint(&mut self, setpoint: Q31) -> ControlResult<()> {
        self.compensator.set_setpoint(setpoint)?;
        self.handle
            .state
            .setpoint
            .store(setpoint.to_bits(), Ordering::Relaxed);
        Ok(())
    }

    /// Forward a new process variable and publish it on success.
    pub fn set_process_var(&mut self, process_var: Q31) -> ControlResult<()> {
        self.compensator.set_process_var(process_var)?;
        self.handle
            .state
            .process_var
            .store(process_var.to_bits(), Ordering::Relaxed);
        Ok(())
    }

    /// Run one compensator tick and publish the output on success.
    pub fn sample(&mut self) -> ControlResult<Q31> {
        let output = self.compensator.sample()?;
        self.handle.state.sample.store(output.to_bits(), Ordering::Relaxed);
        Ok(output)
    }

    pub fn get_setpoint(&self) -> Q31 {
        self.handle.get_setpoint()
    }

    pub fn get_process_var(&self) -> Q31 {
        self.handle.get_process_var()
    }

    pub fn get_sample(&self) -> Q31 {
        self.handle.get_sample()
    }

    pub fn handle(&self) -> &SystemHandle {
        &self.handle
    }

    pub fn compensator(&self) -> &C {
        &self.compensator
    }

    /// Mutable access for reconfiguration, e.g. retuning gains.
    pub fn compensator_mut(&mut self) -> &mut C {
        &mut self.compensator
    }
}

/// Point-in-time copy of a system's published state.
///
/// Values are the raw published [`Q31`]s, serialized through the fixed-point
/// serde form. No timestamp is attached and no decimal rendering is done
/// here: `Q31`'s `Display` prints six decimals, and stamping each line is up
/// to whatever streams the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemSnapshot {
    #[serde(rename = "nm")]
    pub name: String,
    #[serde(rename = "sp")]
    pub setpoint: Q31,
    #[serde(rename = "pv")]
    pub process_var: Q31,
    #[serde(rename = "sa")]
    pub sample: Q31,
}

/// Registration-ordered set of control systems.
#[derive(Debug, Default)]
pub struct ControlSystemRegistry {
    systems: Vec<SystemHandle>,
}

impl ControlSystemRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `compensator` under `name`.
    ///
    /// The registry keeps a handle to the published state; the returned
    /// [`ControlSystem`] goes to the control loop.
    ///
    /// # Errors
    ///
    /// Returns [`ControlError::DuplicateName`] if `name` is already taken.
    pub fn register<C: Compensator>(
        &mut self,
        name: impl Into<String>,
        compensator: C,
    ) -> ControlResult<ControlSystem<C>> {
        let name = name.into();
        if self.get(&name).is_some() {
            return Err(ControlError::DuplicateName { name });
        }

        let handle = SystemHandle {
            name: Arc::from(name),
            state: Arc::new(PublishedState::default()),
        };
        debug!(
            name = handle.name(),
            index = self.systems.len(),
            "control system registered"
        );
        self.systems.push(handle.clone());

        Ok(ControlSystem {
            handle,
            compensator,
        })
    }

    /// `(name, handle)` pairs in registration order.
    pub fn enumerate(&self) -> impl Iterator<Item = (&str, &SystemHandle)> {
        self.systems.iter().map(|handle| (handle.name(), handle))
    }

    pub fn get(&self, name: &str) -> Option<&SystemHandle> {
        self.systems.iter().find(|handle| handle.name() == name)
    }

    pub fn len(&self) -> usize {
        self.systems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    pub fn snapshot(&self) -> Vec<SystemSnapshot> {
        self.systems.iter().map(SystemHandle::snapshot).collect()
    }
}
