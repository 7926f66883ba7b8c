//! Building runnable control loops from a validated project.

use cs_controls::{
    ControlResult, ControlSystem, ControlSystemRegistry, Differential, Insignal, Integral, Linear,
    Osignal, Pid, PidGains, Transfer, TransferBlock, TransferChain, VariableRegistry,
};
use cs_core::{Q31, ScaleFactor};
use tracing::{debug, info};

use crate::ProjectResult;
use crate::schema::{CompensatorDef, ControlSystemDef, GainDef, Project, TransferDef};
use crate::validate::validate_project;

/// One control system together with its signal conditioning.
///
/// Each [`step`](Self::step) converts a raw measurement, runs it through the
/// prefilter, ticks the compensator and maps the output to the actuation
/// domain.
#[derive(Debug)]
pub struct SystemLoop {
    pub system: ControlSystem<Pid>,
    /// Without an input window raw values are taken as Q31, saturated.
    pub insignal: Option<Insignal>,
    pub prefilter: TransferChain,
    /// Without an output window the raw Q31 sample is returned.
    pub osignal: Option<Osignal>,
}

impl SystemLoop {
    pub fn name(&self) -> &str {
        self.system.name()
    }

    /// Run one control tick for the measurement `raw_pv`.
    ///
    /// # Errors
    ///
    /// Propagates prefilter and compensator errors. Published state is only
    /// updated by the stages that succeeded.
    pub fn step(&mut self, raw_pv: i64) -> ControlResult<i64> {
        let process_var = match &self.insignal {
            Some(insignal) => insignal.sample(raw_pv),
            None => Q31::saturate(raw_pv),
        };
        let process_var = self.prefilter.transfer(process_var)?;
        self.system.set_process_var(process_var)?;

        let output = self.system.sample()?;
        Ok(match &self.osignal {
            Some(osignal) => osignal.sample(output),
            None => i64::from(output.to_bits()),
        })
    }
}

/// Everything a project describes, ready to run.
#[derive(Debug, Default)]
pub struct Instance {
    pub systems: ControlSystemRegistry,
    pub variables: VariableRegistry,
    /// Loops in the order the project lists them.
    pub loops: Vec<SystemLoop>,
}

impl Instance {
    pub fn loop_mut(&mut self, name: &str) -> Option<&mut SystemLoop> {
        self.loops.iter_mut().find(|l| l.name() == name)
    }
}

/// Validate `project` and build its registries and loops.
///
/// # Errors
///
/// Returns the validation error, or the first configuration error raised
/// while calibrating a block. Nothing is returned partially built.
pub fn instantiate(project: &Project) -> ProjectResult<Instance> {
    validate_project(project)?;

    let mut instance = Instance::default();

    for def in &project.variables {
        instance
            .variables
            .register(def.name.clone(), Q31::from_bits(def.initial))?;
    }

    for def in &project.systems {
        let system_loop = build_loop(&mut instance.systems, def)?;
        instance.loops.push(system_loop);
    }

    info!(
        project = %project.name,
        systems = instance.loops.len(),
        variables = instance.variables.len(),
        "project instantiated"
    );
    Ok(instance)
}

fn build_loop(
    registry: &mut ControlSystemRegistry,
    def: &ControlSystemDef,
) -> ProjectResult<SystemLoop> {
    let insignal = def
        .input
        .map(|range| Insignal::new(range.min, range.max))
        .transpose()?;
    let osignal = def
        .output
        .map(|range| Osignal::new(range.min, range.max))
        .transpose()?;

    let mut prefilter = TransferChain::new();
    for transfer in &def.prefilter {
        let block: TransferBlock = match *transfer {
            TransferDef::Linear { min, max } => {
                Linear::new(Q31::from_bits(min), Q31::from_bits(max))?.into()
            }
            TransferDef::Integral { fraction, shift } => {
                Integral::new(Q31::from_bits(fraction), shift)?.into()
            }
            TransferDef::Differential => Differential::new().into(),
        };
        prefilter.push(block);
    }

    let compensator = match &def.compensator {
        CompensatorDef::Pid { p, i, d } => Pid::new(PidGains::new(gain(*p), gain(*i), gain(*d))),
    };

    let mut system = registry.register(def.name.clone(), compensator)?;
    system.set_setpoint(Q31::from_bits(def.setpoint))?;
    debug!(
        name = %def.name,
        prefilter = prefilter.len(),
        input = def.input.is_some(),
        output = def.output.is_some(),
        "control loop built"
    );

    Ok(SystemLoop {
        system,
        insignal,
        prefilter,
        osignal,
    })
}

fn gain(def: GainDef) -> ScaleFactor {
    ScaleFactor::new(Q31::from_bits(def.fraction), def.shift)
}
