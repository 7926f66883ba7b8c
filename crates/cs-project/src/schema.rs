//! Project schema definitions.
//!
//! All numeric values are raw fixed-point integers: Q31 fractions as `i32`,
//! physical ranges as `i64` in whatever unit the sensor or actuator uses.

use serde::{Deserialize, Serialize};

/// Newest project file version this crate reads and writes.
pub const CURRENT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    pub version: u32,
    pub name: String,
    #[serde(default)]
    pub systems: Vec<ControlSystemDef>,
    #[serde(default)]
    pub variables: Vec<VariableDef>,
}

impl Project {
    /// Empty project at the current version.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            version: CURRENT_VERSION,
            name: name.into(),
            systems: Vec::new(),
            variables: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ControlSystemDef {
    pub name: String,
    pub compensator: CompensatorDef,
    /// Initial setpoint as a raw Q31 value.
    #[serde(default)]
    pub setpoint: i32,
    /// Raw measurement window mapped onto the Q31 domain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<RangeDef>,
    /// Transfer blocks applied to the process variable before the compensator.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prefilter: Vec<TransferDef>,
    /// Actuation window the compensator output is mapped onto.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<RangeDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum CompensatorDef {
    Pid {
        p: GainDef,
        #[serde(default)]
        i: GainDef,
        #[serde(default)]
        d: GainDef,
    },
}

/// Gain `fraction * 2^shift`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct GainDef {
    pub fraction: i32,
    #[serde(default)]
    pub shift: i8,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RangeDef {
    pub min: i64,
    pub max: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum TransferDef {
    Linear {
        min: i32,
        max: i32,
    },
    Integral {
        fraction: i32,
        #[serde(default)]
        shift: u8,
    },
    Differential,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VariableDef {
    pub name: String,
    #[serde(default)]
    pub initial: i32,
}
