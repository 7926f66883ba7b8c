//! Project validation logic.

use crate::schema::{CURRENT_VERSION, ControlSystemDef, Project, RangeDef, TransferDef};
use cs_controls::INTEGRAL_MAX_SHIFT;
use std::collections::HashSet;

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Duplicate ID: {id} in {context}")]
    DuplicateId { id: String, context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

pub fn validate_project(project: &Project) -> Result<(), ValidationError> {
    if project.version == 0 || project.version > CURRENT_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: project.version,
        });
    }

    let mut system_names = HashSet::new();
    for system in &project.systems {
        validate_name(&system.name, "system")?;
        if !system_names.insert(&system.name) {
            return Err(ValidationError::DuplicateId {
                id: system.name.clone(),
                context: "systems".to_string(),
            });
        }
        validate_system(system)?;
    }

    let mut variable_names = HashSet::new();
    for variable in &project.variables {
        validate_name(&variable.name, "variable")?;
        if !variable_names.insert(&variable.name) {
            return Err(ValidationError::DuplicateId {
                id: variable.name.clone(),
                context: "variables".to_string(),
            });
        }
    }

    Ok(())
}

fn validate_name(name: &str, kind: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::InvalidValue {
            field: format!("{kind} name"),
            value: format!("{name:?}"),
            reason: "must not be empty".to_string(),
        });
    }
    Ok(())
}

fn validate_system(system: &ControlSystemDef) -> Result<(), ValidationError> {
    if let Some(input) = &system.input {
        validate_range(input, &format!("system '{}' input", system.name))?;
    }
    if let Some(output) = &system.output {
        validate_range(output, &format!("system '{}' output", system.name))?;
    }

    for (index, transfer) in system.prefilter.iter().enumerate() {
        let field = format!("system '{}' prefilter[{index}]", system.name);
        match *transfer {
            TransferDef::Linear { min, max } => {
                if max == 0 || max <= min {
                    return Err(ValidationError::InvalidValue {
                        field,
                        value: format!("[{min}, {max}]"),
                        reason: "linear max must be non-zero and above min".to_string(),
                    });
                }
            }
            TransferDef::Integral { fraction, shift } => {
                if fraction == 0 || shift > INTEGRAL_MAX_SHIFT {
                    return Err(ValidationError::InvalidValue {
                        field,
                        value: format!("fraction={fraction} shift={shift}"),
                        reason: format!(
                            "integral gain needs a non-zero fraction and shift <= {INTEGRAL_MAX_SHIFT}"
                        ),
                    });
                }
            }
            TransferDef::Differential => {}
        }
    }

    Ok(())
}

fn validate_range(range: &RangeDef, field: &str) -> Result<(), ValidationError> {
    if range.max <= range.min {
        return Err(ValidationError::InvalidValue {
            field: field.to_string(),
            value: format!("[{}, {}]", range.min, range.max),
            reason: "max must be greater than min".to_string(),
        });
    }
    Ok(())
}
