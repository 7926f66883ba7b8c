use cs_project::schema::*;
use cs_project::{ValidationError, validate_project};

fn p_only(name: &str) -> ControlSystemDef {
    ControlSystemDef {
        name: name.to_string(),
        compensator: CompensatorDef::Pid {
            p: GainDef {
                fraction: i32::MAX,
                shift: 0,
            },
            i: GainDef::default(),
            d: GainDef::default(),
        },
        setpoint: 0,
        input: None,
        prefilter: vec![],
        output: None,
    }
}

fn project_with(system: ControlSystemDef) -> Project {
    let mut project = Project::new("Validation");
    project.systems.push(system);
    project
}

#[test]
fn accepts_plain_system() {
    validate_project(&project_with(p_only("fan"))).unwrap();
}

#[test]
fn rejects_unknown_versions() {
    for version in [0, CURRENT_VERSION + 1] {
        let mut project = Project::new("Versioned");
        project.version = version;
        assert!(matches!(
            validate_project(&project),
            Err(ValidationError::UnsupportedVersion { version: v }) if v == version
        ));
    }
}

#[test]
fn rejects_duplicate_system_names() {
    let mut project = project_with(p_only("fan"));
    project.systems.push(p_only("fan"));

    match validate_project(&project) {
        Err(ValidationError::DuplicateId { id, context }) => {
            assert_eq!(id, "fan");
            assert_eq!(context, "systems");
        }
        other => panic!("expected duplicate id, got {other:?}"),
    }
}

#[test]
fn rejects_duplicate_variable_names() {
    let mut project = Project::new("Variables");
    for _ in 0..2 {
        project.variables.push(VariableDef {
            name: "trim".to_string(),
            initial: 0,
        });
    }
    assert!(matches!(
        validate_project(&project),
        Err(ValidationError::DuplicateId { .. })
    ));
}

#[test]
fn rejects_blank_names() {
    assert!(matches!(
        validate_project(&project_with(p_only("  "))),
        Err(ValidationError::InvalidValue { .. })
    ));
}

#[test]
fn rejects_inverted_ranges() {
    let mut system = p_only("heater");
    system.input = Some(RangeDef { min: 10, max: 10 });
    assert!(validate_project(&project_with(system)).is_err());

    let mut system = p_only("heater");
    system.output = Some(RangeDef { min: 5, max: -5 });
    let err = validate_project(&project_with(system)).unwrap_err();
    assert!(err.to_string().contains("output"), "{err}");
}

#[test]
fn rejects_unusable_prefilter_blocks() {
    let invalid = [
        TransferDef::Integral {
            fraction: 0,
            shift: 0,
        },
        TransferDef::Integral {
            fraction: 0,
            shift: 31,
        },
        TransferDef::Integral {
            fraction: 10,
            shift: 31,
        },
        TransferDef::Linear { min: 0, max: 0 },
        TransferDef::Linear { min: 1, max: 0 },
        TransferDef::Linear { min: -5, max: 0 },
    ];

    for transfer in invalid {
        let mut system = p_only("filtered");
        system.prefilter = vec![TransferDef::Differential, transfer.clone()];
        let err = validate_project(&project_with(system)).unwrap_err();
        assert!(
            err.to_string().contains("prefilter[1]"),
            "{transfer:?} gave {err}"
        );
    }
}

#[test]
fn accepts_usable_prefilter_blocks() {
    let mut system = p_only("filtered");
    system.prefilter = vec![
        TransferDef::Linear {
            min: 4999,
            max: 15001,
        },
        TransferDef::Integral {
            fraction: i32::MAX,
            shift: 30,
        },
        TransferDef::Differential,
    ];
    validate_project(&project_with(system)).unwrap();
}
