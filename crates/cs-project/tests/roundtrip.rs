use cs_project::schema::*;
use cs_project::{load_json, load_yaml, save_json, save_yaml, validate_project};

fn speed_loop() -> ControlSystemDef {
    ControlSystemDef {
        name: "wheel_speed".to_string(),
        compensator: CompensatorDef::Pid {
            p: GainDef {
                fraction: 1 << 30,
                shift: 1,
            },
            i: GainDef {
                fraction: 1 << 24,
                shift: 0,
            },
            d: GainDef::default(),
        },
        setpoint: 1 << 28,
        input: Some(RangeDef {
            min: -4096,
            max: 4095,
        }),
        prefilter: vec![
            TransferDef::Differential,
            TransferDef::Integral {
                fraction: i32::MAX,
                shift: 0,
            },
        ],
        output: Some(RangeDef {
            min: 1_000_000,
            max: 2_000_000,
        }),
    }
}

#[test]
fn roundtrip_yaml_empty_project() {
    let project = Project::new("Empty Project");

    validate_project(&project).unwrap();

    let temp_dir = std::env::temp_dir();
    let path = temp_dir.join("cs_project_roundtrip_empty.yaml");

    save_yaml(&path, &project).unwrap();
    let loaded = load_yaml(&path).unwrap();

    assert_eq!(project, loaded);
}

#[test]
fn roundtrip_yaml_speed_loop() {
    let project = Project {
        version: CURRENT_VERSION,
        name: "Wheel".to_string(),
        systems: vec![speed_loop()],
        variables: vec![VariableDef {
            name: "speed_limit".to_string(),
            initial: i32::MAX / 2,
        }],
    };

    let temp_dir = std::env::temp_dir();
    let path = temp_dir.join("cs_project_roundtrip_speed.yaml");

    save_yaml(&path, &project).unwrap();
    let loaded = load_yaml(&path).unwrap();

    assert_eq!(project, loaded);
}

#[test]
fn roundtrip_json_speed_loop() {
    let mut project = Project::new("Wheel JSON");
    project.systems.push(speed_loop());

    let temp_dir = std::env::temp_dir();
    let path = temp_dir.join("cs_project_roundtrip_speed.json");

    save_json(&path, &project).unwrap();
    let loaded = load_json(&path).unwrap();

    assert_eq!(project, loaded);
}

#[test]
fn minimal_yaml_fills_defaults() {
    let yaml = r#"
version: 1
name: Minimal
systems:
  - name: heater
    compensator:
      type: Pid
      p: { fraction: 1073741824 }
"#;
    let project: Project = serde_yaml::from_str(yaml).unwrap();
    let system = &project.systems[0];

    assert_eq!(system.setpoint, 0);
    assert!(system.input.is_none());
    assert!(system.output.is_none());
    assert!(system.prefilter.is_empty());
    assert_eq!(
        system.compensator,
        CompensatorDef::Pid {
            p: GainDef {
                fraction: 1 << 30,
                shift: 0
            },
            i: GainDef::default(),
            d: GainDef::default(),
        }
    );
    assert!(project.variables.is_empty());
}

#[test]
fn save_refuses_invalid_project() {
    let mut project = Project::new("Broken");
    project.version = CURRENT_VERSION + 1;

    let path = std::env::temp_dir().join("cs_project_roundtrip_invalid.yaml");
    assert!(save_yaml(&path, &project).is_err());
}
