// Integration tests for loading configuration files and configuring the generator

use std::io::Write;
use trajgen_rs::{
    ChainError, ConfigError, JointTrajGenerator, KinematicChain, LifecycleState, load_config,
};

const ARM: &str = include_str!("../configs/two_link_arm.toml");

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(contents.as_bytes()).expect("write config");
    file
}

#[test]
fn test_load_and_configure_sample_arm() {
    let file = write_config(ARM);
    let config = load_config(file.path()).expect("sample config loads");

    let chain = KinematicChain::resolve(&config.chain).unwrap();
    assert_eq!(chain.joint_names(), vec!["shoulder", "elbow"]);

    let generator = JointTrajGenerator::configure(&config).unwrap();
    assert_eq!(generator.n_dof(), 2);
    assert_eq!(generator.joint_names(), &["shoulder".to_string(), "elbow".to_string()]);
    assert_eq!(generator.smoothing_factor(), 0.5);
    assert_eq!(generator.lifecycle(), LifecycleState::Configured);
    assert_eq!(generator.slots()[1].max_velocity(), 1.5);
    assert_eq!(generator.slots()[1].max_acceleration(), 4.0);
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = load_config(dir.path().join("missing.toml"));
    assert!(matches!(result, Err(ConfigError::Io(_))));
}

#[test]
fn test_malformed_toml_is_parse_error() {
    let file = write_config("[generator\ntrap_max_vels = [1.0]");
    assert!(matches!(load_config(file.path()), Err(ConfigError::Toml(_))));
}

#[test]
fn test_limit_count_must_match_chain() {
    let contents = ARM.replace("trap_max_accs = [2.0, 4.0]", "trap_max_accs = [2.0]");
    let file = write_config(&contents);
    let config = load_config(file.path()).unwrap();
    assert!(matches!(
        JointTrajGenerator::configure(&config),
        Err(ConfigError::LengthMismatch { field: "trap_max_accs", expected: 2, actual: 1 })
    ));
}

#[test]
fn test_negative_limit_fails_configuration() {
    let contents = ARM.replace("trap_max_vels = [1.0, 1.5]", "trap_max_vels = [1.0, -1.5]");
    let config: trajgen_rs::Config = contents.parse().unwrap();
    assert!(matches!(
        JointTrajGenerator::configure(&config),
        Err(ConfigError::InvalidLimit { field: "trap_max_vels", joint: 1, .. })
    ));
}

#[test]
fn test_unresolvable_chain_fails_configuration() {
    let contents = ARM.replace("tip_link = \"tool_link\"", "tip_link = \"gripper_link\"");
    let config: trajgen_rs::Config = contents.parse().unwrap();
    match JointTrajGenerator::configure(&config) {
        Err(ConfigError::Chain(ChainError::UnknownLink(link))) => assert_eq!(link, "gripper_link"),
        other => panic!("unexpected result: {other:?}"),
    }
}
