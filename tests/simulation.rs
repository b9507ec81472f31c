// Closed-loop simulation tests

use trajgen_rs::Config;
use trajgen_rs::config::{SimulationConfig, TargetConfig};
use trajgen_rs::simulator::Simulation;

const ARM: &str = include_str!("../configs/two_link_arm.toml");

fn arm_config(simulation: SimulationConfig) -> Config {
    let mut config: Config = ARM.parse().unwrap();
    config.simulation = Some(simulation);
    config
}

#[test]
fn test_sample_config_reaches_final_target() {
    let config: Config = ARM.parse().unwrap();
    let mut sim = Simulation::from_config(&config).unwrap();
    let records = sim.run();

    let summary = sim.summary();
    assert_eq!(records.len() as u64, summary.ticks * 2);
    assert!(summary.emitted_ticks > 0);
    assert!(summary.replans >= 4);
    for err in &summary.final_error {
        assert!(*err < 0.02, "final error {err}");
    }
    for (peak, limit) in summary.peak_command_velocity.iter().zip([1.0, 1.5]) {
        assert!(*peak <= limit + 1e-9);
    }
}

#[test]
fn test_ideal_feedback_tracks_exactly() {
    let config = arm_config(SimulationConfig {
        rate_hz: 200.0,
        duration: 3.0,
        velocity_feedback: true,
        targets: vec![TargetConfig { time: 0.0, position: vec![0.5, -0.25] }],
        ..SimulationConfig::default()
    });
    let mut sim = Simulation::from_config(&config).unwrap();
    let records = sim.run();

    // Velocity is published from the first tick, so the generator never bootstraps
    assert!(records.iter().all(|r| r.outcome == "emitted"));
    let summary = sim.summary();
    assert_eq!(summary.emitted_ticks, summary.ticks);
    for err in &summary.final_error {
        assert!(*err < 1e-3, "final error {err}");
    }
}

#[test]
fn test_no_targets_never_commands() {
    let config = arm_config(SimulationConfig {
        duration: 0.5,
        ..SimulationConfig::default()
    });
    let mut sim = Simulation::from_config(&config).unwrap();
    let records = sim.run();

    assert_eq!(records[0].outcome, "bootstrapping");
    assert!(records.iter().skip(2).all(|r| r.outcome == "awaiting_command"));
    assert!(records.iter().all(|r| r.command_position.is_none()));
    assert_eq!(sim.summary().emitted_ticks, 0);
    assert_eq!(sim.plant().position(), &[0.0, 0.0]);
}

#[test]
fn test_full_dropout_produces_no_output() {
    let config = arm_config(SimulationConfig {
        duration: 0.2,
        position_dropout: 1.0,
        targets: vec![TargetConfig { time: 0.0, position: vec![1.0, 1.0] }],
        ..SimulationConfig::default()
    });
    let mut sim = Simulation::from_config(&config).unwrap();
    let records = sim.run();
    assert!(records.iter().all(|r| r.outcome == "no_position"));
}

#[test]
fn test_invalid_simulation_settings_fail_setup() {
    let config = arm_config(SimulationConfig {
        targets: vec![TargetConfig { time: 0.0, position: vec![1.0] }],
        ..SimulationConfig::default()
    });
    assert!(Simulation::from_config(&config).is_err());
}

#[test]
fn test_rate_without_usable_period_fails_setup() {
    for rate_hz in [1e-300, 1e12] {
        let config = arm_config(SimulationConfig {
            rate_hz,
            ..SimulationConfig::default()
        });
        assert!(Simulation::from_config(&config).is_err(), "rate {rate_hz}");
    }
}
