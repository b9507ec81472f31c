//! # Trajectory Generator Configuration
//!
//! Configuration is read once before the generator starts and never changes
//! afterwards.
//!
//! ## Example: TOML Configuration
//!
//! ```toml
//! [generator]
//! trap_max_vels = [1.0, 1.5]
//! trap_max_accs = [2.0, 4.0]
//! velocity_smoothing_factor = 0.5
//!
//! [chain]
//! root_link = "base_link"
//! tip_link = "forearm_link"
//!
//! [[chain.joints]]
//! name = "shoulder"
//! type = "revolute"
//! parent = "base_link"
//! child = "upper_arm_link"
//!
//! [[chain.joints]]
//! name = "elbow"
//! type = "revolute"
//! parent = "upper_arm_link"
//! child = "forearm_link"
//! ```
//!
//! ## Example: Rust Usage
//!
//! ```rust
//! use trajgen_rs::config::Config;
//! let toml_str = r#"
//! [generator]
//! trap_max_vels = [1.0]
//! trap_max_accs = [2.0]
//!
//! [chain]
//! root_link = "base"
//! tip_link = "link1"
//!
//! [[chain.joints]]
//! name = "j1"
//! type = "prismatic"
//! parent = "base"
//! child = "link1"
//! "#;
//! let config: Config = toml_str.parse().unwrap();
//! assert_eq!(config.generator.velocity_smoothing_factor, 1.0);
//! assert!(config.generator.validate(1).is_ok());
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::chain::ChainError;
use crate::communication::PortError;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Kinematic chain error: {0}")]
    Chain(#[from] ChainError),
    #[error("{field} has {actual} entries, expected {expected} (one per joint)")]
    LengthMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("{field}[{joint}] must be finite and positive, got {value}")]
    InvalidLimit {
        field: &'static str,
        joint: usize,
        value: f64,
    },
    #[error("velocity_smoothing_factor must be within [0, 1], got {0}")]
    InvalidSmoothingFactor(f64),
    #[error("Joint count could not be resolved: no joints")]
    NoJoints,
    #[error("Invalid simulation setting: {0}")]
    InvalidSimulation(String),
    #[error("Port error: {0}")]
    Port(#[from] PortError),
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub generator: GeneratorConfig,
    #[serde(default)]
    pub chain: ChainConfig,
    #[serde(default)]
    pub simulation: Option<SimulationConfig>,
}

/// Trajectory limits and velocity estimation settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeneratorConfig {
    /// Maximum velocity per joint for trapezoid generation
    #[serde(default)]
    pub trap_max_vels: Vec<f64>,
    /// Maximum acceleration per joint for trapezoid generation
    #[serde(default)]
    pub trap_max_accs: Vec<f64>,
    /// Exponential smoothing factor for finite-difference velocity estimates
    #[serde(default = "default_smoothing_factor")]
    pub velocity_smoothing_factor: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            trap_max_vels: Vec::new(),
            trap_max_accs: Vec::new(),
            velocity_smoothing_factor: default_smoothing_factor(),
        }
    }
}

impl GeneratorConfig {
    /// Uniform limits for `n_dof` joints.
    pub fn uniform(n_dof: usize, max_velocity: f64, max_acceleration: f64, smoothing: f64) -> Self {
        Self {
            trap_max_vels: vec![max_velocity; n_dof],
            trap_max_accs: vec![max_acceleration; n_dof],
            velocity_smoothing_factor: smoothing,
        }
    }

    pub fn validate(&self, n_dof: usize) -> Result<(), ConfigError> {
        check_limits("trap_max_vels", &self.trap_max_vels, n_dof)?;
        check_limits("trap_max_accs", &self.trap_max_accs, n_dof)?;
        let alpha = self.velocity_smoothing_factor;
        if !alpha.is_finite() || !(0.0..=1.0).contains(&alpha) {
            return Err(ConfigError::InvalidSmoothingFactor(alpha));
        }
        Ok(())
    }
}

fn check_limits(field: &'static str, values: &[f64], n_dof: usize) -> Result<(), ConfigError> {
    if values.len() != n_dof {
        return Err(ConfigError::LengthMismatch {
            field,
            expected: n_dof,
            actual: values.len(),
        });
    }
    if let Some((joint, &value)) = values
        .iter()
        .enumerate()
        .find(|&(_, v)| !v.is_finite() || *v <= 0.0)
    {
        return Err(ConfigError::InvalidLimit { field, joint, value });
    }
    Ok(())
}

/// Kinematic chain description: the joints between a root and a tip link.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ChainConfig {
    #[serde(default)]
    pub root_link: String,
    #[serde(default)]
    pub tip_link: String,
    #[serde(default)]
    pub joints: Vec<JointConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JointConfig {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: JointKind,
    pub parent: String,
    pub child: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JointKind {
    #[default]
    Revolute,
    Continuous,
    Prismatic,
    Fixed,
}

impl JointKind {
    pub fn is_movable(self) -> bool {
        !matches!(self, JointKind::Fixed)
    }
}

/// Offline simulation settings used by the harness.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimulationConfig {
    #[serde(default = "default_rate_hz")]
    pub rate_hz: f64,
    #[serde(default = "default_duration")]
    pub duration: f64,
    /// Publish plant velocity on the velocity input
    #[serde(default)]
    pub velocity_feedback: bool,
    /// Probability of a tick with no position sample
    #[serde(default)]
    pub position_dropout: f64,
    /// Amplitude of uniform noise added to position samples
    #[serde(default)]
    pub sensor_noise: f64,
    /// Proportional position correction of the simulated joints (1/s)
    #[serde(default = "default_tracking_gain")]
    pub tracking_gain: f64,
    #[serde(default)]
    pub seed: u64,
    #[serde(default)]
    pub initial_position: Option<Vec<f64>>,
    #[serde(default)]
    pub targets: Vec<TargetConfig>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            rate_hz: default_rate_hz(),
            duration: default_duration(),
            velocity_feedback: false,
            position_dropout: 0.0,
            sensor_noise: 0.0,
            tracking_gain: default_tracking_gain(),
            seed: 0,
            initial_position: None,
            targets: Vec::new(),
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self, n_dof: usize) -> Result<(), ConfigError> {
        let invalid = |msg: String| -> Result<(), ConfigError> {
            Err(ConfigError::InvalidSimulation(msg))
        };
        if !self.rate_hz.is_finite() || self.rate_hz <= 0.0 {
            return invalid(format!("rate_hz must be positive, got {}", self.rate_hz));
        }
        // The control period must be a representable, non-zero Duration
        match Duration::try_from_secs_f64(1.0 / self.rate_hz) {
            Ok(period) if !period.is_zero() => {}
            _ => return invalid(format!("rate_hz {} has no usable period", self.rate_hz)),
        }
        if !self.duration.is_finite() || self.duration < 0.0 {
            return invalid(format!("duration must be non-negative, got {}", self.duration));
        }
        if !(0.0..=1.0).contains(&self.position_dropout) {
            return invalid(format!(
                "position_dropout must be within [0, 1], got {}",
                self.position_dropout
            ));
        }
        if !self.sensor_noise.is_finite() || self.sensor_noise < 0.0 {
            return invalid(format!("sensor_noise must be non-negative, got {}", self.sensor_noise));
        }
        if !self.tracking_gain.is_finite() || self.tracking_gain < 0.0 {
            return invalid(format!(
                "tracking_gain must be non-negative, got {}",
                self.tracking_gain
            ));
        }
        if let Some(initial) = &self.initial_position {
            if initial.len() != n_dof {
                return Err(ConfigError::LengthMismatch {
                    field: "initial_position",
                    expected: n_dof,
                    actual: initial.len(),
                });
            }
        }
        for target in &self.targets {
            if target.position.len() != n_dof {
                return Err(ConfigError::LengthMismatch {
                    field: "targets.position",
                    expected: n_dof,
                    actual: target.position.len(),
                });
            }
        }
        Ok(())
    }
}

/// A commanded joint position published at `time`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TargetConfig {
    pub time: f64,
    pub position: Vec<f64>,
}

fn default_smoothing_factor() -> f64 {
    1.0
}

fn default_rate_hz() -> f64 {
    500.0
}

fn default_duration() -> f64 {
    5.0
}

fn default_tracking_gain() -> f64 {
    20.0
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(toml::from_str(s)?)
    }
}

/// Load a TOML configuration file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    content.parse()
}
