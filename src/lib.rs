//! Per-cycle trapezoidal trajectory generation for multi-joint actuators.
//!
//! A [`JointTrajGenerator`] is ticked by its host at the control rate. Each
//! tick it reads joint feedback and the latest commanded position through a
//! [`CycleHost`], and writes a velocity/acceleration-bounded position and
//! velocity command for every joint.

pub mod chain;
pub mod communication;
pub mod config;
pub mod generator;
pub mod motion;
pub mod scheduler;
pub mod simulator;

/// One value per joint, in chain order.
pub type JointVector = Vec<f64>;

pub use chain::{ChainError, KinematicChain};
pub use config::{Config, ConfigError, GeneratorConfig, load_config};
pub use generator::{CycleOutcome, JointTrajGenerator, LifecycleState};
pub use motion::{ProfileSample, TrapezoidalProfile};
pub use scheduler::{CycleHost, PortHost};
