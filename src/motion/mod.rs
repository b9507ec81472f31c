// src/motion/mod.rs - Per-joint motion primitives
pub mod profile;
pub mod slot;
pub mod velocity;

pub use profile::{ProfileSample, ProfileShape, TrapezoidalProfile};
pub use slot::{JointSlot, SlotState};
pub use velocity::{estimate_joint_velocities, estimate_velocity};
