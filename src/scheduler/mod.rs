// src/scheduler/mod.rs - Host runtime seam for the per-tick generator
pub mod port_host;

pub use port_host::PortHost;

use crate::JointVector;
use crate::communication::FlowStatus;

/// Everything the generator needs from its host for one tick.
///
/// The host supplies the clock and the data connections. Reads follow
/// "newest value" semantics and may report no data on any tick; writes are
/// fire-and-forget.
pub trait CycleHost {
    /// Current time (s)
    fn time(&self) -> f64;
    /// Time since the previous tick (s)
    fn period(&self) -> f64;

    fn read_position(&mut self, sample: &mut JointVector) -> FlowStatus;
    fn read_velocity(&mut self, sample: &mut JointVector) -> FlowStatus;
    fn read_position_cmd(&mut self, sample: &mut JointVector) -> FlowStatus;

    fn write_position(&mut self, sample: &JointVector);
    fn write_velocity(&mut self, sample: &JointVector);
}
