// src/scheduler/port_host.rs - CycleHost backed by data ports
use crate::JointVector;
use crate::communication::{Exclusivity, FlowStatus, InputPort, OutputPort};
use crate::scheduler::CycleHost;

/// Port-backed host: three exclusive inputs, two outputs and a tick clock
/// that the driving loop sets before each update.
#[derive(Debug)]
pub struct PortHost {
    time: f64,
    period: f64,
    pub joint_position_in: InputPort<JointVector>,
    pub joint_velocity_in: InputPort<JointVector>,
    pub joint_position_cmd_in: InputPort<JointVector>,
    pub joint_position_out: OutputPort<JointVector>,
    pub joint_velocity_out: OutputPort<JointVector>,
}

impl PortHost {
    pub fn new() -> Self {
        Self {
            time: 0.0,
            period: 0.0,
            joint_position_in: InputPort::new("joint_position_in", Exclusivity::Exclusive),
            joint_velocity_in: InputPort::new("joint_velocity_in", Exclusivity::Exclusive),
            joint_position_cmd_in: InputPort::new("joint_position_cmd_in", Exclusivity::Exclusive),
            joint_position_out: OutputPort::new("joint_position_out"),
            joint_velocity_out: OutputPort::new("joint_velocity_out"),
        }
    }

    /// Set the clock for the upcoming tick.
    pub fn begin_cycle(&mut self, time: f64, period: f64) {
        self.time = time;
        self.period = period;
    }
}

impl Default for PortHost {
    fn default() -> Self {
        Self::new()
    }
}

impl CycleHost for PortHost {
    fn time(&self) -> f64 {
        self.time
    }

    fn period(&self) -> f64 {
        self.period
    }

    fn read_position(&mut self, sample: &mut JointVector) -> FlowStatus {
        self.joint_position_in.read_newest(sample)
    }

    fn read_velocity(&mut self, sample: &mut JointVector) -> FlowStatus {
        self.joint_velocity_in.read_newest(sample)
    }

    fn read_position_cmd(&mut self, sample: &mut JointVector) -> FlowStatus {
        self.joint_position_cmd_in.read_newest(sample)
    }

    fn write_position(&mut self, sample: &JointVector) {
        self.joint_position_out.write(sample);
    }

    fn write_velocity(&mut self, sample: &JointVector) {
        self.joint_velocity_out.write(sample);
    }
}
