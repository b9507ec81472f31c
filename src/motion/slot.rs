// src/motion/slot.rs - Per-joint trajectory segment and replan timing
use crate::motion::profile::{ProfileSample, TrapezoidalProfile};

/// Where a joint slot is in its segment lifecycle at a given time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    /// No segment has been planned yet
    Unplanned,
    /// A segment is running (time <= end time)
    Active,
    /// The segment has finished and may be replaced
    Expired,
}

/// Trajectory state for a single joint.
///
/// Each slot replans on its own schedule: a new target is only picked up once
/// the running segment has expired.
#[derive(Debug, Clone)]
pub struct JointSlot {
    max_velocity: f64,
    max_acceleration: f64,
    profile: Option<TrapezoidalProfile>,
    start_time: f64,
    end_time: f64,
}

impl JointSlot {
    pub fn new(max_velocity: f64, max_acceleration: f64) -> Self {
        Self {
            max_velocity,
            max_acceleration,
            profile: None,
            start_time: 0.0,
            end_time: 0.0,
        }
    }

    pub fn state(&self, time: f64) -> SlotState {
        match self.profile {
            None => SlotState::Unplanned,
            Some(_) if time > self.end_time => SlotState::Expired,
            Some(_) => SlotState::Active,
        }
    }

    /// Whether a replan is due at `time`.
    pub fn needs_replan(&self, time: f64) -> bool {
        self.state(time) != SlotState::Active
    }

    /// Plan a fresh segment from the measured position to the target.
    ///
    /// Both endpoints are planned at rest; the joint's current velocity is
    /// not carried into the new segment.
    pub fn replan(
        &mut self,
        time: f64,
        measured_position: f64,
        target: f64,
    ) -> &TrapezoidalProfile {
        let profile = TrapezoidalProfile::plan(
            measured_position,
            target,
            self.max_velocity,
            self.max_acceleration,
        );
        self.start_time = time;
        self.end_time = time + profile.duration();
        self.profile.insert(profile)
    }

    /// Replan if the running segment has expired. Returns true on replan.
    pub fn advance(&mut self, time: f64, measured_position: f64, target: f64) -> bool {
        if !self.needs_replan(time) {
            return false;
        }
        self.replan(time, measured_position, target);
        true
    }

    /// Sample the current segment at absolute `time`.
    ///
    /// An unplanned slot holds `fallback` at rest.
    pub fn sample(&self, time: f64, fallback: f64) -> ProfileSample {
        match &self.profile {
            Some(profile) => profile.sample(time - self.start_time),
            None => ProfileSample {
                position: fallback,
                velocity: 0.0,
                acceleration: 0.0,
            },
        }
    }

    pub fn profile(&self) -> Option<&TrapezoidalProfile> {
        self.profile.as_ref()
    }

    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    pub fn end_time(&self) -> f64 {
        self.end_time
    }

    pub fn max_velocity(&self) -> f64 {
        self.max_velocity
    }

    pub fn max_acceleration(&self) -> f64 {
        self.max_acceleration
    }
}
