//! Simulated joints and commanded-target schedule

use rand::Rng;

use crate::config::TargetConfig;

/// Simple joint model: follows the commanded velocity with a proportional
/// correction toward the commanded position, and holds still when no command
/// arrives on a tick.
#[derive(Debug, Clone)]
pub struct JointPlant {
    position: Vec<f64>,
    velocity: Vec<f64>,
    tracking_gain: f64,
}

impl JointPlant {
    pub fn new(initial_position: Vec<f64>, tracking_gain: f64) -> Self {
        let n = initial_position.len();
        Self {
            position: initial_position,
            velocity: vec![0.0; n],
            tracking_gain,
        }
    }

    pub fn apply(&mut self, command: Option<(&[f64], &[f64])>, dt: f64) {
        match command {
            Some((position_cmd, velocity_cmd)) => {
                for i in 0..self.position.len() {
                    let error = position_cmd[i] - self.position[i];
                    let v = velocity_cmd[i] + self.tracking_gain * error;
                    self.position[i] += v * dt;
                    self.velocity[i] = v;
                }
            }
            None => self.velocity.iter_mut().for_each(|v| *v = 0.0),
        }
    }

    /// Position as seen by a sensor with uniform noise of amplitude `noise`.
    pub fn measure<R: Rng>(&self, rng: &mut R, noise: f64) -> Vec<f64> {
        if noise == 0.0 {
            return self.position.clone();
        }
        self.position
            .iter()
            .map(|p| p + noise * rng.random_range(-1.0..=1.0))
            .collect()
    }

    pub fn position(&self) -> &[f64] {
        &self.position
    }

    pub fn velocity(&self) -> &[f64] {
        &self.velocity
    }
}

/// Commanded positions released at their scheduled times.
#[derive(Debug, Clone, Default)]
pub struct TargetSchedule {
    targets: Vec<TargetConfig>,
    next: usize,
}

impl TargetSchedule {
    pub fn new(mut targets: Vec<TargetConfig>) -> Self {
        targets.sort_by(|a, b| a.time.total_cmp(&b.time));
        Self { targets, next: 0 }
    }

    /// Newest target due at `time` that has not been released yet.
    pub fn due(&mut self, time: f64) -> Option<&[f64]> {
        let start = self.next;
        while self.next < self.targets.len() && self.targets[self.next].time <= time {
            self.next += 1;
        }
        (self.next > start).then(|| self.targets[self.next - 1].position.as_slice())
    }

    pub fn remaining(&self) -> usize {
        self.targets.len() - self.next
    }
}
