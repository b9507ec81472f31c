// src/generator.rs - Per-tick joint trajectory generation
use crate::JointVector;
use crate::chain::KinematicChain;
use crate::communication::FlowStatus;
use crate::config::{Config, ConfigError, GeneratorConfig};
use crate::motion::{JointSlot, estimate_joint_velocities};
use crate::scheduler::CycleHost;

/// Measured joint state carried between ticks.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedbackState {
    pub position: JointVector,
    /// Measured velocity, or the smoothed finite-difference estimate
    pub velocity: JointVector,
    pub previous_position: JointVector,
    /// False until a position has been recorded by a previous tick
    pub has_previous_position: bool,
}

impl FeedbackState {
    fn new(n_dof: usize) -> Self {
        Self {
            position: vec![0.0; n_dof],
            velocity: vec![0.0; n_dof],
            previous_position: vec![0.0; n_dof],
            has_previous_position: false,
        }
    }
}

/// Last commanded position, kept across ticks once received.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandState {
    position: JointVector,
    received: bool,
}

impl CommandState {
    pub fn position(&self) -> Option<&[f64]> {
        self.received.then_some(self.position.as_slice())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Configured,
    Running,
    Stopped,
}

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Generator is not running
    Inactive,
    /// No new position sample; nothing changed
    NoPosition,
    /// No velocity source yet; position recorded for the next tick
    Bootstrapping,
    /// No commanded position has ever been received
    AwaitingCommand,
    /// Position and velocity commands were written
    Emitted { replanned: usize },
}

impl CycleOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            CycleOutcome::Inactive => "inactive",
            CycleOutcome::NoPosition => "no_position",
            CycleOutcome::Bootstrapping => "bootstrapping",
            CycleOutcome::AwaitingCommand => "awaiting_command",
            CycleOutcome::Emitted { .. } => "emitted",
        }
    }

    pub fn emitted(&self) -> bool {
        matches!(self, CycleOutcome::Emitted { .. })
    }
}

/// Trapezoidal trajectory generator for a fixed set of joints.
///
/// Every tick it reads joint feedback and the commanded position, replans each
/// joint whose segment has expired, and writes the sampled position and
/// velocity for all joints. Joints replan independently of each other.
///
/// Replanning starts from the measured position at rest, whatever the joint's
/// actual velocity. A joint still moving at a replan boundary therefore sees a
/// velocity step in its command.
#[derive(Debug, Clone)]
pub struct JointTrajGenerator {
    joint_names: Vec<String>,
    smoothing_factor: f64,
    slots: Vec<JointSlot>,
    feedback: FeedbackState,
    command: CommandState,
    position_sample: JointVector,
    velocity_sample: JointVector,
    position_in: JointVector,
    velocity_in: JointVector,
    command_in: JointVector,
    state: LifecycleState,
}

impl JointTrajGenerator {
    /// Resolve the kinematic chain and build a generator for its joints.
    pub fn configure(config: &Config) -> Result<Self, ConfigError> {
        let chain = KinematicChain::resolve(&config.chain)?;
        Self::new(config.generator.clone(), chain.joint_names())
    }

    pub fn new(config: GeneratorConfig, joint_names: Vec<String>) -> Result<Self, ConfigError> {
        let n_dof = joint_names.len();
        if n_dof == 0 {
            return Err(ConfigError::NoJoints);
        }
        config.validate(n_dof)?;

        let slots = config
            .trap_max_vels
            .iter()
            .zip(&config.trap_max_accs)
            .map(|(&v, &a)| JointSlot::new(v, a))
            .collect();

        tracing::info!(
            "Configured trajectory generator for {} joints (smoothing factor {})",
            n_dof,
            config.velocity_smoothing_factor
        );
        Ok(Self {
            joint_names,
            smoothing_factor: config.velocity_smoothing_factor,
            slots,
            feedback: FeedbackState::new(n_dof),
            command: CommandState {
                position: vec![0.0; n_dof],
                received: false,
            },
            position_sample: vec![0.0; n_dof],
            velocity_sample: vec![0.0; n_dof],
            position_in: Vec::with_capacity(n_dof),
            velocity_in: Vec::with_capacity(n_dof),
            command_in: Vec::with_capacity(n_dof),
            state: LifecycleState::Configured,
        })
    }

    /// Begin ticking. Position history from an earlier run is discarded.
    pub fn start(&mut self) {
        self.feedback.has_previous_position = false;
        self.state = LifecycleState::Running;
        tracing::info!("Trajectory generator started");
    }

    pub fn stop(&mut self) {
        self.state = LifecycleState::Stopped;
        tracing::info!("Trajectory generator stopped");
    }

    /// Run one control tick against `host`.
    pub fn update<H: CycleHost + ?Sized>(&mut self, host: &mut H) -> CycleOutcome {
        if self.state != LifecycleState::Running {
            return CycleOutcome::Inactive;
        }
        let time = host.time();
        let period = host.period();
        let n_dof = self.n_dof();

        let status = host.read_position(&mut self.position_in);
        if !is_fresh(status, &self.position_in, n_dof, "joint_position_in") {
            tracing::trace!("t={:.4}: no new position, skipping tick", time);
            return CycleOutcome::NoPosition;
        }
        self.feedback.position.copy_from_slice(&self.position_in);

        let status = host.read_velocity(&mut self.velocity_in);
        let has_velocity = is_fresh(status, &self.velocity_in, n_dof, "joint_velocity_in");

        let outcome = if has_velocity || self.feedback.has_previous_position {
            estimate_joint_velocities(
                &mut self.feedback.velocity,
                has_velocity.then_some(self.velocity_in.as_slice()),
                &self.feedback.position,
                &self.feedback.previous_position,
                period,
                self.smoothing_factor,
            );

            let status = host.read_position_cmd(&mut self.command_in);
            if status != FlowStatus::NoData
                && is_usable(&self.command_in, n_dof, "joint_position_cmd_in")
            {
                self.command.position.copy_from_slice(&self.command_in);
                self.command.received = true;
            }
            if !self.command.received {
                tracing::trace!("t={:.4}: no commanded position yet", time);
                return CycleOutcome::AwaitingCommand;
            }

            let replanned = self.replan_expired(time);
            self.sample_all(time);
            host.write_position(&self.position_sample);
            host.write_velocity(&self.velocity_sample);
            CycleOutcome::Emitted { replanned }
        } else {
            tracing::trace!("t={:.4}: bootstrapping position history", time);
            CycleOutcome::Bootstrapping
        };

        self.feedback.previous_position.copy_from_slice(&self.feedback.position);
        self.feedback.has_previous_position = true;
        outcome
    }

    fn replan_expired(&mut self, time: f64) -> usize {
        let mut replanned = 0;
        for (i, slot) in self.slots.iter_mut().enumerate() {
            let from = self.feedback.position[i];
            let to = self.command.position[i];
            if slot.advance(time, from, to) {
                replanned += 1;
                tracing::debug!(
                    "t={:.4}: joint {} ({}) replanned {:.4} -> {:.4}, ends at {:.4}",
                    time,
                    i,
                    self.joint_names[i],
                    from,
                    to,
                    slot.end_time()
                );
            }
        }
        replanned
    }

    fn sample_all(&mut self, time: f64) {
        for (i, slot) in self.slots.iter().enumerate() {
            let sample = slot.sample(time, self.feedback.position[i]);
            self.position_sample[i] = sample.position;
            self.velocity_sample[i] = sample.velocity;
        }
    }

    pub fn n_dof(&self) -> usize {
        self.joint_names.len()
    }

    pub fn joint_names(&self) -> &[String] {
        &self.joint_names
    }

    pub fn smoothing_factor(&self) -> f64 {
        self.smoothing_factor
    }

    pub fn lifecycle(&self) -> LifecycleState {
        self.state
    }

    pub fn feedback(&self) -> &FeedbackState {
        &self.feedback
    }

    pub fn command(&self) -> &CommandState {
        &self.command
    }

    pub fn slots(&self) -> &[JointSlot] {
        &self.slots
    }

    /// Position command from the most recent emitting tick.
    pub fn position_sample(&self) -> &[f64] {
        &self.position_sample
    }

    /// Velocity command from the most recent emitting tick.
    pub fn velocity_sample(&self) -> &[f64] {
        &self.velocity_sample
    }
}

fn is_fresh(status: FlowStatus, sample: &[f64], n_dof: usize, port: &str) -> bool {
    status == FlowStatus::NewData && is_usable(sample, n_dof, port)
}

/// Rejects samples that would poison a joint's segment timing.
fn is_usable(sample: &[f64], n_dof: usize, port: &str) -> bool {
    if sample.len() != n_dof {
        tracing::warn!(
            "Ignoring {} sample with {} entries (expected {})",
            port,
            sample.len(),
            n_dof
        );
        return false;
    }
    if let Some(joint) = sample.iter().position(|v| !v.is_finite()) {
        tracing::warn!(
            "Ignoring {} sample with non-finite value {} at joint {}",
            port,
            sample[joint],
            joint
        );
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motion::SlotState;

    /// Host that replays one scripted tick at a time.
    #[derive(Default)]
    struct ScriptedHost {
        time: f64,
        period: f64,
        position: Option<JointVector>,
        velocity: Option<JointVector>,
        command: Option<JointVector>,
        written: Vec<(JointVector, JointVector)>,
        pending_position: Option<JointVector>,
    }

    impl ScriptedHost {
        fn tick(
            &mut self,
            time: f64,
            position: Option<Vec<f64>>,
            velocity: Option<Vec<f64>>,
            command: Option<Vec<f64>>,
        ) {
            self.period = time - self.time;
            self.time = time;
            self.position = position;
            self.velocity = velocity;
            self.command = command;
        }
    }

    fn take(slot: &mut Option<JointVector>, sample: &mut JointVector) -> FlowStatus {
        match slot.take() {
            Some(v) => {
                *sample = v;
                FlowStatus::NewData
            }
            None => FlowStatus::NoData,
        }
    }

    impl CycleHost for ScriptedHost {
        fn time(&self) -> f64 {
            self.time
        }
        fn period(&self) -> f64 {
            self.period
        }
        fn read_position(&mut self, sample: &mut JointVector) -> FlowStatus {
            take(&mut self.position, sample)
        }
        fn read_velocity(&mut self, sample: &mut JointVector) -> FlowStatus {
            take(&mut self.velocity, sample)
        }
        fn read_position_cmd(&mut self, sample: &mut JointVector) -> FlowStatus {
            take(&mut self.command, sample)
        }
        fn write_position(&mut self, sample: &JointVector) {
            self.pending_position = Some(sample.clone());
        }
        fn write_velocity(&mut self, sample: &JointVector) {
            if let Some(position) = self.pending_position.take() {
                self.written.push((position, sample.clone()));
            }
        }
    }

    fn generator(n: usize, alpha: f64) -> JointTrajGenerator {
        let names = (0..n).map(|i| format!("j{i}")).collect();
        let mut g =
            JointTrajGenerator::new(GeneratorConfig::uniform(n, 1.0, 1.0, alpha), names).unwrap();
        g.start();
        g
    }

    #[test]
    fn test_new_rejects_empty_and_mismatched_configs() {
        assert!(matches!(
            JointTrajGenerator::new(GeneratorConfig::default(), Vec::new()),
            Err(ConfigError::NoJoints)
        ));
        assert!(matches!(
            JointTrajGenerator::new(
                GeneratorConfig::uniform(1, 1.0, 1.0, 0.5),
                vec!["a".into(), "b".into()]
            ),
            Err(ConfigError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn test_not_running_is_inactive() {
        let mut g =
            JointTrajGenerator::new(GeneratorConfig::uniform(1, 1.0, 1.0, 1.0), vec!["j0".into()])
                .unwrap();
        let mut host = ScriptedHost::default();
        host.tick(0.1, Some(vec![0.0]), Some(vec![0.0]), Some(vec![1.0]));
        assert_eq!(g.update(&mut host), CycleOutcome::Inactive);
        assert_eq!(g.lifecycle(), LifecycleState::Configured);

        g.start();
        g.stop();
        assert_eq!(g.update(&mut host), CycleOutcome::Inactive);
        assert!(host.written.is_empty());
    }

    #[test]
    fn test_missing_position_changes_nothing() {
        let mut g = generator(1, 1.0);
        let mut host = ScriptedHost::default();
        host.tick(0.1, None, Some(vec![1.0]), Some(vec![1.0]));
        assert_eq!(g.update(&mut host), CycleOutcome::NoPosition);
        assert!(!g.feedback().has_previous_position);
        assert!(g.command().position().is_none());
        assert!(host.written.is_empty());
    }

    #[test]
    fn test_bootstrap_then_finite_difference() {
        let mut g = generator(1, 1.0);
        let mut host = ScriptedHost::default();

        host.tick(0.1, Some(vec![0.0]), None, None);
        assert_eq!(g.update(&mut host), CycleOutcome::Bootstrapping);
        assert!(g.feedback().has_previous_position);
        assert_eq!(g.feedback().previous_position, vec![0.0]);

        host.tick(0.2, Some(vec![0.05]), None, Some(vec![1.0]));
        assert_eq!(g.update(&mut host), CycleOutcome::Emitted { replanned: 1 });
        assert!((g.feedback().velocity[0] - 0.5).abs() < 1e-9);
        assert_eq!(host.written.len(), 1);
        // Segment starts this tick at the measured position
        assert_eq!(host.written[0].0, vec![0.05]);
        assert_eq!(host.written[0].1, vec![0.0]);
    }

    #[test]
    fn test_awaiting_command_skips_history() {
        let mut g = generator(1, 1.0);
        let mut host = ScriptedHost::default();
        host.tick(0.1, Some(vec![0.3]), Some(vec![0.0]), None);
        assert_eq!(g.update(&mut host), CycleOutcome::AwaitingCommand);
        assert!(!g.feedback().has_previous_position);

        // Without a velocity feed the next tick is a bootstrap again
        host.tick(0.2, Some(vec![0.3]), None, None);
        assert_eq!(g.update(&mut host), CycleOutcome::Bootstrapping);
        assert!(host.written.is_empty());
    }

    #[test]
    fn test_stale_command_is_reused() {
        let mut g = generator(1, 1.0);
        let mut host = ScriptedHost::default();
        host.tick(0.1, Some(vec![0.0]), Some(vec![0.0]), Some(vec![0.5]));
        assert_eq!(g.update(&mut host), CycleOutcome::Emitted { replanned: 1 });

        // Segment lasts ~1.414s; after that it replans toward the same target
        host.tick(2.0, Some(vec![0.4]), Some(vec![0.0]), None);
        assert_eq!(g.update(&mut host), CycleOutcome::Emitted { replanned: 1 });
        assert_eq!(g.command().position(), Some(&[0.5][..]));
        let profile = g.slots()[0].profile().unwrap();
        assert_eq!(profile.start(), 0.4);
        assert_eq!(profile.end(), 0.5);
    }

    #[test]
    fn test_command_ignored_while_segment_active() {
        let mut g = generator(1, 1.0);
        let mut host = ScriptedHost::default();
        host.tick(1.0, Some(vec![0.0]), Some(vec![0.0]), Some(vec![3.0]));
        g.update(&mut host);
        host.tick(2.5, Some(vec![1.0]), Some(vec![1.0]), Some(vec![-3.0]));
        assert_eq!(g.update(&mut host), CycleOutcome::Emitted { replanned: 0 });
        assert_eq!(g.command().position(), Some(&[-3.0][..]));
        assert_eq!(g.slots()[0].state(2.5), SlotState::Active);
        // 1.5s into the 0 -> 3 segment
        let (pos, vel) = &host.written[1];
        assert!((pos[0] - 1.0).abs() < 1e-9);
        assert!((vel[0] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_wrong_length_samples_are_ignored() {
        let mut g = generator(2, 1.0);
        let mut host = ScriptedHost::default();
        host.tick(0.1, Some(vec![0.0]), None, None);
        assert_eq!(g.update(&mut host), CycleOutcome::NoPosition);

        host.tick(0.2, Some(vec![0.0, 0.0]), Some(vec![1.0]), None);
        assert_eq!(g.update(&mut host), CycleOutcome::Bootstrapping);

        host.tick(0.3, Some(vec![0.0, 0.0]), None, Some(vec![1.0, 2.0, 3.0]));
        assert_eq!(g.update(&mut host), CycleOutcome::AwaitingCommand);
    }

    #[test]
    fn test_non_finite_samples_are_ignored() {
        let mut g = generator(1, 1.0);
        let mut host = ScriptedHost::default();
        host.tick(0.1, Some(vec![f64::NAN]), Some(vec![0.0]), Some(vec![1.0]));
        assert_eq!(g.update(&mut host), CycleOutcome::NoPosition);

        host.tick(0.2, Some(vec![0.0]), Some(vec![f64::INFINITY]), Some(vec![1.0]));
        assert_eq!(g.update(&mut host), CycleOutcome::Bootstrapping);

        host.tick(0.3, Some(vec![0.0]), Some(vec![0.0]), Some(vec![f64::NAN]));
        assert_eq!(g.update(&mut host), CycleOutcome::AwaitingCommand);
        assert!(g.command().position().is_none());
    }

    #[test]
    fn test_bad_command_does_not_freeze_joint() {
        let mut g = generator(1, 1.0);
        let mut host = ScriptedHost::default();
        host.tick(0.1, Some(vec![0.0]), Some(vec![0.0]), Some(vec![0.5]));
        assert_eq!(g.update(&mut host), CycleOutcome::Emitted { replanned: 1 });

        host.tick(1.0, Some(vec![0.2]), Some(vec![0.0]), Some(vec![f64::NAN]));
        g.update(&mut host);
        assert_eq!(g.command().position(), Some(&[0.5][..]));
        assert!(g.slots()[0].end_time().is_finite());

        host.tick(100.0, Some(vec![0.5]), Some(vec![0.0]), Some(vec![1.0]));
        assert_eq!(g.update(&mut host), CycleOutcome::Emitted { replanned: 1 });
        assert_eq!(g.slots()[0].profile().map(|p| p.end()), Some(1.0));
        assert!(g.slots()[0].end_time().is_finite());
        let (pos, vel) = host.written.last().unwrap();
        assert_eq!(pos, &vec![0.5]);
        assert_eq!(vel, &vec![0.0]);
    }

    #[test]
    fn test_restart_clears_position_history() {
        let mut g = generator(1, 1.0);
        let mut host = ScriptedHost::default();
        host.tick(0.1, Some(vec![0.0]), None, None);
        g.update(&mut host);
        assert!(g.feedback().has_previous_position);
        g.stop();
        g.start();
        assert!(!g.feedback().has_previous_position);
    }
}
