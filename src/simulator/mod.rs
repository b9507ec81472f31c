//! Closed-loop simulation of the generator against simulated joints.
//!
//! Each tick publishes the scheduled target and the joint feedback on the
//! generator's input ports, runs one update, and feeds whatever command was
//! written back into the joint model.

pub mod clock;
pub mod plant;

pub use clock::SimClock;
pub use plant::{JointPlant, TargetSchedule};

use crossbeam_channel::{Receiver, Sender};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::JointVector;
use crate::config::{Config, ConfigError, SimulationConfig};
use crate::generator::{CycleOutcome, JointTrajGenerator};
use crate::scheduler::PortHost;

/// One joint's state on one tick, as written to the CSV trace.
#[derive(Debug, Clone, Serialize)]
pub struct SimRecord {
    pub tick: u64,
    pub time: f64,
    pub joint: String,
    pub outcome: &'static str,
    pub target: Option<f64>,
    pub plant_position: f64,
    pub plant_velocity: f64,
    pub estimated_velocity: f64,
    pub command_position: Option<f64>,
    pub command_velocity: Option<f64>,
}

/// End-of-run statistics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SimSummary {
    pub ticks: u64,
    pub emitted_ticks: u64,
    pub replans: u64,
    pub final_position: Vec<f64>,
    /// |target - position| per joint at the end of the run
    pub final_error: Vec<f64>,
    pub peak_command_velocity: Vec<f64>,
}

pub struct Simulation {
    generator: JointTrajGenerator,
    host: PortHost,
    clock: SimClock,
    plant: JointPlant,
    schedule: TargetSchedule,
    settings: SimulationConfig,
    rng: StdRng,
    position_tx: Sender<JointVector>,
    velocity_tx: Sender<JointVector>,
    command_tx: Sender<JointVector>,
    position_rx: Receiver<JointVector>,
    velocity_rx: Receiver<JointVector>,
    target: Option<JointVector>,
    summary: SimSummary,
}

impl Simulation {
    /// Build a simulation from the `[simulation]` section, or defaults if it
    /// is absent.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let mut generator = JointTrajGenerator::configure(config)?;
        let settings = config.simulation.clone().unwrap_or_default();
        let n_dof = generator.n_dof();
        settings.validate(n_dof)?;

        let mut host = PortHost::new();
        let position_tx = host.joint_position_in.connect()?;
        let velocity_tx = host.joint_velocity_in.connect()?;
        let command_tx = host.joint_position_cmd_in.connect()?;
        let position_rx = host.joint_position_out.connect();
        let velocity_rx = host.joint_velocity_out.connect();

        let initial = settings
            .initial_position
            .clone()
            .unwrap_or_else(|| vec![0.0; n_dof]);
        generator.start();

        tracing::info!(
            "Simulating {} joints at {} Hz for {}s ({} targets)",
            n_dof,
            settings.rate_hz,
            settings.duration,
            settings.targets.len()
        );
        Ok(Self {
            generator,
            host,
            clock: SimClock::from_rate(settings.rate_hz)?,
            plant: JointPlant::new(initial, settings.tracking_gain),
            schedule: TargetSchedule::new(settings.targets.clone()),
            rng: StdRng::seed_from_u64(settings.seed),
            settings,
            position_tx,
            velocity_tx,
            command_tx,
            position_rx,
            velocity_rx,
            target: None,
            summary: SimSummary {
                peak_command_velocity: vec![0.0; n_dof],
                ..SimSummary::default()
            },
        })
    }

    pub fn is_finished(&self) -> bool {
        self.clock.seconds() > self.settings.duration
    }

    /// Run a single control tick.
    pub fn step(&mut self) -> Vec<SimRecord> {
        let time = self.clock.seconds();
        let dt = self.clock.period().as_secs_f64();

        if let Some(target) = self.schedule.due(time) {
            let target = target.to_vec();
            tracing::info!("t={:.3}: new target {:?}", time, target);
            let _ = self.command_tx.send(target.clone());
            self.target = Some(target);
        }

        let dropout = self.settings.position_dropout;
        if dropout == 0.0 || self.rng.random::<f64>() >= dropout {
            let measured = self.plant.measure(&mut self.rng, self.settings.sensor_noise);
            let _ = self.position_tx.send(measured);
        }
        if self.settings.velocity_feedback {
            let _ = self.velocity_tx.send(self.plant.velocity().to_vec());
        }

        self.host.begin_cycle(time, dt);
        let outcome = self.generator.update(&mut self.host);

        let position_cmd = self.position_rx.try_iter().last();
        let velocity_cmd = self.velocity_rx.try_iter().last();
        let command = position_cmd.zip(velocity_cmd);
        self.plant.apply(
            command.as_ref().map(|(p, v)| (p.as_slice(), v.as_slice())),
            dt,
        );

        let records = self.records(time, outcome, command.as_ref());
        self.tally(outcome, command.as_ref());
        self.clock.advance();
        records
    }

    /// Run until the configured duration has elapsed.
    pub fn run(&mut self) -> Vec<SimRecord> {
        let mut records = Vec::new();
        while !self.is_finished() {
            records.extend(self.step());
        }
        records
    }

    fn records(
        &self,
        time: f64,
        outcome: CycleOutcome,
        command: Option<&(JointVector, JointVector)>,
    ) -> Vec<SimRecord> {
        let feedback = self.generator.feedback();
        self.generator
            .joint_names()
            .iter()
            .enumerate()
            .map(|(i, name)| SimRecord {
                tick: self.clock.ticks(),
                time,
                joint: name.clone(),
                outcome: outcome.as_str(),
                target: self.target.as_ref().map(|t| t[i]),
                plant_position: self.plant.position()[i],
                plant_velocity: self.plant.velocity()[i],
                estimated_velocity: feedback.velocity[i],
                command_position: command.map(|(p, _)| p[i]),
                command_velocity: command.map(|(_, v)| v[i]),
            })
            .collect()
    }

    fn tally(&mut self, outcome: CycleOutcome, command: Option<&(JointVector, JointVector)>) {
        self.summary.ticks += 1;
        if let CycleOutcome::Emitted { replanned } = outcome {
            self.summary.emitted_ticks += 1;
            self.summary.replans += replanned as u64;
        }
        if let Some((_, velocity)) = command {
            for (peak, v) in self.summary.peak_command_velocity.iter_mut().zip(velocity) {
                *peak = peak.max(v.abs());
            }
        }
    }

    pub fn summary(&self) -> SimSummary {
        let position = self.plant.position().to_vec();
        let final_error = match &self.target {
            Some(target) => target.iter().zip(&position).map(|(t, p)| (t - p).abs()).collect(),
            None => Vec::new(),
        };
        SimSummary {
            final_position: position,
            final_error,
            ..self.summary.clone()
        }
    }

    pub fn generator(&self) -> &JointTrajGenerator {
        &self.generator
    }

    pub fn plant(&self) -> &JointPlant {
        &self.plant
    }

    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    pub fn settings(&self) -> &SimulationConfig {
        &self.settings
    }
}
