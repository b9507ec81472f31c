//! Fixed-step simulation clock

use std::time::Duration;

use crate::config::ConfigError;

/// Simulation clock advancing one control period per tick.
#[derive(Debug, Clone)]
pub struct SimClock {
    pub current_time: Duration,
    period: Duration,
    ticks: u64,
}

impl SimClock {
    pub fn new(period: Duration) -> Self {
        Self {
            current_time: Duration::from_secs(0),
            period,
            ticks: 0,
        }
    }

    pub fn from_rate(rate_hz: f64) -> Result<Self, ConfigError> {
        match Duration::try_from_secs_f64(1.0 / rate_hz) {
            Ok(period) if !period.is_zero() => Ok(Self::new(period)),
            _ => Err(ConfigError::InvalidSimulation(format!(
                "rate_hz {rate_hz} has no usable period"
            ))),
        }
    }

    pub fn advance(&mut self) {
        self.current_time += self.period;
        self.ticks += 1;
    }

    pub fn seconds(&self) -> f64 {
        self.current_time.as_secs_f64()
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}
