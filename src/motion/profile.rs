// src/motion/profile.rs
/// One-dimensional trapezoidal velocity profile between two positions.
///
/// The profile always starts and ends at rest. When the distance is too short
/// to reach the velocity limit the cruise phase vanishes and the profile
/// degenerates into a triangle with a lower peak velocity.
#[derive(Debug, Clone, PartialEq)]
pub struct TrapezoidalProfile {
    /// Start position
    start: f64,

    /// End position
    end: f64,

    /// Maximum velocity (units/s)
    max_velocity: f64,

    /// Maximum acceleration (units/s²)
    max_acceleration: f64,

    /// +1.0, -1.0, or 0.0 for a zero-length move
    direction: f64,

    /// Phase layout chosen at planning time
    shape: ProfileShape,

    /// Total duration (s)
    duration: f64,
}

/// Phase layout of a planned profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProfileShape {
    /// Start and end coincide; the profile never moves.
    Stationary,

    /// Accelerate, cruise at the velocity limit, decelerate.
    Trapezoidal {
        accel_time: f64,
        cruise_time: f64,
    },

    /// Accelerate straight into deceleration, peaking below the limit.
    Triangular { peak_velocity: f64 },
}

/// Position/velocity/acceleration at one instant of a profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfileSample {
    pub position: f64,
    pub velocity: f64,
    pub acceleration: f64,
}

impl TrapezoidalProfile {
    /// Plan a rest-to-rest move from `start` to `end`.
    ///
    /// `max_velocity` and `max_acceleration` must be positive; configuration
    /// validation guarantees this before any profile is planned.
    pub fn plan(start: f64, end: f64, max_velocity: f64, max_acceleration: f64) -> Self {
        let displacement = end - start;
        let distance = displacement.abs();

        if distance == 0.0 {
            return Self {
                start,
                end,
                max_velocity,
                max_acceleration,
                direction: 0.0,
                shape: ProfileShape::Stationary,
                duration: 0.0,
            };
        }

        let direction = displacement.signum();
        // Distance covered by accelerating to the limit and straight back to rest
        let switch_distance = max_velocity * max_velocity / max_acceleration;

        let (shape, duration) = if distance >= switch_distance {
            let accel_time = max_velocity / max_acceleration;
            let cruise_time = (distance - switch_distance) / max_velocity;
            (
                ProfileShape::Trapezoidal {
                    accel_time,
                    cruise_time,
                },
                2.0 * accel_time + cruise_time,
            )
        } else {
            let peak_velocity = (distance * max_acceleration).sqrt();
            (
                ProfileShape::Triangular { peak_velocity },
                2.0 * (distance / max_acceleration).sqrt(),
            )
        };

        Self {
            start,
            end,
            max_velocity,
            max_acceleration,
            direction,
            shape,
            duration,
        }
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    pub fn shape(&self) -> ProfileShape {
        self.shape
    }

    pub fn max_velocity(&self) -> f64 {
        self.max_velocity
    }

    pub fn max_acceleration(&self) -> f64 {
        self.max_acceleration
    }

    /// Highest speed reached anywhere in the profile.
    pub fn peak_velocity(&self) -> f64 {
        match self.shape {
            ProfileShape::Stationary => 0.0,
            ProfileShape::Trapezoidal { .. } => self.max_velocity,
            ProfileShape::Triangular { peak_velocity } => peak_velocity,
        }
    }

    /// Sample the profile `t` seconds after its start.
    ///
    /// Outside `[0, duration]` the sample saturates to the nearest endpoint at
    /// rest, so this is safe to call at any elapsed time.
    pub fn sample(&self, t: f64) -> ProfileSample {
        if t < 0.0 {
            return self.at_rest(self.start);
        }
        if t > self.duration {
            return self.at_rest(self.end);
        }

        let s = self.direction;
        let a = self.max_acceleration;

        match self.shape {
            ProfileShape::Trapezoidal {
                accel_time,
                cruise_time,
            } => {
                if t <= accel_time {
                    return self.accelerating(t);
                }
                if t <= accel_time + cruise_time {
                    let switch_distance = self.max_velocity * self.max_velocity / a;
                    return ProfileSample {
                        position: self.start
                            + s * (switch_distance / 2.0 + self.max_velocity * (t - accel_time)),
                        velocity: s * self.max_velocity,
                        acceleration: 0.0,
                    };
                }
            }
            ProfileShape::Triangular { .. } => {
                if t <= self.duration / 2.0 {
                    return self.accelerating(t);
                }
            }
            ProfileShape::Stationary => return self.at_rest(self.start),
        }

        // Deceleration mirrors acceleration backwards from the end
        let remaining = self.duration - t;
        ProfileSample {
            position: self.end - s * (0.5 * a * remaining * remaining),
            velocity: s * a * remaining,
            acceleration: -s * a,
        }
    }

    fn accelerating(&self, t: f64) -> ProfileSample {
        let s = self.direction;
        let a = self.max_acceleration;
        ProfileSample {
            position: self.start + s * (0.5 * a * t * t),
            velocity: s * a * t,
            acceleration: s * a,
        }
    }

    fn at_rest(&self, position: f64) -> ProfileSample {
        ProfileSample {
            position,
            velocity: 0.0,
            acceleration: 0.0,
        }
    }
}
