// src/motion/velocity.rs - Joint velocity estimation

/// Per-joint velocity for this cycle.
///
/// A measured velocity is trusted as-is. Without one, the finite difference of
/// the two latest positions is blended into the previous estimate with
/// smoothing factor `alpha` (1.0 = raw difference, 0.0 = hold previous).
///
/// Callers only invoke this once a valid previous position exists.
pub fn estimate_velocity(
    measured: Option<f64>,
    position: f64,
    previous_position: f64,
    previous_estimate: f64,
    dt: f64,
    alpha: f64,
) -> f64 {
    if let Some(velocity) = measured {
        return velocity;
    }
    // A zero or bogus period carries no rate information
    if !dt.is_finite() || dt <= 0.0 {
        return previous_estimate;
    }
    alpha * (position - previous_position) / dt + (1.0 - alpha) * previous_estimate
}

/// Update `estimate` in place for every joint.
///
/// `measured`, when present, must have the same length as `position`.
pub fn estimate_joint_velocities(
    estimate: &mut [f64],
    measured: Option<&[f64]>,
    position: &[f64],
    previous_position: &[f64],
    dt: f64,
    alpha: f64,
) {
    for (i, v) in estimate.iter_mut().enumerate() {
        *v = estimate_velocity(
            measured.map(|m| m[i]),
            position[i],
            previous_position[i],
            *v,
            dt,
            alpha,
        );
    }
}
