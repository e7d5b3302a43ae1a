//! Heading-following yaw reference
//!
//! Yaw is accumulated from the signed angle between consecutive planar
//! velocity directions, so it stays continuous across many turns instead of
//! jumping like `atan2`. The state is a plain value: [`estimate_yaw`] is pure
//! and [`YawEstimator`] just threads the state between calls.

use nalgebra::Vector2;
use std::f64::consts::PI;

use crate::common::{TrajectoryError, TrajectoryResult};

/// Yaw estimator configuration
#[derive(Debug, Clone)]
pub struct YawConfig {
    /// Sampling period assumed when converting a heading change to a rate [s]
    pub time_step: f64,
    /// Yaw rate saturation [rad/s]
    pub max_yaw_rate: f64,
    /// Planar speed below which no heading is defined [m/s]
    pub min_planar_speed: f64,
}

impl Default for YawConfig {
    fn default() -> Self {
        Self {
            time_step: 0.005,
            max_yaw_rate: 30.0,
            min_planar_speed: 1e-6,
        }
    }
}

/// Accumulated yaw and the last unit heading
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YawState {
    /// [rad], in (-pi, pi]
    pub yaw: f64,
    /// Zero until the first non-degenerate heading is seen
    pub heading: Vector2<f64>,
}

impl Default for YawState {
    fn default() -> Self {
        Self {
            yaw: 0.0,
            heading: Vector2::zeros(),
        }
    }
}

/// Yaw and yaw rate for one query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YawEstimate {
    pub yaw: f64,
    pub yaw_rate: f64,
}

/// Unit heading of a planar velocity
pub fn heading(velocity_xy: &Vector2<f64>, min_planar_speed: f64) -> TrajectoryResult<Vector2<f64>> {
    let speed = velocity_xy.norm();
    if !(speed > min_planar_speed) {
        return Err(TrajectoryError::DegenerateHeading(speed));
    }
    Ok(velocity_xy / speed)
}

/// Wrap an angle that is at most one turn out of range into (-pi, pi]
pub fn wrap_once(mut angle: f64) -> f64 {
    if angle > PI {
        angle -= 2.0 * PI;
    }
    if angle <= -PI {
        angle += 2.0 * PI;
    }
    angle
}

fn turn_sign(cross: f64) -> f64 {
    if cross > 0.0 {
        1.0
    } else if cross < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Advance `state` with a new planar velocity
///
/// A degenerate (near-zero) planar velocity holds the previous yaw and
/// heading and reports zero yaw rate.
pub fn estimate_yaw(
    state: &YawState,
    velocity_xy: &Vector2<f64>,
    config: &YawConfig,
) -> (YawState, YawEstimate) {
    let current = match heading(velocity_xy, config.min_planar_speed) {
        Ok(h) => h,
        Err(e) => {
            tracing::trace!("Holding yaw {:.4}: {}", state.yaw, e);
            return (*state, YawEstimate { yaw: state.yaw, yaw_rate: 0.0 });
        }
    };

    let previous = state.heading;
    let cosine = previous.dot(&current).max(-1.0).min(1.0);
    let dyaw = cosine.acos();
    let cross = previous.x * current.y - previous.y * current.x;

    let yaw = wrap_once(state.yaw + turn_sign(cross) * dyaw);
    let yaw_rate = (dyaw / config.time_step)
        .max(-config.max_yaw_rate)
        .min(config.max_yaw_rate);

    (YawState { yaw, heading: current }, YawEstimate { yaw, yaw_rate })
}

/// Stateful wrapper around [`estimate_yaw`]
#[derive(Debug, Clone, Default)]
pub struct YawEstimator {
    config: YawConfig,
    state: YawState,
}

impl YawEstimator {
    pub fn new(config: YawConfig) -> Self {
        Self {
            config,
            state: YawState::default(),
        }
    }

    pub fn state(&self) -> &YawState {
        &self.state
    }

    pub fn reset(&mut self) {
        self.state = YawState::default();
    }

    pub fn update(&mut self, velocity_xy: &Vector2<f64>) -> YawEstimate {
        let (state, estimate) = estimate_yaw(&self.state, velocity_xy, &self.config);
        self.state = state;
        estimate
    }
}
