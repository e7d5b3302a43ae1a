//! Common types used throughout min_snap_planner

use nalgebra::{DMatrix, DVector, Vector3};

/// Ordered waypoints, one row per point and one column per dimension
pub type Waypoints = DMatrix<f64>;

/// Build a waypoint matrix from 3D points
pub fn waypoints_from_points(points: &[Vector3<f64>]) -> Waypoints {
    DMatrix::from_fn(points.len(), 3, |i, j| points[i][j])
}

/// Position and its first three time derivatives at one instant
#[derive(Debug, Clone, PartialEq)]
pub struct KinematicState {
    pub position: DVector<f64>,
    pub velocity: DVector<f64>,
    pub acceleration: DVector<f64>,
    pub jerk: DVector<f64>,
}

/// Reference state returned by a trajectory query
#[derive(Debug, Clone, PartialEq)]
pub struct DesiredState {
    pub position: DVector<f64>,
    pub velocity: DVector<f64>,
    pub acceleration: DVector<f64>,
    pub jerk: DVector<f64>,
    /// Heading angle [rad], wrapped to (-pi, pi]
    pub yaw: f64,
    /// Heading rate [rad/s]
    pub yaw_rate: f64,
}

impl DesiredState {
    pub fn from_kinematics(state: KinematicState, yaw: f64, yaw_rate: f64) -> Self {
        Self {
            position: state.position,
            velocity: state.velocity,
            acceleration: state.acceleration,
            jerk: state.jerk,
            yaw,
            yaw_rate,
        }
    }

    pub fn kinematics(&self) -> KinematicState {
        KinematicState {
            position: self.position.clone(),
            velocity: self.velocity.clone(),
            acceleration: self.acceleration.clone(),
            jerk: self.jerk.clone(),
        }
    }
}
