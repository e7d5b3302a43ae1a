//! MinSnapPlanner - minimum snap trajectory generation in Rust
//!
//! This crate computes smooth, time-parameterized polynomial trajectories
//! through waypoints for vehicles such as quadrotors, and serves
//! position, velocity, acceleration, jerk and yaw references at any time.

// Core modules
pub mod common;
pub mod utils;
pub mod optimization;

// Algorithm modules
pub mod min_snap;

// Re-export common types for convenience
pub use common::{DesiredState, KinematicState, Waypoints};
pub use common::{Minimizer, TrajectoryQuery};
pub use common::{TrajectoryError, TrajectoryResult};
pub use min_snap::{MinSnapConfig, TrajectoryGenerator};
