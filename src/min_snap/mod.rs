//! Minimum Snap Trajectory Generation Module
//!
//! Fits one polynomial per segment and per axis through an ordered waypoint
//! sequence, minimizing the integral of squared snap, with the vehicle at
//! rest at both ends. Segment durations are chosen by an outer derivative-free
//! search that trades smoothness against total time.
//!
//! # Components
//!
//! - `polynomial`: monomial basis and its derivatives
//! - `cost`: block-diagonal snap cost matrix
//! - `constraints`: interpolation, continuity and rest constraints
//! - `solver`: coefficients for fixed durations (free derivative elimination)
//! - `time_allocation`: search over segment durations
//! - `yaw`: heading-following yaw reference
//! - `generator`: orchestrator and query interface
//!
//! # Example
//!
//! ```no_run
//! use min_snap_planner::min_snap::{MinSnapConfig, TrajectoryGenerator};
//! use nalgebra::DMatrix;
//!
//! let waypoints = DMatrix::from_row_slice(4, 3, &[
//!     0.0, 0.0, 1.0,
//!     1.0, 0.0, 3.0,
//!     5.0, 1.0, 2.0,
//!     3.0, 4.0, 2.0,
//! ]);
//! let mut traj = TrajectoryGenerator::new(waypoints, MinSnapConfig::default()).unwrap();
//!
//! let state = traj.query(0.5 * traj.total_duration());
//! println!("{} {}", state.position, state.yaw);
//! ```
//!
//! # References
//!
//! - D. Mellinger and V. Kumar, "Minimum Snap Trajectory Generation and Control for Quadrotors"

pub mod polynomial;
pub mod cost;
pub mod constraints;
pub mod solver;
pub mod time_allocation;
pub mod yaw;
pub mod generator;

// Re-exports
pub use polynomial::{basis, basis_all};
pub use cost::cost_matrix;
pub use constraints::{constraint_system, ConstraintSystem};
pub use solver::{SegmentSolution, SegmentSolver};
pub use time_allocation::{cumulative_timestamps, minimum_durations, DurationOptimizer, TimeAllocation};
pub use yaw::{estimate_yaw, YawConfig, YawEstimate, YawEstimator, YawState};
pub use generator::{MinSnapConfig, TrajectoryGenerator};
