//! Error types for min_snap_planner

use thiserror::Error;

/// Main error type for trajectory generation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrajectoryError {
    /// Rejected configuration or waypoint set, raised before any optimization runs
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// Constraint system (or its free block) could not be inverted
    #[error("Singular system: {0}")]
    SingularSystem(String),
    /// Planar velocity too small to define a heading
    #[error("Degenerate heading: planar speed {0} is too small to normalize")]
    DegenerateHeading(f64),
}

/// Result type alias for trajectory operations
pub type TrajectoryResult<T> = Result<T, TrajectoryError>;
