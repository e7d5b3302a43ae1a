//! Utility modules for min_snap_planner

pub mod visualization;

pub use visualization::{Visualizer, PathStyle, PointStyle, colors};
