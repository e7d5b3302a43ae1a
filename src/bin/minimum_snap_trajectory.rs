//! Minimum snap trajectory example
//!
//! Optimizes a trajectory through four 3D waypoints, samples it at a fixed
//! step and plots the sampled positions against the waypoints.

use min_snap_planner::common::TrajectoryResult;
use min_snap_planner::min_snap::{MinSnapConfig, TrajectoryGenerator};
use min_snap_planner::utils::{colors, PathStyle, PointStyle, Visualizer};
use nalgebra::DMatrix;
use tracing_subscriber::EnvFilter;

const DT: f64 = 0.05; // sampling step [s]
const OUTPUT_DIR: &str = "img/min_snap";

fn main() -> TrajectoryResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    tracing::info!("Minimum snap trajectory start!!");

    let waypoints = DMatrix::from_row_slice(4, 3, &[
        0.0, 0.0, 1.0,
        1.0, 0.0, 3.0,
        5.0, 1.0, 2.0,
        3.0, 4.0, 2.0,
    ]);
    let config = MinSnapConfig {
        max_vel: 5.0,
        gamma: 100.0,
        ..Default::default()
    };

    let mut traj = TrajectoryGenerator::new(waypoints.clone(), config)?;
    let allocation = traj.time_allocation();
    tracing::info!(
        "Durations {:?}, total {:.3}s, snap cost {:.3} ({} search iterations, converged: {})",
        traj.durations().as_slice(),
        traj.total_duration(),
        traj.cost(),
        allocation.search.iterations,
        allocation.search.converged
    );

    let path = traj.sample(DT)?;
    tracing::info!("Sampled {} states every {}s", path.len(), DT);
    if let Some(last) = path.last() {
        tracing::info!(
            "Final sample: position {:?}, yaw {:.3} rad",
            last.position.as_slice(),
            last.yaw
        );
    }

    let heights = waypoints.column(2);
    let mut vis = Visualizer::new();
    vis.set_title("Minimum Snap Trajectory")
        .set_z_range(heights.min() - 1.0, heights.max() + 1.0);
    vis.plot_waypoints(&waypoints);
    vis.plot_trajectory_line(&path, &PathStyle::new(colors::TRAJECTORY, "Trajectory"));
    vis.plot_trajectory(&path[..1], &PointStyle::new(colors::START, "Start").with_symbol('S').with_size(2.0));
    vis.plot_trajectory(&path[path.len() - 1..], &PointStyle::new(colors::GOAL, "Goal").with_symbol('T').with_size(2.0));

    if let Err(e) = std::fs::create_dir_all(OUTPUT_DIR) {
        tracing::warn!("Cannot create {}: {}", OUTPUT_DIR, e);
    }
    let output_path = format!("{}/minimum_snap_trajectory.png", OUTPUT_DIR);
    match vis.save_png(&output_path, 800, 600) {
        Ok(()) => tracing::info!("Plot saved to: {}", output_path),
        Err(e) => tracing::warn!("Failed to save plot: {}", e),
    }
    if let Err(e) = vis.show() {
        tracing::warn!("Failed to show plot: {}", e);
    }

    tracing::info!("Minimum snap trajectory finish!!");
    Ok(())
}
