//! Segment time allocation
//!
//! Searches over segment durations above the velocity-derived lower bound
//! `T_min[i] = |w[i+1] - w[i]| / max_vel`, minimizing the snap cost plus a
//! linear penalty `gamma * sum(T)` on total duration.

use itertools::Itertools;
use nalgebra::DVector;

use super::solver::{SegmentSolution, SegmentSolver};
use crate::common::{MinimizeReport, Minimizer, TrajectoryResult, Waypoints};

/// Optimized durations together with the coefficients they produce
#[derive(Debug, Clone, PartialEq)]
pub struct TimeAllocation {
    /// Segment durations T
    pub durations: DVector<f64>,
    /// Cumulative timestamps TS, TS[0] = 0
    pub timestamps: DVector<f64>,
    /// Velocity-derived lower bound on T
    pub lower_bounds: DVector<f64>,
    pub solution: SegmentSolution,
    /// Outcome of the duration search
    pub search: MinimizeReport,
}

/// Lower bound on each segment duration given a speed limit
pub fn minimum_durations(waypoints: &Waypoints, max_vel: f64) -> DVector<f64> {
    let bounds: Vec<f64> = waypoints
        .row_iter()
        .tuple_windows()
        .map(|(from, to)| (to - from).norm() / max_vel)
        .collect();
    DVector::from_vec(bounds)
}

/// Cumulative start time of every waypoint
pub fn cumulative_timestamps(durations: &DVector<f64>) -> DVector<f64> {
    let stamps: Vec<f64> = std::iter::once(0.0)
        .chain(durations.iter().scan(0.0, |elapsed, t| {
            *elapsed += t;
            Some(*elapsed)
        }))
        .collect();
    DVector::from_vec(stamps)
}

/// Outer search over segment durations
pub struct DurationOptimizer<'a, M: Minimizer> {
    solver: SegmentSolver<'a>,
    max_vel: f64,
    gamma: f64,
    minimizer: M,
}

impl<'a, M: Minimizer> DurationOptimizer<'a, M> {
    pub fn new(
        solver: SegmentSolver<'a>,
        max_vel: f64,
        gamma: f64,
        minimizer: M,
    ) -> Self {
        Self {
            solver,
            max_vel,
            gamma,
            minimizer,
        }
    }

    /// Snap cost plus duration penalty, `+inf` where the solver fails
    pub fn objective(&self, durations: &DVector<f64>) -> f64 {
        match self.solver.solve(durations) {
            Ok(solution) => solution.cost + self.gamma * durations.sum(),
            Err(e) => {
                tracing::debug!("Rejecting candidate durations {:?}: {}", durations.as_slice(), e);
                f64::INFINITY
            }
        }
    }

    pub fn optimize(&self) -> TrajectoryResult<TimeAllocation> {
        let lower_bounds = minimum_durations(self.solver.waypoints(), self.max_vel);
        tracing::debug!(
            "Allocating time over {} segments, T_min = {:?}",
            lower_bounds.len(),
            lower_bounds.as_slice()
        );

        let search = self.minimizer.minimize(
            |durations: &DVector<f64>| self.objective(durations),
            &lower_bounds,
            &lower_bounds,
        );
        if !search.converged {
            tracing::warn!(
                "Duration search stopped after {} iterations without converging, keeping last iterate",
                search.iterations
            );
        }

        let durations = search.x.clone();
        let solution = self.solver.solve(&durations)?;
        let timestamps = cumulative_timestamps(&durations);

        tracing::debug!(
            "Duration search finished: T = {:?}, snap cost = {:.3}, objective = {:.3}, iterations = {}, converged = {}",
            durations.as_slice(),
            solution.cost,
            search.value,
            search.iterations,
            search.converged
        );

        Ok(TimeAllocation {
            durations,
            timestamps,
            lower_bounds,
            solution,
            search,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::NelderMead;
    use approx::assert_abs_diff_eq;
    use nalgebra::DMatrix;

    fn scenario_waypoints() -> Waypoints {
        DMatrix::from_row_slice(4, 3, &[
            0.0, 0.0, 1.0,
            1.0, 0.0, 3.0,
            5.0, 1.0, 2.0,
            3.0, 4.0, 2.0,
        ])
    }

    fn optimize(wp: &Waypoints, max_vel: f64, gamma: f64) -> TimeAllocation {
        DurationOptimizer::new(SegmentSolver::new(wp, 10, 4), max_vel, gamma, NelderMead::default())
            .optimize()
            .unwrap()
    }

    #[test]
    fn test_minimum_durations() {
        let wp = DMatrix::from_row_slice(3, 2, &[0.0, 0.0, 3.0, 4.0, 3.0, 6.0]);
        let tmin = minimum_durations(&wp, 2.0);
        assert_eq!(tmin.len(), 2);
        assert_abs_diff_eq!(tmin[0], 2.5, epsilon = 1e-12);
        assert_abs_diff_eq!(tmin[1], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_cumulative_timestamps() {
        let ts = cumulative_timestamps(&DVector::from_vec(vec![1.0, 0.5, 2.0]));
        assert_eq!(ts, DVector::from_vec(vec![0.0, 1.0, 1.5, 3.5]));
    }

    #[test]
    fn test_durations_respect_velocity_bound() {
        let wp = scenario_waypoints();
        let allocation = optimize(&wp, 5.0, 100.0);

        assert_eq!(allocation.durations.len(), 3);
        for (t, tmin) in allocation.durations.iter().zip(allocation.lower_bounds.iter()) {
            assert!(*t >= *tmin - 1e-9);
        }
        assert_eq!(allocation.timestamps[0], 0.0);
        assert_abs_diff_eq!(allocation.timestamps[3], allocation.durations.sum(), epsilon = 1e-12);
    }

    #[test]
    fn test_search_improves_on_lower_bound() {
        let wp = scenario_waypoints();
        let optimizer = DurationOptimizer::new(SegmentSolver::new(&wp, 10, 4), 5.0, 100.0, NelderMead::default());
        let allocation = optimizer.optimize().unwrap();

        let at_bound = optimizer.objective(&allocation.lower_bounds);
        assert!(allocation.search.value <= at_bound);
        assert_abs_diff_eq!(
            allocation.search.value,
            allocation.solution.cost + 100.0 * allocation.durations.sum(),
            epsilon = 1e-6 * allocation.search.value
        );
    }

    #[test]
    fn test_larger_gamma_shortens_trajectory() {
        let wp = scenario_waypoints();
        let relaxed = optimize(&wp, 5.0, 10.0);
        let hurried = optimize(&wp, 5.0, 1000.0);
        assert!(hurried.durations.sum() < relaxed.durations.sum());
    }

    #[test]
    fn test_objective_rejects_singular_candidate() {
        let wp = scenario_waypoints();
        let optimizer = DurationOptimizer::new(SegmentSolver::new(&wp, 10, 4), 5.0, 100.0, NelderMead::default());
        assert_eq!(optimizer.objective(&DVector::from_vec(vec![1.0, 0.0, 1.0])), f64::INFINITY);
    }
}
