//! Minimum snap trajectory generator
//!
//! Owns the waypoints, runs the duration search once at construction, and
//! answers time-indexed queries for position, its derivatives up to jerk, and
//! a heading-following yaw.

use nalgebra::{DMatrix, DVector, Vector2};

use super::polynomial::basis;
use super::solver::SegmentSolver;
use super::time_allocation::{DurationOptimizer, TimeAllocation};
use super::yaw::{YawConfig, YawEstimator, YawState};
use crate::common::{
    DesiredState, KinematicState, Minimizer, TrajectoryError, TrajectoryQuery, TrajectoryResult,
    Waypoints,
};
use crate::optimization::{NelderMead, NelderMeadConfig};

/// Trajectory generator configuration
#[derive(Debug, Clone)]
pub struct MinSnapConfig {
    /// Coefficients per segment polynomial
    pub order: usize,
    /// Derivative whose squared integral is minimized (4 = snap)
    pub snap_order: usize,
    /// Speed used to seed the duration lower bound [m/s]
    pub max_vel: f64,
    /// Weight of total duration against smoothness
    pub gamma: f64,
    /// Queries past the end are evaluated this long before it [s]
    pub end_epsilon: f64,
    pub search: NelderMeadConfig,
    pub yaw: YawConfig,
}

impl Default for MinSnapConfig {
    fn default() -> Self {
        Self {
            order: 10,
            snap_order: 4,
            max_vel: 5.0,
            gamma: 100.0,
            end_epsilon: 1e-3,
            search: NelderMeadConfig::default(),
            yaw: YawConfig::default(),
        }
    }
}

impl MinSnapConfig {
    pub fn validate(&self) -> TrajectoryResult<()> {
        let invalid = |msg: String| Err(TrajectoryError::InvalidInput(msg));

        if self.snap_order == 0 {
            return invalid("snap order must be at least 1".to_string());
        }
        // waypoint, continuity, rest and free rows only fill a square system for this pairing
        if self.order != 2 * (self.snap_order + 1) {
            return invalid(format!(
                "polynomial order {} does not match snap order {} (expected {})",
                self.order,
                self.snap_order,
                2 * (self.snap_order + 1)
            ));
        }
        if !(self.max_vel.is_finite() && self.max_vel > 0.0) {
            return invalid(format!("max_vel must be positive, got {}", self.max_vel));
        }
        if !(self.gamma.is_finite() && self.gamma >= 0.0) {
            return invalid(format!("gamma must be non-negative, got {}", self.gamma));
        }
        if !(self.end_epsilon.is_finite() && self.end_epsilon > 0.0) {
            return invalid(format!("end_epsilon must be positive, got {}", self.end_epsilon));
        }
        if !(self.yaw.time_step.is_finite() && self.yaw.time_step > 0.0) {
            return invalid(format!("yaw time step must be positive, got {}", self.yaw.time_step));
        }
        if !(self.search.initial_step.is_finite() && self.search.initial_step > 0.0) {
            return invalid(format!(
                "search initial step must be positive, got {}",
                self.search.initial_step
            ));
        }
        if !(self.search.max_step.is_finite() && self.search.max_step > 0.0) {
            return invalid(format!("search max step must be positive, got {}", self.search.max_step));
        }
        Ok(())
    }
}

fn validate_waypoints(waypoints: &Waypoints) -> TrajectoryResult<()> {
    if waypoints.nrows() < 2 {
        return Err(TrajectoryError::InvalidInput(format!(
            "at least 2 waypoints are required, got {}",
            waypoints.nrows()
        )));
    }
    if waypoints.ncols() < 2 {
        return Err(TrajectoryError::InvalidInput(format!(
            "waypoints need at least 2 dimensions for yaw, got {}",
            waypoints.ncols()
        )));
    }
    if waypoints.iter().any(|v| !v.is_finite()) {
        return Err(TrajectoryError::InvalidInput(
            "waypoint coordinates must be finite".to_string(),
        ));
    }
    for i in 0..waypoints.nrows() - 1 {
        if (waypoints.row(i + 1) - waypoints.row(i)).norm() == 0.0 {
            return Err(TrajectoryError::InvalidInput(format!(
                "waypoints {} and {} coincide",
                i,
                i + 1
            )));
        }
    }
    Ok(())
}

/// Minimum snap trajectory through a fixed waypoint sequence
#[derive(Debug, Clone)]
pub struct TrajectoryGenerator {
    waypoints: Waypoints,
    config: MinSnapConfig,
    allocation: TimeAllocation,
    yaw: YawEstimator,
}

impl TrajectoryGenerator {
    /// Optimize a trajectory with the default Nelder-Mead duration search
    pub fn new(waypoints: Waypoints, config: MinSnapConfig) -> TrajectoryResult<Self> {
        let minimizer = NelderMead::new(config.search.clone());
        Self::with_minimizer(waypoints, config, minimizer)
    }

    pub fn with_defaults(waypoints: Waypoints) -> TrajectoryResult<Self> {
        Self::new(waypoints, MinSnapConfig::default())
    }

    /// Optimize a trajectory with a caller-supplied duration search
    pub fn with_minimizer<M: Minimizer>(
        waypoints: Waypoints,
        config: MinSnapConfig,
        minimizer: M,
    ) -> TrajectoryResult<Self> {
        config.validate()?;
        validate_waypoints(&waypoints)?;

        let allocation = {
            let solver = SegmentSolver::new(&waypoints, config.order, config.snap_order);
            DurationOptimizer::new(solver, config.max_vel, config.gamma, minimizer).optimize()?
        };

        tracing::debug!(
            "Minimum snap trajectory: {} segments, duration {:.3}s, cost {:.3}",
            allocation.durations.len(),
            allocation.timestamps[allocation.timestamps.len() - 1],
            allocation.solution.cost
        );

        let yaw = YawEstimator::new(config.yaw.clone());
        Ok(Self {
            waypoints,
            config,
            allocation,
            yaw,
        })
    }

    pub fn waypoints(&self) -> &Waypoints {
        &self.waypoints
    }

    pub fn config(&self) -> &MinSnapConfig {
        &self.config
    }

    pub fn segment_count(&self) -> usize {
        self.allocation.durations.len()
    }

    /// Segment durations T
    pub fn durations(&self) -> &DVector<f64> {
        &self.allocation.durations
    }

    /// Waypoint timestamps TS
    pub fn timestamps(&self) -> &DVector<f64> {
        &self.allocation.timestamps
    }

    /// Stacked coefficients P, (order * segments) x D
    pub fn coefficients(&self) -> &DMatrix<f64> {
        &self.allocation.solution.coefficients
    }

    pub fn cost(&self) -> f64 {
        self.allocation.solution.cost
    }

    /// Full duration search result, including iteration count and convergence
    pub fn time_allocation(&self) -> &TimeAllocation {
        &self.allocation
    }

    pub fn total_duration(&self) -> f64 {
        let ts = &self.allocation.timestamps;
        ts[ts.len() - 1]
    }

    pub fn yaw_state(&self) -> &YawState {
        self.yaw.state()
    }

    /// Restart yaw accumulation, e.g. before replaying from t = 0
    pub fn reset_yaw(&mut self) {
        self.yaw.reset();
    }

    /// Active segment and local time for a query time, after clamping into the trajectory
    pub fn locate(&self, t: f64) -> (usize, f64) {
        let end = self.total_duration();
        let mut t = t.max(0.0);
        if t > end {
            t = (end - self.config.end_epsilon).max(0.0);
        }

        let ts = self.allocation.timestamps.as_slice();
        let segment = ts
            .partition_point(|&stamp| stamp <= t)
            .saturating_sub(1)
            .min(self.segment_count() - 1);
        (segment, t - ts[segment])
    }

    /// k-th derivative of one segment at local time `local_t`
    pub fn segment_derivative(&self, segment: usize, local_t: f64, k: usize) -> DVector<f64> {
        let order = self.config.order;
        let coeffs = self.coefficients().rows(order * segment, order);
        coeffs.transpose() * basis(local_t, k, order)
    }

    /// Position, velocity, acceleration and jerk at `t`, independent of query history
    pub fn evaluate(&self, t: f64) -> KinematicState {
        let (segment, local_t) = self.locate(t);
        KinematicState {
            position: self.segment_derivative(segment, local_t, 0),
            velocity: self.segment_derivative(segment, local_t, 1),
            acceleration: self.segment_derivative(segment, local_t, 2),
            jerk: self.segment_derivative(segment, local_t, 3),
        }
    }

    /// Reference state at `t`; advances the yaw estimator, so issue queries in time order
    pub fn query(&mut self, t: f64) -> DesiredState {
        let state = self.evaluate(t);
        let planar = Vector2::new(state.velocity[0], state.velocity[1]);
        let estimate = self.yaw.update(&planar);
        DesiredState::from_kinematics(state, estimate.yaw, estimate.yaw_rate)
    }

    /// Query at 0, dt, 2 dt, ... while before the end of the trajectory
    pub fn sample(&mut self, dt: f64) -> TrajectoryResult<Vec<DesiredState>> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(TrajectoryError::InvalidInput(format!(
                "sampling step must be positive, got {}",
                dt
            )));
        }
        let end = self.total_duration();
        let mut states = Vec::new();
        let mut iter = 0;
        while end - dt * iter as f64 > 0.0 {
            states.push(self.query(dt * iter as f64));
            iter += 1;
        }
        Ok(states)
    }
}

impl TrajectoryQuery for TrajectoryGenerator {
    fn query(&mut self, t: f64) -> DesiredState {
        TrajectoryGenerator::query(self, t)
    }

    fn total_duration(&self) -> f64 {
        TrajectoryGenerator::total_duration(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rand_distr::{Distribution, Uniform};
    use std::f64::consts::PI;

    fn scenario_waypoints() -> Waypoints {
        DMatrix::from_row_slice(4, 3, &[
            0.0, 0.0, 1.0,
            1.0, 0.0, 3.0,
            5.0, 1.0, 2.0,
            3.0, 4.0, 2.0,
        ])
    }

    fn scenario() -> TrajectoryGenerator {
        TrajectoryGenerator::with_defaults(scenario_waypoints()).unwrap()
    }

    fn assert_invalid(result: TrajectoryResult<TrajectoryGenerator>) {
        match result {
            Err(TrajectoryError::InvalidInput(_)) => {}
            other => panic!("expected InvalidInput, got {:?}", other.map(|g| g.total_duration())),
        }
    }

    #[test]
    fn test_scenario_endpoints() {
        let mut traj = scenario();
        let ts = traj.timestamps().clone();
        let end = traj.total_duration();

        assert_eq!(ts[0], 0.0);
        assert!(end > 0.0);
        assert_eq!(ts.len(), 4);

        let start = traj.query(0.0);
        assert_abs_diff_eq!(start.position, DVector::from_vec(vec![0.0, 0.0, 1.0]), epsilon = 1e-3);
        let finish = traj.query(end - 1e-3);
        assert_abs_diff_eq!(finish.position, DVector::from_vec(vec![3.0, 4.0, 2.0]), epsilon = 1e-3);
    }

    #[test]
    fn test_interpolates_every_waypoint() {
        let traj = scenario();
        let wp = scenario_waypoints();
        for (i, &stamp) in traj.timestamps().iter().enumerate() {
            let position = traj.evaluate(stamp).position;
            for d in 0..3 {
                assert_abs_diff_eq!(position[d], wp[(i, d)], epsilon = 1e-5);
            }
        }
    }

    #[test]
    fn test_derivatives_continuous_at_interior_waypoints() {
        let traj = scenario();
        let durations = traj.durations().clone();
        for i in 1..traj.segment_count() {
            for k in 1..=3 {
                let incoming = traj.segment_derivative(i - 1, durations[i - 1], k);
                let outgoing = traj.segment_derivative(i, 0.0, k);
                let scale = 1.0 + incoming.amax();
                assert_abs_diff_eq!((incoming - outgoing).amax(), 0.0, epsilon = 1e-5 * scale);
            }
        }
    }

    #[test]
    fn test_rest_to_rest() {
        let traj = scenario();
        let start = traj.evaluate(0.0);
        let end = traj.evaluate(traj.total_duration());

        assert_abs_diff_eq!(start.velocity.amax(), 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(start.acceleration.amax(), 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(end.velocity.amax(), 0.0, epsilon = 1e-5);
        assert_abs_diff_eq!(end.acceleration.amax(), 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_durations_respect_velocity_bound() {
        let traj = scenario();
        let wp = scenario_waypoints();
        for i in 0..traj.segment_count() {
            let tmin = (wp.row(i + 1) - wp.row(i)).norm() / traj.config().max_vel;
            assert!(traj.durations()[i] >= tmin - 1e-9);
        }
    }

    #[test]
    fn test_deterministic_construction() {
        let a = scenario();
        let b = scenario();
        assert_eq!(a.durations(), b.durations());
        assert_eq!(a.timestamps(), b.timestamps());
        assert_eq!(a.coefficients(), b.coefficients());
        assert_eq!(a.cost(), b.cost());
    }

    #[test]
    fn test_query_past_end_is_clamped() {
        let mut traj = scenario();
        let end = traj.total_duration();
        let expected = traj.evaluate(end - traj.config().end_epsilon);

        let late = traj.query(end + 5.0);
        assert_eq!(late.kinematics(), expected);
        assert_eq!(traj.locate(-1.0), (0, 0.0));
    }

    #[test]
    fn test_locate_picks_active_segment() {
        let traj = scenario();
        let ts = traj.timestamps().clone();

        assert_eq!(traj.locate(ts[1]).0, 1);
        assert_eq!(traj.locate(ts[1] - 1e-9).0, 0);
        let (segment, local) = traj.locate(ts[3]);
        assert_eq!(segment, 2);
        assert_abs_diff_eq!(local, traj.durations()[2], epsilon = 1e-12);
    }

    #[test]
    fn test_yaw_holds_at_rest_and_stays_wrapped() {
        let mut traj = scenario();
        // no previous heading yet, so the first query cannot turn
        let first = traj.query(0.0);
        assert_eq!(first.yaw, 0.0);
        assert!(first.yaw_rate.abs() <= 30.0);

        traj.reset_yaw();
        let samples = traj.sample(0.005).unwrap();
        for s in &samples {
            assert!(s.yaw > -PI && s.yaw <= PI);
            assert!(s.yaw_rate.abs() <= 30.0);
        }
    }

    #[test]
    fn test_straight_line_heading() {
        let wp = DMatrix::from_row_slice(2, 3, &[0.0, 0.0, 1.0, 4.0, 0.0, 1.0]);
        let mut traj = TrajectoryGenerator::with_defaults(wp).unwrap();
        let mid = traj.total_duration() * 0.5;

        traj.query(0.0);
        let state = traj.query(mid);
        assert!(state.velocity[0] > 0.0);
        assert_eq!(state.velocity[1], 0.0);
        assert_eq!(state.yaw, 0.0);
        assert_eq!(traj.yaw_state().heading, Vector2::new(1.0, 0.0));
    }

    #[test]
    fn test_sample_covers_duration() {
        let mut traj = scenario();
        let end = traj.total_duration();
        let samples = traj.sample(0.05).unwrap();
        assert!((samples.len() as f64 - end / 0.05).abs() <= 1.0);
        assert_eq!(samples[0].position, traj.evaluate(0.0).position);

        assert_invalid_sample(traj.sample(0.0));
    }

    #[test]
    fn test_zero_gamma() {
        // without a duration penalty the snap cost keeps falling as T grows
        let config = MinSnapConfig { gamma: 0.0, ..Default::default() };
        let search = config.search.clone();
        let mut traj = TrajectoryGenerator::new(scenario_waypoints(), config).unwrap();

        let allocation = traj.time_allocation().clone();
        let end = traj.total_duration();
        let n = traj.segment_count() as f64;
        let reach = n * (search.initial_step + search.max_iter as f64 * search.max_step);
        assert!(end.is_finite());
        assert!(end >= allocation.lower_bounds.sum());
        assert!(end <= allocation.lower_bounds.sum() + reach);

        let coarse = traj.sample(1e6).unwrap();
        assert_eq!(coarse.len(), 1);
        traj.reset_yaw();
        let samples = traj.sample(end / 50.0).unwrap();
        assert!((samples.len() as i64 - 50).abs() <= 1);
        assert!(samples.iter().all(|s| s.position.iter().all(|v| v.is_finite())));
    }

    fn assert_invalid_sample(result: TrajectoryResult<Vec<DesiredState>>) {
        assert!(matches!(result, Err(TrajectoryError::InvalidInput(_))));
    }

    #[test]
    fn test_trait_object_consumer() {
        fn final_position(traj: &mut dyn TrajectoryQuery) -> DVector<f64> {
            let end = traj.total_duration();
            traj.query(end).position
        }
        let mut traj = scenario();
        let p = final_position(&mut traj);
        assert_abs_diff_eq!(p, DVector::from_vec(vec![3.0, 4.0, 2.0]), epsilon = 1e-5);
    }

    #[test]
    fn test_rejects_invalid_input() {
        let single = DMatrix::from_row_slice(1, 3, &[0.0, 0.0, 0.0]);
        assert_invalid(TrajectoryGenerator::with_defaults(single));

        let line = DMatrix::from_row_slice(2, 1, &[0.0, 1.0]);
        assert_invalid(TrajectoryGenerator::with_defaults(line));

        let duplicated = DMatrix::from_row_slice(2, 3, &[1.0, 2.0, 3.0, 1.0, 2.0, 3.0]);
        assert_invalid(TrajectoryGenerator::with_defaults(duplicated));

        let non_finite = DMatrix::from_row_slice(2, 3, &[0.0, 0.0, f64::NAN, 1.0, 0.0, 0.0]);
        assert_invalid(TrajectoryGenerator::with_defaults(non_finite));

        let wp = scenario_waypoints();
        let zero_speed = MinSnapConfig { max_vel: 0.0, ..Default::default() };
        assert_invalid(TrajectoryGenerator::new(wp.clone(), zero_speed));

        let negative_gamma = MinSnapConfig { gamma: -1.0, ..Default::default() };
        assert_invalid(TrajectoryGenerator::new(wp.clone(), negative_gamma));

        let mut frozen = MinSnapConfig::default();
        frozen.search.max_step = 0.0;
        assert_invalid(TrajectoryGenerator::new(wp.clone(), frozen));

        let mismatched = MinSnapConfig { order: 9, ..Default::default() };
        assert_invalid(TrajectoryGenerator::new(wp, mismatched));
    }

    #[test]
    fn test_two_waypoints() {
        let wp = DMatrix::from_row_slice(2, 3, &[0.0, 0.0, 0.0, 2.0, 1.0, -1.0]);
        let traj = TrajectoryGenerator::with_defaults(wp).unwrap();
        assert_eq!(traj.segment_count(), 1);
        let end = traj.evaluate(traj.total_duration());
        assert_abs_diff_eq!(end.position, DVector::from_vec(vec![2.0, 1.0, -1.0]), epsilon = 1e-6);
    }

    #[test]
    fn test_minimum_jerk_configuration() {
        let config = MinSnapConfig { order: 8, snap_order: 3, ..Default::default() };
        let traj = TrajectoryGenerator::new(scenario_waypoints(), config).unwrap();
        assert_eq!(traj.coefficients().shape(), (24, 3));
        let p = traj.evaluate(traj.timestamps()[2]).position;
        assert_abs_diff_eq!(p, DVector::from_vec(vec![5.0, 1.0, 2.0]), epsilon = 1e-5);
    }

    #[test]
    fn test_random_planar_waypoints() {
        let mut rng = StdRng::seed_from_u64(7);
        let coordinate = Uniform::new(-5.0, 5.0);
        let data: Vec<f64> = (0..10).map(|_| coordinate.sample(&mut rng)).collect();
        let wp = DMatrix::from_row_slice(5, 2, &data);

        let traj = TrajectoryGenerator::with_defaults(wp.clone()).unwrap();
        assert_eq!(traj.coefficients().shape(), (40, 2));
        for (i, &stamp) in traj.timestamps().iter().enumerate() {
            let position = traj.evaluate(stamp).position;
            assert_abs_diff_eq!(position[0], wp[(i, 0)], epsilon = 1e-4);
            assert_abs_diff_eq!(position[1], wp[(i, 1)], epsilon = 1e-4);
        }
        for w in traj.timestamps().as_slice().windows(2) {
            assert!(w[1] > w[0]);
        }
    }
}
