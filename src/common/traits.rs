//! Common traits defining interfaces for trajectory generation

use nalgebra::DVector;

use crate::common::types::DesiredState;

/// Outcome of a derivative-free minimization
#[derive(Debug, Clone, PartialEq)]
pub struct MinimizeReport {
    /// Final iterate
    pub x: DVector<f64>,
    /// Objective value at `x`
    pub value: f64,
    pub iterations: usize,
    /// False when the iteration budget ran out first
    pub converged: bool,
}

/// Trait for gradient-free minimizers subject to `x >= lower_bounds`
pub trait Minimizer {
    /// Minimize `objective` starting from `initial`
    fn minimize<F>(
        &self,
        objective: F,
        initial: &DVector<f64>,
        lower_bounds: &DVector<f64>,
    ) -> MinimizeReport
    where
        F: FnMut(&DVector<f64>) -> f64;
}

/// Trait for consumers that only need time-indexed reference states
pub trait TrajectoryQuery {
    /// Reference state at time `t` [s]
    fn query(&mut self, t: f64) -> DesiredState;

    /// Total duration of the trajectory [s]
    fn total_duration(&self) -> f64;
}
