//! Minimum snap coefficients for fixed segment durations
//!
//! The constraint matrix is factorized once per duration vector. Its inverse
//! `M` maps the right-hand side (fixed waypoint/boundary values stacked on top
//! of the free interior derivatives) to coefficients, so the cost becomes a
//! quadratic form in the right-hand side, `R = M^T Q M`. Minimizing it over the
//! free block gives `B_free = -R_pp^{-1} R_fp^T B_fixed`.

use nalgebra::{DMatrix, DVector};

use super::constraints::constraint_system;
use super::cost::cost_matrix;
use crate::common::{TrajectoryError, TrajectoryResult, Waypoints};

/// Coefficients and cost for one duration vector
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentSolution {
    /// (order * n) x D, segment i occupies rows order*i .. order*(i+1)
    pub coefficients: DMatrix<f64>,
    /// trace(P^T Q P)
    pub cost: f64,
}

/// Solves the equality-constrained snap minimization for given segment durations
#[derive(Debug, Clone)]
pub struct SegmentSolver<'a> {
    waypoints: &'a Waypoints,
    order: usize,
    snap_order: usize,
}

impl<'a> SegmentSolver<'a> {
    pub fn new(waypoints: &'a Waypoints, order: usize, snap_order: usize) -> Self {
        Self {
            waypoints,
            order,
            snap_order,
        }
    }

    pub fn waypoints(&self) -> &'a Waypoints {
        self.waypoints
    }

    pub fn segment_count(&self) -> usize {
        self.waypoints.nrows() - 1
    }

    pub fn solve(&self, durations: &DVector<f64>) -> TrajectoryResult<SegmentSolution> {
        let n = self.segment_count();
        if durations.len() != n {
            return Err(TrajectoryError::InvalidInput(format!(
                "expected {} segment durations, got {}",
                n,
                durations.len()
            )));
        }
        if let Some((i, t)) = durations
            .iter()
            .enumerate()
            .find(|(_, t)| !(t.is_finite() && **t > 0.0))
        {
            return Err(TrajectoryError::SingularSystem(format!(
                "segment {} has non-positive duration {}",
                i, t
            )));
        }

        let q = cost_matrix(durations, self.order, self.snap_order);
        let system = constraint_system(self.waypoints, durations, self.order, self.snap_order);
        let fixed = system.fixed_rows();
        let free = system.free_rows;
        let mut b = system.b;

        let inv_a = system.a.lu().try_inverse().ok_or_else(|| {
            TrajectoryError::SingularSystem("constraint matrix is not invertible".to_string())
        })?;
        if inv_a.iter().any(|v| !v.is_finite()) {
            return Err(TrajectoryError::SingularSystem(
                "constraint matrix inverse is not finite".to_string(),
            ));
        }

        if free != 0 {
            let r = inv_a.transpose() * &q * &inv_a;
            let r_fp = r.view((0, fixed), (fixed, free));
            let r_pp = r.view((fixed, fixed), (free, free)).clone_owned();
            let rhs = r_fp.transpose() * b.rows(0, fixed);

            let solved = match r_pp.clone().cholesky() {
                Some(chol) => Some(chol.solve(&rhs)),
                None => r_pp.lu().solve(&rhs),
            }
            .ok_or_else(|| {
                TrajectoryError::SingularSystem("free derivative block is not invertible".to_string())
            })?;

            b.rows_mut(fixed, free).copy_from(&(-solved));
        }

        let coefficients = &inv_a * &b;
        let cost = (coefficients.transpose() * &q * &coefficients).trace();

        if !cost.is_finite() || coefficients.iter().any(|v| !v.is_finite()) {
            return Err(TrajectoryError::SingularSystem(
                "solution is not finite".to_string(),
            ));
        }

        Ok(SegmentSolution { coefficients, cost })
    }
}
