//! Linear constraint system for piecewise polynomial interpolation
//!
//! Rows of `A` (with `n` segments and `s` = snap order), in order:
//!
//! | rows                | meaning                                              |
//! |---------------------|------------------------------------------------------|
//! | `n`                 | segment i starts at waypoint i                       |
//! | `n`                 | segment i ends at waypoint i + 1                     |
//! | `s * (n - 1)`       | derivatives 1..=s continuous at interior waypoints   |
//! | `s`                 | derivatives 1..=s vanish at the start                |
//! | `s`                 | derivatives 1..=s vanish at the end                  |
//! | `s * (n - 1)`       | free interior derivatives (values chosen by solver)  |
//!
//! which sums to `(2 + 2s) n` and is square only when `order == 2 (s + 1)`.

use nalgebra::{DMatrix, DVector};

use super::polynomial::{basis, basis_all};
use crate::common::Waypoints;

/// Square system `A P = B` for the stacked segment coefficients `P`
#[derive(Debug, Clone)]
pub struct ConstraintSystem {
    pub a: DMatrix<f64>,
    pub b: DMatrix<f64>,
    /// Number of trailing rows whose right-hand side is left to the solver
    pub free_rows: usize,
}

impl ConstraintSystem {
    pub fn fixed_rows(&self) -> usize {
        self.a.nrows() - self.free_rows
    }
}

/// Build the constraint system for `waypoints` traversed with segment `durations`
pub fn constraint_system(
    waypoints: &Waypoints,
    durations: &DVector<f64>,
    order: usize,
    snap_order: usize,
) -> ConstraintSystem {
    let n = durations.len();
    let s = snap_order;
    let dim = waypoints.ncols();
    debug_assert_eq!(waypoints.nrows(), n + 1);
    debug_assert_eq!(order, 2 * (s + 1));

    let size = order * n;
    let mut a = DMatrix::zeros(size, size);
    let mut b = DMatrix::zeros(size, dim);

    b.rows_mut(0, n).copy_from(&waypoints.rows(0, n));
    b.rows_mut(n, n).copy_from(&waypoints.rows(1, n));

    let start = basis(0.0, 0, order).transpose();
    let start_all = basis_all(0.0, s, order);

    // waypoint constraints
    for (i, &duration) in durations.iter().enumerate() {
        a.view_mut((i, order * i), (1, order)).copy_from(&start);
        a.view_mut((n + i, order * i), (1, order))
            .copy_from(&basis(duration, 0, order).transpose());
    }

    // continuity constraints
    let continuity = 2 * n;
    for i in 0..n - 1 {
        let row = continuity + s * i;
        a.view_mut((row, order * i), (s, order))
            .copy_from(&(-basis_all(durations[i], s, order)));
        a.view_mut((row, order * (i + 1)), (s, order)).copy_from(&start_all);
    }

    // start and end at rest
    let rest = continuity + s * (n - 1);
    a.view_mut((rest, 0), (s, order)).copy_from(&start_all);
    a.view_mut((rest + s, order * (n - 1)), (s, order))
        .copy_from(&basis_all(durations[n - 1], s, order));

    // free variables
    let free = rest + 2 * s;
    for i in 1..n {
        a.view_mut((free + s * (i - 1), order * i), (s, order)).copy_from(&start_all);
    }

    ConstraintSystem {
        a,
        b,
        free_rows: s * (n - 1),
    }
}
