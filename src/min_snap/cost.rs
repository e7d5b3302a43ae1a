//! Quadratic snap cost
//!
//! For a stacked coefficient vector `c`, `c^T Q c` equals twice the integral of
//! the squared `snap_order`-th derivative over every segment.

use nalgebra::{DMatrix, DVector};

use super::polynomial::falling_factorial;

/// Block-diagonal cost matrix of size (order * n) x (order * n), one block per segment
pub fn cost_matrix(durations: &DVector<f64>, order: usize, snap_order: usize) -> DMatrix<f64> {
    let n = durations.len();
    let mut q = DMatrix::zeros(order * n, order * n);

    for (k, &duration) in durations.iter().enumerate() {
        let offset = order * k;
        for i in snap_order..order {
            for j in snap_order..order {
                let pow = i + j - 2 * snap_order + 1;
                q[(offset + i, offset + j)] = 2.0
                    * falling_factorial(i, snap_order)
                    * falling_factorial(j, snap_order)
                    * duration.powi(pow as i32)
                    / pow as f64;
            }
        }
    }

    q
}
