//! Monomial basis and its time derivatives
//!
//! A segment polynomial is stored lowest-degree first,
//! `p(t) = c_0 + c_1 t + ... + c_{order-1} t^{order-1}`, so its k-th
//! derivative at `t` is the dot product of the coefficients with
//! `basis(t, k, order)`.

use nalgebra::{DMatrix, DVector};

/// i! / (i - k)! for i >= k
pub fn falling_factorial(i: usize, k: usize) -> f64 {
    ((i - k + 1)..=i).map(|m| m as f64).product()
}

/// Coefficient weights of the k-th derivative evaluated at local time `t`
pub fn basis(t: f64, k: usize, order: usize) -> DVector<f64> {
    DVector::from_fn(order, |i, _| {
        if i < k {
            0.0
        } else {
            falling_factorial(i, k) * t.powi((i - k) as i32)
        }
    })
}

/// Derivatives 1..=derivatives stacked as rows of a (derivatives x order) matrix
pub fn basis_all(t: f64, derivatives: usize, order: usize) -> DMatrix<f64> {
    let mut terms = DMatrix::zeros(derivatives, order);
    for k in 1..=derivatives {
        terms.set_row(k - 1, &basis(t, k, order).transpose());
    }
    terms
}
