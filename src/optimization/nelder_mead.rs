//! Bounded Nelder-Mead simplex search
//!
//! Derivative-free minimization of a scalar objective subject to simple
//! lower bounds `x >= lb`. Every trial point is projected onto the feasible
//! box before it is evaluated, so the objective never sees an infeasible
//! point. The search is fully deterministic.

use nalgebra::DVector;
use ordered_float::OrderedFloat;

use crate::common::{MinimizeReport, Minimizer};

/// Nelder-Mead configuration
#[derive(Debug, Clone)]
pub struct NelderMeadConfig {
    /// Maximum simplex iterations
    pub max_iter: usize,
    /// Edge length of the initial simplex
    pub initial_step: f64,
    /// Largest distance a trial point may lie from the centroid (infinity norm)
    pub max_step: f64,
    /// Convergence threshold on simplex diameter (infinity norm)
    pub x_tolerance: f64,
    /// Convergence threshold on spread of vertex values
    pub f_tolerance: f64,
    pub reflection: f64,
    pub expansion: f64,
    pub contraction: f64,
    pub shrink: f64,
}

impl Default for NelderMeadConfig {
    fn default() -> Self {
        Self {
            max_iter: 1000,
            initial_step: 1.0,
            max_step: 2.0,
            x_tolerance: 1e-4,
            f_tolerance: 1e-6,
            reflection: 1.0,
            expansion: 2.0,
            contraction: 0.5,
            shrink: 0.5,
        }
    }
}

#[derive(Debug, Clone)]
struct Vertex {
    x: DVector<f64>,
    value: f64,
}

/// Bounded Nelder-Mead minimizer
#[derive(Debug, Clone, Default)]
pub struct NelderMead {
    config: NelderMeadConfig,
}

impl NelderMead {
    pub fn new(config: NelderMeadConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &NelderMeadConfig {
        &self.config
    }

    fn project(x: DVector<f64>, lower_bounds: &DVector<f64>) -> DVector<f64> {
        x.sup(lower_bounds)
    }

    /// Trial point `centroid + coef * direction`, shortened to `max_step` and projected
    fn trial(
        &self,
        centroid: &DVector<f64>,
        direction: DVector<f64>,
        coef: f64,
        lower_bounds: &DVector<f64>,
    ) -> DVector<f64> {
        let mut delta = direction * coef;
        let length = delta.amax();
        if length > self.config.max_step {
            delta *= self.config.max_step / length;
        }
        Self::project(centroid + delta, lower_bounds)
    }

    fn converged(&self, simplex: &[Vertex]) -> bool {
        let best = &simplex[0];
        let worst = &simplex[simplex.len() - 1];
        let spread = (worst.value - best.value).abs();
        // an all-infinite simplex has no usable spread
        if !spread.is_finite() || spread > self.config.f_tolerance {
            return false;
        }
        let diameter = simplex[1..]
            .iter()
            .map(|v| (&v.x - &best.x).amax())
            .fold(0.0, f64::max);
        diameter <= self.config.x_tolerance
    }
}

impl Minimizer for NelderMead {
    fn minimize<F>(
        &self,
        mut objective: F,
        initial: &DVector<f64>,
        lower_bounds: &DVector<f64>,
    ) -> MinimizeReport
    where
        F: FnMut(&DVector<f64>) -> f64,
    {
        let cfg = &self.config;
        let dim = initial.len();

        let mut eval = |x: DVector<f64>| -> Vertex {
            let value = objective(&x);
            let value = if value.is_finite() { value } else { f64::INFINITY };
            Vertex { x, value }
        };

        let origin = Self::project(initial.clone(), lower_bounds);
        let mut simplex = Vec::with_capacity(dim + 1);
        simplex.push(eval(origin.clone()));
        for i in 0..dim {
            let mut x = origin.clone();
            x[i] += cfg.initial_step;
            simplex.push(eval(Self::project(x, lower_bounds)));
        }

        let mut iterations = 0;
        let mut converged = false;

        while iterations < cfg.max_iter {
            simplex.sort_by_key(|v| OrderedFloat(v.value));
            if self.converged(&simplex) {
                converged = true;
                break;
            }
            iterations += 1;
            tracing::trace!("iteration {}: best {:.6}", iterations, simplex[0].value);

            let worst = dim;
            let centroid = simplex[..worst]
                .iter()
                .fold(DVector::zeros(dim), |acc, v| acc + &v.x)
                / dim as f64;

            let reflected = eval(self.trial(
                &centroid,
                &centroid - &simplex[worst].x,
                cfg.reflection,
                lower_bounds,
            ));

            if reflected.value < simplex[0].value {
                let expanded = eval(self.trial(
                    &centroid,
                    &reflected.x - &centroid,
                    cfg.expansion,
                    lower_bounds,
                ));
                simplex[worst] = if expanded.value < reflected.value { expanded } else { reflected };
                continue;
            }

            if reflected.value < simplex[worst - 1].value {
                simplex[worst] = reflected;
                continue;
            }

            let contracted = if reflected.value < simplex[worst].value {
                // outside contraction
                let c = eval(self.trial(
                    &centroid,
                    &reflected.x - &centroid,
                    cfg.contraction,
                    lower_bounds,
                ));
                if c.value <= reflected.value { Some(c) } else { None }
            } else {
                // inside contraction
                let c = eval(self.trial(
                    &centroid,
                    &simplex[worst].x - &centroid,
                    cfg.contraction,
                    lower_bounds,
                ));
                if c.value < simplex[worst].value { Some(c) } else { None }
            };

            match contracted {
                Some(c) => simplex[worst] = c,
                None => {
                    let best = simplex[0].x.clone();
                    for vertex in simplex.iter_mut().skip(1) {
                        let x = &best + (&vertex.x - &best) * cfg.shrink;
                        *vertex = eval(Self::project(x, lower_bounds));
                    }
                }
            }
        }

        simplex.sort_by_key(|v| OrderedFloat(v.value));
        let best = simplex.swap_remove(0);

        MinimizeReport {
            x: best.x,
            value: best.value,
            iterations,
            converged,
        }
    }
}
