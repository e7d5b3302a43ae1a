// Derivative-free optimization backends

pub mod nelder_mead;

pub use nelder_mead::{NelderMead, NelderMeadConfig};
