//! Common types, traits, and error definitions for min_snap_planner
//!
//! This module provides the foundational building blocks shared by the
//! trajectory optimizer and its consumers.

pub mod types;
pub mod traits;
pub mod error;

pub use types::*;
pub use traits::*;
pub use error::*;
