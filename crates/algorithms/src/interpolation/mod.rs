//! Preference curve evaluation
//!
//! Linear interpolation between curve control points, clamped to the end
//! values outside the curve domain. Evaluation works on single values or on
//! whole rasters, row by row.

mod piecewise;

pub use piecewise::{evaluate, evaluate_raster};
