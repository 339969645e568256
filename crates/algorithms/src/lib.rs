//! # HSI Algorithms
//!
//! Habitat suitability analysis for salmonid species and life stages.
//!
//! ## Modules
//!
//! - **curves**: Piecewise-linear preference curves and the built-in catalog
//!   of depth/velocity curve sets
//! - **interpolation**: Curve evaluation at points and across whole rasters
//! - **suitability**: Depth x velocity suitability index and the end-to-end
//!   raster engine

pub(crate) mod maybe_rayon;

pub mod curves;
pub mod interpolation;
pub mod suitability;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::curves::{CurveLibrary, CurveSet, PreferenceCurve};
    pub use crate::interpolation::{evaluate, evaluate_raster};
    pub use crate::suitability::{
        compute, habitat_suitability, ComputeError, ComputeSummary, EngineState,
        HabitatSuitability, SuitabilityEngine, SuitabilityParams, VelocityFill,
    };
    pub use hsi_core::prelude::*;
}
