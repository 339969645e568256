//! # HSI Core
//!
//! Core types, traits and I/O for habitat suitability analysis.
//!
//! This crate provides:
//! - `Raster<T>`: Georeferenced single-band raster grid
//! - `RasterProfile`: Grid geometry and metadata shared between input and output
//! - `GeoTransform`: Affine transformation for georeferencing
//! - `CRS`: Coordinate Reference System passthrough
//! - Algorithm trait for consistent API
//! - GeoTIFF reading and writing

pub mod crs;
pub mod error;
pub mod io;
pub mod raster;

pub use crs::{GeoKeyDirectory, CRS};
pub use error::{Error, Result};
pub use raster::{GeoTransform, Raster, RasterElement, RasterProfile};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::crs::CRS;
    pub use crate::error::{Error, Result};
    pub use crate::raster::{GeoTransform, Raster, RasterElement, RasterProfile};
    pub use crate::Algorithm;
}

/// A raster transform with explicit parameters.
///
/// Implementations take their inputs by value and return a new output; any
/// state they need lives in `self` (for example the curve set being applied).
pub trait Algorithm {
    type Input;
    type Output;
    /// Tuning knobs; `Default` gives the standard behaviour
    type Params: Default;
    type Error: std::error::Error;

    /// Short identifier used in logs
    fn name(&self) -> &'static str;

    /// One-line description
    fn description(&self) -> &'static str;

    fn execute(
        &self,
        input: Self::Input,
        params: Self::Params,
    ) -> std::result::Result<Self::Output, Self::Error>;

    /// [`Algorithm::execute`] with `Params::default()`
    fn execute_default(&self, input: Self::Input) -> std::result::Result<Self::Output, Self::Error> {
        self.execute(input, Self::Params::default())
    }
}
