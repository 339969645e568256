//! Spatial profile of a raster grid

use crate::crs::CRS;
use crate::raster::GeoTransform;

/// Geometry and metadata that an output raster inherits from its source.
///
/// Everything here is opaque to the suitability math: it is captured when the
/// depth raster is read and handed unchanged to the writer, so the result lines
/// up cell for cell with the input.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterProfile {
    pub rows: usize,
    pub cols: usize,
    pub transform: GeoTransform,
    pub crs: Option<CRS>,
    pub nodata: Option<f64>,
}

impl RasterProfile {
    /// Dimensions as (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Same profile with a different no-data value
    pub fn with_nodata(mut self, nodata: Option<f64>) -> Self {
        self.nodata = nodata;
        self
    }

    /// Whether `other` describes the same grid: dimensions, transform and CRS.
    ///
    /// A missing CRS on either side is not treated as a mismatch.
    pub fn is_aligned_with(&self, other: &RasterProfile) -> bool {
        if self.shape() != other.shape() {
            return false;
        }
        let tolerance = self.transform.cell_size() * 1e-6;
        if !self.transform.approx_eq(&other.transform, tolerance) {
            return false;
        }
        match (&self.crs, &other.crs) {
            (Some(a), Some(b)) => a.is_equivalent(b),
            _ => true,
        }
    }
}
