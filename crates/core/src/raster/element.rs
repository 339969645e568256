//! Raster element trait for generic cell values

use num_traits::{NumCast, Zero};
use std::fmt::Debug;

/// Trait for types that can be stored in a raster cell.
///
/// Depth and velocity grids are processed as `f64`; suitability output is
/// stored as `f32` to match the Float32 GeoTIFFs the tool has always written.
pub trait RasterElement:
    Copy + Clone + Debug + PartialOrd + PartialEq + NumCast + Zero + Send + Sync + 'static
{
    /// Fallback value for cells that cannot be represented in this type
    fn default_nodata() -> Self;

    /// Check if this value represents no-data.
    ///
    /// Matching is exact. A NaN sentinel matches NaN cells; otherwise NaN is
    /// an ordinary value and is not treated as missing.
    fn is_nodata(&self, nodata: Option<Self>) -> bool;
}

macro_rules! impl_raster_element_float {
    ($t:ty) => {
        impl RasterElement for $t {
            fn default_nodata() -> Self {
                <$t>::NAN
            }

            fn is_nodata(&self, nodata: Option<Self>) -> bool {
                match nodata {
                    Some(nd) if nd.is_nan() => self.is_nan(),
                    Some(nd) => *self == nd,
                    None => false,
                }
            }
        }
    };
}

impl_raster_element_float!(f32);
impl_raster_element_float!(f64);
