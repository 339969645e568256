//! Reading and writing single-band rasters
//!
//! The native backend handles GeoTIFF through the `tiff` crate. Enabling the
//! `gdal` feature swaps in GDAL, which also reads ERDAS Imagine, JPEG2000,
//! ENVI, BMP, PNG and VRT mosaics. Either way a file handle lives only for
//! the duration of a single read or write call.

#[cfg(feature = "gdal")]
mod gdal_io;
#[cfg(not(feature = "gdal"))]
mod native;

#[cfg(feature = "gdal")]
pub use gdal_io::{read_geotiff, write_geotiff};

#[cfg(not(feature = "gdal"))]
pub use native::{read_geotiff, write_geotiff};

use crate::error::Error;
use std::fmt;
use std::str::FromStr;

/// Compression applied to written GeoTIFF strips or tiles
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Compression {
    None,
    Lzw,
    #[default]
    Deflate,
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Compression::None => "NONE",
            Compression::Lzw => "LZW",
            Compression::Deflate => "DEFLATE",
        };
        f.write_str(s)
    }
}

impl FromStr for Compression {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Compression::None),
            "lzw" => Ok(Compression::Lzw),
            "deflate" | "zip" => Ok(Compression::Deflate),
            other => Err(Error::InvalidInput(format!(
                "unknown compression '{}' (expected none, lzw or deflate)",
                other
            ))),
        }
    }
}

/// Options for writing GeoTIFF files
#[derive(Debug, Clone, Default)]
pub struct GeoTiffOptions {
    pub compression: Compression,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compression_parse() {
        assert_eq!("none".parse::<Compression>().unwrap(), Compression::None);
        assert_eq!("LZW".parse::<Compression>().unwrap(), Compression::Lzw);
        assert_eq!(" Deflate ".parse::<Compression>().unwrap(), Compression::Deflate);
        assert_eq!("zip".parse::<Compression>().unwrap(), Compression::Deflate);
        assert!(matches!(
            "jpeg".parse::<Compression>(),
            Err(Error::InvalidInput(_))
        ));
        assert_eq!(Compression::default().to_string(), "DEFLATE");
    }
}
