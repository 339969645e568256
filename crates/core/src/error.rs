//! Error types for habitat suitability operations

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for raster and suitability operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot open raster {}: {reason}", path.display())]
    RasterOpen { path: PathBuf, reason: String },

    #[error("Band {band} not found in {} ({available} band(s) available)", path.display())]
    BandMissing {
        path: PathBuf,
        band: usize,
        available: usize,
    },

    #[error("Cannot write raster {}: {reason}", path.display())]
    RasterWrite { path: PathBuf, reason: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unknown curve set: '{0}'")]
    UnknownCurveSet(String),

    #[error("Invalid preference curve: {0}")]
    InvalidCurve(String),

    #[error("Invalid raster dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Index out of bounds: ({row}, {col}) in raster of size ({rows}, {cols})")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Raster size mismatch: expected ({er}, {ec}), got ({ar}, {ac})")]
    SizeMismatch { er: usize, ec: usize, ar: usize, ac: usize },

    #[error("Unsupported data type: {0}")]
    UnsupportedDataType(String),

    #[error("GDAL error: {0}")]
    #[cfg(feature = "gdal")]
    Gdal(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    pub(crate) fn open(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Error::RasterOpen {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Error::RasterWrite {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(feature = "gdal")]
impl From<gdal::errors::GdalError> for Error {
    fn from(e: gdal::errors::GdalError) -> Self {
        Error::Gdal(e.to_string())
    }
}

/// Result type alias for raster operations
pub type Result<T> = std::result::Result<T, Error>;
