//! End-to-end suitability computation: read two rasters, score, write one

use super::{HabitatSuitability, SuitabilityParams};
use crate::curves::CurveLibrary;
use hsi_core::io::{read_geotiff, write_geotiff, GeoTiffOptions};
use hsi_core::{Algorithm, Error, Raster, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Stage of a single `compute` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Reading,
    Transforming,
    Writing,
    Done,
    Failed,
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EngineState::Idle => "validating inputs",
            EngineState::Reading => "reading inputs",
            EngineState::Transforming => "computing suitability",
            EngineState::Writing => "writing output",
            EngineState::Done => "done",
            EngineState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Failure of a `compute` call, with the stage it happened in
#[derive(Debug, thiserror::Error)]
#[error("Failed to export while {stage}: {error}")]
pub struct ComputeError {
    pub stage: EngineState,
    pub error: Error,
}

impl ComputeError {
    /// The underlying error
    pub fn into_inner(self) -> Error {
        self.error
    }
}

/// Outcome of a successful `compute` call
#[derive(Debug, Clone, PartialEq)]
pub struct ComputeSummary {
    /// Path the result was written to
    pub output: PathBuf,
    /// Label of the curve set used
    pub curve_set: String,
    pub rows: usize,
    pub cols: usize,
    /// Cells masked because depth held its no-data value
    pub masked_cells: usize,
    /// Cells holding a finite score other than the output no-data value
    pub valid_cells: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
}

impl fmt::Display for ComputeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Export complete! Wrote {}", self.output.display())
    }
}

/// Reads depth and velocity rasters, scores them against a curve set and
/// writes the suitability grid.
///
/// The engine holds only read-only configuration; every `compute` call is
/// independent and keeps no state once it returns.
#[derive(Debug, Clone, Default)]
pub struct SuitabilityEngine {
    library: CurveLibrary,
    params: SuitabilityParams,
    options: GeoTiffOptions,
}

impl SuitabilityEngine {
    pub fn new(library: CurveLibrary, params: SuitabilityParams) -> Self {
        Self {
            library,
            params,
            options: GeoTiffOptions::default(),
        }
    }

    /// Use `options` when writing the output raster
    pub fn with_options(mut self, options: GeoTiffOptions) -> Self {
        self.options = options;
        self
    }

    pub fn library(&self) -> &CurveLibrary {
        &self.library
    }

    pub fn params(&self) -> &SuitabilityParams {
        &self.params
    }

    /// Compute the suitability index for `curve_name` and write it to
    /// `output_path`.
    ///
    /// Inputs are validated before any file is touched. The output takes the
    /// depth raster's grid and CRS, is written as Float32 and carries the
    /// configured output no-data value. A `.tif` extension is added when
    /// `output_path` has none.
    ///
    /// # Errors
    /// A [`ComputeError`] naming the failed stage and wrapping
    /// [`Error::InvalidInput`], [`Error::RasterOpen`], [`Error::BandMissing`],
    /// [`Error::SizeMismatch`] or [`Error::RasterWrite`].
    pub fn compute(
        &self,
        depth_path: impl AsRef<Path>,
        velocity_path: impl AsRef<Path>,
        curve_name: &str,
        output_path: impl AsRef<Path>,
    ) -> std::result::Result<ComputeSummary, ComputeError> {
        let mut state = EngineState::Idle;
        let result = self.run(
            &mut state,
            depth_path.as_ref(),
            velocity_path.as_ref(),
            curve_name,
            output_path.as_ref(),
        );

        match result {
            Ok(summary) => {
                transition(&mut state, EngineState::Done);
                Ok(summary)
            }
            Err(error) => {
                let stage = state;
                transition(&mut state, EngineState::Failed);
                warn!("Failed to export while {}: {}", stage, error);
                Err(ComputeError { stage, error })
            }
        }
    }

    fn run(
        &self,
        state: &mut EngineState,
        depth_path: &Path,
        velocity_path: &Path,
        curve_name: &str,
        output_path: &Path,
    ) -> Result<ComputeSummary> {
        if is_blank(depth_path) {
            return Err(Error::InvalidInput("no depth raster selected".into()));
        }
        if is_blank(velocity_path) {
            return Err(Error::InvalidInput("no velocity raster selected".into()));
        }
        if is_blank(output_path) {
            return Err(Error::InvalidInput("no output location chosen".into()));
        }
        let curves = self
            .library
            .lookup(curve_name)
            .map_err(|e| Error::InvalidInput(e.to_string()))?;
        let output_path = resolve_output_path(output_path);

        transition(state, EngineState::Reading);
        let depth: Raster<f64> = read_geotiff(depth_path, Some(1))?;
        debug!(
            "depth {}: {}x{}, nodata {:?}",
            depth_path.display(),
            depth.rows(),
            depth.cols(),
            depth.nodata()
        );
        let velocity: Raster<f64> = read_geotiff(velocity_path, Some(1))?;
        debug!(
            "velocity {}: {}x{}, nodata {:?}",
            velocity_path.display(),
            velocity.rows(),
            velocity.cols(),
            velocity.nodata()
        );

        let profile = depth.profile();
        if !profile.is_aligned_with(&velocity.profile()) {
            warn!(
                "depth and velocity grids are not aligned ({}x{} vs {}x{})",
                depth.rows(),
                depth.cols(),
                velocity.rows(),
                velocity.cols()
            );
        }
        if profile.crs.is_none() {
            warn!("{} has no coordinate reference system", depth_path.display());
        }

        transition(state, EngineState::Transforming);
        // Counted on the input; the output no-data may equal a real score
        let masked_cells = depth.nodata_count();
        let algorithm = HabitatSuitability::new(curves.clone());
        debug!("{} with '{}'", algorithm.name(), curves.label());
        let combined = algorithm.execute((depth, velocity), self.params.clone())?;
        let stats = combined.statistics();

        transition(state, EngineState::Writing);
        let nodata = self.params.output_nodata;
        let output = Raster::<f32>::from_profile(
            &profile.with_nodata(Some(nodata)),
            combined.into_array().mapv(|v| v as f32),
        )?;
        write_output(&output, &output_path, &self.options)?;

        let summary = ComputeSummary {
            output: output_path,
            curve_set: curves.label().to_string(),
            rows: output.rows(),
            cols: output.cols(),
            masked_cells,
            valid_cells: stats.valid_count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean,
        };
        info!(
            "{} ({}, {} masked cells, mean {:.4})",
            summary,
            summary.curve_set,
            summary.masked_cells,
            summary.mean.unwrap_or(f64::NAN)
        );
        Ok(summary)
    }
}

/// [`SuitabilityEngine::compute`] with the built-in catalog and default parameters
pub fn compute(
    depth_path: impl AsRef<Path>,
    velocity_path: impl AsRef<Path>,
    curve_name: &str,
    output_path: impl AsRef<Path>,
) -> std::result::Result<ComputeSummary, ComputeError> {
    SuitabilityEngine::default().compute(depth_path, velocity_path, curve_name, output_path)
}

fn transition(state: &mut EngineState, next: EngineState) {
    debug!("engine: {:?} -> {:?}", state, next);
    *state = next;
}

fn is_blank(path: &Path) -> bool {
    path.to_string_lossy().trim().is_empty()
}

/// Output path with `.tif` appended when it has no extension
fn resolve_output_path(path: &Path) -> PathBuf {
    if path.extension().is_some() {
        path.to_path_buf()
    } else {
        let mut name = path.as_os_str().to_owned();
        name.push(".tif");
        PathBuf::from(name)
    }
}

/// Write `raster`, removing the file again if it was created by a failed write
fn write_output(raster: &Raster<f32>, path: &Path, options: &GeoTiffOptions) -> Result<()> {
    let existed = path.exists();
    let result = write_geotiff(raster, path, Some(options.clone()));
    if result.is_err() && !existed && path.exists() {
        if let Err(e) = std::fs::remove_file(path) {
            warn!("could not remove partial output {}: {}", path.display(), e);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_output_path() {
        assert_eq!(resolve_output_path(Path::new("out/hsi")), PathBuf::from("out/hsi.tif"));
        assert_eq!(resolve_output_path(Path::new("hsi.tif")), PathBuf::from("hsi.tif"));
        assert_eq!(resolve_output_path(Path::new("hsi.tiff")), PathBuf::from("hsi.tiff"));
        assert_eq!(
            resolve_output_path(Path::new("run.2024")),
            PathBuf::from("run.2024")
        );
    }

    #[test]
    fn test_blank_paths_fail_before_io() {
        let engine = SuitabilityEngine::default();
        let curve = "Juvenile Chinook Rearing";

        let err = engine.compute("", "v.tif", curve, "out.tif").unwrap_err();
        assert_eq!(err.stage, EngineState::Idle);
        assert!(matches!(err.error, Error::InvalidInput(ref m) if m.contains("depth")));

        let err = engine.compute("d.tif", "  ", curve, "out.tif").unwrap_err();
        assert!(matches!(err.error, Error::InvalidInput(ref m) if m.contains("velocity")));

        let err = engine.compute("d.tif", "v.tif", curve, "").unwrap_err();
        assert!(matches!(err.error, Error::InvalidInput(ref m) if m.contains("output")));
    }

    #[test]
    fn test_unknown_curve_is_invalid_input() {
        let err = compute("d.tif", "v.tif", "Nonexistent", "out.tif").unwrap_err();
        assert_eq!(err.stage, EngineState::Idle);
        assert!(matches!(err.error, Error::InvalidInput(ref m) if m.contains("Nonexistent")));
    }

    #[test]
    fn test_messages() {
        let err = ComputeError {
            stage: EngineState::Reading,
            error: Error::InvalidInput("x".into()),
        };
        assert_eq!(
            err.to_string(),
            "Failed to export while reading inputs: Invalid input: x"
        );

        let summary = ComputeSummary {
            output: PathBuf::from("hsi.tif"),
            curve_set: "Spring Chinook Holding".into(),
            rows: 1,
            cols: 1,
            masked_cells: 0,
            valid_cells: 1,
            min: Some(0.5),
            max: Some(0.5),
            mean: Some(0.5),
        };
        assert_eq!(summary.to_string(), "Export complete! Wrote hsi.tif");
    }
}
