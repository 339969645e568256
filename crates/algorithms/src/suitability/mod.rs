//! Habitat suitability index
//!
//! The combined index of a cell is the product of its depth preference and
//! its velocity preference:
//!
//! ```text
//! HSI = depth_curve(depth) * velocity_curve(velocity)
//! ```
//!
//! Cells where the depth raster holds its no-data value are written with the
//! output no-data value instead. No-data cells in either input are read as
//! zero before curve evaluation.

mod engine;

pub use engine::{compute, ComputeError, ComputeSummary, EngineState, SuitabilityEngine};

use crate::curves::CurveSet;
use crate::interpolation::evaluate_raster;
use crate::maybe_rayon::*;
use hsi_core::{Algorithm, Error, Raster, RasterElement, Result};
use ndarray::Array2;

/// No-data value written to masked output cells
pub const DEFAULT_OUTPUT_NODATA: f64 = -9999.0;

/// Source of the velocity grid fed to the velocity curve
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VelocityFill {
    /// Velocity raster with its own no-data cells read as zero
    #[default]
    OwnNoData,
    /// Zero-filled depth grid, with cells equal to the velocity no-data value
    /// set to zero. The velocity raster's values are ignored. Reproduces
    /// outputs made by early releases of the tool.
    LegacyDepthCopy,
}

/// Parameters for the suitability index
#[derive(Debug, Clone)]
pub struct SuitabilityParams {
    /// Value written to cells masked by depth no-data
    pub output_nodata: f64,
    /// How the velocity working grid is built
    pub velocity_fill: VelocityFill,
}

impl Default for SuitabilityParams {
    fn default() -> Self {
        Self {
            output_nodata: DEFAULT_OUTPUT_NODATA,
            velocity_fill: VelocityFill::default(),
        }
    }
}

/// Habitat suitability index for one curve set
#[derive(Debug, Clone)]
pub struct HabitatSuitability {
    pub curves: CurveSet,
}

impl HabitatSuitability {
    pub fn new(curves: CurveSet) -> Self {
        Self { curves }
    }
}

impl Algorithm for HabitatSuitability {
    /// (depth, velocity)
    type Input = (Raster<f64>, Raster<f64>);
    type Output = Raster<f64>;
    type Params = SuitabilityParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "HabitatSuitability"
    }

    fn description(&self) -> &'static str {
        "Product of depth and velocity preference scores, masked by depth no-data"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        let (depth, velocity) = input;
        habitat_suitability(&depth, &velocity, &self.curves, &params)
    }
}

/// Compute the suitability index from depth and velocity grids.
///
/// The output has the depth raster's georeferencing and
/// `params.output_nodata` as its no-data value.
///
/// # Errors
/// [`Error::SizeMismatch`] if the two grids differ in shape.
pub fn habitat_suitability(
    depth: &Raster<f64>,
    velocity: &Raster<f64>,
    curves: &CurveSet,
    params: &SuitabilityParams,
) -> Result<Raster<f64>> {
    let (rows, cols) = depth.shape();
    if velocity.shape() != (rows, cols) {
        let (ar, ac) = velocity.shape();
        return Err(Error::SizeMismatch {
            er: rows,
            ec: cols,
            ar,
            ac,
        });
    }

    let depth_filled = zero_fill(depth, depth.nodata());
    let velocity_filled = match params.velocity_fill {
        VelocityFill::OwnNoData => zero_fill(velocity, velocity.nodata()),
        VelocityFill::LegacyDepthCopy => zero_fill(&depth_filled, velocity.nodata()),
    };

    let depth_score = evaluate_raster(curves.depth(), &depth_filled)?;
    let velocity_score = evaluate_raster(curves.velocity(), &velocity_filled)?;

    let depth_nodata = depth.nodata();
    let output_nodata = params.output_nodata;

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![output_nodata; cols];
            for (col, out) in row_data.iter_mut().enumerate() {
                let d = unsafe { depth.get_unchecked(row, col) };
                if d.is_nodata(depth_nodata) {
                    continue;
                }
                let ds = unsafe { depth_score.get_unchecked(row, col) };
                let vs = unsafe { velocity_score.get_unchecked(row, col) };
                *out = ds * vs;
            }
            row_data
        })
        .collect();

    let mut output = depth.with_same_meta::<f64>(rows, cols);
    output.set_nodata(Some(output_nodata));
    *output.data_mut() = Array2::from_shape_vec((rows, cols), data)
        .map_err(|e| Error::Other(e.to_string()))?;

    Ok(output)
}

/// Copy of `raster` with cells matching `nodata` replaced by zero
fn zero_fill(raster: &Raster<f64>, nodata: Option<f64>) -> Raster<f64> {
    raster.map(|v| if v.is_nodata(nodata) { 0.0 } else { v })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curves::{CurveLibrary, PreferenceCurve};
    use approx::assert_relative_eq;
    use hsi_core::{GeoTransform, CRS};

    fn ramp_set() -> CurveSet {
        CurveSet::new(
            "Ramp",
            PreferenceCurve::new(vec![0.0, 2.0], vec![0.0, 1.0]).unwrap(),
            PreferenceCurve::new(vec![0.0, 4.0], vec![1.0, 0.0]).unwrap(),
        )
    }

    fn grid(values: Vec<f64>, rows: usize, cols: usize, nodata: Option<f64>) -> Raster<f64> {
        let mut r = Raster::from_vec(values, rows, cols).unwrap();
        r.set_transform(GeoTransform::new(552000.0, 5230000.0, 1.0, -1.0));
        r.set_crs(Some(CRS::from_epsg(26910)));
        r.set_nodata(nodata);
        r
    }

    #[test]
    fn test_product_of_scores() {
        let depth = grid(vec![1.0, 2.0, 0.5, 3.0], 2, 2, None);
        let velocity = grid(vec![2.0, 1.0, 0.0, 4.0], 2, 2, None);

        let hsi =
            habitat_suitability(&depth, &velocity, &ramp_set(), &SuitabilityParams::default())
                .unwrap();

        assert_relative_eq!(hsi.get(0, 0).unwrap(), 0.5 * 0.5, epsilon = 1e-12);
        assert_relative_eq!(hsi.get(0, 1).unwrap(), 1.0 * 0.75, epsilon = 1e-12);
        assert_relative_eq!(hsi.get(1, 0).unwrap(), 0.25 * 1.0, epsilon = 1e-12);
        assert_eq!(hsi.get(1, 1).unwrap(), 0.0);
        assert_eq!(hsi.nodata(), Some(DEFAULT_OUTPUT_NODATA));
        assert_eq!(hsi.transform(), depth.transform());
    }

    #[test]
    fn test_depth_nodata_masks_output() {
        let depth = grid(vec![-9999.0, 1.0, 1.0, -9999.0], 2, 2, Some(-9999.0));
        let velocity = grid(vec![1.0, 1.0, 1.0, 1.0], 2, 2, Some(-1.0));

        let hsi =
            habitat_suitability(&depth, &velocity, &ramp_set(), &SuitabilityParams::default())
                .unwrap();

        assert_eq!(hsi.get(0, 0).unwrap(), -9999.0);
        assert_eq!(hsi.get(1, 1).unwrap(), -9999.0);
        assert_relative_eq!(hsi.get(0, 1).unwrap(), 0.375, epsilon = 1e-12);
        assert_eq!(hsi.nodata_count(), 2);
    }

    #[test]
    fn test_velocity_nodata_reads_as_zero() {
        let depth = grid(vec![2.0, 2.0], 1, 2, Some(-9999.0));
        let velocity = grid(vec![-1.0, 2.0], 1, 2, Some(-1.0));

        let hsi =
            habitat_suitability(&depth, &velocity, &ramp_set(), &SuitabilityParams::default())
                .unwrap();

        // Velocity no-data is not masked, it scores as zero velocity
        assert_eq!(hsi.get(0, 0).unwrap(), 1.0);
        assert_relative_eq!(hsi.get(0, 1).unwrap(), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_custom_output_nodata() {
        let depth = grid(vec![f64::NAN, 1.0], 1, 2, Some(f64::NAN));
        let velocity = grid(vec![0.0, 0.0], 1, 2, None);
        let params = SuitabilityParams {
            output_nodata: -1.0,
            ..Default::default()
        };

        let hsi = habitat_suitability(&depth, &velocity, &ramp_set(), &params).unwrap();
        assert_eq!(hsi.get(0, 0).unwrap(), -1.0);
        assert_relative_eq!(hsi.get(0, 1).unwrap(), 0.5, epsilon = 1e-12);
        assert_eq!(hsi.nodata(), Some(-1.0));
    }

    #[test]
    fn test_legacy_velocity_uses_depth() {
        let depth = grid(vec![1.0, -9999.0, 3.0], 1, 3, Some(-9999.0));
        let velocity = grid(vec![0.0, 0.0, 0.0], 1, 3, Some(3.0));
        let params = SuitabilityParams {
            velocity_fill: VelocityFill::LegacyDepthCopy,
            ..Default::default()
        };

        let hsi = habitat_suitability(&depth, &velocity, &ramp_set(), &params).unwrap();

        // velocity grid becomes [1, 0, 0]: depth copy with 3.0 (velocity no-data) zeroed
        assert_relative_eq!(hsi.get(0, 0).unwrap(), 0.5 * 0.75, epsilon = 1e-12);
        assert_eq!(hsi.get(0, 1).unwrap(), -9999.0);
        assert_eq!(hsi.get(0, 2).unwrap(), 1.0);
    }

    #[test]
    fn test_shape_mismatch() {
        let depth = grid(vec![1.0; 4], 2, 2, None);
        let velocity = grid(vec![1.0; 6], 2, 3, None);
        let err =
            habitat_suitability(&depth, &velocity, &ramp_set(), &SuitabilityParams::default())
                .unwrap_err();
        assert!(matches!(err, Error::SizeMismatch { er: 2, ec: 2, ar: 2, ac: 3 }));
    }

    #[test]
    fn test_catalog_scores_stay_in_unit_range() {
        let nodata = -9999.0;
        let depths: Vec<f64> = (0..=48)
            .map(|i| i as f64 * 0.25)
            .chain([50.0, 99.0, 150.0])
            .collect();
        let velocities: Vec<f64> = (0..=24)
            .map(|i| i as f64 * 0.25)
            .chain([99.0, -1.0])
            .collect();
        let (rows, cols) = (depths.len(), velocities.len());

        let mut depth_cells = Vec::with_capacity(rows * cols);
        let mut velocity_cells = Vec::with_capacity(rows * cols);
        for (r, &d) in depths.iter().enumerate() {
            for (c, &v) in velocities.iter().enumerate() {
                // A diagonal of depth no-data cells
                depth_cells.push(if r == c { nodata } else { d });
                velocity_cells.push(v);
            }
        }
        let depth = grid(depth_cells, rows, cols, Some(nodata));
        let velocity = grid(velocity_cells, rows, cols, Some(-1.0));

        for set in CurveLibrary::standard().iter() {
            let hsi =
                habitat_suitability(&depth, &velocity, set, &SuitabilityParams::default())
                    .unwrap();
            for r in 0..rows {
                for c in 0..cols {
                    let value = hsi.get(r, c).unwrap();
                    if r == c {
                        assert_eq!(value, DEFAULT_OUTPUT_NODATA, "{}", set.label());
                    } else {
                        assert!(
                            (0.0..=1.0).contains(&value),
                            "{}: depth {} velocity {} gave {}",
                            set.label(),
                            depths[r],
                            velocities[c],
                            value
                        );
                    }
                }
            }
            assert_eq!(hsi.nodata_count(), rows.min(cols), "{}", set.label());
        }
    }

    #[test]
    fn test_algorithm_trait_with_catalog_curves() {
        let curves = CurveLibrary::standard()
            .lookup("Adult Chinook Spawning Large River")
            .unwrap()
            .clone();
        let algo = HabitatSuitability::new(curves);
        assert_eq!(algo.name(), "HabitatSuitability");

        let depth = grid(vec![0.5, 1.0, 99.0], 1, 3, Some(-9999.0));
        let velocity = grid(vec![0.5, 0.75, 99.0], 1, 3, Some(-9999.0));
        let hsi = algo.execute_default((depth, velocity)).unwrap();

        assert_eq!(hsi.get(0, 0).unwrap(), 0.0);
        assert_relative_eq!(hsi.get(0, 1).unwrap(), 0.675 * 0.79, epsilon = 1e-12);
        assert_eq!(hsi.get(0, 2).unwrap(), 0.0);
    }
}
