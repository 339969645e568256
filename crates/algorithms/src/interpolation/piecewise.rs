//! Piecewise-linear interpolation over a [`PreferenceCurve`]

use crate::curves::PreferenceCurve;
use crate::maybe_rayon::*;
use hsi_core::{Error, Raster, Result};
use ndarray::Array2;

/// Evaluate `curve` at `x`.
///
/// - Below the first control point: the first y value
/// - Above the last control point: the last y value
/// - On a control point: that point's y value
/// - Between two control points: linear interpolation
/// - NaN: NaN
///
/// When several control points share an x value the rightmost one wins, so a
/// repeated x acts as a step.
pub fn evaluate(curve: &PreferenceCurve, x: f64) -> f64 {
    let xs = curve.xs();
    let ys = curve.ys();
    let last = xs.len() - 1;

    if x.is_nan() {
        return f64::NAN;
    }
    if x < xs[0] {
        return ys[0];
    }
    if x >= xs[last] {
        return ys[last];
    }

    // First control point strictly greater than x; always in 1..=last here
    let upper = xs.partition_point(|&p| p <= x);
    let lower = upper - 1;

    let (x0, y0) = (xs[lower], ys[lower]);
    if x == x0 {
        return y0;
    }
    let (x1, y1) = (xs[upper], ys[upper]);
    y0 + (y1 - y0) * (x - x0) / (x1 - x0)
}

/// Evaluate `curve` at every cell of `raster`.
///
/// The output keeps the input's georeferencing and has no no-data value:
/// callers are expected to fill no-data cells before evaluation.
pub fn evaluate_raster(curve: &PreferenceCurve, raster: &Raster<f64>) -> Result<Raster<f64>> {
    let (rows, cols) = raster.shape();

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![0.0; cols];
            for (col, out) in row_data.iter_mut().enumerate() {
                let value = unsafe { raster.get_unchecked(row, col) };
                *out = evaluate(curve, value);
            }
            row_data
        })
        .collect();

    let mut output = raster.with_same_meta::<f64>(rows, cols);
    *output.data_mut() = Array2::from_shape_vec((rows, cols), data)
        .map_err(|e| Error::Other(e.to_string()))?;

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curves::CurveLibrary;
    use approx::assert_relative_eq;
    use hsi_core::{GeoTransform, CRS};

    fn spawning_depth() -> PreferenceCurve {
        PreferenceCurve::new(
            vec![0.0, 0.55, 1.05, 1.55, 5.05, 10.0, 30.0, 35.0, 99.0],
            vec![0.0, 0.0, 0.75, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0],
        )
        .unwrap()
    }

    #[test]
    fn test_exact_control_points() {
        let curve = spawning_depth();
        for (x, y) in curve.points() {
            assert_eq!(evaluate(&curve, x), y, "x = {}", x);
        }
    }

    #[test]
    fn test_interpolates_between_points() {
        let curve = spawning_depth();
        // Halfway between (0.55, 0) and (1.05, 0.75)
        assert_relative_eq!(evaluate(&curve, 0.8), 0.375, epsilon = 1e-12);
        // Halfway between (1.05, 0.75) and (1.55, 1)
        assert_relative_eq!(evaluate(&curve, 1.3), 0.875, epsilon = 1e-12);
        // Descending limb between (5.05, 1) and (10, 0)
        assert_relative_eq!(evaluate(&curve, 7.525), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_result_within_neighbouring_y() {
        let curve = spawning_depth();
        let xs = curve.xs();
        let ys = curve.ys();
        for i in 0..xs.len() - 1 {
            let lo = ys[i].min(ys[i + 1]);
            let hi = ys[i].max(ys[i + 1]);
            for step in 1..10 {
                let x = xs[i] + (xs[i + 1] - xs[i]) * step as f64 / 10.0;
                let y = evaluate(&curve, x);
                assert!(y >= lo - 1e-12 && y <= hi + 1e-12, "x = {}, y = {}", x, y);
            }
        }
    }

    #[test]
    fn test_catalog_curves_hit_points_clamp_and_stay_bracketed() {
        let library = CurveLibrary::standard();
        for set in library.iter() {
            for (kind, curve) in [("depth", set.depth()), ("velocity", set.velocity())] {
                let xs = curve.xs();
                let ys = curve.ys();
                let last = xs.len() - 1;
                let ctx = format!("{} {}", set.label(), kind);

                for i in 0..=last {
                    assert_eq!(evaluate(curve, xs[i]), ys[i], "{} x = {}", ctx, xs[i]);
                }

                assert_eq!(evaluate(curve, xs[0] - 1.0), ys[0], "{}", ctx);
                assert_eq!(evaluate(curve, xs[0] - 1e-9), ys[0], "{}", ctx);
                assert_eq!(evaluate(curve, xs[last]), ys[last], "{}", ctx);
                assert_eq!(evaluate(curve, xs[last] + 10.0), ys[last], "{}", ctx);
                assert_eq!(evaluate(curve, f64::MAX), ys[last], "{}", ctx);

                for i in 0..last {
                    let lo = ys[i].min(ys[i + 1]);
                    let hi = ys[i].max(ys[i + 1]);
                    for step in 1..10 {
                        let x = xs[i] + (xs[i + 1] - xs[i]) * step as f64 / 10.0;
                        let y = evaluate(curve, x);
                        assert!(
                            y >= lo - 1e-12 && y <= hi + 1e-12,
                            "{} x = {}, y = {} outside [{}, {}]",
                            ctx,
                            x,
                            y,
                            lo,
                            hi
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_clamps_outside_domain() {
        let curve = PreferenceCurve::new(vec![0.0, 2.4, 99.0], vec![1.0, 1.0, 0.5]).unwrap();
        assert_eq!(evaluate(&curve, -3.0), 1.0);
        assert_eq!(evaluate(&curve, 150.0), 0.5);
        assert_eq!(evaluate(&curve, f64::INFINITY), 0.5);
        assert_eq!(evaluate(&curve, f64::NEG_INFINITY), 1.0);
    }

    #[test]
    fn test_nan_propagates() {
        assert!(evaluate(&spawning_depth(), f64::NAN).is_nan());
    }

    #[test]
    fn test_repeated_x_takes_rightmost() {
        let curve =
            PreferenceCurve::new(vec![0.0, 1.0, 1.0, 2.0], vec![0.0, 0.2, 0.8, 1.0]).unwrap();
        assert_eq!(evaluate(&curve, 1.0), 0.8);
        assert_relative_eq!(evaluate(&curve, 0.5), 0.1, epsilon = 1e-12);
        assert_relative_eq!(evaluate(&curve, 1.5), 0.9, epsilon = 1e-12);

        let step = PreferenceCurve::new(vec![0.0, 0.0, 1.0], vec![0.3, 0.6, 1.0]).unwrap();
        assert_eq!(evaluate(&step, 0.0), 0.6);
        assert_eq!(evaluate(&step, -1.0), 0.3);
    }

    #[test]
    fn test_evaluate_raster_keeps_geometry() {
        let mut depth = Raster::from_vec(vec![0.5, 1.0, 99.0, 1.3, 0.0, 200.0], 2, 3).unwrap();
        depth.set_transform(GeoTransform::new(552000.0, 5230000.0, 3.0, -3.0));
        depth.set_crs(Some(CRS::from_epsg(26910)));
        depth.set_nodata(Some(-9999.0));

        let scores = evaluate_raster(&spawning_depth(), &depth).unwrap();
        assert_eq!(scores.shape(), (2, 3));
        assert_eq!(scores.transform(), depth.transform());
        assert_eq!(scores.crs().and_then(|c| c.epsg()), Some(26910));
        assert_eq!(scores.nodata(), None);

        assert_eq!(scores.get(0, 0).unwrap(), 0.0);
        assert_relative_eq!(scores.get(0, 1).unwrap(), 0.675, epsilon = 1e-12);
        assert_eq!(scores.get(0, 2).unwrap(), 0.0);
        assert_relative_eq!(scores.get(1, 0).unwrap(), 0.875, epsilon = 1e-12);
        assert_eq!(scores.get(1, 2).unwrap(), 0.0);
    }
}
