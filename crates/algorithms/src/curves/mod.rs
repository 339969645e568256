//! Habitat preference curves
//!
//! A preference curve maps a physical measurement (water depth or velocity)
//! to a suitability score in [0, 1] through piecewise-linear control points.
//! Curves come in pairs, one per measurement, grouped into a [`CurveSet`] for
//! a species and life stage.

mod catalog;

pub use catalog::{CurveLibrary, CurveSet, WDFW_CITATION};

use crate::interpolation;
use hsi_core::{Error, Result};
use std::borrow::Cow;

/// Piecewise-linear preference function over one physical quantity.
///
/// Control points are stored as two parallel sequences. The x values are
/// non-decreasing; the y values are expected in [0, 1] but not enforced.
/// The built-in curves end at x = 99, a sentinel that is unreachable in real
/// rivers, so evaluation clamps rather than leaves the domain.
#[derive(Debug, Clone, PartialEq)]
pub struct PreferenceCurve {
    xs: Cow<'static, [f64]>,
    ys: Cow<'static, [f64]>,
}

impl PreferenceCurve {
    /// Create a curve from parallel x and y sequences.
    ///
    /// # Errors
    /// [`Error::InvalidCurve`] if the lengths differ, there are fewer than two
    /// points, or the x values are not finite and non-decreasing.
    pub fn new(
        xs: impl Into<Cow<'static, [f64]>>,
        ys: impl Into<Cow<'static, [f64]>>,
    ) -> Result<Self> {
        let curve = Self {
            xs: xs.into(),
            ys: ys.into(),
        };
        curve.validate()?;
        Ok(curve)
    }

    /// Curve over static control points, for catalog data checked by tests
    pub(crate) const fn from_static(xs: &'static [f64], ys: &'static [f64]) -> Self {
        Self {
            xs: Cow::Borrowed(xs),
            ys: Cow::Borrowed(ys),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.xs.len() != self.ys.len() {
            return Err(Error::InvalidCurve(format!(
                "{} x values but {} y values",
                self.xs.len(),
                self.ys.len()
            )));
        }
        if self.xs.len() < 2 {
            return Err(Error::InvalidCurve(
                "at least two control points are required".to_string(),
            ));
        }
        if let Some(x) = self.xs.iter().find(|x| !x.is_finite()) {
            return Err(Error::InvalidCurve(format!("non-finite x value {}", x)));
        }
        if let Some(i) = self.xs.windows(2).position(|w| w[1] < w[0]) {
            return Err(Error::InvalidCurve(format!(
                "x values decrease at point {} ({} -> {})",
                i + 1,
                self.xs[i],
                self.xs[i + 1]
            )));
        }
        Ok(())
    }

    /// Control point x values
    pub fn xs(&self) -> &[f64] {
        &self.xs
    }

    /// Control point y values (preference scores)
    pub fn ys(&self) -> &[f64] {
        &self.ys
    }

    /// Number of control points
    pub fn len(&self) -> usize {
        self.xs.len()
    }

    /// Always false for a validated curve
    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    /// Control points as (x, y) pairs
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.xs.iter().copied().zip(self.ys.iter().copied())
    }

    /// Domain covered by the control points (first x, last x)
    pub fn domain(&self) -> (f64, f64) {
        (self.xs[0], self.xs[self.xs.len() - 1])
    }

    /// Preference score at `x`; see [`interpolation::evaluate`]
    pub fn evaluate(&self, x: f64) -> f64 {
        interpolation::evaluate(self, x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_accepts_monotonic_curve() {
        let curve = PreferenceCurve::new(vec![0.0, 0.55, 1.05], vec![0.0, 0.0, 0.75]).unwrap();
        assert_eq!(curve.len(), 3);
        assert_eq!(curve.domain(), (0.0, 1.05));
        assert_eq!(curve.points().nth(2), Some((1.05, 0.75)));
    }

    #[test]
    fn test_new_rejects_length_mismatch() {
        let err = PreferenceCurve::new(vec![0.0, 1.0, 2.0], vec![0.0, 1.0]).unwrap_err();
        assert!(matches!(err, Error::InvalidCurve(_)));
    }

    #[test]
    fn test_new_rejects_single_point() {
        assert!(PreferenceCurve::new(vec![0.0], vec![1.0]).is_err());
    }

    #[test]
    fn test_new_rejects_decreasing_x() {
        let err = PreferenceCurve::new(vec![0.0, 2.0, 1.0], vec![0.0, 1.0, 0.5]).unwrap_err();
        assert!(err.to_string().contains("decrease at point 2"));
    }

    #[test]
    fn test_new_rejects_nan_x() {
        assert!(PreferenceCurve::new(vec![0.0, f64::NAN], vec![0.0, 1.0]).is_err());
    }

    #[test]
    fn test_repeated_x_is_allowed() {
        assert!(PreferenceCurve::new(vec![0.0, 1.0, 1.0, 99.0], vec![0.0, 0.5, 1.0, 1.0]).is_ok());
    }
}
