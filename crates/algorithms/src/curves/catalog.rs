//! Built-in catalog of salmonid depth/velocity preference curves
//!
//! Control points are kept bit-for-bit identical to the values the tool has
//! always shipped, so results stay comparable with earlier outputs. Depth is
//! in feet, velocity in feet per second.

use super::PreferenceCurve;
use hsi_core::{Error, Result};
use std::borrow::Cow;
use std::collections::HashSet;

/// Source of the built-in curves
pub const WDFW_CITATION: &str = "Washington Dept. of Fish and Wildlife \
    Instream Flow Study Guidelines (2004 & 2016)";

/// Paired depth and velocity preference curves for one species/life stage
#[derive(Debug, Clone, PartialEq)]
pub struct CurveSet {
    label: Cow<'static, str>,
    depth: PreferenceCurve,
    velocity: PreferenceCurve,
    citation: Option<Cow<'static, str>>,
}

impl CurveSet {
    /// Create a curve set
    pub fn new(
        label: impl Into<Cow<'static, str>>,
        depth: PreferenceCurve,
        velocity: PreferenceCurve,
    ) -> Self {
        Self {
            label: label.into(),
            depth,
            velocity,
            citation: None,
        }
    }

    /// Attach the publication the curves were taken from
    pub fn with_citation(mut self, citation: impl Into<Cow<'static, str>>) -> Self {
        self.citation = Some(citation.into());
        self
    }

    const fn builtin(
        label: &'static str,
        depth: (&'static [f64], &'static [f64]),
        velocity: (&'static [f64], &'static [f64]),
    ) -> Self {
        Self {
            label: Cow::Borrowed(label),
            depth: PreferenceCurve::from_static(depth.0, depth.1),
            velocity: PreferenceCurve::from_static(velocity.0, velocity.1),
            citation: Some(Cow::Borrowed(WDFW_CITATION)),
        }
    }

    /// Species/life-stage label
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Depth preference curve
    pub fn depth(&self) -> &PreferenceCurve {
        &self.depth
    }

    /// Velocity preference curve
    pub fn velocity(&self) -> &PreferenceCurve {
        &self.velocity
    }

    /// Citation for the curve data, if known
    pub fn citation(&self) -> Option<&str> {
        self.citation.as_deref()
    }
}

static STANDARD_SETS: [CurveSet; 9] = [
    CurveSet::builtin(
        "Adult Chinook Spawning Large River",
        (
            &[0.0, 0.55, 1.05, 1.55, 5.05, 10.0, 30.0, 35.0, 99.0],
            &[0.0, 0.0, 0.75, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0],
        ),
        (
            &[0.0, 0.55, 0.75, 1.55, 3.55, 4.95, 6.55, 7.0, 99.0],
            &[0.0, 0.0, 0.79, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0],
        ),
    ),
    CurveSet::builtin(
        "Adult Chinook Spawning Small River",
        (
            &[0.0, 0.35, 0.95, 1.25, 1.75, 2.75, 99.0],
            &[0.0, 0.0, 0.8, 0.94, 1.0, 0.4, 0.4],
        ),
        (
            &[0.0, 0.55, 0.65, 1.15, 2.25, 2.35, 3.75, 3.85, 5.0, 99.0],
            &[0.0, 0.0, 0.1, 0.2, 1.0, 1.0, 0.5, 0.2, 0.0, 0.0],
        ),
    ),
    CurveSet::builtin(
        "Juvenile Chinook Rearing",
        (
            &[0.0, 0.45, 1.05, 1.65, 2.05, 2.45, 99.0],
            &[0.0, 0.0, 0.3, 0.85, 0.95, 1.0, 1.0],
        ),
        (
            &[0.0, 0.15, 0.55, 0.95, 1.05, 1.85, 3.65, 99.0],
            &[0.24, 0.3, 0.85, 1.0, 1.0, 0.45, 0.0, 0.0],
        ),
    ),
    CurveSet::builtin(
        "Adult Coho Spawning",
        (
            &[0.0, 0.15, 0.55, 0.85, 1.15, 1.55, 1.95, 2.75, 99.0],
            &[0.0, 0.0, 0.65, 1.0, 1.0, 0.9, 0.53, 0.35, 0.35],
        ),
        (
            &[0.0, 0.45, 1.25, 1.45, 4.25, 5.0, 99.0],
            &[0.0, 0.53, 1.0, 1.0, 0.62, 0.0, 0.0],
        ),
    ),
    CurveSet::builtin(
        "Juvenile Coho Rearing",
        (
            &[0.0, 0.1, 0.25, 1.55, 2.5, 3.25, 3.9, 4.0, 99.0],
            &[0.0, 0.0, 0.25, 0.9, 1.0, 1.0, 0.9, 0.27, 0.27],
        ),
        (
            &[0.0, 0.15, 0.3, 0.45, 0.6, 1.2, 2.0, 99.0],
            &[0.78, 1.0, 0.96, 0.31, 0.2, 0.16, 0.0, 0.0],
        ),
    ),
    CurveSet::builtin(
        "Adult Sockeye Spawning",
        (
            &[0.0, 0.15, 0.55, 1.15, 1.25, 1.55, 99.0],
            &[0.0, 0.0, 0.6, 1.0, 1.0, 0.45, 0.45],
        ),
        (
            &[0.0, 0.05, 0.25, 0.85, 1.25, 2.35, 3.95, 99.0],
            &[0.0, 0.0, 0.5, 1.0, 1.0, 0.26, 0.0, 0.0],
        ),
    ),
    CurveSet::builtin(
        "Juvenile/Adult Rainbow Trout Rearing",
        (
            &[0.0, 0.55, 1.55, 2.25, 2.6, 2.75, 3.4, 4.75, 99.0],
            &[0.0, 0.0, 0.45, 0.5, 0.65, 1.0, 1.0, 0.66, 0.66],
        ),
        (
            &[0.0, 0.85, 1.75, 2.65, 3.7, 5.25, 99.0],
            &[0.25, 1.0, 0.45, 0.4, 0.1, 0.0, 0.0],
        ),
    ),
    CurveSet::builtin(
        "Spring Chinook Holding",
        (
            &[0.0, 0.8, 2.0, 6.5, 99.0],
            &[0.0, 0.0, 0.1, 1.0, 1.0],
        ),
        (
            &[0.0, 2.4, 3.8, 4.8, 6.0, 99.0],
            &[1.0, 1.0, 0.8, 0.2, 0.0, 0.0],
        ),
    ),
    CurveSet::builtin(
        "O. mykiss Juvenile",
        (
            &[0.0, 0.15, 0.65, 1.35, 2.65, 99.0],
            &[0.0, 0.0, 0.1, 0.63, 1.0, 1.0],
        ),
        (
            &[0.0, 0.75, 0.95, 1.15, 1.55, 1.85, 3.15, 3.85, 5.0, 99.0],
            &[0.55, 1.0, 1.0, 0.87, 0.78, 0.54, 0.3, 0.07, 0.0, 0.0],
        ),
    ),
];

/// Read-only registry of curve sets keyed by label.
///
/// [`CurveLibrary::standard`] borrows the built-in catalog, which lives for the
/// whole process and is safe to share between threads.
#[derive(Debug, Clone)]
pub struct CurveLibrary {
    sets: Cow<'static, [CurveSet]>,
}

impl CurveLibrary {
    /// The built-in salmonid catalog
    pub fn standard() -> Self {
        Self {
            sets: Cow::Borrowed(&STANDARD_SETS),
        }
    }

    /// A library over caller-supplied curve sets.
    ///
    /// # Errors
    /// [`Error::InvalidInput`] if two sets share a label.
    pub fn new(sets: Vec<CurveSet>) -> Result<Self> {
        let mut seen = HashSet::new();
        for set in &sets {
            if !seen.insert(set.label()) {
                return Err(Error::InvalidInput(format!(
                    "duplicate curve set label '{}'",
                    set.label()
                )));
            }
        }
        Ok(Self {
            sets: Cow::Owned(sets),
        })
    }

    /// Look up a curve set by its exact label.
    ///
    /// # Errors
    /// [`Error::UnknownCurveSet`] if no set has this label.
    pub fn lookup(&self, name: &str) -> Result<&CurveSet> {
        self.sets
            .iter()
            .find(|s| s.label() == name)
            .ok_or_else(|| Error::UnknownCurveSet(name.to_string()))
    }

    /// Whether a set with this label exists
    pub fn contains(&self, name: &str) -> bool {
        self.sets.iter().any(|s| s.label() == name)
    }

    /// Labels in catalog order
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.sets.iter().map(|s| s.label())
    }

    /// All curve sets in catalog order
    pub fn iter(&self) -> std::slice::Iter<'_, CurveSet> {
        self.sets.iter()
    }

    /// Number of curve sets
    pub fn len(&self) -> usize {
        self.sets.len()
    }

    /// Whether the library has no curve sets
    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}

impl Default for CurveLibrary {
    fn default() -> Self {
        Self::standard()
    }
}
