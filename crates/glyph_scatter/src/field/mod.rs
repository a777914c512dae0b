//! Scalar fields, sampling domains and range mappers.
//!
//! A [`ScalarField`] is any pure function of a 3D point. The mappers in
//! [`mapper`] turn field values into glyph parameters: [`LinearMapper`] for a
//! known input range, [`FieldMapper3D`] when the range has to be discovered by
//! probing the field over a [`Domain`].
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use glam::DVec3;

use crate::error::{Error, Result};
use crate::geometry::{extrema, Extrema};
use crate::mesh::Mesh;

pub mod mapper;

pub use mapper::{Affine, Bin, Calibration, FieldMapper3D, LinearMapper};

/// A scalar function of a point, optionally aware of the enclosing polygon.
pub trait ScalarField {
    fn sample(&self, p: DVec3) -> f64;

    /// Sample at `p` inside the polygon outlined by `polygon`.
    ///
    /// Defaults to [`ScalarField::sample`]; range discovery always calls that.
    fn sample_on(&self, p: DVec3, polygon: &[DVec3]) -> f64 {
        let _ = polygon;
        self.sample(p)
    }
}

impl<F> ScalarField for F
where
    F: Fn(DVec3) -> f64,
{
    #[inline]
    fn sample(&self, p: DVec3) -> f64 {
        self(p)
    }
}

/// Closed numeric interval `[min, max]`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
}

impl AxisRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn width(&self) -> f64 {
        self.max - self.min
    }

    /// Inclusive membership.
    pub fn contains(&self, v: f64) -> bool {
        self.min <= v && v <= self.max
    }

    fn validate(&self, name: &str) -> Result<()> {
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(Error::InvalidConfig(format!("{name} must be finite")));
        }
        if self.min > self.max {
            return Err(Error::InvalidConfig(format!(
                "{name} is inverted ({} > {})",
                self.min, self.max
            )));
        }
        Ok(())
    }
}

impl From<(f64, f64)> for AxisRange {
    fn from((min, max): (f64, f64)) -> Self {
        Self { min, max }
    }
}

/// Axis-aligned probing grid: three inclusive ranges and a step.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Domain {
    pub x: AxisRange,
    pub y: AxisRange,
    pub z: AxisRange,
    pub step: f64,
}

impl Domain {
    pub const DEFAULT_STEP: f64 = 0.5;

    pub fn new(x: impl Into<AxisRange>, y: impl Into<AxisRange>, z: impl Into<AxisRange>) -> Self {
        Self {
            x: x.into(),
            y: y.into(),
            z: z.into(),
            step: Self::DEFAULT_STEP,
        }
    }

    /// Domain spanning a bounding box.
    pub fn from_extrema(xt: &Extrema) -> Self {
        Self::new(
            (xt.min.x, xt.max.x),
            (xt.min.y, xt.max.y),
            (xt.min.z, xt.max.z),
        )
    }

    /// Domain spanning every vertex of `mesh`.
    pub fn from_mesh(mesh: &Mesh) -> Result<Self> {
        let positions: Vec<DVec3> = mesh.vertices().iter().map(|v| v.position).collect();
        Ok(Self::from_extrema(&extrema(&positions)?))
    }

    pub fn with_step(mut self, step: f64) -> Self {
        self.step = step;
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.x.validate("domain x range")?;
        self.y.validate("domain y range")?;
        self.z.validate("domain z range")?;
        if !self.step.is_finite() || self.step <= 0.0 {
            return Err(Error::InvalidConfig("domain step must be > 0".into()));
        }
        Ok(())
    }

    /// Inclusive grid coordinates `min + i·step` along one axis.
    pub(crate) fn axis_points(&self, range: AxisRange) -> impl Iterator<Item = f64> {
        let step = self.step;
        (0u64..)
            .map(move |i| range.min + i as f64 * step)
            .take_while(move |v| *v <= range.max)
    }

    /// Every grid point, x outermost and z innermost.
    pub fn grid_points(&self) -> impl Iterator<Item = DVec3> + '_ {
        self.axis_points(self.x).flat_map(move |x| {
            self.axis_points(self.y).flat_map(move |y| {
                self.axis_points(self.z).map(move |z| DVec3::new(x, y, z))
            })
        })
    }
}
