//! Geometry predicates used by the sampler and by exclusion rules.
//!
//! Every region test here is symmetric in its two point arguments: the
//! per-axis separation is taken as `|p - q|`, which is exact under IEEE
//! negation, so `within_*(p, q, ..) == within_*(q, p, ..)` holds bit for bit.
use glam::DVec3;

use crate::error::{Error, Result};

mod triangle;

pub use triangle::{point_in_polygon, point_in_triangle, quad_to_triangles};

/// Componentwise minimum and maximum of a point set.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Extrema {
    pub min: DVec3,
    pub max: DVec3,
}

impl Extrema {
    /// Size of the bounding box along each axis.
    pub fn extent(&self) -> DVec3 {
        self.max - self.min
    }

    /// Returns `true` if `p` lies inside the closed bounding box.
    pub fn contains(&self, p: DVec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }
}

/// Componentwise mean of `points`.
pub fn centroid(points: &[DVec3]) -> Result<DVec3> {
    if points.is_empty() {
        return Err(Error::EmptyInput { what: "centroid" });
    }
    let sum: DVec3 = points.iter().copied().sum();
    Ok(sum / points.len() as f64)
}

/// Componentwise minimum and maximum of `points`.
pub fn extrema(points: &[DVec3]) -> Result<Extrema> {
    let (first, rest) = points
        .split_first()
        .ok_or(Error::EmptyInput { what: "extrema" })?;
    let (min, max) = rest
        .iter()
        .fold((*first, *first), |(min, max), p| (min.min(*p), max.max(*p)));
    Ok(Extrema { min, max })
}

/// Euclidean ball membership, `|p - q| < r`.
///
/// A cube pre-check with half-width `r` rejects far points before the
/// squared distance is computed.
#[inline]
pub fn within_radius(p: DVec3, q: DVec3, r: f64) -> bool {
    within_cube(p, q, r) && p.distance_squared(q) < r * r
}

/// Axis-aligned cube membership with half-width `r`; the boundary is excluded.
#[inline]
pub fn within_cube(p: DVec3, q: DVec3, r: f64) -> bool {
    within_box(p, q, DVec3::splat(r))
}

/// Axis-aligned box membership with independent half-widths per axis.
#[inline]
pub fn within_box(p: DVec3, q: DVec3, half_widths: DVec3) -> bool {
    (p - q).abs().cmplt(half_widths).all()
}
