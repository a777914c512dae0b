//! Candidate generation on planar mesh polygons.
//!
//! [`sample_on_polygon`] draws a point in the polygon's x/y footprint and lifts it
//! onto the polygon plane. It is stateless and may return `None`; callers redraw.
//! [`PolygonFootprint`] caches the per-polygon data the draw needs.
use glam::DVec3;
use rand::Rng;

use crate::error::Result;
use crate::geometry::{extrema, point_in_polygon, Extrema};

mod footprint;

pub use footprint::PolygonFootprint;

/// Generate a random float in the range [0, 1).
#[inline]
pub(crate) fn rand01(rng: &mut dyn Rng) -> f64 {
    // 53 random mantissa bits.
    (rng.next_u64() >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
}

/// Uniform draw in `[lo, hi)`; returns `lo` when the range is empty.
#[inline]
pub(crate) fn uniform(rng: &mut dyn Rng, lo: f64, hi: f64) -> f64 {
    lo + rand01(rng) * (hi - lo)
}

/// Draws a point on the plane of a polygon.
///
/// `x` and `y` are drawn uniformly from the half-open footprint
/// `[min.x, max.x) × [min.y, max.y)` in `extrema`, then `z` is
/// solved from `normal · (p - vertices[0]) = 0`. Returns `None` when the
/// footprint is flat in x or y (near-vertical plane) or when the resolved `z`
/// falls outside `[min.z, max.z]`.
pub fn sample_on_polygon(
    vertices: &[DVec3],
    normal: DVec3,
    extrema: &Extrema,
    rng: &mut dyn Rng,
) -> Option<DVec3> {
    let Extrema { min, max } = *extrema;
    if min.x == max.x || min.y == max.y {
        return None;
    }
    let p0 = *vertices.first()?;

    let x = uniform(rng, min.x, max.x);
    let y = uniform(rng, min.y, max.y);

    let d = normal.dot(p0);
    let z = (d - normal.y * y - normal.x * x) / normal.z;
    // NaN from a zero normal.z fails both comparisons and is rejected here too.
    if !(min.z..=max.z).contains(&z) {
        return None;
    }
    Some(DVec3::new(x, y, z))
}

/// Draws a point on the polygon plane that also lies inside the polygon outline.
///
/// Convenience wrapper for callers without a [`PolygonFootprint`].
pub fn sample_inside_polygon(
    vertices: &[DVec3],
    normal: DVec3,
    rng: &mut dyn Rng,
) -> Result<Option<DVec3>> {
    let xt = extrema(vertices)?;
    Ok(sample_on_polygon(vertices, normal, &xt, rng)
        .filter(|p| point_in_polygon(vertices, *p, normal)))
}
