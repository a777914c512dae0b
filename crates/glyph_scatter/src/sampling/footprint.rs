//! Cached per-polygon sampling state.
use glam::DVec3;
use rand::Rng;

use crate::error::Result;
use crate::geometry::{extrema, point_in_polygon, Extrema};
use crate::sampling::sample_on_polygon;

/// Vertex coordinates, normal and extrema of one polygon, computed once per polygon.
#[derive(Debug, Clone)]
pub struct PolygonFootprint {
    pub vertices: Vec<DVec3>,
    pub normal: DVec3,
    pub extrema: Extrema,
}

impl PolygonFootprint {
    pub fn new(vertices: Vec<DVec3>, normal: DVec3) -> Result<Self> {
        let extrema = extrema(&vertices)?;
        Ok(Self {
            vertices,
            normal,
            extrema,
        })
    }

    /// Returns `true` if no draw on this footprint can ever succeed.
    ///
    /// That is the case for a footprint that is flat in x or y, and for a plane
    /// whose normal has no usable z component.
    pub fn is_degenerate(&self) -> bool {
        let Extrema { min, max } = self.extrema;
        min.x == max.x || min.y == max.y || self.normal.z == 0.0 || !self.normal.is_finite()
    }

    /// Draws one candidate; `clip` additionally requires the point to lie inside the outline.
    pub fn draw(&self, rng: &mut dyn Rng, clip: bool) -> Option<DVec3> {
        let p = sample_on_polygon(&self.vertices, self.normal, &self.extrema, rng)?;
        if clip && !point_in_polygon(&self.vertices, p, self.normal) {
            return None;
        }
        Some(p)
    }
}
