//! Glyph distribution over the selected polygons of a mesh.
use glam::DVec3;

pub mod cancel;
pub mod engine;
pub mod events;
pub(crate) mod index;
pub mod species;

pub type EngineId = String;

/// Value and orientation carried by one accepted placement point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Glyph {
    pub value: f64,
    /// Face normal of the polygon the point was placed on.
    pub normal: DVec3,
}

/// An accepted point with its glyph and the polygon it was drawn on.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    pub point: DVec3,
    pub glyph: Glyph,
    /// Index into [`crate::mesh::Mesh::polygons`].
    pub polygon: usize,
}

/// Ordered list of placements produced by one run; points are unique.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PlacementResult {
    placements: Vec<Placement>,
}

impl PlacementResult {
    pub fn new() -> Self {
        Self {
            placements: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.placements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    /// Placements in acceptance order.
    pub fn iter(&self) -> std::slice::Iter<'_, Placement> {
        self.placements.iter()
    }

    pub fn as_slice(&self) -> &[Placement] {
        &self.placements
    }

    pub fn points(&self) -> impl Iterator<Item = DVec3> + '_ {
        self.placements.iter().map(|p| p.point)
    }

    /// Glyph stored at exactly `point`.
    pub fn get(&self, point: DVec3) -> Option<&Glyph> {
        self.placements
            .iter()
            .find(|p| p.point == point)
            .map(|p| &p.glyph)
    }

    pub fn contains_point(&self, point: DVec3) -> bool {
        self.get(point).is_some()
    }

    pub fn into_vec(self) -> Vec<Placement> {
        self.placements
    }

    pub(crate) fn push(&mut self, placement: Placement) {
        self.placements.push(placement);
    }

    pub(crate) fn point_at(&self, index: usize) -> DVec3 {
        self.placements[index].point
    }
}

impl<'a> IntoIterator for &'a PlacementResult {
    type Item = &'a Placement;
    type IntoIter = std::slice::Iter<'a, Placement>;

    fn into_iter(self) -> Self::IntoIter {
        self.placements.iter()
    }
}
