//! Incremental mesh construction from foreign vector types.
use std::collections::HashSet;

use glam::DVec3;
use mint::Vector3;

use crate::error::Result;
use crate::mesh::{Edge, Mesh, Polygon, Vertex, VertexId};

/// Builds a [`Mesh`] from positions and faces.
///
/// Face normals come from Newell's method, missing vertex normals from the
/// area-weighted sum of adjacent face normals, and polygon boundary edges are
/// added automatically.
#[derive(Debug, Default, Clone)]
pub struct MeshBuilder {
    positions: Vec<DVec3>,
    normals: Vec<Option<DVec3>>,
    edges: Vec<Edge>,
    faces: Vec<(Vec<VertexId>, bool)>,
}

impl MeshBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a vertex whose normal is derived from its faces.
    pub fn vertex(&mut self, position: impl Into<Vector3<f64>>) -> VertexId {
        self.positions.push(DVec3::from(position.into()));
        self.normals.push(None);
        self.positions.len() - 1
    }

    /// Adds a vertex with an explicit normal.
    pub fn vertex_with_normal(
        &mut self,
        position: impl Into<Vector3<f64>>,
        normal: impl Into<Vector3<f64>>,
    ) -> VertexId {
        let id = self.vertex(position);
        self.normals[id] = Some(DVec3::from(normal.into()).normalize_or_zero());
        id
    }

    /// Adds a standalone edge (one not implied by any face).
    pub fn edge(&mut self, a: VertexId, b: VertexId) -> &mut Self {
        self.edges.push(Edge(a, b));
        self
    }

    /// Adds an unselected face.
    pub fn polygon(&mut self, vertices: impl Into<Vec<VertexId>>) -> &mut Self {
        self.faces.push((vertices.into(), false));
        self
    }

    /// Adds a selected face.
    pub fn selected_polygon(&mut self, vertices: impl Into<Vec<VertexId>>) -> &mut Self {
        self.faces.push((vertices.into(), true));
        self
    }

    pub fn build(&self) -> Result<Mesh> {
        let position = |v: VertexId| self.positions.get(v).copied().unwrap_or(DVec3::ZERO);

        let mut accumulated = vec![DVec3::ZERO; self.positions.len()];
        let mut polygons = Vec::with_capacity(self.faces.len());
        let mut edges = self.edges.clone();
        let mut seen: HashSet<Edge> = edges.iter().map(|e| e.canonical()).collect();

        for (ids, selected) in &self.faces {
            let area_normal = newell_normal(ids.iter().map(|&v| position(v)));
            for (i, &v) in ids.iter().enumerate() {
                if let Some(acc) = accumulated.get_mut(v) {
                    *acc += area_normal;
                }
                let edge = Edge(v, ids[(i + 1) % ids.len()]);
                if edge.0 != edge.1 && seen.insert(edge.canonical()) {
                    edges.push(edge);
                }
            }
            polygons.push(
                Polygon::new(ids.clone(), area_normal.normalize_or_zero()).with_selected(*selected),
            );
        }

        let vertices = self
            .positions
            .iter()
            .zip(&self.normals)
            .zip(accumulated)
            .map(|((&p, n), acc)| Vertex::new(p, n.unwrap_or_else(|| acc.normalize_or_zero())))
            .collect();

        Mesh::try_new(vertices, edges, polygons)
    }

    /// Regular grid of quads over `[0, cols·cell] × [0, rows·cell]` lifted by `height(x, y)`.
    ///
    /// Every face is selected.
    pub fn heightfield(cols: usize, rows: usize, cell: f64, height: impl Fn(f64, f64) -> f64) -> Self {
        let mut builder = Self::new();
        for j in 0..=rows {
            for i in 0..=cols {
                let (x, y) = (i as f64 * cell, j as f64 * cell);
                builder.vertex([x, y, height(x, y)]);
            }
        }
        let id = |i: usize, j: usize| j * (cols + 1) + i;
        for j in 0..rows {
            for i in 0..cols {
                builder.selected_polygon([id(i, j), id(i + 1, j), id(i + 1, j + 1), id(i, j + 1)]);
            }
        }
        builder
    }
}

/// Newell's polygon normal; its length is twice the (planar) polygon area.
fn newell_normal(points: impl Iterator<Item = DVec3> + Clone) -> DVec3 {
    let next = points.clone().cycle().skip(1);
    points
        .zip(next)
        .fold(DVec3::ZERO, |n, (cur, nxt)| {
            n + DVec3::new(
                (cur.y - nxt.y) * (cur.z + nxt.z),
                (cur.z - nxt.z) * (cur.x + nxt.x),
                (cur.x - nxt.x) * (cur.y + nxt.y),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_heightfield_has_upward_normals_and_grid_edges() {
        let mesh = MeshBuilder::heightfield(2, 2, 1.0, |_, _| 0.0).build().unwrap();
        assert_eq!(mesh.vertices().len(), 9);
        assert_eq!(mesh.polygons().len(), 4);
        assert_eq!(mesh.selected_count(), 4);
        // 2 * 3 horizontal + 2 * 3 vertical grid edges.
        assert_eq!(mesh.edges().len(), 12);
        for v in mesh.vertices() {
            assert!((v.normal - DVec3::Z).length() < 1e-12);
        }
        for p in mesh.polygons() {
            assert!((p.normal - DVec3::Z).length() < 1e-12);
        }
        // Centre vertex touches four others.
        assert_eq!(mesh.neighbors(4).len(), 4);
    }

    #[test]
    fn explicit_normals_are_kept() {
        let mut b = MeshBuilder::new();
        let a = b.vertex_with_normal([0.0, 0.0, 0.0], [0.0, 0.0, 2.0]);
        let c = b.vertex([1.0, 0.0, 0.0]);
        let d = b.vertex([0.0, 1.0, 0.0]);
        b.polygon(vec![a, c, d]);
        let mesh = b.build().unwrap();
        assert_eq!(mesh.vertices()[a].normal, DVec3::Z);
        assert!(!mesh.polygons()[0].selected);
        assert_eq!(mesh.edges().len(), 3);
    }

    #[test]
    fn newell_normal_of_unit_square() {
        let square = [
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(1.0, 0.0, 0.0),
            DVec3::new(1.0, 1.0, 0.0),
            DVec3::new(0.0, 1.0, 0.0),
        ];
        assert_eq!(newell_normal(square.into_iter()), DVec3::new(0.0, 0.0, 2.0));
    }

    #[test]
    fn out_of_range_face_fails_build() {
        let mut b = MeshBuilder::new();
        b.vertex([0.0, 0.0, 0.0]);
        b.polygon(vec![0, 1, 2]);
        assert!(b.build().is_err());
    }
}
