//! Read-only surface mesh model with edge adjacency.
//!
//! A [`Mesh`] is owned by the caller (usually a mesh-editing host) and only read
//! here. Vertices are addressed by their slot in the vertex list, which is the
//! stable index edges and polygons refer to. Adjacency is derived from the edge
//! list once, at construction, in edge order.
use std::collections::HashSet;

use glam::DVec3;

use crate::error::{Error, Result};
use crate::geometry::centroid;

mod builder;
pub mod gradient;

pub use builder::MeshBuilder;

/// Vertex index into [`Mesh::vertices`].
pub type VertexId = usize;

/// A mesh vertex with its position and (unit) normal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vertex {
    pub position: DVec3,
    pub normal: DVec3,
}

impl Vertex {
    pub fn new(position: DVec3, normal: DVec3) -> Self {
        Self { position, normal }
    }
}

/// Unordered pair of vertex indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Edge(pub VertexId, pub VertexId);

impl Edge {
    /// The same edge with its endpoints in ascending order.
    pub fn canonical(self) -> Self {
        if self.0 <= self.1 {
            self
        } else {
            Edge(self.1, self.0)
        }
    }

    /// The endpoint opposite `v`, or `None` if `v` is not on this edge.
    pub fn other(self, v: VertexId) -> Option<VertexId> {
        if self.0 == v {
            Some(self.1)
        } else if self.1 == v {
            Some(self.0)
        } else {
            None
        }
    }
}

/// A planar face: ordered vertex indices, face normal and selection flag.
#[derive(Clone, Debug, PartialEq)]
pub struct Polygon {
    pub vertices: Vec<VertexId>,
    pub normal: DVec3,
    pub selected: bool,
}

impl Polygon {
    pub fn new(vertices: Vec<VertexId>, normal: DVec3) -> Self {
        Self {
            vertices,
            normal,
            selected: false,
        }
    }

    /// Marks the polygon as selected.
    pub fn with_selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }
}

#[derive(Clone, Debug)]
pub struct Mesh {
    vertices: Vec<Vertex>,
    edges: Vec<Edge>,
    polygons: Vec<Polygon>,
    neighbors: Vec<Vec<VertexId>>,
}

impl Mesh {
    /// Builds a mesh, validating every index and deriving adjacency.
    ///
    /// Duplicate edges (in either orientation) are kept once, at their first
    /// occurrence.
    pub fn try_new(vertices: Vec<Vertex>, edges: Vec<Edge>, polygons: Vec<Polygon>) -> Result<Self> {
        let n = vertices.len();

        let mut seen = HashSet::with_capacity(edges.len());
        let mut unique_edges = Vec::with_capacity(edges.len());
        for edge in edges {
            if edge.0 >= n || edge.1 >= n {
                return Err(Error::InvalidMesh(format!(
                    "edge ({}, {}) references a vertex outside 0..{n}",
                    edge.0, edge.1
                )));
            }
            if edge.0 == edge.1 {
                return Err(Error::InvalidMesh(format!(
                    "edge ({}, {}) connects a vertex to itself",
                    edge.0, edge.1
                )));
            }
            if seen.insert(edge.canonical()) {
                unique_edges.push(edge);
            }
        }

        for (i, poly) in polygons.iter().enumerate() {
            if poly.vertices.len() < 3 {
                return Err(Error::InvalidMesh(format!(
                    "polygon {i} has {} vertices, need at least 3",
                    poly.vertices.len()
                )));
            }
            if let Some(bad) = poly.vertices.iter().find(|&&v| v >= n) {
                return Err(Error::InvalidMesh(format!(
                    "polygon {i} references vertex {bad} outside 0..{n}"
                )));
            }
        }

        let mut neighbors = vec![Vec::new(); n];
        for &Edge(a, b) in &unique_edges {
            neighbors[a].push(b);
            neighbors[b].push(a);
        }

        Ok(Self {
            vertices,
            edges: unique_edges,
            polygons,
            neighbors,
        })
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn polygons(&self) -> &[Polygon] {
        &self.polygons
    }

    pub fn vertex(&self, id: VertexId) -> Option<&Vertex> {
        self.vertices.get(id)
    }

    /// 1-ring of `id`: vertices sharing an edge with it, in edge order.
    pub fn neighbors(&self, id: VertexId) -> &[VertexId] {
        self.neighbors.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Vertices that share no edge with any other vertex, in index order.
    pub fn isolated_vertices(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.neighbors
            .iter()
            .enumerate()
            .filter(|(_, ring)| ring.is_empty())
            .map(|(i, _)| i)
    }

    /// Fails with [`Error::IsolatedVertex`] on the first vertex without neighbours.
    ///
    /// Gradient estimation needs a 1-ring at every vertex a placement can snap to.
    pub fn validate_connected(&self) -> Result<()> {
        match self.isolated_vertices().next() {
            Some(index) => Err(Error::IsolatedVertex { index }),
            None => Ok(()),
        }
    }

    /// Positions of a polygon's vertices, in polygon order.
    pub fn polygon_positions(&self, polygon: &Polygon) -> Vec<DVec3> {
        polygon
            .vertices
            .iter()
            .map(|&v| self.vertices[v].position)
            .collect()
    }

    /// Selected polygons with their index in [`Mesh::polygons`].
    pub fn selected_polygons(&self) -> impl Iterator<Item = (usize, &Polygon)> + '_ {
        self.polygons.iter().enumerate().filter(|(_, p)| p.selected)
    }

    pub fn selected_count(&self) -> usize {
        self.polygons.iter().filter(|p| p.selected).count()
    }

    /// Sets the selection flag on every polygon.
    pub fn select_all(&mut self, selected: bool) {
        for p in &mut self.polygons {
            p.selected = selected;
        }
    }

    /// Selects every polygon whose centroid satisfies `pred`; others keep their flag.
    ///
    /// Returns the number of polygons newly selected.
    pub fn select_polygons_where(&mut self, pred: impl Fn(DVec3) -> bool) -> usize {
        let mut newly = 0;
        for i in 0..self.polygons.len() {
            if self.polygons[i].selected {
                continue;
            }
            let positions = self.polygon_positions(&self.polygons[i]);
            // Polygons are validated non-empty, so the centroid always exists.
            if centroid(&positions).is_ok_and(&pred) {
                self.polygons[i].selected = true;
                newly += 1;
            }
        }
        newly
    }

    /// Index of the vertex closest to `point`, with its distance.
    pub fn nearest_vertex(&self, point: DVec3) -> Option<(VertexId, f64)> {
        self.vertices
            .iter()
            .enumerate()
            .map(|(i, v)| (i, v.position.distance_squared(point)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, d2)| (i, d2.sqrt()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Mesh {
        let v = |x: f64, y: f64| Vertex::new(DVec3::new(x, y, 0.0), DVec3::Z);
        Mesh::try_new(
            vec![v(0.0, 0.0), v(1.0, 0.0), v(1.0, 1.0), v(0.0, 1.0)],
            vec![Edge(0, 1), Edge(1, 2), Edge(2, 3), Edge(3, 0), Edge(1, 0)],
            vec![Polygon::new(vec![0, 1, 2, 3], DVec3::Z)],
        )
        .unwrap()
    }

    #[test]
    fn adjacency_follows_edge_order_and_skips_duplicates() {
        let mesh = square();
        assert_eq!(mesh.edges().len(), 4);
        assert_eq!(mesh.neighbors(0), &[1, 3]);
        assert_eq!(mesh.neighbors(1), &[0, 2]);
        assert!(mesh.neighbors(42).is_empty());
    }

    #[test]
    fn invalid_indices_are_rejected() {
        let v = Vertex::new(DVec3::ZERO, DVec3::Z);
        let err = Mesh::try_new(vec![v, v], vec![Edge(0, 2)], Vec::new()).unwrap_err();
        assert!(matches!(err, Error::InvalidMesh(_)));

        let err = Mesh::try_new(vec![v, v], vec![Edge(1, 1)], Vec::new()).unwrap_err();
        assert!(matches!(err, Error::InvalidMesh(_)));

        let err = Mesh::try_new(
            vec![v, v, v],
            Vec::new(),
            vec![Polygon::new(vec![0, 1, 5], DVec3::Z)],
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidMesh(_)));

        let err = Mesh::try_new(vec![v, v], Vec::new(), vec![Polygon::new(vec![0, 1], DVec3::Z)])
            .unwrap_err();
        assert!(matches!(err, Error::InvalidMesh(_)));
    }

    #[test]
    fn select_where_uses_polygon_centroid() {
        let mut mesh = square();
        assert_eq!(mesh.selected_count(), 0);
        assert_eq!(mesh.select_polygons_where(|c| c.x > 1.0), 0);
        assert_eq!(mesh.select_polygons_where(|c| c.x == 0.5), 1);
        assert_eq!(mesh.selected_polygons().count(), 1);
        mesh.select_all(false);
        assert_eq!(mesh.selected_count(), 0);
    }

    #[test]
    fn nearest_vertex_finds_closest_slot() {
        let mesh = square();
        let (id, dist) = mesh.nearest_vertex(DVec3::new(0.9, 1.2, 0.0)).unwrap();
        assert_eq!(id, 2);
        assert!((dist - (0.01f64 + 0.04).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn stray_vertex_fails_connectivity_check() {
        let mesh = square();
        assert_eq!(mesh.isolated_vertices().count(), 0);
        assert!(mesh.validate_connected().is_ok());

        let v = |x: f64, y: f64| Vertex::new(DVec3::new(x, y, 0.0), DVec3::Z);
        let mesh = Mesh::try_new(
            vec![v(0.0, 0.0), v(1.0, 0.0), v(0.5, 0.5), v(0.0, 1.0), v(2.0, 2.0)],
            vec![Edge(0, 1), Edge(1, 3), Edge(3, 0)],
            vec![Polygon::new(vec![0, 1, 3], DVec3::Z)],
        )
        .unwrap();
        assert_eq!(mesh.isolated_vertices().collect::<Vec<_>>(), vec![2, 4]);
        assert!(matches!(
            mesh.validate_connected(),
            Err(Error::IsolatedVertex { index: 2 })
        ));
    }

    #[test]
    fn edge_other_endpoint() {
        assert_eq!(Edge(3, 7).other(3), Some(7));
        assert_eq!(Edge(3, 7).other(7), Some(3));
        assert_eq!(Edge(3, 7).other(1), None);
        assert_eq!(Edge(7, 3).canonical(), Edge(3, 7));
    }
}
