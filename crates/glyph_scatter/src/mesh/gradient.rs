//! Smoothed "downhill" direction estimation over mesh topology.
//!
//! [`local_gradient`] weighs each 1-ring neighbour by how much its normal
//! differs from the centre vertex's normal and averages the unit directions
//! towards the neighbours. [`smoothed_gradient`] blends that with
//! distance-weighted local gradients from the 1-ring and 2-ring.
//!
//! Nothing here mutates the mesh. A vertex without neighbours is reported as
//! [`Error::IsolatedVertex`].
use glam::{DMat3, DVec3};

use crate::error::{Error, Result};
use crate::mesh::{Mesh, Vertex, VertexId};

/// Below this dissimilarity spread every neighbour is weighted equally.
pub const FLAT_SPREAD_EPSILON: f64 = 1e-6;

fn vertex(mesh: &Mesh, id: VertexId) -> Result<&Vertex> {
    mesh.vertex(id).ok_or_else(|| {
        Error::InvalidMesh(format!(
            "vertex {id} is outside 0..{}",
            mesh.vertices().len()
        ))
    })
}

fn one_ring(mesh: &Mesh, id: VertexId) -> Result<&[VertexId]> {
    let ring = mesh.neighbors(id);
    if ring.is_empty() {
        return Err(Error::IsolatedVertex { index: id });
    }
    Ok(ring)
}

/// Weighted average of unit directions from `id` to its 1-ring.
///
/// Weights are the normal dissimilarity `1 - n·n_i` rescaled to `[0, 1]` over
/// the ring; a ring whose spread is at most [`FLAT_SPREAD_EPSILON`] is weighted
/// uniformly.
pub fn local_gradient(mesh: &Mesh, id: VertexId) -> Result<DVec3> {
    let centre = vertex(mesh, id)?;
    let ring = one_ring(mesh, id)?;

    let dissimilarity: Vec<(DVec3, f64)> = ring
        .iter()
        .map(|&n| {
            let other = &mesh.vertices()[n];
            (other.position, 1.0 - centre.normal.dot(other.normal))
        })
        .collect();

    let (dmin, dmax) = dissimilarity
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &(_, d)| {
            (lo.min(d), hi.max(d))
        });
    let spread = dmax - dmin;

    let sum: DVec3 = dissimilarity
        .iter()
        .map(|&(position, d)| {
            let weight = if spread > FLAT_SPREAD_EPSILON {
                (d - dmin) / spread
            } else {
                1.0
            };
            weight * (position - centre.position).normalize_or_zero()
        })
        .sum();

    Ok(sum / ring.len() as f64)
}

/// Two-ring smoothed gradient at `id`.
///
/// Each 1-ring neighbour `n` contributes its local gradient weighted by
/// `max_dist - |n - v|` plus the mean of its own ring's local gradients
/// weighted by `max_dist_n - |m - n|`. The ring average is then blended 50/50
/// with the local gradient at `id`.
pub fn smoothed_gradient(mesh: &Mesh, id: VertexId) -> Result<DVec3> {
    let centre = vertex(mesh, id)?.position;
    let ring = one_ring(mesh, id)?;

    let max_dist = max_distance(mesh, centre, ring);
    let mut downhill = DVec3::ZERO;

    for &n in ring {
        let position = mesh.vertices()[n].position;
        downhill += (max_dist - position.distance(centre)) * local_gradient(mesh, n)?;

        // `n` always has at least `id` in its ring.
        let outer = one_ring(mesh, n)?;
        let max_dist_outer = max_distance(mesh, position, outer);
        let mut sub_sum = DVec3::ZERO;
        for &m in outer {
            let weight = max_dist_outer - mesh.vertices()[m].position.distance(position);
            sub_sum += weight * local_gradient(mesh, m)?;
        }
        downhill += sub_sum / outer.len() as f64;
    }

    Ok((downhill / ring.len() as f64 + local_gradient(mesh, id)?) / 2.0)
}

fn max_distance(mesh: &Mesh, from: DVec3, ring: &[VertexId]) -> f64 {
    ring.iter()
        .map(|&i| mesh.vertices()[i].position.distance(from))
        .fold(0.0, f64::max)
}

/// Smoothed gradient at the vertex nearest to `point`.
pub fn gradient_at_point(mesh: &Mesh, point: DVec3) -> Result<DVec3> {
    let (nearest, _) = mesh
        .nearest_vertex(point)
        .ok_or(Error::EmptyInput { what: "gradient_at_point" })?;
    smoothed_gradient(mesh, nearest)
}

/// Right-handed orientation frame with `z` along `normal` and `x`, `y` derived from `gradient`.
///
/// `y = ĝ × ẑ` (normalized) and `x = y × ẑ`; the columns of the result are
/// `x`, `y`, `z`. Returns `None` when the gradient is zero or parallel to the
/// normal.
pub fn orientation_frame(normal: DVec3, gradient: DVec3) -> Option<DMat3> {
    let z = normal.try_normalize()?;
    let along = gradient.try_normalize()?;
    let y = along.cross(z).try_normalize()?;
    let x = y.cross(z);
    Some(DMat3::from_cols(x, y, z))
}
