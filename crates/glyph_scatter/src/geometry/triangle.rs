//! Half-space point-in-triangle test and polygon helpers built on it.
use glam::DVec3;

/// Returns `true` if `p` lies inside triangle `(a, b, c)`.
///
/// For each edge the sign of `((end - start) × (p - start)) · normal` is taken;
/// the point is inside when all three signs agree (all positive or all
/// non-positive). `normal` fixes the orientation, so `p` is assumed to lie in
/// (or be projected onto) the triangle's plane.
pub fn point_in_triangle(a: DVec3, b: DVec3, c: DVec3, p: DVec3, normal: DVec3) -> bool {
    let side = |start: DVec3, end: DVec3| (end - start).cross(p - start).dot(normal) > 0.0;
    let ab = side(a, b);
    let bc = side(b, c);
    let ca = side(c, a);
    (ab && bc && ca) || (!ab && !bc && !ca)
}

/// Splits a quad into the triangles `[0, 1, 3]` and `[1, 2, 3]`.
pub fn quad_to_triangles<T: Copy>(quad: [T; 4]) -> [[T; 3]; 2] {
    [[quad[0], quad[1], quad[3]], [quad[1], quad[2], quad[3]]]
}

/// Returns `true` if `p` lies inside the convex polygon outlined by `vertices`.
///
/// The polygon is fanned from its first vertex and each fan triangle is
/// checked with [`point_in_triangle`]. Polygons with fewer than three
/// vertices contain nothing.
pub fn point_in_polygon(vertices: &[DVec3], p: DVec3, normal: DVec3) -> bool {
    let Some((&apex, rest)) = vertices.split_first() else {
        return false;
    };
    rest.windows(2)
        .any(|pair| point_in_triangle(apex, pair[0], pair[1], p, normal))
}
