#![forbid(unsafe_code)]
//! glyph_scatter: Non-overlapping glyph placement on the selected polygons of a mesh.
//!
//! Modules:
//! - geometry: centroid, extrema, cube/box/radius membership, point-in-triangle
//! - mesh: vertices, edges, polygons with selection; builder; gradient estimation
//! - sampling: candidate points on polygon planes
//! - field: scalar fields and linear/binned mappers onto glyph values
//! - scatter: distribution engine, events, cancellation, glyph styles
//!
//! For examples, see the `glyph_scatter_examples` crate.
pub mod error;
pub mod field;
pub mod geometry;
pub mod mesh;
pub mod sampling;
pub mod scatter;

/// Convenient re-exports for common types. Import with `use glyph_scatter::prelude::*;`.
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::field::{AxisRange, Domain, FieldMapper3D, LinearMapper, ScalarField};
    pub use crate::geometry::{
        centroid, extrema, point_in_polygon, point_in_triangle, quad_to_triangles, within_box,
        within_cube, within_radius, Extrema,
    };
    pub use crate::mesh::gradient::{
        gradient_at_point, local_gradient, orientation_frame, smoothed_gradient,
    };
    pub use crate::mesh::{Edge, Mesh, MeshBuilder, Polygon, Vertex, VertexId};
    pub use crate::sampling::{sample_inside_polygon, sample_on_polygon, PolygonFootprint};
    pub use crate::scatter::cancel::CancelToken;
    pub use crate::scatter::engine::{
        DistributeConfig, DistributionEngine, PolygonOutcome, RunOutcome, RunStats,
    };
    pub use crate::scatter::events::{
        DistributionEvent, EventKind, EventSink, FnSink, MultiSink, VecSink,
    };
    pub use crate::scatter::species::{GlyphPose, GlyphStyle};
    pub use crate::scatter::{EngineId, Glyph, Placement, PlacementResult};
}
