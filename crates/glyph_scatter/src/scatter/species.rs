//! Glyph families: how far apart their glyphs stay and how a unit cube is posed for each.
use glam::{DAffine3, DMat3, DQuat, DVec3};

use crate::error::Result;
use crate::geometry::within_cube;
use crate::mesh::gradient::{gradient_at_point, orientation_frame};
use crate::mesh::Mesh;
use crate::scatter::{Placement, PlacementResult};

/// Smallest magnitude a value is clamped to before taking its reciprocal.
const MIN_SIZE_VALUE: f64 = 1e-6;

/// Cube glyph families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GlyphStyle {
    /// Column standing on the surface, its height following the value.
    Height,
    /// Bar stretched along the frame's `y` axis (across the gradient).
    Length,
    /// Bar stretched along the frame's `x` axis (with the gradient).
    Width,
    /// Cube scaled uniformly by the value.
    Size,
}

impl GlyphStyle {
    /// Cube half-width of the exclusion rule, for styles where it does not depend on the value.
    pub fn fixed_half_width(self) -> Option<f64> {
        match self {
            Self::Height => Some(4.0),
            Self::Length | Self::Width => Some(5.0),
            Self::Size => None,
        }
    }

    /// Exclusion rule for this style.
    ///
    /// `Size` excludes within a cube of half-width `s + 1/s`, `s = 2.5·v`, taking
    /// the larger of the existing point's and the candidate's reach so the rule is
    /// symmetric. `value` depends on the point alone, so an existing point's reach
    /// always agrees with its stored glyph value when the engine's value function
    /// is `|p, _| value(p)`. Other styles ignore `value`.
    pub fn exclusion<'a, F>(self, value: F) -> impl Fn(DVec3, DVec3, &[DVec3]) -> bool + 'a
    where
        F: Fn(DVec3) -> f64 + 'a,
    {
        move |existing, candidate, _| match self.fixed_half_width() {
            Some(half) => within_cube(existing, candidate, half),
            None => {
                let reach = size_reach(value(candidate)).max(size_reach(value(existing)));
                within_cube(existing, candidate, reach)
            }
        }
    }

    /// Transform a renderer applies to a unit cube centred at the origin.
    ///
    /// The rotation aligns the cube with the surface normal and the smoothed
    /// gradient at the vertex nearest to the placement; where the gradient gives no
    /// direction, the shortest arc from `+Z` to the normal is used instead.
    ///
    /// Fails with [`crate::error::Error::IsolatedVertex`] when the nearest vertex
    /// has no neighbours; check [`Mesh::validate_connected`] before sampling.
    pub fn pose(self, mesh: &Mesh, placement: &Placement) -> Result<GlyphPose> {
        let v = placement.glyph.value;
        let normal = placement.glyph.normal.normalize_or_zero();
        let gradient = gradient_at_point(mesh, placement.point)?;
        let rotation = orientation_frame(normal, gradient).unwrap_or_else(|| {
            if normal == DVec3::ZERO {
                DMat3::IDENTITY
            } else {
                DMat3::from_quat(DQuat::from_rotation_arc(DVec3::Z, normal))
            }
        });

        let (scale, translation) = match self {
            Self::Height => (
                DVec3::new(0.75, 0.75, 1.15 * v),
                placement.point + 0.85 * v * normal,
            ),
            Self::Length => (DVec3::new(1.0, v, 1.0), placement.point),
            Self::Width => (DVec3::new(v, 1.0, 1.0), placement.point),
            Self::Size => (DVec3::splat(v), placement.point),
        };

        Ok(GlyphPose {
            translation,
            rotation,
            scale,
        })
    }

    /// Poses for every placement of a run, in acceptance order.
    pub fn poses(self, mesh: &Mesh, result: &PlacementResult) -> Result<Vec<GlyphPose>> {
        result.iter().map(|p| self.pose(mesh, p)).collect()
    }
}

fn size_reach(value: f64) -> f64 {
    let s = 2.5 * value.abs().max(MIN_SIZE_VALUE);
    s + 1.0 / s
}

/// Placement transform of one glyph: scale, then rotate, then translate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphPose {
    pub translation: DVec3,
    /// Columns are the glyph's local `x`, `y`, `z` axes.
    pub rotation: DMat3,
    pub scale: DVec3,
}

impl GlyphPose {
    pub fn to_affine(&self) -> DAffine3 {
        DAffine3::from_mat3_translation(
            self.rotation * DMat3::from_diagonal(self.scale),
            self.translation,
        )
    }
}
