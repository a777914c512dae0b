//! Wavefront OBJ export of posed cube glyphs.
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use glam::DVec3;
use glyph_scatter::mesh::Mesh;
use glyph_scatter::scatter::species::GlyphPose;

const CUBE_CORNERS: [[f64; 3]; 8] = [
    [-1.0, -1.0, -1.0],
    [1.0, -1.0, -1.0],
    [1.0, 1.0, -1.0],
    [-1.0, 1.0, -1.0],
    [-1.0, -1.0, 1.0],
    [1.0, -1.0, 1.0],
    [1.0, 1.0, 1.0],
    [-1.0, 1.0, 1.0],
];

const CUBE_FACES: [[usize; 4]; 6] = [
    [0, 3, 2, 1],
    [4, 5, 6, 7],
    [0, 1, 5, 4],
    [1, 2, 6, 5],
    [2, 3, 7, 6],
    [3, 0, 4, 7],
];

/// Output options for [`write_glyphs_obj`].
#[derive(Debug, Clone)]
pub struct ObjConfig {
    /// Half-width of the cube each pose is applied to.
    pub cube_radius: f64,
    /// Also write the source mesh as its own object.
    pub include_mesh: bool,
}

impl Default for ObjConfig {
    fn default() -> Self {
        Self {
            cube_radius: 0.1,
            include_mesh: true,
        }
    }
}

impl ObjConfig {
    pub fn with_cube_radius(mut self, cube_radius: f64) -> Self {
        self.cube_radius = cube_radius;
        self
    }

    pub fn with_include_mesh(mut self, include_mesh: bool) -> Self {
        self.include_mesh = include_mesh;
        self
    }
}

/// Writes the mesh and one cube per pose to `path`.
pub fn write_glyphs_obj(
    mesh: &Mesh,
    poses: &[GlyphPose],
    cfg: &ObjConfig,
    path: impl AsRef<Path>,
) -> anyhow::Result<()> {
    let path = path.as_ref();
    let mut out = BufWriter::new(File::create(path)?);
    let mut next_index = 1usize;

    if cfg.include_mesh {
        writeln!(out, "o surface")?;
        for v in mesh.vertices() {
            write_vertex(&mut out, v.position)?;
        }
        for polygon in mesh.polygons() {
            write!(out, "f")?;
            for &v in &polygon.vertices {
                write!(out, " {}", v + next_index)?;
            }
            writeln!(out)?;
        }
        next_index += mesh.vertices().len();
    }

    for (i, pose) in poses.iter().enumerate() {
        writeln!(out, "o glyph_{i}")?;
        let affine = pose.to_affine();
        for corner in CUBE_CORNERS {
            let local = DVec3::from_array(corner) * cfg.cube_radius;
            write_vertex(&mut out, affine.transform_point3(local))?;
        }
        for face in CUBE_FACES {
            writeln!(
                out,
                "f {} {} {} {}",
                face[0] + next_index,
                face[1] + next_index,
                face[2] + next_index,
                face[3] + next_index
            )?;
        }
        next_index += CUBE_CORNERS.len();
    }

    out.flush()?;
    tracing::info!(path = %path.display(), glyphs = poses.len(), "wrote OBJ");
    Ok(())
}

fn write_vertex(out: &mut impl Write, p: DVec3) -> std::io::Result<()> {
    writeln!(out, "v {:.6} {:.6} {:.6}", p.x, p.y, p.z)
}
