#![forbid(unsafe_code)]

mod export;

pub use export::{write_glyphs_obj, ObjConfig};

use glyph_scatter::mesh::{Mesh, MeshBuilder};
use tracing_subscriber::EnvFilter;

/// Installs a formatting subscriber; `RUST_LOG` overrides the default `info` level.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // A second call (e.g. from tests) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// Hilly `n × n` terrain with unit cells, every quad selected.
pub fn hills(n: usize) -> anyhow::Result<Mesh> {
    let mesh = MeshBuilder::heightfield(n, n, 1.0, |x, y| {
        2.0 * (x * 0.25).sin() * (y * 0.2).cos() + 0.05 * x
    })
    .build()?;
    Ok(mesh)
}
