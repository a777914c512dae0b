use glam::DVec3;
use glyph_scatter::prelude::*;
use glyph_scatter_examples::{hills, init_tracing, write_glyphs_obj, ObjConfig};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn main() -> anyhow::Result<()> {
    init_tracing();
    let mesh = hills(24)?;

    // Distance from the terrain centre, quantized into five glyph sizes.
    let centre = DVec3::new(12.0, 12.0, 0.0);
    let field = move |p: DVec3| (p - centre).truncate().length();
    let domain = Domain::from_mesh(&mesh)?.with_step(1.0);
    let mapper = FieldMapper3D::new(domain, field, (0.3, 1.2)).with_bins(5);
    let value = mapper.point_fn()?;

    let mut engine = DistributionEngine::try_new(
        "size-binned",
        &mesh,
        |p, _| value(p),
        GlyphStyle::Size.exclusion(&value),
        DistributeConfig::default().with_require_connected(true),
    )?;

    let mut rng = StdRng::seed_from_u64(7);
    let outcome = engine.run(&mut rng, |result| {
        GlyphStyle::Size.poses(&mesh, result)
    });
    let poses = outcome.output?;

    let sizes: std::collections::BTreeSet<u64> = outcome
        .result
        .iter()
        .map(|p| p.glyph.value.to_bits())
        .collect();
    tracing::info!(
        glyphs = outcome.result.len(),
        distinct_sizes = sizes.len(),
        "placed size glyphs"
    );

    write_glyphs_obj(
        &mesh,
        &poses,
        &ObjConfig::default().with_cube_radius(1.0),
        "size-glyphs-binned.obj",
    )?;
    Ok(())
}
