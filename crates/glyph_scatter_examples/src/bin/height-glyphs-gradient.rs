use glyph_scatter::prelude::*;
use glyph_scatter_examples::{hills, init_tracing, write_glyphs_obj, ObjConfig};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn main() -> anyhow::Result<()> {
    init_tracing();
    let mesh = hills(48)?;

    let Extrema { min, max } = extrema(
        &mesh
            .vertices()
            .iter()
            .map(|v| v.position)
            .collect::<Vec<_>>(),
    )?;
    let height = LinearMapper::new((min.z, max.z), (0.5, 2.0))?;

    let style = GlyphStyle::Height;
    let mut config = DistributeConfig::default().with_cutoff(30).with_require_connected(true);
    if let Some(reach) = style.fixed_half_width() {
        config = config.with_exclusion_reach(reach);
    }

    let mut rejected = 0usize;
    let mut sink = FnSink::new(|event| {
        if let DistributionEvent::CandidateRejected { .. } = event {
            rejected += 1;
        }
    });

    let mut engine = DistributionEngine::try_new(
        "height-gradient",
        &mesh,
        |p, _| height.map(p.z),
        style.exclusion(|_| 0.0),
        config,
    )?;
    let mut rng = StdRng::seed_from_u64(2024);
    let outcome = engine.run_with_events(&mut rng, |result| style.poses(&mesh, result), &mut sink);
    drop(sink);

    let poses = outcome.output?;
    tracing::info!(
        glyphs = poses.len(),
        rejected,
        drawn = outcome.stats.candidates_drawn,
        "placed height glyphs"
    );

    write_glyphs_obj(&mesh, &poses, &ObjConfig::default().with_cube_radius(1.0), "height-glyphs.obj")?;
    Ok(())
}
