use glyph_scatter::prelude::*;
use glyph_scatter_examples::{hills, init_tracing, write_glyphs_obj, ObjConfig};
use rand::rngs::StdRng;
use rand::SeedableRng;

const BUDGET: usize = 250;

fn main() -> anyhow::Result<()> {
    init_tracing();
    let mesh = hills(64)?;

    let token = CancelToken::new();
    let mut engine = DistributionEngine::try_new(
        "budgeted",
        &mesh,
        |p, _| 1.0 + 0.1 * p.z,
        |existing, candidate, _| within_radius(existing, candidate, 0.4),
        DistributeConfig::default()
            .with_exclusion_reach(0.4)
            .with_require_connected(true),
    )?
    .with_cancel_token(token.clone());

    // Stop the run once the placement budget is spent.
    let mut placed = 0usize;
    let mut budget = FnSink::new(|event| match event {
        DistributionEvent::PlacementMade { .. } => {
            placed += 1;
            if placed == BUDGET {
                token.cancel();
            }
        }
        DistributionEvent::Cancelled {
            polygons_processed, ..
        } => {
            tracing::warn!(polygons_processed, "budget exhausted");
        }
        _ => {}
    });
    let mut progress = VecSink::only([EventKind::Progress]);
    let mut sinks = MultiSink::with_sinks(vec![&mut budget as &mut dyn EventSink, &mut progress]);

    let mut rng = StdRng::seed_from_u64(99);
    let outcome = engine.run_with_events(
        &mut rng,
        |result| GlyphStyle::Width.poses(&mesh, result),
        &mut sinks,
    );
    drop(sinks);

    tracing::info!(
        glyphs = outcome.result.len(),
        cancelled = outcome.stats.cancelled,
        progress_events = progress.len(),
        "run finished"
    );

    write_glyphs_obj(
        &mesh,
        &outcome.output?,
        &ObjConfig::default().with_include_mesh(false),
        "cancel-after-budget.obj",
    )?;
    Ok(())
}
