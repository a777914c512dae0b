//! Distribution engine: rejection sampling of glyph points over selected polygons.
use std::time::Instant;

use glam::DVec3;
use rand::Rng;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::mesh::Mesh;
use crate::sampling::PolygonFootprint;
use crate::scatter::cancel::CancelToken;
use crate::scatter::events::{DistributionEvent, EventKind, EventSink};
use crate::scatter::index::UniformGrid;
use crate::scatter::{EngineId, Glyph, Placement, PlacementResult};

/// Configuration for a distribution run.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DistributeConfig {
    /// Consecutive rejections after which a polygon counts as saturated.
    pub cutoff: usize,
    /// Consecutive draws yielding no point after which a polygon is abandoned.
    pub max_consecutive_misses: usize,
    /// Additionally require candidates to fall inside the polygon outline.
    pub clip_to_polygon: bool,
    /// Separation on any single axis at or beyond which the exclusion rule never
    /// excludes. Enables the grid index when set.
    pub exclusion_reach: Option<f64>,
    /// Reject meshes with isolated vertices at construction. Set this for runs
    /// whose finalizer estimates gradients, e.g. [`crate::scatter::species::GlyphStyle::poses`].
    pub require_connected: bool,
}

impl Default for DistributeConfig {
    fn default() -> Self {
        Self {
            cutoff: 20,
            max_consecutive_misses: 10_000,
            clip_to_polygon: false,
            exclusion_reach: None,
            require_connected: false,
        }
    }
}

impl DistributeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the rejection cutoff.
    pub fn with_cutoff(mut self, cutoff: usize) -> Self {
        self.cutoff = cutoff;
        self
    }

    /// Sets the miss guard.
    pub fn with_max_consecutive_misses(mut self, misses: usize) -> Self {
        self.max_consecutive_misses = misses;
        self
    }

    pub fn with_clip_to_polygon(mut self, clip: bool) -> Self {
        self.clip_to_polygon = clip;
        self
    }

    /// Declares the reach of the exclusion rule.
    pub fn with_exclusion_reach(mut self, reach: f64) -> Self {
        self.exclusion_reach = Some(reach);
        self
    }

    pub fn with_require_connected(mut self, require: bool) -> Self {
        self.require_connected = require;
        self
    }

    /// Validates the configuration, returning an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if self.cutoff == 0 {
            return Err(Error::InvalidConfig("cutoff must be > 0".into()));
        }
        if self.max_consecutive_misses == 0 {
            return Err(Error::InvalidConfig(
                "max_consecutive_misses must be > 0".into(),
            ));
        }
        if let Some(reach) = self.exclusion_reach {
            if !(reach.is_finite() && reach > 0.0) {
                return Err(Error::InvalidConfig(format!(
                    "exclusion_reach must be finite and > 0, got {reach}"
                )));
            }
        }
        Ok(())
    }
}

/// Why sampling of a polygon stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolygonOutcome {
    /// `cutoff` consecutive candidates were rejected.
    Saturated,
    /// `max_consecutive_misses` consecutive draws yielded no point.
    Abandoned,
    /// The cancel token was set while sampling.
    Cancelled,
}

/// Counters gathered over one run.
#[non_exhaustive]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Selected polygons that were sampled, including a partially sampled one on cancellation.
    pub polygons_processed: usize,
    /// Selected polygons skipped because no draw on them can succeed.
    pub polygons_skipped: usize,
    /// Draws that produced a candidate point.
    pub candidates_drawn: usize,
    /// Draws that produced no point.
    pub missed_draws: usize,
    /// Candidates rejected by the exclusion rule or as duplicates.
    pub rejections: usize,
    pub cancelled: bool,
}

/// What a run hands back: the placements, the finalizer's output and statistics.
#[derive(Debug, Clone)]
pub struct RunOutcome<T> {
    pub result: PlacementResult,
    pub output: T,
    pub stats: RunStats,
}

/// Places glyph points on the selected polygons of a mesh.
///
/// `V` computes the glyph value of an accepted candidate from the candidate and
/// the polygon's vertex coordinates. `X` decides whether an existing point
/// excludes a candidate, given `(existing, candidate, polygon_vertices)`.
pub struct DistributionEngine<'m, V, X>
where
    V: FnMut(DVec3, &[DVec3]) -> f64,
    X: Fn(DVec3, DVec3, &[DVec3]) -> bool,
{
    id: EngineId,
    mesh: &'m Mesh,
    value_fn: V,
    exclusion: X,
    config: DistributeConfig,
    footprints: Vec<(usize, PolygonFootprint)>,
    cancel: CancelToken,
}

impl<'m, V, X> DistributionEngine<'m, V, X>
where
    V: FnMut(DVec3, &[DVec3]) -> f64,
    X: Fn(DVec3, DVec3, &[DVec3]) -> bool,
{
    /// Creates an engine over the polygons of `mesh` that are selected now.
    ///
    /// Fails on an empty `id`, an invalid `config`, or a mesh without selected
    /// polygons. With [`DistributeConfig::require_connected`], a mesh holding a
    /// vertex without neighbours fails with [`Error::IsolatedVertex`].
    pub fn try_new(
        id: impl Into<EngineId>,
        mesh: &'m Mesh,
        value_fn: V,
        exclusion: X,
        config: DistributeConfig,
    ) -> Result<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(Error::InvalidConfig("engine id must not be empty".into()));
        }
        config.validate()?;
        if config.require_connected {
            mesh.validate_connected()?;
        }

        let footprints = mesh
            .selected_polygons()
            .map(|(index, polygon)| {
                PolygonFootprint::new(mesh.polygon_positions(polygon), polygon.normal)
                    .map(|fp| (index, fp))
            })
            .collect::<Result<Vec<_>>>()?;
        if footprints.is_empty() {
            return Err(Error::InvalidConfig(format!(
                "engine '{id}': mesh has no selected polygons"
            )));
        }

        Ok(Self {
            id,
            mesh,
            value_fn,
            exclusion,
            config,
            footprints,
            cancel: CancelToken::new(),
        })
    }

    /// Replaces the engine's cancel token with a shared one.
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// A handle that cancels this engine's runs.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn config(&self) -> &DistributeConfig {
        &self.config
    }

    pub fn mesh(&self) -> &'m Mesh {
        self.mesh
    }

    /// Number of selected polygons this engine samples.
    pub fn polygon_count(&self) -> usize {
        self.footprints.len()
    }

    /// Runs the distribution, then calls `finalize` once with the complete result.
    pub fn run<T>(
        &mut self,
        rng: &mut dyn Rng,
        finalize: impl FnOnce(&PlacementResult) -> T,
    ) -> RunOutcome<T> {
        self.run_with_events(rng, finalize, &mut ())
    }

    /// Like [`Self::run`], reporting progress to `sink`.
    pub fn run_with_events<T>(
        &mut self,
        rng: &mut dyn Rng,
        finalize: impl FnOnce(&PlacementResult) -> T,
        sink: &mut dyn EventSink,
    ) -> RunOutcome<T> {
        let Self {
            id,
            value_fn,
            exclusion,
            config,
            footprints,
            cancel,
            ..
        } = self;
        let exclusion: &X = exclusion;

        let total = footprints.len();
        let progress_every = (total / 100).max(1);
        let mut result = PlacementResult::new();
        let mut grid = config.exclusion_reach.map(UniformGrid::new);
        let mut stats = RunStats::default();

        info!(engine = %id, polygons = total, cutoff = config.cutoff, "distribution started");
        if sink.wants(EventKind::RunStarted) {
            sink.send(DistributionEvent::RunStarted {
                engine_id: id.clone(),
                polygon_count: total,
                config: config.clone(),
            });
        }

        let started = Instant::now();
        for (done, (polygon, footprint)) in footprints.iter().enumerate() {
            if cancel.is_cancelled() {
                stats.cancelled = true;
                break;
            }

            if footprint.is_degenerate() {
                stats.polygons_skipped += 1;
                warn!(engine = %id, polygon, "skipping polygon with degenerate footprint");
                if sink.wants(EventKind::Warning) {
                    sink.send(DistributionEvent::Warning {
                        context: format!("{id}: polygon {polygon}"),
                        message: "degenerate footprint, no point can be drawn".into(),
                    });
                }
            } else {
                stats.polygons_processed += 1;
                if sink.wants(EventKind::PolygonStarted) {
                    sink.send(DistributionEvent::PolygonStarted {
                        polygon: *polygon,
                        vertex_count: footprint.vertices.len(),
                    });
                }

                let mut rejections = 0usize;
                let mut misses = 0usize;
                let mut placed = 0usize;
                let outcome = loop {
                    if cancel.is_cancelled() {
                        break PolygonOutcome::Cancelled;
                    }
                    if rejections >= config.cutoff {
                        break PolygonOutcome::Saturated;
                    }

                    let Some(candidate) = footprint.draw(rng, config.clip_to_polygon) else {
                        misses += 1;
                        stats.missed_draws += 1;
                        if misses >= config.max_consecutive_misses {
                            break PolygonOutcome::Abandoned;
                        }
                        continue;
                    };
                    misses = 0;
                    stats.candidates_drawn += 1;

                    let vertices = footprint.vertices.as_slice();
                    let excludes = |existing: DVec3| {
                        existing == candidate || exclusion(existing, candidate, vertices)
                    };
                    let rejected = match &grid {
                        Some(grid) => grid
                            .nearby(candidate)
                            .into_iter()
                            .any(|i| excludes(result.point_at(i))),
                        None => result.points().any(excludes),
                    };

                    if rejected {
                        rejections += 1;
                        stats.rejections += 1;
                        if sink.wants(EventKind::CandidateRejected) {
                            sink.send(DistributionEvent::CandidateRejected {
                                polygon: *polygon,
                                candidate,
                                consecutive: rejections,
                            });
                        }
                        continue;
                    }

                    let value = value_fn(candidate, vertices);
                    let placement = Placement {
                        point: candidate,
                        glyph: Glyph {
                            value,
                            normal: footprint.normal,
                        },
                        polygon: *polygon,
                    };
                    if let Some(grid) = grid.as_mut() {
                        grid.insert(candidate, result.len());
                    }
                    result.push(placement);
                    placed += 1;
                    rejections = 0;
                    if sink.wants(EventKind::PlacementMade) {
                        sink.send(DistributionEvent::PlacementMade { placement });
                    }
                };

                debug!(engine = %id, polygon, placed, ?outcome, "polygon finished");
                if outcome == PolygonOutcome::Abandoned {
                    warn!(
                        engine = %id,
                        polygon,
                        misses = config.max_consecutive_misses,
                        "abandoning polygon after consecutive missed draws"
                    );
                }
                if sink.wants(EventKind::PolygonFinished) {
                    sink.send(DistributionEvent::PolygonFinished {
                        polygon: *polygon,
                        placed,
                        outcome,
                    });
                }
                if outcome == PolygonOutcome::Cancelled {
                    stats.cancelled = true;
                    break;
                }
            }

            let processed = done + 1;
            if processed % progress_every == 0 || processed == total {
                info!(
                    engine = %id,
                    "processed {processed}/{total} polygons ({}%)",
                    processed * 100 / total
                );
                if sink.wants(EventKind::Progress) {
                    sink.send(DistributionEvent::Progress { processed, total });
                }
            }
        }
        info!(
            engine = %id,
            placed = result.len(),
            elapsed = ?started.elapsed(),
            "sampling finished"
        );

        if stats.cancelled {
            info!(engine = %id, placed = result.len(), "distribution cancelled");
            if sink.wants(EventKind::Cancelled) {
                sink.send(DistributionEvent::Cancelled {
                    polygons_processed: stats.polygons_processed,
                    placed: result.len(),
                });
            }
        }

        let finalize_started = Instant::now();
        let output = finalize(&result);
        info!(engine = %id, elapsed = ?finalize_started.elapsed(), "finalize finished");

        if sink.wants(EventKind::RunFinished) {
            sink.send(DistributionEvent::RunFinished {
                stats: stats.clone(),
            });
        }

        RunOutcome {
            result,
            output,
            stats,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::geometry::{extrema, within_cube};
    use crate::mesh::{MeshBuilder, Polygon, Vertex};
    use crate::scatter::events::VecSink;

    fn grid_mesh() -> Mesh {
        MeshBuilder::heightfield(4, 4, 1.0, |x, y| 0.25 * x + 0.1 * y)
            .build()
            .unwrap()
    }

    fn separated_squares() -> Mesh {
        let mut b = MeshBuilder::new();
        for k in 0..3 {
            let x0 = k as f64 * 2.0;
            let ids = [
                b.vertex([x0, 0.0, 0.0]),
                b.vertex([x0 + 1.0, 0.0, 0.0]),
                b.vertex([x0 + 1.0, 1.0, 0.0]),
                b.vertex([x0, 1.0, 0.0]),
            ];
            b.selected_polygon(ids);
        }
        b.build().unwrap()
    }

    fn cube_rule(half: f64) -> impl Fn(DVec3, DVec3, &[DVec3]) -> bool {
        move |existing, candidate, _| within_cube(existing, candidate, half)
    }

    #[test]
    fn accepted_points_never_exclude_each_other() {
        let mesh = grid_mesh();
        let mut engine = DistributionEngine::try_new(
            "no-overlap",
            &mesh,
            |_, _| 1.0,
            cube_rule(0.3),
            DistributeConfig::default(),
        )
        .unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let outcome = engine.run(&mut rng, |_| ());

        let points: Vec<DVec3> = outcome.result.points().collect();
        assert!(points.len() > 16);
        for (i, &p) in points.iter().enumerate() {
            for &q in &points[i + 1..] {
                assert!(!within_cube(p, q, 0.3));
                assert!(!within_cube(q, p, 0.3));
            }
        }
        assert!(!outcome.stats.cancelled);
        assert_eq!(outcome.stats.polygons_processed, 16);
    }

    #[test]
    fn cutoff_one_places_one_point_per_polygon() {
        let mesh = separated_squares();
        let same_polygon = |existing: DVec3, _: DVec3, vertices: &[DVec3]| {
            extrema(vertices).unwrap().contains(existing)
        };
        let mut engine = DistributionEngine::try_new(
            "cutoff",
            &mesh,
            |_, _| 0.0,
            same_polygon,
            DistributeConfig::default().with_cutoff(1),
        )
        .unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let outcome = engine.run(&mut rng, |r| r.len());

        assert_eq!(outcome.output, 3);
        let polygons: Vec<usize> = outcome.result.iter().map(|p| p.polygon).collect();
        assert_eq!(polygons, vec![0, 1, 2]);
        assert_eq!(outcome.stats.rejections, 3);
    }

    #[test]
    fn cancelling_after_n_placements_finalizes_n_entries() {
        let mesh = grid_mesh();
        let token = CancelToken::new();
        let remote = token.clone();
        let mut calls = 0;
        let value_fn = move |_: DVec3, _: &[DVec3]| {
            calls += 1;
            if calls == 5 {
                remote.cancel();
            }
            calls as f64
        };
        let mut engine = DistributionEngine::try_new(
            "cancel",
            &mesh,
            value_fn,
            cube_rule(0.05),
            DistributeConfig::default(),
        )
        .unwrap()
        .with_cancel_token(token);

        let finalized = Cell::new(0);
        let mut rng = StdRng::seed_from_u64(11);
        let mut sink = VecSink::only([EventKind::Cancelled]);
        let outcome = engine.run_with_events(
            &mut rng,
            |r| {
                finalized.set(finalized.get() + 1);
                r.len()
            },
            &mut sink,
        );

        assert_eq!(finalized.get(), 1);
        assert_eq!(outcome.output, 5);
        assert_eq!(outcome.result.len(), 5);
        assert!(outcome.stats.cancelled);
        assert_eq!(sink.len(), 1);
        let values: Vec<f64> = outcome.result.iter().map(|p| p.glyph.value).collect();
        assert_eq!(values, vec![1.0, 2.0, 3.0, 4.0, 5.0]);

        let points: Vec<DVec3> = outcome.result.points().collect();
        for (i, &p) in points.iter().enumerate() {
            for &q in &points[i + 1..] {
                assert!(!within_cube(p, q, 0.05));
                assert!(!within_cube(q, p, 0.05));
            }
        }
    }

    #[test]
    fn grid_index_matches_full_scan() {
        let mesh = grid_mesh();
        let run = |config: DistributeConfig| {
            let mut engine =
                DistributionEngine::try_new("index", &mesh, |p, _| p.z, cube_rule(0.25), config)
                    .unwrap();
            let mut rng = StdRng::seed_from_u64(42);
            engine.run(&mut rng, |_| ())
        };

        let scan = run(DistributeConfig::default());
        let indexed = run(DistributeConfig::default().with_exclusion_reach(0.25));
        assert!(!scan.result.is_empty());
        assert_eq!(scan.result, indexed.result);
        assert_eq!(scan.stats, indexed.stats);
    }

    #[test]
    fn construction_errors() {
        let mut mesh = grid_mesh();

        {
            let empty_id = DistributionEngine::try_new(
                "",
                &mesh,
                |_, _| 0.0,
                cube_rule(1.0),
                Default::default(),
            );
            assert!(matches!(empty_id, Err(Error::InvalidConfig(_))));

            let zero_cutoff = DistributionEngine::try_new(
                "e",
                &mesh,
                |_, _| 0.0,
                cube_rule(1.0),
                DistributeConfig::default().with_cutoff(0),
            );
            assert!(matches!(zero_cutoff, Err(Error::InvalidConfig(_))));

            let bad_reach = DistributionEngine::try_new(
                "e",
                &mesh,
                |_, _| 0.0,
                cube_rule(1.0),
                DistributeConfig::default().with_exclusion_reach(f64::NAN),
            );
            assert!(matches!(bad_reach, Err(Error::InvalidConfig(_))));
        }

        mesh.select_all(false);
        let nothing_selected =
            DistributionEngine::try_new("e", &mesh, |_, _| 0.0, cube_rule(1.0), Default::default());
        assert!(matches!(nothing_selected, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn stray_vertex_fails_before_sampling_when_connectivity_is_required() {
        let mut b = MeshBuilder::heightfield(4, 4, 1.0, |_, _| 0.0);
        let stray = b.vertex([2.0, 2.0, 0.0]);
        let mesh = b.build().unwrap();
        let drawn = Cell::new(0);
        let value_fn = |_: DVec3, _: &[DVec3]| {
            drawn.set(drawn.get() + 1);
            1.0
        };

        let strict = DistributionEngine::try_new(
            "connected",
            &mesh,
            value_fn,
            cube_rule(0.3),
            DistributeConfig::default().with_require_connected(true),
        );
        assert!(matches!(strict, Err(Error::IsolatedVertex { index }) if index == stray));
        assert_eq!(drawn.get(), 0);

        let lenient = DistributionEngine::try_new(
            "lenient",
            &mesh,
            |_, _| 1.0,
            cube_rule(0.3),
            DistributeConfig::default(),
        );
        assert!(lenient.is_ok());
    }

    #[test]
    fn degenerate_polygons_are_skipped_with_a_warning() {
        let mut b = MeshBuilder::new();
        let floor = [
            b.vertex([0.0, 0.0, 0.0]),
            b.vertex([1.0, 0.0, 0.0]),
            b.vertex([1.0, 1.0, 0.0]),
            b.vertex([0.0, 1.0, 0.0]),
        ];
        let wall = [
            b.vertex([5.0, 0.0, 0.0]),
            b.vertex([5.0, 1.0, 0.0]),
            b.vertex([5.0, 1.0, 1.0]),
            b.vertex([5.0, 0.0, 1.0]),
        ];
        b.selected_polygon(floor).selected_polygon(wall);
        let mesh = b.build().unwrap();

        let mut engine = DistributionEngine::try_new(
            "walls",
            &mesh,
            |_, _| 1.0,
            cube_rule(0.2),
            DistributeConfig::default(),
        )
        .unwrap();
        let mut sink = VecSink::only([EventKind::Warning]);
        let mut rng = StdRng::seed_from_u64(5);
        let outcome = engine.run_with_events(&mut rng, |_| (), &mut sink);

        assert_eq!(outcome.stats.polygons_skipped, 1);
        assert_eq!(outcome.stats.polygons_processed, 1);
        assert_eq!(sink.len(), 1);
        assert!(outcome.result.iter().all(|p| p.polygon == 0));
    }

    #[test]
    fn polygon_whose_plane_misses_its_footprint_is_abandoned() {
        let vertices = vec![
            Vertex::new(DVec3::new(0.0, 0.0, 0.0), DVec3::Z),
            Vertex::new(DVec3::new(1.0, 0.0, 0.0), DVec3::Z),
            Vertex::new(DVec3::new(1.0, 1.0, 0.0), DVec3::Z),
        ];
        // Steep normal over a flat footprint: every resolved z leaves [0, 0].
        let normal = DVec3::new(0.0, 0.99, 0.1).normalize();
        let polygons = vec![Polygon::new(vec![0, 1, 2], normal).with_selected(true)];
        let mesh = Mesh::try_new(vertices, Vec::new(), polygons).unwrap();

        let mut engine = DistributionEngine::try_new(
            "abandon",
            &mesh,
            |_, _| 1.0,
            cube_rule(0.1),
            DistributeConfig::default().with_max_consecutive_misses(50),
        )
        .unwrap();
        let mut sink = VecSink::only([EventKind::PolygonFinished]);
        let mut rng = StdRng::seed_from_u64(9);
        let outcome = engine.run_with_events(&mut rng, |_| (), &mut sink);

        assert!(outcome.result.is_empty());
        assert_eq!(outcome.stats.missed_draws, 50);
        assert!(matches!(
            sink.as_slice(),
            [DistributionEvent::PolygonFinished {
                outcome: PolygonOutcome::Abandoned,
                placed: 0,
                ..
            }]
        ));
    }

    #[test]
    fn events_bracket_the_run() {
        let mesh = separated_squares();
        let mut engine = DistributionEngine::try_new(
            "events",
            &mesh,
            |_, _| 1.0,
            cube_rule(0.4),
            DistributeConfig::default(),
        )
        .unwrap();
        let mut sink = VecSink::new();
        let mut rng = StdRng::seed_from_u64(1);
        let outcome = engine.run_with_events(&mut rng, |_| (), &mut sink);

        let events = sink.into_inner();
        assert_eq!(events.first().map(|e| e.kind()), Some(EventKind::RunStarted));
        assert_eq!(events.last().map(|e| e.kind()), Some(EventKind::RunFinished));
        let placed = events
            .iter()
            .filter(|e| e.kind() == EventKind::PlacementMade)
            .count();
        assert_eq!(placed, outcome.result.len());
        let finished = events
            .iter()
            .filter(|e| e.kind() == EventKind::PolygonFinished)
            .count();
        assert_eq!(finished, 3);
    }

    #[test]
    fn engine_can_run_repeatedly() {
        let mesh = separated_squares();
        let mut engine = DistributionEngine::try_new(
            "repeat",
            &mesh,
            |_, _| 1.0,
            cube_rule(0.4),
            DistributeConfig::default(),
        )
        .unwrap();
        let first = engine.run(&mut StdRng::seed_from_u64(2), |_| ());
        let second = engine.run(&mut StdRng::seed_from_u64(2), |_| ());
        assert_eq!(first.result, second.result);
        assert_eq!(engine.polygon_count(), 3);
        assert_eq!(engine.id(), "repeat");
    }
}
