//! Event types and sinks for observing distribution runs.
//!
//! This module defines [`DistributionEvent`] and a set of sinks and adapters to emit,
//! collect, or forward events while executing a
//! [`crate::scatter::engine::DistributionEngine`] via
//! [`crate::scatter::engine::DistributionEngine::run_with_events`].
use glam::DVec3;

use crate::scatter::engine::{DistributeConfig, PolygonOutcome, RunStats};
use crate::scatter::{EngineId, Placement};

/// Describes events emitted by a distribution run.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub enum DistributionEvent {
    /// Emitted when a run starts.
    RunStarted {
        /// Identifier of the engine running.
        engine_id: EngineId,
        /// Number of selected polygons to process.
        polygon_count: usize,
        /// The configuration used.
        config: DistributeConfig,
    },

    /// Emitted when sampling of a polygon begins.
    PolygonStarted {
        /// Index into the mesh's polygon list.
        polygon: usize,
        /// Number of vertices of the polygon.
        vertex_count: usize,
    },

    /// Emitted when an existing point excludes a candidate.
    CandidateRejected {
        /// Polygon being sampled.
        polygon: usize,
        /// The rejected candidate.
        candidate: DVec3,
        /// Consecutive rejections on this polygon, including this one.
        consecutive: usize,
    },

    /// Emitted when a candidate is accepted.
    PlacementMade {
        /// The accepted placement.
        placement: Placement,
    },

    /// Emitted when sampling of a polygon stops.
    PolygonFinished {
        /// Index into the mesh's polygon list.
        polygon: usize,
        /// Points accepted on this polygon.
        placed: usize,
        /// Why sampling stopped.
        outcome: PolygonOutcome,
    },

    /// Emitted every percent of processed polygons.
    Progress {
        /// Selected polygons processed so far.
        processed: usize,
        /// Total selected polygons.
        total: usize,
    },

    /// Emitted when the run stops early on a cancellation request.
    Cancelled {
        /// Selected polygons fully or partially processed.
        polygons_processed: usize,
        /// Points accepted before cancellation.
        placed: usize,
    },

    /// Emitted after the finalizer returned.
    RunFinished {
        /// Aggregated statistics for the run.
        stats: RunStats,
    },

    /// Non-fatal warning generated during a run.
    Warning {
        /// Context string (e.g. engine id, polygon index).
        context: String,
        /// Human-readable message.
        message: String,
    },
}

/// Discriminant of [`DistributionEvent`], used by sinks to filter what they want.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    RunStarted,
    PolygonStarted,
    CandidateRejected,
    PlacementMade,
    PolygonFinished,
    Progress,
    Cancelled,
    RunFinished,
    Warning,
}

impl DistributionEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::RunStarted { .. } => EventKind::RunStarted,
            Self::PolygonStarted { .. } => EventKind::PolygonStarted,
            Self::CandidateRejected { .. } => EventKind::CandidateRejected,
            Self::PlacementMade { .. } => EventKind::PlacementMade,
            Self::PolygonFinished { .. } => EventKind::PolygonFinished,
            Self::Progress { .. } => EventKind::Progress,
            Self::Cancelled { .. } => EventKind::Cancelled,
            Self::RunFinished { .. } => EventKind::RunFinished,
            Self::Warning { .. } => EventKind::Warning,
        }
    }
}

/// A generic event sink that accepts [`DistributionEvent`]s.
pub trait EventSink {
    fn send(&mut self, event: DistributionEvent);

    /// Whether events of `kind` should be built at all. Lets the engine skip
    /// constructing high-volume events nobody listens to.
    fn wants(&self, kind: EventKind) -> bool {
        let _ = kind;
        true
    }

    fn send_many<I>(&mut self, events: I)
    where
        Self: Sized,
        I: IntoIterator<Item = DistributionEvent>,
    {
        for e in events {
            self.send(e);
        }
    }
}

/// A no-op event sink.
impl EventSink for () {
    #[inline]
    fn send(&mut self, _event: DistributionEvent) {}

    #[inline]
    fn wants(&self, _kind: EventKind) -> bool {
        false
    }
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    #[inline]
    fn send(&mut self, event: DistributionEvent) {
        (**self).send(event);
    }

    #[inline]
    fn wants(&self, kind: EventKind) -> bool {
        (**self).wants(kind)
    }
}

impl<S: EventSink + ?Sized> EventSink for Box<S> {
    #[inline]
    fn send(&mut self, event: DistributionEvent) {
        (**self).send(event);
    }

    #[inline]
    fn wants(&self, kind: EventKind) -> bool {
        (**self).wants(kind)
    }
}

/// An event sink that forwards to a user-provided closure.
pub struct FnSink<F>
where
    F: FnMut(DistributionEvent),
{
    f: F,
}

impl<F> FnSink<F>
where
    F: FnMut(DistributionEvent),
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> EventSink for FnSink<F>
where
    F: FnMut(DistributionEvent),
{
    #[inline]
    fn send(&mut self, event: DistributionEvent) {
        (self.f)(event);
    }
}

/// An event sink that collects events in a `Vec`, optionally only some kinds.
#[derive(Default)]
pub struct VecSink {
    events: Vec<DistributionEvent>,
    only: Option<Vec<EventKind>>,
}

impl VecSink {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            only: None,
        }
    }

    /// Collects only events whose kind is listed.
    pub fn only(kinds: impl Into<Vec<EventKind>>) -> Self {
        Self {
            events: Vec::new(),
            only: Some(kinds.into()),
        }
    }

    pub fn into_inner(self) -> Vec<DistributionEvent> {
        self.events
    }

    pub fn as_slice(&self) -> &[DistributionEvent] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl EventSink for VecSink {
    #[inline]
    fn send(&mut self, event: DistributionEvent) {
        if self.wants(event.kind()) {
            self.events.push(event);
        }
    }

    fn wants(&self, kind: EventKind) -> bool {
        self.only.as_ref().is_none_or(|kinds| kinds.contains(&kind))
    }
}

/// Fan-out sink that forwards each event to all contained sinks.
pub struct MultiSink<S: EventSink> {
    pub(crate) sinks: Vec<S>,
}

impl<S: EventSink> MultiSink<S> {
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    pub fn with_sinks(sinks: Vec<S>) -> Self {
        Self { sinks }
    }

    pub fn push(&mut self, sink: S) {
        self.sinks.push(sink);
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }
}

impl<S: EventSink> Default for MultiSink<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: EventSink> EventSink for MultiSink<S> {
    fn send(&mut self, event: DistributionEvent) {
        let kind = event.kind();
        let mut targets: Vec<&mut S> = self.sinks.iter_mut().filter(|s| s.wants(kind)).collect();
        let Some(last) = targets.pop() else {
            return;
        };
        for sink in targets {
            sink.send(event.clone());
        }
        last.send(event);
    }

    fn wants(&self, kind: EventKind) -> bool {
        self.sinks.iter().any(|s| s.wants(kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn warning(context: &str) -> DistributionEvent {
        DistributionEvent::Warning {
            context: context.into(),
            message: "msg".into(),
        }
    }

    #[test]
    fn vec_sink_collects_events() {
        let mut sink = VecSink::new();
        assert!(sink.is_empty());
        sink.send(warning("a"));
        sink.send(warning("b"));
        assert_eq!(sink.len(), 2);
        sink.clear();
        assert!(sink.is_empty());
    }

    #[test]
    fn filtered_vec_sink_drops_unwanted_kinds() {
        let mut sink = VecSink::only([EventKind::Progress]);
        assert!(!sink.wants(EventKind::Warning));
        sink.send(warning("a"));
        sink.send(DistributionEvent::Progress {
            processed: 1,
            total: 2,
        });
        assert_eq!(sink.len(), 1);
        assert_eq!(sink.as_slice()[0].kind(), EventKind::Progress);
    }

    #[test]
    fn multi_sink_fans_out_events() {
        let mut multi = MultiSink::with_sinks(vec![
            VecSink::new(),
            VecSink::new(),
            VecSink::only([EventKind::RunStarted]),
        ]);
        multi.send(warning("ctx"));
        assert_eq!(multi.len(), 3);
        assert_eq!(multi.sinks[0].len(), 1);
        assert_eq!(multi.sinks[1].len(), 1);
        assert!(multi.sinks[2].is_empty());
        assert!(matches!(
            multi.sinks[0].as_slice()[0],
            DistributionEvent::Warning { .. }
        ));
    }

    #[test]
    fn unit_sink_wants_nothing() {
        assert!(!().wants(EventKind::PlacementMade));
        assert!(MultiSink::<VecSink>::new().is_empty());
    }

    #[test]
    fn multi_sink_over_borrowed_sinks_of_different_types() {
        let mut collected = VecSink::new();
        let mut seen = 0;
        let mut counter = FnSink::new(|_event| seen += 1);
        {
            let mut multi: MultiSink<&mut dyn EventSink> =
                MultiSink::with_sinks(vec![&mut collected as &mut dyn EventSink, &mut counter]);
            multi.send(warning("ctx"));
            assert!(multi.wants(EventKind::Warning));
        }
        drop(counter);
        assert_eq!(collected.len(), 1);
        assert_eq!(seen, 1);
    }

    #[test]
    fn fn_sink_invokes_callback() {
        let mut count = 0;
        let mut sink = FnSink::new(|_event| {
            count += 1;
        });
        sink.send(warning("ctx"));
        drop(sink);
        assert_eq!(count, 1);
    }
}
