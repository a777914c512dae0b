//! Uniform grid over accepted points, used to narrow exclusion tests.
//!
//! Only valid for exclusion rules with a known reach: a rule that never excludes
//! two points whose separation on some axis is at least `reach`. Under that
//! contract every point that can exclude a candidate lives in the candidate's
//! cell or one of its 26 neighbours, so narrowing never changes a decision.
use std::collections::HashMap;

use glam::DVec3;

type CellKey = (i64, i64, i64);

#[derive(Debug, Clone)]
pub(crate) struct UniformGrid {
    cell_size: f64,
    cells: HashMap<CellKey, Vec<usize>>,
}

impl UniformGrid {
    pub(crate) fn new(reach: f64) -> Self {
        debug_assert!(reach > 0.0 && reach.is_finite());
        Self {
            cell_size: reach,
            cells: HashMap::new(),
        }
    }

    #[inline]
    fn key(&self, p: DVec3) -> CellKey {
        let c = (p / self.cell_size).floor();
        (c.x as i64, c.y as i64, c.z as i64)
    }

    /// Registers the accepted point stored at `index` in the placement result.
    pub(crate) fn insert(&mut self, p: DVec3, index: usize) {
        let key = self.key(p);
        self.cells.entry(key).or_default().push(index);
    }

    /// Indices of every stored point that may lie within reach of `p`, ascending.
    pub(crate) fn nearby(&self, p: DVec3) -> Vec<usize> {
        let (cx, cy, cz) = self.key(p);
        let mut out = Vec::new();
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    if let Some(bucket) = self.cells.get(&(cx + dx, cy + dy, cz + dz)) {
                        out.extend_from_slice(bucket);
                    }
                }
            }
        }
        // Acceptance order, so rules see existing points in the same order as a full scan.
        out.sort_unstable();
        out
    }
}
