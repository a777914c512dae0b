#![allow(dead_code)]

use std::time::Duration;

use criterion::{Criterion, Throughput};
use glyph_scatter::mesh::{Mesh, MeshBuilder};

pub const SAMPLE_SIZE: usize = 20;
pub const WARM_UP: Duration = Duration::from_secs(1);
pub const MEASUREMENT_TIME: Duration = Duration::from_secs(3);

pub fn default_criterion() -> Criterion {
    Criterion::default()
        .configure_from_args()
        .sample_size(SAMPLE_SIZE)
        .warm_up_time(WARM_UP)
        .measurement_time(MEASUREMENT_TIME)
}

pub fn elements_throughput(elements: usize) -> Throughput {
    Throughput::Elements(elements.max(1) as u64)
}

/// Rolling terrain of `n × n` unit quads, all selected.
pub fn terrain(n: usize) -> Mesh {
    MeshBuilder::heightfield(n, n, 1.0, |x, y| (x * 0.3).sin() + (y * 0.2).cos())
        .build()
        .expect("heightfield mesh is valid")
}
