#![allow(dead_code)]

use paperfold::bake::BakeParams;
use paperfold::geometry::{Structure, TriangleMesh};
use paperfold::math::Point3;
use paperfold::render::Resolution;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Axis-aligned cube structure centred at `center`.
pub fn cube(name: &str, center: [f64; 3], half: f64, index: usize) -> Structure {
    let c = Point3::from(center);
    let h = Point3::new(half, half, half).coords;
    Structure::indexed(name, TriangleMesh::cuboid(c - h, c + h), index)
}

/// Small frames so the software rasterizer stays quick.
pub fn small_bake() -> BakeParams {
    BakeParams::default()
        .with_resolution(Resolution::square(48))
        .with_parallel_scale(8.0)
        .with_normal_scale(-3.0)
}
