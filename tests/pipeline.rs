#![allow(clippy::unwrap_used)]

mod common;

use paperfold::composite::CompositeParams;
use paperfold::geometry::ProjectionMethod;
use paperfold::hierarchy::{BoundingBoxShell, RayParityContainment};
use paperfold::io;
use paperfold::pipeline::{build_hierarchy, Pipeline, PipelineConfig};
use paperfold::render::SoftwareRasterizer;
use paperfold::unfold::IsolatedUnfolder;

#[test]
fn structures_from_disk_to_printable_sheets() {
    common::init_tracing();
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();

    let mut paths = Vec::new();
    for (name, center, half) in [("big", 0.0, 4.0), ("small", 0.0, 1.0), ("far", 30.0, 1.0)] {
        let path = input.path().join(format!("{name}.stl"));
        let s = common::cube(name, [center, 0.0, 0.0], half, 0);
        io::write_stl(s.mesh(), &path).unwrap();
        paths.push(path);
    }
    let structures: Vec<_> = paths
        .iter()
        .enumerate()
        .map(|(i, p)| io::read_structure(p, i).unwrap())
        .collect();

    let tree = build_hierarchy(
        BoundingBoxShell::new(1.0, 0),
        RayParityContainment::default(),
        structures,
    )
    .unwrap();
    assert_eq!(tree.depth(), 2);

    let mut config = PipelineConfig::new(output.path());
    config.bake = common::small_bake();
    config.composite = CompositeParams::default().with_resolution(96);
    let report = Pipeline::new(IsolatedUnfolder::default(), SoftwareRasterizer, config)
        .run(&tree)
        .unwrap();

    assert_eq!(report.shells.len(), 3);
    let levels: Vec<(usize, usize)> = report.shells.iter().map(|s| (s.level, s.index)).collect();
    assert_eq!(levels, vec![(1, 0), (2, 0), (1, 1)]);
    assert_eq!(report.shells[0].structures, vec!["big".to_owned()]);
    assert_eq!(report.unbaked().count(), 0);

    for name in [
        "shell_level1_0.stl",
        "shell_level1_0.off",
        "layout_level1_0.off",
        "atlas_level1_0.png",
        "unfolding_level1_0.png",
        "shell_level2_0.stl",
        "atlas_level2_0.png",
        "unfolding_level1_1.png",
    ] {
        assert!(output.path().join(name).exists(), "{name}");
    }

    let sheet = image::open(output.path().join("unfolding_level1_0.png")).unwrap();
    assert_eq!(sheet.width(), sheet.height());
    let shell = io::read_stl(&output.path().join("shell_level2_0.stl")).unwrap();
    assert_eq!(shell.triangle_count(), 12);
}

#[test]
fn clipping_structures_still_bake() {
    let output = tempfile::tempdir().unwrap();
    let s = common::cube("clipped", [0.0, 0.0, 0.0], 1.0, 0).with_projection(ProjectionMethod::Clipping);
    let tree = build_hierarchy(BoundingBoxShell::new(1.0, 0), RayParityContainment::default(), [s]).unwrap();

    let mut config = PipelineConfig::new(output.path());
    config.bake = common::small_bake();
    config.composite = CompositeParams::default().with_resolution(64);
    config.write_meshes = false;
    let report = Pipeline::new(IsolatedUnfolder::default(), SoftwareRasterizer, config)
        .run(&tree)
        .unwrap();
    assert_eq!(report.shells[0].baked, 12);
}
