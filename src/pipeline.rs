//! End-to-end driver: hierarchy, unfolding, baking, compositing and the
//! artifacts written for every shell.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use image::RgbImage;
use tracing::{info, warn};

use crate::bake::{Atlas, AtlasBaker, BakeParams};
use crate::composite::{CompositeParams, FlatCompositor};
use crate::error::{BakeError, IoError, PaperfoldError, Result};
use crate::geometry::{Layout, ProjectionMethod, Shell, Structure};
use crate::hierarchy::{ContainmentOracle, HierarchyTree, NodeId, ShellGenerator};
use crate::io;
use crate::render::{ClippingRange, Rasterizer, Scene};
use crate::unfold::Unfolder;

/// Where artifacts go and how each stage is tuned.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub output_dir: PathBuf,
    pub bake: BakeParams,
    pub composite: CompositeParams,
    /// Also write shell meshes (STL and OFF) and layouts (OFF).
    pub write_meshes: bool,
    /// Bake triangles on the rayon pool.
    pub parallel: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            bake: BakeParams::default(),
            composite: CompositeParams::default(),
            write_meshes: true,
            parallel: true,
        }
    }
}

impl PipelineConfig {
    #[must_use]
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            ..Self::default()
        }
    }
}

/// Outcome for one shell.
#[derive(Debug, Clone)]
pub struct ShellReport {
    pub level: usize,
    /// Position among the shells of the same level, in pre-order.
    pub index: usize,
    pub structures: Vec<String>,
    pub triangles: usize,
    pub baked: usize,
    pub skipped: usize,
    pub artifacts: Vec<PathBuf>,
}

/// Outcome of a pipeline run, one entry per shell in pre-order.
#[derive(Debug, Clone, Default)]
pub struct PipelineReport {
    pub shells: Vec<ShellReport>,
}

impl PipelineReport {
    /// Shells for which no triangle could be baked.
    pub fn unbaked(&self) -> impl Iterator<Item = &ShellReport> {
        self.shells.iter().filter(|s| s.baked == 0)
    }
}

/// Inserts `structures` in order into a tree with an unbounded root.
///
/// # Errors
///
/// Returns an error if a shell cannot be generated.
pub fn build_hierarchy<G, C>(
    generator: G,
    oracle: C,
    structures: impl IntoIterator<Item = Structure>,
) -> Result<HierarchyTree<G, C>>
where
    G: ShellGenerator,
    C: ContainmentOracle,
{
    let mut tree = HierarchyTree::new(generator, oracle);
    for structure in structures {
        tree.insert(structure)?;
    }
    info!(nodes = tree.len(), depth = tree.depth(), "built hierarchy");
    Ok(tree)
}

/// Produces the printable artifacts for every shell of a hierarchy.
pub struct Pipeline<U, R> {
    unfolder: U,
    rasterizer: R,
    config: PipelineConfig,
}

impl<U: Unfolder, R: Rasterizer + Sync> Pipeline<U, R> {
    #[must_use]
    pub fn new(unfolder: U, rasterizer: R, config: PipelineConfig) -> Self {
        Self {
            unfolder,
            rasterizer,
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Processes every shelled node of `tree` in pre-order.
    ///
    /// A shell on which no triangle could be baked is still unfolded and
    /// composited untextured; it is reported with `baked == 0`.
    ///
    /// # Errors
    ///
    /// Returns the first unfolding, bake, composite or I/O failure.
    pub fn run<G, C>(&self, tree: &HierarchyTree<G, C>) -> Result<PipelineReport>
    where
        G: ShellGenerator,
        C: ContainmentOracle,
    {
        fs::create_dir_all(&self.config.output_dir).map_err(|e| IoError::Write {
            path: self.config.output_dir.clone(),
            source: e,
        })?;

        let mut per_level: HashMap<usize, usize> = HashMap::new();
        let mut report = PipelineReport::default();
        for id in tree.preorder() {
            let node = tree.node(id)?;
            let Some(shell) = node.shell() else {
                continue;
            };
            let level = tree.level(id)?;
            let slot = per_level.entry(level).or_insert(0);
            let index = *slot;
            *slot += 1;

            report
                .shells
                .push(self.process(tree, id, shell, level, index)?);
        }
        info!(shells = report.shells.len(), "pipeline finished");
        Ok(report)
    }

    fn process<G, C>(
        &self,
        tree: &HierarchyTree<G, C>,
        id: NodeId,
        shell: &Shell,
        level: usize,
        index: usize,
    ) -> Result<ShellReport>
    where
        G: ShellGenerator,
        C: ContainmentOracle,
    {
        let structures = tree.node(id)?.structures();
        info!(level, index, triangles = shell.triangle_count(), "processing shell");
        let name = |kind: &str, ext: &str| {
            self.config
                .output_dir
                .join(format!("{kind}_level{level}_{index}.{ext}"))
        };
        let mut artifacts = Vec::new();

        let layout = self.unfolder.unfold(shell)?;
        if self.config.write_meshes {
            artifacts.push(write_with(&name("shell", "stl"), |p| io::write_stl(shell.mesh(), p))?);
            artifacts.push(write_with(&name("shell", "off"), |p| io::write_off(shell.mesh(), p))?);
            artifacts.push(write_with(&name("layout", "off"), |p| io::write_layout_off(&layout, p))?);
        }

        let atlas = self.bake(shell, &layout, structures)?;
        let compositor = FlatCompositor::new(&self.rasterizer, self.config.composite);
        let printable = match &atlas {
            Some(atlas) => {
                artifacts.push(write_with(&name("atlas", "png"), |p| io::write_png(atlas.image(), p))?);
                compositor.composite_atlas(&layout, atlas)?
            }
            None => {
                let blank = RgbImage::from_pixel(1, 1, self.config.composite.background);
                compositor.composite(&layout, &blank, &[])?
            }
        };
        artifacts.push(write_with(&name("unfolding", "png"), |p| io::write_png(&printable, p))?);

        Ok(ShellReport {
            level,
            index,
            structures: structures.iter().map(|s| s.name().to_owned()).collect(),
            triangles: shell.triangle_count(),
            baked: atlas.as_ref().map_or(0, |a| a.uvs().len()),
            skipped: atlas
                .as_ref()
                .map_or(shell.triangle_count(), |a| a.skipped().len()),
            artifacts,
        })
    }

    /// Bakes with the clipping range the structures ask for. `Ok(None)` when
    /// every triangle was skipped.
    fn bake(&self, shell: &Shell, layout: &Layout, structures: &[Structure]) -> Result<Option<Atlas>> {
        let method = if structures
            .iter()
            .any(|s| s.projection() == ProjectionMethod::Clipping)
        {
            ProjectionMethod::Clipping
        } else {
            ProjectionMethod::Inflate
        };
        let params = self
            .config
            .bake
            .with_clipping(ClippingRange::for_method(method));
        let scene = Scene::from_structures(structures, params.background);
        let baker = AtlasBaker::new(&self.rasterizer, params);

        let baked = if self.config.parallel {
            baker.bake_parallel(shell, layout, &scene)
        } else {
            baker.bake(shell, layout, &scene)
        };
        match baked {
            Ok(atlas) => Ok(Some(atlas)),
            Err(PaperfoldError::Bake(BakeError::NothingBaked { triangles })) => {
                warn!(triangles, "no triangle of the shell could be baked");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

fn write_with(path: &Path, write: impl FnOnce(&Path) -> Result<()>) -> Result<PathBuf> {
    write(path)?;
    Ok(path.to_path_buf())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::geometry::TriangleMesh;
    use crate::hierarchy::{BoundingBoxShell, RayParityContainment};
    use crate::math::Point3;
    use crate::render::{Resolution, SoftwareRasterizer};
    use crate::unfold::IsolatedUnfolder;

    fn cube(name: &str, center: f64, half: f64, index: usize) -> Structure {
        let c = Point3::new(center, 0.0, 0.0);
        let h = Point3::new(half, half, half).coords;
        Structure::indexed(name, TriangleMesh::cuboid(c - h, c + h), index)
    }

    fn config(dir: &Path) -> PipelineConfig {
        let mut config = PipelineConfig::new(dir);
        config.bake = BakeParams::default()
            .with_resolution(Resolution::square(48))
            .with_parallel_scale(8.0)
            .with_normal_scale(-3.0);
        config.composite = CompositeParams::default().with_resolution(64);
        config
    }

    #[test]
    fn hierarchy_from_structures() {
        let tree = build_hierarchy(
            BoundingBoxShell::new(1.0, 0),
            RayParityContainment::default(),
            vec![cube("a", 0.0, 1.0, 0), cube("b", 20.0, 1.0, 1)],
        )
        .unwrap();
        assert_eq!(tree.len(), 3);
        assert_eq!(tree.nodes_at_level(1).len(), 2);
    }

    #[test]
    fn writes_artifacts_per_shell() {
        let dir = tempfile::tempdir().unwrap();
        let tree = build_hierarchy(
            BoundingBoxShell::new(1.0, 0),
            RayParityContainment::default(),
            vec![cube("a", 0.0, 1.0, 0), cube("b", 20.0, 1.0, 1)],
        )
        .unwrap();
        let mut config = config(dir.path());
        config.parallel = false;
        let pipeline = Pipeline::new(IsolatedUnfolder::default(), SoftwareRasterizer, config);

        let report = pipeline.run(&tree).unwrap();
        assert_eq!(report.shells.len(), 2);
        assert_eq!(report.shells[1].index, 1);
        for shell in &report.shells {
            assert_eq!(shell.triangles, 12);
            assert_eq!(shell.baked + shell.skipped, 12);
            for path in &shell.artifacts {
                assert!(path.exists(), "{path:?}");
            }
        }
        assert!(dir.path().join("shell_level1_0.stl").exists());
        assert!(dir.path().join("unfolding_level1_1.png").exists());
    }

    #[test]
    fn unbaked_shell_is_still_composited() {
        let dir = tempfile::tempdir().unwrap();
        let tree = build_hierarchy(
            BoundingBoxShell::new(1.0, 0),
            RayParityContainment::default(),
            vec![cube("a", 0.0, 1.0, 0)],
        )
        .unwrap();
        let mut config = config(dir.path());
        config.write_meshes = false;
        // A frame far too small to see any corner.
        config.bake = config.bake.with_parallel_scale(0.01);
        let report = Pipeline::new(IsolatedUnfolder::default(), SoftwareRasterizer, config)
            .run(&tree)
            .unwrap();

        assert_eq!(report.unbaked().count(), 1);
        assert_eq!(report.shells[0].artifacts.len(), 1);
        assert!(dir.path().join("unfolding_level1_0.png").exists());
    }
}
