use image::{imageops, RgbImage};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use super::{Atlas, BakeParams, BakeSession, Marker, MarkerDetector, PixelRect, SkipReason};
use crate::error::Result;
use crate::geometry::{Layout, Shell};
use crate::math::{Point3, Vector3};
use crate::render::{Camera, Rasterizer, Scene};

/// The cropped frame of one triangle and its corners inside the crop.
#[derive(Debug, Clone)]
pub struct TriangleCapture {
    pub triangle: usize,
    pub crop: RgbImage,
    /// Crop-local pixel of each corner marker, in corner order.
    pub corners: [(u32, u32); 3],
}

/// Bakes a shell's appearance into a texture atlas, one triangle at a time.
pub struct AtlasBaker<R> {
    rasterizer: R,
    params: BakeParams,
}

impl<R: Rasterizer> AtlasBaker<R> {
    #[must_use]
    pub fn new(rasterizer: R, params: BakeParams) -> Self {
        Self { rasterizer, params }
    }

    #[must_use]
    pub fn params(&self) -> &BakeParams {
        &self.params
    }

    /// Camera looking in through triangle `index` from just outside the
    /// shell.
    ///
    /// # Errors
    ///
    /// Returns an error if the triangle does not exist or is degenerate.
    pub fn camera_for(&self, shell: &Shell, index: usize) -> Result<Camera> {
        let centroid = shell.centroid(index)?;
        let inward = -shell.outward_normal(index)?;
        let position: Point3 = centroid + inward * self.params.normal_scale;
        let direction: Vector3 = centroid - position;
        Ok(Camera::orthographic(
            position,
            centroid,
            Camera::default_up_for(&direction),
            self.params.parallel_scale,
        )
        .with_clipping(self.params.clipping))
    }

    /// Renders, locates and crops one triangle.
    ///
    /// # Errors
    ///
    /// Returns the reason the triangle cannot contribute to the atlas.
    pub fn capture(
        &self,
        shell: &Shell,
        index: usize,
        scene: &Scene,
    ) -> std::result::Result<TriangleCapture, SkipReason> {
        let corners = shell
            .triangle(index)
            .map_err(|_| SkipReason::DegenerateTriangle)?;
        let camera = self
            .camera_for(shell, index)
            .map_err(|_| SkipReason::DegenerateTriangle)?;

        let mut markers = Scene::new(self.params.background);
        for (corner, marker) in corners.iter().zip(Marker::ALL) {
            markers.add_point(*corner, marker.color(), self.params.marker_size);
        }

        let render = |s: &Scene| {
            self.rasterizer
                .render(s, &camera, self.params.resolution)
                .map_err(|e| SkipReason::RenderFailed(e.to_string()))
        };
        let frame = render(scene)?;
        let marker_frame = render(&markers)?;

        let detector = MarkerDetector::new(self.params.thresholds, self.params.background);
        let location = detector
            .locate(&marker_frame)
            .map_err(|marker| SkipReason::MarkerNotFound { marker })?;

        let rect = location.bounds.padded(
            self.params.crop_margin,
            marker_frame.width(),
            marker_frame.height(),
        );
        let marker_crop = crop(&marker_frame, &rect);

        // Corners are re-located in the crop so they are crop-local.
        let local = detector
            .locate(&marker_crop)
            .map_err(|marker| SkipReason::MarkerNotFound { marker })?;

        debug!(
            triangle = index,
            width = rect.width(),
            height = rect.height(),
            "captured triangle"
        );
        Ok(TriangleCapture {
            triangle: index,
            crop: crop(&frame, &rect),
            corners: local.corners,
        })
    }

    /// Bakes every triangle of `shell` in layout order.
    ///
    /// Triangles whose markers cannot be found are skipped and recorded in
    /// [`Atlas::skipped`].
    ///
    /// # Errors
    ///
    /// Returns an error if the parameters are invalid, the layout does not
    /// match the shell, or no triangle could be baked.
    pub fn bake(&self, shell: &Shell, layout: &Layout, scene: &Scene) -> Result<Atlas> {
        self.check(shell, layout)?;
        let captures = (0..layout.triangle_count()).map(|i| (i, self.capture(shell, i, scene)));
        self.merge(captures)
    }

    fn check(&self, shell: &Shell, layout: &Layout) -> Result<()> {
        self.params.validate()?;
        Layout::for_shell(shell, layout.triangles().to_vec())?;
        Ok(())
    }

    fn merge<I>(&self, captures: I) -> Result<Atlas>
    where
        I: IntoIterator<Item = (usize, std::result::Result<TriangleCapture, SkipReason>)>,
    {
        let mut session = BakeSession::new(self.params.seed_margin);
        for (index, capture) in captures {
            match capture {
                Ok(capture) => session.append(capture),
                Err(reason) => {
                    warn!(triangle = index, ?reason, "skipping triangle");
                    session.skip(index, reason);
                }
            }
        }
        let atlas = session.finish()?;
        info!(
            width = atlas.width(),
            height = atlas.height(),
            baked = atlas.uvs().len(),
            skipped = atlas.skipped().len(),
            "baked atlas"
        );
        Ok(atlas)
    }
}

impl<R: Rasterizer + Sync> AtlasBaker<R> {
    /// Like [`AtlasBaker::bake`], rendering and cropping triangles in
    /// parallel. Crops are merged in triangle order, so the atlas is the same
    /// as a sequential bake.
    ///
    /// # Errors
    ///
    /// Same as [`AtlasBaker::bake`].
    pub fn bake_parallel(&self, shell: &Shell, layout: &Layout, scene: &Scene) -> Result<Atlas> {
        self.check(shell, layout)?;
        let captures: Vec<_> = (0..layout.triangle_count())
            .into_par_iter()
            .map(|i| (i, self.capture(shell, i, scene)))
            .collect();
        self.merge(captures)
    }
}

fn crop(image: &RgbImage, rect: &PixelRect) -> RgbImage {
    imageops::crop_imm(image, rect.min_x, rect.min_y, rect.width(), rect.height()).to_image()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::geometry::TriangleMesh;
    use crate::math::Point2;
    use crate::render::{Resolution, SoftwareRasterizer};
    use image::Rgb;

    fn params() -> BakeParams {
        BakeParams::default()
            .with_resolution(Resolution::square(64))
            .with_parallel_scale(4.0)
            .with_normal_scale(-2.0)
    }

    /// A shell of two triangles forming the square x, y in [-2, 2] on the
    /// plane z = 2, facing +z.
    fn roof() -> (Shell, Layout) {
        let mesh = TriangleMesh::new(
            vec![
                Point3::new(-2.0, -2.0, 2.0),
                Point3::new(2.0, -2.0, 2.0),
                Point3::new(2.0, 2.0, 2.0),
                Point3::new(-2.0, 2.0, 2.0),
            ],
            vec![[0, 1, 2], [0, 2, 3]],
        )
        .unwrap();
        let shell = Shell::from_mesh(mesh).unwrap();
        let layout = Layout::new(vec![
            [Point2::new(0.0, 0.0), Point2::new(4.0, 0.0), Point2::new(4.0, 4.0)],
            [Point2::new(0.0, 0.0), Point2::new(4.0, 4.0), Point2::new(0.0, 4.0)],
        ]);
        (shell, layout)
    }

    fn floor_scene() -> Scene {
        let mut scene = Scene::default();
        scene.add_mesh(
            &TriangleMesh::cuboid(Point3::new(-3.0, -3.0, -1.0), Point3::new(3.0, 3.0, 0.0)),
            Rgb([0, 255, 255]),
        );
        scene
    }

    #[test]
    fn camera_sits_outside_looking_in() {
        let (shell, _) = roof();
        let baker = AtlasBaker::new(SoftwareRasterizer, params());
        let cam = baker.camera_for(&shell, 0).unwrap();
        assert!(cam.position.z > 2.0);
        assert!((cam.position.z - 4.0).abs() < 1e-9);
        assert!(cam.focal_point.z < cam.position.z);
    }

    #[test]
    fn two_triangle_bake() {
        let (shell, layout) = roof();
        let baker = AtlasBaker::new(SoftwareRasterizer, params());
        let atlas = baker.bake(&shell, &layout, &floor_scene()).unwrap();

        assert!(atlas.skipped().is_empty());
        assert_eq!(atlas.uv_count(), 6);
        let r = atlas.regions();
        assert_eq!(atlas.width(), r[0].width + r[1].width);
        assert_eq!(atlas.height(), r[0].height + baker.params().seed_margin);
        for t in atlas.uvs() {
            for uv in &t.uv {
                assert!((0.0..=1.0).contains(&uv.x) && (0.0..=1.0).contains(&uv.y));
            }
        }
        // The structure shows through the window.
        let cyan = atlas
            .image()
            .pixels()
            .filter(|p| **p == Rgb([0, 255, 255]))
            .count();
        assert!(cyan > 0);
    }

    #[test]
    fn triangle_outside_frame_is_skipped() {
        let (shell, layout) = roof();
        let tiny = params().with_parallel_scale(0.5);
        let baker = AtlasBaker::new(SoftwareRasterizer, tiny);
        let err = baker.bake(&shell, &layout, &floor_scene()).unwrap_err();
        assert!(matches!(
            err,
            crate::PaperfoldError::Bake(crate::error::BakeError::NothingBaked { triangles: 2 })
        ));
    }

    #[test]
    fn mismatched_layout_is_rejected() {
        let (shell, _) = roof();
        let layout = Layout::new(vec![[Point2::origin(); 3]]);
        let baker = AtlasBaker::new(SoftwareRasterizer, params());
        assert!(baker.bake(&shell, &layout, &floor_scene()).is_err());
    }

    #[test]
    fn parallel_bake_matches_sequential() {
        let (shell, layout) = roof();
        let baker = AtlasBaker::new(SoftwareRasterizer, params());
        let a = baker.bake(&shell, &layout, &floor_scene()).unwrap();
        let b = baker.bake_parallel(&shell, &layout, &floor_scene()).unwrap();
        assert_eq!(a.image(), b.image());
        assert_eq!(a.uvs(), b.uvs());
        assert_eq!(a.regions(), b.regions());
    }
}
