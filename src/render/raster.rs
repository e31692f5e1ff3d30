use image::{Rgb, RgbImage};

use super::{Camera, Primitive, Projected, Resolution, Scene, ViewBasis};
use crate::error::{RenderError, Result};
use crate::math::{Point2, PIXEL_EPSILON};

/// Offscreen rasterization primitive.
pub trait Rasterizer {
    /// Renders `scene` as seen by `camera` into an RGB image of the given
    /// resolution. Row 0 is the top of the image.
    ///
    /// # Errors
    ///
    /// Returns an error if the camera or resolution is degenerate, or if the
    /// scene refers to a missing texture.
    fn render(&self, scene: &Scene, camera: &Camera, resolution: Resolution) -> Result<RgbImage>;
}

impl<R: Rasterizer + ?Sized> Rasterizer for &R {
    fn render(&self, scene: &Scene, camera: &Camera, resolution: Resolution) -> Result<RgbImage> {
        (**self).render(scene, camera, resolution)
    }
}

/// Deterministic CPU rasterizer: unlit, z-buffered, nearest-neighbour
/// texture sampling, pixel centres at half-integer coordinates.
#[derive(Debug, Clone, Copy, Default)]
pub struct SoftwareRasterizer;

struct Target {
    color: RgbImage,
    depth: Vec<f64>,
    width: i64,
    height: i64,
}

impl Target {
    fn new(resolution: Resolution, background: Rgb<u8>) -> Self {
        Self {
            color: RgbImage::from_pixel(resolution.width, resolution.height, background),
            depth: vec![f64::INFINITY; resolution.width as usize * resolution.height as usize],
            width: i64::from(resolution.width),
            height: i64::from(resolution.height),
        }
    }

    /// Writes `color` at (x, y) if it passes the depth test.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn plot(&mut self, x: i64, y: i64, depth: f64, color: Rgb<u8>) {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return;
        }
        let idx = (y * self.width + x) as usize;
        if depth < self.depth[idx] {
            self.depth[idx] = depth;
            self.color.put_pixel(x as u32, y as u32, color);
        }
    }
}

/// Texture source for a triangle being filled.
enum Fill<'a> {
    Flat(Rgb<u8>),
    Textured(&'a RgbImage, [Point2; 3]),
}

impl SoftwareRasterizer {
    #[allow(clippy::cast_possible_truncation)]
    fn fill_triangle(target: &mut Target, basis: &ViewBasis, p: [Projected; 3], fill: &Fill<'_>) {
        let edge = |a: &Projected, b: &Projected, x: f64, y: f64| {
            (b.x - a.x) * (y - a.y) - (b.y - a.y) * (x - a.x)
        };
        let area = edge(&p[0], &p[1], p[2].x, p[2].y);
        if area.abs() < 1e-12 {
            return;
        }

        let min_x = p.iter().map(|q| q.x).fold(f64::INFINITY, f64::min).floor().max(0.0) as i64;
        let max_x = p.iter().map(|q| q.x).fold(f64::NEG_INFINITY, f64::max).ceil() as i64;
        let min_y = p.iter().map(|q| q.y).fold(f64::INFINITY, f64::min).floor().max(0.0) as i64;
        let max_y = p.iter().map(|q| q.y).fold(f64::NEG_INFINITY, f64::max).ceil() as i64;
        let max_x = max_x.min(target.width - 1);
        let max_y = max_y.min(target.height - 1);

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                #[allow(clippy::cast_precision_loss)]
                let (cx, cy) = (x as f64 + 0.5, y as f64 + 0.5);
                let w0 = edge(&p[1], &p[2], cx, cy) / area;
                let w1 = edge(&p[2], &p[0], cx, cy) / area;
                let w2 = edge(&p[0], &p[1], cx, cy) / area;
                if w0 < -1e-9 || w1 < -1e-9 || w2 < -1e-9 {
                    continue;
                }
                let depth = w0 * p[0].depth + w1 * p[1].depth + w2 * p[2].depth;
                if !basis.clipping.contains(depth) {
                    continue;
                }
                let color = match fill {
                    Fill::Flat(c) => *c,
                    Fill::Textured(texture, uvs) => {
                        let u = w0 * uvs[0].x + w1 * uvs[1].x + w2 * uvs[2].x;
                        let v = w0 * uvs[0].y + w1 * uvs[1].y + w2 * uvs[2].y;
                        sample_nearest(texture, u, v)
                    }
                };
                target.plot(x, y, depth, color);
            }
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn splat_point(target: &mut Target, basis: &ViewBasis, p: Projected, color: Rgb<u8>, size: u32) {
        if !basis.clipping.contains(p.depth) {
            return;
        }
        let size = i64::from(size.max(1));
        let x0 = p.x.floor() as i64 - (size - 1) / 2;
        let y0 = p.y.floor() as i64 - (size - 1) / 2;
        for y in y0..y0 + size {
            for x in x0..x0 + size {
                target.plot(x, y, p.depth, color);
            }
        }
    }
}

/// Samples `texture` at (u, v), clamping to the edge. `v = 1` is the top row
/// and `v = 0` the bottom.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn sample_nearest(texture: &RgbImage, u: f64, v: f64) -> Rgb<u8> {
    let (w, h) = texture.dimensions();
    let x = (u * f64::from(w) + PIXEL_EPSILON).floor().clamp(0.0, f64::from(w.saturating_sub(1))) as u32;
    let y = ((1.0 - v) * f64::from(h) + PIXEL_EPSILON).floor().clamp(0.0, f64::from(h.saturating_sub(1))) as u32;
    *texture.get_pixel(x, y)
}

impl Rasterizer for SoftwareRasterizer {
    fn render(&self, scene: &Scene, camera: &Camera, resolution: Resolution) -> Result<RgbImage> {
        let resolution = resolution.validate()?;
        let basis = camera.view()?;
        let mut target = Target::new(resolution, scene.background());

        for primitive in scene.primitives() {
            match primitive {
                Primitive::Triangle { corners, color } => {
                    let p = corners.map(|c| basis.project(&c, resolution));
                    Self::fill_triangle(&mut target, &basis, p, &Fill::Flat(*color));
                }
                Primitive::TexturedTriangle {
                    corners,
                    uvs,
                    texture,
                } => {
                    let image = scene
                        .texture(*texture)
                        .ok_or(RenderError::MissingTexture(texture.0))?;
                    let p = corners.map(|c| basis.project(&c, resolution));
                    Self::fill_triangle(&mut target, &basis, p, &Fill::Textured(image, *uvs));
                }
                Primitive::Point {
                    position,
                    color,
                    size,
                } => {
                    let p = basis.project(position, resolution);
                    Self::splat_point(&mut target, &basis, p, *color, *size);
                }
            }
        }

        Ok(target.color)
    }
}
