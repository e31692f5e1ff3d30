//! Offscreen rendering seam used by the baker and the compositor.

mod camera;
mod raster;
mod scene;

pub use camera::{Camera, ClippingRange, Projected, Resolution, ViewBasis};
pub use raster::{sample_nearest, Rasterizer, SoftwareRasterizer};
pub use scene::{Primitive, Scene, TextureId};

/// Pure white, the neutral background of every render.
pub const WHITE: image::Rgb<u8> = image::Rgb([255, 255, 255]);
