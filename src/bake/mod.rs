//! Per-triangle atlas baking.
//!
//! For every triangle of a shell a camera is placed just outside the shell,
//! looking in through the triangle. Two frames are rendered from it: the
//! structures, and three corner markers. The markers locate the triangle in
//! the frame; the frame is cropped to them and appended to a growing atlas
//! strip, and the marker pixels become the triangle's UV coordinates.

mod atlas;
mod baker;
mod marker;
mod params;
mod session;

pub use atlas::{Atlas, AtlasRegion, SkipReason, SkippedTriangle, TriangleUv};
pub use baker::{AtlasBaker, TriangleCapture};
pub use marker::{Marker, MarkerDetector, MarkerLocation, PixelRect};
pub use params::{BakeParams, MarkerThresholds};
pub use session::BakeSession;
