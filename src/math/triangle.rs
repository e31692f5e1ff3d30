use super::{Point3, Vector3, TOLERANCE};
use crate::error::{GeometryError, Result};

/// Returns the centroid of a triangle.
#[must_use]
pub fn triangle_centroid(tri: &[Point3; 3]) -> Point3 {
    Point3::from((tri[0].coords + tri[1].coords + tri[2].coords) / 3.0)
}

/// Computes the unit normal of a triangle from its winding
/// (counter-clockwise seen from the side the normal points to).
///
/// # Errors
///
/// Returns `GeometryError::Degenerate` if the triangle has (near) zero area.
pub fn triangle_normal(tri: &[Point3; 3]) -> Result<Vector3> {
    let n = (tri[1] - tri[0]).cross(&(tri[2] - tri[0]));
    let len = n.norm();
    if len < TOLERANCE {
        return Err(GeometryError::Degenerate(format!(
            "zero-area triangle ({:?}, {:?}, {:?})",
            tri[0], tri[1], tri[2]
        ))
        .into());
    }
    Ok(n / len)
}
