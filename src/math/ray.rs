use super::{Point3, Vector3, TOLERANCE};

/// Result of casting a ray against a single triangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RayHit {
    /// The ray misses the triangle (or hits behind its origin).
    Miss,
    /// The ray crosses the triangle interior at parameter `t > 0`.
    Hit { t: f64 },
    /// The ray grazes an edge or vertex, or lies in the triangle's plane.
    Degenerate,
}

/// Intersects the ray `origin + t * dir` with a triangle (Möller–Trumbore).
///
/// Hits within `edge_tol` (in barycentric units) of an edge are reported as
/// [`RayHit::Degenerate`] so that parity counting can retry along another
/// direction instead of double-counting a shared edge.
#[must_use]
pub fn ray_triangle_intersect(
    origin: &Point3,
    dir: &Vector3,
    tri: &[Point3; 3],
    edge_tol: f64,
) -> RayHit {
    let e1 = tri[1] - tri[0];
    let e2 = tri[2] - tri[0];
    let p = dir.cross(&e2);
    let det = e1.dot(&p);

    if det.abs() < TOLERANCE {
        // Parallel: only degenerate if the ray actually lies in the plane.
        let n = e1.cross(&e2);
        if n.norm() > TOLERANCE && n.dot(&(origin - tri[0])).abs() < TOLERANCE {
            return RayHit::Degenerate;
        }
        return RayHit::Miss;
    }

    let inv_det = 1.0 / det;
    let s = origin - tri[0];
    let u = s.dot(&p) * inv_det;
    if u < -edge_tol || u > 1.0 + edge_tol {
        return RayHit::Miss;
    }
    let q = s.cross(&e1);
    let v = dir.dot(&q) * inv_det;
    if v < -edge_tol || u + v > 1.0 + edge_tol {
        return RayHit::Miss;
    }
    let t = e2.dot(&q) * inv_det;
    if t <= TOLERANCE {
        return RayHit::Miss;
    }
    if u < edge_tol || v < edge_tol || u + v > 1.0 - edge_tol {
        return RayHit::Degenerate;
    }
    RayHit::Hit { t }
}
