//! Ray-triangle intersection.
//!
//! The baker tests every sample ray against every triangle in the mesh
//! (brute force - acceleration structures are deliberately out of scope),
//! so this is the hottest function in the crate: no allocation, few branches.
//!
//! Uses the Möller-Trumbore barycentric test. Rays parallel to the triangle
//! plane (determinant below epsilon) are rejected before any division.

use nalgebra::Vector3;

use crate::core::MeshData;

/// Determinant threshold below which a ray counts as parallel to the plane.
const DET_EPS: f32 = 1e-7;

/// Minimum hit distance; also used by callers to offset ray origins off the
/// surface so a vertex never reports a hit against its own triangles.
pub const RAY_EPS: f32 = 1e-4;

/// Closest-hit record for a ray-triangle intersection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Distance along the ray direction
    pub t: f32,
    /// Barycentric weight of corner B
    pub u: f32,
    /// Barycentric weight of corner C
    pub v: f32,
}

/// Ray-triangle hit test with barycentric output.
///
/// Returns `None` when the ray misses, points away (t <= RAY_EPS), or runs
/// parallel to the triangle plane.
#[inline]
pub fn ray_triangle_hit(
    a: &Vector3<f32>,
    b: &Vector3<f32>,
    c: &Vector3<f32>,
    origin: &Vector3<f32>,
    dir: &Vector3<f32>,
) -> Option<RayHit> {
    let edge1 = b - a;
    let edge2 = c - a;

    let pvec = dir.cross(&edge2);
    let det = edge1.dot(&pvec);
    if det.abs() < DET_EPS {
        return None;
    }
    let inv_det = 1.0 / det;

    let tvec = origin - a;
    let u = tvec.dot(&pvec) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let qvec = tvec.cross(&edge1);
    let v = dir.dot(&qvec) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = edge2.dot(&qvec) * inv_det;
    if t <= RAY_EPS {
        return None;
    }

    Some(RayHit { t, u, v })
}

/// Boolean ray-triangle test (occlusion queries don't need the hit point).
#[inline]
pub fn ray_intersects_triangle(
    a: &Vector3<f32>,
    b: &Vector3<f32>,
    c: &Vector3<f32>,
    origin: &Vector3<f32>,
    dir: &Vector3<f32>,
) -> bool {
    ray_triangle_hit(a, b, c, origin, dir).is_some()
}

/// True if any triangle of the mesh occludes the ray.
pub fn any_hit(mesh: &MeshData, origin: &Vector3<f32>, dir: &Vector3<f32>) -> bool {
    for t in 0..mesh.triangles.len() {
        let [a, b, c] = mesh.triangle_corners(t);
        if ray_intersects_triangle(&a, &b, &c, origin, dir) {
            return true;
        }
    }
    false
}

/// Closest hit over all triangles of the mesh.
///
/// Brute force by design; returns the triangle index with the hit record.
pub fn closest_hit(
    mesh: &MeshData,
    origin: &Vector3<f32>,
    dir: &Vector3<f32>,
) -> Option<(usize, RayHit)> {
    let mut best: Option<(usize, RayHit)> = None;
    for t in 0..mesh.triangles.len() {
        let [a, b, c] = mesh.triangle_corners(t);
        if let Some(hit) = ray_triangle_hit(&a, &b, &c, origin, dir) {
            if best.map_or(true, |(_, b)| hit.t < b.t) {
                best = Some((t, hit));
            }
        }
    }
    best
}
