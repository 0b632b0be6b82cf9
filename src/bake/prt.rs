//! Precomputed radiance transfer baking.
//!
//! Each vertex gets a transfer vector: n_bands^2 color coefficients that
//! map an SH-encoded lighting environment to outgoing radiance at that
//! vertex. Three variants:
//!
//! - unshadowed: projection of the cosine-weighted diffuse lobe, no
//!   visibility tests
//! - shadowed: every sample direction is additionally ray-tested against
//!   the whole mesh; occluded samples contribute nothing
//! - interreflected: the shadowed result is bounce 0; each further bounce
//!   gathers, along occluded sample directions, the closest hit's
//!   barycentrically interpolated previous-bounce transfer, weighted by
//!   the local diffuse BRDF and the cosine term
//!
//! Bounce passes read exclusively from the previous pass's buffer and
//! write a fresh one (ping-pong), so the result is independent of vertex
//! processing order; the buffer swap between passes is the only
//! synchronization point.

use std::f32::consts::PI;

use nalgebra::Vector3;
use rayon::prelude::*;

use crate::bake::Progress;
use crate::core::intersect::{any_hit, closest_hit, RAY_EPS};
use crate::core::sampler::hemisphere_samples;
use crate::core::sh::{eval_sh, n_coefficients, sh_index};
use crate::core::{MathError, MeshData, ShEnvironment};

/// PRT bake variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrtMode {
    Unshadowed,
    Shadowed,
    Interreflected,
}

impl PrtMode {
    /// Single-letter tag used in derived artifact filenames.
    pub fn tag(self) -> &'static str {
        match self {
            PrtMode::Unshadowed => "u",
            PrtMode::Shadowed => "s",
            PrtMode::Interreflected => "i",
        }
    }
}

/// PRT bake configuration.
#[derive(Debug, Clone)]
pub struct PrtBakeParams {
    pub mode: PrtMode,
    /// Square root of the sphere sample count per vertex
    pub sqrt_n_samples: u32,
    /// Number of SH bands (coefficient count is n_bands^2)
    pub n_bands: usize,
    /// Interreflection passes after the shadowed bounce 0
    pub n_bounces: u32,
    /// Jitter the stratified grid (disable for reproducible output)
    pub jitter: bool,
}

impl Default for PrtBakeParams {
    fn default() -> Self {
        Self {
            mode: PrtMode::Shadowed,
            sqrt_n_samples: 32,
            n_bands: 5,
            n_bounces: 3,
            jitter: true,
        }
    }
}

/// Per-vertex PRT bake output.
#[derive(Debug, Clone, PartialEq)]
pub struct PrtBakeResult {
    /// One transfer vector (n_bands^2 color coefficients) per vertex
    pub transfer: Vec<Vec<Vector3<f32>>>,
    pub n_bands: usize,
}

impl PrtBakeResult {
    /// Outgoing radiance at `vertex` under an SH lighting environment:
    /// the per-channel dot product of transfer and environment coefficients.
    pub fn radiance(&self, vertex: usize, env: &ShEnvironment) -> Result<Vector3<f32>, MathError> {
        let transfer = &self.transfer[vertex];
        let coeffs = env.coefficients();
        if coeffs.len() != transfer.len() {
            return Err(MathError::DimensionMismatch {
                expected: transfer.len(),
                actual: coeffs.len(),
            });
        }
        let mut out = Vector3::zeros();
        for (t, e) in transfer.iter().zip(coeffs) {
            out += t.component_mul(e);
        }
        Ok(out)
    }
}

/// Bake per-vertex transfer vectors.
///
/// `albedo` is the per-vertex diffuse albedo, resolved upstream from the
/// material's textures into a flat array parallel to the vertex arrays.
pub fn bake_prt(
    mesh: &MeshData,
    albedo: &[Vector3<f32>],
    params: &PrtBakeParams,
) -> Result<PrtBakeResult, MathError> {
    mesh.validate()?;
    if albedo.len() != mesh.vertex_count() {
        return Err(MathError::DimensionMismatch {
            expected: mesh.vertex_count(),
            actual: albedo.len(),
        });
    }

    let shadowed = params.mode != PrtMode::Unshadowed;
    log::info!(
        "baking {:?} transfer for {} vertices ({} bands)",
        params.mode,
        mesh.vertex_count(),
        params.n_bands
    );
    let progress = Progress::new("transfer", mesh.vertex_count());

    let mut transfer: Vec<Vec<Vector3<f32>>> = (0..mesh.vertex_count())
        .into_par_iter()
        .map(|i| {
            let out = direct_transfer(mesh, albedo, i, params, shadowed);
            progress.tick();
            out
        })
        .collect();

    if params.mode == PrtMode::Interreflected {
        // Bounce 0 is the shadowed result; each further pass gathers from
        // the previous pass only and its increment is added to the total.
        let mut bounce = transfer.clone();
        for pass in 1..=params.n_bounces {
            log::info!("interreflection pass {pass}/{}", params.n_bounces);
            bounce = bounce_pass(mesh, albedo, params, &bounce);
            for (total, inc) in transfer.iter_mut().zip(&bounce) {
                for (t, i) in total.iter_mut().zip(inc) {
                    *t += i;
                }
            }
        }
    }

    Ok(PrtBakeResult {
        transfer,
        n_bands: params.n_bands,
    })
}

/// Direct (bounce 0) transfer for one vertex.
fn direct_transfer(
    mesh: &MeshData,
    albedo: &[Vector3<f32>],
    vertex: usize,
    params: &PrtBakeParams,
    shadowed: bool,
) -> Vec<Vector3<f32>> {
    let n_coeffs = n_coefficients(params.n_bands);
    let mut coeffs = vec![Vector3::zeros(); n_coeffs];

    let normal = mesh.normals[vertex];
    let samples = hemisphere_samples(params.sqrt_n_samples, &normal, params.jitter);
    if samples.is_empty() {
        return coeffs;
    }

    let origin = mesh.positions[vertex].xyz() + normal * RAY_EPS;
    let brdf = albedo[vertex] / PI;

    for s in &samples {
        let cosine = s.dir.dot(&normal);
        if cosine <= 0.0 {
            continue;
        }
        if shadowed && any_hit(mesh, &origin, &s.dir) {
            continue;
        }
        let weighted = brdf * cosine;
        for l in 0..params.n_bands as i32 {
            for m in -l..=l {
                coeffs[sh_index(l, m)] += weighted * eval_sh(l, m, s.theta, s.phi);
            }
        }
    }

    // Full-sphere MC weight: occluded/below-horizon samples contribute 0.
    scale(&mut coeffs, params.sqrt_n_samples);
    coeffs
}

/// One interreflection pass over all vertices.
///
/// Reads only `prev` and writes a fresh buffer, so the output does not
/// depend on vertex processing order; the surrounding loop's buffer swap
/// is the pass barrier.
pub fn bounce_pass(
    mesh: &MeshData,
    albedo: &[Vector3<f32>],
    params: &PrtBakeParams,
    prev: &[Vec<Vector3<f32>>],
) -> Vec<Vec<Vector3<f32>>> {
    (0..mesh.vertex_count())
        .into_par_iter()
        .map(|i| gather_vertex(mesh, albedo, params, prev, i))
        .collect()
}

/// Gather the previous pass's transfer reflected toward one vertex.
fn gather_vertex(
    mesh: &MeshData,
    albedo: &[Vector3<f32>],
    params: &PrtBakeParams,
    prev: &[Vec<Vector3<f32>>],
    vertex: usize,
) -> Vec<Vector3<f32>> {
    let n_coeffs = n_coefficients(params.n_bands);
    let mut coeffs = vec![Vector3::zeros(); n_coeffs];

    let normal = mesh.normals[vertex];
    let samples = hemisphere_samples(params.sqrt_n_samples, &normal, params.jitter);
    if samples.is_empty() {
        return coeffs;
    }

    let origin = mesh.positions[vertex].xyz() + normal * RAY_EPS;
    let brdf = albedo[vertex] / PI;

    for s in &samples {
        let cosine = s.dir.dot(&normal);
        if cosine <= 0.0 {
            continue;
        }
        // Only blocked directions receive bounced light.
        let Some((tri, hit)) = closest_hit(mesh, &origin, &s.dir) else {
            continue;
        };

        let [ia, ib, ic] = mesh.triangles[tri];
        let (wa, wb, wc) = (1.0 - hit.u - hit.v, hit.u, hit.v);
        let (ta, tb, tc) = (
            &prev[ia as usize],
            &prev[ib as usize],
            &prev[ic as usize],
        );

        for j in 0..n_coeffs {
            let interpolated = ta[j] * wa + tb[j] * wb + tc[j] * wc;
            coeffs[j] += interpolated.component_mul(&brdf) * cosine;
        }
    }

    scale(&mut coeffs, params.sqrt_n_samples);
    coeffs
}

fn scale(coeffs: &mut [Vector3<f32>], sqrt_n: u32) {
    let weight = 4.0 * PI / (sqrt_n * sqrt_n) as f32;
    for c in coeffs {
        *c *= weight;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{Vector2, Vector4};

    fn single_triangle() -> MeshData {
        MeshData {
            positions: vec![
                Vector4::new(0.0, 0.0, 0.0, 1.0),
                Vector4::new(1.0, 0.0, 0.0, 1.0),
                Vector4::new(0.0, 1.0, 0.0, 1.0),
            ],
            normals: vec![Vector3::z(); 3],
            texcoords: vec![Vector2::zeros(); 3],
            triangles: vec![[0, 1, 2]],
        }
    }

    fn white(n: usize) -> Vec<Vector3<f32>> {
        vec![Vector3::new(1.0, 1.0, 1.0); n]
    }

    #[test]
    fn test_unshadowed_matches_shadowed_without_occluders() {
        // A lone triangle never occludes its own hemisphere, so the two
        // variants see the same samples.
        let mesh = single_triangle();
        let base = PrtBakeParams {
            sqrt_n_samples: 20,
            n_bands: 3,
            jitter: false,
            ..Default::default()
        };
        let unshadowed = bake_prt(
            &mesh,
            &white(3),
            &PrtBakeParams {
                mode: PrtMode::Unshadowed,
                ..base.clone()
            },
        )
        .unwrap();
        let shadowed = bake_prt(
            &mesh,
            &white(3),
            &PrtBakeParams {
                mode: PrtMode::Shadowed,
                ..base
            },
        )
        .unwrap();
        for (a, b) in unshadowed.transfer.iter().zip(&shadowed.transfer) {
            for (x, y) in a.iter().zip(b) {
                assert_relative_eq!((x - y).norm(), 0.0, epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn test_transfer_dc_term_is_positive() {
        // The cosine lobe has positive mean, so the band-0 coefficient of a
        // white surface must be positive.
        let mesh = single_triangle();
        let result = bake_prt(
            &mesh,
            &white(3),
            &PrtBakeParams {
                sqrt_n_samples: 24,
                n_bands: 2,
                jitter: false,
                mode: PrtMode::Shadowed,
                ..Default::default()
            },
        )
        .unwrap();
        for transfer in &result.transfer {
            assert!(transfer[0].x > 0.0);
        }
    }

    #[test]
    fn test_radiance_under_constant_environment() {
        let mesh = single_triangle();
        let result = bake_prt(
            &mesh,
            &white(3),
            &PrtBakeParams {
                sqrt_n_samples: 30,
                n_bands: 3,
                jitter: false,
                mode: PrtMode::Unshadowed,
                ..Default::default()
            },
        )
        .unwrap();
        let env = ShEnvironment::from_function(60, 3, |_, _| Vector3::new(1.0, 1.0, 1.0));
        let color = result.radiance(0, &env).unwrap();
        // Unit-radiance sky onto a white diffuse surface: reflected
        // radiance should land near 1 (albedo/pi * integral of cosine
        // over the hemisphere times pi).
        assert!(color.x > 0.6 && color.x < 1.4, "got {color:?}");
    }

    #[test]
    fn test_radiance_rejects_band_mismatch() {
        let mesh = single_triangle();
        let result = bake_prt(
            &mesh,
            &white(3),
            &PrtBakeParams {
                sqrt_n_samples: 8,
                n_bands: 2,
                jitter: false,
                mode: PrtMode::Unshadowed,
                ..Default::default()
            },
        )
        .unwrap();
        let env = ShEnvironment::from_function(20, 4, |_, _| Vector3::zeros());
        assert!(result.radiance(0, &env).is_err());
    }

    #[test]
    fn test_albedo_length_mismatch_is_an_error() {
        let mesh = single_triangle();
        assert!(bake_prt(&mesh, &white(2), &PrtBakeParams::default()).is_err());
    }

    #[test]
    fn test_interreflection_adds_light_in_a_corner() {
        // Two perpendicular quads forming a corner: vertices near the
        // crease should gain energy from the bounce relative to shadowed.
        let mesh = corner_mesh();
        let albedo = white(mesh.vertex_count());
        let base = PrtBakeParams {
            sqrt_n_samples: 16,
            n_bands: 2,
            jitter: false,
            n_bounces: 1,
            ..Default::default()
        };
        let shadowed = bake_prt(
            &mesh,
            &albedo,
            &PrtBakeParams {
                mode: PrtMode::Shadowed,
                ..base.clone()
            },
        )
        .unwrap();
        let bounced = bake_prt(
            &mesh,
            &albedo,
            &PrtBakeParams {
                mode: PrtMode::Interreflected,
                ..base
            },
        )
        .unwrap();

        let sum = |r: &PrtBakeResult| -> f32 {
            r.transfer.iter().map(|t| t[0].x).sum()
        };
        assert!(sum(&bounced) >= sum(&shadowed));
    }

    fn corner_mesh() -> MeshData {
        // Floor quad in z = 0, wall quad in y = 1, normals facing into
        // the corner.
        let positions = vec![
            Vector4::new(0.0, 0.0, 0.0, 1.0),
            Vector4::new(1.0, 0.0, 0.0, 1.0),
            Vector4::new(1.0, 1.0, 0.0, 1.0),
            Vector4::new(0.0, 1.0, 0.0, 1.0),
            Vector4::new(0.0, 1.0, 0.0, 1.0),
            Vector4::new(1.0, 1.0, 0.0, 1.0),
            Vector4::new(1.0, 1.0, 1.0, 1.0),
            Vector4::new(0.0, 1.0, 1.0, 1.0),
        ];
        let normals = vec![
            Vector3::z(),
            Vector3::z(),
            Vector3::z(),
            Vector3::z(),
            -Vector3::y(),
            -Vector3::y(),
            -Vector3::y(),
            -Vector3::y(),
        ];
        MeshData {
            texcoords: vec![Vector2::zeros(); positions.len()],
            normals,
            triangles: vec![[0, 1, 2], [0, 2, 3], [4, 5, 6], [4, 6, 7]],
            positions,
        }
    }
}
