//! Ambient occlusion baking: per-vertex visibility and bent normals.

use nalgebra::Vector3;
use rayon::prelude::*;

use crate::bake::Progress;
use crate::core::intersect::{any_hit, RAY_EPS};
use crate::core::sampler::hemisphere_samples;
use crate::core::{MathError, MeshData};

/// Accumulated bent-normal vectors shorter than this stay the zero vector.
const BENT_EPS: f32 = 1e-5;

/// AO bake configuration.
#[derive(Debug, Clone)]
pub struct AoBakeParams {
    /// Square root of the sphere sample count per vertex
    pub sqrt_n_samples: u32,
    /// Jitter the stratified grid (disable for reproducible output)
    pub jitter: bool,
}

impl Default for AoBakeParams {
    fn default() -> Self {
        Self {
            sqrt_n_samples: 32,
            jitter: true,
        }
    }
}

/// Per-vertex AO bake output.
#[derive(Debug, Clone, PartialEq)]
pub struct AoBakeResult {
    /// Fraction of hemisphere samples that escaped the mesh, in [0, 1].
    /// 1.0 means fully visible, 0.0 fully enclosed (or a degenerate normal).
    pub occlusion: Vec<f32>,

    /// Normalized average unoccluded direction per vertex; the zero vector
    /// when every sample was occluded or the accumulation was negligible.
    pub bent_normals: Vec<Vector3<f32>>,
}

/// Bake per-vertex occlusion and bent normals.
///
/// Vertices are independent and processed in parallel; each worker writes
/// only its own output slot, so no locking is needed. A mesh with zero
/// triangles has nothing to occlude and yields 1.0 everywhere.
pub fn bake_ao(mesh: &MeshData, params: &AoBakeParams) -> Result<AoBakeResult, MathError> {
    mesh.validate()?;

    log::info!(
        "baking occlusion for {} vertices against {} triangles",
        mesh.vertex_count(),
        mesh.triangles.len()
    );
    let progress = Progress::new("occlusion", mesh.vertex_count());

    let per_vertex: Vec<(f32, Vector3<f32>)> = (0..mesh.vertex_count())
        .into_par_iter()
        .map(|i| {
            let out = bake_vertex(mesh, i, params);
            progress.tick();
            out
        })
        .collect();

    let (occlusion, bent_normals) = per_vertex.into_iter().unzip();
    Ok(AoBakeResult {
        occlusion,
        bent_normals,
    })
}

fn bake_vertex(mesh: &MeshData, vertex: usize, params: &AoBakeParams) -> (f32, Vector3<f32>) {
    let normal = mesh.normals[vertex];
    let samples = hemisphere_samples(params.sqrt_n_samples, &normal, params.jitter);
    if samples.is_empty() {
        // Degenerate normal: no valid hemisphere, report fully occluded.
        return (0.0, Vector3::zeros());
    }

    // Offset off the surface so the vertex's own triangles don't self-hit.
    let origin = mesh.positions[vertex].xyz() + normal * RAY_EPS;

    let mut bent = Vector3::zeros();
    let mut unoccluded = 0usize;
    for s in &samples {
        if !any_hit(mesh, &origin, &s.dir) {
            bent += s.dir;
            unoccluded += 1;
        }
    }

    let occlusion = unoccluded as f32 / samples.len() as f32;
    let bent = if bent.norm() < BENT_EPS {
        Vector3::zeros()
    } else {
        bent.normalize()
    };
    (occlusion, bent)
}
