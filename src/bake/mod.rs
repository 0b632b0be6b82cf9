//! The transfer baker: per-vertex AO and PRT precomputation.
//!
//! Both bake modes share the same shell: every vertex is processed
//! independently (rayon worker pool, disjoint output slots, read-only mesh),
//! hemisphere directions are drawn from the stratified sampler, and
//! occlusion is decided by brute-force ray tests against every triangle.
//!
//! `load_or_bake_*` is the explicit recovery path for missing artifacts:
//! the caller's derived filename is checked first, a present artifact is
//! read (corruption propagates as an error), and only an absent one
//! triggers a fresh bake.

mod ao;
mod prt;

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use thiserror::Error;

use crate::core::{Material, MathError, MeshData};
use crate::io::artifact::{ao_baked_path, prt_baked_path, ArtifactError, AoArtifact, PrtArtifact};

pub use ao::{bake_ao, AoBakeParams, AoBakeResult};
pub use prt::{bake_prt, bounce_pass, PrtBakeParams, PrtBakeResult, PrtMode};

/// Errors surfaced by the bake orchestrator.
#[derive(Debug, Error)]
pub enum BakeError {
    #[error(transparent)]
    Math(#[from] MathError),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),
}

/// Shared percent-complete reporting for a parallel bake pass.
///
/// Progress lines are an observable side effect only; nothing in the bake
/// contract depends on them.
pub(crate) struct Progress {
    label: &'static str,
    total: usize,
    done: AtomicUsize,
    percent: AtomicUsize,
}

impl Progress {
    pub(crate) fn new(label: &'static str, total: usize) -> Self {
        Self {
            label,
            total,
            done: AtomicUsize::new(0),
            percent: AtomicUsize::new(0),
        }
    }

    /// Record one finished vertex, logging at 10% steps.
    pub(crate) fn tick(&self) {
        if self.total == 0 {
            return;
        }
        let done = self.done.fetch_add(1, Ordering::Relaxed) + 1;
        let percent = done * 100 / self.total;
        let previous = self.percent.fetch_max(percent, Ordering::Relaxed);
        if percent > previous && percent % 10 == 0 {
            log::info!("{} bake {percent}% complete", self.label);
        }
    }
}

/// Read a previously baked AO artifact if one exists for `mesh_path`,
/// otherwise bake and persist a fresh one.
pub fn load_or_bake_ao(
    mesh: &MeshData,
    material: &Material,
    mesh_path: &Path,
    params: &AoBakeParams,
) -> Result<AoBakeResult, BakeError> {
    let baked = ao_baked_path(mesh_path);
    if baked.exists() {
        let artifact = AoArtifact::read(&baked)?;
        return Ok(AoBakeResult {
            occlusion: artifact.occlusion,
            bent_normals: artifact.bent_normals,
        });
    }

    let result = bake_ao(mesh, params)?;
    AoArtifact::from_bake(mesh, &result, material).write(&baked)?;
    Ok(result)
}

/// Read a previously baked PRT artifact if one exists for `mesh_path` and
/// the requested mode/band count, otherwise bake and persist a fresh one.
pub fn load_or_bake_prt(
    mesh: &MeshData,
    albedo: &[nalgebra::Vector3<f32>],
    material: &Material,
    mesh_path: &Path,
    params: &PrtBakeParams,
) -> Result<PrtBakeResult, BakeError> {
    let baked = prt_baked_path(mesh_path, params.mode, params.n_bands);
    if baked.exists() {
        let artifact = PrtArtifact::read(&baked)?;
        return Ok(PrtBakeResult {
            transfer: artifact.transfer,
            n_bands: artifact.n_bands,
        });
    }

    let result = bake_prt(mesh, albedo, params)?;
    PrtArtifact::from_bake(mesh, &result, material).write(&baked)?;
    Ok(result)
}
