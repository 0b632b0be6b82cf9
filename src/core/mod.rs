//! Core data structures and mathematical operations.
//!
//! This module contains the fundamental types used throughout the baker:
//! - `MeshData` / `Material`: flat geometry and material references
//! - Ray-triangle intersection (brute force, the bake's hot path)
//! - Stratified sphere/hemisphere sampling
//! - SH basis evaluation, projection and block-diagonal rotation
//! - SH lighting environments
//!
//! All types here are "pure data" and math - no I/O, no bake orchestration.

pub mod environment;
pub mod intersect;
mod mesh;
pub mod rotation;
pub mod sampler;
pub mod sh;

// Re-export public types
pub use environment::ShEnvironment;
pub use intersect::{any_hit, closest_hit, ray_intersects_triangle, ray_triangle_hit, RayHit};
pub use mesh::{Material, MeshData};
pub use rotation::{MathError, ShRotation};
pub use sampler::{hemisphere_samples, sphere_samples, SphereSample};
pub use sh::{eval_sh, n_coefficients, project, sh_index};
