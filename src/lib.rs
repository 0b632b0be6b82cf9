//! # shbake-rs: Precomputed lighting transfer baking in Rust
//!
//! This crate implements the offline lighting pipeline of a demo renderer:
//! per-vertex Ambient Occlusion baking (scalar visibility + bent normal)
//! and Precomputed Radiance Transfer baking (spherical-harmonic transfer
//! vectors, optionally with interreflection bounces), plus the SH math
//! layer both rest on.
//!
//! ## Architecture
//!
//! The crate is organized into three modules:
//!
//! - `core`: Fundamental data and math (mesh arrays, ray-triangle tests,
//!   stratified sampling, SH basis/projection/rotation, environments)
//! - `bake`: The transfer baker (AO and PRT, bounce passes, orchestration)
//! - `io`: The baked-artifact codec (section-tagged text files)
//!
//! The renderer that consumes the baked output - windowing, shaders, scene
//! graph, cameras - is an external collaborator: it feeds flat geometry
//! and albedo arrays in and reads occlusion values or transfer vectors
//! back out. Ray tests are brute force over every triangle by design;
//! there are no acceleration structures and no GPU paths.

// Core data structures and math
pub mod core;

// AO / PRT baking
pub mod bake;

// Baked artifact I/O
pub mod io;

// Re-export commonly used types at crate root for convenience
pub use crate::core::{Material, MathError, MeshData, ShEnvironment, ShRotation};
pub use bake::{
    bake_ao, bake_prt, load_or_bake_ao, load_or_bake_prt, AoBakeParams, AoBakeResult, BakeError,
    PrtBakeParams, PrtBakeResult, PrtMode,
};
pub use io::{AoArtifact, ArtifactError, PrtArtifact};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
