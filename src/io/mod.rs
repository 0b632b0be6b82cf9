//! I/O for baked transfer artifacts.
//!
//! Artifacts are section-tagged text files produced once by the baker and
//! read back many times at load. The derived filename encodes the bake
//! mode and band count so callers can test existence before re-baking.

pub mod artifact;

// Re-export public types and functions
pub use artifact::{
    ao_baked_path, prt_baked_path, AoArtifact, ArtifactError, PrtArtifact,
};
