//! Mesh geometry and material references.
//!
//! The baker consumes geometry that an external loader has already resolved
//! into flat, parallel arrays:
//! - Positions (homogeneous, 4 components)
//! - Normals (unit length)
//! - Texture coordinates
//! - Triangle vertex-index triples
//!
//! All types here are "pure data" - no I/O, no bake logic.

use nalgebra::{Vector2, Vector3, Vector4};

use crate::core::MathError;

/// Flat mesh geometry fed into the baker.
///
/// Invariants (checked by [`MeshData::validate`]):
/// - `positions`, `normals` and `texcoords` have equal length
/// - every index in `triangles` is within bounds of the vertex arrays
#[derive(Debug, Clone, PartialEq)]
pub struct MeshData {
    /// Vertex positions (homogeneous; w is carried through the bake untouched)
    pub positions: Vec<Vector4<f32>>,

    /// Vertex normals (unit length; zero-length normals are tolerated and
    /// produce degenerate bake output for that vertex, never an error)
    pub normals: Vec<Vector3<f32>>,

    /// 2D texture coordinates
    pub texcoords: Vec<Vector2<f32>>,

    /// Triangle vertex-index triples into the position array
    pub triangles: Vec<[u32; 3]>,
}

impl MeshData {
    /// Check the parallel-array and index-bounds invariants.
    pub fn validate(&self) -> Result<(), MathError> {
        if self.normals.len() != self.positions.len()
            || self.texcoords.len() != self.positions.len()
        {
            return Err(MathError::DimensionMismatch {
                expected: self.positions.len(),
                actual: self.normals.len().min(self.texcoords.len()),
            });
        }
        for tri in &self.triangles {
            for &idx in tri {
                if idx as usize >= self.positions.len() {
                    return Err(MathError::IndexOutOfBounds {
                        index: idx as usize,
                        len: self.positions.len(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// The three corner positions of triangle `t`, dropped to 3 components.
    pub fn triangle_corners(&self, t: usize) -> [Vector3<f32>; 3] {
        let [a, b, c] = self.triangles[t];
        [
            self.positions[a as usize].xyz(),
            self.positions[b as usize].xyz(),
            self.positions[c as usize].xyz(),
        ]
    }
}

/// Texture/material references carried alongside baked geometry.
///
/// Paths are plain strings; the codec never checks them for existence.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    /// Ambient (occlusion-modulated) texture path
    pub ambient_map: String,

    /// Diffuse albedo texture path
    pub diffuse_map: String,

    /// Specular texture path
    pub specular_map: String,

    /// Specular exponent (shininess)
    pub specular_exponent: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            ambient_map: String::new(),
            diffuse_map: String::new(),
            specular_map: String::new(),
            specular_exponent: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> MeshData {
        MeshData {
            positions: vec![
                Vector4::new(0.0, 0.0, 0.0, 1.0),
                Vector4::new(1.0, 0.0, 0.0, 1.0),
                Vector4::new(1.0, 1.0, 0.0, 1.0),
                Vector4::new(0.0, 1.0, 0.0, 1.0),
            ],
            normals: vec![Vector3::z(); 4],
            texcoords: vec![Vector2::zeros(); 4],
            triangles: vec![[0, 1, 2], [0, 2, 3]],
        }
    }

    #[test]
    fn test_validate_accepts_well_formed_mesh() {
        assert!(quad().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_unequal_arrays() {
        let mut mesh = quad();
        mesh.normals.pop();
        assert!(mesh.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_out_of_bounds_index() {
        let mut mesh = quad();
        mesh.triangles.push([0, 1, 9]);
        assert!(mesh.validate().is_err());
    }

    #[test]
    fn test_triangle_corners() {
        let mesh = quad();
        let [a, b, c] = mesh.triangle_corners(1);
        assert_eq!(a, Vector3::new(0.0, 0.0, 0.0));
        assert_eq!(b, Vector3::new(1.0, 1.0, 0.0));
        assert_eq!(c, Vector3::new(0.0, 1.0, 0.0));
    }
}
