//! SH-projected lighting environments.
//!
//! An environment is a distant lighting function projected into SH color
//! coefficients once, then re-oriented at runtime by applying a
//! [`ShRotation`] - the renderer dots the (rotated) coefficients against
//! each vertex's transfer vector to shade it.

use nalgebra::Vector3;

use crate::core::rotation::{MathError, ShRotation};
use crate::core::sh::{n_coefficients, project};

/// A lighting environment expressed as SH color coefficients.
#[derive(Debug, Clone)]
pub struct ShEnvironment {
    coeffs: Vec<Vector3<f32>>,
    n_bands: usize,
}

impl ShEnvironment {
    /// Project a lighting function of (theta, phi) into `n_bands` bands
    /// using sqrt_n^2 stratified samples.
    pub fn from_function<F>(sqrt_n: u32, n_bands: usize, f: F) -> Self
    where
        F: Fn(f32, f32) -> Vector3<f32>,
    {
        Self {
            coeffs: project(sqrt_n, n_bands, f),
            n_bands,
        }
    }

    /// Wrap existing coefficients; the length must be a perfect square
    /// (n_bands^2).
    pub fn from_coefficients(coeffs: Vec<Vector3<f32>>) -> Result<Self, MathError> {
        let n_bands = (coeffs.len() as f64).sqrt() as usize;
        if n_coefficients(n_bands) != coeffs.len() {
            return Err(MathError::NonSquareCoefficientCount { len: coeffs.len() });
        }
        Ok(Self { coeffs, n_bands })
    }

    pub fn n_bands(&self) -> usize {
        self.n_bands
    }

    pub fn coefficients(&self) -> &[Vector3<f32>] {
        &self.coeffs
    }

    /// The environment re-oriented by a prebuilt rotation operator.
    ///
    /// Building an [`ShRotation`] is sequential over bands; callers that
    /// re-orient every frame construct the operator once and reuse it here.
    pub fn rotated(&self, rotation: &ShRotation) -> Result<Self, MathError> {
        if rotation.n_bands() != self.n_bands {
            return Err(MathError::DimensionMismatch {
                expected: n_coefficients(self.n_bands),
                actual: rotation.n_coefficients(),
            });
        }
        Ok(Self {
            coeffs: rotation.apply_color(&self.coeffs)?,
            n_bands: self.n_bands,
        })
    }
}
