//! Band-block-diagonal rotation of SH coefficient vectors.
//!
//! Rotating a function expressed in real SH never mixes bands, so a 3D
//! rotation acts as one dense (2l+1) x (2l+1) block per band. Blocks are
//! built band by band with the Ivanic-Ruedenberg recursion: band 0 is the
//! 1x1 identity, band 1 is the input rotation rearranged into SH basis
//! order (y, z, x), and each band l >= 2 is derived purely from the band
//! l-1 block. That dependency makes construction inherently sequential
//! over bands; once built the operator is immutable and can be applied
//! from many threads at once.

use nalgebra::{DMatrix, DVector, Matrix3, Vector3};
use thiserror::Error;

use crate::core::sh::n_coefficients;

/// Structural math errors. These fail immediately and never produce a
/// partial result.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MathError {
    #[error("dimension mismatch: expected {expected} elements, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("index {index} out of bounds for length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("coefficient count {len} is not a perfect square")]
    NonSquareCoefficientCount { len: usize },
}

/// A block-diagonal SH rotation operator.
#[derive(Debug, Clone)]
pub struct ShRotation {
    /// One (2l+1) x (2l+1) block per band, ordered by band.
    blocks: Vec<DMatrix<f32>>,
}

impl ShRotation {
    /// Build the rotation operator for the first `n_bands` bands from a
    /// 3x3 spatial rotation.
    pub fn new(rotation: &Matrix3<f32>, n_bands: usize) -> Self {
        let mut blocks = Vec::with_capacity(n_bands);
        if n_bands == 0 {
            return Self { blocks };
        }

        // Band 0: rotation cannot affect a constant function.
        blocks.push(DMatrix::identity(1, 1));

        if n_bands > 1 {
            // Band 1 in SH basis order (y, z, x): permute the spatial
            // rotation rows/columns accordingly.
            let p = [1usize, 2, 0];
            let mut band1 = DMatrix::zeros(3, 3);
            for i in 0..3 {
                for j in 0..3 {
                    band1[(i, j)] = rotation[(p[i], p[j])];
                }
            }
            blocks.push(band1);

            for l in 2..n_bands as i32 {
                let block = build_band(l, &blocks[(l - 1) as usize], &blocks[1]);
                blocks.push(block);
            }
        }

        Self { blocks }
    }

    /// The operator for the identity rotation (all blocks identity).
    pub fn identity(n_bands: usize) -> Self {
        Self::new(&Matrix3::identity(), n_bands)
    }

    /// Number of bands represented.
    pub fn n_bands(&self) -> usize {
        self.blocks.len()
    }

    /// Total coefficient count the operator expects (n_bands squared).
    pub fn n_coefficients(&self) -> usize {
        n_coefficients(self.blocks.len())
    }

    /// The rotation block for band `l`.
    pub fn block(&self, l: usize) -> &DMatrix<f32> {
        &self.blocks[l]
    }

    /// Rotate a scalar coefficient vector.
    ///
    /// The vector is sliced per band, each sub-vector is left-multiplied by
    /// its block, and the results are concatenated in band order. A length
    /// other than n_bands^2 is a dimension error; nothing is truncated or
    /// padded.
    pub fn apply(&self, coeffs: &[f32]) -> Result<Vec<f32>, MathError> {
        let expected = self.n_coefficients();
        if coeffs.len() != expected {
            return Err(MathError::DimensionMismatch {
                expected,
                actual: coeffs.len(),
            });
        }

        let mut out = Vec::with_capacity(expected);
        for (l, block) in self.blocks.iter().enumerate() {
            let start = l * l;
            let size = 2 * l + 1;
            let sub = DVector::from_column_slice(&coeffs[start..start + size]);
            let rotated = block * sub;
            out.extend(rotated.iter().copied());
        }
        Ok(out)
    }

    /// Rotate a color coefficient vector (elementwise over channels).
    pub fn apply_color(&self, coeffs: &[Vector3<f32>]) -> Result<Vec<Vector3<f32>>, MathError> {
        let expected = self.n_coefficients();
        if coeffs.len() != expected {
            return Err(MathError::DimensionMismatch {
                expected,
                actual: coeffs.len(),
            });
        }

        let mut out = Vec::with_capacity(expected);
        for (l, block) in self.blocks.iter().enumerate() {
            let start = l * l;
            let size = 2 * l + 1;
            for row in 0..size {
                let mut acc = Vector3::zeros();
                for col in 0..size {
                    acc += coeffs[start + col] * block[(row, col)];
                }
                out.push(acc);
            }
        }
        Ok(out)
    }
}

/// Build the band-l block from the band l-1 block and the band-1 block.
fn build_band(l: i32, prev: &DMatrix<f32>, band1: &DMatrix<f32>) -> DMatrix<f32> {
    let size = (2 * l + 1) as usize;
    let mut block = DMatrix::zeros(size, size);
    for m in -l..=l {
        for n in -l..=l {
            block[((m + l) as usize, (n + l) as usize)] = entry(l, m, n, prev, band1);
        }
    }
    block
}

/// One entry of the band-l block: u*U + v*V + w*W.
///
/// Terms whose recursion coefficient is zero are skipped; this also keeps
/// the U/V/W lookups inside the bounds of the band l-1 block.
fn entry(l: i32, m: i32, n: i32, prev: &DMatrix<f32>, band1: &DMatrix<f32>) -> f32 {
    let (cu, cv, cw) = uvw(l, m, n);
    let mut value = 0.0;
    if cu != 0.0 {
        value += cu * big_u(l, m, n, prev, band1);
    }
    if cv != 0.0 {
        value += cv * big_v(l, m, n, prev, band1);
    }
    if cw != 0.0 {
        value += cw * big_w(l, m, n, prev, band1);
    }
    value
}

#[inline]
fn delta(a: i32, b: i32) -> f32 {
    if a == b {
        1.0
    } else {
        0.0
    }
}

/// Recursion coefficients (u, v, w) for entry (l, m, n).
fn uvw(l: i32, m: i32, n: i32) -> (f32, f32, f32) {
    let denom = if n.abs() == l {
        (2 * l * (2 * l - 1)) as f32
    } else {
        ((l + n) * (l - n)) as f32
    };

    let u = (((l + m) * (l - m)) as f32 / denom).sqrt();
    let v = 0.5
        * (((1.0 + delta(m, 0)) * ((l + m.abs() - 1) * (l + m.abs())) as f32) / denom).sqrt()
        * (1.0 - 2.0 * delta(m, 0));
    let w = -0.5 * ((((l - m.abs() - 1) * (l - m.abs())) as f32) / denom).sqrt()
        * (1.0 - delta(m, 0));
    (u, v, w)
}

/// The P helper: combines band-1 entries with the band l-1 block.
///
/// `i` and the second index into the band-1 block use centered indexing
/// in {-1, 0, 1}; `mu` and `n` are centered in the band l-1 / band l range.
fn p_term(i: i32, l: i32, mu: i32, n: i32, prev: &DMatrix<f32>, band1: &DMatrix<f32>) -> f32 {
    let r = |a: i32, b: i32| band1[((a + 1) as usize, (b + 1) as usize)];
    let mm = |m: i32, nn: i32| prev[((m + l - 1) as usize, (nn + l - 1) as usize)];

    if n == l {
        r(i, 1) * mm(mu, l - 1) - r(i, -1) * mm(mu, -l + 1)
    } else if n == -l {
        r(i, 1) * mm(mu, -l + 1) + r(i, -1) * mm(mu, l - 1)
    } else {
        r(i, 0) * mm(mu, n)
    }
}

fn big_u(l: i32, m: i32, n: i32, prev: &DMatrix<f32>, band1: &DMatrix<f32>) -> f32 {
    p_term(0, l, m, n, prev, band1)
}

fn big_v(l: i32, m: i32, n: i32, prev: &DMatrix<f32>, band1: &DMatrix<f32>) -> f32 {
    if m == 0 {
        p_term(1, l, 1, n, prev, band1) + p_term(-1, l, -1, n, prev, band1)
    } else if m > 0 {
        p_term(1, l, m - 1, n, prev, band1) * (1.0 + delta(m, 1)).sqrt()
            - p_term(-1, l, -m + 1, n, prev, band1) * (1.0 - delta(m, 1))
    } else {
        p_term(1, l, m + 1, n, prev, band1) * (1.0 - delta(m, -1))
            + p_term(-1, l, -m - 1, n, prev, band1) * (1.0 + delta(m, -1)).sqrt()
    }
}

fn big_w(l: i32, m: i32, n: i32, prev: &DMatrix<f32>, band1: &DMatrix<f32>) -> f32 {
    // The w coefficient vanishes at m == 0, so reaching this is a bug in
    // the recursion itself, not bad caller input.
    if m == 0 {
        panic!("W term evaluated for m == 0 (undefined in the SH recursion)");
    }
    if m > 0 {
        p_term(1, l, m + 1, n, prev, band1) + p_term(-1, l, -m - 1, n, prev, band1)
    } else {
        p_term(1, l, m - 1, n, prev, band1) - p_term(-1, l, -m + 1, n, prev, band1)
    }
}
