//! Real spherical-harmonic basis evaluation and Monte-Carlo projection.
//!
//! Coefficient vectors are ordered by increasing band l, then increasing
//! order m, so a vector over n bands holds n^2 entries and entry (l, m)
//! lives at index l*(l+1) + m.
//!
//! `project` is a Monte-Carlo estimate over stratified sphere samples:
//! repeated calls converge with sample count but are not bit-identical,
//! so tests compare against tolerances.

use std::f32::consts::PI;
use std::ops::{AddAssign, Mul};

use crate::core::sampler::sphere_samples;

/// Number of coefficients spanned by `n_bands` SH bands.
#[inline]
pub fn n_coefficients(n_bands: usize) -> usize {
    n_bands * n_bands
}

/// Flat index of the (l, m) basis function.
#[inline]
pub fn sh_index(l: i32, m: i32) -> usize {
    (l * (l + 1) + m) as usize
}

/// Associated Legendre polynomial P_l^m(x), m >= 0, by the standard
/// three-term recurrence, without the Condon-Shortley phase (the graphics
/// convention; the rotation recursion in `rotation.rs` assumes it).
fn legendre(l: i32, m: i32, x: f32) -> f32 {
    let mut pmm = 1.0f32;
    if m > 0 {
        let somx2 = ((1.0 - x) * (1.0 + x)).max(0.0).sqrt();
        let mut fact = 1.0f32;
        for _ in 1..=m {
            pmm *= fact * somx2;
            fact += 2.0;
        }
    }
    if l == m {
        return pmm;
    }

    let mut pmmp1 = x * (2 * m + 1) as f32 * pmm;
    if l == m + 1 {
        return pmmp1;
    }

    let mut pll = 0.0f32;
    for ll in (m + 2)..=l {
        pll = ((2 * ll - 1) as f32 * x * pmmp1 - (ll + m - 1) as f32 * pmm) / (ll - m) as f32;
        pmm = pmmp1;
        pmmp1 = pll;
    }
    pll
}

fn factorial(n: i32) -> f64 {
    let mut acc = 1.0f64;
    for i in 2..=n as i64 {
        acc *= i as f64;
    }
    acc
}

/// Normalization constant K_l^m for the real SH basis.
fn sh_k(l: i32, m: i32) -> f32 {
    let m = m.abs();
    let num = (2 * l + 1) as f64 * factorial(l - m);
    let den = 4.0 * std::f64::consts::PI * factorial(l + m);
    (num / den).sqrt() as f32
}

/// Evaluate the real spherical harmonic y_l^m at spherical angles
/// (theta, phi).
///
/// Valid for l >= 0 and |m| <= l; anything else is a caller bug.
pub fn eval_sh(l: i32, m: i32, theta: f32, phi: f32) -> f32 {
    assert!(l >= 0 && m.abs() <= l, "invalid SH band/order ({l}, {m})");

    let sqrt2 = std::f32::consts::SQRT_2;
    let x = theta.cos();
    if m == 0 {
        sh_k(l, 0) * legendre(l, 0, x)
    } else if m > 0 {
        sqrt2 * sh_k(l, m) * (m as f32 * phi).cos() * legendre(l, m, x)
    } else {
        sqrt2 * sh_k(l, m) * (-m as f32 * phi).sin() * legendre(l, -m, x)
    }
}

/// Project a spherical function onto the first `n_bands` SH bands.
///
/// `f` maps (theta, phi) to a scalar or a color; accumulation is
/// elementwise. Draws sqrt_n^2 jittered stratified full-sphere samples and
/// scales the accumulated sum by 4*pi / N to approximate the integral
/// against each basis function.
pub fn project<T, F>(sqrt_n: u32, n_bands: usize, f: F) -> Vec<T>
where
    T: Copy + Default + AddAssign + Mul<f32, Output = T>,
    F: Fn(f32, f32) -> T,
{
    let samples = sphere_samples(sqrt_n, true);
    let mut coeffs = vec![T::default(); n_coefficients(n_bands)];
    if samples.is_empty() {
        return coeffs;
    }

    for s in &samples {
        let value = f(s.theta, s.phi);
        for l in 0..n_bands as i32 {
            for m in -l..=l {
                coeffs[sh_index(l, m)] += value * eval_sh(l, m, s.theta, s.phi);
            }
        }
    }

    let weight = 4.0 * PI / samples.len() as f32;
    for c in &mut coeffs {
        *c = *c * weight;
    }
    coeffs
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    #[test]
    fn test_band0_is_constant() {
        // y_0^0 = 1 / (2 * sqrt(pi)) everywhere.
        let expected = 0.282_094_79;
        assert_relative_eq!(eval_sh(0, 0, 0.3, 1.2), expected, epsilon = 1e-6);
        assert_relative_eq!(eval_sh(0, 0, 2.0, 4.5), expected, epsilon = 1e-6);
    }

    #[test]
    fn test_band1_zonal_matches_closed_form() {
        // y_1^0 = sqrt(3 / 4pi) * cos(theta)
        let k = (3.0 / (4.0 * std::f64::consts::PI)).sqrt() as f32;
        for &theta in &[0.0f32, 0.7, 1.5, 2.9] {
            assert_relative_eq!(eval_sh(1, 0, theta, 0.4), k * theta.cos(), epsilon = 1e-5);
        }
    }

    #[test]
    #[should_panic]
    fn test_invalid_order_panics() {
        eval_sh(1, 2, 0.0, 0.0);
    }

    #[test]
    fn test_sh_index_ordering() {
        assert_eq!(sh_index(0, 0), 0);
        assert_eq!(sh_index(1, -1), 1);
        assert_eq!(sh_index(1, 0), 2);
        assert_eq!(sh_index(1, 1), 3);
        assert_eq!(sh_index(2, -2), 4);
        assert_eq!(n_coefficients(5), 25);
    }

    #[test]
    fn test_project_constant_function() {
        // A constant k projects onto band 0 with coefficient k * 2 * sqrt(pi)
        // and ~0 elsewhere.
        let k = 3.0f32;
        let coeffs = project(60, 3, |_, _| k);
        let expected = k * 2.0 * std::f32::consts::PI.sqrt();
        assert_relative_eq!(coeffs[0], expected, epsilon = 0.05 * expected);
        for c in &coeffs[1..] {
            assert!(c.abs() < 0.05 * expected, "higher band leaked: {c}");
        }
    }

    #[test]
    fn test_project_basis_function_is_orthonormal() {
        // Projecting y_1^0 should recover ~1 at (1, 0) and ~0 elsewhere.
        let coeffs = project(80, 2, |theta, phi| eval_sh(1, 0, theta, phi));
        for (i, c) in coeffs.iter().enumerate() {
            let expected = if i == sh_index(1, 0) { 1.0 } else { 0.0 };
            assert!((c - expected).abs() < 0.05, "coeff {i} was {c}");
        }
    }

    #[test]
    fn test_project_color_function() {
        let coeffs: Vec<Vector3<f32>> = project(40, 2, |_, _| Vector3::new(1.0, 0.5, 0.25));
        let dc = coeffs[0];
        // Channels keep their ratios under elementwise accumulation.
        assert_relative_eq!(dc.y / dc.x, 0.5, epsilon = 1e-4);
        assert_relative_eq!(dc.z / dc.x, 0.25, epsilon = 1e-4);
    }
}
