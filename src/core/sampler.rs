//! Stratified direction sampling over the sphere and hemisphere.
//!
//! The bake and the SH projection both draw directions from an
//! sqrt_n x sqrt_n stratified grid on the unit square, mapped to the sphere
//! with theta = acos(2u - 1), phi = 2*pi*v. The mapping is uniform by solid
//! angle. Hemisphere sampling reuses the sphere grid and discards directions
//! below the horizon, so roughly half the grid survives.

use nalgebra::Vector3;
use rand::Rng;

use std::f32::consts::PI;

/// Normals shorter than this are treated as degenerate (no valid hemisphere).
const NORMAL_EPS: f32 = 1e-6;

/// A stratified direction sample with its spherical angles.
///
/// The angles are kept alongside the direction so SH projection can evaluate
/// basis functions without recovering them from the vector.
#[derive(Debug, Clone, Copy)]
pub struct SphereSample {
    /// Unit direction
    pub dir: Vector3<f32>,
    /// Polar angle in [0, pi]
    pub theta: f32,
    /// Azimuthal angle in [0, 2*pi)
    pub phi: f32,
}

/// Generate sqrt_n^2 stratified directions over the full sphere.
///
/// With `jitter` enabled each cell's (u, v) is perturbed by a uniform offset
/// bounded by the cell size; otherwise samples sit on the cell corners and
/// the sequence is fully deterministic.
pub fn sphere_samples(sqrt_n: u32, jitter: bool) -> Vec<SphereSample> {
    let mut samples = Vec::with_capacity((sqrt_n * sqrt_n) as usize);
    if sqrt_n == 0 {
        return samples;
    }

    let cell = 1.0 / sqrt_n as f32;
    let mut rng = rand::rng();

    for x in 0..sqrt_n {
        for y in 0..sqrt_n {
            let mut u = x as f32 * cell;
            let mut v = y as f32 * cell;
            if jitter {
                u += rng.random::<f32>() * cell;
                v += rng.random::<f32>() * cell;
            }

            let theta = (2.0 * u - 1.0).clamp(-1.0, 1.0).acos();
            let phi = 2.0 * PI * v;

            let dir = Vector3::new(
                theta.sin() * phi.cos(),
                theta.sin() * phi.sin(),
                theta.cos(),
            );
            samples.push(SphereSample { dir, theta, phi });
        }
    }
    samples
}

/// Generate stratified directions in the hemisphere around `normal`.
///
/// Sphere samples whose dot product with the normal is negative are
/// discarded, so the result holds roughly sqrt_n^2 / 2 directions. A
/// degenerate (near zero-length) normal yields an empty sequence rather
/// than an error.
pub fn hemisphere_samples(sqrt_n: u32, normal: &Vector3<f32>, jitter: bool) -> Vec<SphereSample> {
    if normal.norm() < NORMAL_EPS {
        return Vec::new();
    }
    let mut samples = sphere_samples(sqrt_n, jitter);
    samples.retain(|s| s.dir.dot(normal) >= 0.0);
    samples
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_sphere_samples_count_and_unit_length() {
        let samples = sphere_samples(16, true);
        assert_eq!(samples.len(), 256);
        for s in &samples {
            assert_relative_eq!(s.dir.norm(), 1.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_sphere_samples_angles_match_direction() {
        for s in sphere_samples(8, true) {
            let rebuilt = Vector3::new(
                s.theta.sin() * s.phi.cos(),
                s.theta.sin() * s.phi.sin(),
                s.theta.cos(),
            );
            assert_relative_eq!((rebuilt - s.dir).norm(), 0.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_hemisphere_samples_stay_above_horizon() {
        let normal = Vector3::new(0.0, 0.0, 1.0);
        let samples = hemisphere_samples(20, &normal, true);
        assert!(!samples.is_empty());
        for s in &samples {
            assert!(s.dir.dot(&normal) >= 0.0);
        }
        // Roughly half the sphere grid should survive the filter.
        let total = 400.0;
        let frac = samples.len() as f32 / total;
        assert!((0.35..=0.65).contains(&frac), "fraction was {frac}");
    }

    #[test]
    fn test_degenerate_normal_yields_no_samples() {
        let samples = hemisphere_samples(10, &Vector3::zeros(), true);
        assert!(samples.is_empty());
    }

    #[test]
    fn test_unjittered_samples_are_deterministic() {
        let a = sphere_samples(12, false);
        let b = sphere_samples(12, false);
        for (s, t) in a.iter().zip(&b) {
            assert_eq!(s.dir, t.dir);
        }
    }
}
