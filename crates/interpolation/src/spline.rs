//! Regularized spline (minimum curvature with a tension-like weight).
//!
//! ```text
//! S(x, y) = a0 + a1·x + a2·y + Σ λj · R(rj)
//!
//! R(r) = 1/(2π) · { r²/4 · [ln(r/2τ) + c − 1] + τ² · [K0(r/τ) + c + ln(r/2τ)] }
//! ```
//!
//! with τ² the weight and c Euler's constant. The surface passes exactly
//! through every sample point.

use std::f64::consts::PI;

use nalgebra::{DMatrix, DVector};

use crate::bessel::bessel_k0;
use crate::error::{InterpolationError, Result};

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Minimum number of points: one per trend coefficient.
pub const MIN_POINTS: usize = 3;

/// Radial basis of the regularized spline; zero at the origin.
pub fn regularized_basis(r: f64, tau: f64) -> f64 {
    if r <= 0.0 {
        return 0.0;
    }
    let log_term = (r / (2.0 * tau)).ln() + EULER_GAMMA;
    let curvature = r * r / 4.0 * (log_term - 1.0);
    let tension = tau * tau * (bessel_k0(r / tau) + log_term);
    (curvature + tension) / (2.0 * PI)
}

/// Whether centered points all lie on one line (the linear trend is then
/// undetermined).
fn is_collinear(nodes: &[(f64, f64)]) -> bool {
    let (mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0);
    for &(x, y) in nodes {
        sxx += x * x;
        syy += y * y;
        sxy += x * y;
    }
    sxx * syy - sxy * sxy <= 1e-12 * sxx * syy
}

/// A fitted spline surface.
#[derive(Debug, Clone)]
pub struct RegularizedSpline {
    /// Sample coordinates, relative to `center`.
    nodes: Vec<(f64, f64)>,
    lambdas: Vec<f64>,
    trend: [f64; 3],
    center: (f64, f64),
    tau: f64,
}

impl RegularizedSpline {
    /// Fit a surface through `(x, y, value)` samples.
    pub fn fit(points: &[(f64, f64, f64)], weight: f64) -> Result<Self> {
        if points.len() < MIN_POINTS {
            return Err(InterpolationError::NotEnoughPoints {
                found: points.len(),
                needed: MIN_POINTS,
            });
        }
        if !weight.is_finite() || weight <= 0.0 {
            return Err(InterpolationError::InvalidConfig(format!(
                "spline weight must be > 0, got {}",
                weight
            )));
        }

        let tau = weight.sqrt();
        let n = points.len();

        // Work relative to the centroid to keep the trend columns small.
        let cx = points.iter().map(|p| p.0).sum::<f64>() / n as f64;
        let cy = points.iter().map(|p| p.1).sum::<f64>() / n as f64;
        let nodes: Vec<(f64, f64)> = points.iter().map(|p| (p.0 - cx, p.1 - cy)).collect();

        if is_collinear(&nodes) {
            return Err(InterpolationError::Singular);
        }

        let size = n + 3;
        let mut system = DMatrix::<f64>::zeros(size, size);
        let mut rhs = DVector::<f64>::zeros(size);

        for i in 0..n {
            let (xi, yi) = nodes[i];
            for j in (i + 1)..n {
                let (xj, yj) = nodes[j];
                let r = (xi - xj).hypot(yi - yj);
                if r == 0.0 {
                    // Coincident samples make two rows identical.
                    return Err(InterpolationError::Singular);
                }
                let value = regularized_basis(r, tau);
                system[(i, j)] = value;
                system[(j, i)] = value;
            }
            system[(i, n)] = 1.0;
            system[(i, n + 1)] = xi;
            system[(i, n + 2)] = yi;
            system[(n, i)] = 1.0;
            system[(n + 1, i)] = xi;
            system[(n + 2, i)] = yi;
            rhs[i] = points[i].2;
        }

        let solution = system.lu().solve(&rhs).ok_or(InterpolationError::Singular)?;
        if solution.iter().any(|v| !v.is_finite()) {
            return Err(InterpolationError::Singular);
        }

        Ok(Self {
            nodes,
            lambdas: solution.rows(0, n).iter().copied().collect(),
            trend: [solution[n], solution[n + 1], solution[n + 2]],
            center: (cx, cy),
            tau,
        })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Surface value at `(x, y)`.
    pub fn evaluate(&self, x: f64, y: f64) -> f64 {
        let x = x - self.center.0;
        let y = y - self.center.1;
        let [a0, a1, a2] = self.trend;
        let radial: f64 = self
            .nodes
            .iter()
            .zip(&self.lambdas)
            .map(|(&(nx, ny), &lambda)| lambda * regularized_basis((x - nx).hypot(y - ny), self.tau))
            .sum();
        a0 + a1 * x + a2 * y + radial
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::{assert_approx_eq, create_plane_samples};

    #[test]
    fn test_basis_is_continuous_at_origin() {
        assert_eq!(regularized_basis(0.0, 0.3), 0.0);
        assert!(regularized_basis(1e-6, 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_passes_through_samples() {
        let points = vec![
            (0.0, 0.0, 1.0),
            (100.0, 0.0, 3.0),
            (0.0, 100.0, 2.0),
            (100.0, 100.0, 7.0),
            (50.0, 40.0, 4.5),
        ];
        let spline = RegularizedSpline::fit(&points, 0.1).unwrap();
        for &(x, y, v) in &points {
            assert_approx_eq!(spline.evaluate(x, y), v, 1e-6);
        }
    }

    #[test]
    fn test_reproduces_plane() {
        let samples = create_plane_samples(6, 5, 250.0, (10.0, 0.002, -0.001));
        let spline = RegularizedSpline::fit(&samples, 0.1).unwrap();
        for &(x, y) in &[(125.0, 125.0), (900.0, 300.0), (10.0, 990.0)] {
            assert_approx_eq!(spline.evaluate(x, y), 10.0 + 0.002 * x - 0.001 * y, 1e-6);
        }
    }

    #[test]
    fn test_too_few_points() {
        let err = RegularizedSpline::fit(&[(0.0, 0.0, 1.0), (1.0, 1.0, 2.0)], 0.1).unwrap_err();
        assert!(matches!(
            err,
            InterpolationError::NotEnoughPoints { found: 2, needed: 3 }
        ));
    }

    #[test]
    fn test_collinear_points_are_singular() {
        let points = vec![(0.0, 0.0, 1.0), (1.0, 1.0, 2.0), (2.0, 2.0, 3.0)];
        assert!(matches!(
            RegularizedSpline::fit(&points, 0.1),
            Err(InterpolationError::Singular)
        ));
    }

    #[test]
    fn test_duplicate_points_are_singular() {
        let points = vec![
            (0.0, 0.0, 1.0),
            (0.0, 0.0, 2.0),
            (10.0, 0.0, 3.0),
            (0.0, 10.0, 3.0),
        ];
        assert!(matches!(
            RegularizedSpline::fit(&points, 0.1),
            Err(InterpolationError::Singular)
        ));
    }
}
