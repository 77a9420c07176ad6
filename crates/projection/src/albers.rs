//! Albers Equal-Area Conic projection on an ellipsoid.
//!
//! BC Albers (EPSG:3005) is the projection all spatial outputs of the
//! workflow are delivered in. Formulas follow Snyder, "Map Projections: A
//! Working Manual" (USGS PP 1395), equations 3-12, 14-3 to 14-21.
//!
//! The projection parameters are:
//! - Two standard parallels (lat1, lat2)
//! - Latitude of origin (lat0) and central meridian (lon0)
//! - False easting and northing (meters)
//! - Ellipsoid semi-major axis and flattening

use std::f64::consts::PI;

/// GRS80 semi-major axis (meters)
pub const GRS80_A: f64 = 6_378_137.0;
/// GRS80 inverse flattening
pub const GRS80_INV_F: f64 = 298.257_222_101;

const MAX_ITERATIONS: usize = 25;
const CONVERGENCE: f64 = 1e-12;

/// Albers Equal-Area Conic projection parameters.
#[derive(Debug, Clone)]
pub struct AlbersEqualArea {
    /// Central meridian in radians
    pub lon0: f64,
    /// False easting (meters)
    pub false_easting: f64,
    /// False northing (meters)
    pub false_northing: f64,
    /// Semi-major axis (meters)
    pub a: f64,
    /// First eccentricity
    e: f64,
    /// Eccentricity squared
    e2: f64,
    /// Cone constant
    n: f64,
    /// Snyder's C constant
    c: f64,
    /// Rho at the latitude of origin
    rho0: f64,
}

impl AlbersEqualArea {
    /// Create a projection from parameters in degrees.
    pub fn new(
        lat1_deg: f64,
        lat2_deg: f64,
        lat0_deg: f64,
        lon0_deg: f64,
        false_easting: f64,
        false_northing: f64,
        a: f64,
        inv_f: f64,
    ) -> Self {
        let f = 1.0 / inv_f;
        let e2 = 2.0 * f - f * f;
        let e = e2.sqrt();

        let lat1 = lat1_deg.to_radians();
        let lat2 = lat2_deg.to_radians();
        let lat0 = lat0_deg.to_radians();

        let m1 = m(lat1, e2);
        let m2 = m(lat2, e2);
        let q0 = q(lat0, e, e2);
        let q1 = q(lat1, e, e2);
        let q2 = q(lat2, e, e2);

        let n = if (lat1 - lat2).abs() < 1e-10 {
            // Tangent cone
            lat1.sin()
        } else {
            (m1 * m1 - m2 * m2) / (q2 - q1)
        };
        let c = m1 * m1 + n * q1;
        let rho0 = a * (c - n * q0).sqrt() / n;

        Self {
            lon0: lon0_deg.to_radians(),
            false_easting,
            false_northing,
            a,
            e,
            e2,
            n,
            c,
            rho0,
        }
    }

    /// NAD83 / BC Albers (EPSG:3005).
    ///
    /// Standard parallels 50N and 58.5N, origin 45N 126W,
    /// false easting 1,000,000 m, GRS80 ellipsoid.
    pub fn bc_albers() -> Self {
        Self::new(50.0, 58.5, 45.0, -126.0, 1_000_000.0, 0.0, GRS80_A, GRS80_INV_F)
    }

    /// Project geographic coordinates (degrees) to easting/northing (meters).
    pub fn forward(&self, lon_deg: f64, lat_deg: f64) -> (f64, f64) {
        let lat = lat_deg.to_radians();
        let mut dlon = lon_deg.to_radians() - self.lon0;
        while dlon > PI {
            dlon -= 2.0 * PI;
        }
        while dlon < -PI {
            dlon += 2.0 * PI;
        }

        let q = q(lat, self.e, self.e2);
        let rho = self.a * (self.c - self.n * q).sqrt() / self.n;
        let theta = self.n * dlon;

        let x = rho * theta.sin() + self.false_easting;
        let y = self.rho0 - rho * theta.cos() + self.false_northing;
        (x, y)
    }

    /// Unproject easting/northing (meters) to geographic coordinates (degrees).
    ///
    /// Returns `None` if the latitude iteration does not converge.
    pub fn inverse(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let dx = x - self.false_easting;
        let dy = self.rho0 - (y - self.false_northing);

        let rho = dx.hypot(dy) * self.n.signum();
        let theta = if self.n >= 0.0 {
            dx.atan2(dy)
        } else {
            (-dx).atan2(-dy)
        };

        let q = (self.c - (rho * rho * self.n * self.n) / (self.a * self.a)) / self.n;
        let lat = self.latitude_from_q(q)?;
        let lon = self.lon0 + theta / self.n;

        Some((lon.to_degrees(), lat.to_degrees()))
    }

    /// Solve q(phi) = q for phi by Newton-style iteration (Snyder 3-16).
    fn latitude_from_q(&self, q: f64) -> Option<f64> {
        let e = self.e;
        let e2 = self.e2;
        let mut phi = (q / 2.0).clamp(-1.0, 1.0).asin();

        for _ in 0..MAX_ITERATIONS {
            let sin_phi = phi.sin();
            let cos_phi = phi.cos();
            let one_minus = 1.0 - e2 * sin_phi * sin_phi;
            let delta = one_minus * one_minus / (2.0 * cos_phi)
                * (q / (1.0 - e2) - sin_phi / one_minus
                    + (1.0 / (2.0 * e)) * ((1.0 - e * sin_phi) / (1.0 + e * sin_phi)).ln());
            phi += delta;
            if delta.abs() < CONVERGENCE {
                return Some(phi);
            }
        }
        None
    }
}

/// Snyder 14-15.
fn m(phi: f64, e2: f64) -> f64 {
    let s = phi.sin();
    phi.cos() / (1.0 - e2 * s * s).sqrt()
}

/// Snyder 3-12.
fn q(phi: f64, e: f64, e2: f64) -> f64 {
    let s = phi.sin();
    (1.0 - e2) * (s / (1.0 - e2 * s * s) - (1.0 / (2.0 * e)) * ((1.0 - e * s) / (1.0 + e * s)).ln())
}
