use crate::math::{normalize_degrees, Position2};

/// Mean Earth radius in meters (IUGG).
pub const EARTH_RADIUS: f64 = 6_371_008.8;

/// Geodesic primitives consumed by the buffering engine.
///
/// Any model that supplies these three operations (spherical, ellipsoidal,
/// planar) can drive the engine.
///
/// Azimuths are compass bearings in degrees, clockwise from north, in
/// `[-180, 180)`. Distances are in the model's length unit.
pub trait Geodesy {
    /// Initial bearing of the geodesic from `a` to `b`.
    fn forward_azimuth(&self, a: &Position2, b: &Position2) -> f64;

    /// Point reached by travelling `distance` from `origin` along `azimuth`.
    fn destination(&self, origin: &Position2, distance: f64, azimuth: f64) -> Position2;

    /// Length of the geodesic between `a` and `b`.
    fn distance(&self, a: &Position2, b: &Position2) -> f64;
}

/// Great-circle geodesy on a sphere.
///
/// `destination` keeps longitudes continuous with the origin instead of
/// wrapping them into `[-180, 180]`; offsets that cross the antimeridian are
/// split afterwards.
#[derive(Debug, Clone, Copy)]
pub struct Spherical {
    /// Sphere radius in meters.
    pub radius: f64,
}

impl Default for Spherical {
    fn default() -> Self {
        Self {
            radius: EARTH_RADIUS,
        }
    }
}

impl Geodesy for Spherical {
    fn forward_azimuth(&self, a: &Position2, b: &Position2) -> f64 {
        let (phi1, phi2) = (a.y.to_radians(), b.y.to_radians());
        let dlambda = (b.x - a.x).to_radians();
        let y = dlambda.sin() * phi2.cos();
        let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * dlambda.cos();
        normalize_degrees(y.atan2(x).to_degrees())
    }

    fn destination(&self, origin: &Position2, distance: f64, azimuth: f64) -> Position2 {
        let delta = distance / self.radius;
        let theta = azimuth.to_radians();
        let phi1 = origin.y.to_radians();
        let phi2 = (phi1.sin() * delta.cos() + phi1.cos() * delta.sin() * theta.cos()).asin();
        let dlambda = (theta.sin() * delta.sin() * phi1.cos())
            .atan2(delta.cos() - phi1.sin() * phi2.sin());
        Position2::new(origin.x + dlambda.to_degrees(), phi2.to_degrees())
    }

    fn distance(&self, a: &Position2, b: &Position2) -> f64 {
        let (phi1, phi2) = (a.y.to_radians(), b.y.to_radians());
        let dphi = phi2 - phi1;
        let dlambda = (b.x - a.x).to_radians();
        let h = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
        2.0 * self.radius * h.sqrt().min(1.0).asin()
    }
}

/// Euclidean plane with compass azimuths: 0° points along +y, 90° along +x.
///
/// Distances are in coordinate units.
#[derive(Debug, Clone, Copy, Default)]
pub struct Planar;

impl Geodesy for Planar {
    fn forward_azimuth(&self, a: &Position2, b: &Position2) -> f64 {
        normalize_degrees((b.x - a.x).atan2(b.y - a.y).to_degrees())
    }

    fn destination(&self, origin: &Position2, distance: f64, azimuth: f64) -> Position2 {
        let (sin, cos) = azimuth.to_radians().sin_cos();
        Position2::new(origin.x + distance * sin, origin.y + distance * cos)
    }

    fn distance(&self, a: &Position2, b: &Position2) -> f64 {
        (b - a).norm()
    }
}
