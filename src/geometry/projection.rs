//! Planar projections used for distance ranking.

use std::f64::consts::FRAC_PI_4;

/// Maps WGS84 coordinates into a planar frame where Euclidean distance is a
/// usable proxy for ground distance over a city-sized area.
pub trait Projection: Send + Sync {
    /// Project (lon, lat) degrees to planar (x, y).
    fn project(&self, lon: f64, lat: f64) -> [f64; 2];

    /// Inverse of [`Projection::project`], returning (lon, lat) degrees.
    fn unproject(&self, x: f64, y: f64) -> (f64, f64);

    /// Ground metres per planar unit at the given latitude.
    fn ground_scale(&self, lat: f64) -> f64;
}

const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Latitude limit of the square Web Mercator world.
pub const MAX_MERCATOR_LAT: f64 = 85.051_128_78;

/// Spherical Web Mercator (EPSG:3857).
#[derive(Debug, Clone, Copy, Default)]
pub struct WebMercator;

impl Projection for WebMercator {
    fn project(&self, lon: f64, lat: f64) -> [f64; 2] {
        let lat = lat.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT);
        let x = EARTH_RADIUS_M * lon.to_radians();
        let y = EARTH_RADIUS_M * (FRAC_PI_4 + lat.to_radians() / 2.0).tan().ln();
        [x, y]
    }

    fn unproject(&self, x: f64, y: f64) -> (f64, f64) {
        let lon = (x / EARTH_RADIUS_M).to_degrees();
        let lat = (2.0 * (y / EARTH_RADIUS_M).exp().atan() - 2.0 * FRAC_PI_4).to_degrees();
        (lon, lat)
    }

    fn ground_scale(&self, lat: f64) -> f64 {
        lat.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT)
            .to_radians()
            .cos()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_maps_to_origin() {
        let [x, y] = WebMercator.project(0.0, 0.0);
        assert!(x.abs() < 1e-9);
        assert!(y.abs() < 1e-9);
    }

    #[test]
    fn test_round_trip_bogota() {
        let [x, y] = WebMercator.project(-74.0817, 4.6097);
        let (lon, lat) = WebMercator.unproject(x, y);
        assert!((lon + 74.0817).abs() < 1e-9);
        assert!((lat - 4.6097).abs() < 1e-9);
    }

    #[test]
    fn test_poles_are_clamped() {
        let [_, y] = WebMercator.project(0.0, 90.0);
        assert!(y.is_finite());
        let [_, y_max] = WebMercator.project(0.0, MAX_MERCATOR_LAT);
        assert_eq!(y, y_max);
    }

    #[test]
    fn test_ground_scale_shrinks_with_latitude() {
        assert!((WebMercator.ground_scale(0.0) - 1.0).abs() < 1e-12);
        assert!((WebMercator.ground_scale(60.0) - 0.5).abs() < 1e-9);
    }
}
