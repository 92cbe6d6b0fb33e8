//! Geographic points with an optional planar copy.

use serde::{Deserialize, Serialize};

/// A WGS84 location, optionally carrying its projected coordinates.
///
/// The projected copy is only ever used to rank candidates by distance;
/// requests to external services are built from [`Point::geographic`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub lon: f64,
    pub lat: f64,
    #[serde(skip)]
    projected: Option<[f64; 2]>,
}

impl Point {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self {
            lon,
            lat,
            projected: None,
        }
    }

    /// Attach planar coordinates computed by a projection.
    pub fn with_projected(mut self, xy: [f64; 2]) -> Self {
        self.projected = Some(xy);
        self
    }

    pub fn projected(&self) -> Option<[f64; 2]> {
        self.projected
    }

    /// Geographic coordinates as a `geo` point (x = lon, y = lat).
    pub fn geographic(&self) -> geo::Point<f64> {
        geo::Point::new(self.lon, self.lat)
    }

    pub fn is_valid(&self) -> bool {
        self.lon.is_finite()
            && self.lat.is_finite()
            && (-180.0..=180.0).contains(&self.lon)
            && (-90.0..=90.0).contains(&self.lat)
    }
}

impl From<geo::Point<f64>> for Point {
    fn from(p: geo::Point<f64>) -> Self {
        Point::new(p.x(), p.y())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_projected_copy_keeps_geographic() {
        let p = Point::new(-74.08, 4.61).with_projected([1.0, 2.0]);
        assert_eq!(p.lon, -74.08);
        assert_eq!(p.lat, 4.61);
        assert_eq!(p.projected(), Some([1.0, 2.0]));
        assert_eq!(p.geographic().x(), -74.08);
    }

    #[test]
    fn test_validity() {
        assert!(Point::new(121.47, 31.23).is_valid());
        assert!(!Point::new(200.0, 10.0).is_valid());
        assert!(!Point::new(10.0, f64::NAN).is_valid());
    }
}
