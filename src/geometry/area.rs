//! Circular search areas for places discovery.

use geo::{BoundingRect, Centroid, MultiPoint};

use super::Projection;
use crate::models::Point;

/// Largest radius the places service accepts, in metres.
pub const MAX_SEARCH_RADIUS_M: f64 = 50_000.0;

/// Margin applied around the extent of the covered points.
const RADIUS_MARGIN: f64 = 1.1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchArea {
    pub center: Point,
    pub radius_m: f64,
}

impl SearchArea {
    /// Radius is clamped to `1..=MAX_SEARCH_RADIUS_M`.
    pub fn new(center: Point, radius_m: f64) -> Self {
        Self {
            center,
            radius_m: radius_m.clamp(1.0, MAX_SEARCH_RADIUS_M),
        }
    }

    /// Area centred on the projected centroid of `points`, with a radius of
    /// 1.1 times the larger half-extent of their bounding box.
    ///
    /// Returns `None` when there are no valid points.
    pub fn covering(points: &[Point], projection: &dyn Projection) -> Option<Self> {
        let projected: MultiPoint<f64> = points
            .iter()
            .filter(|p| p.is_valid())
            .map(|p| {
                let [x, y] = projection.project(p.lon, p.lat);
                geo::Point::new(x, y)
            })
            .collect::<Vec<_>>()
            .into();

        let centroid = projected.centroid()?;
        let rect = projected.bounding_rect()?;

        let (lon, lat) = projection.unproject(centroid.x(), centroid.y());
        let half_extent = (rect.width() / 2.0).max(rect.height() / 2.0);
        let radius_m = half_extent * RADIUS_MARGIN * projection.ground_scale(lat);

        if radius_m > MAX_SEARCH_RADIUS_M {
            tracing::warn!(
                "Radius {:.0}m exceeds {:.0}m, capping",
                radius_m,
                MAX_SEARCH_RADIUS_M
            );
        }

        Some(Self::new(
            Point::new(lon, lat).with_projected([centroid.x(), centroid.y()]),
            radius_m,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::WebMercator;

    #[test]
    fn test_empty_points() {
        assert!(SearchArea::covering(&[], &WebMercator).is_none());
    }

    #[test]
    fn test_square_around_equator() {
        // ~2.2 km box centred on (0, 0)
        let points = [
            Point::new(-0.01, -0.01),
            Point::new(0.01, 0.01),
            Point::new(-0.01, 0.01),
            Point::new(0.01, -0.01),
        ];
        let area = SearchArea::covering(&points, &WebMercator).unwrap();
        assert!(area.center.lon.abs() < 1e-9);
        assert!(area.center.lat.abs() < 1e-9);
        // half extent ~1113 m, times the margin
        assert!((area.radius_m - 1113.2 * 1.1).abs() < 2.0);
    }

    #[test]
    fn test_radius_is_capped() {
        let points = [Point::new(-5.0, 0.0), Point::new(5.0, 0.0)];
        let area = SearchArea::covering(&points, &WebMercator).unwrap();
        assert_eq!(area.radius_m, MAX_SEARCH_RADIUS_M);
    }

    #[test]
    fn test_single_point_has_minimum_radius() {
        let area = SearchArea::covering(&[Point::new(3.0, 3.0)], &WebMercator).unwrap();
        assert_eq!(area.radius_m, 1.0);
    }
}
