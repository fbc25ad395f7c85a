//! Scene footprint geometry and exact point containment.

use geo::{Coord, Intersects, LineString, Point, Polygon};

use crate::models::{GeoPoint, SceneRecord};

fn coord(point: GeoPoint) -> Coord<f64> {
    Coord {
        x: point.lon,
        y: point.lat,
    }
}

/// Build the closed footprint ring for a scene.
///
/// Ring order follows the stored corner layout: lower-left, upper-left,
/// upper-right, lower-right, closed back at lower-left.
pub fn footprint(scene: &SceneRecord) -> Polygon<f64> {
    let ring = vec![
        coord(scene.lower_left()),
        coord(scene.upper_left()),
        coord(scene.upper_right()),
        coord(scene.lower_right()),
        coord(scene.lower_left()),
    ];

    Polygon::new(LineString::new(ring), vec![])
}

/// Exact containment test for the footprint quadrilateral.
///
/// Boundary-inclusive: a point on a footprint edge or vertex counts as
/// contained.
pub fn footprint_contains(scene: &SceneRecord, point: GeoPoint) -> bool {
    footprint(scene).intersects(&Point::new(point.lon, point.lat))
}
