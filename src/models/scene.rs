//! Scene document structure served from Elasticsearch.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Geographic point (lon/lat, WGS84).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lon: f64,
    pub lat: f64,
}

impl GeoPoint {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

/// One indexed imagery scene.
///
/// The four footprint corners are typed; everything else the ingest process
/// stored (capture date, identifiers, cloud cover, ...) rides in the open
/// metadata map and is opaque to the pipeline. The corners, taken in ring
/// order, form a closed, non-self-intersecting quadrilateral.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneRecord {
    pub upper_left_corner_latitude: f64,
    pub upper_left_corner_longitude: f64,
    pub upper_right_corner_latitude: f64,
    pub upper_right_corner_longitude: f64,
    pub lower_left_corner_latitude: f64,
    pub lower_left_corner_longitude: f64,
    pub lower_right_corner_latitude: f64,
    pub lower_right_corner_longitude: f64,

    /// Domain metadata fields passed through verbatim.
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

impl SceneRecord {
    /// Corner coordinates as (lon, lat) pairs.
    pub fn upper_left(&self) -> GeoPoint {
        GeoPoint::new(self.upper_left_corner_longitude, self.upper_left_corner_latitude)
    }

    pub fn upper_right(&self) -> GeoPoint {
        GeoPoint::new(self.upper_right_corner_longitude, self.upper_right_corner_latitude)
    }

    pub fn lower_left(&self) -> GeoPoint {
        GeoPoint::new(self.lower_left_corner_longitude, self.lower_left_corner_latitude)
    }

    pub fn lower_right(&self) -> GeoPoint {
        GeoPoint::new(self.lower_right_corner_longitude, self.lower_right_corner_latitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_from_source_document() {
        let source = json!({
            "upperLeftCornerLatitude": 40.98,
            "upperLeftCornerLongitude": -102.61,
            "upperRightCornerLatitude": 40.57,
            "upperRightCornerLongitude": -99.92,
            "lowerLeftCornerLatitude": 39.25,
            "lowerLeftCornerLongitude": -103.16,
            "lowerRightCornerLatitude": 38.85,
            "lowerRightCornerLongitude": -100.53,
            "sceneID": "LC80330322014139LGN00",
            "cloudCoverFull": 2.45
        });

        let scene: SceneRecord = serde_json::from_value(source).unwrap();
        assert_eq!(scene.upper_left().lat, 40.98);
        assert_eq!(scene.lower_right().lon, -100.53);
        assert_eq!(scene.metadata["sceneID"], "LC80330322014139LGN00");
        assert_eq!(scene.metadata["cloudCoverFull"], 2.45);
    }

    #[test]
    fn test_serialize_restores_field_names() {
        let mut metadata = Map::new();
        metadata.insert("sceneID".to_string(), json!("LC81390452014295LGN00"));

        let scene = SceneRecord {
            upper_left_corner_latitude: 1.0,
            upper_left_corner_longitude: 0.0,
            upper_right_corner_latitude: 1.0,
            upper_right_corner_longitude: 1.0,
            lower_left_corner_latitude: 0.0,
            lower_left_corner_longitude: 0.0,
            lower_right_corner_latitude: 0.0,
            lower_right_corner_longitude: 1.0,
            metadata,
        };

        let value = serde_json::to_value(&scene).unwrap();
        assert_eq!(value["upperLeftCornerLatitude"], 1.0);
        assert_eq!(value["lowerRightCornerLongitude"], 1.0);
        assert_eq!(value["sceneID"], "LC81390452014295LGN00");
    }
}
