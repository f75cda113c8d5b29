//! GeoJSON export of point stores.

use geojson::{Feature, FeatureCollection, Geometry, JsonObject, JsonValue, Value};

use crate::collection::PointStore;
use crate::types::PointLike;

fn position<P: PointLike>(point: &P) -> Vec<f64> {
    // GeoJSON positions are longitude first, altitude optional third.
    match point.altitude() {
        Some(altitude) => vec![point.longitude(), point.latitude(), altitude],
        None => vec![point.longitude(), point.latitude()],
    }
}

fn properties<P: PointLike>(point: &P) -> JsonObject {
    let mut properties = JsonObject::new();
    properties.insert(
        "timestamp".to_string(),
        JsonValue::from(point.time().as_secs()),
    );
    if let Ok(iso) = point.time().to_iso8601() {
        properties.insert("time".to_string(), JsonValue::from(iso));
    }
    if let Some(accuracy) = point.accuracy() {
        properties.insert("accuracy".to_string(), JsonValue::from(accuracy));
    }
    if point.end_time() > point.time() {
        properties.insert(
            "endTimestamp".to_string(),
            JsonValue::from(point.end_time().as_secs()),
        );
        if let Ok(iso) = point.end_time().to_iso8601() {
            properties.insert("endTime".to_string(), JsonValue::from(iso));
        }
    }
    properties
}

/// One GeoJSON point feature per stored item, with time, accuracy and
/// span properties where present.
pub fn to_feature_collection<P, S>(store: &S) -> FeatureCollection
where
    P: PointLike,
    S: PointStore<P>,
{
    let mut features = Vec::with_capacity(store.len());
    for index in 0..store.len() {
        let Ok(point) = store.get(index) else {
            continue;
        };
        features.push(Feature {
            bbox: None,
            geometry: Some(Geometry::new(Value::Point(position(&point)))),
            id: None,
            properties: Some(properties(&point)),
            foreign_members: None,
        });
    }
    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

/// The whole store as a single LineString track feature.
pub fn to_track_feature<P, S>(store: &S) -> Feature
where
    P: PointLike,
    S: PointStore<P>,
{
    let mut coordinates = Vec::with_capacity(store.len());
    for index in 0..store.len() {
        if let Ok(point) = store.get(index) {
            coordinates.push(position(&point));
        }
    }
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::LineString(coordinates))),
        id: None,
        properties: None,
        foreign_members: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::ColumnarCollection;
    use crate::types::{GpsPoint, GpsStay, GpsTime};

    fn t(seconds: i64) -> GpsTime {
        GpsTime::new(seconds).unwrap()
    }

    #[test]
    fn features_carry_position_and_time() {
        let mut c = ColumnarCollection::<GpsPoint>::new();
        c.append(&GpsPoint::new(t(60), 10.0, 20.0, Some(100.0)).unwrap())
            .unwrap();
        let fc = to_feature_collection(&c);
        assert_eq!(fc.features.len(), 1);
        let feature = &fc.features[0];
        match &feature.geometry.as_ref().unwrap().value {
            Value::Point(position) => {
                assert!((position[0] - 20.0).abs() <= 0.5e-7);
                assert!((position[1] - 10.0).abs() <= 0.5e-7);
                assert_eq!(position[2], 100.0);
            }
            other => panic!("expected a point geometry, got {other:?}"),
        }
        let properties = feature.properties.as_ref().unwrap();
        assert_eq!(properties["timestamp"], 60);
    }

    #[test]
    fn stays_carry_their_span() {
        let mut c = ColumnarCollection::<GpsStay>::new();
        c.append(&GpsStay::new(t(60), t(120), 10.0, 20.0, None, Some(5.0)).unwrap())
            .unwrap();
        let fc = to_feature_collection(&c);
        let properties = fc.features[0].properties.as_ref().unwrap();
        assert_eq!(properties["timestamp"], 60);
        assert_eq!(properties["endTimestamp"], 120);
        assert_eq!(properties["accuracy"], 5.0);
    }

    #[test]
    fn track_is_a_linestring_over_all_points() {
        let mut c = ColumnarCollection::<GpsPoint>::new();
        for seconds in 0..5 {
            c.append(&GpsPoint::new(t(seconds), seconds as f64, 0.0, None).unwrap())
                .unwrap();
        }
        let track = to_track_feature(&c);
        match &track.geometry.as_ref().unwrap().value {
            Value::LineString(coordinates) => assert_eq!(coordinates.len(), 5),
            other => panic!("expected a linestring geometry, got {other:?}"),
        }
    }
}
