use crate::fence::Coord;
use crate::{Error, Result};
use geo::Contains;
use geojson::Geometry;

/// Containment check for stored fence geometry, evaluated with geo's planar
/// algorithms. This is a second, independent implementation of membership:
/// at fence boundaries it can disagree with the ray casting predicate in
/// `fence::ring`.
pub fn contains(geometry: &Geometry, point: Coord) -> Result<bool> {
    let point = geo::Point::new(point.lat, point.lon);
    match &geometry.value {
        geojson::Value::Polygon(_) => {
            let poly: geo::Polygon = (&geometry.value).try_into()?;
            Ok(poly.contains(&point))
        }
        geojson::Value::MultiPolygon(_) => {
            let multi_poly: geo::MultiPolygon = (&geometry.value).try_into()?;
            Ok(multi_poly.contains(&point))
        }
        _ => Err(Error::InvalidInput(
            "Geometry should be a Polygon or MultiPolygon".into(),
        )),
    }
}

/// Insert-time validation: only polygonal geometry can act as a fence.
pub fn validate(geometry: &Geometry) -> Result<()> {
    match &geometry.value {
        geojson::Value::Polygon(_) | geojson::Value::MultiPolygon(_) => Ok(()),
        _ => Err(Error::InvalidInput(
            "Geometry should be a Polygon or MultiPolygon".into(),
        )),
    }
}
