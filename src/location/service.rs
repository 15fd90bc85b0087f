use super::model::SearchArgs;
use super::Location;
use crate::fence::{distance_km, Coord};
use crate::polygon::{self, Polygon};
use crate::Result;
use geojson::{Feature, Geometry, Value};
use rusqlite::Connection;
use serde_json::Map;
use tracing::info;

/// Picks the most probable location of a store for a point: the nearest
/// active location within one degree of the point. Exact distance ties are
/// broken by service area polygons; a tie that polygons cannot break (or a
/// tied candidate with no polygon drawn) stays unresolved and returns None.
pub fn find_closest(store_id: i64, point: Coord, conn: &Connection) -> Result<Option<Location>> {
    let candidates: Vec<(Location, f64)> = Location::select_active_by_store_id(store_id, conn)?
        .into_iter()
        .filter(|it| within_one_degree(point, it.coord()))
        .map(|it| {
            let distance = distance_km(point, it.coord());
            (it, distance)
        })
        .collect();
    let min_distance = candidates
        .iter()
        .map(|(_, distance)| *distance)
        .fold(f64::INFINITY, f64::min);
    if min_distance.is_infinite() {
        return Ok(None);
    }
    let mut closest: Vec<Location> = candidates
        .into_iter()
        .filter(|(_, distance)| *distance == min_distance)
        .map(|(location, _)| location)
        .collect();
    if closest.len() == 1 {
        return Ok(Some(closest.remove(0)));
    }
    info!(
        store_id,
        count = closest.len(),
        "Distance tie, checking service area polygons",
    );
    disambiguate_by_polygon(closest, point, conn)
}

/// Finds the single location among a store's metro/zone locations whose
/// service area polygon encloses the point. Zero or several matches mean the
/// point cannot be attributed to one location.
pub fn find_enclosing(
    store_id: i64,
    metro_id: i64,
    zone_id: i64,
    point: Coord,
    conn: &Connection,
) -> Result<Option<Location>> {
    let candidates = Location::search(
        &SearchArgs {
            store_id: Some(store_id),
            metro_id: Some(metro_id),
            zone_id: Some(zone_id),
            ..SearchArgs::default()
        },
        conn,
    )?;
    let mut enclosing = vec![];
    for candidate in candidates {
        let Some(fence) = Polygon::select_by_id(candidate.id, conn)? else {
            continue;
        };
        if polygon::service::contains(&fence.geometry, point)? {
            enclosing.push(candidate);
        }
    }
    if enclosing.len() == 1 {
        Ok(Some(enclosing.remove(0)))
    } else {
        Ok(None)
    }
}

fn disambiguate_by_polygon(
    candidates: Vec<Location>,
    point: Coord,
    conn: &Connection,
) -> Result<Option<Location>> {
    let mut enclosing = vec![];
    for candidate in candidates {
        // A tied candidate without a drawn polygon leaves the point ambiguous
        let Some(fence) = Polygon::select_by_id(candidate.id, conn)? else {
            return Ok(None);
        };
        if polygon::service::contains(&fence.geometry, point)? {
            enclosing.push(candidate);
        }
    }
    if enclosing.len() == 1 {
        Ok(Some(enclosing.remove(0)))
    } else {
        Ok(None)
    }
}

fn within_one_degree(a: Coord, b: Coord) -> bool {
    let diff_lat = a.lat - b.lat;
    let diff_lon = a.lon - b.lon;
    (diff_lat * diff_lat + diff_lon * diff_lon).sqrt() <= 1.0
}

/// Renders a location as a GeoJSON point feature. Feature geometry follows
/// the GeoJSON position order, `[lon, lat]`; the service area polygon, when
/// present, rides along in the properties.
pub fn as_point_feature(location: &Location, fence: Option<&Geometry>) -> Result<Feature> {
    let mut properties = Map::new();
    properties.insert("id".into(), location.id.into());
    properties.insert("name".into(), location.name.clone().into());
    properties.insert("street".into(), location.street.clone().into());
    properties.insert("city".into(), location.city.clone().into());
    properties.insert("state".into(), location.state.clone().into());
    properties.insert("zip".into(), location.zip.clone().into());
    properties.insert("county".into(), location.county.clone().into());
    properties.insert("lat".into(), location.lat.into());
    properties.insert("lon".into(), location.lon.into());
    properties.insert("store_id".into(), location.store_id.into());
    properties.insert("metro_id".into(), location.metro_id.into());
    properties.insert("zone_id".into(), location.zone_id.into());
    if let Some(fence) = fence {
        properties.insert("polygon".into(), serde_json::to_value(fence)?);
    }
    Ok(Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::Point(vec![
            location.lon,
            location.lat,
        ]))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test::{mock_conn, mock_location};

    fn square_around(lat: f64, lon: f64, half_side: f64) -> Geometry {
        Geometry::new(Value::Polygon(vec![vec![
            vec![lat - half_side, lon - half_side],
            vec![lat - half_side, lon + half_side],
            vec![lat + half_side, lon + half_side],
            vec![lat + half_side, lon - half_side],
            vec![lat - half_side, lon - half_side],
        ]]))
    }

    #[test]
    fn closest_picks_nearest_location() -> Result<()> {
        let conn = mock_conn();
        let near = Location::insert(&mock_location("near", 10.0, 10.1, 1), &conn)?;
        Location::insert(&mock_location("far", 10.0, 10.5, 1), &conn)?;
        let point = Coord {
            lat: 10.0,
            lon: 10.0,
        };
        assert_eq!(Some(near), find_closest(1, point, &conn)?);
        Ok(())
    }

    #[test]
    fn closest_ignores_other_stores_and_far_locations() -> Result<()> {
        let conn = mock_conn();
        Location::insert(&mock_location("other store", 10.0, 10.1, 2), &conn)?;
        Location::insert(&mock_location("too far", 15.0, 15.0, 1), &conn)?;
        let point = Coord {
            lat: 10.0,
            lon: 10.0,
        };
        assert_eq!(None, find_closest(1, point, &conn)?);
        Ok(())
    }

    #[test]
    fn closest_tie_broken_by_polygon() -> Result<()> {
        let conn = mock_conn();
        let west = Location::insert(&mock_location("west", 10.0, 9.9, 1), &conn)?;
        let east = Location::insert(&mock_location("east", 10.0, 10.1, 1), &conn)?;
        Polygon::upsert(west.id, &square_around(10.0, 9.9, 0.15), &conn)?;
        Polygon::upsert(east.id, &square_around(10.0, 10.4, 0.15), &conn)?;
        // Equidistant from both locations, but only the west polygon reaches it
        let point = Coord {
            lat: 10.0,
            lon: 10.0,
        };
        assert_eq!(Some(west), find_closest(1, point, &conn)?);
        Ok(())
    }

    #[test]
    fn closest_tie_without_polygons_is_unresolved() -> Result<()> {
        let conn = mock_conn();
        Location::insert(&mock_location("west", 10.0, 9.9, 1), &conn)?;
        Location::insert(&mock_location("east", 10.0, 10.1, 1), &conn)?;
        let point = Coord {
            lat: 10.0,
            lon: 10.0,
        };
        assert_eq!(None, find_closest(1, point, &conn)?);
        Ok(())
    }

    #[test]
    fn enclosing_single_match() -> Result<()> {
        let conn = mock_conn();
        let inside = Location::insert(&mock_location("inside", 10.0, 10.0, 1), &conn)?;
        let outside = Location::insert(&mock_location("outside", 20.0, 20.0, 1), &conn)?;
        Polygon::upsert(inside.id, &square_around(10.0, 10.0, 1.0), &conn)?;
        Polygon::upsert(outside.id, &square_around(20.0, 20.0, 1.0), &conn)?;
        let point = Coord {
            lat: 10.2,
            lon: 10.3,
        };
        assert_eq!(Some(inside), find_enclosing(1, 0, 0, point, &conn)?);
        Ok(())
    }

    #[test]
    fn enclosing_no_match() -> Result<()> {
        let conn = mock_conn();
        let location = Location::insert(&mock_location("test", 10.0, 10.0, 1), &conn)?;
        Polygon::upsert(location.id, &square_around(10.0, 10.0, 1.0), &conn)?;
        let point = Coord {
            lat: 50.0,
            lon: 50.0,
        };
        assert_eq!(None, find_enclosing(1, 0, 0, point, &conn)?);
        Ok(())
    }

    #[test]
    fn enclosing_overlap_is_unresolved() -> Result<()> {
        let conn = mock_conn();
        let first = Location::insert(&mock_location("first", 10.0, 10.0, 1), &conn)?;
        let second = Location::insert(&mock_location("second", 10.1, 10.1, 1), &conn)?;
        Polygon::upsert(first.id, &square_around(10.0, 10.0, 1.0), &conn)?;
        Polygon::upsert(second.id, &square_around(10.0, 10.0, 1.0), &conn)?;
        let point = Coord {
            lat: 10.0,
            lon: 10.0,
        };
        assert_eq!(None, find_enclosing(1, 0, 0, point, &conn)?);
        Ok(())
    }

    #[test]
    fn point_feature_carries_polygon() -> Result<()> {
        let conn = mock_conn();
        let location = Location::insert(&mock_location("test", 10.0, 20.0, 1), &conn)?;
        let fence = square_around(10.0, 20.0, 1.0);
        let feature = as_point_feature(&location, Some(&fence))?;
        let geometry = feature.geometry.unwrap();
        assert_eq!(geometry.value, Value::Point(vec![20.0, 10.0]));
        let properties = feature.properties.unwrap();
        assert_eq!(properties["name"], serde_json::json!("test"));
        assert_eq!(properties["polygon"], serde_json::to_value(&fence)?);
        Ok(())
    }
}
