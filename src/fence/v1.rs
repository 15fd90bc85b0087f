use super::{in_poly, in_radius, Coord, RadialFence};
use crate::Error;
use actix_web::post;
use actix_web::web::Json;
use geojson::Geometry;
use serde::Deserialize;
use serde::Serialize;

pub const POSITION_INSIDE: &str = "Inside";
pub const POSITION_OUTSIDE: &str = "Outside";

pub fn position(inside: bool) -> String {
    if inside {
        POSITION_INSIDE.into()
    } else {
        POSITION_OUTSIDE.into()
    }
}

/// Extracts the outer ring of a GeoJSON polygon as fence coordinates.
/// Anything that is not a polygon with at least one ring is invalid input.
pub fn outer_ring(geom: &Geometry) -> Result<Vec<Coord>, Error> {
    let geojson::Value::Polygon(rings) = &geom.value else {
        return Err(Error::InvalidInput(
            "geom should be a GeoJSON Polygon".into(),
        ));
    };
    let Some(outer) = rings.first() else {
        return Err(Error::InvalidInput(
            "geom should have an outer ring".into(),
        ));
    };
    outer
        .iter()
        .map(|position| {
            if position.len() < 2 {
                return Err(Error::InvalidInput(
                    "Ring positions should have 2 components".into(),
                ));
            }
            Ok(Coord {
                lat: position[0],
                lon: position[1],
            })
        })
        .collect()
}

/// Extracts a GeoJSON point as fence coordinates.
pub fn point_coord(geom: &Geometry) -> Result<Coord, Error> {
    let geojson::Value::Point(position) = &geom.value else {
        return Err(Error::InvalidInput("point should be a GeoJSON Point".into()));
    };
    if position.len() < 2 {
        return Err(Error::InvalidInput(
            "point should have 2 components".into(),
        ));
    }
    Ok(Coord {
        lat: position[0],
        lon: position[1],
    })
}

#[derive(Serialize, Deserialize)]
pub struct CircleArgs {
    fence: RadialFence,
    point: Coord,
}

#[derive(Serialize, Deserialize, PartialEq, Debug)]
pub struct CircleResponse {
    pub fence: RadialFence,
    pub point: Coord,
    pub position: String,
}

#[post("circle")]
pub async fn post_circle(args: Json<CircleArgs>) -> Result<Json<CircleResponse>, Error> {
    let args = args.into_inner();
    let inside = in_radius(args.point, &args.fence);
    Ok(Json(CircleResponse {
        fence: args.fence,
        point: args.point,
        position: position(inside),
    }))
}

#[derive(Serialize, Deserialize)]
pub struct PolyArgs {
    geom: Geometry,
    point: [f64; 2],
}

#[derive(Serialize, Deserialize, Debug)]
pub struct PolyResponse {
    pub geom: Geometry,
    pub point: [f64; 2],
    pub position: String,
}

#[post("poly")]
pub async fn post_poly(args: Json<PolyArgs>) -> Result<Json<PolyResponse>, Error> {
    let args = args.into_inner();
    let ring = outer_ring(&args.geom)?;
    let inside = in_poly(args.point.into(), &ring);
    Ok(Json(PolyResponse {
        geom: args.geom,
        point: args.point,
        position: position(inside),
    }))
}
