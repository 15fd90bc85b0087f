use super::{service, Polygon};
use crate::fence::v1::{point_coord, position};
use crate::location::Location;
use crate::Error;
use actix_web::get;
use actix_web::post;
use actix_web::web::Data;
use actix_web::web::Json;
use actix_web::web::Path;
use deadpool_sqlite::Pool;
use geojson::Geometry;
use serde::Deserialize;
use serde::Serialize;

#[derive(Serialize, Deserialize)]
pub struct InsertArgs {
    id: i64,
    polygon: Geometry,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct InsertResponse {
    pub message: String,
}

#[post("")]
pub async fn post(args: Json<InsertArgs>, pool: Data<Pool>) -> Result<Json<InsertResponse>, Error> {
    let args = args.into_inner();
    service::validate(&args.polygon)?;
    Polygon::upsert_async(args.id, args.polygon, &pool).await?;
    Ok(Json(InsertResponse {
        message: "Insert Success!".into(),
    }))
}

#[derive(Serialize, Deserialize, PartialEq, Debug)]
pub struct GetItem {
    pub id: i64,
    pub name: String,
    pub city: String,
    pub state: String,
    pub lat: f64,
    pub lon: f64,
    pub store_id: i64,
    pub metro_id: i64,
    pub zone_id: i64,
    pub polygon: Geometry,
}

#[get("")]
pub async fn get(pool: Data<Pool>) -> Result<Json<Vec<GetItem>>, Error> {
    let items = pool
        .get()
        .await?
        .interact(|conn| -> crate::Result<Vec<GetItem>> {
            let mut items = vec![];
            for fence in Polygon::select_all(conn)? {
                // Polygons are keyed by location id, orphans are skipped
                let Some(location) = Location::select_by_id(fence.id, conn)? else {
                    continue;
                };
                items.push(GetItem {
                    id: location.id,
                    name: location.name,
                    city: location.city,
                    state: location.state,
                    lat: location.lat,
                    lon: location.lon,
                    store_id: location.store_id,
                    metro_id: location.metro_id,
                    zone_id: location.zone_id,
                    polygon: fence.geometry,
                });
            }
            Ok(items)
        })
        .await??;
    Ok(Json(items))
}

#[derive(Serialize, Deserialize)]
pub struct MembershipArgs {
    geom: Geometry,
    point: Geometry,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct MembershipResponse {
    pub geom: Geometry,
    pub point: Geometry,
    pub position: String,
}

#[post("membership")]
pub async fn post_membership(
    args: Json<MembershipArgs>,
) -> Result<Json<MembershipResponse>, Error> {
    let args = args.into_inner();
    let point = point_coord(&args.point)?;
    let inside = service::contains(&args.geom, point)?;
    Ok(Json(MembershipResponse {
        geom: args.geom,
        point: args.point,
        position: position(inside),
    }))
}

#[derive(Serialize, Deserialize)]
pub struct PointArgs {
    point: Geometry,
}

#[post("{id}/membership")]
pub async fn post_membership_by_id(
    id: Path<i64>,
    args: Json<PointArgs>,
    pool: Data<Pool>,
) -> Result<Json<MembershipResponse>, Error> {
    let id = id.into_inner();
    let args = args.into_inner();
    let point = point_coord(&args.point)?;
    let fence = Polygon::select_by_id_async(id, &pool)
        .await?
        .ok_or(Error::NotFound(format!(
            "Polygon with id {id} doesn't exist"
        )))?;
    let inside = service::contains(&fence.geometry, point)?;
    Ok(Json(MembershipResponse {
        geom: fence.geometry,
        point: args.point,
        position: position(inside),
    }))
}
