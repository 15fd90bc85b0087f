use super::model::{InsertArgs, SearchArgs};
use super::{service, Location};
use crate::fence::v1::point_coord;
use crate::polygon::Polygon;
use crate::Error;
use actix_web::get;
use actix_web::post;
use actix_web::web::Data;
use actix_web::web::Json;
use actix_web::web::Path;
use deadpool_sqlite::Pool;
use geojson::Feature;
use geojson::Geometry;
use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;

#[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
pub struct GetItem {
    pub id: i64,
    pub name: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub county: String,
    pub lat: f64,
    pub lon: f64,
    pub store_id: i64,
    pub metro_id: i64,
    pub zone_id: i64,
    pub active: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<Location> for GetItem {
    fn from(val: Location) -> Self {
        GetItem {
            id: val.id,
            name: val.name,
            street: val.street,
            city: val.city,
            state: val.state,
            zip: val.zip,
            county: val.county,
            lat: val.lat,
            lon: val.lon,
            store_id: val.store_id,
            metro_id: val.metro_id,
            zone_id: val.zone_id,
            active: val.active,
            created_at: val.created_at,
            updated_at: val.updated_at,
        }
    }
}

impl From<Location> for Json<GetItem> {
    fn from(val: Location) -> Self {
        Json(val.into())
    }
}

#[post("")]
pub async fn post(args: Json<InsertArgs>, pool: Data<Pool>) -> Result<Json<GetItem>, Error> {
    Location::insert_async(args.into_inner(), &pool)
        .await
        .map(|it| it.into())
}

#[get("{id}")]
pub async fn get_by_id(id: Path<i64>, pool: Data<Pool>) -> Result<Json<Feature>, Error> {
    let id = id.into_inner();
    let feature = pool
        .get()
        .await?
        .interact(move |conn| -> crate::Result<Option<Feature>> {
            let Some(location) = Location::select_by_id(id, conn)? else {
                return Ok(None);
            };
            let fence = Polygon::select_by_id(id, conn)?;
            Ok(Some(service::as_point_feature(
                &location,
                fence.as_ref().map(|it| &it.geometry),
            )?))
        })
        .await??;
    feature
        .ok_or(Error::NotFound(format!(
            "Location with id {id} doesn't exist"
        )))
        .map(Json)
}

#[post("search")]
pub async fn post_search(
    args: Json<SearchArgs>,
    pool: Data<Pool>,
) -> Result<Json<Vec<Feature>>, Error> {
    let args = args.into_inner();
    let features = pool
        .get()
        .await?
        .interact(move |conn| -> crate::Result<Vec<Feature>> {
            let mut features = vec![];
            for location in Location::search(&args, conn)? {
                let fence = Polygon::select_by_id(location.id, conn)?;
                features.push(service::as_point_feature(
                    &location,
                    fence.as_ref().map(|it| &it.geometry),
                )?);
            }
            Ok(features)
        })
        .await??;
    Ok(Json(features))
}

#[derive(Serialize, Deserialize)]
pub struct ClosestArgs {
    store_id: i64,
    point: Geometry,
}

#[post("closest")]
pub async fn post_closest(
    args: Json<ClosestArgs>,
    pool: Data<Pool>,
) -> Result<Json<GetItem>, Error> {
    let args = args.into_inner();
    let point = point_coord(&args.point)?;
    let location = pool
        .get()
        .await?
        .interact(move |conn| service::find_closest(args.store_id, point, conn))
        .await??;
    location
        .ok_or(Error::MultipleChoices(
            "Unable to determine exact store".into(),
        ))
        .map(|it| it.into())
}

#[derive(Serialize, Deserialize)]
pub struct EnclosingArgs {
    store_id: i64,
    metro_id: i64,
    zone_id: i64,
    point: Geometry,
}

#[post("enclosing")]
pub async fn post_enclosing(
    args: Json<EnclosingArgs>,
    pool: Data<Pool>,
) -> Result<Json<GetItem>, Error> {
    let args = args.into_inner();
    let point = point_coord(&args.point)?;
    let location = pool
        .get()
        .await?
        .interact(move |conn| {
            service::find_enclosing(args.store_id, args.metro_id, args.zone_id, point, conn)
        })
        .await??;
    location
        .ok_or(Error::MultipleChoices(
            "Unable to determine exact store".into(),
        ))
        .map(|it| it.into())
}

#[cfg(test)]
mod test {
    use super::GetItem;
    use crate::error::ApiError;
    use crate::location::Location;
    use crate::polygon::Polygon;
    use crate::test::{mock_location, mock_state};
    use crate::Result;
    use actix_web::http::StatusCode;
    use actix_web::test::TestRequest;
    use actix_web::web::{scope, Data};
    use actix_web::{test, App};
    use geojson::{Feature, Geometry, Value};
    use serde_json::json;

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
    async fn post_creates_location() -> Result<()> {
        let state = mock_state();
        let app = test::init_service(
            App::new()
                .app_data(Data::from(state.pool))
                .service(scope("/").service(super::post)),
        )
        .await;
        let req = TestRequest::post()
            .uri("/")
            .set_json(json!({
                "name": "test",
                "lat": 1.0,
                "lon": 2.0,
                "store_id": 10,
            }))
            .to_request();
        let res: GetItem = test::call_and_read_body_json(&app, req).await;
        assert_eq!(res.name, "test");
        assert!(res.active);
        assert_eq!(
            Some(res.clone()),
            Location::select_by_id(res.id, &state.conn)?.map(|it| it.into())
        );
        Ok(())
    }

    #[test]
    async fn get_by_id_returns_feature() -> Result<()> {
        let state = mock_state();
        let location = Location::insert(&mock_location("test", 10.0, 20.0, 1), &state.conn)?;
        Polygon::upsert(location.id, &square_around(10.0, 20.0, 1.0), &state.conn)?;
        let app = test::init_service(
            App::new()
                .app_data(Data::from(state.pool))
                .service(scope("").service(super::get_by_id)),
        )
        .await;
        let req = TestRequest::get()
            .uri(&format!("/{}", location.id))
            .to_request();
        let res: Feature = test::call_and_read_body_json(&app, req).await;
        let properties = res.properties.unwrap();
        assert_eq!(properties["name"], json!("test"));
        assert!(properties.contains_key("polygon"));
        Ok(())
    }

    #[test]
    async fn get_by_id_missing() -> Result<()> {
        let state = mock_state();
        let app = test::init_service(
            App::new()
                .app_data(Data::from(state.pool))
                .service(scope("").service(super::get_by_id)),
        )
        .await;
        let req = TestRequest::get().uri("/1").to_request();
        let res: ApiError = test::try_call_and_read_body_json(&app, req).await.unwrap();
        assert_eq!(StatusCode::NOT_FOUND.as_u16(), res.http_code);
        Ok(())
    }

    #[test]
    async fn search_filters_by_store_id() -> Result<()> {
        let state = mock_state();
        Location::insert(&mock_location("first", 1.0, 2.0, 10), &state.conn)?;
        Location::insert(&mock_location("second", 3.0, 4.0, 20), &state.conn)?;
        let app = test::init_service(
            App::new()
                .app_data(Data::from(state.pool))
                .service(scope("").service(super::post_search)),
        )
        .await;
        let req = TestRequest::post()
            .uri("/search")
            .set_json(json!({ "store_id": 10 }))
            .to_request();
        let res: Vec<Feature> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(res.len(), 1);
        assert_eq!(res[0].properties.as_ref().unwrap()["name"], json!("first"));
        Ok(())
    }

    #[test]
    async fn closest_returns_location() -> Result<()> {
        let state = mock_state();
        Location::insert(&mock_location("near", 10.0, 10.1, 1), &state.conn)?;
        Location::insert(&mock_location("far", 10.0, 10.5, 1), &state.conn)?;
        let app = test::init_service(
            App::new()
                .app_data(Data::from(state.pool))
                .service(scope("").service(super::post_closest)),
        )
        .await;
        let req = TestRequest::post()
            .uri("/closest")
            .set_json(json!({
                "store_id": 1,
                "point": { "type": "Point", "coordinates": [10.0, 10.0] },
            }))
            .to_request();
        let res: GetItem = test::call_and_read_body_json(&app, req).await;
        assert_eq!(res.name, "near");
        Ok(())
    }

    #[test]
    async fn closest_unresolved_is_multiple_choices() -> Result<()> {
        let state = mock_state();
        let app = test::init_service(
            App::new()
                .app_data(Data::from(state.pool))
                .service(scope("").service(super::post_closest)),
        )
        .await;
        let req = TestRequest::post()
            .uri("/closest")
            .set_json(json!({
                "store_id": 1,
                "point": { "type": "Point", "coordinates": [10.0, 10.0] },
            }))
            .to_request();
        let res: ApiError = test::try_call_and_read_body_json(&app, req).await.unwrap();
        assert_eq!(StatusCode::MULTIPLE_CHOICES.as_u16(), res.http_code);
        assert_eq!(res.message, "Unable to determine exact store");
        Ok(())
    }

    #[test]
    async fn enclosing_returns_location() -> Result<()> {
        let state = mock_state();
        let location = Location::insert(&mock_location("test", 10.0, 10.0, 1), &state.conn)?;
        Polygon::upsert(location.id, &square_around(10.0, 10.0, 1.0), &state.conn)?;
        let app = test::init_service(
            App::new()
                .app_data(Data::from(state.pool))
                .service(scope("").service(super::post_enclosing)),
        )
        .await;
        let req = TestRequest::post()
            .uri("/enclosing")
            .set_json(json!({
                "store_id": 1,
                "metro_id": 0,
                "zone_id": 0,
                "point": { "type": "Point", "coordinates": [10.2, 10.3] },
            }))
            .to_request();
        let res: GetItem = test::call_and_read_body_json(&app, req).await;
        assert_eq!(res.id, location.id);
        Ok(())
    }
}
