use crate::{Error, Result};
use deadpool_sqlite::Pool;
use geojson::Geometry;
use rusqlite::{named_params, Connection, OptionalExtension, Row};
use time::OffsetDateTime;
use tracing::debug;

/// A stored polygonal fence, keyed by the location it belongs to. The
/// geometry is kept as a GeoJSON text column.
#[derive(PartialEq, Debug, Clone)]
pub struct Polygon {
    pub id: i64,
    pub geometry: Geometry,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub deleted_at: Option<OffsetDateTime>,
}

const TABLE: &str = "polygon";
const ALL_COLUMNS: &str = "id, geo_json, created_at, updated_at, deleted_at";
const COL_ID: &str = "id";
const COL_GEO_JSON: &str = "geo_json";
const COL_UPDATED_AT: &str = "updated_at";
const COL_DELETED_AT: &str = "deleted_at";

impl Polygon {
    pub async fn upsert_async(id: i64, geometry: Geometry, pool: &Pool) -> Result<Polygon> {
        pool.get()
            .await?
            .interact(move |conn| Polygon::upsert(id, &geometry, conn))
            .await?
    }

    pub fn upsert(id: i64, geometry: &Geometry, conn: &Connection) -> Result<Polygon> {
        let query = format!(
            r#"
                INSERT INTO {TABLE} ({COL_ID}, {COL_GEO_JSON})
                VALUES (:id, json(:geo_json))
                ON CONFLICT ({COL_ID}) DO UPDATE SET
                    {COL_GEO_JSON} = json(:geo_json),
                    {COL_UPDATED_AT} = strftime('%Y-%m-%dT%H:%M:%fZ'),
                    {COL_DELETED_AT} = NULL
            "#
        );
        debug!(query);
        conn.execute(
            &query,
            named_params! {
                ":id": id,
                ":geo_json": serde_json::to_string(geometry)?,
            },
        )?;
        Polygon::select_by_id(id, conn)?
            .ok_or(Error::Rusqlite(rusqlite::Error::QueryReturnedNoRows))
    }

    pub fn select_all(conn: &Connection) -> Result<Vec<Polygon>> {
        let query = format!(
            r#"
                SELECT {ALL_COLUMNS}
                FROM {TABLE}
                WHERE {COL_DELETED_AT} IS NULL
                ORDER BY {COL_ID}
            "#
        );
        debug!(query);
        Ok(conn
            .prepare(&query)?
            .query_map({}, Self::mapper())?
            .collect::<Result<Vec<_>, _>>()?)
    }

    pub async fn select_by_id_async(id: i64, pool: &Pool) -> Result<Option<Polygon>> {
        pool.get()
            .await?
            .interact(move |conn| Polygon::select_by_id(id, conn))
            .await?
    }

    pub fn select_by_id(id: i64, conn: &Connection) -> Result<Option<Polygon>> {
        let query = format!(
            r#"
                SELECT {ALL_COLUMNS}
                FROM {TABLE}
                WHERE {COL_ID} = :id AND {COL_DELETED_AT} IS NULL
            "#
        );
        debug!(query);
        Ok(conn
            .query_row(&query, named_params! { ":id": id }, Self::mapper())
            .optional()?)
    }

    const fn mapper() -> fn(&Row) -> rusqlite::Result<Polygon> {
        |row: &Row| -> rusqlite::Result<Polygon> {
            let geo_json: String = row.get(1)?;
            Ok(Polygon {
                id: row.get(0)?,
                geometry: serde_json::from_str(&geo_json).unwrap(),
                created_at: row.get(2)?,
                updated_at: row.get(3)?,
                deleted_at: row.get(4)?,
            })
        }
    }
}
