use crate::fence::Coord;
use crate::{Error, Result};
use deadpool_sqlite::Pool;
use rusqlite::{named_params, Connection, OptionalExtension, Row};
use serde::Deserialize;
use time::OffsetDateTime;
use tracing::debug;

/// A store location. `lat` and `lon` are the storefront coordinates; the
/// service area polygon, when one has been drawn, lives in the polygon table
/// under the same id.
#[derive(PartialEq, Debug, Clone)]
pub struct Location {
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
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub deleted_at: Option<OffsetDateTime>,
}

#[derive(Deserialize, Clone)]
pub struct InsertArgs {
    pub name: String,
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub zip: String,
    #[serde(default)]
    pub county: String,
    pub lat: f64,
    pub lon: f64,
    pub store_id: i64,
    #[serde(default)]
    pub metro_id: i64,
    #[serde(default)]
    pub zone_id: i64,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Deserialize, Default, Clone)]
pub struct SearchArgs {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub store_id: Option<i64>,
    #[serde(default)]
    pub metro_id: Option<i64>,
    #[serde(default)]
    pub zone_id: Option<i64>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

const TABLE: &str = "location";
const ALL_COLUMNS: &str = "id, name, street, city, state, zip, county, lat, lon, store_id, metro_id, zone_id, active, created_at, updated_at, deleted_at";
const COL_ID: &str = "id";
const COL_STORE_ID: &str = "store_id";
const COL_ACTIVE: &str = "active";
const COL_DELETED_AT: &str = "deleted_at";

impl Location {
    pub fn coord(&self) -> Coord {
        Coord {
            lat: self.lat,
            lon: self.lon,
        }
    }

    pub async fn insert_async(args: InsertArgs, pool: &Pool) -> Result<Location> {
        pool.get()
            .await?
            .interact(move |conn| Location::insert(&args, conn))
            .await?
    }

    pub fn insert(args: &InsertArgs, conn: &Connection) -> Result<Location> {
        let query = format!(
            r#"
                INSERT INTO {TABLE} (
                    name,
                    street,
                    city,
                    state,
                    zip,
                    county,
                    lat,
                    lon,
                    store_id,
                    metro_id,
                    zone_id,
                    active
                )
                VALUES (
                    :name,
                    :street,
                    :city,
                    :state,
                    :zip,
                    :county,
                    :lat,
                    :lon,
                    :store_id,
                    :metro_id,
                    :zone_id,
                    :active
                )
            "#
        );
        debug!(query);
        conn.execute(
            &query,
            named_params! {
                ":name": args.name,
                ":street": args.street,
                ":city": args.city,
                ":state": args.state,
                ":zip": args.zip,
                ":county": args.county,
                ":lat": args.lat,
                ":lon": args.lon,
                ":store_id": args.store_id,
                ":metro_id": args.metro_id,
                ":zone_id": args.zone_id,
                ":active": args.active,
            },
        )?;
        Location::select_by_id(conn.last_insert_rowid(), conn)?
            .ok_or(Error::Rusqlite(rusqlite::Error::QueryReturnedNoRows))
    }

    pub fn select_by_id(id: i64, conn: &Connection) -> Result<Option<Location>> {
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

    pub fn select_active_by_store_id(store_id: i64, conn: &Connection) -> Result<Vec<Location>> {
        let query = format!(
            r#"
                SELECT {ALL_COLUMNS}
                FROM {TABLE}
                WHERE {COL_STORE_ID} = :store_id
                    AND {COL_ACTIVE} = 1
                    AND {COL_DELETED_AT} IS NULL
                ORDER BY {COL_ID}
            "#
        );
        debug!(query);
        Ok(conn
            .prepare(&query)?
            .query_map(named_params! { ":store_id": store_id }, Self::mapper())?
            .collect::<Result<Vec<_>, _>>()?)
    }

    pub fn search(args: &SearchArgs, conn: &Connection) -> Result<Vec<Location>> {
        let query = format!(
            r#"
                SELECT {ALL_COLUMNS}
                FROM {TABLE}
                WHERE (:id IS NULL OR id = :id)
                    AND (:store_id IS NULL OR store_id = :store_id)
                    AND (:metro_id IS NULL OR metro_id = :metro_id)
                    AND (:zone_id IS NULL OR zone_id = :zone_id)
                    AND (:city IS NULL OR city = :city)
                    AND (:state IS NULL OR state = :state)
                    AND {COL_DELETED_AT} IS NULL
                ORDER BY {COL_ID}
            "#
        );
        debug!(query);
        Ok(conn
            .prepare(&query)?
            .query_map(
                named_params! {
                    ":id": args.id,
                    ":store_id": args.store_id,
                    ":metro_id": args.metro_id,
                    ":zone_id": args.zone_id,
                    ":city": args.city,
                    ":state": args.state,
                },
                Self::mapper(),
            )?
            .collect::<Result<Vec<_>, _>>()?)
    }

    const fn mapper() -> fn(&Row) -> rusqlite::Result<Location> {
        |row: &Row| -> rusqlite::Result<Location> {
            Ok(Location {
                id: row.get(0)?,
                name: row.get(1)?,
                street: row.get(2)?,
                city: row.get(3)?,
                state: row.get(4)?,
                zip: row.get(5)?,
                county: row.get(6)?,
                lat: row.get(7)?,
                lon: row.get(8)?,
                store_id: row.get(9)?,
                metro_id: row.get(10)?,
                zone_id: row.get(11)?,
                active: row.get(12)?,
                created_at: row.get(13)?,
                updated_at: row.get(14)?,
                deleted_at: row.get(15)?,
            })
        }
    }
}
