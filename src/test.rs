use deadpool_sqlite::{Config, Pool, Runtime};
use rusqlite::Connection;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use crate::db;
use crate::location::model::InsertArgs;

pub fn mock_conn() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    db::migrate(&mut conn).unwrap();
    conn
}

static MEM_DB_COUNTER: AtomicUsize = AtomicUsize::new(1);

pub fn mock_state() -> State {
    let uri = format!(
        "file::testdb_{}:?mode=memory&cache=shared",
        MEM_DB_COUNTER.fetch_add(1, Ordering::Relaxed)
    );
    let mut conn = Connection::open(&uri).unwrap();
    db::migrate(&mut conn).unwrap();
    let pool = Arc::new(Config::new(uri).create_pool(Runtime::Tokio1).unwrap());
    State { pool, conn }
}

pub struct State {
    pub pool: Arc<Pool>,
    // Keeps the shared in-memory database alive for the pool
    pub conn: Connection,
}

pub fn mock_location(name: &str, lat: f64, lon: f64, store_id: i64) -> InsertArgs {
    InsertArgs {
        name: name.into(),
        street: "".into(),
        city: "".into(),
        state: "".into(),
        zip: "".into(),
        county: "".into(),
        lat,
        lon,
        store_id,
        metro_id: 0,
        zone_id: 0,
        active: true,
    }
}
