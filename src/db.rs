use crate::error::Error;
use crate::Result;
use deadpool_sqlite::{Config, CreatePoolError, Pool, Runtime};
use include_dir::include_dir;
use include_dir::Dir;
use rusqlite::Connection;
use std::env;
use std::fmt;
use std::fs::create_dir_all;
use std::path::PathBuf;
use tracing::info;
use tracing::warn;

static MIGRATIONS_DIR: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/migrations");

struct Migration(i16, String);

impl fmt::Display for Migration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {})",
            self.0,
            self.1
                .replace("\n", "")
                .replace("    ", "")
                .replace(";", "; "),
        )
    }
}

pub fn run(args: &[String], db: Connection) -> Result<()> {
    let first_arg = match args.first() {
        Some(some) => some,
        None => Err(Error::CLI("No DB actions passed".into()))?,
    };

    match first_arg.as_str() {
        "migrate" => {}
        "drop" => drop(db)?,
        _ => Err(Error::CLI(format!("Unknown command: {first_arg}")))?,
    }

    Ok(())
}

pub fn pool() -> Result<Pool> {
    Config::new(get_file_path()?)
        .create_pool(Runtime::Tokio1)
        .map_err(|e| match e {
            CreatePoolError::Config(e) => Error::DeadpoolConfig(e),
            CreatePoolError::Build(e) => Error::DeadpoolBuild(e),
        })
}

pub fn open_connection() -> Result<Connection> {
    let conn = Connection::open(get_file_path()?)?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    Ok(conn)
}

pub fn migrate(db: &mut Connection) -> Result<()> {
    execute_migrations(&get_migrations()?, db)
}

fn get_file_path() -> Result<PathBuf> {
    if let Ok(path) = env::var("GEOFENCE_DB") {
        return Ok(path.into());
    }
    #[allow(deprecated)]
    let data_dir = env::home_dir()
        .ok_or("Home directory does not exist")?
        .join(".local/share/geofence");
    if !data_dir.exists() {
        create_dir_all(&data_dir)?;
    }
    Ok(data_dir.join("geofence.db"))
}

fn get_migrations() -> Result<Vec<Migration>> {
    let mut index = 1;
    let mut res = vec![];

    loop {
        let file_name = format!("{index}.sql");
        let file = MIGRATIONS_DIR.get_file(&file_name);
        match file {
            Some(file) => {
                let sql = file.contents_utf8().ok_or(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    format!("Can't read {file_name} in UTF-8"),
                ))?;

                res.push(Migration(index, sql.to_string()));

                index += 1;
            }
            None => {
                break;
            }
        }
    }

    Ok(res)
}

fn execute_migrations(migrations: &[Migration], db: &mut Connection) -> Result<()> {
    let mut schema_ver: i16 =
        db.query_row("SELECT user_version FROM pragma_user_version", [], |row| {
            row.get(0)
        })?;

    let new_migrations: Vec<&Migration> =
        migrations.iter().filter(|it| it.0 > schema_ver).collect();

    for migration in new_migrations {
        warn!(%migration, "Found new migration");
        let tx = db.transaction()?;
        tx.execute_batch(&migration.1)?;
        tx.execute_batch(&format!("PRAGMA user_version={}", migration.0))?;
        tx.commit()?;
        schema_ver = migration.0;
    }

    info!(schema_ver, "Database schema is up to date");

    Ok(())
}

fn drop(db: Connection) -> Result<()> {
    let path = db
        .path()
        .ok_or(Error::CLI("This database has no file path".into()))?
        .to_string();
    db.close().map_err(|(_, e)| e)?;
    std::fs::remove_file(&path)?;
    warn!(path, "Removed database file");
    Ok(())
}
