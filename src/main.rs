pub use error::ApiError;
pub use error::Error;
mod db;
mod error;
mod fence;
mod location;
mod polygon;
mod server;
#[cfg(test)]
mod test;
use std::env;
use tracing_subscriber::EnvFilter;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let mut db = db::open_connection()?;
    db::migrate(&mut db)?;

    let args: Vec<String> = env::args().collect();

    match args.get(1).map(String::as_str).unwrap_or("server") {
        "server" => server::run().await?,
        "db" => db::run(&args[2..], db)?,
        first_arg => Err(Error::CLI(format!("Unknown command: {first_arg}")))?,
    }

    Ok(())
}

fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if cfg!(debug_assertions) {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .json()
            .init();
    }
}
