use crate::{db, error, fence, location, polygon, Error, Result};
use actix_web::dev::Service;
use actix_web::web::scope;
use actix_web::web::Data;
use actix_web::web::JsonConfig;
use actix_web::web::QueryConfig;
use actix_web::{
    middleware::{Compress, NormalizePath},
    App, HttpServer,
};
use futures_util::future::FutureExt;
use std::env;
use std::sync::Arc;
use time::OffsetDateTime;
use tracing::info;

pub async fn run() -> Result<()> {
    // All the worker threads are sharing a single connection pool
    let pool = Arc::new(db::pool()?);

    let port: u16 = match env::var("PORT") {
        Ok(port) => port
            .parse()
            .map_err(|_| Error::Generic(format!("Invalid PORT: {port}")))?,
        Err(_) => 8080,
    };

    info!(port, "Starting HTTP server");

    HttpServer::new(move || {
        App::new()
            .wrap_fn(|req, srv| {
                let req_method = req.method().as_str().to_string();
                let req_path = req.path().to_string();
                let req_version = format!("{:?}", req.version());
                let req_time = OffsetDateTime::now_utc();
                let req_real_ip = req
                    .connection_info()
                    .realip_remote_addr()
                    .unwrap_or_default()
                    .to_string();
                srv.call(req).map(move |res| {
                    if let Ok(res) = res.as_ref() {
                        let res_status = res.status().as_u16();
                        let res_time_sec = (OffsetDateTime::now_utc() - req_time).as_seconds_f64();
                        info!(
                            req_method,
                            req_path,
                            req_version,
                            req_real_ip,
                            res_status,
                            res_time_sec,
                        );
                    }
                    res
                })
            })
            .wrap(NormalizePath::trim())
            .wrap(Compress::default())
            .app_data(Data::from(pool.clone()))
            .app_data(QueryConfig::default().error_handler(error::query_error_handler))
            .app_data(JsonConfig::default().error_handler(error::json_error_handler))
            .service(
                scope("v1")
                    .service(fence::v1::post_circle)
                    .service(fence::v1::post_poly)
                    .service(
                        scope("polygons")
                            .service(polygon::v1::get)
                            .service(polygon::v1::post)
                            .service(polygon::v1::post_membership)
                            .service(polygon::v1::post_membership_by_id),
                    )
                    .service(
                        scope("locations")
                            .service(location::v1::post)
                            .service(location::v1::post_search)
                            .service(location::v1::post_closest)
                            .service(location::v1::post_enclosing)
                            .service(location::v1::get_by_id),
                    ),
            )
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await?;

    Ok(())
}
