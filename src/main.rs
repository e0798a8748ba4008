mod errors;
mod logging;
mod initialization;
mod handlers;
mod manager_aggregation;
mod manager_inverter;
mod models;
mod cache;

use actix_web::{middleware, web, App, HttpServer};
use actix_files::Files;
use log::info;
use crate::cache::SeriesCache;
use crate::errors::UnrecoverableError;
use crate::handlers::{get_daily_generation, get_generation_history, get_kpis, get_monthly_report};
use crate::initialization::{config, Config};

struct AppState {
    config: Config,
    series_cache: SeriesCache,
}

#[actix_web::main]
async fn main() -> Result<(), UnrecoverableError> {
    logging::setup_logger();
    let config = config()?;
    let web_data = web::Data::new(AppState {
        series_cache: SeriesCache::new(config.cache.max_age()),
        config: config.clone(),
    });

    info!("starting web server");
    HttpServer::new(move || {
        App::new()
            .app_data(web_data.clone())
            .service(get_kpis)
            .service(get_generation_history)
            .service(get_daily_generation)
            .service(get_monthly_report)
            .service(
                web::scope("")
                    .wrap(middleware::DefaultHeaders::new().add(("Cache-Control", "no-cache")))
                    .service(Files::new("/", "./static").index_file("index.html"))
            )
    })
        .bind((config.web_server.bind_address.as_str(), config.web_server.bind_port))?
        .disable_signals()
        .run()
        .await?;

    Ok(())
}
