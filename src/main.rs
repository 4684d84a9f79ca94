mod config;
mod db;
mod errors;
mod handlers;
mod models;
mod services;
mod utils;

use actix_web::{web, App, HttpServer};
use dotenv::dotenv;
use log::{error, info};

use crate::config::AppConfig;
use crate::db::postgres::PgDepartmentStore;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = AppConfig::from_env().map_err(|err| {
        error!("{}", err);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, err)
    })?;

    // Initialize the database pool and apply pending migrations
    let pool = db::create_pool(&config).await.map_err(|err| {
        error!("{}", err);
        std::io::Error::new(std::io::ErrorKind::Other, err)
    })?;

    let bind_address = config.bind_address.clone();
    info!("Starting server at {}", bind_address);

    let store = web::Data::new(PgDepartmentStore::new(pool));
    let config = web::Data::new(config);

    HttpServer::new(move || {
        App::new()
            .app_data(store.clone())
            .app_data(config.clone())
            .configure(handlers::routes::<PgDepartmentStore>)
    })
    .bind(bind_address)?
    .run()
    .await
}
