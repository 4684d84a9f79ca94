use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;

use crate::config::AppConfig;
use crate::db::store::DepartmentStore;
use crate::utils::jwt::authorize;

#[derive(Deserialize)]
pub struct CityQueryParams {
    country_id: Option<i32>,
}

pub async fn get_countries<S: DepartmentStore + 'static>(
    req: HttpRequest,
    store: web::Data<S>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, actix_web::Error> {
    authorize(&req, &config.jwt_secret)?;
    let countries = store.countries().await?;
    Ok(HttpResponse::Ok().json(countries))
}

pub async fn get_cities<S: DepartmentStore + 'static>(
    req: HttpRequest,
    store: web::Data<S>,
    config: web::Data<AppConfig>,
    query: web::Query<CityQueryParams>,
) -> Result<HttpResponse, actix_web::Error> {
    authorize(&req, &config.jwt_secret)?;
    let cities = store.cities(query.country_id).await?;
    Ok(HttpResponse::Ok().json(cities))
}
