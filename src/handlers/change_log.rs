use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;

use crate::config::AppConfig;
use crate::db::store::DepartmentStore;
use crate::services::change_log::ChangeLogFilter;
use crate::utils::jwt::authorize;

#[derive(Deserialize)]
pub struct ChangeLogQueryParams {
    table_name: Option<String>,
    entity_id: Option<i32>,
    limit: Option<i64>,
    offset: Option<i64>,
}

pub async fn get_change_logs<S: DepartmentStore + 'static>(
    req: HttpRequest,
    store: web::Data<S>,
    config: web::Data<AppConfig>,
    query: web::Query<ChangeLogQueryParams>,
) -> Result<HttpResponse, actix_web::Error> {
    authorize(&req, &config.jwt_secret)?;

    let query = query.into_inner();
    let filter = ChangeLogFilter {
        table_name: query.table_name,
        entity_id: query.entity_id,
        limit: query.limit,
        offset: query.offset,
    };
    let entries = store.change_logs(&filter).await?;

    Ok(HttpResponse::Ok().json(entries))
}
