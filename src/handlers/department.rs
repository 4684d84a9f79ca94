use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Deserializer};
use serde_json::json;
use validator::Validate;

use crate::config::AppConfig;
use crate::db::store::{DepartmentChanges, DepartmentFilter, DepartmentRecord, DepartmentStore};
use crate::errors::AppError;
use crate::models::base_entity::Entity;
use crate::utils::jwt::authorize;
use crate::utils::validation::{ensure_distinct_ids, validate_payload};

#[derive(Deserialize, Validate)]
pub struct NewDepartment {
    #[validate(length(min = 1, max = 100))]
    department_name: String,
    #[validate(length(min = 1, max = 20))]
    department_code: String,
    status: Option<bool>,
    country_id: Option<i32>,
    #[serde(default)]
    city_ids: Vec<i32>,
}

#[derive(Deserialize)]
pub struct DepartmentQueryParams {
    name: Option<String>,
    limit: Option<i64>,
    offset: Option<i64>,
}

#[derive(Deserialize, Validate)]
pub struct DepartmentUpdate {
    #[validate(length(min = 1, max = 100))]
    department_name: Option<String>,
    #[validate(length(min = 1, max = 20))]
    department_code: Option<String>,
    status: Option<bool>,
    // Absent keeps the country, `null` unassigns it.
    #[serde(default, deserialize_with = "present")]
    country_id: Option<Option<i32>>,
    city_ids: Option<Vec<i32>>,
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn parse_department_id(raw: &str) -> Result<i32, AppError> {
    raw.parse::<i32>()
        .map_err(|_| AppError::BadRequest("Invalid department ID".to_string()))
}

pub async fn create_department<S: DepartmentStore + 'static>(
    req: HttpRequest,
    store: web::Data<S>,
    config: web::Data<AppConfig>,
    new_department: web::Json<NewDepartment>,
) -> Result<HttpResponse, actix_web::Error> {
    let claims = authorize(&req, &config.jwt_secret)?;
    validate_payload(&*new_department)?;
    ensure_distinct_ids(&new_department.city_ids)?;

    let new_department = new_department.into_inner();
    let record = DepartmentRecord {
        department_name: new_department.department_name,
        department_code: new_department.department_code,
        status: new_department.status.unwrap_or(true),
        country_id: new_department.country_id,
        city_ids: new_department.city_ids,
    };

    let department = store.create_department(&record).await?;

    log::info!("{} created department #{}", claims.sub, department.id());
    Ok(HttpResponse::Created().json(department))
}

pub async fn get_departments<S: DepartmentStore + 'static>(
    req: HttpRequest,
    store: web::Data<S>,
    config: web::Data<AppConfig>,
    query: web::Query<DepartmentQueryParams>,
) -> Result<HttpResponse, actix_web::Error> {
    authorize(&req, &config.jwt_secret)?;

    let query = query.into_inner();
    let filter = DepartmentFilter {
        name: query.name,
        limit: query.limit,
        offset: query.offset,
    };
    let departments = store.departments(&filter).await?;

    Ok(HttpResponse::Ok().json(departments))
}

pub async fn get_department<S: DepartmentStore + 'static>(
    req: HttpRequest,
    store: web::Data<S>,
    config: web::Data<AppConfig>,
    department_id: web::Path<String>,
) -> Result<HttpResponse, actix_web::Error> {
    authorize(&req, &config.jwt_secret)?;
    let department_id = parse_department_id(&department_id)?;

    let department = store
        .department(department_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Department not found".to_string()))?;

    Ok(HttpResponse::Ok().json(department))
}

pub async fn update_department<S: DepartmentStore + 'static>(
    req: HttpRequest,
    store: web::Data<S>,
    config: web::Data<AppConfig>,
    department_id: web::Path<String>,
    updates: web::Json<DepartmentUpdate>,
) -> Result<HttpResponse, actix_web::Error> {
    let claims = authorize(&req, &config.jwt_secret)?;
    let department_id = parse_department_id(&department_id)?;
    validate_payload(&*updates)?;
    if let Some(city_ids) = &updates.city_ids {
        ensure_distinct_ids(city_ids)?;
    }

    let updates = updates.into_inner();
    let changes = DepartmentChanges {
        department_name: updates.department_name,
        department_code: updates.department_code,
        status: updates.status,
        country_id: updates.country_id,
        city_ids: updates.city_ids,
    };
    let stored = store.update_department(department_id, &changes).await?;

    log::info!("{} updated department #{}", claims.sub, department_id);
    Ok(HttpResponse::Ok().json(stored))
}

pub async fn delete_department<S: DepartmentStore + 'static>(
    req: HttpRequest,
    store: web::Data<S>,
    config: web::Data<AppConfig>,
    department_id: web::Path<String>,
) -> Result<HttpResponse, actix_web::Error> {
    let claims = authorize(&req, &config.jwt_secret)?;
    let department_id = parse_department_id(&department_id)?;

    store.delete_department(department_id).await?;

    log::info!("{} deleted department #{}", claims.sub, department_id);
    Ok(HttpResponse::Ok().json(json!({
        "message": "Department deleted successfully",
    })))
}
