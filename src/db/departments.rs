use sqlx::{PgConnection, Postgres, QueryBuilder};
use std::collections::HashMap;
use std::sync::Arc;

use crate::db::reference;
use crate::db::store::{page_bounds, DepartmentFilter, DepartmentRecord};
use crate::errors::AppError;
use crate::models::base_entity::BaseEntity;
use crate::models::city::City;
use crate::models::country::Country;
use crate::models::department::{Department, DepartmentRow};

const DEPARTMENT_COLUMNS: &str = "id, status, department_name, department_code, country_id";
const DEFAULT_LIMIT: i64 = 5;

#[derive(sqlx::FromRow)]
struct DepartmentCityRow {
    department_id: i32,
    id: i32,
    status: bool,
    city_name: String,
    country_id: Option<i32>,
}

pub async fn fetch_department(
    conn: &mut PgConnection,
    department_id: i32,
) -> Result<Option<Department>, AppError> {
    fetch_one(conn, department_id, "").await
}

/// Like [`fetch_department`], holding a row lock until the transaction ends.
pub async fn lock_department(
    conn: &mut PgConnection,
    department_id: i32,
) -> Result<Option<Department>, AppError> {
    fetch_one(conn, department_id, " FOR UPDATE").await
}

async fn fetch_one(
    conn: &mut PgConnection,
    department_id: i32,
    locking: &str,
) -> Result<Option<Department>, AppError> {
    let row = sqlx::query_as::<_, DepartmentRow>(&format!(
        "SELECT {} FROM departments WHERE id = $1{}",
        DEPARTMENT_COLUMNS, locking
    ))
    .bind(department_id)
    .fetch_optional(&mut *conn)
    .await?;

    match row {
        Some(row) => Ok(attach_relations(conn, vec![row]).await?.pop()),
        None => Ok(None),
    }
}

pub async fn list_departments(
    conn: &mut PgConnection,
    filter: &DepartmentFilter,
) -> Result<Vec<Department>, AppError> {
    let (limit, offset) = page_bounds(filter.limit, filter.offset, DEFAULT_LIMIT);
    let mut query: QueryBuilder<'_, Postgres> =
        QueryBuilder::new(format!("SELECT {} FROM departments", DEPARTMENT_COLUMNS));

    if let Some(name) = &filter.name {
        query.push(" WHERE department_name ILIKE ");
        query.push_bind(format!("%{}%", name));
    }

    query.push(" ORDER BY created_at DESC, id DESC LIMIT ");
    query.push_bind(limit);
    query.push(" OFFSET ");
    query.push_bind(offset);

    let rows = query
        .build_query_as::<DepartmentRow>()
        .fetch_all(&mut *conn)
        .await?;

    attach_relations(conn, rows).await
}

pub async fn insert_department(
    conn: &mut PgConnection,
    record: &DepartmentRecord,
) -> Result<i32, AppError> {
    let department_id: i32 = sqlx::query_scalar(
        "INSERT INTO departments (status, department_name, department_code, country_id) \
         VALUES ($1, $2, $3, $4) RETURNING id",
    )
    .bind(record.status)
    .bind(&record.department_name)
    .bind(&record.department_code)
    .bind(record.country_id)
    .fetch_one(&mut *conn)
    .await?;

    replace_cities(conn, department_id, &record.city_ids).await?;
    Ok(department_id)
}

pub async fn update_department(
    conn: &mut PgConnection,
    department_id: i32,
    record: &DepartmentRecord,
) -> Result<(), AppError> {
    let result = sqlx::query(
        "UPDATE departments SET status = $1, department_name = $2, department_code = $3, \
         country_id = $4, updated_at = NOW() WHERE id = $5",
    )
    .bind(record.status)
    .bind(&record.department_name)
    .bind(&record.department_code)
    .bind(record.country_id)
    .bind(department_id)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Department not found".to_string()));
    }

    replace_cities(conn, department_id, &record.city_ids).await
}

/// Returns whether a row was removed.
pub async fn delete_department(conn: &mut PgConnection, department_id: i32) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM departments WHERE id = $1")
        .bind(department_id)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected() > 0)
}

async fn replace_cities(
    conn: &mut PgConnection,
    department_id: i32,
    city_ids: &[i32],
) -> Result<(), AppError> {
    sqlx::query("DELETE FROM department_cities WHERE department_id = $1")
        .bind(department_id)
        .execute(&mut *conn)
        .await?;

    for (position, city_id) in city_ids.iter().enumerate() {
        sqlx::query(
            "INSERT INTO department_cities (department_id, city_id, position) VALUES ($1, $2, $3)",
        )
        .bind(department_id)
        .bind(city_id)
        .bind(position as i32)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

/// Loads countries and cities for all rows with one query each.
async fn attach_relations(
    conn: &mut PgConnection,
    rows: Vec<DepartmentRow>,
) -> Result<Vec<Department>, AppError> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let department_ids: Vec<i32> = rows.iter().map(|row| row.id).collect();
    let mut country_ids: Vec<i32> = rows.iter().filter_map(|row| row.country_id).collect();
    country_ids.sort_unstable();
    country_ids.dedup();

    // Departments sharing a country share one allocation.
    let countries: HashMap<i32, Arc<Country>> = reference::fetch_countries(conn, &country_ids)
        .await?
        .into_iter()
        .map(|country| (country.base.id, Arc::new(country)))
        .collect();

    let city_rows = sqlx::query_as::<_, DepartmentCityRow>(
        "SELECT dc.department_id, c.id, c.status, c.city_name, c.country_id \
         FROM department_cities dc JOIN cities c ON c.id = dc.city_id \
         WHERE dc.department_id = ANY($1) ORDER BY dc.department_id, dc.position",
    )
    .bind(department_ids.as_slice())
    .fetch_all(&mut *conn)
    .await?;

    let mut cities_by_department: HashMap<i32, Vec<City>> = HashMap::new();
    for row in city_rows {
        cities_by_department
            .entry(row.department_id)
            .or_default()
            .push(City {
                base: BaseEntity {
                    id: row.id,
                    status: row.status,
                },
                city_name: row.city_name,
                country_id: row.country_id,
            });
    }

    Ok(rows
        .into_iter()
        .map(|row| {
            let country = row.country_id.and_then(|id| countries.get(&id).cloned());
            let cities = cities_by_department.remove(&row.id).unwrap_or_default();
            row.into_department(country, cities)
        })
        .collect())
}
