use async_trait::async_trait;
use sqlx::PgPool;

use crate::db::departments;
use crate::db::reference;
use crate::db::store::{
    DepartmentChanges, DepartmentFilter, DepartmentRecord, DepartmentStore, DEPARTMENTS_TABLE,
};
use crate::errors::AppError;
use crate::models::change_log::{ChangeLog, ACTION_CREATE, ACTION_DELETE, ACTION_UPDATE};
use crate::models::city::City;
use crate::models::country::Country;
use crate::models::department::Department;
use crate::services::change_log::{ChangeLogFilter, ChangeLogService, PgChangeLogService};

/// PostgreSQL implementation of `DepartmentStore`.
#[derive(Clone)]
pub struct PgDepartmentStore {
    pool: PgPool,
}

impl PgDepartmentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn department_not_found() -> AppError {
    AppError::NotFound("Department not found".to_string())
}

#[async_trait]
impl DepartmentStore for PgDepartmentStore {
    async fn countries(&self) -> Result<Vec<Country>, AppError> {
        let mut conn = self.pool.acquire().await?;
        reference::list_countries(&mut conn).await
    }

    async fn cities(&self, country_id: Option<i32>) -> Result<Vec<City>, AppError> {
        let mut conn = self.pool.acquire().await?;
        reference::list_cities(&mut conn, country_id).await
    }

    async fn department(&self, department_id: i32) -> Result<Option<Department>, AppError> {
        let mut conn = self.pool.acquire().await?;
        departments::fetch_department(&mut conn, department_id).await
    }

    async fn departments(&self, filter: &DepartmentFilter) -> Result<Vec<Department>, AppError> {
        let mut conn = self.pool.acquire().await?;
        departments::list_departments(&mut conn, filter).await
    }

    async fn create_department(&self, record: &DepartmentRecord) -> Result<Department, AppError> {
        let mut tx = self.pool.begin().await?;

        if let Some(country_id) = record.country_id {
            reference::fetch_country(&mut tx, country_id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Country {} not found", country_id)))?;
        }
        reference::fetch_cities_in_order(&mut tx, &record.city_ids).await?;

        let department_id = departments::insert_department(&mut tx, record).await?;
        let department = departments::fetch_department(&mut tx, department_id)
            .await?
            .ok_or_else(department_not_found)?;

        PgChangeLogService::new(&mut tx)
            .log_change(None, Some(&department), ACTION_CREATE, department_id, DEPARTMENTS_TABLE)
            .await?;
        tx.commit().await?;

        Ok(department)
    }

    async fn update_department(
        &self,
        department_id: i32,
        changes: &DepartmentChanges,
    ) -> Result<Department, AppError> {
        let mut tx = self.pool.begin().await?;

        let existing = departments::lock_department(&mut tx, department_id)
            .await?
            .ok_or_else(department_not_found)?;

        let country = match changes.country_id {
            Some(Some(country_id)) => Some(Some(
                reference::fetch_country(&mut tx, country_id)
                    .await?
                    .ok_or_else(|| {
                        AppError::NotFound(format!("Country {} not found", country_id))
                    })?,
            )),
            Some(None) => Some(None),
            None => None,
        };
        let cities = match &changes.city_ids {
            Some(city_ids) => Some(reference::fetch_cities_in_order(&mut tx, city_ids).await?),
            None => None,
        };

        let changed = changes.apply(&existing, country, cities);
        departments::update_department(&mut tx, department_id, &DepartmentRecord::from(&changed))
            .await?;
        let stored = departments::fetch_department(&mut tx, department_id)
            .await?
            .ok_or_else(department_not_found)?;

        PgChangeLogService::new(&mut tx)
            .log_change(Some(&existing), Some(&stored), ACTION_UPDATE, department_id, DEPARTMENTS_TABLE)
            .await?;
        tx.commit().await?;

        Ok(stored)
    }

    async fn delete_department(&self, department_id: i32) -> Result<Department, AppError> {
        let mut tx = self.pool.begin().await?;

        let existing = departments::lock_department(&mut tx, department_id)
            .await?
            .ok_or_else(department_not_found)?;
        if !departments::delete_department(&mut tx, department_id).await? {
            return Err(department_not_found());
        }

        PgChangeLogService::new(&mut tx)
            .log_change(Some(&existing), None, ACTION_DELETE, department_id, DEPARTMENTS_TABLE)
            .await?;
        tx.commit().await?;

        Ok(existing)
    }

    async fn change_logs(&self, filter: &ChangeLogFilter) -> Result<Vec<ChangeLog>, AppError> {
        let mut conn = self.pool.acquire().await?;
        PgChangeLogService::new(&mut conn).list(filter).await
    }
}
