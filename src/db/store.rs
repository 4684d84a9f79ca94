//! Persistence port for the registry.
//!
//! Every mutating operation records its change-log entry in the same unit of
//! work as the write: either both persist or neither does.

use async_trait::async_trait;
use std::sync::Arc;

use crate::errors::AppError;
use crate::models::base_entity::Entity;
use crate::models::change_log::ChangeLog;
use crate::models::city::City;
use crate::models::country::Country;
use crate::models::department::Department;
use crate::services::change_log::ChangeLogFilter;

pub const DEPARTMENTS_TABLE: &str = "departments";
pub const MAX_PAGE_SIZE: i64 = 100;

#[async_trait]
pub trait DepartmentStore: Send + Sync {
    async fn countries(&self) -> Result<Vec<Country>, AppError>;

    async fn cities(&self, country_id: Option<i32>) -> Result<Vec<City>, AppError>;

    async fn department(&self, department_id: i32) -> Result<Option<Department>, AppError>;

    /// Newest first.
    async fn departments(&self, filter: &DepartmentFilter) -> Result<Vec<Department>, AppError>;

    /// Fails with `NotFound` if the country or any city does not exist.
    async fn create_department(&self, record: &DepartmentRecord) -> Result<Department, AppError>;

    async fn update_department(
        &self,
        department_id: i32,
        changes: &DepartmentChanges,
    ) -> Result<Department, AppError>;

    /// Returns the department as it was before removal.
    async fn delete_department(&self, department_id: i32) -> Result<Department, AppError>;

    async fn change_logs(&self, filter: &ChangeLogFilter) -> Result<Vec<ChangeLog>, AppError>;
}

/// Column values written for a department on insert or update.
#[derive(Debug, Clone)]
pub struct DepartmentRecord {
    pub department_name: String,
    pub department_code: String,
    pub status: bool,
    pub country_id: Option<i32>,
    pub city_ids: Vec<i32>,
}

impl From<&Department> for DepartmentRecord {
    fn from(department: &Department) -> Self {
        Self {
            department_name: department.department_name.clone(),
            department_code: department.department_code.clone(),
            status: department.status(),
            country_id: department.country_id(),
            city_ids: department.city_ids(),
        }
    }
}

/// A partial update. `country_id: Some(None)` unassigns the country.
#[derive(Debug, Clone, Default)]
pub struct DepartmentChanges {
    pub department_name: Option<String>,
    pub department_code: Option<String>,
    pub status: Option<bool>,
    pub country_id: Option<Option<i32>>,
    pub city_ids: Option<Vec<i32>>,
}

impl DepartmentChanges {
    /// Applies the changes to a copy of `existing`. `country` and `cities`
    /// are the already-resolved targets of `country_id` and `city_ids`.
    pub fn apply(
        &self,
        existing: &Department,
        country: Option<Option<Arc<Country>>>,
        cities: Option<Vec<City>>,
    ) -> Department {
        let mut changed = existing.clone();
        if let Some(department_name) = &self.department_name {
            changed.department_name = department_name.clone();
        }
        if let Some(department_code) = &self.department_code {
            changed.department_code = department_code.clone();
        }
        if let Some(status) = self.status {
            changed.set_status(status);
        }
        if let Some(country) = country {
            changed.country = country;
        }
        if let Some(cities) = cities {
            changed.cities = cities;
        }
        changed
    }
}

#[derive(Debug, Default)]
pub struct DepartmentFilter {
    pub name: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Clamps paging input to `0..=MAX_PAGE_SIZE` rows from a non-negative offset.
pub fn page_bounds(limit: Option<i64>, offset: Option<i64>, default_limit: i64) -> (i64, i64) {
    (
        limit.unwrap_or(default_limit).clamp(0, MAX_PAGE_SIZE),
        offset.unwrap_or(0).max(0),
    )
}

/// Reorders `found` to follow `city_ids`.
///
/// Fails with `NotFound` naming the first id that has no city.
pub fn order_cities(mut found: Vec<City>, city_ids: &[i32]) -> Result<Vec<City>, AppError> {
    let mut ordered = Vec::with_capacity(city_ids.len());
    for id in city_ids {
        let position = found
            .iter()
            .position(|city| city.base.id == *id)
            .ok_or_else(|| AppError::NotFound(format!("City {} not found", id)))?;
        ordered.push(found.swap_remove(position));
    }
    Ok(ordered)
}
