//! In-memory `DepartmentStore` for handler tests.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::db::store::{
    order_cities, page_bounds, DepartmentChanges, DepartmentFilter, DepartmentRecord,
    DepartmentStore, DEPARTMENTS_TABLE,
};
use crate::errors::AppError;
use crate::models::base_entity::BaseEntity;
use crate::models::change_log::{ChangeLog, ACTION_CREATE, ACTION_DELETE, ACTION_UPDATE};
use crate::models::city::City;
use crate::models::country::Country;
use crate::models::department::Department;
use crate::services::change_log::memory::InMemoryChangeLogService;
use crate::services::change_log::{ChangeLogFilter, ChangeLogService};

#[derive(Default)]
struct State {
    countries: Vec<Arc<Country>>,
    cities: Vec<City>,
    // Insertion order; newest last.
    departments: Vec<Department>,
    next_id: i32,
}

impl State {
    fn country(&self, country_id: i32) -> Result<Arc<Country>, AppError> {
        self.countries
            .iter()
            .find(|country| country.base.id == country_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Country {} not found", country_id)))
    }

    fn cities_in_order(&self, city_ids: &[i32]) -> Result<Vec<City>, AppError> {
        let found = self
            .cities
            .iter()
            .filter(|city| city_ids.contains(&city.base.id))
            .cloned()
            .collect();
        order_cities(found, city_ids)
    }

    fn position(&self, department_id: i32) -> Result<usize, AppError> {
        self.departments
            .iter()
            .position(|department| department.base.id == department_id)
            .ok_or_else(|| AppError::NotFound("Department not found".to_string()))
    }
}

/// Mutations commit to the state only after the change log accepted them.
#[derive(Default)]
pub struct MemoryDepartmentStore {
    state: Mutex<State>,
    change_log: InMemoryChangeLogService,
}

impl MemoryDepartmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_country(mut self, id: i32, country_name: &str, country_code: &str) -> Self {
        self.state.get_mut().countries.push(Arc::new(Country {
            base: BaseEntity::with_id(id),
            country_name: country_name.to_string(),
            country_code: country_code.to_string(),
        }));
        self
    }

    pub fn with_city(mut self, id: i32, city_name: &str, country_id: i32) -> Self {
        self.state.get_mut().cities.push(City {
            base: BaseEntity::with_id(id),
            city_name: city_name.to_string(),
            country_id: Some(country_id),
        });
        self
    }

    pub fn with_change_log(mut self, change_log: InMemoryChangeLogService) -> Self {
        self.change_log = change_log;
        self
    }

    pub fn change_log(&self) -> &InMemoryChangeLogService {
        &self.change_log
    }
}

#[async_trait]
impl DepartmentStore for MemoryDepartmentStore {
    async fn countries(&self) -> Result<Vec<Country>, AppError> {
        let state = self.state.lock().await;
        Ok(state.countries.iter().map(|country| country.as_ref().clone()).collect())
    }

    async fn cities(&self, country_id: Option<i32>) -> Result<Vec<City>, AppError> {
        let state = self.state.lock().await;
        Ok(state
            .cities
            .iter()
            .filter(|city| country_id.map_or(true, |id| city.country_id == Some(id)))
            .cloned()
            .collect())
    }

    async fn department(&self, department_id: i32) -> Result<Option<Department>, AppError> {
        let state = self.state.lock().await;
        Ok(state
            .departments
            .iter()
            .find(|department| department.base.id == department_id)
            .cloned())
    }

    async fn departments(&self, filter: &DepartmentFilter) -> Result<Vec<Department>, AppError> {
        let (limit, offset) = page_bounds(filter.limit, filter.offset, 5);
        let needle = filter.name.as_deref().map(str::to_lowercase);

        let state = self.state.lock().await;
        Ok(state
            .departments
            .iter()
            .rev()
            .filter(|department| {
                needle.as_deref().map_or(true, |needle| {
                    department.department_name.to_lowercase().contains(needle)
                })
            })
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn create_department(&self, record: &DepartmentRecord) -> Result<Department, AppError> {
        let mut state = self.state.lock().await;

        let country = record
            .country_id
            .map(|country_id| state.country(country_id))
            .transpose()?;
        let cities = state.cities_in_order(&record.city_ids)?;

        let department = Department {
            base: BaseEntity {
                id: state.next_id + 1,
                status: record.status,
            },
            department_name: record.department_name.clone(),
            department_code: record.department_code.clone(),
            country,
            cities,
        };

        self.change_log
            .log_change(None, Some(&department), ACTION_CREATE, department.base.id, DEPARTMENTS_TABLE)
            .await?;

        state.next_id += 1;
        state.departments.push(department.clone());
        Ok(department)
    }

    async fn update_department(
        &self,
        department_id: i32,
        changes: &DepartmentChanges,
    ) -> Result<Department, AppError> {
        let mut state = self.state.lock().await;

        let index = state.position(department_id)?;
        let country = match changes.country_id {
            Some(Some(country_id)) => Some(Some(state.country(country_id)?)),
            Some(None) => Some(None),
            None => None,
        };
        let cities = changes
            .city_ids
            .as_deref()
            .map(|city_ids| state.cities_in_order(city_ids))
            .transpose()?;

        let existing = state.departments[index].clone();
        let changed = changes.apply(&existing, country, cities);

        self.change_log
            .log_change(Some(&existing), Some(&changed), ACTION_UPDATE, department_id, DEPARTMENTS_TABLE)
            .await?;

        state.departments[index] = changed.clone();
        Ok(changed)
    }

    async fn delete_department(&self, department_id: i32) -> Result<Department, AppError> {
        let mut state = self.state.lock().await;

        let index = state.position(department_id)?;
        let existing = state.departments[index].clone();

        self.change_log
            .log_change(Some(&existing), None, ACTION_DELETE, department_id, DEPARTMENTS_TABLE)
            .await?;

        state.departments.remove(index);
        Ok(existing)
    }

    async fn change_logs(&self, filter: &ChangeLogFilter) -> Result<Vec<ChangeLog>, AppError> {
        Ok(self.change_log.list(filter))
    }
}
