use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::models::base_entity::{BaseEntity, Entity};
use crate::models::city::City;
use crate::models::country::Country;

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Department {
    #[serde(flatten)]
    pub base: BaseEntity,
    pub department_name: String,
    pub department_code: String,
    // Shared reference data; never cloned into the department.
    pub country: Option<Arc<Country>>,
    #[serde(default)]
    pub cities: Vec<City>,
}

impl Department {
    #[cfg(test)]
    pub fn new(department_name: impl Into<String>, department_code: impl Into<String>) -> Self {
        Self {
            department_name: department_name.into(),
            department_code: department_code.into(),
            ..Self::default()
        }
    }

    pub fn country_id(&self) -> Option<i32> {
        self.country.as_ref().map(|country| country.id())
    }

    pub fn city_ids(&self) -> Vec<i32> {
        self.cities.iter().map(|city| city.id()).collect()
    }
}

impl Entity for Department {
    fn base(&self) -> &BaseEntity {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseEntity {
        &mut self.base
    }
}

/// Flat `departments` row, before the country and cities are attached.
#[derive(sqlx::FromRow, Debug)]
pub struct DepartmentRow {
    pub id: i32,
    pub status: bool,
    pub department_name: String,
    pub department_code: String,
    pub country_id: Option<i32>,
}

impl DepartmentRow {
    pub fn into_department(self, country: Option<Arc<Country>>, cities: Vec<City>) -> Department {
        Department {
            base: BaseEntity {
                id: self.id,
                status: self.status,
            },
            department_name: self.department_name,
            department_code: self.department_code,
            country,
            cities,
        }
    }
}
