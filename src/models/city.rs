use serde::{Deserialize, Serialize};

use crate::models::base_entity::{BaseEntity, Entity};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct City {
    #[serde(flatten)]
    pub base: BaseEntity,
    pub city_name: String,
    pub country_id: Option<i32>,
}

impl City {
    #[cfg(test)]
    pub fn named(city_name: impl Into<String>) -> Self {
        Self {
            city_name: city_name.into(),
            ..Self::default()
        }
    }
}

impl Entity for City {
    fn base(&self) -> &BaseEntity {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseEntity {
        &mut self.base
    }
}

/// Flat `cities` row.
#[derive(sqlx::FromRow, Debug)]
pub struct CityRow {
    pub id: i32,
    pub status: bool,
    pub city_name: String,
    pub country_id: Option<i32>,
}

impl From<CityRow> for City {
    fn from(row: CityRow) -> Self {
        Self {
            base: BaseEntity {
                id: row.id,
                status: row.status,
            },
            city_name: row.city_name,
            country_id: row.country_id,
        }
    }
}
