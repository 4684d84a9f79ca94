use serde::{Deserialize, Serialize};

use crate::models::base_entity::{BaseEntity, Entity};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct Country {
    #[serde(flatten)]
    pub base: BaseEntity,
    pub country_name: String,
    pub country_code: String,
}

impl Entity for Country {
    fn base(&self) -> &BaseEntity {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseEntity {
        &mut self.base
    }
}

/// Flat `countries` row.
#[derive(sqlx::FromRow, Debug)]
pub struct CountryRow {
    pub id: i32,
    pub status: bool,
    pub country_name: String,
    pub country_code: String,
}

impl From<CountryRow> for Country {
    fn from(row: CountryRow) -> Self {
        Self {
            base: BaseEntity {
                id: row.id,
                status: row.status,
            },
            country_name: row.country_name,
            country_code: row.country_code,
        }
    }
}
