use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const ACTION_CREATE: &str = "CREATE";
pub const ACTION_UPDATE: &str = "UPDATE";
pub const ACTION_DELETE: &str = "DELETE";

/// A row from the `change_logs` table.
#[derive(sqlx::FromRow, Serialize, Deserialize, Debug, Clone)]
pub struct ChangeLog {
    pub id: i64,
    pub table_name: String,
    pub entity_id: i32,
    pub action: String,
    pub old_values: Option<Value>,
    pub new_values: Option<Value>,
    pub created_at: DateTime<Utc>,
}

/// A change snapshot ready to be persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewChangeLog {
    pub table_name: String,
    pub entity_id: i32,
    pub action: String,
    pub old_values: Option<Value>,
    pub new_values: Option<Value>,
}

impl NewChangeLog {
    pub fn capture<T: Serialize + ?Sized>(
        old_entity: Option<&T>,
        new_entity: Option<&T>,
        action: &str,
        entity_id: i32,
        table_name: &str,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            table_name: table_name.to_string(),
            entity_id,
            action: action.to_string(),
            old_values: old_entity.map(serde_json::to_value).transpose()?,
            new_values: new_entity.map(serde_json::to_value).transpose()?,
        })
    }
}
