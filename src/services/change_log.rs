//! Before/after auditing of entity changes.
//!
//! Stores call [`ChangeLogService::log_change`] inside the unit of work that
//! mutates the entity, so a change and its log entry persist together.

use async_trait::async_trait;
use serde::Serialize;
use sqlx::{PgConnection, Postgres, QueryBuilder};
use tokio::sync::Mutex;

use crate::db::store::page_bounds;
use crate::errors::AppError;
use crate::models::change_log::{ChangeLog, NewChangeLog};

const DEFAULT_PAGE_SIZE: i64 = 20;

#[async_trait]
pub trait ChangeLogService: Send + Sync {
    /// Records the state of an entity before and after `action`.
    ///
    /// `old_entity` is `None` for creations and `new_entity` is `None` for
    /// deletions. `entity_id` is stored as given and is not checked against
    /// the snapshots.
    async fn log_change<T>(
        &self,
        old_entity: Option<&T>,
        new_entity: Option<&T>,
        action: &str,
        entity_id: i32,
        table_name: &str,
    ) -> Result<(), AppError>
    where
        T: Serialize + Sync;
}

#[derive(Debug, Default)]
pub struct ChangeLogFilter {
    pub table_name: Option<String>,
    pub entity_id: Option<i32>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ChangeLogFilter {
    fn matches(&self, entry: &ChangeLog) -> bool {
        self.table_name
            .as_deref()
            .map_or(true, |table_name| entry.table_name == table_name)
            && self.entity_id.map_or(true, |id| entry.entity_id == id)
    }
}

/// Writes `change_logs` rows on the connection it borrows.
///
/// Handing it a transaction makes the log entry commit or roll back with the
/// change it describes.
pub struct PgChangeLogService<'c> {
    conn: Mutex<&'c mut PgConnection>,
}

impl<'c> PgChangeLogService<'c> {
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Newest entries first.
    pub async fn list(&self, filter: &ChangeLogFilter) -> Result<Vec<ChangeLog>, AppError> {
        let (limit, offset) = page_bounds(filter.limit, filter.offset, DEFAULT_PAGE_SIZE);

        let mut query: QueryBuilder<'_, Postgres> = QueryBuilder::new(
            "SELECT id, table_name, entity_id, action, old_values, new_values, created_at \
             FROM change_logs WHERE 1 = 1",
        );
        if let Some(table_name) = &filter.table_name {
            query.push(" AND table_name = ");
            query.push_bind(table_name.clone());
        }
        if let Some(entity_id) = filter.entity_id {
            query.push(" AND entity_id = ");
            query.push_bind(entity_id);
        }
        query.push(" ORDER BY created_at DESC, id DESC LIMIT ");
        query.push_bind(limit);
        query.push(" OFFSET ");
        query.push_bind(offset);

        let mut conn = self.conn.lock().await;
        let entries = query
            .build_query_as::<ChangeLog>()
            .fetch_all(&mut **conn)
            .await?;
        Ok(entries)
    }

    async fn insert(&self, entry: NewChangeLog) -> Result<(), AppError> {
        let mut conn = self.conn.lock().await;
        sqlx::query(
            "INSERT INTO change_logs (table_name, entity_id, action, old_values, new_values) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&entry.table_name)
        .bind(entry.entity_id)
        .bind(&entry.action)
        .bind(&entry.old_values)
        .bind(&entry.new_values)
        .execute(&mut **conn)
        .await?;

        log::info!(
            "Recorded {} on {} #{}",
            entry.action,
            entry.table_name,
            entry.entity_id
        );
        Ok(())
    }
}

#[async_trait]
impl<'c> ChangeLogService for PgChangeLogService<'c> {
    async fn log_change<T>(
        &self,
        old_entity: Option<&T>,
        new_entity: Option<&T>,
        action: &str,
        entity_id: i32,
        table_name: &str,
    ) -> Result<(), AppError>
    where
        T: Serialize + Sync,
    {
        let entry = NewChangeLog::capture(old_entity, new_entity, action, entity_id, table_name)?;
        self.insert(entry).await
    }
}


#[cfg(test)]
mod tests {
    use super::memory::InMemoryChangeLogService;
    use super::*;
    use crate::models::change_log::{ACTION_CREATE, ACTION_DELETE, ACTION_UPDATE};
    use crate::models::department::Department;
    use serde::ser::Error as _;
    use std::sync::Arc;

    struct Unserializable;

    impl Serialize for Unserializable {
        fn serialize<S: serde::Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
            Err(S::Error::custom("snapshot refused"))
        }
    }

    #[actix_web::test]
    async fn log_change_completes_for_any_entity_pair() {
        let service = InMemoryChangeLogService::default();
        let before = Department::new("Ops", "OPS");
        let after = Department::new("Operations", "OPS");

        let outcome = service
            .log_change(Some(&before), Some(&after), ACTION_UPDATE, 42, "Department")
            .await;
        assert!(outcome.is_ok());

        let entries = service.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, "UPDATE");
        assert_eq!(entries[0].entity_id, 42);
        assert_eq!(entries[0].table_name, "Department");
    }

    #[actix_web::test]
    async fn entity_id_is_not_checked_against_snapshot() {
        let service = InMemoryChangeLogService::default();
        let mut gone = Department::new("Legal", "LEG");
        gone.base.id = 3;

        service
            .log_change(Some(&gone), None, ACTION_DELETE, 99, "departments")
            .await
            .unwrap();

        let entry = &service.entries()[0];
        assert_eq!(entry.entity_id, 99);
        assert_eq!(entry.old_values.as_ref().unwrap()["id"], 3);
        assert!(entry.new_values.is_none());
    }

    #[actix_web::test]
    async fn serialization_failure_is_reported() {
        let service = InMemoryChangeLogService::default();
        let err = service
            .log_change(Some(&Unserializable), None, ACTION_DELETE, 1, "t")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::SerializationError(_)));
        assert!(service.entries().is_empty());
    }

    #[actix_web::test]
    async fn list_filters_newest_first_and_caps_page_size() {
        let service = InMemoryChangeLogService::default();
        let department = Department::new("Ops", "OPS");
        for id in 0..150 {
            service
                .log_change(None, Some(&department), ACTION_CREATE, id % 2, "departments")
                .await
                .unwrap();
        }

        let filter = ChangeLogFilter {
            entity_id: Some(1),
            limit: Some(10_000),
            ..ChangeLogFilter::default()
        };
        let entries = service.list(&filter);
        assert_eq!(entries.len(), 75);
        assert!(entries.iter().all(|entry| entry.entity_id == 1));
        assert!(entries[0].id > entries[1].id);

        let unfiltered = ChangeLogFilter {
            limit: Some(10_000),
            ..ChangeLogFilter::default()
        };
        assert_eq!(service.list(&unfiltered).len(), 100);
    }

    #[actix_web::test]
    async fn concurrent_callers_share_one_service() {
        let service = Arc::new(InMemoryChangeLogService::default());
        let mut handles = Vec::new();
        for id in 0..8 {
            let service = Arc::clone(&service);
            handles.push(tokio::spawn(async move {
                let department = Department::new(format!("Dept {}", id), "D");
                service
                    .log_change(None, Some(&department), ACTION_CREATE, id, "departments")
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let mut ids: Vec<i32> = service.entries().iter().map(|e| e.entity_id).collect();
        ids.sort_unstable();
        assert_eq!(ids, (0..8).collect::<Vec<_>>());
    }
}
