use std::sync::{Arc, Mutex};

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde_json::Value;

use super::{QueryError, Row, Table, parse::BoundFilter};
use crate::{
    entity::records::{self, Entity as Records},
    storage::LocalStorage,
};

/// Where table rows live.
#[derive(Clone)]
pub enum TableBackend {
    /// One JSON array per table under `db_{table}` in local storage.
    Local(LocalTables),
    /// The Postgres `records` table, one JSON document per row.
    Remote(RemoteTables),
}

impl TableBackend {
    pub fn local(storage: LocalStorage) -> Self {
        TableBackend::Local(LocalTables {
            storage,
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn remote(conn: DatabaseConnection) -> Self {
        TableBackend::Remote(RemoteTables { conn })
    }

    pub fn name(&self) -> &'static str {
        match self {
            TableBackend::Local(_) => "local",
            TableBackend::Remote(_) => "remote",
        }
    }

    pub async fn ping(&self) -> Result<(), QueryError> {
        match self {
            TableBackend::Local(local) => local.storage.has_item("db_ping").map(|_| ()).map_err(Into::into),
            TableBackend::Remote(remote) => Ok(remote.conn.ping().await?),
        }
    }

    pub async fn rows(&self, table: Table) -> Result<Vec<Row>, QueryError> {
        match self {
            TableBackend::Local(local) => local.rows(table),
            TableBackend::Remote(remote) => remote.rows(table).await,
        }
    }

    pub async fn insert(&self, table: Table, row: Row) -> Result<Row, QueryError> {
        match self {
            TableBackend::Local(local) => local.insert(table, row),
            TableBackend::Remote(remote) => remote.insert(table, row).await,
        }
    }

    /// Merges `patch` into every matching row and returns the updated rows.
    pub async fn update(
        &self,
        table: Table,
        filter: &BoundFilter,
        patch: &Row,
    ) -> Result<Vec<Row>, QueryError> {
        match self {
            TableBackend::Local(local) => local.update(table, filter, patch),
            TableBackend::Remote(remote) => remote.update(table, filter, patch).await,
        }
    }

    /// Removes every matching row and returns what was removed.
    pub async fn delete(&self, table: Table, filter: &BoundFilter) -> Result<Vec<Row>, QueryError> {
        match self {
            TableBackend::Local(local) => local.delete(table, filter),
            TableBackend::Remote(remote) => remote.delete(table, filter).await,
        }
    }
}

fn merge(row: &mut Row, patch: &Row, updated_at: &str) {
    for (key, value) in patch {
        if key != "id" {
            row.insert(key.clone(), value.clone());
        }
    }
    row.insert("updated_at".into(), Value::String(updated_at.to_string()));
}

fn row_id(row: &Row) -> Result<String, QueryError> {
    match row.get("id") {
        Some(Value::String(id)) => Ok(id.clone()),
        Some(Value::Number(id)) => Ok(id.to_string()),
        _ => Err(QueryError::InvalidRecord("row has no id".into())),
    }
}

#[derive(Clone)]
pub struct LocalTables {
    storage: LocalStorage,
    write_lock: Arc<Mutex<()>>,
}

impl LocalTables {
    fn rows(&self, table: Table) -> Result<Vec<Row>, QueryError> {
        Ok(self
            .storage
            .get_item::<Vec<Row>>(&table.storage_key())?
            .unwrap_or_default())
    }

    fn save(&self, table: Table, rows: &[Row]) -> Result<(), QueryError> {
        Ok(self.storage.set_item(&table.storage_key(), rows)?)
    }

    fn insert(&self, table: Table, row: Row) -> Result<Row, QueryError> {
        let _guard = self.write_lock.lock().map_err(|_| QueryError::Poisoned)?;
        let mut rows = self.rows(table)?;
        rows.push(row.clone());
        self.save(table, &rows)?;
        Ok(row)
    }

    fn update(&self, table: Table, filter: &BoundFilter, patch: &Row) -> Result<Vec<Row>, QueryError> {
        let _guard = self.write_lock.lock().map_err(|_| QueryError::Poisoned)?;
        let mut rows = self.rows(table)?;
        let now = super::timestamp();
        let mut updated = Vec::new();
        for row in rows.iter_mut().filter(|row| filter.matches(row)) {
            merge(row, patch, &now);
            updated.push(row.clone());
        }
        if !updated.is_empty() {
            self.save(table, &rows)?;
        }
        Ok(updated)
    }

    fn delete(&self, table: Table, filter: &BoundFilter) -> Result<Vec<Row>, QueryError> {
        let _guard = self.write_lock.lock().map_err(|_| QueryError::Poisoned)?;
        let (removed, kept): (Vec<Row>, Vec<Row>) =
            self.rows(table)?.into_iter().partition(|row| filter.matches(row));
        if !removed.is_empty() {
            self.save(table, &kept)?;
        }
        Ok(removed)
    }
}

#[derive(Clone)]
pub struct RemoteTables {
    conn: DatabaseConnection,
}

impl RemoteTables {
    async fn models(&self, table: Table) -> Result<Vec<records::Model>, QueryError> {
        Ok(Records::find()
            .filter(records::Column::TableName.eq(table.as_str()))
            .order_by_asc(records::Column::CreatedAt)
            .all(&self.conn)
            .await?)
    }

    async fn rows(&self, table: Table) -> Result<Vec<Row>, QueryError> {
        Ok(self
            .models(table)
            .await?
            .into_iter()
            .filter_map(|model| match model.data {
                Value::Object(row) => Some(row),
                other => {
                    tracing::warn!(table = %table, id = %model.id, kind = ?other, "skipping non-object record");
                    None
                }
            })
            .collect())
    }

    async fn insert(&self, table: Table, row: Row) -> Result<Row, QueryError> {
        let now = Utc::now().fixed_offset();
        let active = records::ActiveModel {
            table_name: Set(table.as_str().to_string()),
            id: Set(row_id(&row)?),
            data: Set(Value::Object(row.clone())),
            created_at: Set(now),
            updated_at: Set(now),
        };
        active.insert(&self.conn).await?;
        Ok(row)
    }

    async fn update(
        &self,
        table: Table,
        filter: &BoundFilter,
        patch: &Row,
    ) -> Result<Vec<Row>, QueryError> {
        let now = super::timestamp();
        let mut updated = Vec::new();
        for model in self.models(table).await? {
            let Value::Object(mut row) = model.data.clone() else {
                continue;
            };
            if !filter.matches(&row) {
                continue;
            }
            merge(&mut row, patch, &now);
            let mut active: records::ActiveModel = model.into();
            active.data = Set(Value::Object(row.clone()));
            active.updated_at = Set(Utc::now().fixed_offset());
            active.update(&self.conn).await?;
            updated.push(row);
        }
        Ok(updated)
    }

    async fn delete(&self, table: Table, filter: &BoundFilter) -> Result<Vec<Row>, QueryError> {
        let mut removed = Vec::new();
        let mut ids = Vec::new();
        for model in self.models(table).await? {
            if let Value::Object(row) = model.data {
                if filter.matches(&row) {
                    ids.push(model.id);
                    removed.push(row);
                }
            }
        }
        if !ids.is_empty() {
            Records::delete_many()
                .filter(records::Column::TableName.eq(table.as_str()))
                .filter(records::Column::Id.is_in(ids))
                .exec(&self.conn)
                .await?;
        }
        Ok(removed)
    }
}
